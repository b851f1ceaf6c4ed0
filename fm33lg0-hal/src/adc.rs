//! Analog-Digital Converter (ADC)
//!
//! 12 bit successive approximation converter with twenty external inputs
//! (CH0..CH19) and seven internal ones (VREF1P2, temperature sensor, AVREF,
//! VBAT/3, VDD/3, the DAC output and the OPA output).
//!
//! ## Usage
//!
//! Capture an ADC reading from an external channel
//! ```ignore
//! use embedded_hal_0_2::adc::OneShot;
//! use fm33lg0_hal::{adc::{channels, Adc, AdcConfig}, gpio::GpioExt, pac};
//! let mut p = pac::Peripherals::take().unwrap();
//! let gpioc = p.GPIOC.split(&mut p.CMU);
//! // The input pin has to be in analog mode
//! let _pin = gpioc.pc9.into_analog();
//! let mut adc = Adc::new(p.ADC, AdcConfig::default(), &mut p.VREF, &mut p.RMU, &mut p.CMU).unwrap();
//! let counts: u16 = adc.read(&mut channels::Ch0).unwrap();
//! // Scale against the internal 1.2 V reference
//! let millivolts = adc.read_millivolts(channels::Ch0::ID).unwrap();
//! ```

use crate::cmu::{self, AdcClockSource, AdcPrescaler, BusClock};
use crate::pac::{
    self,
    adc::{calr, cfgr1, cfgr2, cr1, cr2, dr, hltr, ier, isr, smtr, RegisterBlock},
    vref,
};
use crate::rmu::SubsystemReset;
use embedded_hal_0_2::adc::{Channel, OneShot};

/// Factory calibration: VREF1P2 conversion result at 3.0 V VDDA, 30 °C.
const VREF1P2_CAL: *const u16 = 0x1FFF_FB08 as *const u16;

/// Full scale of a 12 bit conversion.
const FULL_SCALE: u64 = 4095;

/// VDDA the factory calibration was taken at, in millivolts.
const CAL_VDDA_MV: u64 = 3000;

/// Polling budget for calibration and conversions.
const WAIT_LIMIT: u32 = 0x8000;

/// Internal channel numbers, as bit positions of the channel enable register.
const CH_VREF1P2: u8 = 24;
const CH_TS: u8 = 25;
const CH_AVREF: u8 = 26;
const CH_VBAT_DIV3: u8 = 27;
const CH_VDD_DIV3: u8 = 28;
const CH_DAC: u8 = 29;
const CH_OPA: u8 = 30;

/// ADC errors
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// Calibration or a conversion did not complete in time.
    Timeout,
    /// The channel number does not exist, or cannot be used for this purpose.
    InvalidChannel,
}

/// Kernel clock of the converter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AdcClock {
    /// Dedicated ADC operation clock from the CMU.
    Kernel(AdcClockSource, AdcPrescaler),
    /// APB clock through the ADC's own prescaler.
    Apb(ApbPrescaler),
}

/// Prescaler applied to APBCLK when it clocks the converter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ApbPrescaler {
    /// Divide by 1
    Div1 = 0,
    /// Divide by 2
    Div2 = 1,
    /// Divide by 4
    Div4 = 2,
    /// Divide by 8
    Div8 = 3,
}

/// Positive reference.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Reference {
    /// Analog supply
    Vdda = 0,
    /// VREFP regulator output
    Vrefp = 1,
}

/// Conversion resolution.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Resolution {
    /// 12 bits
    Bits12 = 0,
    /// 10 bits
    Bits10 = 1,
    /// 8 bits
    Bits8 = 2,
    /// 6 bits
    Bits6 = 3,
}

/// Order in which enabled channels are converted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ScanDirection {
    /// Lowest channel first
    Forward = 0,
    /// Highest channel first
    Backward = 1,
}

/// Hardware trigger edge.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TriggerEdge {
    /// Software start only
    None = 0,
    /// Rising edge
    Rising = 1,
    /// Falling edge
    Falling = 2,
    /// Both edges
    Both = 3,
}

/// Hardware trigger source.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[allow(missing_docs)]
pub enum TriggerSource {
    Lut0 = 0x0,
    Lut1 = 0x1,
    Lut2 = 0x2,
    Atim = 0x3,
    Gptim1 = 0x4,
    Gptim2 = 0x5,
    Bstim16 = 0x6,
    Lptim16 = 0x7,
    Comp1 = 0x8,
    Comp2 = 0x9,
    Rtca = 0xa,
    Lut3 = 0xb,
    Gptim0 = 0xc,
    Comp3 = 0xd,
}

/// Sampling time in ADCCLK cycles.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[allow(missing_docs)]
pub enum SamplingTime {
    Clk2 = 0x0,
    Clk4 = 0x1,
    Clk8 = 0x2,
    Clk12 = 0x3,
    Clk16 = 0x4,
    Clk32 = 0x5,
    Clk64 = 0x6,
    Clk80 = 0x7,
    Clk96 = 0x8,
    Clk128 = 0x9,
    Clk160 = 0xa,
    Clk192 = 0xb,
    Clk256 = 0xc,
    Clk320 = 0xd,
    Clk384 = 0xe,
    Clk512 = 0xf,
}

/// Number of samples accumulated per oversampled result.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[allow(missing_docs)]
pub enum OversamplingRatio {
    X2 = 0,
    X4 = 1,
    X8 = 2,
    X16 = 3,
    X32 = 4,
    X64 = 5,
    X128 = 6,
    X256 = 7,
}

/// Oversampling setup.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Oversampling {
    /// Accumulated samples
    pub ratio: OversamplingRatio,
    /// Right shift of the accumulator, 0..=8
    pub shift: u8,
}

/// Converter configuration applied by [`Adc::new`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[non_exhaustive]
pub struct AdcConfig {
    /// Converter clock
    pub clock: AdcClock,
    /// Positive reference
    pub reference: Reference,
    /// Resolution
    pub resolution: Resolution,
    /// Keep converting after the sequence ends
    pub continuous: bool,
    /// Each start converts a single channel of the sequence
    pub semi_auto: bool,
    /// Sequence order
    pub scan_direction: ScanDirection,
    /// Hardware trigger edge
    pub trigger_edge: TriggerEdge,
    /// Hardware trigger source
    pub trigger_source: TriggerSource,
    /// Overwrite unread results instead of keeping the old one
    pub overrun_overwrite: bool,
    /// Hold the next conversion until the data register is read
    pub wait: bool,
    /// Sampling time of fast channels
    pub fast_sampling: SamplingTime,
    /// Sampling time of slow channels
    pub slow_sampling: SamplingTime,
    /// Oversampling, `None` to disable
    pub oversampling: Option<Oversampling>,
}

impl AdcConfig {
    /// Single software triggered conversions from RCHF/16, 12 bits against VDDA.
    pub const fn new() -> Self {
        Self {
            clock: AdcClock::Kernel(AdcClockSource::Rchf, AdcPrescaler::Div16),
            reference: Reference::Vdda,
            resolution: Resolution::Bits12,
            continuous: false,
            semi_auto: false,
            scan_direction: ScanDirection::Forward,
            trigger_edge: TriggerEdge::None,
            trigger_source: TriggerSource::Lut0,
            overrun_overwrite: true,
            wait: true,
            fast_sampling: SamplingTime::Clk2,
            slow_sampling: SamplingTime::Clk512,
            oversampling: Some(Oversampling {
                ratio: OversamplingRatio::X16,
                shift: 4,
            }),
        }
    }

    /// Sets the converter clock.
    pub const fn clock(mut self, clock: AdcClock) -> Self {
        self.clock = clock;
        self
    }

    /// Sets the positive reference.
    pub const fn reference(mut self, reference: Reference) -> Self {
        self.reference = reference;
        self
    }

    /// Sets the resolution.
    pub const fn resolution(mut self, resolution: Resolution) -> Self {
        self.resolution = resolution;
        self
    }

    /// Sets the fast and slow channel sampling times.
    pub const fn sampling(mut self, fast: SamplingTime, slow: SamplingTime) -> Self {
        self.fast_sampling = fast;
        self.slow_sampling = slow;
        self
    }

    /// Sets the hardware trigger.
    pub const fn trigger(mut self, edge: TriggerEdge, source: TriggerSource) -> Self {
        self.trigger_edge = edge;
        self.trigger_source = source;
        self
    }

    /// Sets the oversampling, `None` disables it.
    pub const fn oversampling(mut self, oversampling: Option<Oversampling>) -> Self {
        self.oversampling = oversampling;
        self
    }
}

impl Default for AdcConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// ADC interrupt sources, also used to read and clear the matching status flag.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Event {
    /// A conversion finished
    EndOfConversion,
    /// The enabled channel sequence finished
    EndOfSequence,
    /// A result was lost
    Overrun,
    /// Calibration finished
    EndOfCalibration,
    /// Analog watchdog: result under the low threshold
    BelowLow,
    /// Analog watchdog: result above the high threshold
    AboveHigh,
}

impl Event {
    fn status(self) -> u32 {
        match self {
            Event::EndOfConversion => isr::EOC.mask(),
            Event::EndOfSequence => isr::EOS.mask(),
            Event::Overrun => isr::OVR.mask(),
            Event::EndOfCalibration => isr::EOCAL.mask(),
            Event::BelowLow => isr::AWD_UL.mask(),
            Event::AboveHigh => isr::AWD_AH.mask(),
        }
    }

    fn enable(self) -> u32 {
        match self {
            Event::EndOfConversion => ier::EOCIE.mask(),
            Event::EndOfSequence => ier::EOSIE.mask(),
            Event::Overrun => ier::OVRIE.mask(),
            Event::EndOfCalibration => ier::EOCALIE.mask(),
            Event::BelowLow => ier::AWD_ULIE.mask(),
            Event::AboveHigh => ier::AWD_AHIE.mask(),
        }
    }
}

/// Channel marker types for [`OneShot`].
pub mod channels {
    use super::Adc;
    use embedded_hal_0_2::adc::Channel;

    macro_rules! channel {
        ($($(#[$attr:meta])* $name:ident: $ch:expr;)+) => {
            $(
                $(#[$attr])*
                pub struct $name;

                impl $name {
                    /// Channel number
                    pub const ID: u8 = $ch;
                }

                impl Channel<Adc> for $name {
                    type ID = u8; // ADC channels are identified numerically

                    fn channel() -> u8 {
                        $ch
                    }
                }
            )+
        };
    }

    channel! {
        /// External input 0
        Ch0: 0;
        /// External input 1
        Ch1: 1;
        /// External input 2
        Ch2: 2;
        /// External input 3
        Ch3: 3;
        /// External input 4
        Ch4: 4;
        /// External input 5
        Ch5: 5;
        /// External input 6
        Ch6: 6;
        /// External input 7
        Ch7: 7;
        /// External input 8
        Ch8: 8;
        /// External input 9
        Ch9: 9;
        /// External input 10
        Ch10: 10;
        /// External input 11
        Ch11: 11;
        /// External input 12
        Ch12: 12;
        /// External input 13
        Ch13: 13;
        /// External input 14
        Ch14: 14;
        /// External input 15
        Ch15: 15;
        /// External input 16
        Ch16: 16;
        /// External input 17
        Ch17: 17;
        /// External input 18
        Ch18: 18;
        /// External input 19
        Ch19: 19;
        /// Internal 1.2 V reference
        Vref1p2: super::CH_VREF1P2;
        /// Temperature sensor
        TempSensor: super::CH_TS;
        /// AVREF
        Avref: super::CH_AVREF;
        /// VBAT / 3
        VbatDiv3: super::CH_VBAT_DIV3;
        /// VDD / 3
        VddDiv3: super::CH_VDD_DIV3;
        /// DAC output
        DacOut: super::CH_DAC;
        /// Operational amplifier output
        Opa: super::CH_OPA;
    }
}

fn channel_mask(channel: u8) -> Result<u32, Error> {
    match channel {
        0..=19 | CH_VREF1P2..=CH_OPA => Ok(1 << channel),
        _ => Err(Error::InvalidChannel),
    }
}

fn wait_for(rb: &RegisterBlock, flag: u32) -> Result<(), Error> {
    for _ in 0..WAIT_LIMIT {
        if rb.isr.read() & flag != 0 {
            return Ok(());
        }
    }
    Err(Error::Timeout)
}

fn clear_flags(rb: &RegisterBlock, flags: u32) {
    // write one to clear
    let pending = rb.isr.read() & flags;
    if pending != 0 {
        rb.isr.write(pending);
    }
}

/// Powers VREF1P2 and the temperature sensor and waits for the reference
/// to settle.
pub(crate) fn enable_reference(rb: &vref::RegisterBlock) -> Result<(), Error> {
    if !rb.cr.bit(vref::cr::EN) {
        // write one to clear, so RDY below belongs to this start
        rb.sr.write(vref::sr::RDYIF.mask());
        rb.cr.set_bits(vref::cr::EN.mask());
    }
    rb.cr.set_bits(vref::cr::PTAT_EN.mask());
    for _ in 0..WAIT_LIMIT {
        if rb.sr.bit(vref::sr::RDY) {
            return Ok(());
        }
    }
    #[cfg(feature = "defmt")]
    defmt::warn!("VREF1P2 did not settle");
    Err(Error::Timeout)
}

/// The reference comes up first, the calibration runs against it.
pub(crate) fn power_up(rb: &RegisterBlock, reference: &vref::RegisterBlock) -> Result<(), Error> {
    enable_reference(reference)?;
    calibrate(rb)
}

/// Runs the offset calibration. The converter is left disabled, the result
/// survives.
pub(crate) fn calibrate(rb: &RegisterBlock) -> Result<(), Error> {
    rb.cr1.set_bits(cr1::ADEN.mask());
    rb.calr.set_bits(calr::CALEN.mask());
    let done = wait_for(rb, isr::EOCAL.mask());
    clear_flags(rb, isr::EOCAL.mask());
    rb.cr1.clear_bits(cr1::ADEN.mask());
    done
}

pub(crate) fn configure(rb: &RegisterBlock, config: &AdcConfig) {
    let (clksel, apb_psc) = match config.clock {
        AdcClock::Kernel(..) => (0, 0),
        AdcClock::Apb(psc) => (1, psc as u32),
    };
    rb.cfgr1.modify(|r| {
        let r = cfgr1::PEFSEL.set(r, config.reference as u32);
        let r = cfgr1::CLKSEL.set(r, clksel);
        let r = cfgr1::BITSEL.set(r, config.resolution as u32);
        let r = cfgr1::APBCLK_PSC.set(r, apb_psc);
        cfgr1::EXSOC.set(r, 0)
    });

    let (ovsen, ovsr, ovss) = match config.oversampling {
        Some(o) => (1, o.ratio as u32, u32::from(o.shift.min(8))),
        None => (0, 0, 0),
    };
    rb.cfgr2.modify(|r| {
        let r = cfgr2::CONT.set(r, config.continuous as u32);
        let r = cfgr2::SEMI.set(r, config.semi_auto as u32);
        let r = cfgr2::WAIT.set(r, config.wait as u32);
        let r = cfgr2::OVRM.set(r, config.overrun_overwrite as u32);
        let r = cfgr2::SCANDIR.set(r, config.scan_direction as u32);
        let r = cfgr2::EXTS.set(r, config.trigger_source as u32);
        let r = cfgr2::OVSR.set(r, ovsr);
        let r = cfgr2::OVSS.set(r, ovss);
        cfgr2::OVSEN.set(r, ovsen)
    });

    rb.cr2.write_field(cr2::TRGCFG, config.trigger_edge as u32);
    rb.smtr.modify(|r| {
        let r = smtr::SMTS1.set(r, config.slow_sampling as u32);
        smtr::SMTS2.set(r, config.fast_sampling as u32)
    });
}

/// One software triggered conversion of `channel`.
pub(crate) fn convert(rb: &RegisterBlock, channel: u8) -> Result<u16, Error> {
    let mask = channel_mask(channel)?;
    rb.cher.write(mask);
    clear_flags(rb, isr::EOC.mask());
    rb.cr1.set_bits(cr1::ADEN.mask());
    rb.cr1.set_bits(cr1::SWTRIG.mask());

    let done = wait_for(rb, isr::EOC.mask());
    clear_flags(rb, isr::EOC.mask());
    let data = rb.dr.read_field(dr::DATA) as u16;

    rb.cr1.clear_bits(cr1::ADEN.mask());
    rb.cher.write(0);
    done.map(|()| data)
}

/// Scales a 12 bit `sample` to millivolts from a VREF1P2 conversion taken
/// under the same conditions.
pub fn to_millivolts(sample: u16, vref_sample: u16, vref_cal: u16) -> u32 {
    let num = u64::from(sample) * CAL_VDDA_MV * u64::from(vref_cal);
    let den = u64::from(vref_sample) * FULL_SCALE;
    num.checked_div(den).unwrap_or(0) as u32
}

pub(crate) fn set_watchdog(
    rb: &RegisterBlock,
    low: u16,
    high: u16,
    channel: Option<u8>,
) -> Result<(), Error> {
    let (single, ch) = match channel {
        Some(ch @ 0..=15) => (1, u32::from(ch)),
        Some(_) => return Err(Error::InvalidChannel),
        None => (0, 0),
    };
    rb.hltr.modify(|r| {
        let r = hltr::AWD_LT.set(r, u32::from(low));
        hltr::AWD_HT.set(r, u32::from(high))
    });
    rb.cfgr2.modify(|r| {
        let r = cfgr2::AWDSC.set(r, single);
        let r = cfgr2::AWDCH.set(r, ch);
        cfgr2::AWDEN.set(r, 1)
    });
    Ok(())
}

/// Analog to Digital Converter (ADC).
///
/// Created calibrated and configured. Conversions are started by software
/// with [`Adc::read_channel`] or the [`OneShot::read()`][a] trait method, or
/// by hardware triggers over the sequence set with [`Adc::set_sequence`].
///
/// [a]: embedded_hal_0_2::adc::OneShot::read
pub struct Adc {
    device: pac::ADC,
    config: AdcConfig,
}

impl Adc {
    /// Bring the ADC out of reset, power the internal reference, calibrate
    /// and apply `config`.
    ///
    /// VREF1P2 and the temperature sensor stay on after the ADC is freed.
    pub fn new(
        device: pac::ADC,
        config: AdcConfig,
        vref: &mut pac::VREF,
        rmu: &mut pac::RMU,
        cmu: &mut pac::CMU,
    ) -> Result<Self, Error> {
        device.reset_bring_down(rmu);
        device.reset_bring_up(rmu);
        device.enable_clock(cmu);
        if let AdcClock::Kernel(source, prescaler) = config.clock {
            cmu::select_adc_source(cmu, source, prescaler);
        }
        vref.enable_clock(cmu);

        power_up(&device, vref)?;
        configure(&device, &config);

        #[cfg(feature = "defmt")]
        defmt::debug!("adc calibrated, {}", config);

        Ok(Self { device, config })
    }

    /// Free underlying register block
    pub fn free(self) -> pac::ADC {
        self.device
    }

    /// The configuration applied at creation.
    pub fn config(&self) -> &AdcConfig {
        &self.config
    }

    /// Blocking single conversion of `channel` (0..=19 external, 24..=30
    /// internal).
    pub fn read_channel(&mut self, channel: u8) -> Result<u16, Error> {
        convert(&self.device, channel)
    }

    /// Converts `channel` and scales it to millivolts against the internal
    /// 1.2 V reference and its factory calibration.
    pub fn read_millivolts(&mut self, channel: u8) -> Result<u32, Error> {
        let vref_sample = convert(&self.device, CH_VREF1P2)?;
        let sample = convert(&self.device, channel)?;
        Ok(to_millivolts(sample, vref_sample, vref1p2_calibration()))
    }

    /// Enables the channels converted by hardware triggers or
    /// [`Adc::start`].
    pub fn set_sequence(&mut self, channels: &[u8]) -> Result<(), Error> {
        let mask = channels
            .iter()
            .try_fold(0, |acc, &ch| channel_mask(ch).map(|m| acc | m))?;
        self.device.cher.write(mask);
        Ok(())
    }

    /// Enables the converter and starts the sequence by software.
    pub fn start(&mut self) {
        self.device.cr1.set_bits(cr1::ADEN.mask());
        self.device.cr1.set_bits(cr1::SWTRIG.mask());
    }

    /// Disables the converter.
    pub fn stop(&mut self) {
        self.device.cr1.clear_bits(cr1::ADEN.mask());
    }

    /// Latest conversion result.
    pub fn read_data(&self) -> u16 {
        self.device.dr.read_field(dr::DATA) as u16
    }

    /// Address of the data register, for DMA transfers.
    pub fn data_address(&self) -> u32 {
        &self.device.dr as *const _ as u32
    }

    /// Requests a DMA transfer for every result.
    pub fn enable_dma(&mut self) {
        self.device.cfgr2.set_bits(cfgr2::DMAEN.mask());
    }

    /// Stops DMA requests.
    pub fn disable_dma(&mut self) {
        self.device.cfgr2.clear_bits(cfgr2::DMAEN.mask());
    }

    /// Arms the analog watchdog on one channel (0..=15) or, with `None`,
    /// on every converted channel.
    pub fn set_watchdog(&mut self, low: u16, high: u16, channel: Option<u8>) -> Result<(), Error> {
        set_watchdog(&self.device, low, high, channel)
    }

    /// Disarms the analog watchdog.
    pub fn disable_watchdog(&mut self) {
        self.device.cfgr2.clear_bits(cfgr2::AWDEN.mask());
    }

    /// Enables an interrupt source.
    pub fn enable_interrupt(&mut self, event: Event) {
        self.device.ier.set_bits(event.enable());
    }

    /// Disables an interrupt source.
    pub fn disable_interrupt(&mut self, event: Event) {
        self.device.ier.clear_bits(event.enable());
    }

    /// Status flag of `event`.
    pub fn is_pending(&self, event: Event) -> bool {
        self.device.isr.read() & event.status() != 0
    }

    /// Clears the status flag of `event`.
    pub fn clear(&mut self, event: Event) {
        self.device.isr.write(event.status());
    }

    /// A conversion or calibration is ongoing.
    pub fn is_busy(&self) -> bool {
        self.device.isr.bit(isr::BUSY)
    }
}

fn vref1p2_calibration() -> u16 {
    // SAFETY: read only factory information area
    unsafe { core::ptr::read_volatile(VREF1P2_CAL) }
}

impl<WORD, SRC> OneShot<Adc, WORD, SRC> for Adc
where
    WORD: From<u16>,
    SRC: Channel<Adc, ID = u8>,
{
    type Error = Error;

    fn read(&mut self, _pin: &mut SRC) -> nb::Result<WORD, Self::Error> {
        Ok(self.read_channel(SRC::channel())?.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block() -> RegisterBlock {
        unsafe { core::mem::zeroed() }
    }

    fn reference() -> vref::RegisterBlock {
        unsafe { core::mem::zeroed() }
    }

    #[test]
    fn reference_start_times_out_without_ready() {
        let vr = reference();
        assert_eq!(enable_reference(&vr), Err(Error::Timeout));
        assert!(vr.cr.bit(vref::cr::EN));
        assert!(vr.cr.bit(vref::cr::PTAT_EN));
        // stale ready edge acknowledged before the start
        assert_eq!(vr.sr.read(), vref::sr::RDYIF.mask());
    }

    #[test]
    fn running_reference_keeps_its_ready_flag() {
        let vr = reference();
        vr.cr.write(vref::cr::EN.mask());
        vr.sr.write(vref::sr::RDY.mask());
        assert_eq!(enable_reference(&vr), Ok(()));
        assert!(vr.cr.bit(vref::cr::PTAT_EN));
        assert_eq!(vr.sr.read(), vref::sr::RDY.mask());
    }

    #[test]
    fn calibration_waits_for_the_reference() {
        let rb = block();
        let vr = reference();
        rb.isr.write(isr::EOCAL.mask());
        assert_eq!(power_up(&rb, &vr), Err(Error::Timeout));
        assert!(vr.cr.bit(vref::cr::EN));
        assert!(vr.cr.bit(vref::cr::PTAT_EN));
        assert!(!rb.calr.bit(calr::CALEN));
        assert!(!rb.cr1.bit(cr1::ADEN));

        vr.sr.set_bits(vref::sr::RDY.mask());
        assert_eq!(power_up(&rb, &vr), Ok(()));
        assert!(rb.calr.bit(calr::CALEN));
    }

    #[test]
    fn calibration_times_out_without_flag() {
        let rb = block();
        assert_eq!(calibrate(&rb), Err(Error::Timeout));
        assert!(!rb.cr1.bit(cr1::ADEN));
        assert!(rb.calr.bit(calr::CALEN));
    }

    #[test]
    fn calibration_completes() {
        let rb = block();
        rb.isr.write(isr::EOCAL.mask());
        assert_eq!(calibrate(&rb), Ok(()));
        assert!(!rb.cr1.bit(cr1::ADEN));
    }

    #[test]
    fn default_config_layout() {
        let rb = block();
        configure(&rb, &AdcConfig::default());
        assert_eq!(rb.cfgr1.read(), 0);
        let cfgr2 = rb.cfgr2.read();
        assert_eq!(cfgr2::OVSEN.get(cfgr2), 1);
        assert_eq!(cfgr2::OVSR.get(cfgr2), OversamplingRatio::X16 as u32);
        assert_eq!(cfgr2::OVSS.get(cfgr2), 4);
        assert_eq!(cfgr2::WAIT.get(cfgr2), 1);
        assert_eq!(cfgr2::OVRM.get(cfgr2), 1);
        assert_eq!(cfgr2::CONT.get(cfgr2), 0);
        assert_eq!(rb.smtr.read_field(smtr::SMTS1), SamplingTime::Clk512 as u32);
        assert_eq!(rb.smtr.read_field(smtr::SMTS2), SamplingTime::Clk2 as u32);
    }

    #[test]
    fn apb_clock_reference_and_resolution() {
        let rb = block();
        let config = AdcConfig::new()
            .clock(AdcClock::Apb(ApbPrescaler::Div4))
            .reference(Reference::Vrefp)
            .resolution(Resolution::Bits8)
            .trigger(TriggerEdge::Both, TriggerSource::Bstim16)
            .oversampling(None);
        configure(&rb, &config);
        let cfgr1 = rb.cfgr1.read();
        assert_eq!(cfgr1::CLKSEL.get(cfgr1), 1);
        assert_eq!(cfgr1::APBCLK_PSC.get(cfgr1), 2);
        assert_eq!(cfgr1::PEFSEL.get(cfgr1), 1);
        assert_eq!(cfgr1::BITSEL.get(cfgr1), 2);
        assert_eq!(rb.cr2.read_field(cr2::TRGCFG), 3);
        assert_eq!(rb.cfgr2.read_field(cfgr2::EXTS), 6);
        assert_eq!(rb.cfgr2.read_field(cfgr2::OVSEN), 0);
    }

    #[test]
    fn conversion_returns_data() {
        let rb = block();
        rb.isr.write(isr::EOC.mask());
        rb.dr.write(0x0ABC);
        assert_eq!(convert(&rb, 5), Ok(0x0ABC));
        assert_eq!(rb.cher.read(), 0);
        assert!(rb.cr1.bit(cr1::SWTRIG));
        assert!(!rb.cr1.bit(cr1::ADEN));
    }

    #[test]
    fn conversion_times_out() {
        let rb = block();
        assert_eq!(convert(&rb, channels::Ch3::ID), Err(Error::Timeout));
        assert!(!rb.cr1.bit(cr1::ADEN));
    }

    #[test]
    fn unknown_channels_are_rejected() {
        let rb = block();
        assert_eq!(convert(&rb, 20), Err(Error::InvalidChannel));
        assert_eq!(convert(&rb, 31), Err(Error::InvalidChannel));
        assert_eq!(rb.cr1.read(), 0);
        assert_eq!(channel_mask(channels::Opa::ID), Ok(1 << 30));
        assert_eq!(channel_mask(channels::Vref1p2::ID), Ok(1 << 24));
    }

    #[test]
    fn millivolt_scaling() {
        // VDDA equal to the calibration conditions reads back the input
        assert_eq!(to_millivolts(4095, 1638, 1638), 3000);
        assert_eq!(to_millivolts(2048, 1638, 1638), 1500);
        // VDDA at 3.3 V: the reference converts lower
        assert_eq!(to_millivolts(1000, 1489, 1638), 805);
        assert_eq!(to_millivolts(1000, 0, 1638), 0);
    }

    #[test]
    fn watchdog_single_channel() {
        let rb = block();
        assert_eq!(set_watchdog(&rb, 100, 3000, Some(7)), Ok(()));
        assert_eq!(rb.hltr.read_field(hltr::AWD_LT), 100);
        assert_eq!(rb.hltr.read_field(hltr::AWD_HT), 3000);
        let cfgr2 = rb.cfgr2.read();
        assert_eq!(cfgr2::AWDEN.get(cfgr2), 1);
        assert_eq!(cfgr2::AWDSC.get(cfgr2), 1);
        assert_eq!(cfgr2::AWDCH.get(cfgr2), 7);
        assert_eq!(set_watchdog(&rb, 0, 1, Some(16)), Err(Error::InvalidChannel));
    }

    #[test]
    fn event_bits_line_up() {
        for event in [
            Event::EndOfConversion,
            Event::EndOfSequence,
            Event::Overrun,
            Event::EndOfCalibration,
            Event::BelowLow,
            Event::AboveHigh,
        ] {
            assert_eq!(event.status(), event.enable());
        }
    }
}
