//! Digital-Analog Converter (DAC)
//!
//! Single 12 bit channel with an optional output buffer and a sample and
//! hold stage. The output is updated by a write to the data register, or on
//! a trigger when trigger mode is on.
//!
//! ## Usage
//!
//! ```ignore
//! use fm33lg0_hal::{dac::{Dac, DacConfig}, pac};
//! let mut p = pac::Peripherals::take().unwrap();
//! let mut dac = Dac::new(p.DAC, DacConfig::default(), &mut p.RMU, &mut p.CMU);
//! dac.write(2048);
//! ```

use crate::cmu::BusClock;
use crate::pac::{
    self,
    dac::{cfgr, cr1, cr2, dhr, ier, isr, shtr, swtrgr, RegisterBlock},
};
use crate::rmu::SubsystemReset;

/// Largest value the converter takes.
pub const MAX_VALUE: u16 = 0x0FFF;

/// Trigger that moves the data register to the output in trigger mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[allow(missing_docs)]
pub enum Trigger {
    /// [`Dac::software_trigger`]
    Software = 0x0,
    Atim = 0x1,
    Gptim1 = 0x2,
    Gptim2 = 0x3,
    Bstim16 = 0x4,
    Lptim16 = 0x5,
    Exti0 = 0xc,
    Exti4 = 0xd,
    Exti8 = 0xe,
    Exti12 = 0xf,
}

/// Sample and hold timing, in LSCLK cycles.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SampleHold {
    /// Sampling phase
    pub sample_time: u8,
    /// Holding phase
    pub hold_time: u16,
}

/// DAC configuration
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[non_exhaustive]
pub struct DacConfig {
    /// Trigger mode, `None` updates the output on every write
    pub trigger: Option<Trigger>,
    /// Sample and hold mode, `None` drives continuously
    pub sample_hold: Option<SampleHold>,
    /// Output buffer
    pub buffer: bool,
    /// Route the output back to the ADC and comparators
    pub feedback_switch: bool,
}

impl DacConfig {
    /// Direct output through the buffer.
    pub const fn new() -> Self {
        Self {
            trigger: None,
            sample_hold: None,
            buffer: true,
            feedback_switch: false,
        }
    }

    /// Sets the trigger.
    pub const fn trigger(mut self, trigger: Option<Trigger>) -> Self {
        self.trigger = trigger;
        self
    }

    /// Sets the sample and hold timing.
    pub const fn sample_hold(mut self, sample_hold: Option<SampleHold>) -> Self {
        self.sample_hold = sample_hold;
        self
    }

    /// Sets the output buffer.
    pub const fn buffer(mut self, buffer: bool) -> Self {
        self.buffer = buffer;
        self
    }

    /// Sets the feedback switch.
    pub const fn feedback_switch(mut self, on: bool) -> Self {
        self.feedback_switch = on;
        self
    }
}

impl Default for DacConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// DAC interrupt sources and status flags.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Event {
    /// The output took the data register value
    DataUpdated,
    /// Sampling phase ended
    EndOfSampling,
    /// Holding phase ended
    EndOfHolding,
    /// A DMA request was not served in time
    DmaError,
}

impl Event {
    fn status(self) -> u32 {
        match self {
            Event::DataUpdated => isr::DOU.mask(),
            Event::EndOfSampling => isr::EOS.mask(),
            Event::EndOfHolding => isr::EOH.mask(),
            Event::DmaError => isr::DMAERR.mask(),
        }
    }

    fn enable(self) -> u32 {
        match self {
            Event::DataUpdated => ier::DOU_IE.mask(),
            Event::EndOfSampling => ier::EOS_IE.mask(),
            Event::EndOfHolding => ier::EOH_IE.mask(),
            Event::DmaError => ier::DMAE_IE.mask(),
        }
    }
}

/// Applies `config` with the converter stopped.
pub(crate) fn configure(rb: &RegisterBlock, config: &DacConfig) {
    rb.cr1.clear_bits(cr1::EN.mask());

    let (trigger_mode, source) = match config.trigger {
        Some(t) => (true, t as u32),
        None => (false, 0),
    };
    rb.cfgr.modify(|r| {
        let r = cfgr::TRGSEL.set(r, source);
        let r = cfgr::BUFEN.set(r, config.buffer as u32);
        let r = cfgr::SWIEN.set(r, config.feedback_switch as u32);
        cfgr::SHEN.set(r, config.sample_hold.is_some() as u32)
    });
    rb.cr2.write_bit(cr2::TRGEN, trigger_mode);

    if let Some(sh) = config.sample_hold {
        rb.shtr.modify(|r| {
            let r = shtr::TSMPL.set(r, u32::from(sh.sample_time));
            shtr::THLD.set(r, u32::from(sh.hold_time))
        });
    }
}

pub(crate) fn write(rb: &RegisterBlock, value: u16) {
    rb.dhr.write_field(dhr::DHR, u32::from(value.min(MAX_VALUE)));
}

/// Digital to Analog Converter (DAC).
pub struct Dac {
    device: pac::DAC,
    config: DacConfig,
}

impl Dac {
    /// Brings the DAC out of reset, applies `config` and enables it.
    pub fn new(
        device: pac::DAC,
        config: DacConfig,
        rmu: &mut pac::RMU,
        cmu: &mut pac::CMU,
    ) -> Self {
        device.reset_bring_down(rmu);
        device.reset_bring_up(rmu);
        device.enable_clock(cmu);

        configure(&device, &config);
        device.cr1.set_bits(cr1::EN.mask());

        Self { device, config }
    }

    /// Disables the DAC and frees the underlying register block.
    pub fn free(self) -> pac::DAC {
        self.device.cr1.clear_bits(cr1::EN.mask());
        self.device
    }

    /// The active configuration.
    pub fn config(&self) -> &DacConfig {
        &self.config
    }

    /// Stops the converter, applies `config` and restarts it.
    pub fn reconfigure(&mut self, config: DacConfig) {
        configure(&self.device, &config);
        self.device.cr1.set_bits(cr1::EN.mask());
        self.config = config;
    }

    /// Loads a new output value. Values above [`MAX_VALUE`] saturate.
    pub fn write(&mut self, value: u16) {
        write(&self.device, value)
    }

    /// The value in the data register.
    pub fn read(&self) -> u16 {
        self.device.dhr.read_field(dhr::DHR) as u16
    }

    /// Moves the data register to the output when [`Trigger::Software`]
    /// is selected.
    pub fn software_trigger(&mut self) {
        self.device.swtrgr.write(swtrgr::SWTRIG.mask());
    }

    /// Starts the converter.
    pub fn enable(&mut self) {
        self.device.cr1.set_bits(cr1::EN.mask());
    }

    /// Stops the converter.
    pub fn disable(&mut self) {
        self.device.cr1.clear_bits(cr1::EN.mask());
    }

    /// Requests a DMA transfer on every trigger.
    pub fn enable_dma(&mut self) {
        self.device.cr2.set_bits(cr2::DMAEN.mask());
    }

    /// Stops DMA requests.
    pub fn disable_dma(&mut self) {
        self.device.cr2.clear_bits(cr2::DMAEN.mask());
    }

    /// Address of the data register, for DMA transfers.
    pub fn data_address(&self) -> u32 {
        &self.device.dhr as *const _ as u32
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
        // write one to clear
        self.device.isr.write(event.status());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block() -> RegisterBlock {
        unsafe { core::mem::zeroed() }
    }

    #[test]
    fn default_is_buffered_direct_output() {
        let rb = block();
        configure(&rb, &DacConfig::default());
        assert_eq!(rb.cfgr.read(), cfgr::BUFEN.mask());
        assert_eq!(rb.cr2.read(), 0);
        assert_eq!(rb.shtr.read(), 0);
    }

    #[test]
    fn triggered_sample_and_hold() {
        let rb = block();
        rb.cr1.write(cr1::EN.mask());
        let config = DacConfig::new()
            .trigger(Some(Trigger::Exti4))
            .sample_hold(Some(SampleHold {
                sample_time: 0x20,
                hold_time: 0x1234,
            }))
            .buffer(false)
            .feedback_switch(true);
        configure(&rb, &config);

        // configuration happens with the converter off
        assert!(!rb.cr1.bit(cr1::EN));
        assert!(rb.cr2.bit(cr2::TRGEN));
        let cfgr = rb.cfgr.read();
        assert_eq!(cfgr::TRGSEL.get(cfgr), 0xd);
        assert_eq!(cfgr::SHEN.get(cfgr), 1);
        assert_eq!(cfgr::SWIEN.get(cfgr), 1);
        assert_eq!(cfgr::BUFEN.get(cfgr), 0);
        assert_eq!(rb.shtr.read_field(shtr::TSMPL), 0x20);
        assert_eq!(rb.shtr.read_field(shtr::THLD), 0x1234);
    }

    #[test]
    fn data_saturates_at_twelve_bits() {
        let rb = block();
        write(&rb, 0x0800);
        assert_eq!(rb.dhr.read(), 0x0800);
        write(&rb, 0xFFFF);
        assert_eq!(rb.dhr.read(), 0x0FFF);
    }

    #[test]
    fn event_bits_line_up() {
        for event in [
            Event::DataUpdated,
            Event::EndOfSampling,
            Event::EndOfHolding,
            Event::DmaError,
        ] {
            assert_eq!(event.status(), event.enable());
        }
    }
}
