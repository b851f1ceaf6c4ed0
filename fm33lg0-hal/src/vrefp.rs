//! External reference voltage generator (VREFP)
//!
//! Drives the VREFP pin, usable as the ADC reference. In periodic mode the
//! regulator only drives the pin for a short time every period and relies
//! on the external capacitor in between.
//!
//! ```ignore
//! let vrefp = Vrefp::new(p.VREFP, VrefpConfig::new(Voltage::V2p5), &mut p.RMU, &mut p.CMU);
//! ```

use crate::cmu::BusClock;
use crate::pac::{
    self,
    vrefp::{cfgr, cr, isr, tr, trim, RegisterBlock},
};
use crate::rmu::SubsystemReset;

/// Output voltage.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Voltage {
    /// 2.0 V
    V2p0 = 0,
    /// 2.5 V
    V2p5 = 1,
    /// 3.0 V
    V3p0 = 2,
    /// 4.5 V
    V4p5 = 3,
    /// 1.5 V
    V1p5 = 4,
}

impl Voltage {
    fn trim_address(self) -> usize {
        match self {
            Voltage::V2p0 => trim::V2P0,
            Voltage::V2p5 => trim::V2P5,
            Voltage::V3p0 => trim::V3P0,
            Voltage::V4p5 => trim::V4P5,
            Voltage::V1p5 => trim::V1P5,
        }
    }

    /// Factory trim value of this output voltage.
    pub fn factory_trim(self) -> u8 {
        // SAFETY: read only factory information area
        let word = unsafe { core::ptr::read_volatile(self.trim_address() as *const u32) };
        word as u8
    }

    /// Nominal output in millivolts.
    pub const fn millivolts(self) -> u32 {
        match self {
            Voltage::V2p0 => 2000,
            Voltage::V2p5 => 2500,
            Voltage::V3p0 => 3000,
            Voltage::V4p5 => 4500,
            Voltage::V1p5 => 1500,
        }
    }
}

/// Time between two drive phases in periodic mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[allow(missing_docs)]
pub enum Period {
    Ms1 = 0,
    Ms4 = 1,
    Ms16 = 2,
    Ms32 = 3,
    Ms64 = 4,
    Ms256 = 5,
    Ms1000 = 6,
    Ms4000 = 7,
}

/// Length of a drive phase in LSCLK cycles.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[allow(missing_docs)]
pub enum DriveTime {
    Lsclk4 = 0,
    Lsclk8 = 1,
    Lsclk16 = 2,
    Lsclk32 = 3,
    Lsclk64 = 4,
    Lsclk128 = 5,
    Lsclk256 = 6,
    Lsclk512 = 7,
}

/// Regulator operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Mode {
    /// Always driving
    Continuous,
    /// Drive for `drive` every `period`
    Periodic {
        /// Period
        period: Period,
        /// Drive phase
        drive: DriveTime,
    },
}

/// VREFP configuration
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[non_exhaustive]
pub struct VrefpConfig {
    /// Output voltage
    pub voltage: Voltage,
    /// Operation
    pub mode: Mode,
}

impl VrefpConfig {
    /// Continuous output at `voltage`.
    pub const fn new(voltage: Voltage) -> Self {
        Self {
            voltage,
            mode: Mode::Continuous,
        }
    }

    /// Sets the operation mode.
    pub const fn mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }
}

/// VREFP events
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Event {
    /// A period elapsed
    EndOfPeriod,
    /// A drive phase ended
    DrivingEnd,
}

impl Event {
    fn status(self) -> u32 {
        match self {
            Event::EndOfPeriod => isr::POV.mask(),
            Event::DrivingEnd => isr::DEND.mask(),
        }
    }

    fn enable(self) -> u32 {
        match self {
            Event::EndOfPeriod => cr::POVIE.mask(),
            Event::DrivingEnd => cr::DENDIE.mask(),
        }
    }
}

pub(crate) fn configure(rb: &RegisterBlock, config: &VrefpConfig, trim: u8) {
    let (lpm, period, drive) = match config.mode {
        Mode::Continuous => (0, 0, 0),
        Mode::Periodic { period, drive } => (1, period as u32, drive as u32),
    };
    rb.cfgr.modify(|r| {
        let r = cfgr::VRS.set(r, config.voltage as u32);
        let r = cfgr::TPERIOD.set(r, period);
        let r = cfgr::TDRV.set(r, drive);
        cfgr::LPM.set(r, lpm)
    });
    rb.tr.write_field(tr::TRIM, u32::from(trim));
}

/// External reference voltage generator.
pub struct Vrefp {
    device: pac::VREFP,
    config: VrefpConfig,
}

impl Vrefp {
    /// Brings the regulator out of reset, loads the factory trim of the
    /// selected voltage and starts it.
    pub fn new(
        device: pac::VREFP,
        config: VrefpConfig,
        rmu: &mut pac::RMU,
        cmu: &mut pac::CMU,
    ) -> Self {
        device.reset_bring_down(rmu);
        device.reset_bring_up(rmu);
        device.enable_clock(cmu);

        configure(&device, &config, config.voltage.factory_trim());
        device.cr.set_bits(cr::EN.mask());

        #[cfg(feature = "defmt")]
        defmt::debug!("vrefp {} mV", config.voltage.millivolts());

        Self { device, config }
    }

    /// Stops the regulator and frees the register block.
    pub fn free(self) -> pac::VREFP {
        self.device.cr.clear_bits(cr::EN.mask());
        self.device
    }

    /// The active configuration.
    pub fn config(&self) -> &VrefpConfig {
        &self.config
    }

    /// Switches to another voltage or mode, reloading the factory trim.
    pub fn reconfigure(&mut self, config: VrefpConfig) {
        configure(&self.device, &config, config.voltage.factory_trim());
        self.config = config;
    }

    /// Starts the regulator.
    pub fn enable(&mut self) {
        self.device.cr.set_bits(cr::EN.mask());
    }

    /// Stops the regulator.
    pub fn disable(&mut self) {
        self.device.cr.clear_bits(cr::EN.mask());
    }

    /// Is the regulator running.
    pub fn is_enabled(&self) -> bool {
        self.device.cr.bit(cr::EN)
    }

    /// The regulator is driving the pin.
    pub fn is_busy(&self) -> bool {
        self.device.isr.bit(isr::BUSY)
    }

    /// Current trim value.
    pub fn trim(&self) -> u8 {
        self.device.tr.read_field(tr::TRIM) as u8
    }

    /// Overrides the trim value.
    pub fn set_trim(&mut self, trim: u8) {
        self.device.tr.write_field(tr::TRIM, u32::from(trim));
    }

    /// Enables an interrupt source.
    pub fn enable_interrupt(&mut self, event: Event) {
        self.device.cr.set_bits(event.enable());
    }

    /// Disables an interrupt source.
    pub fn disable_interrupt(&mut self, event: Event) {
        self.device.cr.clear_bits(event.enable());
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
    fn continuous_output() {
        let rb = block();
        configure(&rb, &VrefpConfig::new(Voltage::V3p0), 0x5A);
        let cfgr = rb.cfgr.read();
        assert_eq!(cfgr::VRS.get(cfgr), 2);
        assert_eq!(cfgr::LPM.get(cfgr), 0);
        assert_eq!(rb.tr.read(), 0x5A);
    }

    #[test]
    fn periodic_output() {
        let rb = block();
        let config = VrefpConfig::new(Voltage::V1p5).mode(Mode::Periodic {
            period: Period::Ms1000,
            drive: DriveTime::Lsclk64,
        });
        configure(&rb, &config, 0);
        let cfgr = rb.cfgr.read();
        assert_eq!(cfgr::VRS.get(cfgr), 4);
        assert_eq!(cfgr::LPM.get(cfgr), 1);
        assert_eq!(cfgr::TPERIOD.get(cfgr), 6);
        assert_eq!(cfgr::TDRV.get(cfgr), 4);
    }

    #[test]
    fn trim_words_follow_voltage_codes() {
        assert_eq!(Voltage::V2p0.trim_address(), 0x1FFF_FA90);
        assert_eq!(Voltage::V4p5.trim_address(), 0x1FFF_FA84);
        assert_eq!(Voltage::V1p5.trim_address(), 0x1FFF_FA94);
    }

    #[test]
    fn event_bits() {
        assert_eq!(Event::EndOfPeriod.status(), 1 << 0);
        assert_eq!(Event::DrivingEnd.status(), 1 << 1);
        assert_eq!(Event::EndOfPeriod.enable(), 1 << 1);
        assert_eq!(Event::DrivingEnd.enable(), 1 << 2);
    }
}
