//! Operational amplifiers (OPA1, OPA2)
//!
//! Each amplifier runs standalone, as a unity gain buffer, or as a
//! programmable gain amplifier with its internal feedback network. The
//! output can be converted by the ADC through its OPA channel.
//!
//! Both amplifiers share one bus clock and one reset line, so [`Opa::new`]
//! only enables the clock and [`Opa::free`] leaves it running.
//!
//! ```ignore
//! let config = OpaConfig::new(PositiveInput::Inp1, NegativeInput::Inn1)
//!     .mode(OpaMode::Pga(Gain::NonInverting4));
//! let mut opa = Opa::new(p.OPA1, &config, &mut p.CMU);
//! opa.enable();
//! ```
use core::ops::Deref;

use crate::cmu::BusClock;
use crate::pac::{
    self,
    opa::{calr, cor, cr, RegisterBlock},
};
use crate::typelevel::Sealed;

/// Trait to handle the underlying devices (OPA1, OPA2)
pub trait OpaDevice: Deref<Target = RegisterBlock> + BusClock + Sealed + 'static {}

impl Sealed for pac::OPA1 {}
impl OpaDevice for pac::OPA1 {}
impl Sealed for pac::OPA2 {}
impl OpaDevice for pac::OPA2 {}

/// Positive input.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PositiveInput {
    /// INP1 pin
    Inp1 = 0,
    /// INP2 pin
    Inp2 = 1,
    /// DAC output
    Dac = 2,
}

/// Negative input.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum NegativeInput {
    /// INN1 pin
    Inn1 = 0,
    /// INN2 pin
    Inn2 = 1,
}

/// PGA gain. Inverting gains feed back to the negative input, non inverting
/// ones to ground.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[allow(missing_docs)]
pub enum Gain {
    NonInverting2,
    NonInverting4,
    NonInverting8,
    NonInverting16,
    Inverting1,
    Inverting3,
    Inverting7,
    Inverting15,
}

impl Gain {
    /// MSEL and PGA_GAIN codes.
    fn codes(self) -> (u32, u32) {
        const FB_TO_NEGATIVE: u32 = 1;
        const FB_TO_GND: u32 = 2;
        match self {
            Gain::NonInverting2 => (FB_TO_GND, 0),
            Gain::NonInverting4 => (FB_TO_GND, 1),
            Gain::NonInverting8 => (FB_TO_GND, 2),
            Gain::NonInverting16 => (FB_TO_GND, 3),
            Gain::Inverting1 => (FB_TO_NEGATIVE, 0),
            Gain::Inverting3 => (FB_TO_NEGATIVE, 1),
            Gain::Inverting7 => (FB_TO_NEGATIVE, 2),
            Gain::Inverting15 => (FB_TO_NEGATIVE, 3),
        }
    }
}

/// Feedback configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OpaMode {
    /// External feedback
    Standalone,
    /// Internal feedback
    Pga(Gain),
    /// Unity gain follower
    Buffer,
}

/// Amplifier configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[non_exhaustive]
pub struct OpaConfig {
    /// Positive input
    pub positive: PositiveInput,
    /// Negative input
    pub negative: NegativeInput,
    /// Feedback
    pub mode: OpaMode,
    /// Low power mode
    pub low_power: bool,
    /// Keep the negative input on its pin in PGA mode
    pub negative_to_pin: bool,
}

impl OpaConfig {
    /// Standalone amplifier in normal power mode.
    pub const fn new(positive: PositiveInput, negative: NegativeInput) -> Self {
        Self {
            positive,
            negative,
            mode: OpaMode::Standalone,
            low_power: false,
            negative_to_pin: false,
        }
    }

    /// Sets the feedback configuration.
    pub const fn mode(mut self, mode: OpaMode) -> Self {
        self.mode = mode;
        self
    }

    /// Sets the power mode.
    pub const fn low_power(mut self, on: bool) -> Self {
        self.low_power = on;
        self
    }

    /// Keeps the negative input on its pin in PGA mode.
    pub const fn negative_to_pin(mut self, on: bool) -> Self {
        self.negative_to_pin = on;
        self
    }
}

impl Default for OpaConfig {
    fn default() -> Self {
        Self::new(PositiveInput::Inp1, NegativeInput::Inn1)
    }
}

/// Offset trim.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Trim {
    /// Hardware picks the trim
    Auto,
    /// Trim codes for the positive and negative input stages
    Manual {
        /// Positive stage
        positive: u8,
        /// Negative stage
        negative: u8,
    },
}

pub(crate) fn configure(rb: &RegisterBlock, config: &OpaConfig) {
    let (fbsel, msel, gain) = match config.mode {
        OpaMode::Standalone => (0, 0, 0),
        OpaMode::Pga(gain) => {
            let (msel, code) = gain.codes();
            (2, msel, code)
        }
        OpaMode::Buffer => (3, 0, 0),
    };
    rb.cr.modify(|r| {
        let r = cr::VPSEL.set(r, config.positive as u32);
        let r = cr::VNSEL.set(r, config.negative as u32);
        let r = cr::FBSEL.set(r, fbsel);
        let r = cr::MSEL.set(r, msel);
        let r = cr::PGA_GAIN.set(r, gain);
        let r = cr::VN_EXC.set(r, config.negative_to_pin as u32);
        cr::LPM.set(r, config.low_power as u32)
    });
}

pub(crate) fn set_trim(rb: &RegisterBlock, trim: Trim) {
    rb.calr.modify(|r| match trim {
        Trim::Auto => calr::TRIM_MODE.set(r, 1),
        Trim::Manual { positive, negative } => {
            let r = calr::TRIM_MODE.set(r, 0);
            let r = calr::PCAL.set(r, u32::from(positive));
            calr::NCAL.set(r, u32::from(negative))
        }
    });
}

/// One amplifier.
pub struct Opa<D: OpaDevice> {
    device: D,
}

impl<D: OpaDevice> Opa<D> {
    /// Enables the shared clock and applies `config`. The amplifier stays
    /// off until [`Opa::enable`].
    pub fn new(device: D, config: &OpaConfig, cmu: &mut pac::CMU) -> Self {
        device.enable_clock(cmu);
        configure(&device, config);
        Self { device }
    }

    /// Turns the amplifier off and frees the register block.
    pub fn free(self) -> D {
        self.device.cr.clear_bits(cr::EN.mask());
        self.device
    }

    /// Applies inputs, feedback and power mode.
    pub fn configure(&mut self, config: &OpaConfig) {
        configure(&self.device, config)
    }

    /// Turns the amplifier on.
    pub fn enable(&mut self) {
        self.device.cr.set_bits(cr::EN.mask());
    }

    /// Turns the amplifier off.
    pub fn disable(&mut self) {
        self.device.cr.clear_bits(cr::EN.mask());
    }

    /// Is the amplifier on.
    pub fn is_enabled(&self) -> bool {
        self.device.cr.bit(cr::EN)
    }

    /// Sets the offset trim.
    pub fn set_trim(&mut self, trim: Trim) {
        set_trim(&self.device, trim)
    }

    /// Current offset trim.
    pub fn trim(&self) -> Trim {
        let r = self.device.calr.read();
        if calr::TRIM_MODE.get(r) != 0 {
            Trim::Auto
        } else {
            Trim::Manual {
                positive: calr::PCAL.get(r) as u8,
                negative: calr::NCAL.get(r) as u8,
            }
        }
    }

    /// Shorts the positive and/or negative input stage for offset
    /// calibration. [`Opa::calibration_output`] then tells on which side of
    /// zero the offset lies for the current trim.
    pub fn set_offset_calibration(&mut self, positive: bool, negative: bool) {
        self.device.calr.modify(|r| {
            let r = calr::PCAL_EN.set(r, positive as u32);
            calr::NCAL_EN.set(r, negative as u32)
        });
    }

    /// Output of the amplifier used as a comparator during calibration.
    pub fn calibration_output(&self) -> bool {
        self.device.cor.bit(cor::OUT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block() -> RegisterBlock {
        unsafe { core::mem::zeroed() }
    }

    #[test]
    fn inverting_pga() {
        let rb = block();
        let config = OpaConfig::new(PositiveInput::Dac, NegativeInput::Inn2)
            .mode(OpaMode::Pga(Gain::Inverting7))
            .negative_to_pin(true)
            .low_power(true);
        configure(&rb, &config);

        let r = rb.cr.read();
        assert_eq!(cr::VPSEL.get(r), 2);
        assert_eq!(cr::VNSEL.get(r), 1);
        assert_eq!(cr::FBSEL.get(r), 2);
        assert_eq!(cr::MSEL.get(r), 1);
        assert_eq!(cr::PGA_GAIN.get(r), 2);
        assert_eq!(cr::VN_EXC.get(r), 1);
        assert_eq!(cr::LPM.get(r), 1);
        assert_eq!(cr::EN.get(r), 0);
    }

    #[test]
    fn non_inverting_gain_feeds_back_to_ground() {
        assert_eq!(Gain::NonInverting2.codes(), (2, 0));
        assert_eq!(Gain::NonInverting16.codes(), (2, 3));
        assert_eq!(Gain::Inverting1.codes(), (1, 0));
    }

    #[test]
    fn buffer_clears_pga_settings() {
        let rb = block();
        configure(&rb, &OpaConfig::default().mode(OpaMode::Pga(Gain::NonInverting8)));
        rb.cr.set_bits(cr::EN.mask());
        configure(&rb, &OpaConfig::default().mode(OpaMode::Buffer));

        let r = rb.cr.read();
        assert_eq!(cr::FBSEL.get(r), 3);
        assert_eq!(cr::MSEL.get(r), 0);
        assert_eq!(cr::PGA_GAIN.get(r), 0);
        // reconfiguring keeps a running amplifier on
        assert_eq!(cr::EN.get(r), 1);
    }

    #[test]
    fn manual_trim_leaves_auto_mode() {
        let rb = block();
        set_trim(&rb, Trim::Auto);
        assert_eq!(rb.calr.read(), 1);

        set_trim(
            &rb,
            Trim::Manual {
                positive: 0x12,
                negative: 0x34,
            },
        );
        let r = rb.calr.read();
        assert_eq!(calr::TRIM_MODE.get(r), 0);
        assert_eq!(calr::PCAL.get(r), 0x12);
        assert_eq!(calr::NCAL.get(r), 0x34);
    }
}
