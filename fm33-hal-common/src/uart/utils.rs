//! Useful UART types

use fugit::HertzU32;

/// Data bits
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DataBits {
    /// 6 bits
    Six,
    /// 7 bits
    Seven,
    /// 8 bits
    Eight,
    /// 9 bits
    Nine,
}

impl DataBits {
    /// Number of bits on the wire.
    pub const fn bits(self) -> u32 {
        match self {
            DataBits::Six => 6,
            DataBits::Seven => 7,
            DataBits::Eight => 8,
            DataBits::Nine => 9,
        }
    }
}

/// Stop bits
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StopBits {
    /// 1 bit
    One,
    /// 2 bits
    Two,
}

/// Parity
///
/// The "none" state of parity is represented with the Option type (None).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Parity {
    /// Odd parity
    Odd,
    /// Even parity
    Even,
}

/// A struct holding the configuration for an UART device.
///
/// The `Default` implementation implements the following values:
/// ```ignore
/// # // can't actually create this with the non_exhaustive attribute
/// UartConfig {
///    baudrate: HertzU32::from_raw(115_200),
///    data_bits: DataBits::Eight,
///    stop_bits: StopBits::One,
///    parity: None,
///}
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[non_exhaustive]
pub struct UartConfig {
    /// The baudrate the uart will run at.
    pub baudrate: HertzU32,

    /// The amount of data bits the uart should be configured to.
    pub data_bits: DataBits,

    /// The amount of stop bits the uart should be configured to.
    pub stop_bits: StopBits,

    /// The parity that this uart should have
    pub parity: Option<Parity>,
}

impl UartConfig {
    /// Create a new instance of UartConfig
    pub const fn new(
        baudrate: HertzU32,
        data_bits: DataBits,
        parity: Option<Parity>,
        stop_bits: StopBits,
    ) -> UartConfig {
        UartConfig {
            baudrate,
            data_bits,
            stop_bits,
            parity,
        }
    }

    /// Bits in one frame: start, data, parity and stop bits.
    pub const fn frame_bits(&self) -> u32 {
        let parity = if self.parity.is_some() { 1 } else { 0 };
        let stop = match self.stop_bits {
            StopBits::One => 1,
            StopBits::Two => 2,
        };
        1 + self.data_bits.bits() + parity + stop
    }

    /// Time to receive one frame at the configured baudrate, in microseconds,
    /// rounded up. Returns `None` for a zero baudrate.
    pub fn byte_timeout_us(&self) -> Option<u32> {
        let baud = self.baudrate.to_Hz();
        if baud == 0 {
            return None;
        }
        let us = (self.frame_bits() as u64 * 1_000_000).div_ceil(baud as u64);
        Some(us as u32)
    }
}

impl Default for UartConfig {
    fn default() -> Self {
        Self {
            baudrate: HertzU32::from_raw(115_200),
            data_bits: DataBits::Eight,
            stop_bits: StopBits::One,
            parity: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::uart::common_configs;

    #[test]
    fn frame_bits() {
        assert_eq!(UartConfig::default().frame_bits(), 10);
        assert_eq!(common_configs::_115200_8_E_1.frame_bits(), 11);
        let cfg = UartConfig::new(
            HertzU32::from_raw(9600),
            DataBits::Nine,
            Some(Parity::Odd),
            StopBits::Two,
        );
        assert_eq!(cfg.frame_bits(), 13);
    }

    #[test]
    fn byte_timeout_rounds_up() {
        assert_eq!(common_configs::_115200_8_N_1.byte_timeout_us(), Some(87));
        assert_eq!(common_configs::_9600_8_N_1.byte_timeout_us(), Some(1042));
        let mut cfg = UartConfig::default();
        cfg.baudrate = HertzU32::from_raw(0);
        assert_eq!(cfg.byte_timeout_us(), None);
    }
}
