//! GPIO port registers (GPIOA..GPIOE)

use super::{Field, Reg};

/// Register block
#[repr(C)]
pub struct RegisterBlock {
    /// Input enable
    pub inen: Reg,
    /// Pull-up enable
    pub puen: Reg,
    /// Open-drain enable
    pub oden: Reg,
    /// Function select, two bits per pin
    pub fcr: Reg,
    /// Output data
    pub dor: Reg,
    /// Output set
    pub dset: Reg,
    /// Output reset
    pub drst: Reg,
    /// Input data
    pub din: Reg,
    /// Digital function remap
    pub dfs: Reg,
    _reserved: Reg,
    /// Analog switch enable
    pub anen: Reg,
}

/// Values of a pin's FCR field.
pub mod fcr {
    use super::Field;

    pub const INPUT: u32 = 0;
    pub const OUTPUT: u32 = 1;
    pub const DIGITAL: u32 = 2;
    pub const ANALOG: u32 = 3;

    /// FCR field of pin `n`.
    pub const fn pin(n: u8) -> Field {
        Field::new(2 * n, 2)
    }
}
