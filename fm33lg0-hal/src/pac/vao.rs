//! VBAT always-on domain registers

use super::{Field, Reg};

/// Register block
#[repr(C)]
pub struct RegisterBlock {
    /// VBAT domain reset
    pub rstcr: Reg,
    /// XTLF control
    pub xtlfcr: Reg,
    /// XTLF parameters
    pub xtlfpr: Reg,
    /// Fail detect interrupt enable
    pub fdier: Reg,
    /// Fail detect interrupt status
    pub fdisr: Reg,
    /// PH15 input enable
    pub inen: Reg,
    /// PH15 pull-up enable
    pub puen: Reg,
    /// PH15 open-drain enable
    pub oden: Reg,
    /// PH15 function select
    pub fcr: Reg,
    /// PH15 output data
    pub dor: Reg,
    /// PH15 input data
    pub dir: Reg,
    /// PH15 input low threshold
    pub vilr: Reg,
}

/// XTLFEN value enabling the oscillator.
pub const XTLF_ENABLE_KEY: u32 = 0x5;
/// XTLFEN value disabling the oscillator.
pub const XTLF_DISABLE_KEY: u32 = 0xA;

pub mod rstcr {
    use super::Field;
    pub const VBAT_RST: Field = Field::bit(0);
}

pub mod xtlfcr {
    use super::Field;
    pub const XTLFEN: Field = Field::new(0, 4);
}

pub mod xtlfpr {
    use super::Field;
    /// Working current
    pub const XTLFIPW: Field = Field::new(0, 4);
    /// Drive strength
    pub const DRVCFG: Field = Field::new(4, 3);
}

pub mod fdier {
    use super::Field;
    pub const LFDET_IE: Field = Field::bit(0);
}

pub mod fdisr {
    use super::Field;
    /// Fail detect flag, write one to clear
    pub const LFDETIF: Field = Field::bit(0);
    /// Fail detect output
    pub const LFDETO: Field = Field::bit(1);
}

/// PH15 bit in INEN, PUEN, ODEN, DOR, DIR and VILR
pub const PH15: Field = Field::bit(15);

pub mod fcr {
    use super::Field;
    pub const PH15FCR: Field = Field::new(30, 2);
}
