//! External reference voltage generator registers

use super::{Field, Reg};

/// Register block
#[repr(C)]
pub struct RegisterBlock {
    /// Control
    pub cr: Reg,
    /// Configuration
    pub cfgr: Reg,
    /// Interrupt status
    pub isr: Reg,
    /// Trim
    pub tr: Reg,
}

/// Factory trim words, one per output voltage.
pub mod trim {
    /// 2.0 V trim
    pub const V2P0: usize = 0x1FFF_FA90;
    /// 2.5 V trim
    pub const V2P5: usize = 0x1FFF_FA8C;
    /// 3.0 V trim
    pub const V3P0: usize = 0x1FFF_FA88;
    /// 4.5 V trim
    pub const V4P5: usize = 0x1FFF_FA84;
    /// 1.5 V trim
    pub const V1P5: usize = 0x1FFF_FA94;
}

pub mod cr {
    use super::Field;
    pub const EN: Field = Field::bit(0);
    pub const POVIE: Field = Field::bit(1);
    pub const DENDIE: Field = Field::bit(2);
}

pub mod cfgr {
    use super::Field;
    /// Periodic (low power) mode
    pub const LPM: Field = Field::bit(1);
    /// Drive time
    pub const TDRV: Field = Field::new(2, 3);
    /// Enable period
    pub const TPERIOD: Field = Field::new(5, 3);
    /// Output voltage select
    pub const VRS: Field = Field::new(8, 3);
}

/// ISR fields
pub mod isr {
    use super::Field;
    /// Output voltage overrun, write one to clear
    pub const POV: Field = Field::bit(0);
    /// Drive end, write one to clear
    pub const DEND: Field = Field::bit(1);
    pub const BUSY: Field = Field::bit(2);
}

pub mod tr {
    use super::Field;
    pub const TRIM: Field = Field::new(0, 8);
}
