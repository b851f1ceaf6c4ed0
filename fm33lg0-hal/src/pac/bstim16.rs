//! Basic 16-bit timer registers

use super::{Field, Reg};

/// Register block
#[repr(C)]
pub struct RegisterBlock {
    pub cr1: Reg,
    pub cr2: Reg,
    _reserved0: Reg,
    pub ier: Reg,
    pub isr: Reg,
    pub egr: Reg,
    _reserved1: [Reg; 3],
    pub cnt: Reg,
    pub psc: Reg,
    pub arr: Reg,
}

pub mod cr1 {
    use super::Field;
    /// Counter enable
    pub const CEN: Field = Field::bit(0);
    /// Update disable
    pub const UDIS: Field = Field::bit(1);
    /// Update request source (counter overflow only)
    pub const URS: Field = Field::bit(2);
    /// One pulse mode
    pub const OPM: Field = Field::bit(3);
    /// Auto-reload preload
    pub const ARPE: Field = Field::bit(7);
}

pub mod cr2 {
    use super::Field;
    /// Master mode select
    pub const MMS: Field = Field::new(4, 3);
}

pub mod ier {
    use super::Field;
    pub const UIE: Field = Field::bit(0);
}

/// ISR fields, write one to clear
pub mod isr {
    use super::Field;
    pub const UIF: Field = Field::bit(0);
}

pub mod egr {
    use super::Field;
    pub const UG: Field = Field::bit(0);
}
