//! GPIO common registers: external interrupt lines and wakeup pins
//!
//! Every port has one EXTI line per group of four pins; the line's select
//! field picks which pin of the group drives it.

use super::{Field, Reg};

/// Register block
#[repr(C)]
pub struct RegisterBlock {
    /// Line input select, lines 0..15
    pub extisel0: Reg,
    /// Line input select, lines 16..19
    pub extisel1: Reg,
    /// Edge select, lines 0..15
    pub extieds0: Reg,
    /// Edge select, lines 16..19
    pub extieds1: Reg,
    /// Digital filter enable
    pub extidf: Reg,
    /// Pending flags, write one to clear
    pub extiisr: Reg,
    /// Line input levels
    pub extidi: Reg,
    _reserved: [Reg; 9],
    /// Frequency output select
    pub foutsel: Reg,
    _reserved1: [Reg; 15],
    /// Wakeup pin enable
    pub pinwken: Reg,
}

/// Edge select values.
pub mod eds {
    pub const RISING: u32 = 0;
    pub const FALLING: u32 = 1;
    pub const BOTH: u32 = 2;
    pub const DISABLE: u32 = 3;
}

impl RegisterBlock {
    /// Input select register and field of EXTI `line`.
    pub fn sel(&self, line: u8) -> (&Reg, Field) {
        let reg = if line < 16 { &self.extisel0 } else { &self.extisel1 };
        (reg, Field::new((line % 16) * 2, 2))
    }

    /// Edge select register and field of EXTI `line`.
    pub fn eds(&self, line: u8) -> (&Reg, Field) {
        let reg = if line < 16 { &self.extieds0 } else { &self.extieds1 };
        (reg, Field::new((line % 16) * 2, 2))
    }
}
