//! DMA controller registers

use super::{Field, Reg};

/// Per channel registers
#[repr(C)]
pub struct Channel {
    /// Configuration
    pub cr: Reg,
    /// Memory address
    pub mad: Reg,
}

/// Register block
#[repr(C)]
pub struct RegisterBlock {
    /// Global configuration
    pub gcr: Reg,
    /// Channels 0..7
    pub ch: [Channel; 8],
    _reserved: Reg,
    /// Interrupt status, write one to clear
    pub isr: Reg,
}

pub mod gcr {
    use super::Field;
    /// Global enable
    pub const EN: Field = Field::bit(0);
}

/// CHxCR fields
pub mod chcr {
    use super::Field;
    /// Channel enable
    pub const EN: Field = Field::bit(0);
    /// Full transfer interrupt enable
    pub const FTIE: Field = Field::bit(1);
    /// Half transfer interrupt enable
    pub const HTIE: Field = Field::bit(2);
    /// Bus data width: 0 byte, 1 half word, 2 word
    pub const BDW: Field = Field::new(4, 2);
    /// Direction, set for memory to peripheral
    pub const DIR: Field = Field::bit(6);
    /// Peripheral request select
    pub const SSEL: Field = Field::new(7, 3);
    /// Memory address increment
    pub const INC: Field = Field::bit(10);
    /// Circular mode
    pub const CIRC: Field = Field::bit(11);
    /// Priority
    pub const PRI: Field = Field::new(12, 2);
    /// Transfer count minus one
    pub const TSIZE: Field = Field::new(16, 16);
}

/// ISR fields
pub mod isr {
    use super::Field;

    /// Half transfer flag of channel `ch`.
    pub const fn htif(ch: u8) -> Field {
        Field::bit(ch)
    }

    /// Full transfer flag of channel `ch`.
    pub const fn ftif(ch: u8) -> Field {
        Field::bit(8 + ch)
    }
}
