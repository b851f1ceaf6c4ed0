//! Digital to analog converter registers

use super::{Field, Reg};

/// Register block
#[repr(C)]
pub struct RegisterBlock {
    /// Control 1
    pub cr1: Reg,
    /// Control 2
    pub cr2: Reg,
    /// Configuration
    pub cfgr: Reg,
    /// Software trigger
    pub swtrgr: Reg,
    /// Data holding
    pub dhr: Reg,
    /// Interrupt status
    pub isr: Reg,
    /// Interrupt enable
    pub ier: Reg,
    /// Sample and hold timing
    pub shtr: Reg,
}

pub mod cr1 {
    use super::Field;
    pub const EN: Field = Field::bit(0);
}

pub mod cr2 {
    use super::Field;
    pub const TRGEN: Field = Field::bit(0);
    pub const DMAEN: Field = Field::bit(1);
}

pub mod cfgr {
    use super::Field;
    /// Switch to ADC/COMP
    pub const SWIEN: Field = Field::bit(0);
    /// Trigger source
    pub const TRGSEL: Field = Field::new(2, 4);
    /// Output buffer
    pub const BUFEN: Field = Field::bit(7);
    /// Sample and hold
    pub const SHEN: Field = Field::bit(8);
}

pub mod swtrgr {
    use super::Field;
    pub const SWTRIG: Field = Field::bit(0);
}

pub mod dhr {
    use super::Field;
    pub const DHR: Field = Field::new(0, 12);
}

/// ISR fields, write one to clear
pub mod isr {
    use super::Field;
    /// Data output updated
    pub const DOU: Field = Field::bit(0);
    /// End of sampling
    pub const EOS: Field = Field::bit(1);
    /// End of holding
    pub const EOH: Field = Field::bit(2);
    /// DMA error
    pub const DMAERR: Field = Field::bit(3);
}

pub mod ier {
    use super::Field;
    pub const DOU_IE: Field = Field::bit(0);
    pub const EOS_IE: Field = Field::bit(1);
    pub const EOH_IE: Field = Field::bit(2);
    pub const DMAE_IE: Field = Field::bit(3);
}

pub mod shtr {
    use super::Field;
    /// Sample time
    pub const TSMPL: Field = Field::new(0, 8);
    /// Hold time
    pub const THLD: Field = Field::new(8, 16);
}
