//! Internal 1.2 V reference and temperature sensor registers

use super::{Field, Reg};

/// Register block
#[repr(C)]
pub struct RegisterBlock {
    /// Control
    pub cr: Reg,
    /// Status
    pub sr: Reg,
    /// Interrupt enable
    pub ier: Reg,
    /// Output buffers
    pub bufcr: Reg,
}

pub mod cr {
    use super::Field;
    /// VREF1P2 enable
    pub const EN: Field = Field::bit(0);
    /// Temperature sensor (PTAT) enable
    pub const PTAT_EN: Field = Field::bit(1);
}

/// SR fields
pub mod sr {
    use super::Field;
    /// Ready edge, write one to clear
    pub const RDYIF: Field = Field::bit(0);
    /// Comparator output
    pub const FLAG: Field = Field::bit(1);
    /// Reference settled
    pub const RDY: Field = Field::bit(2);
}

pub mod ier {
    use super::Field;
    pub const RDYIE: Field = Field::bit(0);
}

pub mod bufcr {
    use super::Field;
    pub const VREF_BUF_EN: Field = Field::bit(0);
    pub const VREF_BUF_OUTEN: Field = Field::bit(1);
    pub const VPTAT_BUF_EN: Field = Field::bit(2);
    pub const VPTAT_BUF_OUTEN: Field = Field::bit(3);
}
