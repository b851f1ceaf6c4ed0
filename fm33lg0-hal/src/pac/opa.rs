//! Operational amplifier registers, one block per amplifier

use super::{Field, Reg};

/// Register block
#[repr(C)]
pub struct RegisterBlock {
    /// Control
    pub cr: Reg,
    /// Offset calibration
    pub calr: Reg,
    /// Comparator output during calibration
    pub cor: Reg,
}

pub mod cr {
    use super::Field;
    /// Enable
    pub const EN: Field = Field::bit(0);
    /// Low power mode
    pub const LPM: Field = Field::bit(1);
    /// Feedback: standalone, PGA or buffer
    pub const FBSEL: Field = Field::new(2, 2);
    /// PGA gain code
    pub const PGA_GAIN: Field = Field::new(4, 2);
    /// Negative input stays on the pin in PGA mode
    pub const VN_EXC: Field = Field::bit(6);
    /// Positive input select
    pub const VPSEL: Field = Field::new(8, 2);
    /// Negative input select
    pub const VNSEL: Field = Field::new(10, 2);
    /// PGA feedback network: to the negative input, or to ground
    pub const MSEL: Field = Field::new(14, 2);
}

pub mod calr {
    use super::Field;
    /// Automatic trim when set
    pub const TRIM_MODE: Field = Field::bit(0);
    /// Positive input offset calibration
    pub const PCAL_EN: Field = Field::bit(1);
    /// Negative input offset calibration
    pub const NCAL_EN: Field = Field::bit(2);
    /// Positive trim
    pub const PCAL: Field = Field::new(8, 8);
    /// Negative trim
    pub const NCAL: Field = Field::new(16, 8);
}

pub mod cor {
    use super::Field;
    pub const OUT: Field = Field::bit(0);
}
