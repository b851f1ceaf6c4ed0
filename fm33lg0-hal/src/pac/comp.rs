//! Comparator registers (COMP1..COMP3 share one block)

use super::{Field, Reg};

/// Register block
#[repr(C)]
pub struct RegisterBlock {
    /// COMP1 control
    pub cr1: Reg,
    /// COMP2 control
    pub cr2: Reg,
    /// COMP3 control
    pub cr3: Reg,
    /// Interrupt configuration
    pub icr: Reg,
    /// Interrupt status
    pub isr: Reg,
    /// Input buffer control
    pub bufcr: Reg,
}

impl RegisterBlock {
    /// Control register of comparator `n` (0 based).
    #[inline(always)]
    pub fn cr(&self, n: usize) -> &Reg {
        match n {
            0 => &self.cr1,
            1 => &self.cr2,
            _ => &self.cr3,
        }
    }
}

/// CRx fields
pub mod cr {
    use super::Field;
    /// Enable
    pub const CMPEN: Field = Field::bit(0);
    /// Negative input select
    pub const VNSEL: Field = Field::new(1, 3);
    /// Positive input select
    pub const VPSEL: Field = Field::new(4, 3);
    /// Output
    pub const CMPO: Field = Field::bit(8);
    /// Power mode
    pub const MODE: Field = Field::new(14, 2);
    /// Digital filter enable
    pub const DFEN: Field = Field::bit(16);
    /// Output polarity
    pub const POLAR: Field = Field::bit(17);
    /// Window mode
    pub const WINMODE: Field = Field::bit(18);
    /// Digital filter length
    pub const DFLEN: Field = Field::new(19, 5);
    /// Trigger output enable
    pub const TRGOEN: Field = Field::bit(24);
}

/// ICR fields
pub mod icr {
    use super::Field;
    pub const CMP1IE: Field = Field::bit(0);
    pub const CMP1SEL: Field = Field::new(2, 2);
    pub const CMP2IE: Field = Field::bit(8);
    pub const CMP2SEL: Field = Field::new(10, 2);
    pub const CMP3IE: Field = Field::bit(16);
    pub const CMP3SEL: Field = Field::new(18, 2);
    pub const WIN_IE: Field = Field::bit(24);
    pub const OWW_IE: Field = Field::bit(25);

    /// Interrupt enable of comparator `n`.
    pub const fn ie(n: usize) -> Field {
        Field::bit(8 * n as u8)
    }

    /// Edge select of comparator `n`.
    pub const fn sel(n: usize) -> Field {
        Field::new(8 * n as u8 + 2, 2)
    }
}

/// ISR fields, write one to clear
pub mod isr {
    use super::Field;
    pub const CMP1IF: Field = Field::bit(0);
    pub const CMP2IF: Field = Field::bit(1);
    pub const CMP3IF: Field = Field::bit(2);
    pub const WIN_IF: Field = Field::bit(3);
    pub const OOW_IF: Field = Field::bit(4);
}

/// BUFCR fields
pub mod bufcr {
    use super::Field;
    /// Buffer disable (active high)
    pub const BUFENB: Field = Field::bit(0);
    /// Buffer select
    pub const BUFSEL: Field = Field::bit(1);
    /// Buffer bypass
    pub const BUFBYP: Field = Field::bit(2);
}
