//! Flash controller registers

use super::{Field, Reg};

/// Register block
#[repr(C)]
pub struct RegisterBlock {
    /// Read control (wait states)
    pub rdcr: Reg,
    /// Prefetch control
    pub pfcr: Reg,
    /// Option bytes
    pub optbr: Reg,
    /// Application code lock, low half
    pub aclock1: Reg,
    /// Application code lock, high half
    pub aclock2: Reg,
    /// Erase/program control
    pub epcr: Reg,
    /// Key
    pub key: Reg,
    /// Interrupt enable
    pub ier: Reg,
    /// Interrupt status
    pub isr: Reg,
}

/// First erase key
pub const ERASE_KEY: u32 = 0x9696_9696;
/// Second erase key for a page
pub const PAGE_ERASE_KEY: u32 = 0xEAEA_EAEA;
/// Second erase key for a sector
pub const SECTOR_ERASE_KEY: u32 = 0x3C3C_3C3C;
/// Program keys, in order
pub const PROGRAM_KEYS: [u32; 2] = [0xA5A5_A5A5, 0xF1F1_F1F1];
/// Any other key write locks the controller again
pub const LOCK_KEY: u32 = 0xFFFF_FFFF;
/// Word written into the flash array to start an erase
pub const ERASE_REQUEST: u32 = 0x1234_ABCD;

pub mod epcr {
    use super::Field;
    /// Erase request
    pub const EREQ: Field = Field::bit(0);
    /// Program request
    pub const PREQ: Field = Field::bit(1);
    /// Erase type: page or sector
    pub const ERTYPE: Field = Field::new(8, 2);
}

/// ISR fields, flags are write one to clear
pub mod isr {
    use super::Field;
    /// Erase done
    pub const ERD: Field = Field::bit(0);
    /// Program done
    pub const PRD: Field = Field::bit(1);
    /// Operation clock missing
    pub const CKERR: Field = Field::bit(8);
    /// Wrong key sequence
    pub const KEYERR: Field = Field::bit(9);
    /// Access to a locked region
    pub const AUTHERR: Field = Field::bit(10);
    /// Key state
    pub const KEYSTA: Field = Field::new(17, 3);
}

/// KEYSTA value after a wrong key: locked until reset
pub const KEYSTA_ERROR: u32 = 4;
