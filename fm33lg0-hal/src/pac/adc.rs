//! Analog to digital converter registers

use super::{Field, Reg};

/// Register block
#[repr(C)]
pub struct RegisterBlock {
    /// Interrupt status
    pub isr: Reg,
    /// Interrupt enable
    pub ier: Reg,
    /// Control 1
    pub cr1: Reg,
    /// Control 2
    pub cr2: Reg,
    /// Calibration
    pub calr: Reg,
    /// Configuration 1
    pub cfgr1: Reg,
    /// Configuration 2
    pub cfgr2: Reg,
    /// Sampling time
    pub smtr: Reg,
    /// Channel enable
    pub cher: Reg,
    /// Differential channel groups
    pub dcr: Reg,
    /// Data
    pub dr: Reg,
    /// Analog watchdog thresholds
    pub hltr: Reg,
}

/// ISR fields, write one to clear
pub mod isr {
    use super::Field;
    /// End of conversion
    pub const EOC: Field = Field::bit(0);
    /// End of sequence
    pub const EOS: Field = Field::bit(1);
    /// Overrun
    pub const OVR: Field = Field::bit(2);
    /// Busy
    pub const BUSY: Field = Field::bit(3);
    /// End of calibration
    pub const EOCAL: Field = Field::bit(4);
    /// Under the low threshold
    pub const AWD_UL: Field = Field::bit(5);
    /// Above the high threshold
    pub const AWD_AH: Field = Field::bit(6);
}

/// IER fields
pub mod ier {
    use super::Field;
    pub const EOCIE: Field = Field::bit(0);
    pub const EOSIE: Field = Field::bit(1);
    pub const OVRIE: Field = Field::bit(2);
    pub const EOCALIE: Field = Field::bit(4);
    pub const AWD_ULIE: Field = Field::bit(5);
    pub const AWD_AHIE: Field = Field::bit(6);
}

/// CR1 fields
pub mod cr1 {
    use super::Field;
    /// Enable
    pub const ADEN: Field = Field::bit(0);
    /// Software start
    pub const SWTRIG: Field = Field::bit(1);
}

/// CR2 fields
pub mod cr2 {
    use super::Field;
    /// Hardware trigger edge
    pub const TRGCFG: Field = Field::new(0, 2);
}

/// CALR fields
pub mod calr {
    use super::Field;
    /// Calibration enable
    pub const CALEN: Field = Field::bit(0);
}

/// CFGR1 fields
pub mod cfgr1 {
    use super::Field;
    /// Reference select
    pub const PEFSEL: Field = Field::new(0, 2);
    /// Clock select (ADCCLK / APBCLK)
    pub const CLKSEL: Field = Field::bit(2);
    /// Resolution
    pub const BITSEL: Field = Field::new(3, 2);
    /// Software start hold
    pub const EXSOC: Field = Field::bit(5);
    /// APB clock prescaler
    pub const APBCLK_PSC: Field = Field::new(6, 2);
    /// Input buffer enable
    pub const BUFEN: Field = Field::bit(8);
    /// Input buffer mode
    pub const BUFMOD: Field = Field::bit(9);
    /// Input buffer low pass filter
    pub const BUFLPF: Field = Field::bit(10);
    /// Input buffer chopper
    pub const BUFCHP_EN: Field = Field::bit(11);
}

/// CFGR2 fields
pub mod cfgr2 {
    use super::Field;
    pub const DMAEN: Field = Field::bit(0);
    pub const SCANDIR: Field = Field::bit(2);
    pub const EXTS: Field = Field::new(4, 4);
    pub const OVRM: Field = Field::bit(8);
    pub const CONT: Field = Field::bit(9);
    pub const WAIT: Field = Field::bit(10);
    pub const SEMI: Field = Field::bit(11);
    pub const IOTRFEN: Field = Field::bit(14);
    pub const OVSEN: Field = Field::bit(16);
    pub const OVSR: Field = Field::new(17, 3);
    pub const OVSS: Field = Field::new(20, 4);
    pub const AWDEN: Field = Field::bit(24);
    pub const AWDSC: Field = Field::bit(25);
    pub const AWDCH: Field = Field::new(26, 4);
}

/// SMTR fields
pub mod smtr {
    use super::Field;
    /// Slow channel sampling time
    pub const SMTS1: Field = Field::new(0, 4);
    /// Fast channel sampling time
    pub const SMTS2: Field = Field::new(4, 4);
}

/// DR fields
pub mod dr {
    use super::Field;
    pub const DATA: Field = Field::new(0, 16);
}

/// HLTR fields
pub mod hltr {
    use super::Field;
    /// Low threshold
    pub const AWD_LT: Field = Field::new(0, 12);
    /// High threshold
    pub const AWD_HT: Field = Field::new(16, 12);
}
