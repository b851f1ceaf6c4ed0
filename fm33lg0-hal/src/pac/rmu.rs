//! Reset management unit registers

use super::{Field, Reg};

/// Register block
#[repr(C)]
pub struct RegisterBlock {
    /// Power down reset control
    pub pdrcr: Reg,
    /// Brown out reset control
    pub borcr: Reg,
    /// Lockup reset control
    pub lkpcr: Reg,
    /// Software reset
    pub softrst: Reg,
    /// Reset flags
    pub rstfr: Reg,
    /// Peripheral reset unlock key
    pub prsten: Reg,
    /// AHB peripheral reset
    pub ahbrstcr: Reg,
    /// APB peripheral reset 1
    pub apbrstcr1: Reg,
    /// APB peripheral reset 2
    pub apbrstcr2: Reg,
}

/// Key unlocking the peripheral reset registers.
pub const PRSTEN_KEY: u32 = 0x1357_9BDF;

/// Key triggering a software reset.
pub const SOFTRST_KEY: u32 = 0x5C5C_AABB;

/// PDRCR fields
pub mod pdrcr {
    use super::Field;
    /// Enable
    pub const EN: Field = Field::bit(0);
    /// Threshold
    pub const CFG: Field = Field::new(1, 2);
}

/// BORCR fields
pub mod borcr {
    use super::Field;
    /// Disable (active high)
    pub const ENB: Field = Field::bit(0);
    /// Threshold
    pub const CFG: Field = Field::new(1, 2);
}

/// LKPCR fields
pub mod lkpcr {
    use super::Field;
    /// Lockup reset enable
    pub const EN: Field = Field::bit(1);
}

/// RSTFR fields, write one to clear
pub mod rstfr {
    use super::Field;
    pub const NVICN: Field = Field::bit(0);
    pub const LKUPN: Field = Field::bit(1);
    pub const WWDTN: Field = Field::bit(2);
    pub const IWDTN: Field = Field::bit(4);
    pub const SOFTN: Field = Field::bit(5);
    pub const PDRN: Field = Field::bit(8);
    pub const PORN: Field = Field::bit(9);
    pub const PRC: Field = Field::bit(10);
    pub const NRSTN: Field = Field::bit(11);
    pub const MDFN: Field = Field::bit(12);
}

/// AHBRSTCR fields
pub mod ahbrstcr {
    use super::Field;
    /// DMA
    pub const DMA: Field = Field::bit(0);
}

/// APBRSTCR1 fields
pub mod apbrstcr1 {
    use super::Field;
    pub const LPTIM32: Field = Field::bit(0);
    pub const LPTIM16: Field = Field::bit(1);
    pub const OPA: Field = Field::bit(2);
    pub const DAC: Field = Field::bit(3);
    pub const LCD: Field = Field::bit(4);
    pub const PGL: Field = Field::bit(5);
    pub const VREF: Field = Field::bit(6);
    pub const LPUART0: Field = Field::bit(8);
    pub const LPUART1: Field = Field::bit(9);
    pub const LPUART2: Field = Field::bit(10);
    pub const I2C: Field = Field::bit(11);
    pub const SPI0: Field = Field::bit(13);
    pub const SPI1: Field = Field::bit(14);
    pub const SPI2: Field = Field::bit(15);
    pub const BSTIM16: Field = Field::bit(18);
    pub const BSTIM32: Field = Field::bit(19);
    pub const ATIM: Field = Field::bit(20);
    pub const GPTIM0: Field = Field::bit(21);
    pub const GPTIM1: Field = Field::bit(22);
    pub const GPTIM2: Field = Field::bit(23);
    pub const U7816: Field = Field::bit(24);
    pub const UCIR: Field = Field::bit(25);
    pub const UART0: Field = Field::bit(26);
    pub const UART1: Field = Field::bit(27);
    pub const UART3: Field = Field::bit(29);
    pub const UART4: Field = Field::bit(30);
    pub const UART5: Field = Field::bit(31);
}

/// APBRSTCR2 fields
pub mod apbrstcr2 {
    use super::Field;
    pub const COMP: Field = Field::bit(0);
    pub const SVD: Field = Field::bit(1);
    pub const CAN: Field = Field::bit(2);
    pub const DIVAS: Field = Field::bit(3);
    pub const RNG: Field = Field::bit(16);
    pub const CRC: Field = Field::bit(17);
    pub const AES: Field = Field::bit(18);
    pub const ADC: Field = Field::bit(23);
    pub const ADCCR: Field = Field::bit(24);
}
