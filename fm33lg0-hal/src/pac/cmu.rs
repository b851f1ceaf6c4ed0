//! Clock management unit registers

use super::{Field, Reg};

/// Register block
#[repr(C)]
pub struct RegisterBlock {
    /// Interrupt enable
    pub ier: Reg,
    /// Interrupt status
    pub isr: Reg,
    /// System clock control
    pub sysclkcr: Reg,
    /// RCHF control
    pub rchfcr: Reg,
    /// RCHF trim
    pub rchftr: Reg,
    /// PLL control
    pub pllcr: Reg,
    /// RCLP control
    pub rclpcr: Reg,
    /// RCLP trim
    pub rclptr: Reg,
    /// LSCLK select
    pub lsclksel: Reg,
    /// XTHF control
    pub xthfcr: Reg,
    /// RCLF control
    pub rclfcr: Reg,
    /// RCLF trim
    pub rclftr: Reg,
    /// Bus clock group 1
    pub pclkcr1: Reg,
    /// Bus clock group 2
    pub pclkcr2: Reg,
    /// Bus clock group 3
    pub pclkcr3: Reg,
    /// Bus clock group 4
    pub pclkcr4: Reg,
    /// Operation clock source select 1
    pub opccr1: Reg,
    /// Operation clock source select 2
    pub opccr2: Reg,
    /// Operation clock enable
    pub opccr3: Reg,
    /// Clock calibration control
    pub cccr: Reg,
    /// Clock calibration configuration
    pub ccfr: Reg,
    /// Clock calibration counter
    pub ccnr: Reg,
    /// Clock calibration status
    pub ccisr: Reg,
}

/// IER fields
pub mod ier {
    use super::Field;
    /// XTHF fail detect interrupt enable
    pub const HFDET_IE: Field = Field::bit(1);
    /// System clock switch error interrupt enable
    pub const SYSCES_IE: Field = Field::bit(2);
}

/// ISR fields
pub mod isr {
    use super::Field;
    /// XTHF fail detect flag
    pub const HFDET_IF: Field = Field::bit(1);
    /// System clock switch error flag
    pub const SYSCES_IF: Field = Field::bit(2);
    /// XTHF fail detect output
    pub const HFDETO: Field = Field::bit(9);
}

/// SYSCLKCR fields
pub mod sysclkcr {
    use super::Field;
    /// System clock select
    pub const SYSCLKSEL: Field = Field::new(0, 3);
    /// SysTick clock select
    pub const STCLKSEL: Field = Field::new(6, 2);
    /// AHB prescaler
    pub const AHBPRES: Field = Field::new(8, 3);
    /// APB prescaler
    pub const APBPRES: Field = Field::new(16, 3);
    /// Keep EXTI clock in sleep
    pub const SLP_ENEXTI: Field = Field::bit(25);
    /// LSCLK auto switch
    pub const LSCATS: Field = Field::bit(27);
}

/// RCHFCR fields
pub mod rchfcr {
    use super::Field;
    /// Enable
    pub const EN: Field = Field::bit(0);
    /// Frequency select
    pub const FSEL: Field = Field::new(16, 4);
}

/// RCHFTR fields
pub mod rchftr {
    use super::Field;
    /// Trim
    pub const TRIM: Field = Field::new(0, 8);
}

/// PLLCR fields
pub mod pllcr {
    use super::Field;
    /// Enable
    pub const EN: Field = Field::bit(0);
    /// Input select
    pub const INSEL: Field = Field::bit(1);
    /// Output x1/x2
    pub const OSEL: Field = Field::bit(3);
    /// Reference prescaler
    pub const REFPRSC: Field = Field::new(4, 3);
    /// Locked
    pub const LOCKED: Field = Field::bit(7);
    /// Multiplier minus one
    pub const DB: Field = Field::new(16, 7);
}

/// RCLPCR fields
pub mod rclpcr {
    use super::Field;
    /// Disable (active high)
    pub const ENB: Field = Field::bit(0);
}

/// LSCLKSEL fields
pub mod lsclksel {
    use super::Field;
    /// Select key
    pub const SEL: Field = Field::new(0, 8);
}

/// XTHFCR fields
pub mod xthfcr {
    use super::Field;
    /// Enable
    pub const EN: Field = Field::bit(0);
    /// Drive configuration
    pub const CFG: Field = Field::new(8, 5);
}

/// RCLFCR fields
pub mod rclfcr {
    use super::Field;
    /// Enable
    pub const EN: Field = Field::bit(0);
    /// Output prescaler
    pub const PSC: Field = Field::new(16, 2);
}

/// PCLKCR1 fields
pub mod pclkcr1 {
    use super::Field;
    /// LPTIM32
    pub const LPTIM32: Field = Field::bit(0);
    /// LPTIM16
    pub const LPTIM16: Field = Field::bit(1);
    /// RTCA
    pub const RTCA: Field = Field::bit(2);
    /// PMU
    pub const PMU: Field = Field::bit(3);
    /// SCU
    pub const SCU: Field = Field::bit(4);
    /// IWDT
    pub const IWDT: Field = Field::bit(5);
    /// ANAC
    pub const ANAC: Field = Field::bit(6);
    /// PAD (GPIO)
    pub const PAD: Field = Field::bit(7);
    /// SVD
    pub const SVD: Field = Field::bit(8);
    /// COMP
    pub const COMP: Field = Field::bit(9);
    /// ATT
    pub const ATT: Field = Field::bit(10);
    /// OPA
    pub const OPA: Field = Field::bit(11);
    /// VREF1P2
    pub const VREF1P2: Field = Field::bit(12);
    /// VREFREG
    pub const VREFREG: Field = Field::bit(13);
}

/// PCLKCR2 fields
pub mod pclkcr2 {
    use super::Field;
    /// CRC
    pub const CRC: Field = Field::bit(0);
    /// RNG
    pub const RNG: Field = Field::bit(1);
    /// AES
    pub const AES: Field = Field::bit(2);
    /// LCD
    pub const LCD: Field = Field::bit(3);
    /// DMA
    pub const DMA: Field = Field::bit(4);
    /// FLASH
    pub const FLASH: Field = Field::bit(5);
    /// RAMBIST
    pub const RAMBIST: Field = Field::bit(6);
    /// WWDT
    pub const WWDT: Field = Field::bit(7);
    /// ADC
    pub const ADC: Field = Field::bit(8);
    /// DIVAS
    pub const DIVAS: Field = Field::bit(9);
    /// DAC
    pub const DAC: Field = Field::bit(10);
    /// PGL
    pub const PGL: Field = Field::bit(11);
}

/// PCLKCR3 fields
pub mod pclkcr3 {
    use super::Field;
    /// SPI0
    pub const SPI0: Field = Field::bit(0);
    /// SPI1
    pub const SPI1: Field = Field::bit(1);
    /// SPI2
    pub const SPI2: Field = Field::bit(2);
    /// UART0
    pub const UART0: Field = Field::bit(8);
    /// UART1
    pub const UART1: Field = Field::bit(9);
    /// UART3
    pub const UART3: Field = Field::bit(11);
    /// UART4
    pub const UART4: Field = Field::bit(12);
    /// UART5
    pub const UART5: Field = Field::bit(13);
    /// UART infrared modulation
    pub const UARTIR: Field = Field::bit(14);
    /// U7816
    pub const U7816: Field = Field::bit(15);
    /// LPUART0
    pub const LPUART0: Field = Field::bit(16);
    /// LPUART1
    pub const LPUART1: Field = Field::bit(17);
    /// LPUART2
    pub const LPUART2: Field = Field::bit(18);
    /// CAN
    pub const CAN: Field = Field::bit(19);
    /// I2C
    pub const I2C: Field = Field::bit(24);
}

/// PCLKCR4 fields
pub mod pclkcr4 {
    use super::Field;
    /// BSTIM32
    pub const BSTIM32: Field = Field::bit(0);
    /// GPTIM0
    pub const GPTIM0: Field = Field::bit(1);
    /// GPTIM1
    pub const GPTIM1: Field = Field::bit(2);
    /// GPTIM2
    pub const GPTIM2: Field = Field::bit(3);
    /// ATIM
    pub const ATIM: Field = Field::bit(4);
    /// BSTIM16
    pub const BSTIM16: Field = Field::bit(8);
}

/// OPCCR1 fields
pub mod opccr1 {
    use super::Field;
    /// UART0 clock source
    pub const UART0CKS: Field = Field::new(0, 2);
    /// UART1 clock source
    pub const UART1CKS: Field = Field::new(2, 2);
    /// CAN clock source
    pub const CANCKS: Field = Field::new(4, 2);
    /// ATIM clock source
    pub const ATCKS: Field = Field::bit(7);
    /// LPTIM32 clock source
    pub const LPT32CKS: Field = Field::new(8, 2);
    /// LPTIM16 clock source
    pub const LPT16CKS: Field = Field::new(10, 2);
    /// BSTIM32 clock source
    pub const BT32CKS: Field = Field::new(12, 2);
    /// BSTIM16 clock source
    pub const BT16CKS: Field = Field::new(14, 2);
    /// I2C clock source
    pub const I2CCKS: Field = Field::new(16, 2);
    /// LPUART2 clock source
    pub const LPUART2CKS: Field = Field::new(22, 2);
    /// LPUART0 clock source
    pub const LPUART0CKS: Field = Field::new(24, 2);
    /// LPUART1 clock source
    pub const LPUART1CKS: Field = Field::new(26, 2);
    /// EXTI clock source
    pub const EXTICKS: Field = Field::new(30, 2);
}

/// OPCCR2 fields
pub mod opccr2 {
    use super::Field;
    /// ADC clock source
    pub const ADCCKS: Field = Field::new(0, 2);
    /// ADC prescaler
    pub const ADCPRSC: Field = Field::new(2, 3);
    /// RNG prescaler
    pub const RNGPRSC: Field = Field::new(10, 3);
}

/// OPCCR3 fields
pub mod opccr3 {
    use super::Field;
    /// LPTIM32
    pub const LPTIM32: Field = Field::bit(0);
    /// LPTIM16
    pub const LPTIM16: Field = Field::bit(1);
    /// BSTIM32
    pub const BSTIM32: Field = Field::bit(2);
    /// BSTIM16
    pub const BSTIM16: Field = Field::bit(3);
    /// UART0
    pub const UART0: Field = Field::bit(8);
    /// UART1
    pub const UART1: Field = Field::bit(9);
    /// CAN
    pub const CAN: Field = Field::bit(14);
    /// ATIM
    pub const ATIM: Field = Field::bit(15);
    /// ADC
    pub const ADC: Field = Field::bit(16);
    /// I2C
    pub const I2C: Field = Field::bit(20);
    /// LPUART2
    pub const LPUART2: Field = Field::bit(21);
    /// RNG
    pub const RNG: Field = Field::bit(24);
    /// LPUART0
    pub const LPUART0: Field = Field::bit(28);
    /// LPUART1
    pub const LPUART1: Field = Field::bit(29);
    /// FLASH
    pub const FLASH: Field = Field::bit(30);
    /// EXTI
    pub const EXTI: Field = Field::bit(31);
}

/// CCCR fields
pub mod cccr {
    use super::Field;
    /// Calibration enable
    pub const EN: Field = Field::bit(0);
    /// Calibration interrupt enable
    pub const CCLIE: Field = Field::bit(1);
}

/// CCISR fields
pub mod ccisr {
    use super::Field;
    /// Calibration done
    pub const CCLIF: Field = Field::bit(0);
}
