//! Clock management
//!
//! Configure the system clock tree once with [`ClocksConfig::freeze`] and
//! keep the returned [`Clocks`] around: drivers use it to compute their
//! dividers.
//!
//! ```ignore
//! let mut p = pac::Peripherals::take().unwrap();
//! let clocks = ClocksConfig::default()
//!     .pll(PllConfig::new(PllSource::Rchf, PllPrescaler::Div8, 64))
//!     .sysclk(SysclkSource::Pll)
//!     .freeze(&mut p.CMU)?;
//! ```
//!
//! Peripherals enable their bus (and operation) clock through [`BusClock`].
use fugit::{HertzU32, RateExtU32};

use crate::pac;
use crate::pac::cmu::{self, RegisterBlock};
use crate::pac::Field;

/// Frequency of the low speed RC oscillator.
pub const RCLP_FREQ: HertzU32 = HertzU32::from_raw(32_768);
/// Frequency of the external low speed crystal.
pub const XTLF_FREQ: HertzU32 = HertzU32::from_raw(32_768);
/// Undivided frequency of the RCLF oscillator.
pub const RCLF_FREQ: HertzU32 = HertzU32::from_raw(614_400);

const PLL_MIN: u32 = 32_000_000;
const PLL_MAX: u32 = 64_000_000;
const PLL_LOCK_RETRIES: u32 = 100_000;

/// Clock configuration errors.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// The PLL multiplier is out of 1..=128 or the PLL frequency out of 32..=64 MHz.
    PllOutOfRange,
    /// XTHF is used without a crystal frequency.
    XthfNotConfigured,
    /// PLL is selected as system clock but not configured.
    PllNotConfigured,
    /// The PLL did not report lock in time.
    PllLockTimeout,
}

/// RCHF oscillator frequency.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RchfFrequency {
    /// 8 MHz
    Mhz8 = 0,
    /// 16 MHz
    Mhz16 = 1,
    /// 24 MHz
    Mhz24 = 2,
    /// 32 MHz
    Mhz32 = 3,
}

impl RchfFrequency {
    /// Frequency of the oscillator.
    pub const fn hertz(self) -> HertzU32 {
        HertzU32::from_raw(match self {
            RchfFrequency::Mhz8 => 8_000_000,
            RchfFrequency::Mhz16 => 16_000_000,
            RchfFrequency::Mhz24 => 24_000_000,
            RchfFrequency::Mhz32 => 32_000_000,
        })
    }
}

/// System clock source.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SysclkSource {
    /// RCHF
    Rchf = 0,
    /// XTHF
    Xthf = 1,
    /// PLL
    Pll = 2,
    /// RCLF
    Rclf = 4,
    /// XTLF
    Xtlf = 5,
    /// RCLP
    Rclp = 6,
}

/// AHB and APB prescalers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BusPrescaler {
    /// Divide by 1
    Div1 = 0,
    /// Divide by 2
    Div2 = 4,
    /// Divide by 4
    Div4 = 5,
    /// Divide by 8
    Div8 = 6,
    /// Divide by 16
    Div16 = 7,
}

impl BusPrescaler {
    const fn divisor(self) -> u32 {
        match self {
            BusPrescaler::Div1 => 1,
            BusPrescaler::Div2 => 2,
            BusPrescaler::Div4 => 4,
            BusPrescaler::Div8 => 8,
            BusPrescaler::Div16 => 16,
        }
    }
}

/// PLL reference clock.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PllSource {
    /// RCHF
    Rchf = 0,
    /// XTHF
    Xthf = 1,
}

/// PLL reference prescaler.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PllPrescaler {
    /// Divide by 1
    Div1 = 0,
    /// Divide by 2
    Div2 = 1,
    /// Divide by 4
    Div4 = 2,
    /// Divide by 8
    Div8 = 3,
    /// Divide by 12
    Div12 = 4,
    /// Divide by 16
    Div16 = 5,
    /// Divide by 24
    Div24 = 6,
    /// Divide by 32
    Div32 = 7,
}

impl PllPrescaler {
    const fn divisor(self) -> u32 {
        match self {
            PllPrescaler::Div1 => 1,
            PllPrescaler::Div2 => 2,
            PllPrescaler::Div4 => 4,
            PllPrescaler::Div8 => 8,
            PllPrescaler::Div12 => 12,
            PllPrescaler::Div16 => 16,
            PllPrescaler::Div24 => 24,
            PllPrescaler::Div32 => 32,
        }
    }
}

/// PLL output stage.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PllOutput {
    /// VCO frequency
    X1 = 0,
    /// Twice the VCO frequency
    X2 = 1,
}

/// RCLF output prescaler.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RclfPrescaler {
    /// 614.4 kHz
    Div1 = 0,
    /// 153.6 kHz
    Div4 = 1,
    /// 76.8 kHz
    Div8 = 2,
    /// 38.4 kHz
    Div16 = 3,
}

impl RclfPrescaler {
    const fn divisor(self) -> u32 {
        match self {
            RclfPrescaler::Div1 => 1,
            RclfPrescaler::Div4 => 4,
            RclfPrescaler::Div8 => 8,
            RclfPrescaler::Div16 => 16,
        }
    }
}

/// Low speed clock (LSCLK) source.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LsclkSource {
    /// RCLP
    Rclp = 0x55,
    /// XTLF
    Xtlf = 0xAA,
}

/// PLL settings.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PllConfig {
    /// Reference clock
    pub source: PllSource,
    /// Reference prescaler
    pub prescaler: PllPrescaler,
    /// Feedback multiplier, 1..=128
    pub multiplier: u8,
    /// Output stage
    pub output: PllOutput,
}

impl PllConfig {
    /// PLL with x1 output.
    pub const fn new(source: PllSource, prescaler: PllPrescaler, multiplier: u8) -> Self {
        PllConfig {
            source,
            prescaler,
            multiplier,
            output: PllOutput::X1,
        }
    }

    /// Output frequency for a reference clock of `reference`.
    pub fn frequency(&self, reference: HertzU32) -> Result<HertzU32, Error> {
        if self.multiplier == 0 || self.multiplier > 128 {
            return Err(Error::PllOutOfRange);
        }
        let vco = reference.to_Hz() / self.prescaler.divisor() * self.multiplier as u32;
        if !(PLL_MIN..=PLL_MAX).contains(&vco) {
            return Err(Error::PllOutOfRange);
        }
        Ok(match self.output {
            PllOutput::X1 => vco.Hz(),
            PllOutput::X2 => (vco * 2).Hz(),
        })
    }
}

/// Clock tree configuration.
///
/// The default runs everything from RCHF at 8 MHz, which is the reset state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[non_exhaustive]
pub struct ClocksConfig {
    /// RCHF frequency
    pub rchf: RchfFrequency,
    /// RCHF trim value, usually read from the factory information area
    pub rchf_trim: Option<u8>,
    /// External crystal frequency, `None` keeps XTHF off
    pub xthf: Option<HertzU32>,
    /// PLL settings, `None` keeps the PLL off
    pub pll: Option<PllConfig>,
    /// System clock source
    pub sysclk: SysclkSource,
    /// AHB prescaler (from SYSCLK)
    pub ahb_prescaler: BusPrescaler,
    /// APB prescaler (from AHB)
    pub apb_prescaler: BusPrescaler,
    /// RCLF output prescaler
    pub rclf_prescaler: RclfPrescaler,
    /// LSCLK source
    pub lsclk: LsclkSource,
}

impl Default for ClocksConfig {
    fn default() -> Self {
        ClocksConfig {
            rchf: RchfFrequency::Mhz8,
            rchf_trim: None,
            xthf: None,
            pll: None,
            sysclk: SysclkSource::Rchf,
            ahb_prescaler: BusPrescaler::Div1,
            apb_prescaler: BusPrescaler::Div1,
            rclf_prescaler: RclfPrescaler::Div1,
            lsclk: LsclkSource::Rclp,
        }
    }
}

impl ClocksConfig {
    /// Set the RCHF frequency.
    pub const fn rchf(mut self, rchf: RchfFrequency) -> Self {
        self.rchf = rchf;
        self
    }

    /// Load an RCHF trim value.
    pub const fn rchf_trim(mut self, trim: u8) -> Self {
        self.rchf_trim = Some(trim);
        self
    }

    /// Enable the external crystal oscillator.
    pub const fn xthf(mut self, freq: HertzU32) -> Self {
        self.xthf = Some(freq);
        self
    }

    /// Enable the PLL.
    pub const fn pll(mut self, pll: PllConfig) -> Self {
        self.pll = Some(pll);
        self
    }

    /// Select the system clock.
    pub const fn sysclk(mut self, source: SysclkSource) -> Self {
        self.sysclk = source;
        self
    }

    /// Set the AHB and APB prescalers.
    pub const fn prescalers(mut self, ahb: BusPrescaler, apb: BusPrescaler) -> Self {
        self.ahb_prescaler = ahb;
        self.apb_prescaler = apb;
        self
    }

    /// Select the LSCLK source.
    pub const fn lsclk(mut self, source: LsclkSource) -> Self {
        self.lsclk = source;
        self
    }

    /// Frequencies produced by this configuration, without touching hardware.
    pub fn clocks(&self) -> Result<Clocks, Error> {
        let rchf = self.rchf.hertz();
        let pll = match self.pll {
            Some(pll) => {
                let reference = match pll.source {
                    PllSource::Rchf => rchf,
                    PllSource::Xthf => self.xthf.ok_or(Error::XthfNotConfigured)?,
                };
                Some(pll.frequency(reference)?)
            }
            None => None,
        };
        let rclf: HertzU32 = (RCLF_FREQ.to_Hz() / self.rclf_prescaler.divisor()).Hz();
        let sysclk = match self.sysclk {
            SysclkSource::Rchf => rchf,
            SysclkSource::Xthf => self.xthf.ok_or(Error::XthfNotConfigured)?,
            SysclkSource::Pll => pll.ok_or(Error::PllNotConfigured)?,
            SysclkSource::Rclf => rclf,
            SysclkSource::Xtlf => XTLF_FREQ,
            SysclkSource::Rclp => RCLP_FREQ,
        };
        let ahbclk: HertzU32 = (sysclk.to_Hz() / self.ahb_prescaler.divisor()).Hz();
        let apbclk: HertzU32 = (ahbclk.to_Hz() / self.apb_prescaler.divisor()).Hz();
        let lsclk = match self.lsclk {
            LsclkSource::Rclp => RCLP_FREQ,
            LsclkSource::Xtlf => XTLF_FREQ,
        };
        Ok(Clocks {
            sysclk,
            ahbclk,
            apbclk,
            lsclk,
            rchf,
            rclf,
            xthf: self.xthf,
            pll,
        })
    }

    /// Apply the configuration.
    pub fn freeze(self, cmu: &mut pac::CMU) -> Result<Clocks, Error> {
        let clocks = self.clocks()?;
        apply(cmu, &self)?;
        Ok(clocks)
    }
}

fn apply(rb: &RegisterBlock, config: &ClocksConfig) -> Result<(), Error> {
    if let Some(trim) = config.rchf_trim {
        rb.rchftr.write_field(cmu::rchftr::TRIM, trim as u32);
    }
    rb.rchfcr.write_field(cmu::rchfcr::FSEL, config.rchf as u32);
    rb.rchfcr.set_bits(cmu::rchfcr::EN.mask());

    if config.xthf.is_some() {
        rb.xthfcr.set_bits(cmu::xthfcr::EN.mask());
    }

    rb.rclfcr.write_field(cmu::rclfcr::PSC, config.rclf_prescaler as u32);
    rb.rclfcr.set_bits(cmu::rclfcr::EN.mask());

    if let Some(pll) = config.pll {
        // the PLL must be off while it is reconfigured, so the core leaves it first
        if rb.sysclkcr.read_field(cmu::sysclkcr::SYSCLKSEL) == SysclkSource::Pll as u32 {
            rb.sysclkcr
                .write_field(cmu::sysclkcr::SYSCLKSEL, SysclkSource::Rchf as u32);
        }
        rb.pllcr.clear_bits(cmu::pllcr::EN.mask());
        rb.pllcr.modify(|r| {
            let r = cmu::pllcr::INSEL.set(r, pll.source as u32);
            let r = cmu::pllcr::REFPRSC.set(r, pll.prescaler as u32);
            let r = cmu::pllcr::DB.set(r, pll.multiplier as u32 - 1);
            cmu::pllcr::OSEL.set(r, pll.output as u32)
        });
        rb.pllcr.set_bits(cmu::pllcr::EN.mask());
        wait_pll_lock(rb)?;
    }

    rb.sysclkcr.modify(|r| {
        let r = cmu::sysclkcr::AHBPRES.set(r, config.ahb_prescaler as u32);
        let r = cmu::sysclkcr::APBPRES.set(r, config.apb_prescaler as u32);
        cmu::sysclkcr::SYSCLKSEL.set(r, config.sysclk as u32)
    });

    if config.lsclk == LsclkSource::Rclp {
        rb.rclpcr.clear_bits(cmu::rclpcr::ENB.mask());
    }
    rb.lsclksel.write(config.lsclk as u32);
    Ok(())
}

fn wait_pll_lock(rb: &RegisterBlock) -> Result<(), Error> {
    for _ in 0..PLL_LOCK_RETRIES {
        if rb.pllcr.bit(cmu::pllcr::LOCKED) {
            return Ok(());
        }
    }
    #[cfg(feature = "defmt")]
    defmt::warn!("PLL did not lock");
    Err(Error::PllLockTimeout)
}

/// Frozen clock frequencies.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Clocks {
    sysclk: HertzU32,
    ahbclk: HertzU32,
    apbclk: HertzU32,
    lsclk: HertzU32,
    rchf: HertzU32,
    rclf: HertzU32,
    xthf: Option<HertzU32>,
    pll: Option<HertzU32>,
}

impl Clocks {
    /// System clock
    pub const fn sysclk(&self) -> HertzU32 {
        self.sysclk
    }
    /// AHB clock
    pub const fn ahbclk(&self) -> HertzU32 {
        self.ahbclk
    }
    /// APB clock
    pub const fn apbclk(&self) -> HertzU32 {
        self.apbclk
    }
    /// Low speed clock
    pub const fn lsclk(&self) -> HertzU32 {
        self.lsclk
    }
    /// RCHF oscillator
    pub const fn rchf(&self) -> HertzU32 {
        self.rchf
    }
    /// RCLF after its prescaler
    pub const fn rclf(&self) -> HertzU32 {
        self.rclf
    }
    /// External crystal, if enabled
    pub const fn xthf(&self) -> Option<HertzU32> {
        self.xthf
    }
    /// PLL output, if enabled
    pub const fn pll(&self) -> Option<HertzU32> {
        self.pll
    }
}

impl Default for Clocks {
    /// Clocks after reset: RCHF 8 MHz everywhere.
    fn default() -> Self {
        let rchf = RchfFrequency::Mhz8.hertz();
        Clocks {
            sysclk: rchf,
            ahbclk: rchf,
            apbclk: rchf,
            lsclk: RCLP_FREQ,
            rchf,
            rclf: RCLF_FREQ,
            xthf: None,
            pll: None,
        }
    }
}

mod private {
    use crate::pac;

    /// A peripheral gated by the CMU.
    pub trait BusClock {
        /// Enable the bus clock, and the operation clock where there is one.
        fn enable_clock(&self, cmu: &mut pac::CMU);
        /// Disable the clocks enabled by [`enable_clock`](Self::enable_clock).
        fn disable_clock(&self, cmu: &mut pac::CMU);
    }
}

pub use private::BusClock;

pub(crate) fn gate(rb: &RegisterBlock, bus: (BusGroup, Field), op: Option<Field>, on: bool) {
    let bus_reg = match bus.0 {
        BusGroup::Group1 => &rb.pclkcr1,
        BusGroup::Group2 => &rb.pclkcr2,
        BusGroup::Group3 => &rb.pclkcr3,
        BusGroup::Group4 => &rb.pclkcr4,
    };
    if on {
        bus_reg.set_bits(bus.1.mask());
        if let Some(op) = op {
            rb.opccr3.set_bits(op.mask());
        }
    } else {
        if let Some(op) = op {
            rb.opccr3.clear_bits(op.mask());
        }
        bus_reg.clear_bits(bus.1.mask());
    }
}

#[derive(Clone, Copy)]
pub(crate) enum BusGroup {
    Group1,
    Group2,
    Group3,
    Group4,
}

macro_rules! bus_clock {
    ($($PERIPH:ident: $group:ident, $reg:ident::$bit:ident $(, op $op:ident)?;)+) => {
        $(
            impl BusClock for pac::$PERIPH {
                fn enable_clock(&self, cmu: &mut pac::CMU) {
                    gate(cmu, (BusGroup::$group, cmu::$reg::$bit), None $(.or(Some(cmu::opccr3::$op)))?, true);
                }
                fn disable_clock(&self, cmu: &mut pac::CMU) {
                    gate(cmu, (BusGroup::$group, cmu::$reg::$bit), None $(.or(Some(cmu::opccr3::$op)))?, false);
                }
            }
        )+
    };
}

bus_clock! {
    GPIOA: Group1, pclkcr1::PAD;
    GPIOB: Group1, pclkcr1::PAD;
    GPIOC: Group1, pclkcr1::PAD;
    GPIOD: Group1, pclkcr1::PAD;
    GPIOE: Group1, pclkcr1::PAD;
    GPIO_COMMON: Group1, pclkcr1::PAD;
    LPTIM16: Group1, pclkcr1::LPTIM16, op LPTIM16;
    COMP: Group1, pclkcr1::COMP;
    OPA1: Group1, pclkcr1::OPA;
    OPA2: Group1, pclkcr1::OPA;
    VREF: Group1, pclkcr1::VREF1P2;
    VREFP: Group1, pclkcr1::VREFREG;
    DMA: Group2, pclkcr2::DMA;
    FLASH: Group2, pclkcr2::FLASH, op FLASH;
    ADC: Group2, pclkcr2::ADC, op ADC;
    DAC: Group2, pclkcr2::DAC;
    UART0: Group3, pclkcr3::UART0, op UART0;
    UART1: Group3, pclkcr3::UART1, op UART1;
    UART3: Group3, pclkcr3::UART3;
    UART4: Group3, pclkcr3::UART4;
    UART5: Group3, pclkcr3::UART5;
    CAN: Group3, pclkcr3::CAN, op CAN;
    BSTIM16: Group4, pclkcr4::BSTIM16, op BSTIM16;
}

/// UART0/UART1 operation clock source.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum UartClockSource {
    /// APB clock
    Apb = 0,
    /// RCHF
    Rchf = 1,
    /// System clock
    Sysclk = 2,
    /// XTHF
    Xthf = 3,
}

/// CAN operation clock source.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CanClockSource {
    /// RCHF
    Rchf = 0,
    /// XTHF
    Xthf = 1,
    /// PLL
    Pll = 2,
    /// APB clock
    Apb = 3,
}

/// BSTIM16 and LPTIM16 operation clock source.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TimerClockSource {
    /// APB clock
    Apb = 0,
    /// LSCLK
    Lsclk = 1,
    /// RCLP
    Rclp = 2,
    /// RCLF
    Rclf = 3,
}

/// ADC operation clock source.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AdcClockSource {
    /// RCLF
    Rclf = 0,
    /// RCHF
    Rchf = 1,
    /// XTHF
    Xthf = 2,
    /// PLL
    Pll = 3,
}

/// ADC operation clock prescaler.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AdcPrescaler {
    /// Divide by 1
    Div1 = 0,
    /// Divide by 2
    Div2 = 1,
    /// Divide by 4
    Div4 = 2,
    /// Divide by 8
    Div8 = 3,
    /// Divide by 16
    Div16 = 4,
    /// Divide by 32
    Div32 = 5,
}

impl Clocks {
    /// Frequency of a UART0/UART1 operation clock source.
    pub fn uart_kernel(&self, source: UartClockSource) -> Option<HertzU32> {
        match source {
            UartClockSource::Apb => Some(self.apbclk),
            UartClockSource::Rchf => Some(self.rchf),
            UartClockSource::Sysclk => Some(self.sysclk),
            UartClockSource::Xthf => self.xthf,
        }
    }

    /// Frequency of a CAN operation clock source.
    pub fn can_kernel(&self, source: CanClockSource) -> Option<HertzU32> {
        match source {
            CanClockSource::Rchf => Some(self.rchf),
            CanClockSource::Xthf => self.xthf,
            CanClockSource::Pll => self.pll,
            CanClockSource::Apb => Some(self.apbclk),
        }
    }

    /// Frequency of a BSTIM16 operation clock source.
    pub fn timer_kernel(&self, source: TimerClockSource) -> HertzU32 {
        match source {
            TimerClockSource::Apb => self.apbclk,
            TimerClockSource::Lsclk => self.lsclk,
            TimerClockSource::Rclp => RCLP_FREQ,
            TimerClockSource::Rclf => self.rclf,
        }
    }

    /// Frequency of the ADC operation clock after its prescaler.
    pub fn adc_kernel(&self, source: AdcClockSource, prescaler: AdcPrescaler) -> Option<HertzU32> {
        let freq = match source {
            AdcClockSource::Rclf => Some(self.rclf),
            AdcClockSource::Rchf => Some(self.rchf),
            AdcClockSource::Xthf => self.xthf,
            AdcClockSource::Pll => self.pll,
        }?;
        Some((freq.to_Hz() >> prescaler as u32).Hz())
    }
}

pub(crate) fn select_uart_source(rb: &RegisterBlock, uart1: bool, source: UartClockSource) {
    let field = if uart1 {
        cmu::opccr1::UART1CKS
    } else {
        cmu::opccr1::UART0CKS
    };
    rb.opccr1.write_field(field, source as u32);
}

pub(crate) fn select_can_source(rb: &RegisterBlock, source: CanClockSource) {
    rb.opccr1.write_field(cmu::opccr1::CANCKS, source as u32);
}

pub(crate) fn select_timer_source(rb: &RegisterBlock, source: TimerClockSource) {
    rb.opccr1.write_field(cmu::opccr1::BT16CKS, source as u32);
}

pub(crate) fn select_lptim16_source(rb: &RegisterBlock, source: TimerClockSource) {
    rb.opccr1.write_field(cmu::opccr1::LPT16CKS, source as u32);
}

pub(crate) fn select_adc_source(rb: &RegisterBlock, source: AdcClockSource, prescaler: AdcPrescaler) {
    rb.opccr2.modify(|r| {
        let r = cmu::opccr2::ADCCKS.set(r, source as u32);
        cmu::opccr2::ADCPRSC.set(r, prescaler as u32)
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block() -> RegisterBlock {
        unsafe { core::mem::zeroed() }
    }

    #[test]
    fn default_is_reset_state() {
        let clocks = ClocksConfig::default().clocks().unwrap();
        assert_eq!(clocks, Clocks::default());
        assert_eq!(clocks.sysclk(), 8.MHz::<1, 1>());
    }

    #[test]
    fn pll_from_rchf() {
        let pll = PllConfig::new(PllSource::Rchf, PllPrescaler::Div8, 64);
        assert_eq!(pll.frequency(8.MHz()), Ok(64.MHz()));

        let mut x2 = PllConfig::new(PllSource::Rchf, PllPrescaler::Div8, 48);
        x2.output = PllOutput::X2;
        assert_eq!(x2.frequency(8.MHz()), Ok(96.MHz()));
    }

    #[test]
    fn pll_out_of_range() {
        let slow = PllConfig::new(PllSource::Rchf, PllPrescaler::Div8, 16);
        assert_eq!(slow.frequency(8.MHz()), Err(Error::PllOutOfRange));
        let zero = PllConfig::new(PllSource::Rchf, PllPrescaler::Div1, 0);
        assert_eq!(zero.frequency(8.MHz()), Err(Error::PllOutOfRange));
        let big = PllConfig::new(PllSource::Rchf, PllPrescaler::Div32, 129);
        assert_eq!(big.frequency(32.MHz()), Err(Error::PllOutOfRange));
    }

    #[test]
    fn bus_prescalers_chain() {
        let clocks = ClocksConfig::default()
            .rchf(RchfFrequency::Mhz32)
            .prescalers(BusPrescaler::Div2, BusPrescaler::Div4)
            .clocks()
            .unwrap();
        assert_eq!(clocks.ahbclk(), 16.MHz::<1, 1>());
        assert_eq!(clocks.apbclk(), 4.MHz::<1, 1>());
    }

    #[test]
    fn xthf_must_be_configured() {
        let config = ClocksConfig::default().sysclk(SysclkSource::Xthf);
        assert_eq!(config.clocks(), Err(Error::XthfNotConfigured));
        let config = ClocksConfig::default()
            .pll(PllConfig::new(PllSource::Xthf, PllPrescaler::Div1, 4))
            .sysclk(SysclkSource::Pll);
        assert_eq!(config.clocks(), Err(Error::XthfNotConfigured));
        let config = ClocksConfig::default().sysclk(SysclkSource::Pll);
        assert_eq!(config.clocks(), Err(Error::PllNotConfigured));
    }

    #[test]
    fn kernel_clocks() {
        let clocks = ClocksConfig::default().xthf(16.MHz()).clocks().unwrap();
        assert_eq!(clocks.uart_kernel(UartClockSource::Xthf), Some(16.MHz()));
        assert_eq!(clocks.can_kernel(CanClockSource::Pll), None);
        assert_eq!(
            clocks.adc_kernel(AdcClockSource::Rchf, AdcPrescaler::Div4),
            Some(2.MHz())
        );
        assert_eq!(clocks.timer_kernel(TimerClockSource::Lsclk), RCLP_FREQ);
    }

    #[test]
    fn apply_programs_registers() {
        let rb = block();
        rb.pllcr.write(cmu::pllcr::LOCKED.mask());
        let config = ClocksConfig::default()
            .rchf_trim(0x40)
            .pll(PllConfig::new(PllSource::Rchf, PllPrescaler::Div8, 64))
            .sysclk(SysclkSource::Pll)
            .prescalers(BusPrescaler::Div1, BusPrescaler::Div2);
        apply(&rb, &config).unwrap();
        assert_eq!(rb.rchftr.read(), 0x40);
        assert!(rb.rchfcr.bit(cmu::rchfcr::EN));
        assert_eq!(rb.pllcr.read_field(cmu::pllcr::DB), 63);
        assert_eq!(rb.pllcr.read_field(cmu::pllcr::REFPRSC), 3);
        assert!(rb.pllcr.bit(cmu::pllcr::EN));
        assert_eq!(rb.sysclkcr.read_field(cmu::sysclkcr::SYSCLKSEL), 2);
        assert_eq!(rb.sysclkcr.read_field(cmu::sysclkcr::APBPRES), 4);
        assert_eq!(rb.lsclksel.read(), 0x55);
    }

    #[test]
    fn pll_lock_times_out() {
        let rb = block();
        let config = ClocksConfig::default()
            .pll(PllConfig::new(PllSource::Rchf, PllPrescaler::Div8, 64));
        assert_eq!(apply(&rb, &config), Err(Error::PllLockTimeout));
    }

    #[test]
    fn core_leaves_the_pll_before_it_is_reconfigured() {
        let rb = block();
        rb.sysclkcr
            .write_field(cmu::sysclkcr::SYSCLKSEL, SysclkSource::Pll as u32);
        let config = ClocksConfig::default()
            .pll(PllConfig::new(PllSource::Rchf, PllPrescaler::Div8, 32))
            .sysclk(SysclkSource::Rchf);
        // no lock: apply stops right after turning the PLL back on
        assert_eq!(apply(&rb, &config), Err(Error::PllLockTimeout));
        assert_eq!(
            rb.sysclkcr.read_field(cmu::sysclkcr::SYSCLKSEL),
            SysclkSource::Rchf as u32
        );
        assert_eq!(rb.pllcr.read_field(cmu::pllcr::DB), 31);
    }

    #[test]
    fn gating_enables_operation_clock() {
        let rb = block();
        gate(
            &rb,
            (BusGroup::Group3, cmu::pclkcr3::UART0),
            Some(cmu::opccr3::UART0),
            true,
        );
        assert!(rb.pclkcr3.bit(cmu::pclkcr3::UART0));
        assert!(rb.opccr3.bit(cmu::opccr3::UART0));
        gate(
            &rb,
            (BusGroup::Group3, cmu::pclkcr3::UART0),
            Some(cmu::opccr3::UART0),
            false,
        );
        assert_eq!(rb.pclkcr3.read(), 0);
        assert_eq!(rb.opccr3.read(), 0);
    }

    #[test]
    fn kernel_source_fields() {
        let rb = block();
        select_uart_source(&rb, true, UartClockSource::Sysclk);
        select_can_source(&rb, CanClockSource::Apb);
        select_timer_source(&rb, TimerClockSource::Rclf);
        assert_eq!(rb.opccr1.read(), (2 << 2) | (3 << 4) | (3 << 14));
        select_lptim16_source(&rb, TimerClockSource::Rclp);
        assert_eq!(cmu::opccr1::LPT16CKS.get(rb.opccr1.read()), 2);
        select_adc_source(&rb, AdcClockSource::Pll, AdcPrescaler::Div32);
        assert_eq!(rb.opccr2.read(), 3 | (5 << 2));
    }
}
