//! Reset management
//!
//! Peripheral resets, reset cause readout, brown-out / power-down reset
//! thresholds and software reset.
//!
//! Peripheral resets are locked behind `PRSTEN`: the key has to be written
//! before any bit of `AHBRSTCR`/`APBRSTCRx` takes effect. Drivers go through
//! [`SubsystemReset`] so that the unlock and lock happen around every pulse.
use crate::pac;
use crate::pac::rmu::{self, RegisterBlock, PRSTEN_KEY, SOFTRST_KEY};
use crate::pac::{Field, Reg};

mod private {
    use crate::pac;

    /// A peripheral with a reset line in the RMU.
    pub trait SubsystemReset {
        /// Release the peripheral from reset and lock the reset registers.
        fn reset_bring_up(&self, rmu: &mut pac::RMU);
        /// Hold the peripheral in reset.
        fn reset_bring_down(&self, rmu: &mut pac::RMU);
    }
}

pub use private::SubsystemReset;

#[derive(Clone, Copy)]
pub(crate) enum ResetRegister {
    Ahb,
    Apb1,
    Apb2,
}

fn reset_register(rb: &RegisterBlock, reg: ResetRegister) -> &Reg {
    match reg {
        ResetRegister::Ahb => &rb.ahbrstcr,
        ResetRegister::Apb1 => &rb.apbrstcr1,
        ResetRegister::Apb2 => &rb.apbrstcr2,
    }
}

pub(crate) fn bring_down(rb: &RegisterBlock, reg: ResetRegister, bit: Field) {
    rb.prsten.write(PRSTEN_KEY);
    reset_register(rb, reg).set_bits(bit.mask());
}

pub(crate) fn bring_up(rb: &RegisterBlock, reg: ResetRegister, bit: Field) {
    reset_register(rb, reg).clear_bits(bit.mask());
    rb.prsten.write(!PRSTEN_KEY);
}

macro_rules! generate_reset {
    ($MODULE:ident, $reg:ident, $bit:path) => {
        impl SubsystemReset for pac::$MODULE {
            fn reset_bring_up(&self, rmu: &mut pac::RMU) {
                bring_up(rmu, ResetRegister::$reg, $bit);
            }
            fn reset_bring_down(&self, rmu: &mut pac::RMU) {
                bring_down(rmu, ResetRegister::$reg, $bit);
            }
        }
    };
}

generate_reset!(DMA, Ahb, rmu::ahbrstcr::DMA);
generate_reset!(DAC, Apb1, rmu::apbrstcr1::DAC);
generate_reset!(VREFP, Apb1, rmu::apbrstcr1::VREF);
generate_reset!(BSTIM16, Apb1, rmu::apbrstcr1::BSTIM16);
generate_reset!(LPTIM16, Apb1, rmu::apbrstcr1::LPTIM16);
generate_reset!(UART0, Apb1, rmu::apbrstcr1::UART0);
generate_reset!(UART1, Apb1, rmu::apbrstcr1::UART1);
generate_reset!(UART3, Apb1, rmu::apbrstcr1::UART3);
generate_reset!(UART4, Apb1, rmu::apbrstcr1::UART4);
generate_reset!(UART5, Apb1, rmu::apbrstcr1::UART5);
generate_reset!(COMP, Apb2, rmu::apbrstcr2::COMP);
generate_reset!(CAN, Apb2, rmu::apbrstcr2::CAN);
generate_reset!(ADC, Apb2, rmu::apbrstcr2::ADC);

/// Pulse the reset line of a peripheral.
pub fn reset<P: SubsystemReset>(peripheral: &P, rmu: &mut pac::RMU) {
    peripheral.reset_bring_down(rmu);
    peripheral.reset_bring_up(rmu);
}

/// Causes of the last reset, as latched in `RSTFR`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ResetFlags(u32);

impl ResetFlags {
    /// Raw register value.
    pub const fn bits(self) -> u32 {
        self.0
    }
    /// Power-on reset.
    pub const fn power_on(self) -> bool {
        self.0 & rmu::rstfr::PORN.mask() != 0
    }
    /// Power-down reset.
    pub const fn power_down(self) -> bool {
        self.0 & rmu::rstfr::PDRN.mask() != 0
    }
    /// External NRST pin.
    pub const fn pin(self) -> bool {
        self.0 & rmu::rstfr::NRSTN.mask() != 0
    }
    /// Software reset through `SOFTRST`.
    pub const fn software(self) -> bool {
        self.0 & rmu::rstfr::SOFTN.mask() != 0
    }
    /// NVIC `SYSRESETREQ`.
    pub const fn nvic(self) -> bool {
        self.0 & rmu::rstfr::NVICN.mask() != 0
    }
    /// Independent watchdog.
    pub const fn iwdt(self) -> bool {
        self.0 & rmu::rstfr::IWDTN.mask() != 0
    }
    /// Window watchdog.
    pub const fn wwdt(self) -> bool {
        self.0 & rmu::rstfr::WWDTN.mask() != 0
    }
    /// CPU lockup.
    pub const fn lockup(self) -> bool {
        self.0 & rmu::rstfr::LKUPN.mask() != 0
    }
    /// Power-up reset of the core domain.
    pub const fn power_regulator(self) -> bool {
        self.0 & rmu::rstfr::PRC.mask() != 0
    }
    /// Debugger mode change.
    pub const fn debug_mode(self) -> bool {
        self.0 & rmu::rstfr::MDFN.mask() != 0
    }
}

/// Power-down reset threshold.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PdrThreshold {
    /// 1.40 V
    V1_40 = 0,
    /// 1.45 V
    V1_45 = 1,
    /// 1.50 V
    V1_50 = 2,
    /// 1.55 V
    V1_55 = 3,
}

/// Brown-out reset threshold.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BorThreshold {
    /// 1.80 V
    V1_80 = 0,
    /// 2.00 V
    V2_00 = 1,
    /// 2.20 V
    V2_20 = 2,
    /// 2.40 V
    V2_40 = 3,
}

/// Reset cause flags. Reading does not clear them.
pub fn reset_flags(rmu: &pac::RMU) -> ResetFlags {
    read_flags(rmu)
}

/// Clear the latched reset causes.
pub fn clear_reset_flags(rmu: &mut pac::RMU, flags: ResetFlags) {
    clear_flags(rmu, flags)
}

/// Configure the power-down reset. `None` disables it.
pub fn set_pdr(rmu: &mut pac::RMU, threshold: Option<PdrThreshold>) {
    configure_pdr(rmu, threshold)
}

/// Configure the brown-out reset. `None` disables it.
pub fn set_bor(rmu: &mut pac::RMU, threshold: Option<BorThreshold>) {
    configure_bor(rmu, threshold)
}

/// Reset the chip when the core locks up.
pub fn set_lockup_reset(rmu: &mut pac::RMU, enable: bool) {
    rmu.lkpcr.write_bit(rmu::lkpcr::EN, enable);
}

/// Reset the whole chip.
pub fn software_reset(rmu: &mut pac::RMU) -> ! {
    rmu.softrst.write(SOFTRST_KEY);
    loop {
        cortex_m::asm::nop();
    }
}

fn read_flags(rb: &RegisterBlock) -> ResetFlags {
    ResetFlags(rb.rstfr.read())
}

fn clear_flags(rb: &RegisterBlock, flags: ResetFlags) {
    // write 1 to clear
    rb.rstfr.write(flags.0);
}

fn configure_pdr(rb: &RegisterBlock, threshold: Option<PdrThreshold>) {
    match threshold {
        Some(t) => {
            rb.pdrcr.write_field(rmu::pdrcr::CFG, t as u32);
            rb.pdrcr.set_bits(rmu::pdrcr::EN.mask());
        }
        None => rb.pdrcr.clear_bits(rmu::pdrcr::EN.mask()),
    }
}

fn configure_bor(rb: &RegisterBlock, threshold: Option<BorThreshold>) {
    match threshold {
        Some(t) => {
            rb.borcr.write_field(rmu::borcr::CFG, t as u32);
            rb.borcr.clear_bits(rmu::borcr::ENB.mask());
        }
        None => rb.borcr.set_bits(rmu::borcr::ENB.mask()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block() -> RegisterBlock {
        unsafe { core::mem::zeroed() }
    }

    #[test]
    fn reset_pulse_unlocks_and_relocks() {
        let rb = block();
        bring_down(&rb, ResetRegister::Apb1, rmu::apbrstcr1::UART0);
        assert_eq!(rb.prsten.read(), PRSTEN_KEY);
        assert!(rb.apbrstcr1.bit(rmu::apbrstcr1::UART0));

        bring_up(&rb, ResetRegister::Apb1, rmu::apbrstcr1::UART0);
        assert_eq!(rb.apbrstcr1.read(), 0);
        assert_eq!(rb.prsten.read(), !PRSTEN_KEY);
    }

    #[test]
    fn reset_lines_land_in_their_register() {
        let rb = block();
        bring_down(&rb, ResetRegister::Apb2, rmu::apbrstcr2::CAN);
        bring_down(&rb, ResetRegister::Ahb, rmu::ahbrstcr::DMA);
        assert_eq!(rb.apbrstcr2.read(), 1 << 2);
        assert_eq!(rb.ahbrstcr.read(), 1);
        assert_eq!(rb.apbrstcr1.read(), 0);
    }

    #[test]
    fn reset_flags_decode() {
        let rb = block();
        rb.rstfr.write((1 << 9) | (1 << 5));
        let flags = read_flags(&rb);
        assert!(flags.power_on());
        assert!(flags.software());
        assert!(!flags.pin());
        assert!(!flags.lockup());
    }

    #[test]
    fn bor_enable_is_active_low() {
        let rb = block();
        configure_bor(&rb, None);
        assert!(rb.borcr.bit(rmu::borcr::ENB));
        configure_bor(&rb, Some(BorThreshold::V2_20));
        assert!(!rb.borcr.bit(rmu::borcr::ENB));
        assert_eq!(rb.borcr.read_field(rmu::borcr::CFG), 2);
    }

    #[test]
    fn pdr_threshold() {
        let rb = block();
        configure_pdr(&rb, Some(PdrThreshold::V1_55));
        assert_eq!(rb.pdrcr.read(), (3 << 1) | 1);
        configure_pdr(&rb, None);
        assert_eq!(rb.pdrcr.read(), 3 << 1);
    }
}
