//! VBAT always-on domain (VAO)
//!
//! The battery backed domain holds the low frequency crystal oscillator
//! (XTLF) with its fail detector, and the PH15 pin. It has no reset line in
//! the RMU and no bus clock gate; [`VbatDomain::reset`] pulses its own reset.
//!
//! ```ignore
//! let vao = p.VAO.split();
//! let mut xtlf = vao.xtlf;
//! xtlf.configure(DriveLevel::Level3, WorkCurrent::Na450);
//! xtlf.enable();
//! let mut ph15 = vao.ph15.into_push_pull_output();
//! ph15.set_high().unwrap();
//! ```
use core::convert::Infallible;
use core::marker::PhantomData;

use crate::gpio::{Floating, Input, OpenDrain, Output, PullUp, PushPull};
use crate::pac;
use crate::pac::vao::{
    fcr, fdier, fdisr, rstcr, xtlfcr, xtlfpr, RegisterBlock, PH15, XTLF_DISABLE_KEY,
    XTLF_ENABLE_KEY,
};
use crate::typelevel::Sealed;

/// Extension trait to split the VAO block.
pub trait VaoExt: Sealed {
    /// Split into the oscillator, the PH15 pin and the domain reset.
    fn split(self) -> Parts;
}

/// VAO parts
pub struct Parts {
    /// Low frequency crystal oscillator
    pub xtlf: Xtlf,
    /// PH15, as a floating input
    pub ph15: Ph15<Input<Floating>>,
    /// Domain reset
    pub domain: VbatDomain,
}

impl Sealed for pac::VAO {}

impl VaoExt for pac::VAO {
    fn split(self) -> Parts {
        configure_ph15(&self, Ph15Mode::INPUT_FLOATING);
        Parts {
            xtlf: Xtlf { _private: () },
            ph15: Ph15 {
                _mode: PhantomData,
            },
            domain: VbatDomain { _private: () },
        }
    }
}

fn regs() -> &'static RegisterBlock {
    // Safety: every part owns disjoint registers of the block
    unsafe { &*pac::VAO::ptr() }
}

/// XTLF drive strength.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[allow(missing_docs)]
pub enum DriveLevel {
    None = 0,
    Level1 = 1,
    Level2 = 2,
    Level3 = 3,
    Level4 = 4,
    Level5 = 5,
    Level6 = 6,
    Level7 = 7,
}

/// XTLF working current.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[allow(missing_docs)]
pub enum WorkCurrent {
    Na850 = 0x0,
    Na800 = 0x1,
    Na750 = 0x2,
    Na700 = 0x3,
    Na650 = 0x4,
    Na600 = 0x5,
    Na550 = 0x6,
    Na500 = 0x7,
    Na450 = 0x8,
    Na400 = 0x9,
    Na350 = 0xa,
    Na300 = 0xb,
    Na250 = 0xc,
    Na200 = 0xd,
    Na150 = 0xe,
    Na100 = 0xf,
}

/// Low frequency crystal oscillator.
pub struct Xtlf {
    _private: (),
}

pub(crate) fn xtlf_enable(rb: &RegisterBlock, on: bool) {
    // the whole register is the key
    rb.xtlfcr
        .write(xtlfcr::XTLFEN.val(if on { XTLF_ENABLE_KEY } else { XTLF_DISABLE_KEY }));
}

pub(crate) fn xtlf_configure(rb: &RegisterBlock, drive: DriveLevel, current: WorkCurrent) {
    rb.xtlfpr.modify(|r| {
        let r = xtlfpr::DRVCFG.set(r, drive as u32);
        xtlfpr::XTLFIPW.set(r, current as u32)
    });
}

impl Xtlf {
    /// Sets drive strength and working current.
    pub fn configure(&mut self, drive: DriveLevel, current: WorkCurrent) {
        xtlf_configure(regs(), drive, current)
    }

    /// Starts the oscillator.
    pub fn enable(&mut self) {
        xtlf_enable(regs(), true)
    }

    /// Stops the oscillator.
    pub fn disable(&mut self) {
        xtlf_enable(regs(), false)
    }

    /// Is the oscillator running.
    pub fn is_enabled(&self) -> bool {
        regs().xtlfcr.read_field(xtlfcr::XTLFEN) == XTLF_ENABLE_KEY
    }

    /// Enables the fail detect interrupt.
    pub fn enable_fail_interrupt(&mut self) {
        regs().fdier.set_bits(fdier::LFDET_IE.mask());
    }

    /// Disables the fail detect interrupt.
    pub fn disable_fail_interrupt(&mut self) {
        regs().fdier.clear_bits(fdier::LFDET_IE.mask());
    }

    /// The detector currently sees the oscillator stopped.
    pub fn has_failed(&self) -> bool {
        regs().fdisr.bit(fdisr::LFDETO)
    }

    /// Latched fail detect flag.
    pub fn is_fail_pending(&self) -> bool {
        regs().fdisr.bit(fdisr::LFDETIF)
    }

    /// Clears the fail detect flag.
    pub fn clear_fail(&mut self) {
        // write one to clear
        regs().fdisr.write(fdisr::LFDETIF.mask());
    }

    /// Interrupt handler helper: returns `true` and clears the flag if the
    /// oscillator failed.
    pub fn on_interrupt(&mut self) -> bool {
        let rb = regs();
        if rb.fdier.bit(fdier::LFDET_IE) && rb.fdisr.bit(fdisr::LFDETIF) {
            self.clear_fail();
            #[cfg(feature = "defmt")]
            defmt::warn!("xtlf failure");
            true
        } else {
            false
        }
    }
}

/// Reset of the VBAT domain.
pub struct VbatDomain {
    _private: (),
}

impl VbatDomain {
    /// Holds the domain in reset.
    pub fn assert_reset(&mut self) {
        regs().rstcr.set_bits(rstcr::VBAT_RST.mask());
    }

    /// Releases the domain reset.
    pub fn release_reset(&mut self) {
        regs().rstcr.clear_bits(rstcr::VBAT_RST.mask());
    }

    /// Pulses the domain reset.
    pub fn reset(&mut self) {
        self.assert_reset();
        self.release_reset();
    }
}

/// RTC output function of PH15 (type state)
#[derive(Default)]
pub struct RtcOut;

#[doc(hidden)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Ph15Mode {
    function: u32,
    input: bool,
    pull_up: bool,
    open_drain: bool,
}

impl Ph15Mode {
    const INPUT_FLOATING: Ph15Mode = Ph15Mode {
        function: 0,
        input: true,
        pull_up: false,
        open_drain: false,
    };
}

/// A PH15 mode
pub trait Ph15PinMode: Sealed {
    #[doc(hidden)]
    const CONFIG: Ph15Mode;
}

impl Ph15PinMode for Input<Floating> {
    const CONFIG: Ph15Mode = Ph15Mode::INPUT_FLOATING;
}

impl Ph15PinMode for Input<PullUp> {
    const CONFIG: Ph15Mode = Ph15Mode {
        pull_up: true,
        ..Ph15Mode::INPUT_FLOATING
    };
}

impl Ph15PinMode for Output<PushPull> {
    const CONFIG: Ph15Mode = Ph15Mode {
        function: 1,
        input: false,
        pull_up: false,
        open_drain: false,
    };
}

impl Ph15PinMode for Output<OpenDrain> {
    const CONFIG: Ph15Mode = Ph15Mode {
        function: 1,
        input: true,
        pull_up: false,
        open_drain: true,
    };
}

impl Sealed for RtcOut {}
impl Ph15PinMode for RtcOut {
    const CONFIG: Ph15Mode = Ph15Mode {
        function: 2,
        input: false,
        pull_up: false,
        open_drain: false,
    };
}

pub(crate) fn configure_ph15(rb: &RegisterBlock, mode: Ph15Mode) {
    rb.inen.write_bit(PH15, mode.input);
    rb.puen.write_bit(PH15, mode.pull_up);
    rb.oden.write_bit(PH15, mode.open_drain);
    rb.fcr.write_field(fcr::PH15FCR, mode.function);
}

/// The PH15 pin of the VBAT domain.
pub struct Ph15<MODE> {
    _mode: PhantomData<MODE>,
}

impl<MODE: Ph15PinMode> Ph15<MODE> {
    fn into_mode<NEW: Ph15PinMode>(self) -> Ph15<NEW> {
        configure_ph15(regs(), NEW::CONFIG);
        Ph15 { _mode: PhantomData }
    }

    /// Configures the pin as a floating input.
    pub fn into_floating_input(self) -> Ph15<Input<Floating>> {
        self.into_mode()
    }

    /// Configures the pin as a pulled up input.
    pub fn into_pull_up_input(self) -> Ph15<Input<PullUp>> {
        self.into_mode()
    }

    /// Configures the pin as a push pull output.
    pub fn into_push_pull_output(self) -> Ph15<Output<PushPull>> {
        self.into_mode()
    }

    /// Configures the pin as an open drain output.
    pub fn into_open_drain_output(self) -> Ph15<Output<OpenDrain>> {
        self.into_mode()
    }

    /// Hands the pin to the RTC output.
    pub fn into_rtc_output(self) -> Ph15<RtcOut> {
        self.into_mode()
    }

    /// Switches the input to the low threshold level.
    pub fn set_low_threshold(&mut self, low: bool) {
        regs().vilr.write_bit(PH15, low);
    }

    #[inline(always)]
    fn _is_low(&self) -> bool {
        !regs().dir.bit(PH15)
    }

    #[inline(always)]
    fn _is_set_low(&self) -> bool {
        !regs().dor.bit(PH15)
    }

    #[inline(always)]
    fn _set_low(&mut self) {
        regs().dor.clear_bits(PH15.mask());
    }

    #[inline(always)]
    fn _set_high(&mut self) {
        regs().dor.set_bits(PH15.mask());
    }
}

impl<MODE> embedded_hal::digital::ErrorType for Ph15<MODE> {
    type Error = Infallible;
}

impl<OTYPE> embedded_hal::digital::OutputPin for Ph15<Output<OTYPE>>
where
    Output<OTYPE>: Ph15PinMode,
{
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self._set_low();
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self._set_high();
        Ok(())
    }
}

impl<OTYPE> embedded_hal::digital::StatefulOutputPin for Ph15<Output<OTYPE>>
where
    Output<OTYPE>: Ph15PinMode,
{
    fn is_set_high(&mut self) -> Result<bool, Self::Error> {
        Ok(!self._is_set_low())
    }

    fn is_set_low(&mut self) -> Result<bool, Self::Error> {
        Ok(self._is_set_low())
    }
}

impl<PULL> embedded_hal::digital::InputPin for Ph15<Input<PULL>>
where
    Input<PULL>: Ph15PinMode,
{
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(!self._is_low())
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(self._is_low())
    }
}

impl embedded_hal::digital::InputPin for Ph15<Output<OpenDrain>> {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(!self._is_low())
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(self._is_low())
    }
}

impl<OTYPE> embedded_hal_0_2::digital::v2::OutputPin for Ph15<Output<OTYPE>>
where
    Output<OTYPE>: Ph15PinMode,
{
    type Error = Infallible;

    fn set_low(&mut self) -> Result<(), Self::Error> {
        self._set_low();
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self._set_high();
        Ok(())
    }
}

impl<PULL> embedded_hal_0_2::digital::v2::InputPin for Ph15<Input<PULL>>
where
    Input<PULL>: Ph15PinMode,
{
    type Error = Infallible;

    fn is_high(&self) -> Result<bool, Self::Error> {
        Ok(!self._is_low())
    }

    fn is_low(&self) -> Result<bool, Self::Error> {
        Ok(self._is_low())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block() -> RegisterBlock {
        unsafe { core::mem::zeroed() }
    }

    #[test]
    fn xtlf_key() {
        let rb = block();
        xtlf_enable(&rb, true);
        assert_eq!(rb.xtlfcr.read(), 0x5);
        xtlf_enable(&rb, false);
        assert_eq!(rb.xtlfcr.read(), 0xA);
    }

    #[test]
    fn xtlf_parameters() {
        let rb = block();
        xtlf_configure(&rb, DriveLevel::Level5, WorkCurrent::Na200);
        assert_eq!(rb.xtlfpr.read_field(xtlfpr::DRVCFG), 5);
        assert_eq!(rb.xtlfpr.read_field(xtlfpr::XTLFIPW), 0xd);
    }

    #[test]
    fn ph15_modes() {
        let rb = block();
        configure_ph15(&rb, <Output<OpenDrain> as Ph15PinMode>::CONFIG);
        assert!(rb.oden.bit(PH15));
        assert!(rb.inen.bit(PH15));
        assert_eq!(rb.fcr.read_field(fcr::PH15FCR), 1);

        configure_ph15(&rb, <Input<PullUp> as Ph15PinMode>::CONFIG);
        assert!(!rb.oden.bit(PH15));
        assert!(rb.puen.bit(PH15));
        assert_eq!(rb.fcr.read_field(fcr::PH15FCR), 0);

        configure_ph15(&rb, RtcOut::CONFIG);
        assert!(!rb.inen.bit(PH15));
        assert!(!rb.puen.bit(PH15));
        assert_eq!(rb.fcr.read(), 2 << 30);
    }
}
