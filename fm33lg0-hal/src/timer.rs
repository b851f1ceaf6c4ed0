//! Basic 16 bit timer (BSTIM16)
//!
//! Up counter with a 16 bit prescaler and a 16 bit auto-reload register.
//! [`Timer`] implements the `embedded-hal` 0.2 [`CountDown`] and the 1.0
//! [`DelayNs`] traits, and can raise a periodic update interrupt.
//!
//! ## Usage
//! ```ignore
//! use embedded_hal_0_2::timer::CountDown;
//! use fugit::ExtU32;
//! let mut timer = Timer::new(p.BSTIM16, TimerClockSource::Apb, &clocks, &mut p.RMU, &mut p.CMU);
//! timer.start(500.millis());
//! nb::block!(timer.wait()).unwrap();
//! ```
//!
//! A periodic tick, e.g. for the receive timeout of [`uart::rx::SerialRx`](crate::uart::rx::SerialRx):
//! ```ignore
//! if let Some(period) = serial.timer_period() {
//!     timer.start_periodic(period)?;
//! }
//! // in the BSTIM interrupt
//! if timer.on_update_interrupt() {
//!     serial.on_timer();
//! }
//! ```

use embedded_hal::delay::DelayNs;
use embedded_hal_0_2::timer::{Cancel, CountDown, Periodic};
use fugit::{HertzU32, MicrosDurationU32};

use crate::cmu::{self, BusClock, Clocks, TimerClockSource};
use crate::pac::{
    self,
    bstim16::{cr1, cr2, egr, ier, isr, RegisterBlock},
};
use crate::rmu::SubsystemReset;

const MAX_COUNT: u64 = 1 << 16;
const MIN_TICKS: u64 = 2;

/// Longest chunk a blocking delay is split into.
const DELAY_CHUNK_US: u32 = 1_000_000;

/// Timer errors
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// The period is shorter than two kernel clocks, or longer than the
    /// prescaler and auto-reload can count.
    OutOfRange,
    /// Cancel on a timer that is not counting.
    NotRunning,
}

/// What the timer drives on its trigger output.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MasterMode {
    /// Software update event
    Reset = 0,
    /// Counter enable
    Enable = 1,
    /// Update event
    Update = 2,
}

/// Prescaler and auto-reload register values giving `period` from a
/// `kernel` clock.
///
/// An auto-reload of 0 never overflows, so a period needs at least two ticks.
pub(crate) fn period_to_registers(
    kernel: HertzU32,
    period: MicrosDurationU32,
) -> Result<(u16, u16), Error> {
    let ticks = u64::from(kernel.to_Hz()) * u64::from(period.to_micros()) / 1_000_000;
    if ticks < MIN_TICKS {
        return Err(Error::OutOfRange);
    }
    let psc = ticks.div_ceil(MAX_COUNT);
    if psc > MAX_COUNT {
        return Err(Error::OutOfRange);
    }
    let arr = ticks / psc - 1;
    Ok(((psc - 1) as u16, arr as u16))
}

/// Like [`period_to_registers`], but clamps unreachable periods to the
/// shortest or longest count.
pub(crate) fn saturating_registers(kernel: HertzU32, period: MicrosDurationU32) -> (u16, u16) {
    period_to_registers(kernel, period).unwrap_or_else(|_| {
        let ticks = u64::from(kernel.to_Hz()) * u64::from(period.to_micros()) / 1_000_000;
        if ticks < MIN_TICKS {
            (0, (MIN_TICKS - 1) as u16)
        } else {
            (u16::MAX, u16::MAX)
        }
    })
}

/// Loads prescaler and auto-reload and restarts the counter from zero,
/// without raising the update flag.
pub(crate) fn load(rb: &RegisterBlock, psc: u16, arr: u16) {
    rb.cr1.clear_bits(cr1::CEN.mask());
    rb.psc.write(u32::from(psc));
    rb.arr.write(u32::from(arr));
    // overflow only updates, so the forced update below leaves UIF alone
    rb.cr1.set_bits(cr1::URS.mask() | cr1::ARPE.mask());
    rb.egr.write(egr::UG.mask());
    rb.cnt.write(0);
    rb.isr.write(isr::UIF.mask());
}

pub(crate) fn poll_update(rb: &RegisterBlock) -> bool {
    if rb.isr.bit(isr::UIF) {
        // write one to clear
        rb.isr.write(isr::UIF.mask());
        true
    } else {
        false
    }
}

/// BSTIM16 timer
pub struct Timer {
    device: pac::BSTIM16,
    kernel: HertzU32,
    running: bool,
}

impl Timer {
    /// Brings the timer out of reset and selects its kernel clock.
    pub fn new(
        device: pac::BSTIM16,
        source: TimerClockSource,
        clocks: &Clocks,
        rmu: &mut pac::RMU,
        cmu: &mut pac::CMU,
    ) -> Self {
        device.reset_bring_down(rmu);
        device.reset_bring_up(rmu);
        cmu::select_timer_source(cmu, source);
        device.enable_clock(cmu);

        Self {
            device,
            kernel: clocks.timer_kernel(source),
            running: false,
        }
    }

    /// Stops the timer and frees the register block.
    pub fn free(self) -> pac::BSTIM16 {
        self.device.cr1.clear_bits(cr1::CEN.mask());
        self.device.ier.clear_bits(ier::UIE.mask());
        self.device
    }

    /// Kernel clock frequency, before the prescaler.
    pub fn kernel_freq(&self) -> HertzU32 {
        self.kernel
    }

    /// Sets the prescaler, the counter runs at kernel / (`psc` + 1).
    pub fn set_prescaler(&mut self, psc: u16) {
        self.device.psc.write(u32::from(psc));
    }

    /// Sets the auto-reload value.
    pub fn set_auto_reload(&mut self, arr: u16) {
        self.device.arr.write(u32::from(arr));
    }

    /// Buffers auto-reload writes until the next update event.
    pub fn set_auto_reload_preload(&mut self, on: bool) {
        self.device.cr1.write_bit(cr1::ARPE, on);
    }

    /// Stops the counter at the next update event.
    pub fn set_one_pulse(&mut self, on: bool) {
        self.device.cr1.write_bit(cr1::OPM, on);
    }

    /// Only counter overflow raises the update flag, not [`Timer::generate_update`].
    pub fn set_update_on_overflow_only(&mut self, on: bool) {
        self.device.cr1.write_bit(cr1::URS, on);
    }

    /// Suppresses update events.
    pub fn set_update_disabled(&mut self, on: bool) {
        self.device.cr1.write_bit(cr1::UDIS, on);
    }

    /// Selects the trigger output.
    pub fn set_master_mode(&mut self, mode: MasterMode) {
        self.device.cr2.write_field(cr2::MMS, mode as u32);
    }

    /// Starts counting.
    pub fn enable(&mut self) {
        self.device.cr1.set_bits(cr1::CEN.mask());
        self.running = true;
    }

    /// Stops counting.
    pub fn disable(&mut self) {
        self.device.cr1.clear_bits(cr1::CEN.mask());
        self.running = false;
    }

    /// Current counter value.
    pub fn counter(&self) -> u16 {
        self.device.cnt.read() as u16
    }

    /// Forces an update event, reloading prescaler and auto-reload.
    pub fn generate_update(&mut self) {
        self.device.egr.write(egr::UG.mask());
    }

    /// Enables the update interrupt.
    pub fn enable_update_interrupt(&mut self) {
        self.device.ier.set_bits(ier::UIE.mask());
    }

    /// Disables the update interrupt.
    pub fn disable_update_interrupt(&mut self) {
        self.device.ier.clear_bits(ier::UIE.mask());
    }

    /// Update flag.
    pub fn is_update_pending(&self) -> bool {
        self.device.isr.bit(isr::UIF)
    }

    /// Clears the update flag.
    pub fn clear_update(&mut self) {
        self.device.isr.write(isr::UIF.mask());
    }

    /// Starts a periodic update interrupt every `period`.
    pub fn start_periodic(&mut self, period: MicrosDurationU32) -> Result<(), Error> {
        let (psc, arr) = period_to_registers(self.kernel, period)?;
        load(&self.device, psc, arr);
        self.enable_update_interrupt();
        self.enable();
        Ok(())
    }

    /// Interrupt handler helper: returns `true` and clears the flag if an
    /// enabled update event fired.
    pub fn on_update_interrupt(&mut self) -> bool {
        self.device.ier.bit(ier::UIE) && poll_update(&self.device)
    }

    fn delay_us_internal(&mut self, mut us: u32) {
        while us > 0 {
            let chunk = us.min(DELAY_CHUNK_US);
            // two kernel ticks is the finest resolution, round short delays up
            let (psc, arr) = saturating_registers(self.kernel, MicrosDurationU32::micros(chunk));
            load(&self.device, psc, arr);
            self.device.cr1.set_bits(cr1::CEN.mask());
            while !poll_update(&self.device) {}
            self.device.cr1.clear_bits(cr1::CEN.mask());
            us -= chunk;
        }
        self.running = false;
    }
}

impl CountDown for Timer {
    type Time = MicrosDurationU32;

    fn start<T>(&mut self, count: T)
    where
        T: Into<Self::Time>,
    {
        // The trait has no error path: saturate to what the hardware can count.
        let (psc, arr) = saturating_registers(self.kernel, count.into());
        load(&self.device, psc, arr);
        self.enable();
    }

    fn wait(&mut self) -> nb::Result<(), void::Void> {
        if poll_update(&self.device) {
            Ok(())
        } else {
            Err(nb::Error::WouldBlock)
        }
    }
}

impl Periodic for Timer {}

impl Cancel for Timer {
    type Error = Error;

    fn cancel(&mut self) -> Result<(), Self::Error> {
        if !self.running {
            return Err(Error::NotRunning);
        }
        self.disable();
        Ok(())
    }
}

impl DelayNs for Timer {
    fn delay_ns(&mut self, ns: u32) {
        self.delay_us_internal(ns.div_ceil(1000))
    }

    fn delay_us(&mut self, us: u32) {
        self.delay_us_internal(us)
    }

    fn delay_ms(&mut self, ms: u32) {
        for _ in 0..ms / 1000 {
            self.delay_us_internal(1_000_000);
        }
        self.delay_us_internal((ms % 1000) * 1000)
    }
}

impl embedded_hal_0_2::blocking::delay::DelayUs<u32> for Timer {
    fn delay_us(&mut self, us: u32) {
        self.delay_us_internal(us)
    }
}

impl embedded_hal_0_2::blocking::delay::DelayMs<u32> for Timer {
    fn delay_ms(&mut self, ms: u32) {
        DelayNs::delay_ms(self, ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fugit::RateExtU32;

    fn block() -> RegisterBlock {
        unsafe { core::mem::zeroed() }
    }

    #[test]
    fn short_period_needs_no_prescaler() {
        assert_eq!(
            period_to_registers(8.MHz(), MicrosDurationU32::millis(1)),
            Ok((0, 7999))
        );
    }

    #[test]
    fn long_period_uses_prescaler() {
        let (psc, arr) = period_to_registers(8.MHz(), MicrosDurationU32::secs(1)).unwrap();
        assert_eq!(psc, 122);
        assert_eq!(arr, 65039);
    }

    #[test]
    fn slow_kernel() {
        // 32768 Hz, 1 s
        assert_eq!(
            period_to_registers(32_768.Hz(), MicrosDurationU32::secs(1)),
            Ok((0, 32767))
        );
    }

    #[test]
    fn out_of_range_periods() {
        assert_eq!(
            period_to_registers(1.kHz(), MicrosDurationU32::micros(10)),
            Err(Error::OutOfRange)
        );
        assert_eq!(
            period_to_registers(64.MHz(), MicrosDurationU32::secs(4000)),
            Err(Error::OutOfRange)
        );
    }

    #[test]
    fn single_tick_period_is_rejected() {
        // 1 MHz, 1 µs: ARR would be 0 and never overflow
        assert_eq!(
            period_to_registers(1.MHz(), MicrosDurationU32::micros(1)),
            Err(Error::OutOfRange)
        );
        assert_eq!(
            period_to_registers(1.MHz(), MicrosDurationU32::micros(2)),
            Ok((0, 1))
        );
    }

    #[test]
    fn unreachable_periods_saturate() {
        assert_eq!(saturating_registers(1.MHz(), MicrosDurationU32::micros(0)), (0, 1));
        assert_eq!(saturating_registers(1.MHz(), MicrosDurationU32::micros(1)), (0, 1));
        assert_eq!(
            saturating_registers(64.MHz(), MicrosDurationU32::secs(4000)),
            (u16::MAX, u16::MAX)
        );
        assert_eq!(
            saturating_registers(8.MHz(), MicrosDurationU32::millis(1)),
            (0, 7999)
        );
    }

    #[test]
    fn load_programs_counter() {
        let rb = block();
        rb.cr1.write(cr1::CEN.mask());
        rb.cnt.write(1234);
        load(&rb, 9, 999);
        assert_eq!(rb.psc.read(), 9);
        assert_eq!(rb.arr.read(), 999);
        assert_eq!(rb.cnt.read(), 0);
        assert!(!rb.cr1.bit(cr1::CEN));
        assert!(rb.cr1.bit(cr1::URS));
        assert!(rb.cr1.bit(cr1::ARPE));
        assert_eq!(rb.egr.read(), egr::UG.mask());
    }

    #[test]
    fn update_polling() {
        let rb = block();
        assert!(!poll_update(&rb));
        rb.isr.write(isr::UIF.mask());
        assert!(poll_update(&rb));
    }
}
