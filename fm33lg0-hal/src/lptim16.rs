//! Low power 16 bit timer (LPTIM16)
//!
//! Up counter clocked from APB, LSCLK, RCLP or RCLF through a power of two
//! prescaler, or from edges on the ETR input. Two channels do input capture
//! or output compare. In [`Mode::ExternalPulse`] the counter runs from ETR
//! edges alone and keeps counting with every internal clock stopped.
//!
//! ## Usage
//! ```ignore
//! use fugit::ExtU32;
//! let config = LpTimerConfig::new(TimerClockSource::Lsclk).auto_reload(32767);
//! let mut lptim = LpTimer::new(p.LPTIM16, &config, &clocks, &mut p.RMU, &mut p.CMU);
//! lptim.enable_interrupt(Event::Overflow);
//! lptim.enable();
//! // in the LPTIM interrupt
//! if lptim.on_interrupt().contains(Event::Overflow) {
//!     seconds += 1;
//! }
//! ```

use fugit::{HertzU32, MicrosDurationU32, RateExtU32};

use crate::cmu::{self, BusClock, BusGroup, Clocks, TimerClockSource};
use crate::pac::{
    self,
    cmu::pclkcr1,
    lptim16::{ccsr, cfgr, cr, isr, RegisterBlock},
};
use crate::rmu::SubsystemReset;

const MAX_COUNT: u64 = 1 << 16;
const MIN_TICKS: u64 = 2;

/// LPTIM16 errors
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// The capture source and prescaler only exist on channel 1.
    Channel1Only,
    /// The period is shorter than two prescaled ticks, or longer than the
    /// largest prescaler and auto-reload can count.
    OutOfRange,
    /// The counter does not run from a kernel clock in this configuration.
    NoKernelClock,
}

/// Counter operation mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Mode {
    /// Counts prescaled kernel clocks, or ETR edges with [`CounterInput::Etr`]
    Normal = 0,
    /// Starts counting on an ETR edge
    ExternalTrigger = 1,
    /// Counts ETR edges asynchronously, no kernel clock
    ExternalPulse = 2,
    /// ETR edges restart the counter
    Timeout = 3,
}

/// Prescaler input.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CounterInput {
    /// Kernel clock
    Kernel = 0,
    /// ETR pin
    Etr = 1,
}

/// Counter prescaler.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[allow(missing_docs)]
pub enum Prescaler {
    Div1 = 0,
    Div2 = 1,
    Div4 = 2,
    Div8 = 3,
    Div16 = 4,
    Div32 = 5,
    Div64 = 6,
    Div128 = 7,
}

impl Prescaler {
    const ALL: [Prescaler; 8] = [
        Prescaler::Div1,
        Prescaler::Div2,
        Prescaler::Div4,
        Prescaler::Div8,
        Prescaler::Div16,
        Prescaler::Div32,
        Prescaler::Div64,
        Prescaler::Div128,
    ];

    /// Division factor.
    pub const fn divisor(self) -> u32 {
        1 << self as u32
    }
}

/// ETR edge the counter counts on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[allow(missing_docs)]
pub enum CountEdge {
    Rising = 0,
    Falling = 1,
}

/// ETR edge that triggers or restarts the counter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[allow(missing_docs)]
pub enum TriggerEdge {
    Rising = 0,
    Falling = 1,
    Both = 2,
}

/// Quadrature encoder mode, [`Mode::Normal`] only.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EncoderMode {
    /// Encoder off
    Disabled = 0,
    /// Counts on TI1 edges, TI2 gives the direction
    Ti1 = 1,
    /// Counts on TI2 edges, TI1 gives the direction
    Ti2 = 2,
    /// Counts on edges of both inputs
    Both = 3,
}

/// Trigger output source.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TriggerOutput {
    /// Counter enable
    Enable = 1,
    /// Update event
    Update = 2,
    /// Channel 1 compare pulse
    Oc1Ref = 3,
    /// Channel 1 capture
    Ic1 = 4,
    /// Channel 2 capture
    Ic2 = 5,
}

/// Timer configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[non_exhaustive]
pub struct LpTimerConfig {
    /// Kernel clock, unused in [`Mode::ExternalPulse`]
    pub source: TimerClockSource,
    /// Prescaler input
    pub input: CounterInput,
    /// Prescaler
    pub prescaler: Prescaler,
    /// Auto-reload value
    pub auto_reload: u16,
    /// Operation mode
    pub mode: Mode,
    /// Encoder mode
    pub encoder: EncoderMode,
    /// Stop after one period
    pub one_pulse: bool,
    /// ETR count edge, for pulse counting
    pub count_edge: CountEdge,
    /// ETR trigger edge, for trigger and timeout modes
    pub trigger_edge: TriggerEdge,
}

impl LpTimerConfig {
    /// Continuous normal mode, undivided `source`, auto-reload 0.
    pub const fn new(source: TimerClockSource) -> Self {
        Self {
            source,
            input: CounterInput::Kernel,
            prescaler: Prescaler::Div1,
            auto_reload: 0,
            mode: Mode::Normal,
            encoder: EncoderMode::Disabled,
            one_pulse: false,
            count_edge: CountEdge::Rising,
            trigger_edge: TriggerEdge::Rising,
        }
    }

    /// Sets the prescaler input.
    pub const fn input(mut self, input: CounterInput) -> Self {
        self.input = input;
        self
    }

    /// Sets the prescaler.
    pub const fn prescaler(mut self, prescaler: Prescaler) -> Self {
        self.prescaler = prescaler;
        self
    }

    /// Sets the auto-reload value.
    pub const fn auto_reload(mut self, arr: u16) -> Self {
        self.auto_reload = arr;
        self
    }

    /// Sets the operation mode.
    pub const fn mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    /// Sets the encoder mode.
    pub const fn encoder(mut self, encoder: EncoderMode) -> Self {
        self.encoder = encoder;
        self
    }

    /// Stops the counter after one period.
    pub const fn one_pulse(mut self, on: bool) -> Self {
        self.one_pulse = on;
        self
    }

    /// Sets the ETR count edge.
    pub const fn count_edge(mut self, edge: CountEdge) -> Self {
        self.count_edge = edge;
        self
    }

    /// Sets the ETR trigger edge.
    pub const fn trigger_edge(mut self, edge: TriggerEdge) -> Self {
        self.trigger_edge = edge;
        self
    }

    /// Whether the counter needs the kernel clock.
    fn uses_kernel(&self) -> bool {
        self.mode != Mode::ExternalPulse
    }
}

impl Default for LpTimerConfig {
    fn default() -> Self {
        Self::new(TimerClockSource::Apb)
    }
}

/// Capture/compare channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[allow(missing_docs)]
pub enum Channel {
    One = 0,
    Two = 1,
}

/// Input or output polarity.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[allow(missing_docs)]
pub enum Polarity {
    Normal = 0,
    Inverted = 1,
}

/// Edges that capture the counter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[allow(missing_docs)]
pub enum CaptureEdge {
    Rising = 0,
    Falling = 1,
    Both = 2,
}

/// Channel 1 capture source.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CaptureSource {
    /// Channel 1 pin
    Pin = 0,
    /// XTLF oscillator
    Xtlf = 1,
    /// RCLP oscillator
    Rclp = 2,
    /// RCLF oscillator
    Rclf = 3,
}

/// Input capture configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[non_exhaustive]
pub struct InputCaptureConfig {
    /// Edges
    pub edge: CaptureEdge,
    /// Input polarity
    pub polarity: Polarity,
    /// Digital input filter
    pub filter: bool,
    /// Capture source, channel 1 only
    pub source: CaptureSource,
    /// Capture every `divider` edges (1..=64), channel 1 only
    pub divider: u8,
}

impl InputCaptureConfig {
    /// Captures every `edge` on the channel pin, unfiltered.
    pub const fn new(edge: CaptureEdge) -> Self {
        Self {
            edge,
            polarity: Polarity::Normal,
            filter: false,
            source: CaptureSource::Pin,
            divider: 1,
        }
    }

    /// Sets the input polarity.
    pub const fn polarity(mut self, polarity: Polarity) -> Self {
        self.polarity = polarity;
        self
    }

    /// Enables the digital input filter.
    pub const fn filter(mut self, on: bool) -> Self {
        self.filter = on;
        self
    }

    /// Captures an internal oscillator instead of the pin.
    pub const fn source(mut self, source: CaptureSource) -> Self {
        self.source = source;
        self
    }

    /// Captures every `divider` edges.
    pub const fn divider(mut self, divider: u8) -> Self {
        self.divider = divider;
        self
    }
}

impl Default for InputCaptureConfig {
    fn default() -> Self {
        Self::new(CaptureEdge::Rising)
    }
}

/// Output compare configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[non_exhaustive]
pub struct OutputCompareConfig {
    /// Compare value
    pub compare: u16,
    /// Output polarity
    pub polarity: Polarity,
}

impl OutputCompareConfig {
    /// Normal polarity output toggling at `compare`.
    pub const fn new(compare: u16) -> Self {
        Self {
            compare,
            polarity: Polarity::Normal,
        }
    }

    /// Sets the output polarity.
    pub const fn polarity(mut self, polarity: Polarity) -> Self {
        self.polarity = polarity;
        self
    }
}

/// Interrupt sources.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Event {
    /// Capture or compare match
    CaptureCompare(Channel),
    /// Counter overflow
    Overflow,
    /// ETR trigger
    Trigger,
    /// A capture was overwritten before it was read
    Overrun(Channel),
}

impl Event {
    fn mask(self) -> u32 {
        match self {
            Event::CaptureCompare(ch) => isr::cc(ch as u8).mask(),
            Event::Overflow => isr::OV.mask(),
            Event::Trigger => isr::TRIG.mask(),
            Event::Overrun(ch) => isr::ovr(ch as u8).mask(),
        }
    }
}

/// Events taken by [`LpTimer::on_interrupt`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Events(u32);

impl Events {
    /// Did `event` fire.
    pub fn contains(&self, event: Event) -> bool {
        self.0 & event.mask() != 0
    }

    /// Nothing fired.
    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }
}

pub(crate) fn configure(rb: &RegisterBlock, config: &LpTimerConfig) {
    rb.arr.write(u32::from(config.auto_reload));
    rb.cfgr.modify(|r| {
        let r = cfgr::PSCSEL.set(r, config.input as u32);
        let r = cfgr::DIVSEL.set(r, config.prescaler as u32);
        let r = cfgr::TMODE.set(r, config.mode as u32);
        let encoder = match config.mode {
            Mode::Normal => config.encoder as u32,
            _ => 0,
        };
        let r = cfgr::QEMD.set(r, encoder);
        let r = cfgr::ONST.set(r, config.one_pulse as u32);
        match config.mode {
            Mode::Normal if config.input == CounterInput::Etr => {
                let r = cfgr::EDGESEL.set(r, config.count_edge as u32);
                cfgr::ETR_AFEN.set(r, 1)
            }
            Mode::ExternalPulse => {
                let r = cfgr::EDGESEL.set(r, config.count_edge as u32);
                cfgr::ETR_AFEN.set(r, 1)
            }
            Mode::ExternalTrigger | Mode::Timeout => {
                cfgr::TRIGCFG.set(r, config.trigger_edge as u32)
            }
            Mode::Normal => r,
        }
    });
}

pub(crate) fn configure_input_capture(
    rb: &RegisterBlock,
    channel: Channel,
    config: &InputCaptureConfig,
) -> Result<(), Error> {
    let n = channel as u8;
    let channel1_only = config.source != CaptureSource::Pin || config.divider > 1;
    if channel == Channel::Two && channel1_only {
        return Err(Error::Channel1Only);
    }
    rb.ccsr.modify(|r| {
        let r = match channel {
            Channel::One => {
                let psc = u32::from(config.divider.clamp(1, 64) - 1);
                let r = ccsr::CAP1PSC.set(r, psc);
                ccsr::CAP1SSEL.set(r, config.source as u32)
            }
            Channel::Two => r,
        };
        let r = ccsr::filt(n).set(r, config.filter as u32);
        let r = ccsr::ccp(n).set(r, config.polarity as u32);
        let r = ccsr::capcfg(n).set(r, config.edge as u32);
        ccsr::ccs(n).set(r, 1)
    });
    Ok(())
}

pub(crate) fn configure_output_compare(
    rb: &RegisterBlock,
    channel: Channel,
    config: &OutputCompareConfig,
) {
    let n = channel as u8;
    rb.ccsr.write_field(ccsr::ccp(n), config.polarity as u32);
    compare_register(rb, channel).write(u32::from(config.compare));
    rb.ccsr.write_field(ccsr::ccs(n), 2);
}

fn compare_register(rb: &RegisterBlock, channel: Channel) -> &pac::Reg {
    match channel {
        Channel::One => &rb.ccr1,
        Channel::Two => &rb.ccr2,
    }
}

/// Takes the enabled pending events, clearing their flags.
pub(crate) fn take_events(rb: &RegisterBlock) -> Events {
    let pending = rb.isr.read() & rb.ier.read();
    if pending != 0 {
        // write one to clear
        rb.isr.write(pending);
    }
    Events(pending)
}

/// Prescaler and auto-reload giving `period` from a `kernel` clock. The
/// smallest prescaler that fits wins, for the finest resolution.
pub(crate) fn period_to_registers(
    kernel: HertzU32,
    period: MicrosDurationU32,
) -> Result<(Prescaler, u16), Error> {
    let ticks = u64::from(kernel.to_Hz()) * u64::from(period.to_micros()) / 1_000_000;
    let prescaler = Prescaler::ALL
        .into_iter()
        .find(|p| ticks / u64::from(p.divisor()) <= MAX_COUNT)
        .ok_or(Error::OutOfRange)?;
    let counts = ticks / u64::from(prescaler.divisor());
    if counts < MIN_TICKS {
        return Err(Error::OutOfRange);
    }
    Ok((prescaler, (counts - 1) as u16))
}

/// LPTIM16 timer
pub struct LpTimer {
    device: pac::LPTIM16,
    kernel: Option<HertzU32>,
}

impl LpTimer {
    /// Brings the timer out of reset, enables its clocks and applies `config`.
    ///
    /// The counter stays stopped until [`LpTimer::enable`].
    pub fn new(
        device: pac::LPTIM16,
        config: &LpTimerConfig,
        clocks: &Clocks,
        rmu: &mut pac::RMU,
        cmu: &mut pac::CMU,
    ) -> Self {
        device.reset_bring_down(rmu);
        device.reset_bring_up(rmu);
        let kernel = if config.uses_kernel() {
            cmu::select_lptim16_source(cmu, config.source);
            device.enable_clock(cmu);
            Some(clocks.timer_kernel(config.source))
        } else {
            cmu::gate(cmu, (BusGroup::Group1, pclkcr1::LPTIM16), None, true);
            None
        };
        configure(&device, config);

        Self { device, kernel }
    }

    /// Stops the timer, masks its interrupts, gates its clocks and frees the
    /// register block.
    pub fn free(self, cmu: &mut pac::CMU) -> pac::LPTIM16 {
        self.device.cr.clear_bits(cr::EN.mask());
        self.device.ier.write(0);
        self.device.disable_clock(cmu);
        self.device
    }

    /// Kernel clock frequency, `None` when counting external pulses.
    pub fn kernel_freq(&self) -> Option<HertzU32> {
        self.kernel
    }

    /// Starts counting.
    pub fn enable(&mut self) {
        self.device.cr.set_bits(cr::EN.mask());
    }

    /// Stops counting.
    pub fn disable(&mut self) {
        self.device.cr.clear_bits(cr::EN.mask());
    }

    /// Is the counter running.
    pub fn is_enabled(&self) -> bool {
        self.device.cr.bit(cr::EN)
    }

    /// Current counter value.
    pub fn counter(&self) -> u16 {
        self.device.cnt.read() as u16
    }

    /// Sets the auto-reload value.
    pub fn set_auto_reload(&mut self, arr: u16) {
        self.device.arr.write(u32::from(arr));
    }

    /// Auto-reload value.
    pub fn auto_reload(&self) -> u16 {
        self.device.arr.read() as u16
    }

    /// Sets prescaler and auto-reload so that the counter overflows every
    /// `period`. The counter has to be stopped.
    pub fn set_period(&mut self, period: MicrosDurationU32) -> Result<(), Error> {
        let kernel = self.kernel.ok_or(Error::NoKernelClock)?;
        let (prescaler, arr) = period_to_registers(kernel, period)?;
        self.device.cfgr.write_field(cfgr::DIVSEL, prescaler as u32);
        self.set_auto_reload(arr);
        Ok(())
    }

    /// Counter tick rate, after the prescaler.
    pub fn tick_freq(&self) -> Option<HertzU32> {
        let divisor = 1u32 << self.device.cfgr.read_field(cfgr::DIVSEL);
        self.kernel.map(|k| (k.to_Hz() / divisor).Hz())
    }

    /// Selects the trigger output, `None` disables it.
    pub fn set_trigger_output(&mut self, output: Option<TriggerOutput>) {
        self.device
            .cfgr
            .write_field(cfgr::MMS, output.map_or(0, |o| o as u32));
    }

    /// Turns `channel` into an input capture.
    pub fn configure_input_capture(
        &mut self,
        channel: Channel,
        config: &InputCaptureConfig,
    ) -> Result<(), Error> {
        configure_input_capture(&self.device, channel, config)
    }

    /// Turns `channel` into an output compare.
    pub fn configure_output_compare(&mut self, channel: Channel, config: &OutputCompareConfig) {
        configure_output_compare(&self.device, channel, config)
    }

    /// Disables `channel`.
    pub fn disable_channel(&mut self, channel: Channel) {
        self.device.ccsr.write_field(ccsr::ccs(channel as u8), 0);
    }

    /// Sets the compare value of an output channel.
    pub fn set_compare(&mut self, channel: Channel, value: u16) {
        compare_register(&self.device, channel).write(u32::from(value));
    }

    /// Last captured counter value of an input channel.
    pub fn capture(&self, channel: Channel) -> u16 {
        compare_register(&self.device, channel).read() as u16
    }

    /// Whether the last capture on `channel` was a falling edge.
    pub fn captured_falling(&self, channel: Channel) -> bool {
        self.device.ccsr.bit(ccsr::capedge(channel as u8))
    }

    /// Enables an interrupt.
    pub fn enable_interrupt(&mut self, event: Event) {
        self.device.ier.set_bits(event.mask());
    }

    /// Disables an interrupt.
    pub fn disable_interrupt(&mut self, event: Event) {
        self.device.ier.clear_bits(event.mask());
    }

    /// Flag of `event`, whether its interrupt is enabled or not.
    pub fn is_pending(&self, event: Event) -> bool {
        self.device.isr.is_set(event.mask())
    }

    /// Clears the flag of `event`.
    pub fn clear(&mut self, event: Event) {
        self.device.isr.write(event.mask());
    }

    /// Interrupt handler helper: returns and clears the enabled events that
    /// fired.
    pub fn on_interrupt(&mut self) -> Events {
        take_events(&self.device)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block() -> RegisterBlock {
        unsafe { core::mem::zeroed() }
    }

    #[test]
    fn normal_mode_counts_the_kernel_clock() {
        let rb = block();
        let config = LpTimerConfig::new(TimerClockSource::Lsclk)
            .prescaler(Prescaler::Div8)
            .auto_reload(4095)
            .encoder(EncoderMode::Both)
            .one_pulse(true);
        configure(&rb, &config);

        assert_eq!(rb.arr.read(), 4095);
        let r = rb.cfgr.read();
        assert_eq!(cfgr::TMODE.get(r), 0);
        assert_eq!(cfgr::DIVSEL.get(r), 3);
        assert_eq!(cfgr::QEMD.get(r), 3);
        assert_eq!(cfgr::ONST.get(r), 1);
        assert_eq!(cfgr::PSCSEL.get(r), 0);
        assert_eq!(cfgr::ETR_AFEN.get(r), 0);
    }

    #[test]
    fn etr_input_enables_the_filter() {
        let rb = block();
        let config = LpTimerConfig::default()
            .input(CounterInput::Etr)
            .count_edge(CountEdge::Falling);
        configure(&rb, &config);

        let r = rb.cfgr.read();
        assert_eq!(cfgr::PSCSEL.get(r), 1);
        assert_eq!(cfgr::EDGESEL.get(r), 1);
        assert_eq!(cfgr::ETR_AFEN.get(r), 1);
    }

    #[test]
    fn encoder_is_ignored_outside_normal_mode() {
        let rb = block();
        let config = LpTimerConfig::default()
            .mode(Mode::Timeout)
            .encoder(EncoderMode::Ti1)
            .trigger_edge(TriggerEdge::Both);
        configure(&rb, &config);

        let r = rb.cfgr.read();
        assert_eq!(cfgr::TMODE.get(r), 3);
        assert_eq!(cfgr::QEMD.get(r), 0);
        assert_eq!(cfgr::TRIGCFG.get(r), 2);
        assert_eq!(cfgr::ETR_AFEN.get(r), 0);
    }

    #[test]
    fn pulse_counting_runs_without_kernel() {
        let rb = block();
        let config = LpTimerConfig::default().mode(Mode::ExternalPulse);
        assert!(!config.uses_kernel());
        configure(&rb, &config);

        let r = rb.cfgr.read();
        assert_eq!(cfgr::TMODE.get(r), 2);
        assert_eq!(cfgr::ETR_AFEN.get(r), 1);
    }

    #[test]
    fn channel1_capture_of_an_oscillator() {
        let rb = block();
        let config = InputCaptureConfig::new(CaptureEdge::Both)
            .source(CaptureSource::Rclp)
            .divider(8)
            .filter(true)
            .polarity(Polarity::Inverted);
        configure_input_capture(&rb, Channel::One, &config).unwrap();

        let r = rb.ccsr.read();
        assert_eq!(ccsr::ccs(0).get(r), 1);
        assert_eq!(ccsr::capcfg(0).get(r), 2);
        assert_eq!(ccsr::filt(0).get(r), 1);
        assert_eq!(ccsr::ccp(0).get(r), 1);
        assert_eq!(ccsr::CAP1SSEL.get(r), 2);
        assert_eq!(ccsr::CAP1PSC.get(r), 7);
        assert_eq!(ccsr::ccs(1).get(r), 0);
    }

    #[test]
    fn channel2_capture_has_no_prescaler() {
        let rb = block();
        let divided = InputCaptureConfig::new(CaptureEdge::Falling).divider(4);
        assert_eq!(
            configure_input_capture(&rb, Channel::Two, &divided),
            Err(Error::Channel1Only)
        );
        assert_eq!(rb.ccsr.read(), 0);

        let plain = InputCaptureConfig::new(CaptureEdge::Falling);
        configure_input_capture(&rb, Channel::Two, &plain).unwrap();
        let r = rb.ccsr.read();
        assert_eq!(ccsr::ccs(1).get(r), 1);
        assert_eq!(ccsr::capcfg(1).get(r), 1);
        assert_eq!(ccsr::ccs(0).get(r), 0);
    }

    #[test]
    fn output_compare_on_channel2() {
        let rb = block();
        let config = OutputCompareConfig::new(1000).polarity(Polarity::Inverted);
        configure_output_compare(&rb, Channel::Two, &config);

        assert_eq!(rb.ccr2.read(), 1000);
        assert_eq!(rb.ccr1.read(), 0);
        let r = rb.ccsr.read();
        assert_eq!(ccsr::ccs(1).get(r), 2);
        assert_eq!(ccsr::ccp(1).get(r), 1);
    }

    #[test]
    fn only_enabled_events_are_taken() {
        let rb = block();
        rb.ier.write(Event::Overflow.mask() | Event::CaptureCompare(Channel::Two).mask());
        rb.isr.write(Event::Overflow.mask() | Event::Trigger.mask());

        let events = take_events(&rb);
        assert!(events.contains(Event::Overflow));
        assert!(!events.contains(Event::Trigger));
        assert!(!events.contains(Event::CaptureCompare(Channel::Two)));
        // the clear write lands in RAM
        assert_eq!(rb.isr.read(), Event::Overflow.mask());

        rb.isr.write(Event::Trigger.mask());
        assert!(take_events(&rb).is_empty());
    }

    #[test]
    fn event_bits() {
        assert_eq!(Event::CaptureCompare(Channel::One).mask(), 1 << 0);
        assert_eq!(Event::CaptureCompare(Channel::Two).mask(), 1 << 1);
        assert_eq!(Event::Overflow.mask(), 1 << 6);
        assert_eq!(Event::Trigger.mask(), 1 << 7);
        assert_eq!(Event::Overrun(Channel::Two).mask(), 1 << 9);
    }

    #[test]
    fn period_picks_the_smallest_prescaler() {
        // 32768 Hz, 1 s: 32768 ticks fit undivided
        assert_eq!(
            period_to_registers(32_768.Hz(), MicrosDurationU32::secs(1)),
            Ok((Prescaler::Div1, 32767))
        );
        // 8 MHz, 50 ms: 400000 ticks need a divide by 8
        assert_eq!(
            period_to_registers(8.MHz(), MicrosDurationU32::millis(50)),
            Ok((Prescaler::Div8, 49999))
        );
    }

    #[test]
    fn period_out_of_range() {
        assert_eq!(
            period_to_registers(1.MHz(), MicrosDurationU32::micros(1)),
            Err(Error::OutOfRange)
        );
        // 8 MHz, 2 s is 16M ticks, more than 128 * 65536
        assert_eq!(
            period_to_registers(8.MHz(), MicrosDurationU32::secs(2)),
            Err(Error::OutOfRange)
        );
    }
}
