//! General Purpose Input and Output (GPIO)
//!
//! To get access to the pins, split the port with [`GpioExt::split`]. This
//! also turns on the PAD bus clock that all ports share.
//!
//! ```ignore
//! let mut p = pac::Peripherals::take().unwrap();
//! let gpioa = p.GPIOA.split(&mut p.CMU);
//! let mut led = gpioa.pa8.into_push_pull_output();
//! led.set_high();
//! ```
//!
//! Every pin is a [`Pin`] whose mode is tracked in its type:
//!
//! - [`Disabled`]: reset state, input buffer off
//! - [`Input`] with [`Floating`] or [`PullUp`]
//! - [`Output`] with [`PushPull`] or [`OpenDrain`]
//! - [`Analog`]: digital path fully off, analog switch on
//! - [`Alternate`] with [`Primary`] or [`Remapped`] digital function
//!
//! Input pins can drive one of the 20 external interrupt lines. Each group
//! of four pins of a port shares a line: `line = port * 4 + pin / 4`.
use core::convert::Infallible;
use core::marker::PhantomData;

use crate::pac;
use crate::pac::gpio::{fcr, RegisterBlock};
use crate::pac::{cmu, exti, Reg};
use crate::typelevel::Sealed;

/// Extension trait to split a GPIO peripheral in independent pins
pub trait GpioExt {
    /// The type to split the GPIO into
    type Parts;

    /// Enable the PAD clock and split the port into independent pins
    fn split(self, cmu: &mut pac::CMU) -> Self::Parts;
}

/// Reset state, input buffer disabled (type state)
#[derive(Default)]
pub struct Disabled;

/// Input mode (type state)
#[derive(Default)]
pub struct Input<PULL = Floating> {
    _pull: PhantomData<PULL>,
}

/// Floating input (type state)
#[derive(Default)]
pub struct Floating;

/// Pulled up input (type state)
#[derive(Default)]
pub struct PullUp;

/// Output mode (type state)
#[derive(Default)]
pub struct Output<OTYPE = PushPull> {
    _otype: PhantomData<OTYPE>,
}

/// Push pull output (type state)
#[derive(Default)]
pub struct PushPull;

/// Open drain output (type state)
#[derive(Default)]
pub struct OpenDrain;

/// Analog mode (type state)
#[derive(Default)]
pub struct Analog;

/// Digital function mode (type state)
#[derive(Default)]
pub struct Alternate<F = Primary> {
    _function: PhantomData<F>,
}

/// Default digital function of the pin
#[derive(Default)]
pub struct Primary;

/// Remapped digital function of the pin (`DFS` bit set)
#[derive(Default)]
pub struct Remapped;

/// Register settings of a pin mode.
#[doc(hidden)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ModeConfig {
    function: u32,
    input: bool,
    pull_up: bool,
    open_drain: bool,
    analog: bool,
    remap: bool,
}

impl ModeConfig {
    const fn digital(function: u32) -> Self {
        ModeConfig {
            function,
            input: false,
            pull_up: false,
            open_drain: false,
            analog: false,
            remap: false,
        }
    }
}

/// A pin mode
pub trait PinMode: Sealed {
    #[doc(hidden)]
    const CONFIG: ModeConfig;
}

impl Sealed for Disabled {}
impl PinMode for Disabled {
    const CONFIG: ModeConfig = ModeConfig::digital(fcr::INPUT);
}

impl Sealed for Input<Floating> {}
impl PinMode for Input<Floating> {
    const CONFIG: ModeConfig = ModeConfig {
        input: true,
        ..ModeConfig::digital(fcr::INPUT)
    };
}

impl Sealed for Input<PullUp> {}
impl PinMode for Input<PullUp> {
    const CONFIG: ModeConfig = ModeConfig {
        input: true,
        pull_up: true,
        ..ModeConfig::digital(fcr::INPUT)
    };
}

impl Sealed for Output<PushPull> {}
impl PinMode for Output<PushPull> {
    const CONFIG: ModeConfig = ModeConfig::digital(fcr::OUTPUT);
}

impl Sealed for Output<OpenDrain> {}
impl PinMode for Output<OpenDrain> {
    // input stays on so the line level can be read back
    const CONFIG: ModeConfig = ModeConfig {
        input: true,
        open_drain: true,
        ..ModeConfig::digital(fcr::OUTPUT)
    };
}

impl Sealed for Analog {}
impl PinMode for Analog {
    const CONFIG: ModeConfig = ModeConfig {
        analog: true,
        ..ModeConfig::digital(fcr::ANALOG)
    };
}

impl Sealed for Alternate<Primary> {}
impl PinMode for Alternate<Primary> {
    const CONFIG: ModeConfig = ModeConfig {
        pull_up: true,
        ..ModeConfig::digital(fcr::DIGITAL)
    };
}

impl Sealed for Alternate<Remapped> {}
impl PinMode for Alternate<Remapped> {
    const CONFIG: ModeConfig = ModeConfig {
        pull_up: true,
        remap: true,
        ..ModeConfig::digital(fcr::DIGITAL)
    };
}

/// Digital output pin state
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PinState {
    /// Low
    Low,
    /// High
    High,
}

/// External interrupt trigger
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Edge {
    /// Rising edge
    Rising,
    /// Falling edge
    Falling,
    /// Both edges
    RisingFalling,
}

impl Edge {
    const fn bits(self) -> u32 {
        match self {
            Edge::Rising => exti::eds::RISING,
            Edge::Falling => exti::eds::FALLING,
            Edge::RisingFalling => exti::eds::BOTH,
        }
    }
}

/// Generic pin type
///
/// - `P` is the port name: `'A'` for GPIOA, `'B'` for GPIOB, etc.
/// - `N` is the pin number: from `0` to `15`.
/// - `MODE` is one of the pin modes (see the module documentation).
pub struct Pin<const P: char, const N: u8, MODE = Disabled> {
    _mode: PhantomData<MODE>,
}

fn port(p: char) -> &'static RegisterBlock {
    let ptr = match p {
        'A' => pac::GPIOA::PTR,
        'B' => pac::GPIOB::PTR,
        'C' => pac::GPIOC::PTR,
        'D' => pac::GPIOD::PTR,
        _ => pac::GPIOE::PTR,
    };
    // Safety: fixed, always mapped peripheral address
    unsafe { &*ptr }
}

fn write_pin_bit(reg: &Reg, n: u8, on: bool) {
    if on {
        reg.set_bits(1 << n);
    } else {
        reg.clear_bits(1 << n);
    }
}

fn configure(rb: &RegisterBlock, n: u8, config: ModeConfig) {
    write_pin_bit(&rb.anen, n, config.analog);
    write_pin_bit(&rb.inen, n, config.input);
    write_pin_bit(&rb.oden, n, config.open_drain);
    write_pin_bit(&rb.puen, n, config.pull_up);
    if config.function == fcr::DIGITAL {
        write_pin_bit(&rb.dfs, n, config.remap);
    }
    rb.fcr.write_field(fcr::pin(n), config.function);
}

impl<const P: char, const N: u8, MODE> Pin<P, N, MODE> {
    pub(crate) const fn new() -> Self {
        Pin { _mode: PhantomData }
    }

    /// Pin number
    #[inline(always)]
    pub const fn pin_id(&self) -> u8 {
        N
    }

    /// Port number, 0 for port A
    #[inline(always)]
    pub const fn port_id(&self) -> u8 {
        P as u8 - b'A'
    }

    /// Reconfigure the pin.
    pub fn into_mode<M: PinMode>(self) -> Pin<P, N, M> {
        configure(port(P), N, M::CONFIG);
        Pin::new()
    }

    /// Configure the pin to operate as a floating input
    pub fn into_floating_input(self) -> Pin<P, N, Input<Floating>> {
        self.into_mode()
    }

    /// Configure the pin to operate as a pulled up input
    pub fn into_pull_up_input(self) -> Pin<P, N, Input<PullUp>> {
        self.into_mode()
    }

    /// Configure the pin to operate as a push pull output, initially low
    pub fn into_push_pull_output(self) -> Pin<P, N, Output<PushPull>> {
        self.into_push_pull_output_in_state(PinState::Low)
    }

    /// Configure the pin to operate as a push pull output with a given
    /// initial state
    pub fn into_push_pull_output_in_state(
        mut self,
        initial_state: PinState,
    ) -> Pin<P, N, Output<PushPull>> {
        self._set_state(initial_state);
        self.into_mode()
    }

    /// Configure the pin to operate as an open drain output, initially released
    pub fn into_open_drain_output(mut self) -> Pin<P, N, Output<OpenDrain>> {
        self._set_state(PinState::High);
        self.into_mode()
    }

    /// Configure the pin as an analog input or output
    pub fn into_analog(self) -> Pin<P, N, Analog> {
        self.into_mode()
    }

    /// Hand the pin to a peripheral
    pub fn into_alternate<F>(self) -> Pin<P, N, Alternate<F>>
    where
        Alternate<F>: PinMode,
    {
        self.into_mode()
    }

    #[inline(always)]
    fn _set_state(&mut self, state: PinState) {
        match state {
            PinState::High => self._set_high(),
            PinState::Low => self._set_low(),
        }
    }

    #[inline(always)]
    fn _set_high(&mut self) {
        // atomic write to a stateless register
        port(P).dset.write(1 << N)
    }

    #[inline(always)]
    fn _set_low(&mut self) {
        port(P).drst.write(1 << N)
    }

    #[inline(always)]
    fn _is_set_low(&self) -> bool {
        port(P).dor.read() & (1 << N) == 0
    }

    #[inline(always)]
    fn _is_low(&self) -> bool {
        port(P).din.read() & (1 << N) == 0
    }
}

impl<const P: char, const N: u8, OTYPE> Pin<P, N, Output<OTYPE>> {
    /// Drive the pin high
    #[inline]
    pub fn set_high(&mut self) {
        self._set_high()
    }

    /// Drive the pin low
    #[inline]
    pub fn set_low(&mut self) {
        self._set_low()
    }

    /// Current output state
    #[inline]
    pub fn get_state(&self) -> PinState {
        if self._is_set_low() {
            PinState::Low
        } else {
            PinState::High
        }
    }

    /// Set the output state
    #[inline]
    pub fn set_state(&mut self, state: PinState) {
        self._set_state(state)
    }

    /// Is the output set high
    #[inline]
    pub fn is_set_high(&self) -> bool {
        !self._is_set_low()
    }

    /// Is the output set low
    #[inline]
    pub fn is_set_low(&self) -> bool {
        self._is_set_low()
    }

    /// Invert the output
    #[inline]
    pub fn toggle(&mut self) {
        if self._is_set_low() {
            self._set_high()
        } else {
            self._set_low()
        }
    }
}

impl<const P: char, const N: u8, PULL> Pin<P, N, Input<PULL>> {
    /// Is the input high
    #[inline]
    pub fn is_high(&self) -> bool {
        !self._is_low()
    }

    /// Is the input low
    #[inline]
    pub fn is_low(&self) -> bool {
        self._is_low()
    }

    /// External interrupt line driven by this pin.
    pub const fn exti_line(&self) -> u8 {
        exti_line(P, N)
    }

    /// Route the pin to its external interrupt line and trigger on `edge`.
    ///
    /// The line clock runs from LSCLK. The `GPIO` interrupt still has to be
    /// unmasked in the NVIC.
    pub fn listen(&mut self, exti: &mut pac::GPIO_COMMON, cmu: &mut pac::CMU, edge: Edge) {
        enable_exti_clock(cmu);
        exti_listen(exti, exti_line(P, N), N % 4, edge);
    }

    /// Stop triggering on this pin.
    pub fn unlisten(&mut self, exti: &mut pac::GPIO_COMMON) {
        exti_unlisten(exti, exti_line(P, N));
    }

    /// Has the line of this pin triggered.
    pub fn is_interrupt_pending(&self, exti: &pac::GPIO_COMMON) -> bool {
        exti_pending(exti, exti_line(P, N))
    }

    /// Clear the pending flag of the line of this pin.
    pub fn clear_interrupt_pending_bit(&mut self, exti: &mut pac::GPIO_COMMON) {
        exti_clear(exti, exti_line(P, N));
    }
}

impl<const P: char, const N: u8> Pin<P, N, Output<OpenDrain>> {
    /// Is the line high
    #[inline]
    pub fn is_high(&self) -> bool {
        !self._is_low()
    }

    /// Is the line low
    #[inline]
    pub fn is_low(&self) -> bool {
        self._is_low()
    }
}

const fn exti_line(port: char, pin: u8) -> u8 {
    (port as u8 - b'A') * 4 + pin / 4
}

fn enable_exti_clock(cmu: &pac::cmu::RegisterBlock) {
    // LSCLK
    cmu.opccr1.write_field(cmu::opccr1::EXTICKS, 1);
    cmu.opccr3.set_bits(cmu::opccr3::EXTI.mask());
}

fn exti_listen(rb: &exti::RegisterBlock, line: u8, select: u8, edge: Edge) {
    let (eds, eds_field) = rb.eds(line);
    eds.write_field(eds_field, exti::eds::DISABLE);
    let (sel, sel_field) = rb.sel(line);
    sel.write_field(sel_field, select as u32);
    rb.extidf.set_bits(1 << line);
    eds.write_field(eds_field, edge.bits());
    rb.extiisr.write(1 << line);
}

fn exti_unlisten(rb: &exti::RegisterBlock, line: u8) {
    let (eds, eds_field) = rb.eds(line);
    eds.write_field(eds_field, exti::eds::DISABLE);
    rb.extiisr.write(1 << line);
}

fn exti_pending(rb: &exti::RegisterBlock, line: u8) -> bool {
    rb.extiisr.read() & (1 << line) != 0
}

fn exti_clear(rb: &exti::RegisterBlock, line: u8) {
    // write 1 to clear
    rb.extiisr.write(1 << line);
}

impl<const P: char, const N: u8, MODE> embedded_hal::digital::ErrorType for Pin<P, N, MODE> {
    type Error = Infallible;
}

impl<const P: char, const N: u8, OTYPE> embedded_hal::digital::OutputPin
    for Pin<P, N, Output<OTYPE>>
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

impl<const P: char, const N: u8, OTYPE> embedded_hal::digital::StatefulOutputPin
    for Pin<P, N, Output<OTYPE>>
{
    fn is_set_high(&mut self) -> Result<bool, Self::Error> {
        Ok(!self._is_set_low())
    }

    fn is_set_low(&mut self) -> Result<bool, Self::Error> {
        Ok(self._is_set_low())
    }
}

impl<const P: char, const N: u8, PULL> embedded_hal::digital::InputPin
    for Pin<P, N, Input<PULL>>
{
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(!self._is_low())
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(self._is_low())
    }
}

impl<const P: char, const N: u8> embedded_hal::digital::InputPin
    for Pin<P, N, Output<OpenDrain>>
{
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(!self._is_low())
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(self._is_low())
    }
}

impl<const P: char, const N: u8, OTYPE> embedded_hal_0_2::digital::v2::OutputPin
    for Pin<P, N, Output<OTYPE>>
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

impl<const P: char, const N: u8, OTYPE> embedded_hal_0_2::digital::v2::StatefulOutputPin
    for Pin<P, N, Output<OTYPE>>
{
    fn is_set_high(&self) -> Result<bool, Self::Error> {
        Ok(!self._is_set_low())
    }

    fn is_set_low(&self) -> Result<bool, Self::Error> {
        Ok(self._is_set_low())
    }
}

impl<const P: char, const N: u8, OTYPE> embedded_hal_0_2::digital::v2::ToggleableOutputPin
    for Pin<P, N, Output<OTYPE>>
{
    type Error = Infallible;

    fn toggle(&mut self) -> Result<(), Self::Error> {
        self._set_state(if self._is_set_low() {
            PinState::High
        } else {
            PinState::Low
        });
        Ok(())
    }
}

impl<const P: char, const N: u8, PULL> embedded_hal_0_2::digital::v2::InputPin
    for Pin<P, N, Input<PULL>>
{
    type Error = Infallible;

    fn is_high(&self) -> Result<bool, Self::Error> {
        Ok(!self._is_low())
    }

    fn is_low(&self) -> Result<bool, Self::Error> {
        Ok(self._is_low())
    }
}

impl<const P: char, const N: u8> embedded_hal_0_2::digital::v2::InputPin
    for Pin<P, N, Output<OpenDrain>>
{
    type Error = Infallible;

    fn is_high(&self) -> Result<bool, Self::Error> {
        Ok(!self._is_low())
    }

    fn is_low(&self) -> Result<bool, Self::Error> {
        Ok(self._is_low())
    }
}

macro_rules! gpio {
    ($GPIOX:ident, $gpiox:ident, $port:literal, $x:ident, [$($i:literal),+]) => {
        paste::paste! {
            /// GPIO
            pub mod $gpiox {
                use super::{Disabled, GpioExt, Pin};
                use crate::cmu::BusClock;
                use crate::pac;

                /// GPIO parts
                pub struct Parts {
                    $(
                        /// Pin
                        pub [<p $x $i>]: [<P $x:upper $i>],
                    )+
                }

                $(
                    /// Pin
                    pub type [<P $x:upper $i>]<MODE = Disabled> = Pin<$port, $i, MODE>;
                )+

                impl GpioExt for pac::$GPIOX {
                    type Parts = Parts;

                    fn split(self, cmu: &mut pac::CMU) -> Parts {
                        self.enable_clock(cmu);
                        Parts {
                            $(
                                [<p $x $i>]: Pin::new(),
                            )+
                        }
                    }
                }
            }

            pub use $gpiox::{$([<P $x:upper $i>],)+};
        }
    };
}

gpio!(GPIOA, gpioa, 'A', a, [0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15]);
gpio!(GPIOB, gpiob, 'B', b, [0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15]);
gpio!(GPIOC, gpioc, 'C', c, [0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15]);
gpio!(GPIOD, gpiod, 'D', d, [0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15]);
gpio!(GPIOE, gpioe, 'E', e, [0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15]);

#[cfg(test)]
mod tests {
    use super::*;

    fn block() -> RegisterBlock {
        unsafe { core::mem::zeroed() }
    }

    fn exti_block() -> exti::RegisterBlock {
        unsafe { core::mem::zeroed() }
    }

    #[test]
    fn pull_up_input() {
        let rb = block();
        configure(&rb, 5, <Input<PullUp>>::CONFIG);
        assert_eq!(rb.inen.read(), 1 << 5);
        assert_eq!(rb.puen.read(), 1 << 5);
        assert_eq!(rb.oden.read(), 0);
        assert_eq!(rb.fcr.read(), fcr::INPUT << 10);
    }

    #[test]
    fn analog_turns_digital_path_off() {
        let rb = block();
        rb.inen.write(0xFFFF);
        rb.puen.write(0xFFFF);
        rb.oden.write(0xFFFF);
        configure(&rb, 15, Analog::CONFIG);
        assert_eq!(rb.inen.read(), 0x7FFF);
        assert_eq!(rb.puen.read(), 0x7FFF);
        assert_eq!(rb.oden.read(), 0x7FFF);
        assert_eq!(rb.anen.read(), 1 << 15);
        assert_eq!(rb.fcr.read_field(fcr::pin(15)), fcr::ANALOG);
    }

    #[test]
    fn remapped_function_sets_dfs() {
        let rb = block();
        configure(&rb, 2, <Alternate<Remapped>>::CONFIG);
        assert_eq!(rb.dfs.read(), 1 << 2);
        assert_eq!(rb.fcr.read_field(fcr::pin(2)), fcr::DIGITAL);
        configure(&rb, 2, <Alternate<Primary>>::CONFIG);
        assert_eq!(rb.dfs.read(), 0);
    }

    #[test]
    fn open_drain_output_keeps_input() {
        let rb = block();
        configure(&rb, 0, <Output<OpenDrain>>::CONFIG);
        assert_eq!(rb.oden.read(), 1);
        assert_eq!(rb.inen.read(), 1);
        assert_eq!(rb.fcr.read(), fcr::OUTPUT);
    }

    #[test]
    fn exti_lines() {
        assert_eq!(exti_line('A', 0), 0);
        assert_eq!(exti_line('A', 15), 3);
        assert_eq!(exti_line('C', 8), 10);
        assert_eq!(exti_line('D', 12), 15);
        assert_eq!(exti_line('E', 9), 18);
    }

    #[test]
    fn listen_configures_line() {
        let rb = exti_block();
        exti_listen(&rb, 17, 1, Edge::Falling);
        assert_eq!(rb.extisel1.read(), 1 << 2);
        assert_eq!(rb.extieds1.read(), exti::eds::FALLING << 2);
        assert_eq!(rb.extidf.read(), 1 << 17);
        // stale flag cleared on entry
        assert_eq!(rb.extiisr.read(), 1 << 17);

        exti_unlisten(&rb, 17);
        assert_eq!(rb.extieds1.read(), exti::eds::DISABLE << 2);
    }
}
