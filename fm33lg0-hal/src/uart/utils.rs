use crate::cmu::BusClock;
use crate::gpio::{Alternate, Pin};
use crate::pac::{self, uart::RegisterBlock, UART0, UART1, UART3, UART4, UART5};
use crate::rmu::SubsystemReset;
use crate::typelevel::Sealed;
use core::ops::Deref;

#[doc(inline)]
pub use fm33_hal_common::uart::{DataBits, Parity, StopBits, UartConfig};

/// Error type for UART operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// Bad argument : when things overflow, ...
    BadArgument,
    /// The clock source does not exist on this UART, or is not running.
    UnsupportedClockSource,
}

/// State of the UART Peripheral.
pub trait State: Sealed {}

/// Trait to handle the underlying devices (UART0, UART1, UART3, UART4, UART5)
pub trait UartDevice:
    Deref<Target = RegisterBlock> + SubsystemReset + BusClock + Sealed + 'static
{
    /// Index of the Uart.
    const ID: usize;

    /// Interrupt line of the Uart.
    const IRQ: pac::Interrupt;

    /// The Uart has its own operation clock with a selectable source.
    /// Without one it runs from the APB clock.
    const OPERATION_CLOCK: bool;
}

macro_rules! uart_device {
    ($($UART:ident: $id:expr, $op:expr;)+) => {
        $(
            impl UartDevice for $UART {
                const ID: usize = $id;
                const IRQ: pac::Interrupt = pac::Interrupt::$UART;
                const OPERATION_CLOCK: bool = $op;
            }
            impl Sealed for $UART {}
        )+
    };
}

uart_device! {
    UART0: 0, true;
    UART1: 1, true;
    UART3: 3, false;
    UART4: 4, false;
    UART5: 5, false;
}

/// UART is enabled.
pub struct Enabled;

/// UART is disabled.
pub struct Disabled;

impl State for Enabled {}
impl Sealed for Enabled {}
impl State for Disabled {}
impl Sealed for Disabled {}

/// Pins routed to a UART.
///
/// The pin mux of the package is not checked: any pin in an alternate
/// function mode is accepted. `()` is used when the pins are configured by
/// other means.
pub trait ValidUartPinout<UART: UartDevice> {
    /// A transmit pin is present.
    const TX: bool;
    /// A receive pin is present.
    const RX: bool;
}

impl<UART, const PT: char, const NT: u8, FT, const PR: char, const NR: u8, FR>
    ValidUartPinout<UART> for (Pin<PT, NT, Alternate<FT>>, Pin<PR, NR, Alternate<FR>>)
where
    UART: UartDevice,
{
    const TX: bool = true;
    const RX: bool = true;
}

impl<UART: UartDevice> ValidUartPinout<UART> for () {
    const TX: bool = true;
    const RX: bool = true;
}
