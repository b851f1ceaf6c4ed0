//! Module supporting type-level programming
//!
//! Only the sealing pattern is needed here: traits such as
//! [`UartDevice`](crate::uart::UartDevice) or
//! [`PinMode`](crate::gpio::PinMode) are implemented for a closed set of
//! types and must not be implemented outside of this crate.

mod private {
    /// Super trait used to mark traits with an exhaustive set of
    /// implementations
    pub trait Sealed {}
}

pub(crate) use private::Sealed;
