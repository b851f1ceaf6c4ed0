//! Universal Asynchronous Receiver Transmitter (UART) configuration
//!
//! Device independent UART settings, shared by the FM33 HALs.

mod utils;

pub use self::utils::*;

/// Common configurations for UART.
pub mod common_configs;
