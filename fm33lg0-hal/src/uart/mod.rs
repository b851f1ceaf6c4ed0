//! Universal Asynchronous Receiver Transmitter (UART)
//!
//! UART0, UART1, UART3, UART4 and UART5 share one register layout. UART0 and
//! UART1 have an operation clock with a selectable source, the others always
//! run from the APB clock.
//!
//! ## Usage
//!
//! ```ignore
//! use fm33lg0_hal::{
//!     cmu::{ClocksConfig, UartClockSource},
//!     gpio::{GpioExt, Primary},
//!     pac,
//!     uart::{DataBits, StopBits, UartConfig, UartPeripheral},
//! };
//! use fugit::RateExtU32;
//!
//! let mut p = pac::Peripherals::take().unwrap();
//! let clocks = ClocksConfig::default().freeze(&mut p.CMU).unwrap();
//! let gpioa = p.GPIOA.split(&mut p.CMU);
//! let pins = (
//!     gpioa.pa13.into_alternate::<Primary>(),
//!     gpioa.pa14.into_alternate::<Primary>(),
//! );
//! let uart = UartPeripheral::new(p.UART0, pins, &mut p.RMU, &mut p.CMU)
//!     .enable(
//!         UartConfig::new(9600.Hz(), DataBits::Eight, None, StopBits::One),
//!         UartClockSource::Apb,
//!         &clocks,
//!         &mut p.CMU,
//!     )
//!     .unwrap();
//!
//! uart.write_full_blocking(b"Hello World!\r\n");
//! ```
//!
//! Ring buffered reception through the soft DMA engine lives in [`rx`].

mod peripheral;
mod reader;
pub mod rx;
mod utils;
mod writer;

pub use peripheral::UartPeripheral;
pub use reader::{ReadError, ReadErrorType, Reader};
pub use utils::*;
pub use writer::{TxTransfer, Writer};

/// Common configurations for UART.
pub use fm33_hal_common::uart::common_configs;
