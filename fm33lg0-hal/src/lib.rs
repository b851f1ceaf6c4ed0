//! HAL for the FM33LG0xx microcontrollers
//!
//! This is an implementation of the [`embedded-hal`] traits for the Fudan
//! FM33LG0xx family (Cortex-M0+).
//!
//! [`embedded-hal`]: https://github.com/rust-embedded/embedded-hal
//!
//! The register layer lives in [`pac`]. Drivers take ownership of the
//! peripheral singletons found in [`pac::Peripherals`], bring the peripheral
//! out of reset through [`rmu`] and enable its clocks through [`cmu`].
//!
//! Interrupt handlers stay in the application: every driver that reacts to
//! an interrupt exposes an `on_interrupt` style method to be called from the
//! handler the user registers with the `rt` feature.
//!
//! # Crate features
//!
//! * **rt** -
//!   Minimal startup / runtime for Cortex-M microcontrollers, provides the
//!   device interrupt vector table
//! * **critical-section-impl** -
//!   critical section that is safe for single core use
//! * **defmt** -
//!   Implement `defmt::Format` for several types and log driver events

#![warn(missing_docs)]
#![no_std]

pub use paste;

pub mod pac;

pub mod adc;
pub mod can;
pub mod cmu;
pub mod comp;
pub mod dac;
pub mod dma;
pub mod flash;
pub mod gpio;
pub mod lptim16;
pub mod opa;
pub mod prelude;
pub mod rmu;
pub mod timer;
pub(crate) mod typelevel;
pub mod uart;
pub mod vao;
pub mod vrefp;

pub use cmu::Clocks;
pub use fm33_hal_common::{ring, soft_dma};

/// Frequency and duration types
pub mod fugit {
    pub use fugit::*;
}
