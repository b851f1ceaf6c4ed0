//! Common HAL code
//!
//! This library contains types and functions which are shared between the
//! FM33 family HALs: the byte ring used by receive paths, the soft-DMA engine
//! that drives it, and UART configuration types.
//!
//! You shouldn't include anything here which requires either the `cortex-m`
//! crate, or register access.

#![no_std]
#![warn(missing_docs)]

pub mod ring;
pub mod soft_dma;
pub mod uart;
