//! Prelude
pub use crate::cmu::BusClock as _fm33lg0_hal_cmu_BusClock;
pub use crate::comp::CompExt as _fm33lg0_hal_comp_CompExt;
pub use crate::dma::DMAExt as _fm33lg0_hal_dma_DMAExt;
pub use crate::gpio::GpioExt as _fm33lg0_hal_gpio_GpioExt;
pub use crate::rmu::SubsystemReset as _fm33lg0_hal_rmu_SubsystemReset;
pub use crate::vao::VaoExt as _fm33lg0_hal_vao_VaoExt;
pub use embedded_hal_0_2::prelude::*;
