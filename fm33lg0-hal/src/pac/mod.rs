//! Peripheral access layer for the FM33LG0xx
//!
//! Register blocks, bit field constants, peripheral singletons and the
//! interrupt table. Register order inside each block follows the vendor
//! function library headers; base addresses follow the device memory map.
//!
//! ```ignore
//! let p = fm33lg0_hal::pac::Peripherals::take().unwrap();
//! p.CMU.pclkcr3.set_bits(pac::cmu::pclkcr3::UART0.mask());
//! ```

#![allow(non_snake_case, missing_docs)]

use core::fmt;
use core::marker::PhantomData;
use core::ops::Deref;
use core::sync::atomic::{AtomicBool, Ordering};

mod reg;

pub use reg::{Field, Reg};

pub mod adc;
pub mod bstim16;
pub mod can;
pub mod cmu;
pub mod comp;
pub mod dac;
pub mod dma;
pub mod exti;
pub mod flash;
pub mod gpio;
pub mod lptim16;
pub mod opa;
pub mod rmu;
pub mod uart;
pub mod vao;
pub mod vref;
pub mod vrefp;

/// Number of priority bits implemented by the NVIC.
pub const NVIC_PRIO_BITS: u8 = 2;

/// Device interrupts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u16)]
pub enum Interrupt {
    /// Window watchdog
    WWDT = 0,
    /// Supply voltage detector
    SVD = 1,
    /// Real time clocks
    RTC = 2,
    /// Flash controller
    FLASH = 3,
    /// XTLF fail detect
    LFDET = 4,
    /// Analog to digital converter
    ADC = 5,
    /// Independent watchdog
    IWDT = 6,
    /// SPI0
    SPI0 = 7,
    /// SPI1
    SPI1 = 8,
    /// SPI2
    SPI2 = 9,
    /// UART0
    UART0 = 10,
    /// UART1
    UART1 = 11,
    /// UART3
    UART3 = 12,
    /// UART4
    UART4 = 13,
    /// UART5
    UART5 = 14,
    /// ISO7816
    U7816 = 15,
    /// Low power UARTs
    LPUART = 16,
    /// I2C
    I2C = 17,
    /// CRC / PGL
    CCL = 18,
    /// AES
    AES = 19,
    /// Low power timers
    LPTIM = 20,
    /// DMA controller
    DMA = 21,
    /// Wakeup pins
    WKUP = 22,
    /// Operational amplifiers
    OPA = 23,
    /// Basic timers (BSTIM16 and BSTIM32)
    BSTIM = 24,
    /// Comparators
    COMP = 25,
    /// General purpose timers 0 and 1
    GPTIM01 = 26,
    /// General purpose timer 2
    GPTIM2 = 27,
    /// Advanced timer
    ATIM = 28,
    /// VREF and VREFP
    VREF = 29,
    /// GPIO external interrupts
    GPIO = 30,
    /// CAN controller
    CAN = 31,
}

pub use self::Interrupt as interrupt;

// Safety: the discriminants are valid IRQ numbers of this device.
unsafe impl cortex_m::interrupt::InterruptNumber for Interrupt {
    #[inline(always)]
    fn number(self) -> u16 {
        self as u16
    }
}

#[cfg(feature = "rt")]
pub use cortex_m_rt::interrupt;

#[cfg(feature = "rt")]
extern "C" {
    fn WWDT();
    fn SVD();
    fn RTC();
    fn FLASH();
    fn LFDET();
    fn ADC();
    fn IWDT();
    fn SPI0();
    fn SPI1();
    fn SPI2();
    fn UART0();
    fn UART1();
    fn UART3();
    fn UART4();
    fn UART5();
    fn U7816();
    fn LPUART();
    fn I2C();
    fn CCL();
    fn AES();
    fn LPTIM();
    fn DMA();
    fn WKUP();
    fn OPA();
    fn BSTIM();
    fn COMP();
    fn GPTIM01();
    fn GPTIM2();
    fn ATIM();
    fn VREF();
    fn GPIO();
    fn CAN();
}

#[doc(hidden)]
#[cfg(feature = "rt")]
pub union Vector {
    _handler: unsafe extern "C" fn(),
    _reserved: u32,
}

#[doc(hidden)]
#[cfg(feature = "rt")]
#[link_section = ".vector_table.interrupts"]
#[no_mangle]
pub static __INTERRUPTS: [Vector; 32] = [
    Vector { _handler: WWDT },
    Vector { _handler: SVD },
    Vector { _handler: RTC },
    Vector { _handler: FLASH },
    Vector { _handler: LFDET },
    Vector { _handler: ADC },
    Vector { _handler: IWDT },
    Vector { _handler: SPI0 },
    Vector { _handler: SPI1 },
    Vector { _handler: SPI2 },
    Vector { _handler: UART0 },
    Vector { _handler: UART1 },
    Vector { _handler: UART3 },
    Vector { _handler: UART4 },
    Vector { _handler: UART5 },
    Vector { _handler: U7816 },
    Vector { _handler: LPUART },
    Vector { _handler: I2C },
    Vector { _handler: CCL },
    Vector { _handler: AES },
    Vector { _handler: LPTIM },
    Vector { _handler: DMA },
    Vector { _handler: WKUP },
    Vector { _handler: OPA },
    Vector { _handler: BSTIM },
    Vector { _handler: COMP },
    Vector { _handler: GPTIM01 },
    Vector { _handler: GPTIM2 },
    Vector { _handler: ATIM },
    Vector { _handler: VREF },
    Vector { _handler: GPIO },
    Vector { _handler: CAN },
];

static TAKEN: AtomicBool = AtomicBool::new(false);

macro_rules! peripherals {
    ($($(#[$attr:meta])* $NAME:ident: $module:ident @ $addr:expr,)+) => {
        $(
            $(#[$attr])*
            pub struct $NAME {
                _marker: PhantomData<*const ()>,
            }

            // Safety: the singleton only hands out shared references to volatile cells.
            unsafe impl Send for $NAME {}

            impl $NAME {
                /// Pointer to the register block.
                pub const PTR: *const $module::RegisterBlock = $addr as *const _;

                /// Return the pointer to the register block.
                #[inline(always)]
                pub const fn ptr() -> *const $module::RegisterBlock {
                    Self::PTR
                }

                /// Unchecked singleton.
                ///
                /// # Safety
                ///
                /// Ensure that the new instance is not used concurrently with
                /// another owner of the same registers.
                #[inline(always)]
                pub unsafe fn steal() -> Self {
                    $NAME { _marker: PhantomData }
                }
            }

            impl Deref for $NAME {
                type Target = $module::RegisterBlock;

                #[inline(always)]
                fn deref(&self) -> &Self::Target {
                    // Safety: fixed, always mapped peripheral address.
                    unsafe { &*Self::PTR }
                }
            }

            impl fmt::Debug for $NAME {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.debug_struct(stringify!($NAME)).finish()
                }
            }
        )+

        /// All the peripherals.
        #[allow(missing_docs)]
        pub struct Peripherals {
            $(pub $NAME: $NAME,)+
        }

        impl Peripherals {
            /// Returns all the peripherals *once*.
            pub fn take() -> Option<Self> {
                critical_section::with(|_| {
                    if TAKEN.load(Ordering::Relaxed) {
                        None
                    } else {
                        Some(unsafe { Peripherals::steal() })
                    }
                })
            }

            /// Unchecked version of [`Peripherals::take`].
            ///
            /// # Safety
            ///
            /// Each of the returned peripherals must be used at most once.
            pub unsafe fn steal() -> Self {
                TAKEN.store(true, Ordering::Relaxed);
                Peripherals {
                    $($NAME: $NAME::steal(),)+
                }
            }
        }
    };
}

peripherals! {
    /// Direct memory access controller
    DMA: dma @ 0x4000_0400,
    /// GPIO port A
    GPIOA: gpio @ 0x4000_0C00,
    /// GPIO port B
    GPIOB: gpio @ 0x4000_0C40,
    /// GPIO port C
    GPIOC: gpio @ 0x4000_0C80,
    /// GPIO port D
    GPIOD: gpio @ 0x4000_0CC0,
    /// GPIO port E
    GPIOE: gpio @ 0x4000_0D00,
    /// GPIO registers shared by all ports: external interrupts and wakeup pins
    GPIO_COMMON: exti @ 0x4000_0E00,
    /// Flash controller
    FLASH: flash @ 0x4000_1000,
    /// Clock management unit
    CMU: cmu @ 0x4000_1800,
    /// Internal 1.2 V reference and temperature sensor
    VREF: vref @ 0x4000_1A00,
    /// Reset management unit
    RMU: rmu @ 0x4000_1C00,
    /// VBAT always-on domain
    VAO: vao @ 0x4000_1E00,
    /// CAN controller
    CAN: can @ 0x4000_E000,
    /// Basic 16-bit timer
    BSTIM16: bstim16 @ 0x4001_0C00,
    /// Low power 16-bit timer
    LPTIM16: lptim16 @ 0x4001_1400,
    /// UART0
    UART0: uart @ 0x4001_7200,
    /// UART1
    UART1: uart @ 0x4001_7300,
    /// UART3
    UART3: uart @ 0x4001_7500,
    /// UART4
    UART4: uart @ 0x4001_7600,
    /// UART5
    UART5: uart @ 0x4001_7700,
    /// Digital to analog converter
    DAC: dac @ 0x4001_A000,
    /// Operational amplifier 1
    OPA1: opa @ 0x4001_A100,
    /// Operational amplifier 2
    OPA2: opa @ 0x4001_A180,
    /// Comparators
    COMP: comp @ 0x4001_A300,
    /// External reference voltage generator
    VREFP: vrefp @ 0x4001_A400,
    /// Analog to digital converter
    ADC: adc @ 0x4001_A800,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interrupt_numbers() {
        use cortex_m::interrupt::InterruptNumber;
        assert_eq!(Interrupt::WWDT.number(), 0);
        assert_eq!(Interrupt::UART0.number(), 10);
        assert_eq!(Interrupt::CAN.number(), 31);
    }

    #[test]
    fn singletons_are_taken_once() {
        assert!(Peripherals::take().is_some());
        assert!(Peripherals::take().is_none());
    }
}
