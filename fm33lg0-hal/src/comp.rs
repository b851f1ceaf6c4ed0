//! Analog comparators (COMP)
//!
//! COMP1, COMP2 and COMP3 share one register block: a control register each,
//! plus common interrupt configuration, interrupt status and input buffer
//! registers. [`CompExt::split`] hands out one [`Comparator`] per unit and the
//! shared [`InputBuffer`].
//!
//! ```ignore
//! let comps = p.COMP.split(&mut p.RMU, &mut p.CMU);
//! let mut comp1 = comps.comp1;
//! comp1.configure(&CompConfig::new(PositiveInput::Inp1, NegativeInput::Vref));
//! comp1.enable();
//! let above = comp1.output();
//! ```
use core::marker::PhantomData;

use crate::cmu::BusClock;
use crate::pac;
use crate::pac::comp::{bufcr, cr, icr, isr, RegisterBlock};
use crate::rmu::SubsystemReset;
use crate::typelevel::Sealed;

/// Comparator unit.
pub trait CompExt: Sealed {
    /// Reset the comparators, enable their clock and split them up.
    fn split(self, rmu: &mut pac::RMU, cmu: &mut pac::CMU) -> Comparators;
}

/// Comparator identifier.
pub trait CompIndex: Sealed {
    /// Numerical index of the comparator (0..3).
    fn id() -> usize;
}

/// Positive input.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PositiveInput {
    /// INP1 pin
    Inp1 = 0,
    /// INP2 pin
    Inp2 = 1,
    /// AVREF
    Avref = 2,
    /// ULPBG reference
    UlpbgAref = 3,
    /// VDD15
    Vdd15 = 4,
    /// VREF regulator
    VrefVreg = 5,
}

/// Negative input.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum NegativeInput {
    /// INN1 pin
    Inn1 = 0,
    /// INN2 pin
    Inn2 = 1,
    /// VREF
    Vref = 2,
    /// VREF / 2
    VrefDiv2 = 3,
    /// Buffered reference, see [`InputBuffer`]
    VrefBuf = 4,
    /// DAC output
    Dac = 5,
}

/// Output polarity.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Polarity {
    /// High when positive > negative
    Normal = 0,
    /// Inverted
    Inverted = 1,
}

/// Supply current versus response time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PowerMode {
    /// Low power
    Low = 0,
    /// Medium
    Medium = 1,
    /// High speed
    High = 2,
}

/// Output edge raising the comparator interrupt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Edge {
    /// Both edges
    Both = 0,
    /// Rising edge
    Rising = 1,
    /// Falling edge
    Falling = 2,
}

/// Reference driven by the input buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BufferReference {
    /// AVREF
    Avref = 0,
    /// VREF1P2
    Vref1p2 = 1,
}

/// Comparator configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[non_exhaustive]
pub struct CompConfig {
    /// Positive input
    pub positive: PositiveInput,
    /// Negative input
    pub negative: NegativeInput,
    /// Output polarity
    pub polarity: Polarity,
    /// Interrupt edge
    pub edge: Edge,
    /// Digital output filter length in APB clocks (3..=32), `None` disables it
    pub filter: Option<u8>,
    /// Power mode
    pub power: PowerMode,
}

impl CompConfig {
    /// Unfiltered, normal polarity, low power, interrupt on both edges.
    pub const fn new(positive: PositiveInput, negative: NegativeInput) -> Self {
        Self {
            positive,
            negative,
            polarity: Polarity::Normal,
            edge: Edge::Both,
            filter: None,
            power: PowerMode::Low,
        }
    }

    /// Sets the output polarity.
    pub const fn polarity(mut self, polarity: Polarity) -> Self {
        self.polarity = polarity;
        self
    }

    /// Sets the interrupt edge.
    pub const fn edge(mut self, edge: Edge) -> Self {
        self.edge = edge;
        self
    }

    /// Sets the digital filter.
    pub const fn filter(mut self, filter: Option<u8>) -> Self {
        self.filter = filter;
        self
    }

    /// Sets the power mode.
    pub const fn power(mut self, power: PowerMode) -> Self {
        self.power = power;
        self
    }
}

impl Default for CompConfig {
    fn default() -> Self {
        Self::new(PositiveInput::Inp1, NegativeInput::Inn1)
    }
}

/// DFLEN code for a filter of `len` APB clocks. Codes 1 and 2 are not used,
/// three clocks is code 0.
fn filter_code(len: u8) -> u32 {
    match len {
        0..=3 => 0,
        _ => u32::from(len.min(32)) - 1,
    }
}

pub(crate) fn configure(rb: &RegisterBlock, n: usize, config: &CompConfig) {
    let (dfen, dflen) = match config.filter {
        Some(len) => (1, filter_code(len)),
        None => (0, 0),
    };
    rb.cr(n).modify(|r| {
        let r = cr::VPSEL.set(r, config.positive as u32);
        let r = cr::VNSEL.set(r, config.negative as u32);
        let r = cr::POLAR.set(r, config.polarity as u32);
        let r = cr::MODE.set(r, config.power as u32);
        let r = cr::DFLEN.set(r, dflen);
        cr::DFEN.set(r, dfen)
    });
    critical_section::with(|_| {
        rb.icr.write_field(icr::sel(n), config.edge as u32);
    });
}

fn flag(n: usize) -> u32 {
    1 << n
}

/// One comparator.
pub struct Comparator<C: CompIndex> {
    _phantom: PhantomData<C>,
}

impl<C: CompIndex> Comparator<C> {
    fn regs(&self) -> &RegisterBlock {
        // Safety: a comparator writes its own control register, its own
        // write-one-to-clear flag, and the shared ICR inside a critical section
        unsafe { &*pac::COMP::ptr() }
    }

    /// Applies inputs, polarity, filter, power mode and interrupt edge.
    pub fn configure(&mut self, config: &CompConfig) {
        configure(self.regs(), C::id(), config)
    }

    /// Starts comparing.
    pub fn enable(&mut self) {
        self.regs().cr(C::id()).set_bits(cr::CMPEN.mask());
    }

    /// Stops comparing.
    pub fn disable(&mut self) {
        self.regs().cr(C::id()).clear_bits(cr::CMPEN.mask());
    }

    /// Is the comparator running.
    pub fn is_enabled(&self) -> bool {
        self.regs().cr(C::id()).bit(cr::CMPEN)
    }

    /// Comparison result, after polarity and filter.
    pub fn output(&self) -> bool {
        self.regs().cr(C::id()).bit(cr::CMPO)
    }

    /// Joins this comparator with its neighbour into a window comparator.
    pub fn set_window_mode(&mut self, on: bool) {
        self.regs().cr(C::id()).write_bit(cr::WINMODE, on);
    }

    /// Routes the output to the trigger network.
    pub fn set_trigger_output(&mut self, on: bool) {
        self.regs().cr(C::id()).write_bit(cr::TRGOEN, on);
    }

    /// Enables the output edge interrupt.
    pub fn enable_interrupt(&mut self) {
        critical_section::with(|_| self.regs().icr.set_bits(icr::ie(C::id()).mask()));
    }

    /// Disables the output edge interrupt.
    pub fn disable_interrupt(&mut self) {
        critical_section::with(|_| self.regs().icr.clear_bits(icr::ie(C::id()).mask()));
    }

    /// Output edge flag.
    pub fn is_pending(&self) -> bool {
        self.regs().isr.read() & flag(C::id()) != 0
    }

    /// Clears the output edge flag.
    pub fn clear(&mut self) {
        // write one to clear
        self.regs().isr.write(flag(C::id()));
    }

    /// Interrupt handler helper: returns `true` and clears the flag if this
    /// comparator's enabled interrupt fired.
    pub fn on_interrupt(&mut self) -> bool {
        let rb = self.regs();
        if rb.icr.bit(icr::ie(C::id())) && self.is_pending() {
            self.clear();
            true
        } else {
            false
        }
    }
}

/// Window comparator events.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WindowEvent {
    /// The input crossed a window threshold
    AcrossThreshold,
    /// The input left the window
    OutOfWindow,
}

impl WindowEvent {
    fn status(self) -> u32 {
        match self {
            WindowEvent::AcrossThreshold => isr::WIN_IF.mask(),
            WindowEvent::OutOfWindow => isr::OOW_IF.mask(),
        }
    }

    fn enable(self) -> u32 {
        match self {
            WindowEvent::AcrossThreshold => icr::WIN_IE.mask(),
            WindowEvent::OutOfWindow => icr::OWW_IE.mask(),
        }
    }
}

/// Shared reference buffer and window interrupts.
pub struct InputBuffer {
    _private: (),
}

impl InputBuffer {
    fn regs(&self) -> &RegisterBlock {
        // Safety: owns BUFCR, the window bits of ICR go through a critical section
        unsafe { &*pac::COMP::ptr() }
    }

    /// Powers the buffer and selects the reference it drives.
    pub fn enable(&mut self, reference: BufferReference) {
        // BUFENB is active low
        self.regs().bufcr.modify(|r| {
            let r = bufcr::BUFSEL.set(r, reference as u32);
            bufcr::BUFENB.set(r, 0)
        });
    }

    /// Powers the buffer down.
    pub fn disable(&mut self) {
        self.regs().bufcr.set_bits(bufcr::BUFENB.mask());
    }

    /// Passes the reference through unbuffered.
    pub fn set_bypass(&mut self, on: bool) {
        self.regs().bufcr.write_bit(bufcr::BUFBYP, on);
    }

    /// Enables a window interrupt.
    pub fn enable_window_interrupt(&mut self, event: WindowEvent) {
        critical_section::with(|_| self.regs().icr.set_bits(event.enable()));
    }

    /// Disables a window interrupt.
    pub fn disable_window_interrupt(&mut self, event: WindowEvent) {
        critical_section::with(|_| self.regs().icr.clear_bits(event.enable()));
    }

    /// Window event flag.
    pub fn is_pending(&self, event: WindowEvent) -> bool {
        self.regs().isr.read() & event.status() != 0
    }

    /// Clears a window event flag.
    pub fn clear(&mut self, event: WindowEvent) {
        self.regs().isr.write(event.status());
    }
}

macro_rules! comparators {
    ($($CX:ident: ($cx:ident, $x:expr),)+) => {
        impl CompExt for pac::COMP {
            fn split(self, rmu: &mut pac::RMU, cmu: &mut pac::CMU) -> Comparators {
                self.reset_bring_down(rmu);
                self.reset_bring_up(rmu);
                self.enable_clock(cmu);

                Comparators {
                    $(
                        $cx: Comparator {
                            _phantom: PhantomData,
                        },
                    )+
                    buffer: InputBuffer { _private: () },
                }
            }
        }

        impl Sealed for pac::COMP {}

        /// Set of comparators.
        pub struct Comparators {
            $(
                /// Comparator.
                pub $cx: Comparator<$CX>,
            )+
            /// Shared input buffer.
            pub buffer: InputBuffer,
        }
        $(
            /// Comparator identifier.
            pub struct $CX;
            impl CompIndex for $CX {
                fn id() -> usize {
                    $x
                }
            }

            impl Sealed for $CX {}
        )+
    }
}

comparators! {
    COMP1: (comp1, 0),
    COMP2: (comp2, 1),
    COMP3: (comp3, 2),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block() -> RegisterBlock {
        unsafe { core::mem::zeroed() }
    }

    #[test]
    fn filter_codes() {
        assert_eq!(filter_code(3), 0);
        assert_eq!(filter_code(1), 0);
        assert_eq!(filter_code(4), 3);
        assert_eq!(filter_code(32), 0x1f);
        assert_eq!(filter_code(200), 0x1f);
    }

    #[test]
    fn configure_comp2() {
        let rb = block();
        let config = CompConfig::new(PositiveInput::Avref, NegativeInput::Dac)
            .polarity(Polarity::Inverted)
            .edge(Edge::Falling)
            .filter(Some(8))
            .power(PowerMode::High);
        configure(&rb, 1, &config);

        assert_eq!(rb.cr1.read(), 0);
        let cr = rb.cr2.read();
        assert_eq!(cr::VPSEL.get(cr), 2);
        assert_eq!(cr::VNSEL.get(cr), 5);
        assert_eq!(cr::POLAR.get(cr), 1);
        assert_eq!(cr::MODE.get(cr), 2);
        assert_eq!(cr::DFEN.get(cr), 1);
        assert_eq!(cr::DFLEN.get(cr), 7);
        assert_eq!(rb.icr.read_field(icr::CMP2SEL), 2);
        assert_eq!(rb.icr.read_field(icr::CMP1SEL), 0);
    }

    #[test]
    fn reconfigure_keeps_enable() {
        let rb = block();
        rb.cr3.write(cr::CMPEN.mask() | cr::TRGOEN.mask());
        configure(&rb, 2, &CompConfig::default());
        assert!(rb.cr3.bit(cr::CMPEN));
        assert!(rb.cr3.bit(cr::TRGOEN));
        assert_eq!(rb.cr3.read_field(cr::DFEN), 0);
    }

    #[test]
    fn per_comparator_fields() {
        assert_eq!(icr::ie(0), icr::CMP1IE);
        assert_eq!(icr::ie(2), icr::CMP3IE);
        assert_eq!(icr::sel(1), icr::CMP2SEL);
        assert_eq!(flag(1), isr::CMP2IF.mask());
        assert_eq!(flag(2), isr::CMP3IF.mask());
    }
}
