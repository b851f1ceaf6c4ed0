//! Direct memory access (DMA)
//!
//! The controller has eight channels. Each channel moves data between one
//! peripheral, picked by the channel's request select, and a memory buffer.
//! The peripheral address is implied by the request; only the memory address
//! and the transfer count are programmed.
//!
//! ```ignore
//! let channels = p.DMA.split(&mut p.RMU, &mut p.CMU);
//! let mut ch2 = channels.ch2;
//! ch2.configure(&ChannelConfig::peripheral_to_memory(request));
//! unsafe { ch2.start(buf.as_mut_ptr() as u32, buf.len() as u32) };
//! ```
//!
//! The receive index of a running transfer is derived from the live memory
//! address, see [`SingleChannel::memory_address`].
use core::marker::PhantomData;
use core::sync::atomic::{compiler_fence, Ordering};

use embedded_dma::WriteBuffer;

use crate::cmu::BusClock;
use crate::pac;
use crate::pac::dma::{chcr, gcr, isr, RegisterBlock};
use crate::rmu::SubsystemReset;
use crate::typelevel::Sealed;

/// DMA unit.
pub trait DMAExt: Sealed {
    /// Reset the controller, enable its clock and split it into channels.
    fn split(self, rmu: &mut pac::RMU, cmu: &mut pac::CMU) -> Channels;
}

/// DMA channel.
pub struct Channel<CH: ChannelIndex> {
    _phantom: PhantomData<CH>,
}

/// DMA channel identifier.
pub trait ChannelIndex: Sealed {
    /// Numerical index of the DMA channel (0..7).
    fn id() -> u8;
}

/// Transfer direction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    /// Peripheral to memory
    PeripheralToMemory = 0,
    /// Memory to peripheral
    MemoryToPeripheral = 1,
}

/// Width of one transfer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DataWidth {
    /// 8 bits
    Byte = 0,
    /// 16 bits
    HalfWord = 1,
    /// 32 bits
    Word = 2,
}

/// Channel priority.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Priority {
    /// Low
    Low = 0,
    /// Medium
    Medium = 1,
    /// High
    High = 2,
    /// Very high
    VeryHigh = 3,
}

/// Channel configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[non_exhaustive]
pub struct ChannelConfig {
    /// Peripheral request select, 0..7. The meaning depends on the channel.
    pub request: u8,
    /// Direction
    pub direction: Direction,
    /// Transfer width
    pub width: DataWidth,
    /// Priority
    pub priority: Priority,
    /// Restart at the start of the buffer when the count runs out
    pub circular: bool,
    /// Increment the memory address after every transfer
    pub memory_increment: bool,
    /// Interrupt when half of the transfer is done
    pub half_irq: bool,
    /// Interrupt when the transfer is done
    pub full_irq: bool,
}

impl ChannelConfig {
    /// Byte wide peripheral to memory transfer with memory increment.
    pub const fn peripheral_to_memory(request: u8) -> Self {
        ChannelConfig {
            request,
            direction: Direction::PeripheralToMemory,
            width: DataWidth::Byte,
            priority: Priority::Medium,
            circular: false,
            memory_increment: true,
            half_irq: false,
            full_irq: false,
        }
    }

    /// Byte wide memory to peripheral transfer with memory increment.
    pub const fn memory_to_peripheral(request: u8) -> Self {
        ChannelConfig {
            direction: Direction::MemoryToPeripheral,
            ..Self::peripheral_to_memory(request)
        }
    }
}

fn configure(rb: &RegisterBlock, id: u8, config: &ChannelConfig) {
    let cr = &rb.ch[id as usize].cr;
    cr.clear_bits(chcr::EN.mask());
    cr.modify(|r| {
        let r = chcr::SSEL.set(r, config.request as u32);
        let r = chcr::DIR.set(r, config.direction as u32);
        let r = chcr::BDW.set(r, config.width as u32);
        let r = chcr::PRI.set(r, config.priority as u32);
        let r = chcr::CIRC.set(r, config.circular as u32);
        let r = chcr::INC.set(r, config.memory_increment as u32);
        let r = chcr::HTIE.set(r, config.half_irq as u32);
        chcr::FTIE.set(r, config.full_irq as u32)
    });
}

fn start(rb: &RegisterBlock, id: u8, address: u32, count: u32) {
    let ch = &rb.ch[id as usize];
    ch.cr.clear_bits(chcr::EN.mask());
    rb.isr.write(isr::htif(id).mask() | isr::ftif(id).mask());
    ch.mad.write(address);
    ch.cr.write_field(chcr::TSIZE, count.saturating_sub(1));
    ch.cr.set_bits(chcr::EN.mask());
}

/// Trait which implements the functionality of a single DMA channel.
pub trait SingleChannel: Sealed {
    /// Index of the DMA channel.
    fn id(&self) -> u8;

    #[doc(hidden)]
    fn regs(&self) -> &RegisterBlock {
        // Safety: a channel only touches its own registers and its own flags
        unsafe { &*pac::DMA::ptr() }
    }

    /// Program request, direction, width, priority, mode and interrupts.
    /// The channel is stopped.
    fn configure(&mut self, config: &ChannelConfig) {
        configure(self.regs(), self.id(), config)
    }

    /// Start a transfer of `count` items, at most 65536, at memory address `address`.
    ///
    /// # Safety
    ///
    /// The memory range has to stay valid, and must not be otherwise
    /// accessed in the transfer direction, until [`stop`](Self::stop).
    unsafe fn start(&mut self, address: u32, count: u32) {
        start(self.regs(), self.id(), address, count)
    }

    /// Stop the channel.
    fn stop(&mut self) {
        self.regs().ch[self.id() as usize]
            .cr
            .clear_bits(chcr::EN.mask());
    }

    /// Is the channel enabled.
    fn is_enabled(&self) -> bool {
        self.regs().ch[self.id() as usize].cr.bit(chcr::EN)
    }

    /// Address the next item will be written to or read from.
    fn memory_address(&self) -> u32 {
        self.regs().ch[self.id() as usize].mad.read()
    }

    /// Enable or disable the half and full transfer interrupts.
    fn listen(&mut self, half: bool, full: bool) {
        let cr = &self.regs().ch[self.id() as usize].cr;
        cr.modify(|r| chcr::FTIE.set(chcr::HTIE.set(r, half as u32), full as u32));
    }

    /// Half transfer flag.
    fn is_half(&self) -> bool {
        self.regs().isr.bit(isr::htif(self.id()))
    }

    /// Full transfer flag.
    fn is_full(&self) -> bool {
        self.regs().isr.bit(isr::ftif(self.id()))
    }

    /// Clear the half transfer flag.
    fn clear_half(&mut self) {
        // write 1 to clear
        self.regs().isr.write(isr::htif(self.id()).mask());
    }

    /// Clear the full transfer flag.
    fn clear_full(&mut self) {
        self.regs().isr.write(isr::ftif(self.id()).mask());
    }
}

impl<CH: ChannelIndex> Sealed for Channel<CH> {}

impl<CH: ChannelIndex> SingleChannel for Channel<CH> {
    fn id(&self) -> u8 {
        CH::id()
    }
}

macro_rules! channels {
    (
        $($CHX:ident: ($chX:ident, $x:expr),)+
    ) => {
        impl DMAExt for pac::DMA {
            fn split(self, rmu: &mut pac::RMU, cmu: &mut pac::CMU) -> Channels {
                self.reset_bring_down(rmu);
                self.reset_bring_up(rmu);
                self.enable_clock(cmu);
                self.gcr.set_bits(gcr::EN.mask());

                Channels {
                    $(
                        $chX: Channel {
                            _phantom: PhantomData,
                        },
                    )+
                }
            }
        }

        impl Sealed for pac::DMA {}

        /// Set of DMA channels.
        pub struct Channels {
            $(
                /// DMA channel.
                pub $chX: Channel<$CHX>,
            )+
        }
        $(
            /// DMA channel identifier.
            pub struct $CHX;
            impl ChannelIndex for $CHX {
                fn id() -> u8 {
                    $x
                }
            }

            impl Sealed for $CHX {}
        )+
    }
}

channels! {
    CH0: (ch0, 0),
    CH1: (ch1, 1),
    CH2: (ch2, 2),
    CH3: (ch3, 3),
    CH4: (ch4, 4),
    CH5: (ch5, 5),
    CH6: (ch6, 6),
    CH7: (ch7, 7),
}

/// Single buffered peripheral to memory transfer.
pub struct Transfer<CH: SingleChannel, B> {
    ch: CH,
    buffer: B,
    base: u32,
}

impl<CH, B> Transfer<CH, B>
where
    CH: SingleChannel,
    B: WriteBuffer<Word = u8>,
{
    /// Fill `buffer` from the peripheral selected by `request`.
    pub fn receive(mut ch: CH, request: u8, mut buffer: B) -> Self {
        // Safety: the buffer is owned by the transfer until it is stopped
        let (ptr, len) = unsafe { buffer.write_buffer() };
        let base = ptr as u32;

        ch.configure(&ChannelConfig::peripheral_to_memory(request));
        cortex_m::asm::dsb();
        compiler_fence(Ordering::SeqCst);
        // Safety: see above
        unsafe { ch.start(base, len as u32) };

        Transfer { ch, buffer, base }
    }

    /// Bytes written so far.
    pub fn received(&self) -> usize {
        self.ch.memory_address().wrapping_sub(self.base) as usize
    }

    /// The buffer is full.
    pub fn is_done(&self) -> bool {
        self.ch.is_full()
    }

    /// Block until the buffer is full, then release the channel and buffer.
    pub fn wait(self) -> (CH, B) {
        while !self.is_done() {}
        let (ch, buffer, _) = self.stop();
        (ch, buffer)
    }

    /// Abort the transfer. Returns the channel, the buffer and the number of
    /// bytes received.
    pub fn stop(mut self) -> (CH, B, usize) {
        self.ch.stop();
        compiler_fence(Ordering::SeqCst);
        let received = self.received();
        self.ch.clear_full();
        self.ch.clear_half();
        (self.ch, self.buffer, received)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block() -> RegisterBlock {
        unsafe { core::mem::zeroed() }
    }

    #[test]
    fn configure_channel() {
        let rb = block();
        let mut config = ChannelConfig::peripheral_to_memory(3);
        config.circular = true;
        config.half_irq = true;
        config.full_irq = true;
        configure(&rb, 4, &config);
        let cr = rb.ch[4].cr.read();
        assert_eq!(chcr::SSEL.get(cr), 3);
        assert_eq!(chcr::DIR.get(cr), 0);
        assert_eq!(chcr::PRI.get(cr), 1);
        assert_eq!(chcr::CIRC.get(cr), 1);
        assert_eq!(chcr::INC.get(cr), 1);
        assert_eq!(chcr::HTIE.get(cr), 1);
        assert_eq!(chcr::FTIE.get(cr), 1);
        assert_eq!(chcr::EN.get(cr), 0);
        assert_eq!(rb.ch[3].cr.read(), 0);
    }

    #[test]
    fn start_programs_count_minus_one() {
        let rb = block();
        start(&rb, 1, 0x2000_0100, 64);
        assert_eq!(rb.ch[1].mad.read(), 0x2000_0100);
        assert_eq!(rb.ch[1].cr.read_field(chcr::TSIZE), 63);
        assert!(rb.ch[1].cr.bit(chcr::EN));
        assert_eq!(rb.isr.read(), (1 << 1) | (1 << 9));
    }

    #[test]
    fn memory_to_peripheral_sets_dir() {
        let rb = block();
        configure(&rb, 0, &ChannelConfig::memory_to_peripheral(1));
        assert!(rb.ch[0].cr.bit(chcr::DIR));
    }
}
