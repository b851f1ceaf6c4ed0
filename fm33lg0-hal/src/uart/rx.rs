//! Ring buffered reception
//!
//! Two receive backends for [`SoftDma`]: [`InterruptRx`] stores every byte
//! from the receive interrupt, [`DmaRx`] lets a DMA channel do it. Both fill
//! a hardware buffer handed out by the soft DMA engine and report when the
//! write position reaches its middle and its end.
//!
//! [`SerialRx`] ties a backend to the engine and to the NVIC:
//!
//! ```ignore
//! let ring = cortex_m::singleton!(: [u8; 256] = [0; 256]).unwrap();
//! let scratch = cortex_m::singleton!(: [u8; 256] = [0; 256]).unwrap();
//! let rx = InterruptRx::new(reader);
//! let mut serial = SerialRx::new(rx);
//! serial.start(ring, scratch, &mut core.NVIC, 1)?;
//!
//! #[interrupt]
//! fn UART0() {
//!     let events = serial.on_interrupt();
//!     if !events.is_empty() {
//!         let n = serial.read(&mut line);
//!     }
//! }
//! ```
use core::ptr;

use cortex_m::peripheral::NVIC;
use fm33_hal_common::soft_dma::{self, Events, HardDma, HardFlags, HardInfo, HardMode, SoftDma};
use fugit::MicrosDurationU32;

use super::reader::{disable_rx_interrupt, enable_rx_interrupt, is_readable, read_byte};
use super::{Reader, UartConfig, UartDevice, ValidUartPinout};
use crate::dma::{ChannelConfig, SingleChannel};
use crate::pac::{self, uart::ier, uart::RegisterBlock};

/// Largest buffer either backend fills in one go.
const MAX_HARD_SIZE: usize = 64 * 1024;

/// What the hardware reported in one interrupt.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RxIrq {
    /// The write position reached the middle of the hardware buffer.
    pub half: bool,
    /// The write position reached the end of the hardware buffer.
    pub full: bool,
}

/// A receive backend raising its own interrupt.
pub trait RxSource: HardDma {
    /// Interrupt line to route to [`SerialRx::on_interrupt`].
    fn interrupt(&self) -> pac::Interrupt;

    /// Acknowledges the interrupt and reports what happened.
    fn on_interrupt(&mut self) -> RxIrq;
}

fn hard_info(config: &UartConfig, mode: HardMode) -> HardInfo {
    HardInfo {
        max_size: MAX_HARD_SIZE,
        flags: HardFlags::HALF_IRQ | HardFlags::FULL_IRQ,
        data_timeout_us: config.byte_timeout_us().unwrap_or(1),
        mode,
    }
}

struct RxBuffer {
    buff: *mut u8,
    size: usize,
    index: usize,
}

impl RxBuffer {
    const fn empty() -> Self {
        RxBuffer {
            buff: ptr::null_mut(),
            size: 0,
            index: 0,
        }
    }
}

/// Stores the pending byte, if any, and reports the buffer milestones.
fn receive_byte(rb: &RegisterBlock, rx: &mut RxBuffer) -> RxIrq {
    let mut irq = RxIrq::default();
    if !rb.ier.bit(ier::RXBFIE) || !is_readable(rb) {
        return irq;
    }

    let byte = match read_byte(rb) {
        Ok(byte) => byte,
        Err(_e) => {
            #[cfg(feature = "defmt")]
            defmt::debug!("uart rx: dropped byte, {}", _e);
            return irq;
        }
    };
    if rx.index >= rx.size {
        return irq;
    }

    // Safety: `buff` is valid for `size` bytes between start and stop.
    unsafe { rx.buff.add(rx.index).write_volatile(byte) };
    rx.index += 1;

    if rx.index == rx.size / 2 {
        irq.half = true;
    }
    if rx.index == rx.size {
        rx.index = 0;
        irq.full = true;
    }
    irq
}

/// Interrupt driven receive backend.
///
/// Every received byte raises the UART interrupt and is stored by
/// [`RxSource::on_interrupt`].
pub struct InterruptRx<D: UartDevice, P: ValidUartPinout<D>> {
    reader: Reader<D, P>,
    rx: RxBuffer,
}

impl<D: UartDevice, P: ValidUartPinout<D>> InterruptRx<D, P> {
    /// Takes over the receive half of an enabled UART.
    pub fn new(reader: Reader<D, P>) -> Self {
        InterruptRx {
            reader,
            rx: RxBuffer::empty(),
        }
    }

    /// Returns the receive half.
    pub fn free(mut self) -> Reader<D, P> {
        disable_rx_interrupt(&self.reader.device);
        self.rx = RxBuffer::empty();
        self.reader
    }
}

impl<D: UartDevice, P: ValidUartPinout<D>> HardDma for InterruptRx<D, P> {
    fn info(&self) -> HardInfo {
        hard_info(self.reader.config(), HardMode::Normal)
    }

    fn get_index(&mut self) -> usize {
        self.rx.index
    }

    unsafe fn start(&mut self, buff: *mut u8, size: usize) {
        self.rx = RxBuffer {
            buff,
            size,
            index: 0,
        };
        enable_rx_interrupt(&self.reader.device);
    }

    fn stop(&mut self) -> usize {
        disable_rx_interrupt(&self.reader.device);
        self.rx.index
    }
}

impl<D: UartDevice, P: ValidUartPinout<D>> RxSource for InterruptRx<D, P> {
    fn interrupt(&self) -> pac::Interrupt {
        D::IRQ
    }

    fn on_interrupt(&mut self) -> RxIrq {
        receive_byte(&self.reader.device, &mut self.rx)
    }
}

/// DMA driven receive backend.
///
/// The channel's request select has to point at the UART's receive request.
/// The write position is derived from the channel's live memory address.
pub struct DmaRx<D: UartDevice, P: ValidUartPinout<D>, CH: SingleChannel> {
    reader: Reader<D, P>,
    channel: CH,
    request: u8,
    mode: HardMode,
    base: u32,
}

impl<D: UartDevice, P: ValidUartPinout<D>, CH: SingleChannel> DmaRx<D, P, CH> {
    /// Takes over the receive half of an enabled UART and a DMA channel.
    pub fn new(reader: Reader<D, P>, channel: CH, request: u8, mode: HardMode) -> Self {
        DmaRx {
            reader,
            channel,
            request,
            mode,
            base: 0,
        }
    }

    /// Returns the receive half and the channel.
    pub fn free(mut self) -> (Reader<D, P>, CH) {
        self.channel.stop();
        (self.reader, self.channel)
    }

    fn index(&self) -> usize {
        self.channel.memory_address().wrapping_sub(self.base) as usize
    }
}

impl<D: UartDevice, P: ValidUartPinout<D>, CH: SingleChannel> HardDma for DmaRx<D, P, CH> {
    fn info(&self) -> HardInfo {
        hard_info(self.reader.config(), self.mode)
    }

    fn get_index(&mut self) -> usize {
        self.index()
    }

    fn init(&mut self) {
        let mut config = ChannelConfig::peripheral_to_memory(self.request);
        config.circular = self.mode == HardMode::Circular;
        config.half_irq = true;
        config.full_irq = true;
        self.channel.configure(&config);
    }

    unsafe fn start(&mut self, buff: *mut u8, size: usize) {
        disable_rx_interrupt(&self.reader.device);
        self.base = buff as u32;
        self.channel.clear_half();
        self.channel.clear_full();
        self.channel.start(self.base, size as u32);
    }

    fn stop(&mut self) -> usize {
        self.channel.stop();
        self.index()
    }
}

impl<D: UartDevice, P: ValidUartPinout<D>, CH: SingleChannel> RxSource for DmaRx<D, P, CH> {
    fn interrupt(&self) -> pac::Interrupt {
        pac::Interrupt::DMA
    }

    fn on_interrupt(&mut self) -> RxIrq {
        let irq = RxIrq {
            half: self.channel.is_half(),
            full: self.channel.is_full(),
        };
        if irq.half {
            self.channel.clear_half();
        }
        if irq.full {
            self.channel.clear_full();
        }
        irq
    }
}

/// NVIC priority byte for a logical level, 0 being the most urgent.
/// Levels past the least urgent one saturate to it.
fn nvic_priority(level: u8) -> u8 {
    let least_urgent = (1u8 << pac::NVIC_PRIO_BITS) - 1;
    level.min(least_urgent) << (8 - pac::NVIC_PRIO_BITS)
}

/// A receive backend driven by the soft DMA engine.
///
/// Dropping a running receiver stops the backend.
pub struct SerialRx<'a, H: RxSource> {
    sdma: SoftDma<'a, H>,
}

impl<'a, H: RxSource> SerialRx<'a, H> {
    /// Wraps a backend. Runs its one-time hardware setup.
    pub fn new(hard: H) -> Self {
        SerialRx {
            sdma: SoftDma::new(hard),
        }
    }

    /// Scratch space [`start`](SerialRx::start) needs for a ring of `ring_len` bytes.
    pub fn scratch_len(&self, ring_len: usize) -> usize {
        SoftDma::<H>::scratch_len(self.sdma.info(), ring_len)
    }

    /// Starts receiving into borrowed buffers and routes the backend
    /// interrupt at `priority`, see [`SerialRx::start`].
    ///
    /// # Safety
    ///
    /// The backend keeps writing into `ring` and `scratch` until the receiver
    /// is stopped. It must be stopped, freed or dropped before `'a` ends,
    /// never leaked while running.
    pub unsafe fn start_unchecked(
        &mut self,
        ring: &'a mut [u8],
        scratch: &'a mut [u8],
        nvic: &mut NVIC,
        priority: u8,
    ) -> Result<(), soft_dma::Error> {
        let irq = self.sdma.hard_mut().interrupt();
        NVIC::mask(irq);
        // Safety: forwarded from the caller.
        unsafe { self.sdma.start_unchecked(ring, scratch)? };
        self.sdma.irq_enable(true);
        // Safety: the handler only touches this receiver through `on_interrupt`.
        unsafe {
            nvic.set_priority(irq, nvic_priority(priority));
            NVIC::unmask(irq);
        }
        Ok(())
    }

    /// Stops receiving. Bytes still in the ring are dropped.
    pub fn stop(&mut self) {
        self.sdma.stop();
    }

    /// To be called from the backend's interrupt handler.
    pub fn on_interrupt(&mut self) -> Events {
        let irq = self.sdma.hard_mut().on_interrupt();
        let mut events = Events::empty();
        if irq.half {
            events |= self.sdma.half_irq();
        }
        if irq.full {
            events |= self.sdma.full_irq();
        }
        events
    }

    /// Period at which [`on_timer`](Self::on_timer) has to run, if the
    /// backend needs a simulated idle timeout.
    pub fn timer_period(&self) -> Option<MicrosDurationU32> {
        self.sdma.timer_period()
    }

    /// To be called every [`timer_period`](Self::timer_period).
    pub fn on_timer(&mut self) -> Events {
        self.sdma.timer_tick()
    }

    /// Pops received bytes into `buffer`.
    pub fn read(&mut self, buffer: &mut [u8]) -> usize {
        self.sdma.read(buffer)
    }

    /// Bytes waiting in the ring.
    pub fn count(&self) -> usize {
        self.sdma.count()
    }

    /// Stops receiving and returns the backend.
    pub fn free(self) -> H {
        self.sdma.free()
    }
}

impl<H: RxSource> SerialRx<'static, H> {
    /// Starts receiving into `ring` and routes the backend interrupt at
    /// `priority` (0 is the most urgent, 3 the least, higher values act as 3).
    pub fn start(
        &mut self,
        ring: &'static mut [u8],
        scratch: &'static mut [u8],
        nvic: &mut NVIC,
        priority: u8,
    ) -> Result<(), soft_dma::Error> {
        // Safety: the buffers outlive the receiver, leaked or not.
        unsafe { self.start_unchecked(ring, scratch, nvic, priority) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pac::uart::isr;

    fn block() -> RegisterBlock {
        unsafe { core::mem::zeroed() }
    }

    fn rx_for(buf: &mut [u8]) -> RxBuffer {
        RxBuffer {
            buff: buf.as_mut_ptr(),
            size: buf.len(),
            index: 0,
        }
    }

    #[test]
    fn half_and_full_milestones() {
        let rb = block();
        let mut buf = [0u8; 4];
        let mut rx = rx_for(&mut buf);
        rb.ier.write(ier::RXBFIE.mask());
        rb.isr.write(isr::RXBF.mask());

        rb.rxbuf.write(0x11);
        assert_eq!(receive_byte(&rb, &mut rx), RxIrq::default());
        rb.rxbuf.write(0x22);
        assert_eq!(receive_byte(&rb, &mut rx), RxIrq { half: true, full: false });
        rb.rxbuf.write(0x33);
        assert_eq!(receive_byte(&rb, &mut rx), RxIrq::default());
        rb.rxbuf.write(0x44);
        assert_eq!(receive_byte(&rb, &mut rx), RxIrq { half: false, full: true });
        assert_eq!(rx.index, 0);
        assert_eq!(buf, [0x11, 0x22, 0x33, 0x44]);
    }

    #[test]
    fn masked_interrupt_stores_nothing() {
        let rb = block();
        let mut buf = [0u8; 4];
        let mut rx = rx_for(&mut buf);
        rb.isr.write(isr::RXBF.mask());
        rb.rxbuf.write(0x55);
        assert_eq!(receive_byte(&rb, &mut rx), RxIrq::default());
        assert_eq!(rx.index, 0);
    }

    #[test]
    fn corrupted_byte_is_dropped() {
        let rb = block();
        let mut buf = [0u8; 4];
        let mut rx = rx_for(&mut buf);
        rb.ier.write(ier::RXBFIE.mask());
        rb.isr.write(isr::RXBF.mask() | isr::FERR.mask());
        assert_eq!(receive_byte(&rb, &mut rx), RxIrq::default());
        assert_eq!(rx.index, 0);
    }

    struct MockRx {
        buff: *mut u8,
        size: usize,
        index: usize,
        pending: RxIrq,
        // Where the write position moves to once it has been sampled.
        moves_to: Option<usize>,
    }

    impl MockRx {
        fn new() -> Self {
            MockRx {
                buff: ptr::null_mut(),
                size: 0,
                index: 0,
                pending: RxIrq::default(),
                moves_to: None,
            }
        }

        /// Writes `bytes` as circular hardware would, without moving the
        /// visible write position.
        fn land(&mut self, at: usize, bytes: &[u8]) {
            for (i, &b) in bytes.iter().enumerate() {
                unsafe { self.buff.add((at + i) % self.size).write(b) };
            }
        }
    }

    impl HardDma for MockRx {
        fn info(&self) -> HardInfo {
            HardInfo {
                max_size: 64,
                flags: HardFlags::HALF_IRQ | HardFlags::FULL_IRQ,
                data_timeout_us: 87,
                mode: HardMode::Circular,
            }
        }

        fn get_index(&mut self) -> usize {
            let index = self.index;
            if let Some(next) = self.moves_to.take() {
                self.index = next;
            }
            index
        }

        unsafe fn start(&mut self, buff: *mut u8, size: usize) {
            self.buff = buff;
            self.size = size;
            self.index = 0;
        }

        fn stop(&mut self) -> usize {
            self.index
        }
    }

    impl RxSource for MockRx {
        fn interrupt(&self) -> pac::Interrupt {
            pac::Interrupt::DMA
        }

        fn on_interrupt(&mut self) -> RxIrq {
            core::mem::take(&mut self.pending)
        }
    }

    #[test]
    fn half_and_full_in_one_interrupt_are_merged() {
        let mut ring = [0u8; 16];
        let mut scratch = [0u8; 0];
        let mut serial = SerialRx::new(MockRx::new());
        unsafe { serial.sdma.start_unchecked(&mut ring, &mut scratch) }.unwrap();
        serial.sdma.irq_enable(true);

        let mut line = [0u8; 16];
        let hard = serial.sdma.hard_mut();
        hard.land(0, &[1; 6]);
        hard.index = 6;
        assert!(serial.sdma.half_irq().is_empty());
        assert_eq!(serial.read(&mut line), 6);

        // The channel crosses the middle and wraps before the handler runs,
        // and keeps going while it runs.
        let hard = serial.sdma.hard_mut();
        hard.land(6, &[2; 12]);
        hard.index = 12;
        hard.moves_to = Some(2);
        hard.pending = RxIrq { half: true, full: true };

        let events = serial.on_interrupt();
        assert!(events.is_half());
        assert!(events.is_full());
        assert_eq!(serial.sdma.hard_mut().pending, RxIrq::default());
        assert_eq!(serial.count(), 12);
        assert_eq!(serial.read(&mut line), 12);
        assert_eq!(&line[..12], &[2; 12]);
    }

    #[test]
    fn interrupt_without_events_reports_nothing() {
        let mut ring = [0u8; 16];
        let mut scratch = [0u8; 0];
        let mut serial = SerialRx::new(MockRx::new());
        unsafe { serial.sdma.start_unchecked(&mut ring, &mut scratch) }.unwrap();
        serial.sdma.irq_enable(true);

        serial.sdma.hard_mut().index = 3;
        assert!(serial.on_interrupt().is_empty());
        assert_eq!(serial.count(), 0);
    }

    #[test]
    fn priority_levels_saturate() {
        assert_eq!(nvic_priority(0), 0x00);
        assert_eq!(nvic_priority(1), 0x40);
        assert_eq!(nvic_priority(3), 0xC0);
        assert_eq!(nvic_priority(4), 0xC0);
        assert_eq!(nvic_priority(u8::MAX), 0xC0);
    }

    #[test]
    fn hard_info_follows_baudrate() {
        let info = hard_info(&UartConfig::default(), HardMode::Circular);
        assert_eq!(info.max_size, 65_536);
        assert!(info.flags.contains(HardFlags::HALF_IRQ | HardFlags::FULL_IRQ));
        assert!(!info.flags.contains(HardFlags::TIMEOUT_IRQ));
        // 10 bits at 115200 baud
        assert_eq!(info.data_timeout_us, 87);
        assert_eq!(info.mode, HardMode::Circular);
    }
}
