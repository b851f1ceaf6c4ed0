//! Soft DMA
//!
//! Unifies the different ways a peripheral can receive into memory (a DMA
//! channel in circular mode, a DMA channel in normal mode, or a plain RX
//! interrupt writing into a buffer) behind one byte ring and three events:
//! half, full and timeout.
//!
//! The hardware side is described by a [`HardDma`] implementation. It only has
//! to start and stop transfers into a buffer and report how far it got. The
//! engine moves data into the user's ring, decides which buffer the hardware
//! writes next and turns interrupts into [`Events`].
//!
//! ## Usage
//!
//! ```ignore
//! let ring = cortex_m::singleton!(: [u8; 256] = [0; 256]).unwrap();
//! let scratch = cortex_m::singleton!(: [u8; 256] = [0; 256]).unwrap();
//! let mut sdma = SoftDma::new(uart_rx_dma);
//! sdma.start(ring, scratch)?;
//! sdma.irq_enable(true);
//!
//! // In the DMA interrupt handler
//! let events = sdma.half_irq();
//! if !events.is_empty() {
//!     let n = sdma.read(&mut line);
//! }
//! ```
//!
//! Hardware without a timeout interrupt gets one simulated by calling
//! [`SoftDma::timer_tick`] every [`SoftDma::timer_period`].

use crate::ring::DmaRing;
use core::mem::ManuallyDrop;
use core::ops::{BitOr, BitOrAssign};
use fugit::MicrosDurationU32;

/// Hardware capability flags.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct HardFlags(u8);

impl HardFlags {
    /// The hardware raises an interrupt when half of its buffer is filled.
    pub const HALF_IRQ: HardFlags = HardFlags(1 << 0);
    /// The hardware raises an interrupt when its buffer is filled.
    pub const FULL_IRQ: HardFlags = HardFlags(1 << 1);
    /// The hardware raises an interrupt when the line goes idle.
    pub const TIMEOUT_IRQ: HardFlags = HardFlags(1 << 2);

    /// No capability.
    pub const fn empty() -> HardFlags {
        HardFlags(0)
    }

    /// True if every flag of `other` is present.
    pub const fn contains(self, other: HardFlags) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for HardFlags {
    type Output = HardFlags;

    fn bitor(self, rhs: HardFlags) -> HardFlags {
        HardFlags(self.0 | rhs.0)
    }
}

/// How the hardware walks its buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HardMode {
    /// Stops at the end of the buffer and must be restarted.
    Normal,
    /// Wraps to the start of the buffer on its own.
    Circular,
}

/// Static description of a receive backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct HardInfo {
    /// Largest buffer the hardware can fill in one transfer.
    pub max_size: usize,
    /// Interrupts the hardware raises on its own.
    pub flags: HardFlags,
    /// Time to receive one unit of data, in microseconds.
    pub data_timeout_us: u32,
    /// Buffer walking mode.
    pub mode: HardMode,
}

/// Receive backend driven by [`SoftDma`].
pub trait HardDma {
    /// Describes the backend. Read once when the engine is created.
    fn info(&self) -> HardInfo;

    /// Offset inside the current buffer at which the next byte will be written.
    fn get_index(&mut self) -> usize;

    /// One-time hardware setup.
    fn init(&mut self) {}

    /// Starts receiving into `buff`.
    ///
    /// # Safety
    ///
    /// `buff` is valid for writes of `size` bytes until [`stop`](Self::stop)
    /// is called. Implementations must not touch memory outside of it.
    unsafe fn start(&mut self, buff: *mut u8, size: usize);

    /// Stops receiving and returns the final index.
    fn stop(&mut self) -> usize;
}

/// Events reported to the ring consumer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Events(u8);

impl Events {
    const HALF: u8 = 1 << 1;
    const FULL: u8 = 1 << 2;
    const TIMEOUT: u8 = 1 << 3;
    const ALL: u8 = Self::HALF | Self::FULL | Self::TIMEOUT;

    /// No event.
    pub const fn empty() -> Events {
        Events(0)
    }

    /// True if nothing happened.
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// The ring write position crossed its middle.
    pub const fn is_half(self) -> bool {
        self.0 & Self::HALF != 0
    }

    /// The ring write position wrapped.
    pub const fn is_full(self) -> bool {
        self.0 & Self::FULL != 0
    }

    /// Reception paused with data waiting.
    pub const fn is_timeout(self) -> bool {
        self.0 & Self::TIMEOUT != 0
    }
}

impl BitOr for Events {
    type Output = Events;

    fn bitor(self, rhs: Events) -> Events {
        Events(self.0 | rhs.0)
    }
}

impl BitOrAssign for Events {
    fn bitor_assign(&mut self, rhs: Events) {
        self.0 |= rhs.0;
    }
}

/// Errors returned by [`SoftDma::start`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// The engine is already running.
    AlreadyStarted,
    /// The ring cannot hold a single byte.
    RingTooSmall,
    /// The scratch buffer is shorter than [`SoftDma::scratch_len`].
    ScratchTooSmall,
}

const STATUS_EN: u8 = 1 << 0;

const NORMAL_HARD_SIZE: usize = 128;
const NO_TIMER: u32 = u32::MAX / 2;
const MIN_TIMER_PERIOD_US: u32 = 100;

struct Buffers<'a> {
    ring: DmaRing<'a>,
    // hard[0] aliases the ring, hard[1] and hard[2] live in the scratch buffer.
    hard: [DmaRing<'a>; 3],
    current: usize,
    // Circular mode with the ring as hardware buffer.
    direct: bool,
}

/// Soft DMA engine.
///
/// Dropping a running engine stops the hardware.
pub struct SoftDma<'a, H: HardDma> {
    hard: H,
    info: HardInfo,
    status: u8,
    irq_mask: u8,
    last_head: usize,
    last_stamp: usize,
    timer_period: Option<MicrosDurationU32>,
    buffers: Option<Buffers<'a>>,
}

impl<'a, H: HardDma> SoftDma<'a, H> {
    /// Wraps a receive backend. Calls its [`HardDma::init`].
    pub fn new(mut hard: H) -> Self {
        let info = hard.info();
        hard.init();
        SoftDma {
            hard,
            info,
            status: 0,
            irq_mask: 0,
            last_head: 0,
            last_stamp: 0,
            timer_period: None,
            buffers: None,
        }
    }

    /// Stops the engine and returns the backend.
    pub fn free(mut self) -> H {
        self.stop();
        let this = ManuallyDrop::new(self);
        // Safety: `this` is never used or dropped again, and with the engine
        // stopped its other fields own nothing.
        unsafe { core::ptr::read(&this.hard) }
    }

    /// Scratch space needed to [`start`](SoftDma::start) on a ring of `ring_len` bytes.
    pub fn scratch_len(info: &HardInfo, ring_len: usize) -> usize {
        match info.mode {
            HardMode::Circular if ring_len <= info.max_size => 0,
            HardMode::Circular => info.max_size,
            HardMode::Normal => 2 * normal_hard_size(info, ring_len),
        }
    }

    /// Backend description.
    pub fn info(&self) -> &HardInfo {
        &self.info
    }

    /// Access to the backend, e.g. to clear its interrupt flags.
    pub fn hard_mut(&mut self) -> &mut H {
        &mut self.hard
    }

    /// True between [`start`](SoftDma::start) and [`stop`](Self::stop).
    pub fn is_enabled(&self) -> bool {
        self.status & STATUS_EN != 0
    }

    /// The ring being filled, if running.
    pub fn ring_mut(&mut self) -> Option<&mut DmaRing<'a>> {
        self.buffers.as_mut().map(|b| &mut b.ring)
    }

    /// Pops received bytes into `buffer`.
    pub fn read(&mut self, buffer: &mut [u8]) -> usize {
        match self.buffers.as_mut() {
            Some(b) => b.ring.read(buffer),
            None => 0,
        }
    }

    /// Bytes waiting in the ring.
    pub fn count(&self) -> usize {
        self.buffers.as_ref().map_or(0, |b| b.ring.count())
    }

    /// Starts receiving into borrowed buffers.
    ///
    /// # Safety
    ///
    /// The hardware keeps writing into `ring` and `scratch` until the engine
    /// is stopped. The engine must be stopped, freed or dropped before `'a`
    /// ends; leaking it (e.g. with [`core::mem::forget`]) while running is
    /// undefined behaviour. [`SoftDma::start`] has no such contract.
    pub unsafe fn start_unchecked(
        &mut self,
        ring: &'a mut [u8],
        scratch: &'a mut [u8],
    ) -> Result<(), Error> {
        if self.is_enabled() {
            return Err(Error::AlreadyStarted);
        }
        if ring.len() < 2 {
            return Err(Error::RingTooSmall);
        }
        if scratch.len() < Self::scratch_len(&self.info, ring.len()) {
            return Err(Error::ScratchTooSmall);
        }

        let buffers = match self.info.mode {
            HardMode::Circular => circular_buffers(&self.info, ring, scratch),
            HardMode::Normal => normal_buffers(&self.info, ring, scratch),
        };
        let hard = &buffers.hard[buffers.current];
        let (buff, size) = (hard.as_mut_ptr(), hard.size());
        self.buffers = Some(buffers);

        self.last_head = 0;
        self.last_stamp = 0;
        // Safety: the region belongs to the ring or scratch buffer we hold for 'a.
        unsafe { self.hard.start(buff, size) };
        self.timer_period = timer_period(&self.info, size);
        self.status |= STATUS_EN;
        Ok(())
    }

    /// Stops receiving. Does nothing if the engine is not running.
    pub fn stop(&mut self) {
        if !self.is_enabled() {
            return;
        }
        self.timer_period = None;
        self.buffers = None;
        self.hard.stop();
        self.last_head = 0;
        self.last_stamp = 0;
        self.status &= !STATUS_EN;
    }

    /// Allows (or masks) reporting of half, full and timeout events.
    pub fn irq_enable(&mut self, enable: bool) {
        if enable {
            self.irq_mask |= Events::ALL;
        } else {
            self.irq_mask &= !Events::ALL;
        }
    }

    /// Call from the backend's half-transfer interrupt.
    pub fn half_irq(&mut self) -> Events {
        self.irq()
    }

    /// Call from the backend's transfer-complete interrupt.
    pub fn full_irq(&mut self) -> Events {
        self.irq()
    }

    /// Call from the backend's idle/timeout interrupt.
    pub fn timeout_irq(&mut self) -> Events {
        self.status |= Events::TIMEOUT;
        self.irq()
    }

    /// Period at which [`timer_tick`](Self::timer_tick) must run, if the
    /// backend lacks any interrupt. `None` when stopped or not needed.
    pub fn timer_period(&self) -> Option<MicrosDurationU32> {
        self.timer_period
    }

    /// Simulates the interrupts the backend does not have.
    pub fn timer_tick(&mut self) -> Events {
        let hard_size = match self.buffers.as_ref() {
            Some(b) => b.hard[b.current].size(),
            None => return Events::empty(),
        };

        let last_head = self.last_head;
        let head = self.hard.get_index();
        self.last_head = head;

        let mut events = Events::empty();
        if last_head < hard_size / 2 {
            if head >= hard_size / 2 && !self.info.flags.contains(HardFlags::HALF_IRQ) {
                events |= self.half_irq();
            }
        } else if head < last_head && !self.info.flags.contains(HardFlags::FULL_IRQ) {
            events |= self.full_irq();
        }

        if last_head != self.last_stamp && last_head == head {
            events |= self.timeout_irq();
        }
        events
    }

    fn irq(&mut self) -> Events {
        if !self.is_enabled() {
            return Events::empty();
        }
        let head = self.hard.get_index();
        self.update(head);
        self.dispatch()
    }

    fn update(&mut self, head: usize) {
        let Some(buffers) = self.buffers.as_mut() else {
            return;
        };
        let last_head = buffers.ring.head();

        match self.info.mode {
            HardMode::Circular => update_circular(buffers, head),
            HardMode::Normal => update_normal(&mut self.hard, buffers, head),
        }

        self.last_head = buffers.hard[buffers.current].head();
        self.last_stamp = self.last_head;

        let half = buffers.ring.size() / 2;
        if last_head < half {
            if head >= half {
                self.status |= Events::HALF;
            }
        } else if head < last_head {
            self.status |= Events::FULL;
        }
    }

    fn dispatch(&mut self) -> Events {
        if self.count() == 0 {
            self.status &= !Events::ALL;
            return Events::empty();
        }
        let fired = self.status & self.irq_mask & Events::ALL;
        self.status &= !fired;
        Events(fired)
    }
}

impl<H: HardDma> SoftDma<'static, H> {
    /// Starts receiving into `ring`, using `scratch` for intermediate buffers.
    pub fn start(&mut self, ring: &'static mut [u8], scratch: &'static mut [u8]) -> Result<(), Error> {
        // Safety: the buffers outlive the engine, leaked or not.
        unsafe { self.start_unchecked(ring, scratch) }
    }
}

impl<H: HardDma> Drop for SoftDma<'_, H> {
    fn drop(&mut self) {
        self.stop();
    }
}

fn normal_hard_size(info: &HardInfo, ring_len: usize) -> usize {
    let mut size = NORMAL_HARD_SIZE;
    if !info.flags.contains(HardFlags::HALF_IRQ) {
        let per_byte = info.data_timeout_us.max(1) as usize;
        size = size.max(600 / per_byte + 1);
    }
    size.min(ring_len).min(info.max_size)
}

fn timer_period(info: &HardInfo, hard_size: usize) -> Option<MicrosDurationU32> {
    let mut count = NO_TIMER;
    if !info.flags.contains(HardFlags::HALF_IRQ) || !info.flags.contains(HardFlags::FULL_IRQ) {
        count = (hard_size / 6) as u32;
    }
    if !info.flags.contains(HardFlags::TIMEOUT_IRQ) {
        count = 10.min(count + 1);
    }
    if count == NO_TIMER {
        return None;
    }
    let period = info
        .data_timeout_us
        .saturating_mul(count)
        .max(MIN_TIMER_PERIOD_US);
    Some(MicrosDurationU32::from_ticks(period))
}

fn circular_buffers<'a>(info: &HardInfo, ring: &'a mut [u8], scratch: &'a mut [u8]) -> Buffers<'a> {
    let ring = DmaRing::new(ring);
    let direct = ring.size() <= info.max_size;
    // Safety: hard[0] either aliases the ring (direct) or covers the scratch
    // buffer; the unused entries are empty.
    let hard0 = if direct {
        unsafe { DmaRing::from_raw_parts(ring.as_mut_ptr(), ring.size()) }
    } else {
        unsafe { DmaRing::from_raw_parts(scratch.as_mut_ptr(), info.max_size) }
    };
    let empty = || unsafe { DmaRing::from_raw_parts(core::ptr::null_mut(), 0) };
    Buffers {
        ring,
        hard: [hard0, empty(), empty()],
        current: 0,
        direct,
    }
}

fn normal_buffers<'a>(info: &HardInfo, ring: &'a mut [u8], scratch: &'a mut [u8]) -> Buffers<'a> {
    let ring = DmaRing::new(ring);
    let size = normal_hard_size(info, ring.size());
    // Safety: hard[0] aliases the ring, hard[1] and hard[2] split the scratch buffer.
    let hard = unsafe {
        [
            DmaRing::from_raw_parts(ring.as_mut_ptr(), ring.size()),
            DmaRing::from_raw_parts(scratch.as_mut_ptr(), size),
            DmaRing::from_raw_parts(scratch.as_mut_ptr().add(size), size),
        ]
    };
    Buffers {
        ring,
        hard,
        current: 0,
        direct: false,
    }
}

fn update_circular(buffers: &mut Buffers<'_>, head: usize) {
    let hard = &mut buffers.hard[0];
    hard.set_head(if head == hard.size() { 0 } else { head });

    if buffers.direct {
        let head = hard.head();
        buffers.ring.set_head(head);
    } else {
        let count = hard.count();
        buffers.ring.copy_from_ring(hard, count);
    }
}

fn update_normal<H: HardDma>(dma: &mut H, buffers: &mut Buffers<'_>, head: usize) {
    let last_hard_head = buffers.hard[buffers.current].head();

    if buffers.current == 0 {
        buffers.hard[0].set_head(head);
        buffers.current = 1;
        buffers.hard[1].reset();

        let head = dma.stop();
        let next = &buffers.hard[1];
        // Safety: hard[1] covers the scratch buffer held for 'a.
        unsafe { dma.start(next.as_mut_ptr(), next.size()) };

        debug_assert!(head >= last_hard_head && head <= buffers.hard[0].size());
        let ring = &mut buffers.ring;
        let mut ring_head = ring.head() + head.saturating_sub(last_hard_head);
        if ring_head >= ring.size() {
            ring_head = 0;
        }
        ring.set_head(ring_head);
    } else if head > 0 {
        let filled = buffers.current;
        let head = dma.stop();

        let ring_size = buffers.ring.size();
        let mut buff_head = buffers.ring.head() + head;
        if buff_head >= ring_size {
            buff_head -= ring_size;
        }

        if ring_size - buff_head > buffers.hard[1].size() {
            // Enough room left in the ring: receive straight into it.
            let ring_ptr = buffers.ring.as_mut_ptr();
            buffers.hard[0] =
                unsafe { DmaRing::from_raw_parts(ring_ptr.add(buff_head), ring_size - buff_head) };
            buffers.current = 0;
        } else {
            buffers.current = if filled == 1 { 2 } else { 1 };
        }

        let next = &mut buffers.hard[buffers.current];
        next.reset();
        // Safety: the region lies inside the ring or scratch buffer held for 'a.
        unsafe { dma.start(next.as_mut_ptr(), next.size()) };

        let (ring, hard) = (&mut buffers.ring, &mut buffers.hard[filled]);
        if head < hard.size() {
            hard.set_head(head);
            ring.copy_from_ring(hard, head);
        } else {
            #[cfg(feature = "defmt")]
            defmt::warn!("soft dma: dropped {} bytes", head);
        }
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use core::cell::Cell;
    use std::boxed::Box;
    use std::rc::Rc;

    struct MockDma {
        info: HardInfo,
        buff: *mut u8,
        size: usize,
        index: usize,
        running: bool,
        starts: usize,
        inits: usize,
        // Outlives the mock, to observe the hardware after the engine is gone.
        line: Rc<Cell<bool>>,
    }

    impl MockDma {
        fn new(mode: HardMode, flags: HardFlags, max_size: usize) -> Self {
            MockDma {
                info: HardInfo {
                    max_size,
                    flags,
                    data_timeout_us: 87,
                    mode,
                },
                buff: core::ptr::null_mut(),
                size: 0,
                index: 0,
                running: false,
                starts: 0,
                inits: 0,
                line: Rc::new(Cell::new(false)),
            }
        }

        /// Acts as the hardware receiving `bytes`.
        fn receive(&mut self, bytes: &[u8]) {
            for &b in bytes {
                assert!(self.running);
                if self.index == self.size {
                    break;
                }
                unsafe { self.buff.add(self.index).write(b) };
                self.index += 1;
                if self.index == self.size && self.info.mode == HardMode::Circular {
                    self.index = 0;
                }
            }
        }
    }

    impl HardDma for MockDma {
        fn info(&self) -> HardInfo {
            self.info
        }

        fn get_index(&mut self) -> usize {
            self.index
        }

        fn init(&mut self) {
            self.inits += 1;
        }

        unsafe fn start(&mut self, buff: *mut u8, size: usize) {
            self.buff = buff;
            self.size = size;
            self.index = 0;
            self.running = true;
            self.line.set(true);
            self.starts += 1;
        }

        fn stop(&mut self) -> usize {
            self.running = false;
            self.line.set(false);
            self.index
        }
    }

    const HALF_FULL: HardFlags = HardFlags(HardFlags::HALF_IRQ.0 | HardFlags::FULL_IRQ.0);

    fn start<'a>(
        sdma: &mut SoftDma<'a, MockDma>,
        ring: &'a mut [u8],
        scratch: &'a mut [u8],
    ) -> Result<(), Error> {
        // Safety: every test drops its engine before its buffers.
        unsafe { sdma.start_unchecked(ring, scratch) }
    }

    #[test]
    fn circular_timeout_reports_received_bytes() {
        let mut ring = [0u8; 16];
        let mut scratch = [0u8; 0];
        let mut sdma = SoftDma::new(MockDma::new(HardMode::Circular, HALF_FULL, 64));
        assert_eq!(sdma.hard_mut().inits, 1);
        start(&mut sdma, &mut ring, &mut scratch).unwrap();
        sdma.irq_enable(true);

        sdma.hard_mut().receive(b"hello");
        let events = sdma.timeout_irq();
        assert!(events.is_timeout());
        assert!(!events.is_half());

        let mut line = [0u8; 8];
        assert_eq!(sdma.read(&mut line), 5);
        assert_eq!(&line[..5], b"hello");
    }

    #[test]
    fn circular_half_then_full() {
        let mut ring = [0u8; 16];
        let mut scratch = [0u8; 0];
        let mut sdma = SoftDma::new(MockDma::new(HardMode::Circular, HALF_FULL, 64));
        start(&mut sdma, &mut ring, &mut scratch).unwrap();
        sdma.irq_enable(true);

        sdma.hard_mut().receive(&[1; 8]);
        assert!(sdma.half_irq().is_half());
        let mut line = [0u8; 16];
        assert_eq!(sdma.read(&mut line), 8);

        sdma.hard_mut().receive(&[2; 8]);
        let events = sdma.full_irq();
        assert!(events.is_full());
        assert_eq!(sdma.read(&mut line), 8);
        assert_eq!(&line[..8], &[2; 8]);
    }

    #[test]
    fn circular_copies_through_scratch_when_ring_exceeds_hardware() {
        let mut ring = [0u8; 32];
        let mut scratch = [0u8; 8];
        let info = MockDma::new(HardMode::Circular, HALF_FULL, 8).info;
        assert_eq!(SoftDma::<MockDma>::scratch_len(&info, 32), 8);

        let mut sdma = SoftDma::new(MockDma::new(HardMode::Circular, HALF_FULL, 8));
        start(&mut sdma, &mut ring, &mut scratch).unwrap();
        sdma.irq_enable(true);
        assert_eq!(sdma.hard_mut().size, 8);

        sdma.hard_mut().receive(&[1, 2, 3, 4, 5]);
        assert!(sdma.timeout_irq().is_timeout());
        sdma.hard_mut().receive(&[6, 7, 8, 9]);
        sdma.timeout_irq();

        let mut line = [0u8; 16];
        assert_eq!(sdma.read(&mut line), 9);
        assert_eq!(&line[..9], &[1, 2, 3, 4, 5, 6, 7, 8, 9]);
    }

    #[test]
    fn masked_events_keep_data() {
        let mut ring = [0u8; 16];
        let mut scratch = [0u8; 0];
        let mut sdma = SoftDma::new(MockDma::new(HardMode::Circular, HALF_FULL, 64));
        start(&mut sdma, &mut ring, &mut scratch).unwrap();

        sdma.hard_mut().receive(&[7; 3]);
        assert!(sdma.timeout_irq().is_empty());
        assert_eq!(sdma.count(), 3);
    }

    #[test]
    fn empty_ring_clears_pending_events() {
        let mut ring = [0u8; 16];
        let mut scratch = [0u8; 0];
        let mut sdma = SoftDma::new(MockDma::new(HardMode::Circular, HALF_FULL, 64));
        start(&mut sdma, &mut ring, &mut scratch).unwrap();
        sdma.irq_enable(true);

        assert!(sdma.timeout_irq().is_empty());
        sdma.hard_mut().receive(&[1]);
        // The stale timeout from the empty ring must not be reported again.
        assert!(sdma.half_irq().is_empty());
    }

    #[test]
    fn normal_mode_switches_between_ring_and_scratch() {
        let mut ring = [0u8; 256];
        let mut scratch = [0u8; 256];
        let ring_ptr = ring.as_mut_ptr();
        let scratch_ptr = scratch.as_mut_ptr();

        let mut sdma = SoftDma::new(MockDma::new(HardMode::Normal, HALF_FULL, 1024));
        assert_eq!(SoftDma::<MockDma>::scratch_len(sdma.info(), 256), 256);
        start(&mut sdma, &mut ring, &mut scratch).unwrap();
        sdma.irq_enable(true);
        assert_eq!(sdma.hard_mut().buff, ring_ptr);
        assert_eq!(sdma.hard_mut().size, 256);

        // Received straight into the ring, then moved to the first scratch half.
        sdma.hard_mut().receive(b"0123456789");
        assert!(sdma.timeout_irq().is_timeout());
        assert_eq!(sdma.hard_mut().buff, scratch_ptr);
        assert_eq!(sdma.hard_mut().size, 128);

        let mut line = [0u8; 32];
        assert_eq!(sdma.read(&mut line), 10);
        assert_eq!(&line[..10], b"0123456789");

        // Copied out of scratch, then back into the ring after the new data.
        sdma.hard_mut().receive(b"abcde");
        assert!(sdma.timeout_irq().is_timeout());
        assert_eq!(sdma.hard_mut().buff, unsafe { ring_ptr.add(15) });
        assert_eq!(sdma.hard_mut().size, 241);
        assert_eq!(sdma.read(&mut line), 5);
        assert_eq!(&line[..5], b"abcde");
    }

    #[test]
    fn normal_mode_ping_pongs_near_the_ring_end() {
        let mut ring = [0u8; 256];
        let mut scratch = [0u8; 256];
        let scratch_ptr = scratch.as_mut_ptr();

        let mut sdma = SoftDma::new(MockDma::new(HardMode::Normal, HALF_FULL, 1024));
        start(&mut sdma, &mut ring, &mut scratch).unwrap();
        sdma.irq_enable(true);

        let mut line = [0u8; 200];
        sdma.hard_mut().receive(&[1; 200]);
        sdma.timeout_irq();
        assert_eq!(sdma.read(&mut line), 200);

        sdma.hard_mut().receive(&[2; 10]);
        sdma.timeout_irq();
        // 46 bytes of ring left: not enough for a direct transfer.
        assert_eq!(sdma.hard_mut().buff, unsafe { scratch_ptr.add(128) });
        assert_eq!(sdma.read(&mut line), 10);
        assert_eq!(&line[..10], &[2; 10]);
    }

    #[test]
    fn normal_mode_drops_a_completely_filled_scratch_buffer() {
        let mut ring = [0u8; 256];
        let mut scratch = [0u8; 256];

        let mut sdma = SoftDma::new(MockDma::new(HardMode::Normal, HALF_FULL, 1024));
        start(&mut sdma, &mut ring, &mut scratch).unwrap();
        sdma.irq_enable(true);

        sdma.hard_mut().receive(&[1; 4]);
        sdma.timeout_irq();
        let mut line = [0u8; 4];
        sdma.read(&mut line);

        sdma.hard_mut().receive(&[3; 128]);
        assert!(sdma.full_irq().is_empty());
        assert_eq!(sdma.count(), 0);
    }

    #[test]
    fn start_twice_fails_and_stop_is_idempotent() {
        let mut ring = [0u8; 16];
        let mut scratch = [0u8; 0];
        let mut other = [0u8; 16];
        let mut other_scratch = [0u8; 0];
        let mut sdma = SoftDma::new(MockDma::new(HardMode::Circular, HALF_FULL, 64));
        sdma.stop();
        start(&mut sdma, &mut ring, &mut scratch).unwrap();
        assert!(sdma.is_enabled());

        assert_eq!(
            start(&mut sdma, &mut other, &mut other_scratch),
            Err(Error::AlreadyStarted)
        );

        sdma.stop();
        sdma.stop();
        assert!(!sdma.is_enabled());
        assert!(!sdma.hard_mut().running);
        assert_eq!(sdma.hard_mut().starts, 1);
    }

    #[test]
    fn start_checks_buffer_sizes() {
        let mut ring = [0u8; 1];
        let mut scratch = [0u8; 0];
        let mut sdma = SoftDma::new(MockDma::new(HardMode::Circular, HALF_FULL, 64));
        assert_eq!(start(&mut sdma, &mut ring, &mut scratch), Err(Error::RingTooSmall));

        let mut ring = [0u8; 256];
        let mut scratch = [0u8; 16];
        let mut sdma = SoftDma::new(MockDma::new(HardMode::Normal, HALF_FULL, 1024));
        assert_eq!(start(&mut sdma, &mut ring, &mut scratch), Err(Error::ScratchTooSmall));
    }

    #[test]
    fn timer_period_depends_on_missing_interrupts() {
        let mut info = MockDma::new(HardMode::Circular, HALF_FULL, 64).info;
        assert_eq!(timer_period(&info, 64), Some(MicrosDurationU32::from_ticks(870)));

        info.flags = HALF_FULL | HardFlags::TIMEOUT_IRQ;
        assert_eq!(timer_period(&info, 64), None);

        info.flags = HardFlags::TIMEOUT_IRQ;
        info.data_timeout_us = 10;
        assert_eq!(timer_period(&info, 60), Some(MicrosDurationU32::from_ticks(100)));

        info.flags = HardFlags::empty();
        info.data_timeout_us = 50;
        assert_eq!(timer_period(&info, 600), Some(MicrosDurationU32::from_ticks(500)));
    }

    #[test]
    fn normal_hard_size_without_half_irq_covers_600us() {
        let info = HardInfo {
            max_size: 4096,
            flags: HardFlags::FULL_IRQ,
            data_timeout_us: 2,
            mode: HardMode::Normal,
        };
        assert_eq!(normal_hard_size(&info, 1024), 301);
        assert_eq!(normal_hard_size(&info, 200), 200);
    }

    #[test]
    fn timer_tick_simulates_timeout() {
        let mut ring = [0u8; 64];
        let mut scratch = [0u8; 0];
        let mut sdma = SoftDma::new(MockDma::new(HardMode::Circular, HALF_FULL, 64));
        start(&mut sdma, &mut ring, &mut scratch).unwrap();
        sdma.irq_enable(true);
        assert!(sdma.timer_period().is_some());

        sdma.hard_mut().receive(&[5; 3]);
        assert!(sdma.timer_tick().is_empty());
        let events = sdma.timer_tick();
        assert!(events.is_timeout());
        assert_eq!(sdma.count(), 3);

        // Nothing new arrived since the last report.
        assert!(sdma.timer_tick().is_empty());
    }

    #[test]
    fn timer_tick_simulates_half_when_hardware_lacks_it() {
        let mut ring = [0u8; 16];
        let mut scratch = [0u8; 0];
        let mut sdma = SoftDma::new(MockDma::new(HardMode::Circular, HardFlags::FULL_IRQ, 64));
        start(&mut sdma, &mut ring, &mut scratch).unwrap();
        sdma.irq_enable(true);

        sdma.hard_mut().receive(&[1; 9]);
        assert!(sdma.timer_tick().is_half());
    }

    #[test]
    fn stopped_engine_reports_nothing() {
        let mut sdma = SoftDma::new(MockDma::new(HardMode::Circular, HALF_FULL, 64));
        assert!(sdma.half_irq().is_empty());
        assert!(sdma.timer_tick().is_empty());
        assert_eq!(sdma.read(&mut [0u8; 4]), 0);
        assert!(sdma.timer_period().is_none());
    }

    #[test]
    fn dropping_a_running_engine_stops_the_hardware() {
        let mock = MockDma::new(HardMode::Circular, HALF_FULL, 64);
        let line = mock.line.clone();
        {
            let mut ring = [0u8; 16];
            let mut scratch = [0u8; 0];
            let mut sdma = SoftDma::new(mock);
            start(&mut sdma, &mut ring, &mut scratch).unwrap();
            sdma.hard_mut().receive(&[1; 4]);
            assert!(line.get());
        }
        assert!(!line.get());
    }

    #[test]
    fn free_returns_a_stopped_backend() {
        let mut ring = [0u8; 16];
        let mut scratch = [0u8; 0];
        let mut sdma = SoftDma::new(MockDma::new(HardMode::Circular, HALF_FULL, 64));
        start(&mut sdma, &mut ring, &mut scratch).unwrap();

        let mock = sdma.free();
        assert!(!mock.running);
        assert_eq!(mock.starts, 1);
    }

    #[test]
    fn static_buffers_start_without_unsafe() {
        let ring: &'static mut [u8] = Box::leak(Box::new([0u8; 16]));
        let scratch: &'static mut [u8] = Box::leak(Box::new([0u8; 0]));
        let mut sdma: SoftDma<'static, MockDma> =
            SoftDma::new(MockDma::new(HardMode::Circular, HALF_FULL, 64));
        sdma.start(ring, scratch).unwrap();
        sdma.irq_enable(true);

        sdma.hard_mut().receive(b"ok");
        assert!(sdma.timeout_irq().is_timeout());
        let mut line = [0u8; 2];
        assert_eq!(sdma.read(&mut line), 2);
        assert_eq!(&line, b"ok");
    }

    #[test]
    fn normal_mode_direct_segment_ends_at_the_ring_end() {
        let mut ring = [0u8; 256];
        let mut scratch = [0u8; 256];
        let ring_ptr = ring.as_mut_ptr();
        let scratch_ptr = scratch.as_mut_ptr();

        let mut sdma = SoftDma::new(MockDma::new(HardMode::Normal, HALF_FULL, 1024));
        start(&mut sdma, &mut ring, &mut scratch).unwrap();
        sdma.irq_enable(true);

        let mut line = [0u8; 256];
        sdma.hard_mut().receive(b"0123456789");
        sdma.timeout_irq();
        assert_eq!(sdma.read(&mut line), 10);
        sdma.hard_mut().receive(b"abcde");
        sdma.timeout_irq();
        assert_eq!(sdma.read(&mut line), 5);
        assert_eq!(sdma.hard_mut().buff, unsafe { ring_ptr.add(15) });
        assert_eq!(sdma.hard_mut().size, 241);

        // Fill the direct segment up to the last ring byte.
        let tail: [u8; 241] = core::array::from_fn(|i| i as u8);
        sdma.hard_mut().receive(&tail);
        assert!(!sdma.full_irq().is_empty());
        assert_eq!(sdma.ring_mut().map(|r| r.head()), Some(0));
        assert_eq!(sdma.hard_mut().buff, scratch_ptr);
        assert_eq!(sdma.hard_mut().size, 128);

        assert_eq!(sdma.count(), 241);
        assert_eq!(sdma.read(&mut line), 241);
        assert_eq!(&line[..241], &tail[..]);

        // The next segment lands at the start of the ring.
        sdma.hard_mut().receive(b"xyz");
        assert!(sdma.timeout_irq().is_timeout());
        assert_eq!(sdma.read(&mut line), 3);
        assert_eq!(&line[..3], b"xyz");
    }

    #[test]
    fn timer_tick_simulates_full_when_hardware_lacks_it() {
        let mut ring = [0u8; 16];
        let mut scratch = [0u8; 0];
        let mut sdma = SoftDma::new(MockDma::new(HardMode::Circular, HardFlags::HALF_IRQ, 64));
        start(&mut sdma, &mut ring, &mut scratch).unwrap();
        sdma.irq_enable(true);
        assert!(sdma.timer_period().is_some());

        let mut line = [0u8; 16];
        sdma.hard_mut().receive(&[1; 9]);
        assert!(sdma.half_irq().is_half());
        assert_eq!(sdma.read(&mut line), 9);

        // The hardware wraps without telling anyone.
        sdma.hard_mut().receive(&[2; 7]);
        assert_eq!(sdma.hard_mut().index, 0);
        let events = sdma.timer_tick();
        assert!(events.is_full());
        assert!(!events.is_half());
        assert_eq!(sdma.read(&mut line), 7);
        assert_eq!(&line[..7], &[2; 7]);
    }
}
