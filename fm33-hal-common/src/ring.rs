//! Byte ring shared between a receive engine and its consumer
//!
//! A [`DmaRing`] is a FIFO over a borrowed byte buffer. The producer (a DMA
//! channel, an RX interrupt or the soft-DMA engine) advances `head`, the
//! consumer advances `tail`. One slot is always kept free, so a ring of `size`
//! bytes holds at most `size - 1` bytes.
//!
//! The ring keeps a raw pointer rather than a slice because hardware may be
//! writing into the region in front of `head` while the ring is in use.

use core::marker::PhantomData;
use core::ptr;

/// Ring over a byte buffer.
pub struct DmaRing<'a> {
    buff: *mut u8,
    size: usize,
    head: usize,
    tail: usize,
    _buff: PhantomData<&'a mut [u8]>,
}

// Safety: the ring has exclusive access to its buffer for `'a`.
unsafe impl Send for DmaRing<'_> {}

impl<'a> DmaRing<'a> {
    /// Creates an empty ring covering the whole of `buff`.
    pub fn new(buff: &'a mut [u8]) -> Self {
        DmaRing {
            buff: buff.as_mut_ptr(),
            size: buff.len(),
            head: 0,
            tail: 0,
            _buff: PhantomData,
        }
    }

    /// Creates a ring from a raw region.
    ///
    /// # Safety
    ///
    /// `buff` must be valid for reads and writes of `size` bytes for `'a`.
    /// Several rings may alias the same region as long as the owner never copies
    /// between overlapping parts of them.
    pub(crate) unsafe fn from_raw_parts(buff: *mut u8, size: usize) -> Self {
        DmaRing {
            buff,
            size,
            head: 0,
            tail: 0,
            _buff: PhantomData,
        }
    }

    /// Total capacity of the underlying buffer.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Write position.
    pub fn head(&self) -> usize {
        self.head
    }

    /// Read position.
    pub fn tail(&self) -> usize {
        self.tail
    }

    pub(crate) fn set_head(&mut self, head: usize) {
        self.head = head;
    }

    pub(crate) fn reset(&mut self) {
        self.head = 0;
        self.tail = 0;
    }

    pub(crate) fn as_mut_ptr(&self) -> *mut u8 {
        self.buff
    }

    /// Number of bytes waiting between `tail` and `head`.
    pub fn count(&self) -> usize {
        if self.head >= self.tail {
            self.head - self.tail
        } else {
            self.head + self.size - self.tail
        }
    }

    /// Number of bytes that can still be pushed.
    pub fn space(&self) -> usize {
        self.size - self.count() - 1
    }

    /// True when no data is waiting.
    pub fn is_empty(&self) -> bool {
        self.head == self.tail
    }

    /// Pops `line.len()` bytes into `line`.
    ///
    /// The caller must make sure that many bytes are waiting.
    pub fn copy_to_line(&mut self, line: &mut [u8]) {
        let count = line.len();
        debug_assert!(self.head < self.size && self.tail < self.size);
        debug_assert!(count < self.size);

        if count == 0 {
            return;
        }

        if self.tail + count <= self.size {
            unsafe { ptr::copy_nonoverlapping(self.buff.add(self.tail), line.as_mut_ptr(), count) };
            self.tail += count;
            if self.tail >= self.size {
                self.tail = 0;
            }
        } else {
            let first = self.size - self.tail;
            unsafe {
                ptr::copy_nonoverlapping(self.buff.add(self.tail), line.as_mut_ptr(), first);
                ptr::copy_nonoverlapping(self.buff, line.as_mut_ptr().add(first), count - first);
            }
            self.tail = count - first;
        }
    }

    /// Pushes all of `line`.
    ///
    /// Existing data is overwritten if `line` is longer than [`space`](Self::space).
    pub fn copy_from_line(&mut self, line: &[u8]) {
        let count = line.len();
        debug_assert!(self.head < self.size && self.tail < self.size);
        debug_assert!(count < self.size);

        if self.head + count <= self.size {
            unsafe { ptr::copy_nonoverlapping(line.as_ptr(), self.buff.add(self.head), count) };
            self.head += count;
            if self.head == self.size {
                self.head = 0;
            }
        } else {
            let first = self.size - self.head;
            unsafe {
                ptr::copy_nonoverlapping(line.as_ptr(), self.buff.add(self.head), first);
                ptr::copy_nonoverlapping(line.as_ptr().add(first), self.buff, count - first);
            }
            self.head = count - first;
        }
    }

    /// Moves `count` bytes from `src` into this ring.
    ///
    /// The two rings must not share memory.
    pub fn copy_from_ring(&mut self, src: &mut DmaRing<'_>, count: usize) {
        debug_assert!(src.head < src.size && src.tail < src.size);
        debug_assert!(count < self.size && count < src.size);

        if src.tail + count <= src.size {
            let line = unsafe { core::slice::from_raw_parts(src.buff.add(src.tail), count) };
            self.copy_from_line(line);
            src.tail += count;
            if src.tail == src.size {
                src.tail = 0;
            }
        } else {
            let first = src.size - src.tail;
            let line = unsafe { core::slice::from_raw_parts(src.buff.add(src.tail), first) };
            self.copy_from_line(line);
            let line = unsafe { core::slice::from_raw_parts(src.buff, count - first) };
            self.copy_from_line(line);
            src.tail = count - first;
        }
    }

    /// Pops as many waiting bytes as fit into `buffer`, returning how many were read.
    pub fn read(&mut self, buffer: &mut [u8]) -> usize {
        let count = self.count().min(buffer.len());
        self.copy_to_line(&mut buffer[..count]);
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn count_and_space_follow_wrap() {
        let mut buf = [0u8; 8];
        let mut ring = DmaRing::new(&mut buf);
        assert!(ring.is_empty());
        assert_eq!(ring.space(), 7);

        ring.set_head(6);
        ring.tail = 2;
        assert_eq!(ring.count(), 4);

        ring.set_head(1);
        ring.tail = 6;
        assert_eq!(ring.count(), 3);
        assert_eq!(ring.space(), 4);
    }

    #[test]
    fn push_and_pop_across_the_end() {
        let mut buf = [0u8; 8];
        let mut ring = DmaRing::new(&mut buf);
        ring.copy_from_line(&[1, 2, 3, 4, 5, 6]);
        assert_eq!(ring.head(), 6);

        let mut out = [0u8; 5];
        ring.copy_to_line(&mut out);
        assert_eq!(out, [1, 2, 3, 4, 5]);
        assert_eq!(ring.tail(), 5);

        ring.copy_from_line(&[7, 8, 9, 10]);
        assert_eq!(ring.head(), 2);
        assert_eq!(ring.count(), 5);

        let mut out = [0u8; 5];
        assert_eq!(ring.read(&mut out), 5);
        assert_eq!(out, [6, 7, 8, 9, 10]);
        assert_eq!(ring.tail(), 2);
        assert!(ring.is_empty());
    }

    #[test]
    fn push_landing_on_the_end_wraps_head() {
        let mut buf = [0u8; 4];
        let mut ring = DmaRing::new(&mut buf);
        ring.copy_from_line(&[1, 2]);
        ring.tail = 2;
        ring.copy_from_line(&[3, 4]);
        assert_eq!(ring.head(), 0);
        assert_eq!(ring.count(), 2);
    }

    #[test]
    fn ring_to_ring_moves_wrapped_data() {
        let mut src_buf = [0u8; 6];
        let mut dst_buf = [0u8; 10];
        let mut src = DmaRing::new(&mut src_buf);
        let mut dst = DmaRing::new(&mut dst_buf);

        src.copy_from_line(&[0, 0, 0, 0]);
        let mut skip = [0u8; 4];
        src.copy_to_line(&mut skip);
        src.copy_from_line(&[1, 2, 3, 4]);
        assert_eq!(src.head(), 2);

        dst.copy_from_ring(&mut src, 4);
        assert!(src.is_empty());
        assert_eq!(src.tail(), 2);

        let mut out = [0u8; 8];
        assert_eq!(dst.read(&mut out), 4);
        assert_eq!(&out[..4], &[1, 2, 3, 4]);
    }

    #[test]
    fn read_is_bounded_by_waiting_data() {
        let mut buf = [0u8; 8];
        let mut ring = DmaRing::new(&mut buf);
        ring.copy_from_line(&[9, 8]);
        let mut out = [0u8; 6];
        assert_eq!(ring.read(&mut out), 2);
        assert_eq!(ring.read(&mut out), 0);
    }
}
