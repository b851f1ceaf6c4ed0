//! Flash erase and program
//!
//! The flash array is mapped at address 0: 256 KiB in 512 byte pages, four
//! pages to a 2 KiB sector. Erasing and programming are unlocked by a key
//! sequence written inside a critical section; the controller locks itself
//! again after every operation.
//!
//! [`Flash`] exposes a sector aligned region of the array through the
//! `embedded-storage` [`NorFlash`] traits. Offsets are relative to the start
//! of the region, which can never include the vector table in sector 0.
//!
//! ```ignore
//! use embedded_storage::nor_flash::{NorFlash, ReadNorFlash};
//! // keep settings in the last 8 KiB
//! let mut flash = Flash::new(p.FLASH, 0x3_E000..0x4_0000, &mut p.CMU)?;
//! flash.erase(0, 2048)?;
//! flash.write(0, &[1, 2, 3, 4])?;
//! let mut buf = [0u8; 4];
//! flash.read(0, &mut buf)?;
//! ```
//!
//! Code executes from the same array, so the core stalls while an erase or
//! program runs.

use core::ops::Range;

use embedded_storage::nor_flash::{
    check_erase, check_read, check_write, ErrorType, NorFlash, NorFlashError, NorFlashErrorKind,
    ReadNorFlash,
};

use crate::cmu::BusClock;
use crate::pac::{
    self,
    flash::{
        epcr, isr, RegisterBlock, ERASE_KEY, ERASE_REQUEST, KEYSTA_ERROR, LOCK_KEY,
        PAGE_ERASE_KEY, PROGRAM_KEYS, SECTOR_ERASE_KEY,
    },
};

/// Size of the flash array.
pub const FLASH_SIZE: u32 = 256 * 1024;
/// Smallest erasable unit.
pub const PAGE_SIZE: u32 = 512;
/// Four pages.
pub const SECTOR_SIZE: u32 = 2048;
/// Programming granularity.
pub const WORD_SIZE: u32 = 4;

/// Polling budget for one erase or one word program.
const WAIT_LIMIT: u32 = 0x0004_0000;

/// Flash errors
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// Address or length not aligned to the page, sector or word.
    Unaligned,
    /// Outside the region, or a region that is empty or covers sector 0.
    OutOfBounds,
    /// A wrong key locked the controller until the next reset.
    Locked,
    /// The operation clock was off.
    ClockError,
    /// The key sequence was rejected.
    KeyError,
    /// The target lies in a protected region.
    AuthError,
    /// The operation did not complete in time.
    Timeout,
}

impl NorFlashError for Error {
    fn kind(&self) -> NorFlashErrorKind {
        match self {
            Error::Unaligned => NorFlashErrorKind::NotAligned,
            Error::OutOfBounds => NorFlashErrorKind::OutOfBounds,
            _ => NorFlashErrorKind::Other,
        }
    }
}

impl From<NorFlashErrorKind> for Error {
    fn from(kind: NorFlashErrorKind) -> Self {
        match kind {
            NorFlashErrorKind::NotAligned => Error::Unaligned,
            _ => Error::OutOfBounds,
        }
    }
}

/// Erase granularity.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EraseKind {
    /// 512 bytes
    Page = 0,
    /// 2 KiB
    Sector = 1,
}

impl EraseKind {
    /// Bytes erased at once.
    pub const fn size(self) -> u32 {
        match self {
            EraseKind::Page => PAGE_SIZE,
            EraseKind::Sector => SECTOR_SIZE,
        }
    }

    fn key(self) -> u32 {
        match self {
            EraseKind::Page => PAGE_ERASE_KEY,
            EraseKind::Sector => SECTOR_ERASE_KEY,
        }
    }
}

/// The flash array as seen by the core.
pub(crate) trait FlashArray {
    /// Word store that starts an erase or a program.
    fn store(&mut self, addr: u32, word: u32);
    /// Byte load.
    fn load(&self, addr: u32) -> u8;
}

/// The array at its address in the memory map.
struct Mapped;

impl FlashArray for Mapped {
    fn store(&mut self, addr: u32, word: u32) {
        // Safety: the address is word aligned and inside a region that
        // excludes sector 0, so it is never null.
        unsafe { core::ptr::write_volatile(addr as *mut u32, word) }
    }

    fn load(&self, addr: u32) -> u8 {
        // Safety: as for `store`
        unsafe { core::ptr::read_volatile(addr as *const u8) }
    }
}

fn check_unlocked(rb: &RegisterBlock) -> Result<(), Error> {
    if rb.isr.read_field(isr::KEYSTA) == KEYSTA_ERROR {
        #[cfg(feature = "defmt")]
        defmt::warn!("flash controller locked until reset");
        return Err(Error::Locked);
    }
    Ok(())
}

fn unlock(rb: &RegisterBlock, keys: [u32; 2]) {
    // the two key writes must follow each other
    critical_section::with(|_| {
        for key in keys {
            rb.key.write(key);
        }
    });
}

/// Polls until `done` is set, or an error flag shows up.
fn wait(rb: &RegisterBlock, done: pac::Field) -> Result<(), Error> {
    for _ in 0..WAIT_LIMIT {
        let r = rb.isr.read();
        if isr::CKERR.get(r) != 0 {
            return Err(Error::ClockError);
        }
        if isr::KEYERR.get(r) != 0 {
            return Err(Error::KeyError);
        }
        if isr::AUTHERR.get(r) != 0 {
            return Err(Error::AuthError);
        }
        if done.get(r) != 0 {
            // write one to clear
            rb.isr.write(done.mask());
            return Ok(());
        }
    }
    Err(Error::Timeout)
}

/// Erases the page or sector starting at `addr`.
pub(crate) fn erase(
    rb: &RegisterBlock,
    array: &mut impl FlashArray,
    kind: EraseKind,
    addr: u32,
) -> Result<(), Error> {
    if addr % kind.size() != 0 {
        return Err(Error::Unaligned);
    }
    check_unlocked(rb)?;
    rb.epcr.modify(|r| {
        let r = epcr::ERTYPE.set(r, kind as u32);
        let r = epcr::PREQ.set(r, 0);
        epcr::EREQ.set(r, 1)
    });
    unlock(rb, [ERASE_KEY, kind.key()]);
    rb.isr.write(isr::ERD.mask());
    array.store(addr, ERASE_REQUEST);
    let result = wait(rb, isr::ERD);
    rb.key.write(LOCK_KEY);
    result
}

/// Programs consecutive words from `addr`, under one unlock.
pub(crate) fn program(
    rb: &RegisterBlock,
    array: &mut impl FlashArray,
    addr: u32,
    words: impl IntoIterator<Item = u32>,
) -> Result<(), Error> {
    if addr % WORD_SIZE != 0 {
        return Err(Error::Unaligned);
    }
    check_unlocked(rb)?;
    unlock(rb, PROGRAM_KEYS);
    let result = words
        .into_iter()
        .zip((addr..).step_by(WORD_SIZE as usize))
        .try_for_each(|(word, at)| {
            rb.epcr.modify(|r| {
                let r = epcr::EREQ.set(r, 0);
                epcr::PREQ.set(r, 1)
            });
            array.store(at, word);
            wait(rb, isr::PRD)
        });
    rb.key.write(LOCK_KEY);
    result
}

/// Erases `range`, in sectors where they fit and in pages elsewhere.
pub(crate) fn erase_range(
    rb: &RegisterBlock,
    array: &mut impl FlashArray,
    range: Range<u32>,
) -> Result<(), Error> {
    let mut addr = range.start;
    while addr < range.end {
        let kind = if addr % SECTOR_SIZE == 0 && range.end - addr >= SECTOR_SIZE {
            EraseKind::Sector
        } else {
            EraseKind::Page
        };
        erase(rb, array, kind, addr)?;
        addr += kind.size();
    }
    Ok(())
}

/// Flash controller with a writable region of the array.
pub struct Flash {
    device: pac::FLASH,
    region: Range<u32>,
}

impl Flash {
    /// Enables the controller clocks and claims `region`, which has to be
    /// sector aligned, non empty, and lie after sector 0.
    pub fn new(device: pac::FLASH, region: Range<u32>, cmu: &mut pac::CMU) -> Result<Self, Error> {
        if region.start % SECTOR_SIZE != 0 || region.end % SECTOR_SIZE != 0 {
            return Err(Error::Unaligned);
        }
        if region.start == 0 || region.start >= region.end || region.end > FLASH_SIZE {
            return Err(Error::OutOfBounds);
        }
        device.enable_clock(cmu);
        Ok(Self { device, region })
    }

    /// Gates the controller clocks and frees the register block.
    pub fn free(self, cmu: &mut pac::CMU) -> pac::FLASH {
        self.device.disable_clock(cmu);
        self.device
    }

    /// The claimed part of the array.
    pub fn region(&self) -> Range<u32> {
        self.region.clone()
    }

    /// Erases one page or sector, `offset` relative to the region.
    pub fn erase_unit(&mut self, kind: EraseKind, offset: u32) -> Result<(), Error> {
        let end = offset.checked_add(kind.size()).ok_or(Error::OutOfBounds)?;
        if end > self.capacity() as u32 {
            return Err(Error::OutOfBounds);
        }
        erase(&self.device, &mut Mapped, kind, self.region.start + offset)
    }

    /// Programs one word, `offset` relative to the region.
    pub fn program_word(&mut self, offset: u32, word: u32) -> Result<(), Error> {
        check_write(self, offset, WORD_SIZE as usize)?;
        program(&self.device, &mut Mapped, self.region.start + offset, [word])
    }
}

impl ErrorType for Flash {
    type Error = Error;
}

impl ReadNorFlash for Flash {
    const READ_SIZE: usize = 1;

    fn read(&mut self, offset: u32, bytes: &mut [u8]) -> Result<(), Self::Error> {
        check_read(self, offset, bytes.len())?;
        let start = self.region.start + offset;
        for (byte, addr) in bytes.iter_mut().zip(start..) {
            *byte = Mapped.load(addr);
        }
        Ok(())
    }

    fn capacity(&self) -> usize {
        (self.region.end - self.region.start) as usize
    }
}

impl NorFlash for Flash {
    const WRITE_SIZE: usize = WORD_SIZE as usize;
    const ERASE_SIZE: usize = PAGE_SIZE as usize;

    fn erase(&mut self, from: u32, to: u32) -> Result<(), Self::Error> {
        check_erase(self, from, to)?;
        let base = self.region.start;
        erase_range(&self.device, &mut Mapped, base + from..base + to)
    }

    fn write(&mut self, offset: u32, bytes: &[u8]) -> Result<(), Self::Error> {
        check_write(self, offset, bytes.len())?;
        let words = bytes
            .chunks_exact(WORD_SIZE as usize)
            .map(|w| u32::from_le_bytes([w[0], w[1], w[2], w[3]]));
        program(&self.device, &mut Mapped, self.region.start + offset, words)
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use std::vec::Vec;

    fn block() -> RegisterBlock {
        unsafe { core::mem::zeroed() }
    }

    /// Records stores and answers each one with `reply` in ISR.
    struct Array<'a> {
        rb: &'a RegisterBlock,
        reply: u32,
        stores: Vec<(u32, u32)>,
    }

    impl<'a> Array<'a> {
        fn new(rb: &'a RegisterBlock, reply: u32) -> Self {
            Self {
                rb,
                reply,
                stores: Vec::new(),
            }
        }
    }

    impl FlashArray for Array<'_> {
        fn store(&mut self, addr: u32, word: u32) {
            self.stores.push((addr, word));
            self.rb.isr.write(self.reply);
        }

        fn load(&self, _addr: u32) -> u8 {
            0xff
        }
    }

    #[test]
    fn page_erase_sequence() {
        let rb = block();
        let mut array = Array::new(&rb, isr::ERD.mask());
        erase(&rb, &mut array, EraseKind::Page, 0x1_0200).unwrap();

        assert_eq!(array.stores, [(0x1_0200, ERASE_REQUEST)]);
        let r = rb.epcr.read();
        assert_eq!(epcr::ERTYPE.get(r), 0);
        assert_eq!(epcr::EREQ.get(r), 1);
        assert_eq!(epcr::PREQ.get(r), 0);
        // locked again afterwards
        assert_eq!(rb.key.read(), LOCK_KEY);
    }

    #[test]
    fn erase_needs_an_aligned_unit() {
        let rb = block();
        let mut array = Array::new(&rb, isr::ERD.mask());
        assert_eq!(
            erase(&rb, &mut array, EraseKind::Sector, 0x1_0200),
            Err(Error::Unaligned)
        );
        assert!(array.stores.is_empty());
        assert_eq!(rb.key.read(), 0);
    }

    #[test]
    fn locked_controller_is_left_alone() {
        let rb = block();
        rb.isr.write_field(isr::KEYSTA, KEYSTA_ERROR);
        let mut array = Array::new(&rb, isr::PRD.mask());
        assert_eq!(
            program(&rb, &mut array, 0x800, [0x1234_5678]),
            Err(Error::Locked)
        );
        assert!(array.stores.is_empty());
        assert_eq!(rb.key.read(), 0);
    }

    #[test]
    fn key_error_stops_and_relocks() {
        let rb = block();
        let mut array = Array::new(&rb, isr::KEYERR.mask());
        assert_eq!(
            program(&rb, &mut array, 0x800, [1, 2, 3]),
            Err(Error::KeyError)
        );
        assert_eq!(array.stores, [(0x800, 1)]);
        assert_eq!(rb.key.read(), LOCK_KEY);
    }

    #[test]
    fn erase_without_completion_times_out() {
        let rb = block();
        let mut array = Array::new(&rb, 0);
        assert_eq!(
            erase(&rb, &mut array, EraseKind::Sector, 0x800),
            Err(Error::Timeout)
        );
        assert_eq!(rb.key.read(), LOCK_KEY);
    }

    #[test]
    fn words_program_in_sequence() {
        let rb = block();
        let mut array = Array::new(&rb, isr::PRD.mask());
        program(&rb, &mut array, 0x1000, [0xa, 0xb, 0xc]).unwrap();

        assert_eq!(array.stores, [(0x1000, 0xa), (0x1004, 0xb), (0x1008, 0xc)]);
        let r = rb.epcr.read();
        assert_eq!(epcr::PREQ.get(r), 1);
        assert_eq!(epcr::EREQ.get(r), 0);
    }

    #[test]
    fn range_erase_prefers_sectors() {
        let rb = block();
        let mut array = Array::new(&rb, isr::ERD.mask());
        // one page, one sector, two pages
        erase_range(&rb, &mut array, 0x1600..0x2400).unwrap();

        let addrs: Vec<u32> = array.stores.iter().map(|s| s.0).collect();
        assert_eq!(addrs, [0x1600, 0x1800, 0x2000, 0x2200]);
    }

    #[test]
    fn error_kinds() {
        assert_eq!(Error::Unaligned.kind(), NorFlashErrorKind::NotAligned);
        assert_eq!(Error::OutOfBounds.kind(), NorFlashErrorKind::OutOfBounds);
        assert_eq!(Error::Timeout.kind(), NorFlashErrorKind::Other);
        assert_eq!(Error::from(NorFlashErrorKind::NotAligned), Error::Unaligned);
    }
}
