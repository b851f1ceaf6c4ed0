//! Controller Area Network (CAN)
//!
//! CAN 2.0B controller with a transmit FIFO, a high priority transmit buffer,
//! a receive FIFO and four acceptance filters. Frames are the [`Frame`] type,
//! which implements [`embedded_can::Frame`]; [`Can`] implements
//! [`embedded_can::nb::Can`].
//!
//! The TX and RX pins are not checked: put them into their CAN alternate
//! function before creating the driver.
//!
//! ## Usage
//!
//! ```ignore
//! use embedded_can::{nb::Can as _, StandardId};
//! let config = CanConfig::new(500_000);
//! let mut can = Can::new(p.CAN, config, &clocks, &mut p.RMU, &mut p.CMU)?;
//! can.set_filter(0, Some(Filter::accept_all()))?;
//! let frame = Frame::new(StandardId::new(0x123).unwrap(), &[1, 2, 3])?;
//! nb::block!(can.transmit(&frame))?;
//! ```

use embedded_can::{ErrorKind, ExtendedId, Id, StandardId};

use crate::cmu::{self, BusClock, CanClockSource, Clocks};
use crate::pac::{
    self,
    can::{afr, btr, brpr, cr, dlc, ecr, esr, id, int, msr, sr, Mailbox, RegisterBlock},
};
use crate::rmu::SubsystemReset;

/// Number of acceptance filters.
pub const FILTER_COUNT: u8 = 4;

const WAIT_LIMIT: u32 = 0x8000;

/// CAN errors
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// The transmit FIFO or high priority buffer is full.
    Busy,
    /// The controller is bus off.
    BusOff,
    /// More than 8 data bytes.
    InvalidDlc,
    /// The receive FIFO is empty.
    NoFrame,
    /// No bit timing reaches the bitrate exactly from the kernel clock, or
    /// the kernel clock is not running.
    InvalidBitrate,
    /// Filter index out of range.
    InvalidFilter,
    /// The acceptance filters stayed busy.
    FilterBusy,
}

impl embedded_can::Error for Error {
    fn kind(&self) -> ErrorKind {
        match self {
            Error::Busy => ErrorKind::Overrun,
            _ => ErrorKind::Other,
        }
    }
}

/// Operating mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Mode {
    /// Attached to the bus
    Normal,
    /// Transmitted frames are received internally, nothing reaches the bus
    Loopback,
    /// Controller stopped, bit timing and filters writable
    Config,
}

/// Bit timing in time quanta.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BitTiming {
    /// Kernel clock divider, 1..=256
    pub prescaler: u16,
    /// Time segment 1, 1..=16
    pub ts1: u8,
    /// Time segment 2, 1..=8
    pub ts2: u8,
    /// Synchronization jump width, 1..=4
    pub sjw: u8,
}

impl BitTiming {
    /// Searches a timing giving `bitrate` exactly from `kernel`, with the
    /// sample point closest to 87.5 %.
    pub fn from_bitrate(kernel: u32, bitrate: u32) -> Option<Self> {
        if bitrate == 0 {
            return None;
        }
        let mut best: Option<(u32, Self)> = None;
        // sync + ts1 + ts2, from the finest resolution down
        for total in (8..=25u32).rev() {
            let per_bit = match bitrate.checked_mul(total) {
                Some(v) => v,
                None => continue,
            };
            if kernel % per_bit != 0 {
                continue;
            }
            let prescaler = kernel / per_bit;
            if !(1..=256).contains(&prescaler) {
                continue;
            }
            let mut ts1 = (total * 7 + 4) / 8 - 1;
            let mut ts2 = total - 1 - ts1;
            if ts1 > 16 {
                ts1 = 16;
                ts2 = total - 17;
            }
            if ts2 > 8 {
                ts2 = 8;
                ts1 = total - 9;
            }
            let sample_point = (1 + ts1) * 1000 / total;
            let error = sample_point.abs_diff(875);
            if best.map_or(true, |(e, _)| error < e) {
                best = Some((
                    error,
                    Self {
                        prescaler: prescaler as u16,
                        ts1: ts1 as u8,
                        ts2: ts2 as u8,
                        sjw: 1,
                    },
                ));
            }
        }
        best.map(|(_, timing)| timing)
    }

    /// Bitrate this timing gives from `kernel`.
    pub const fn bitrate(&self, kernel: u32) -> u32 {
        kernel / (self.prescaler as u32 * (1 + self.ts1 as u32 + self.ts2 as u32))
    }
}

/// Bit timing source of a [`CanConfig`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Timing {
    /// Search a timing for this bitrate
    Bitrate(u32),
    /// Use this timing
    Explicit(BitTiming),
}

/// CAN configuration
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[non_exhaustive]
pub struct CanConfig {
    /// Kernel clock
    pub clock: CanClockSource,
    /// Bit timing
    pub timing: Timing,
    /// Operating mode after init
    pub mode: Mode,
}

impl CanConfig {
    /// Normal mode at `bitrate` from RCHF.
    pub const fn new(bitrate: u32) -> Self {
        Self {
            clock: CanClockSource::Rchf,
            timing: Timing::Bitrate(bitrate),
            mode: Mode::Normal,
        }
    }

    /// Sets the kernel clock.
    pub const fn clock(mut self, clock: CanClockSource) -> Self {
        self.clock = clock;
        self
    }

    /// Uses an explicit bit timing.
    pub const fn timing(mut self, timing: BitTiming) -> Self {
        self.timing = Timing::Explicit(timing);
        self
    }

    /// Sets the operating mode.
    pub const fn mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }
}

/// A CAN 2.0 frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Frame {
    id: Id,
    remote: bool,
    dlc: u8,
    data: [u8; 8],
}

impl Frame {
    /// A data frame carrying `data`.
    pub fn new(id: impl Into<Id>, data: &[u8]) -> Result<Self, Error> {
        if data.len() > 8 {
            return Err(Error::InvalidDlc);
        }
        let mut buf = [0; 8];
        buf[..data.len()].copy_from_slice(data);
        Ok(Self {
            id: id.into(),
            remote: false,
            dlc: data.len() as u8,
            data: buf,
        })
    }

    /// A remote frame requesting `dlc` bytes.
    pub fn new_remote(id: impl Into<Id>, dlc: usize) -> Result<Self, Error> {
        if dlc > 8 {
            return Err(Error::InvalidDlc);
        }
        Ok(Self {
            id: id.into(),
            remote: true,
            dlc: dlc as u8,
            data: [0; 8],
        })
    }

    /// Identifier
    pub fn id(&self) -> Id {
        self.id
    }

    /// Remote transmission request
    pub fn is_remote(&self) -> bool {
        self.remote
    }

    /// Data length code
    pub fn dlc(&self) -> usize {
        usize::from(self.dlc)
    }

    /// Payload, empty for remote frames.
    pub fn data(&self) -> &[u8] {
        if self.remote {
            &[]
        } else {
            &self.data[..usize::from(self.dlc)]
        }
    }
}

impl embedded_can::Frame for Frame {
    fn new(id: impl Into<Id>, data: &[u8]) -> Option<Self> {
        Frame::new(id, data).ok()
    }

    fn new_remote(id: impl Into<Id>, dlc: usize) -> Option<Self> {
        Frame::new_remote(id, dlc).ok()
    }

    fn is_extended(&self) -> bool {
        matches!(self.id, Id::Extended(_))
    }

    fn is_remote_frame(&self) -> bool {
        self.remote
    }

    fn id(&self) -> Id {
        self.id
    }

    fn dlc(&self) -> usize {
        usize::from(self.dlc)
    }

    fn data(&self) -> &[u8] {
        Frame::data(self)
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Frame {
    fn format(&self, f: defmt::Formatter) {
        match self.id {
            Id::Standard(id) => defmt::write!(f, "Frame {{ id: {=u16:#x}", id.as_raw()),
            Id::Extended(id) => defmt::write!(f, "Frame {{ id: {=u32:#x}x", id.as_raw()),
        }
        defmt::write!(f, ", rtr: {}, data: {=[u8]} }}", self.remote, self.data())
    }
}

/// Mailbox identifier word of `id`.
pub(crate) fn encode_id(id: Id, remote: bool) -> u32 {
    match id {
        Id::Standard(sid) => {
            // standard frames carry RTR in the SRR position
            id::ID11.val(u32::from(sid.as_raw())) | id::SRR.val(remote as u32)
        }
        Id::Extended(eid) => {
            let raw = eid.as_raw();
            id::ID11.val(raw >> 18)
                | id::SRR.mask()
                | id::IDE.mask()
                | id::ID18.val(raw & 0x3FFFF)
                | id::RTR.val(remote as u32)
        }
    }
}

/// Identifier and RTR bit of a mailbox identifier word.
pub(crate) fn decode_id(word: u32) -> (Id, bool) {
    let base = id::ID11.get(word);
    if word & id::IDE.mask() != 0 {
        let raw = (base << 18) | id::ID18.get(word);
        let eid = ExtendedId::new(raw).unwrap_or(ExtendedId::ZERO);
        (Id::Extended(eid), word & id::RTR.mask() != 0)
    } else {
        let sid = StandardId::new(base as u16).unwrap_or(StandardId::ZERO);
        (Id::Standard(sid), word & id::SRR.mask() != 0)
    }
}

/// Acceptance filter.
///
/// A received frame passes when every identifier bit set in `mask` equals
/// the same bit of `id`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Filter {
    /// Identifier to compare
    pub id: Id,
    /// Identifier bits taking part in the comparison, in the numbering of
    /// `id` (11 bits for standard, 29 bits for extended identifiers)
    pub mask: u32,
    /// Only accept frames of the same identifier format as `id`
    pub match_format: bool,
    /// Only accept frames whose RTR bit equals `remote`
    pub match_remote: bool,
    /// Compared RTR bit
    pub remote: bool,
}

impl Filter {
    /// Passes every frame.
    pub const fn accept_all() -> Self {
        Self {
            id: Id::Standard(StandardId::ZERO),
            mask: 0,
            match_format: false,
            match_remote: false,
            remote: false,
        }
    }

    /// Passes data and remote frames with exactly this identifier.
    pub fn exact(id: impl Into<Id>) -> Self {
        let id = id.into();
        let mask = match id {
            Id::Standard(_) => StandardId::MAX.as_raw().into(),
            Id::Extended(_) => ExtendedId::MAX.as_raw(),
        };
        Self {
            id,
            mask,
            match_format: true,
            match_remote: false,
            remote: false,
        }
    }

    /// Passes identifiers equal to `id` in the bits of `mask`.
    pub fn masked(id: impl Into<Id>, mask: u32) -> Self {
        Self {
            mask,
            ..Self::exact(id)
        }
    }

    /// Restricts the filter to data (`false`) or remote (`true`) frames.
    pub const fn remote(mut self, remote: bool) -> Self {
        self.match_remote = true;
        self.remote = remote;
        self
    }

    /// Mask and identifier register values.
    pub(crate) fn registers(&self) -> (u32, u32) {
        let mut afmr = match self.id {
            Id::Standard(_) => id::ID11.val(self.mask),
            Id::Extended(_) => id::ID11.val(self.mask >> 18) | id::ID18.val(self.mask & 0x3FFFF),
        };
        if self.match_format {
            afmr |= id::IDE.mask();
        }
        if self.match_remote {
            afmr |= match self.id {
                Id::Standard(_) => id::SRR.mask(),
                Id::Extended(_) => id::RTR.mask(),
            };
        }
        (afmr, encode_id(self.id, self.remote))
    }
}

/// Controller state derived from the error counters.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ErrorState {
    /// Counters below 128
    Active,
    /// A counter at or above 128
    Passive,
    /// Transmit counter overflowed
    BusOff,
}

/// Transmit and receive error counters.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ErrorCounters {
    /// Transmit error counter
    pub tec: u8,
    /// Receive error counter
    pub rec: u8,
}

/// Protocol errors seen since the last [`Can::take_bus_errors`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BusErrors {
    /// CRC mismatch
    pub crc: bool,
    /// Fixed form field violated
    pub form: bool,
    /// Bit stuffing violated
    pub stuff: bool,
    /// Transmitted bit read back different
    pub bit: bool,
    /// Transmitted frame not acknowledged
    pub ack: bool,
}

impl BusErrors {
    fn from_bits(bits: u32) -> Self {
        Self {
            crc: bits & esr::CRCER.mask() != 0,
            form: bits & esr::FMER.mask() != 0,
            stuff: bits & esr::STER.mask() != 0,
            bit: bits & esr::BERR.mask() != 0,
            ack: bits & esr::ACKER.mask() != 0,
        }
    }

    /// No error recorded.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// CAN interrupt sources and status flags.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Event {
    /// Arbitration lost
    ArbitrationLost,
    /// A frame was transmitted
    TransmitDone,
    /// Transmit FIFO full
    TxFifoFull,
    /// High priority buffer full
    TxBufferFull,
    /// A frame was received
    Received,
    /// Receive FIFO read while empty
    RxUnderflow,
    /// Receive FIFO overflowed
    RxOverflow,
    /// Receive FIFO not empty
    RxNotEmpty,
    /// Protocol error, see [`Can::take_bus_errors`]
    Error,
    /// Entered bus off
    BusOff,
}

impl Event {
    fn mask(self) -> u32 {
        match self {
            Event::ArbitrationLost => int::ARBLST.mask(),
            Event::TransmitDone => int::TXOK.mask(),
            Event::TxFifoFull => int::TXFLL.mask(),
            Event::TxBufferFull => int::TXBFLL.mask(),
            Event::Received => int::RXOK.mask(),
            Event::RxUnderflow => int::RXUFLW.mask(),
            Event::RxOverflow => int::RXOFLW.mask(),
            Event::RxNotEmpty => int::RXNEMP.mask(),
            Event::Error => int::ERROR.mask(),
            Event::BusOff => int::BSOFF.mask(),
        }
    }
}

/// Soft reset, bit timing and mode.
pub(crate) fn configure(rb: &RegisterBlock, timing: &BitTiming, mode: Mode) {
    rb.cr.write(cr::SRST.mask());
    rb.btr.write(
        btr::TS1.val(u32::from(timing.ts1) - 1)
            | btr::TS2.val(u32::from(timing.ts2) - 1)
            | btr::SJW.val(u32::from(timing.sjw) - 1),
    );
    rb.brpr.write_field(brpr::BRP, u32::from(timing.prescaler) - 1);
    set_mode(rb, mode);
}

pub(crate) fn set_mode(rb: &RegisterBlock, mode: Mode) {
    match mode {
        Mode::Normal => {
            rb.cr.write(0);
            rb.msr.write_bit(msr::LPBACK, false);
            rb.cr.write(cr::CEN.mask());
        }
        Mode::Loopback => {
            rb.cr.write(0);
            rb.msr.write_bit(msr::LPBACK, true);
            rb.cr.write(cr::CEN.mask());
        }
        Mode::Config => rb.cr.write(0),
    }
}

pub(crate) fn error_state(rb: &RegisterBlock) -> ErrorState {
    match rb.sr.read_field(sr::ESTAT) {
        2 => ErrorState::BusOff,
        3 => ErrorState::Passive,
        _ => ErrorState::Active,
    }
}

fn write_mailbox(mailbox: &Mailbox, frame: &Frame) {
    mailbox.id.write(encode_id(frame.id, frame.remote));
    mailbox.dlc.write_field(dlc::DLC, u32::from(frame.dlc));
    mailbox.dw1.write(u32::from_le_bytes([
        frame.data[0],
        frame.data[1],
        frame.data[2],
        frame.data[3],
    ]));
    // the second data word queues the frame
    mailbox.dw2.write(u32::from_le_bytes([
        frame.data[4],
        frame.data[5],
        frame.data[6],
        frame.data[7],
    ]));
}

/// Queues `frame` into the transmit FIFO, or the high priority buffer.
pub(crate) fn transmit(rb: &RegisterBlock, frame: &Frame, priority: bool) -> Result<(), Error> {
    if error_state(rb) == ErrorState::BusOff {
        #[cfg(feature = "defmt")]
        defmt::warn!("can bus off, frame dropped");
        return Err(Error::BusOff);
    }
    let (full, mailbox) = if priority {
        (int::TXBFLL, &rb.hpb)
    } else {
        (int::TXFLL, &rb.txfifo)
    };
    if rb.isr.bit(full) {
        return Err(Error::Busy);
    }
    write_mailbox(mailbox, frame);
    Ok(())
}

/// Pops a frame from the receive FIFO.
pub(crate) fn receive(rb: &RegisterBlock) -> Result<Frame, Error> {
    if !rb.isr.bit(int::RXNEMP) {
        return Err(Error::NoFrame);
    }
    let mailbox = &rb.rxfifo;
    let (id, remote) = decode_id(mailbox.id.read());
    let dlc = (mailbox.dlc.read_field(dlc::DLC) as u8).min(8);
    let mut data = [0; 8];
    data[..4].copy_from_slice(&mailbox.dw1.read().to_le_bytes());
    data[4..].copy_from_slice(&mailbox.dw2.read().to_le_bytes());
    // raised again by hardware while frames remain
    rb.icr.write(int::RXOK.mask() | int::RXNEMP.mask());
    Ok(Frame {
        id,
        remote,
        dlc,
        data,
    })
}

pub(crate) fn set_filter(rb: &RegisterBlock, index: u8, filter: Option<&Filter>) -> Result<(), Error> {
    if index >= FILTER_COUNT {
        return Err(Error::InvalidFilter);
    }
    rb.afr.clear_bits(afr::uaf(index).mask());
    let Some(filter) = filter else {
        return Ok(());
    };
    if !(0..WAIT_LIMIT).any(|_| !rb.sr.bit(sr::ACFBSY)) {
        return Err(Error::FilterBusy);
    }
    let (afmr, afir) = filter.registers();
    let slot = &rb.filter[usize::from(index)];
    slot.afmr.write(afmr);
    slot.afir.write(afir);
    rb.afr.set_bits(afr::uaf(index).mask());
    Ok(())
}

/// CAN controller
pub struct Can {
    device: pac::CAN,
    timing: BitTiming,
    kernel: u32,
}

impl Can {
    /// Selects the kernel clock, resets the controller and applies the bit
    /// timing and mode of `config`.
    pub fn new(
        device: pac::CAN,
        config: CanConfig,
        clocks: &Clocks,
        rmu: &mut pac::RMU,
        cmu: &mut pac::CMU,
    ) -> Result<Self, Error> {
        let kernel = clocks
            .can_kernel(config.clock)
            .ok_or(Error::InvalidBitrate)?
            .to_Hz();
        let timing = match config.timing {
            Timing::Bitrate(bitrate) => {
                BitTiming::from_bitrate(kernel, bitrate).ok_or(Error::InvalidBitrate)?
            }
            Timing::Explicit(timing) => timing,
        };

        device.reset_bring_down(rmu);
        device.reset_bring_up(rmu);
        device.enable_clock(cmu);
        cmu::select_can_source(cmu, config.clock);

        configure(&device, &timing, config.mode);

        #[cfg(feature = "defmt")]
        defmt::debug!("can {} bit/s, {}", timing.bitrate(kernel), timing);

        Ok(Self {
            device,
            timing,
            kernel,
        })
    }

    /// Stops the controller and frees the register block.
    pub fn free(self) -> pac::CAN {
        self.device.cr.write(0);
        self.device
    }

    /// Applied bit timing.
    pub fn bit_timing(&self) -> BitTiming {
        self.timing
    }

    /// Effective bitrate.
    pub fn bitrate(&self) -> u32 {
        self.timing.bitrate(self.kernel)
    }

    /// Switches the operating mode.
    pub fn set_mode(&mut self, mode: Mode) {
        set_mode(&self.device, mode)
    }

    /// Current operating mode.
    pub fn mode(&self) -> Mode {
        let status = self.device.sr.read();
        if status & sr::LBACK.mask() != 0 {
            Mode::Loopback
        } else if status & sr::NORMAL.mask() != 0 {
            Mode::Normal
        } else {
            Mode::Config
        }
    }

    /// Programs acceptance filter `index` (0..=3), `None` disables it.
    ///
    /// With every filter disabled all frames are accepted.
    pub fn set_filter(&mut self, index: u8, filter: Option<Filter>) -> Result<(), Error> {
        set_filter(&self.device, index, filter.as_ref())
    }

    /// Queues `frame` into the transmit FIFO.
    pub fn transmit(&mut self, frame: &Frame) -> Result<(), Error> {
        transmit(&self.device, frame, false)
    }

    /// Places `frame` into the high priority buffer, sent ahead of the FIFO.
    pub fn transmit_priority(&mut self, frame: &Frame) -> Result<(), Error> {
        transmit(&self.device, frame, true)
    }

    /// Pops the oldest received frame.
    pub fn receive(&mut self) -> Result<Frame, Error> {
        receive(&self.device)
    }

    /// Error counters.
    pub fn error_counters(&self) -> ErrorCounters {
        let ecr = self.device.ecr.read();
        ErrorCounters {
            tec: ecr::TEC.get(ecr) as u8,
            rec: ecr::REC.get(ecr) as u8,
        }
    }

    /// Error state.
    pub fn error_state(&self) -> ErrorState {
        error_state(&self.device)
    }

    /// An error counter reached the warning limit of 96.
    pub fn is_error_warning(&self) -> bool {
        self.device.sr.bit(sr::ERRWRN)
    }

    /// A frame is on the bus.
    pub fn is_bus_busy(&self) -> bool {
        self.device.sr.bit(sr::BBSY)
    }

    /// The bus is idle.
    pub fn is_bus_idle(&self) -> bool {
        self.device.sr.bit(sr::BIDLE)
    }

    /// Reads and clears the protocol error flags.
    pub fn take_bus_errors(&mut self) -> BusErrors {
        let pending = self.device.esr.read();
        if pending != 0 {
            // write one to clear
            self.device.esr.write(pending);
        }
        let errors = BusErrors::from_bits(pending);
        #[cfg(feature = "defmt")]
        if !errors.is_empty() {
            defmt::warn!("can bus errors {}", errors);
        }
        errors
    }

    /// Enables an interrupt source.
    pub fn enable_interrupt(&mut self, event: Event) {
        self.device.ier.set_bits(event.mask());
    }

    /// Disables an interrupt source.
    pub fn disable_interrupt(&mut self, event: Event) {
        self.device.ier.clear_bits(event.mask());
    }

    /// Status flag of `event`.
    pub fn is_pending(&self, event: Event) -> bool {
        self.device.isr.read() & event.mask() != 0
    }

    /// Clears the status flag of `event`.
    pub fn clear(&mut self, event: Event) {
        self.device.icr.write(event.mask());
    }
}

impl embedded_can::nb::Can for Can {
    type Frame = Frame;
    type Error = Error;

    fn transmit(&mut self, frame: &Frame) -> nb::Result<Option<Frame>, Error> {
        match transmit(&self.device, frame, false) {
            Ok(()) => Ok(None),
            Err(Error::Busy) => Err(nb::Error::WouldBlock),
            Err(e) => Err(nb::Error::Other(e)),
        }
    }

    fn receive(&mut self) -> nb::Result<Frame, Error> {
        match receive(&self.device) {
            Ok(frame) => Ok(frame),
            Err(Error::NoFrame) => Err(nb::Error::WouldBlock),
            Err(e) => Err(nb::Error::Other(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block() -> RegisterBlock {
        unsafe { core::mem::zeroed() }
    }

    fn sid(raw: u16) -> StandardId {
        StandardId::new(raw).unwrap()
    }

    fn eid(raw: u32) -> ExtendedId {
        ExtendedId::new(raw).unwrap()
    }

    #[test]
    fn timing_at_87_5_percent() {
        let t = BitTiming::from_bitrate(8_000_000, 500_000).unwrap();
        assert_eq!((t.prescaler, t.ts1, t.ts2, t.sjw), (1, 13, 2, 1));
        assert_eq!(t.bitrate(8_000_000), 500_000);

        // 24 quanta would put the sample point at 70 %
        let t = BitTiming::from_bitrate(48_000_000, 1_000_000).unwrap();
        assert_eq!((t.prescaler, t.ts1, t.ts2), (3, 13, 2));
    }

    #[test]
    fn unreachable_bitrates() {
        assert_eq!(BitTiming::from_bitrate(8_000_000, 0), None);
        assert_eq!(BitTiming::from_bitrate(8_000_000, 3_000_000), None);
        // needs a prescaler above 256
        assert_eq!(BitTiming::from_bitrate(48_000_000, 5_000), None);
    }

    #[test]
    fn frame_length_limits() {
        assert_eq!(Frame::new(sid(1), &[0; 9]), Err(Error::InvalidDlc));
        assert_eq!(Frame::new_remote(sid(1), 9), Err(Error::InvalidDlc));
        let f = Frame::new(sid(1), &[1, 2, 3]).unwrap();
        assert_eq!(f.data(), &[1, 2, 3]);
        let r = Frame::new_remote(eid(7), 4).unwrap();
        assert_eq!(r.dlc(), 4);
        assert!(r.data().is_empty());
    }

    #[test]
    fn identifier_words() {
        let word = encode_id(Id::Standard(sid(0x123)), true);
        assert_eq!(word, 0x123 | (1 << 11));
        assert_eq!(decode_id(word), (Id::Standard(sid(0x123)), true));

        let word = encode_id(Id::Extended(eid(0x1234_5678)), false);
        assert_eq!(id::ID11.get(word), 0x1234_5678 >> 18);
        assert_eq!(id::ID18.get(word), 0x1234_5678 & 0x3FFFF);
        assert!(word & id::IDE.mask() != 0);
        assert_eq!(decode_id(word), (Id::Extended(eid(0x1234_5678)), false));
    }

    #[test]
    fn configure_timing_and_mode() {
        let rb = block();
        let timing = BitTiming {
            prescaler: 4,
            ts1: 13,
            ts2: 2,
            sjw: 2,
        };
        configure(&rb, &timing, Mode::Loopback);
        assert_eq!(rb.brpr.read(), 3);
        assert_eq!(rb.btr.read_field(btr::TS1), 12);
        assert_eq!(rb.btr.read_field(btr::TS2), 1);
        assert_eq!(rb.btr.read_field(btr::SJW), 1);
        assert!(rb.msr.bit(msr::LPBACK));
        assert_eq!(rb.cr.read(), cr::CEN.mask());

        set_mode(&rb, Mode::Config);
        assert_eq!(rb.cr.read(), 0);
    }

    #[test]
    fn transmit_fills_mailbox() {
        let rb = block();
        let frame = Frame::new(sid(0x7FF), &[1, 2, 3, 4, 5]).unwrap();
        transmit(&rb, &frame, false).unwrap();
        assert_eq!(rb.txfifo.id.read(), 0x7FF);
        assert_eq!(rb.txfifo.dlc.read(), 5);
        assert_eq!(rb.txfifo.dw1.read(), 0x0403_0201);
        assert_eq!(rb.txfifo.dw2.read(), 0x0000_0005);
        assert_eq!(rb.hpb.dw1.read(), 0);

        transmit(&rb, &frame, true).unwrap();
        assert_eq!(rb.hpb.dw1.read(), 0x0403_0201);
    }

    #[test]
    fn transmit_refused_when_full_or_bus_off() {
        let rb = block();
        let frame = Frame::new(sid(1), &[]).unwrap();
        rb.isr.write(int::TXFLL.mask());
        assert_eq!(transmit(&rb, &frame, false), Err(Error::Busy));
        assert_eq!(transmit(&rb, &frame, true), Ok(()));

        rb.sr.write(sr::ESTAT.val(2));
        assert_eq!(transmit(&rb, &frame, true), Err(Error::BusOff));
    }

    #[test]
    fn receive_pops_fifo() {
        let rb = block();
        assert_eq!(receive(&rb), Err(Error::NoFrame));

        rb.isr.write(int::RXNEMP.mask());
        rb.rxfifo.id.write(encode_id(Id::Extended(eid(0x18FF_0001)), false));
        rb.rxfifo.dlc.write(8);
        rb.rxfifo.dw1.write(0x4433_2211);
        rb.rxfifo.dw2.write(0x8877_6655);
        let frame = receive(&rb).unwrap();
        assert_eq!(frame.id(), Id::Extended(eid(0x18FF_0001)));
        assert_eq!(
            frame.data(),
            &[0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77, 0x88]
        );
        assert_eq!(rb.icr.read(), int::RXOK.mask() | int::RXNEMP.mask());
    }

    #[test]
    fn filters() {
        let rb = block();
        let filter = Filter::masked(sid(0x120), 0x7F0).remote(false);
        set_filter(&rb, 2, Some(&filter)).unwrap();
        let slot = &rb.filter[2];
        assert_eq!(
            slot.afmr.read(),
            0x7F0 | id::IDE.mask() | id::SRR.mask()
        );
        assert_eq!(slot.afir.read(), 0x120);
        assert_eq!(rb.afr.read(), 1 << 2);

        set_filter(&rb, 2, None).unwrap();
        assert_eq!(rb.afr.read(), 0);
        assert_eq!(set_filter(&rb, 4, None), Err(Error::InvalidFilter));

        let (afmr, _) = Filter::accept_all().registers();
        assert_eq!(afmr, 0);
    }
}
