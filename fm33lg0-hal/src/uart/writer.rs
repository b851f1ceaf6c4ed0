//! Universal Asynchronous Receiver Transmitter - Transmitter Code
//!
//! This module is for transmitting data with a UART.

use super::{UartDevice, ValidUartPinout};
use crate::pac::uart::{ier, isr, RegisterBlock};
use core::fmt;
use core::{convert::Infallible, marker::PhantomData};
use embedded_hal_0_2::serial as eh0;
use embedded_hal_nb::serial::{ErrorType, Write};
use nb::Error::*;

/// Returns `Err(WouldBlock)` if the UART is still shifting data out or
/// `Ok(())` once the last byte has left the shift register.
pub(crate) fn transmit_flushed(rb: &RegisterBlock) -> nb::Result<(), Infallible> {
    if rb.isr.bit(isr::TXBE) && rb.isr.bit(isr::TXSE) {
        Ok(())
    } else {
        Err(WouldBlock)
    }
}

/// Returns `true` if the TX buffer is empty, or false if it is full
pub(crate) fn uart_is_writable(rb: &RegisterBlock) -> bool {
    rb.isr.bit(isr::TXBE)
}

fn push(rb: &RegisterBlock, byte: u8) {
    // write one to clear, set again by hardware once this byte is out
    rb.isr.write(isr::TXSE.mask());
    rb.txbuf.write(byte as u32);
}

/// Writes bytes to the UART.
///
/// This function writes as long as it can. As soon as the TX buffer is full,
/// if:
/// - 0 bytes were written, a WouldBlock Error is returned
/// - some bytes were written, it is deemed to be a success
///
/// Upon success, the remaining (unwritten) slice is returned.
pub(crate) fn write_raw<'d>(
    rb: &RegisterBlock,
    data: &'d [u8],
) -> nb::Result<&'d [u8], Infallible> {
    let mut bytes_written = 0;

    for c in data {
        if !uart_is_writable(rb) {
            if bytes_written == 0 {
                return Err(WouldBlock);
            } else {
                return Ok(&data[bytes_written..]);
            }
        }

        push(rb, *c);

        bytes_written += 1;
    }
    Ok(&data[bytes_written..])
}

/// Writes bytes to the UART.
///
/// This function blocks until the full buffer has been sent.
pub(crate) fn write_full_blocking(rb: &RegisterBlock, data: &[u8]) {
    let mut temp = data;

    while !temp.is_empty() {
        temp = match write_raw(rb, temp) {
            Ok(remaining) => remaining,
            Err(WouldBlock) => continue,
            Err(Other(v)) => match v {},
        }
    }
}

/// Enables the Transmit Interrupt.
///
/// The relevant UARTx IRQ will fire when the shift register runs empty.
pub(crate) fn enable_tx_interrupt(rb: &RegisterBlock) {
    rb.ier.set_bits(ier::TXSEIE.mask());
}

/// Disables the Transmit Interrupt.
pub(crate) fn disable_tx_interrupt(rb: &RegisterBlock) {
    rb.ier.clear_bits(ier::TXSEIE.mask());
}

/// An interrupt driven transmission in progress.
///
/// Created by `start_send`, advanced by `on_tx_interrupt` from the UART
/// interrupt handler.
pub struct TxTransfer<'d> {
    data: &'d [u8],
    index: usize,
}

impl<'d> TxTransfer<'d> {
    /// Bytes handed to the UART so far.
    pub fn sent(&self) -> usize {
        self.index
    }

    /// Every byte was handed to the UART.
    pub fn is_done(&self) -> bool {
        self.index == self.data.len()
    }
}

pub(crate) fn start_send<'d>(rb: &RegisterBlock, data: &'d [u8]) -> TxTransfer<'d> {
    let mut transfer = TxTransfer { data, index: 0 };
    if let Some(&first) = data.first() {
        enable_tx_interrupt(rb);
        push(rb, first);
        transfer.index = 1;
    }
    transfer
}

/// Feeds the next byte. Returns `true` once the transfer is complete.
pub(crate) fn on_tx_interrupt(rb: &RegisterBlock, transfer: &mut TxTransfer<'_>) -> bool {
    if !rb.ier.bit(ier::TXSEIE) || !rb.isr.bit(isr::TXSE) {
        return false;
    }

    match transfer.data.get(transfer.index) {
        Some(&byte) => {
            push(rb, byte);
            transfer.index += 1;
            false
        }
        None => {
            rb.isr.write(isr::TXSE.mask());
            disable_tx_interrupt(rb);
            true
        }
    }
}

/// Half of an [`UartPeripheral`] that is only capable of writing. Obtained by calling [`UartPeripheral::split()`]
///
/// [`UartPeripheral`]: struct.UartPeripheral.html
/// [`UartPeripheral::split()`]: struct.UartPeripheral.html#method.split
pub struct Writer<D: UartDevice, P: ValidUartPinout<D>> {
    pub(super) device: D,
    pub(super) device_marker: PhantomData<D>,
    pub(super) pins: PhantomData<P>,
}

impl<D: UartDevice, P: ValidUartPinout<D>> Writer<D, P> {
    /// Writes bytes to the UART.
    ///
    /// This function writes as long as it can. As soon as the TX buffer is full,
    /// if:
    /// - 0 bytes were written, a WouldBlock Error is returned
    /// - some bytes were written, it is deemed to be a success
    ///
    /// Upon success, the remaining (unwritten) slice is returned.
    pub fn write_raw<'d>(&self, data: &'d [u8]) -> nb::Result<&'d [u8], Infallible> {
        write_raw(&self.device, data)
    }

    /// Writes bytes to the UART.
    ///
    /// This function blocks until the full buffer has been sent.
    pub fn write_full_blocking(&self, data: &[u8]) {
        write_full_blocking(&self.device, data);
    }

    /// Starts an interrupt driven transmission of `data`.
    ///
    /// The first byte is written immediately; call
    /// [`on_tx_interrupt`](Self::on_tx_interrupt) from the UART interrupt.
    pub fn start_send<'d>(&mut self, data: &'d [u8]) -> TxTransfer<'d> {
        start_send(&self.device, data)
    }

    /// Advances an interrupt driven transmission. Returns `true` once done.
    pub fn on_tx_interrupt(&mut self, transfer: &mut TxTransfer<'_>) -> bool {
        on_tx_interrupt(&self.device, transfer)
    }

    /// Enables the Transmit Interrupt.
    ///
    /// The relevant UARTx IRQ will fire when the shift register runs empty.
    pub fn enable_tx_interrupt(&mut self) {
        enable_tx_interrupt(&self.device)
    }

    /// Disables the Transmit Interrupt.
    pub fn disable_tx_interrupt(&mut self) {
        disable_tx_interrupt(&self.device)
    }
}

impl<D: UartDevice, P: ValidUartPinout<D>> eh0::Write<u8> for Writer<D, P> {
    type Error = Infallible;

    fn write(&mut self, word: u8) -> nb::Result<(), Self::Error> {
        if self.write_raw(&[word]).is_err() {
            Err(WouldBlock)
        } else {
            Ok(())
        }
    }

    fn flush(&mut self) -> nb::Result<(), Self::Error> {
        transmit_flushed(&self.device)
    }
}

impl<D: UartDevice, P: ValidUartPinout<D>> ErrorType for Writer<D, P> {
    type Error = core::convert::Infallible;
}

impl<D: UartDevice, P: ValidUartPinout<D>> Write<u8> for Writer<D, P> {
    fn write(&mut self, word: u8) -> nb::Result<(), Self::Error> {
        if self.write_raw(&[word]).is_err() {
            Err(WouldBlock)
        } else {
            Ok(())
        }
    }

    fn flush(&mut self) -> nb::Result<(), Self::Error> {
        transmit_flushed(&self.device).map_err(|e| match e {
            WouldBlock => WouldBlock,
            Other(v) => match v {},
        })
    }
}

impl<D: UartDevice, P: ValidUartPinout<D>> embedded_io::ErrorType for Writer<D, P> {
    type Error = Infallible;
}

impl<D: UartDevice, P: ValidUartPinout<D>> embedded_io::Write for Writer<D, P> {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        // Blocks if and only if no bytes can be written.
        let remaining = nb::block!(write_raw(&self.device, buf))?;
        Ok(buf.len() - remaining.len())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        nb::block!(transmit_flushed(&self.device))
    }
}

impl<D: UartDevice, P: ValidUartPinout<D>> fmt::Write for Writer<D, P> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        s.bytes()
            .try_for_each(|c| nb::block!(eh0::Write::write(self, c)))
            .map_err(|_| fmt::Error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block() -> RegisterBlock {
        unsafe { core::mem::zeroed() }
    }

    #[test]
    fn full_buffer_would_block() {
        let rb = block();
        assert!(matches!(write_raw(&rb, b"x"), Err(WouldBlock)));
        assert_eq!(rb.txbuf.read(), 0);
    }

    #[test]
    fn write_raw_fills_tx_buffer() {
        let rb = block();
        rb.isr.write(isr::TXBE.mask());
        let rest = write_raw(&rb, b"A");
        assert!(matches!(rest, Ok(r) if r.is_empty()));
        assert_eq!(rb.txbuf.read(), b'A' as u32);
    }

    #[test]
    fn flushed_needs_empty_shift_register() {
        let rb = block();
        rb.isr.write(isr::TXBE.mask());
        assert!(transmit_flushed(&rb).is_err());
        rb.isr.write(isr::TXBE.mask() | isr::TXSE.mask());
        assert!(transmit_flushed(&rb).is_ok());
    }

    #[test]
    fn interrupt_send_walks_the_buffer() {
        let rb = block();
        let data = b"hi!";
        let mut transfer = start_send(&rb, data);
        assert_eq!(transfer.sent(), 1);
        assert_eq!(rb.txbuf.read(), b'h' as u32);
        assert!(rb.ier.bit(ier::TXSEIE));

        // the shift-empty flag left set by `push` stands in for the hardware
        assert!(!on_tx_interrupt(&rb, &mut transfer));
        assert_eq!(rb.txbuf.read(), b'i' as u32);
        assert!(!on_tx_interrupt(&rb, &mut transfer));
        assert_eq!(rb.txbuf.read(), b'!' as u32);
        assert!(transfer.is_done());
        assert!(on_tx_interrupt(&rb, &mut transfer));
        assert!(!rb.ier.bit(ier::TXSEIE));
    }

    #[test]
    fn empty_send_is_done_immediately() {
        let rb = block();
        let transfer = start_send(&rb, &[]);
        assert!(transfer.is_done());
        assert_eq!(rb.ier.read(), 0);
    }

    #[test]
    fn interrupt_without_flag_is_ignored() {
        let rb = block();
        let mut transfer = start_send(&rb, b"ab");
        rb.isr.write(0);
        assert!(!on_tx_interrupt(&rb, &mut transfer));
        assert_eq!(transfer.sent(), 1);
    }
}
