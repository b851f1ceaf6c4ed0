//! Universal Asynchronous Receiver Transmitter - Receiver Code
//!
//! This module is for receiving data with a UART.

use super::{UartConfig, UartDevice, ValidUartPinout};
use crate::pac::uart::{ier, isr, rxbuf, RegisterBlock};
use embedded_hal_0_2::serial as eh0;
use embedded_hal_nb::serial::{ErrorType, Read};
use nb::Error::*;

/// When there's a read error.
pub struct ReadError<'err> {
    /// The type of error
    pub err_type: ReadErrorType,

    /// Reference to the data that was read but eventually discarded because of the error.
    pub discarded: &'err [u8],
}

/// Possible types of read errors, as latched in the interrupt status register.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ReadErrorType {
    /// Triggered when a byte arrived before the previous one was read.
    Overrun,

    /// Triggered when there is a parity mismatch between what's received and our settings.
    Parity,

    /// Triggered when the received character didn't have a valid stop bit.
    Framing,
}

impl embedded_hal_nb::serial::Error for ReadErrorType {
    fn kind(&self) -> embedded_hal_nb::serial::ErrorKind {
        match self {
            ReadErrorType::Overrun => embedded_hal_nb::serial::ErrorKind::Overrun,
            ReadErrorType::Parity => embedded_hal_nb::serial::ErrorKind::Parity,
            ReadErrorType::Framing => embedded_hal_nb::serial::ErrorKind::FrameFormat,
        }
    }
}

const ERROR_FLAGS: u32 = isr::OERR.mask() | isr::FERR.mask() | isr::PERR.mask();

pub(crate) fn is_readable(rb: &RegisterBlock) -> bool {
    rb.isr.bit(isr::RXBF)
}

/// Enables the Receive Interrupt.
///
/// The relevant UARTx IRQ will fire for every received byte.
pub(crate) fn enable_rx_interrupt(rb: &RegisterBlock) {
    rb.ier.set_bits(ier::RXBFIE.mask());
}

/// Disables the Receive Interrupt.
pub(crate) fn disable_rx_interrupt(rb: &RegisterBlock) {
    rb.ier.clear_bits(ier::RXBFIE.mask());
}

/// Pops one byte, reporting a latched line error instead of the data.
pub(crate) fn read_byte(rb: &RegisterBlock) -> Result<u8, ReadErrorType> {
    let status = rb.isr.read();
    // reading the buffer releases RXBF, even for a corrupted byte
    let data = rb.rxbuf.read_field(rxbuf::DATA) as u8;

    if status & ERROR_FLAGS == 0 {
        return Ok(data);
    }

    // write one to clear
    rb.isr.write(status & ERROR_FLAGS);

    Err(if status & isr::OERR.mask() != 0 {
        ReadErrorType::Overrun
    } else if status & isr::PERR.mask() != 0 {
        ReadErrorType::Parity
    } else {
        ReadErrorType::Framing
    })
}

pub(crate) fn read_raw<'b>(
    rb: &RegisterBlock,
    buffer: &'b mut [u8],
) -> nb::Result<usize, ReadError<'b>> {
    let mut bytes_read = 0;

    Ok(loop {
        if !is_readable(rb) {
            if bytes_read == 0 {
                return Err(WouldBlock);
            } else {
                break bytes_read;
            }
        }

        if bytes_read < buffer.len() {
            match read_byte(rb) {
                Ok(byte) => buffer[bytes_read] = byte,
                Err(err_type) => {
                    return Err(Other(ReadError {
                        err_type,
                        discarded: &buffer[..bytes_read],
                    }));
                }
            }
            bytes_read += 1;
        } else {
            break bytes_read;
        }
    })
}

pub(crate) fn read_full_blocking(
    rb: &RegisterBlock,
    buffer: &mut [u8],
) -> Result<(), ReadErrorType> {
    let mut offset = 0;

    while offset != buffer.len() {
        offset += match read_raw(rb, &mut buffer[offset..]) {
            Ok(bytes_read) => bytes_read,
            Err(e) => match e {
                Other(inner) => return Err(inner.err_type),
                WouldBlock => continue,
            },
        }
    }

    Ok(())
}

/// Half of an [`UartPeripheral`] that is only capable of reading. Obtained by calling [`UartPeripheral::split()`]
///
/// [`UartPeripheral`]: struct.UartPeripheral.html
/// [`UartPeripheral::split()`]: struct.UartPeripheral.html#method.split
pub struct Reader<D: UartDevice, P: ValidUartPinout<D>> {
    pub(super) device: D,
    pub(super) pins: P,
    pub(super) config: UartConfig,
    pub(super) read_error: Option<ReadErrorType>,
}

impl<D: UartDevice, P: ValidUartPinout<D>> Reader<D, P> {
    /// The configuration the UART was enabled with.
    pub fn config(&self) -> &UartConfig {
        &self.config
    }

    /// Reads bytes from the UART.
    /// This function reads as long as it can. As soon as the receive buffer is empty, if :
    /// - 0 bytes were read, a WouldBlock Error is returned
    /// - some bytes were read, it is deemed to be a success
    ///
    /// Upon success, it will return how many bytes were read.
    pub fn read_raw<'b>(&self, buffer: &'b mut [u8]) -> nb::Result<usize, ReadError<'b>> {
        read_raw(&self.device, buffer)
    }

    /// Reads bytes from the UART.
    /// This function blocks until the full buffer has been received.
    pub fn read_full_blocking(&self, buffer: &mut [u8]) -> Result<(), ReadErrorType> {
        read_full_blocking(&self.device, buffer)
    }

    /// Enables the Receive Interrupt.
    ///
    /// The relevant UARTx IRQ will fire for every received byte.
    pub fn enable_rx_interrupt(&mut self) {
        enable_rx_interrupt(&self.device)
    }

    /// Disables the Receive Interrupt.
    pub fn disable_rx_interrupt(&mut self) {
        disable_rx_interrupt(&self.device)
    }
}

impl<D: UartDevice, P: ValidUartPinout<D>> embedded_io::ErrorType for Reader<D, P> {
    type Error = ReadErrorType;
}

impl<D: UartDevice, P: ValidUartPinout<D>> embedded_io::Read for Reader<D, P> {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        // If the last read stored an error, report it now
        if let Some(err) = self.read_error.take() {
            return Err(err);
        }
        match nb::block!(self.read_raw(buf)) {
            Ok(bytes_read) => Ok(bytes_read),
            Err(err) if !err.discarded.is_empty() => {
                // If an error was reported but some bytes were already read,
                // return the data now and store the error for the next
                // invocation.
                self.read_error = Some(err.err_type);
                Ok(err.discarded.len())
            }
            Err(err) => Err(err.err_type),
        }
    }
}

impl<D: UartDevice, P: ValidUartPinout<D>> eh0::Read<u8> for Reader<D, P> {
    type Error = ReadErrorType;

    fn read(&mut self) -> nb::Result<u8, Self::Error> {
        let byte: &mut [u8] = &mut [0; 1];

        match self.read_raw(byte) {
            Ok(_) => Ok(byte[0]),
            Err(e) => match e {
                Other(inner) => Err(Other(inner.err_type)),
                WouldBlock => Err(WouldBlock),
            },
        }
    }
}

impl<D: UartDevice, P: ValidUartPinout<D>> ErrorType for Reader<D, P> {
    type Error = ReadErrorType;
}

impl<D: UartDevice, P: ValidUartPinout<D>> Read<u8> for Reader<D, P> {
    fn read(&mut self) -> nb::Result<u8, Self::Error> {
        let byte: &mut [u8] = &mut [0; 1];

        match self.read_raw(byte) {
            Ok(_) => Ok(byte[0]),
            Err(e) => match e {
                Other(inner) => Err(Other(inner.err_type)),
                WouldBlock => Err(WouldBlock),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block() -> RegisterBlock {
        unsafe { core::mem::zeroed() }
    }

    #[test]
    fn empty_receiver_would_block() {
        let rb = block();
        let mut buf = [0u8; 4];
        assert!(matches!(read_raw(&rb, &mut buf), Err(WouldBlock)));
    }

    #[test]
    fn reads_until_buffer_full() {
        let rb = block();
        rb.isr.write(isr::RXBF.mask());
        rb.rxbuf.write(0x1A5);
        let mut buf = [0u8; 3];
        // the flag never drops in RAM, so the whole buffer fills
        assert!(matches!(read_raw(&rb, &mut buf), Ok(3)));
        assert_eq!(buf, [0xA5; 3]);
    }

    #[test]
    fn parity_error_is_reported_and_cleared() {
        let rb = block();
        rb.isr.write(isr::RXBF.mask() | isr::PERR.mask() | isr::TXBE.mask());
        assert_eq!(read_byte(&rb), Err(ReadErrorType::Parity));
        // only the error flag is written back
        assert_eq!(rb.isr.read(), isr::PERR.mask());
    }

    #[test]
    fn overrun_wins_over_framing() {
        let rb = block();
        rb.isr.write(isr::RXBF.mask() | isr::OERR.mask() | isr::FERR.mask());
        assert_eq!(read_byte(&rb), Err(ReadErrorType::Overrun));
    }

    #[test]
    fn rx_interrupt_enable() {
        let rb = block();
        enable_rx_interrupt(&rb);
        assert_eq!(rb.ier.read(), ier::RXBFIE.mask());
        disable_rx_interrupt(&rb);
        assert_eq!(rb.ier.read(), 0);
    }
}
