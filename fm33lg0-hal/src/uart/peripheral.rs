//! Universal Asynchronous Receiver Transmitter - Bi-directional Peripheral Code
//!
//! This module brings together `uart::reader` and `uart::writer` to give a
//! UartPeripheral object that can both read and write.

use core::{convert::Infallible, fmt};
use embedded_hal_0_2::serial as eh0;
use fugit::HertzU32;
use nb::Error::{Other, WouldBlock};

use crate::{
    cmu::{self, Clocks, UartClockSource},
    pac::{self, uart::csr, uart::RegisterBlock, Peripherals, UART0, UART1, UART3, UART4, UART5},
    uart::*,
};

use embedded_hal_nb::serial::{ErrorType, Read, Write};

/// An UART Peripheral based on an underlying UART device.
pub struct UartPeripheral<S: State, D: UartDevice, P: ValidUartPinout<D>> {
    device: D,
    _state: S,
    pins: P,
    config: UartConfig,
    read_error: Option<ReadErrorType>,
}

impl<S: State, D: UartDevice, P: ValidUartPinout<D>> UartPeripheral<S, D, P> {
    fn transition<To: State>(self, state: To) -> UartPeripheral<To, D, P> {
        UartPeripheral {
            device: self.device,
            pins: self.pins,
            config: self.config,
            _state: state,
            read_error: None,
        }
    }

    /// Releases the underlying device and pins.
    pub fn free(self) -> (D, P) {
        (self.device, self.pins)
    }
}

impl<D: UartDevice, P: ValidUartPinout<D>> UartPeripheral<Disabled, D, P> {
    /// Creates an UartPeripheral in Disabled state.
    ///
    /// The UART is pulsed through reset and its clocks are enabled.
    pub fn new(
        device: D,
        pins: P,
        rmu: &mut pac::RMU,
        cmu: &mut pac::CMU,
    ) -> UartPeripheral<Disabled, D, P> {
        device.reset_bring_down(rmu);
        device.reset_bring_up(rmu);
        device.enable_clock(cmu);

        UartPeripheral {
            device,
            _state: Disabled,
            pins,
            config: UartConfig::default(),
            read_error: None,
        }
    }

    /// Enables the provided UART device with the given configuration.
    ///
    /// `source` selects the operation clock of UART0 and UART1. The other
    /// UARTs only run from the APB clock.
    pub fn enable(
        self,
        config: UartConfig,
        source: UartClockSource,
        clocks: &Clocks,
        cmu: &mut pac::CMU,
    ) -> Result<UartPeripheral<Enabled, D, P>, Error> {
        if !D::OPERATION_CLOCK && source != UartClockSource::Apb {
            return Err(Error::UnsupportedClockSource);
        }
        let frequency = clocks
            .uart_kernel(source)
            .ok_or(Error::UnsupportedClockSource)?;

        if D::OPERATION_CLOCK {
            cmu::select_uart_source(cmu, D::ID == 1, source);
        }

        let (device, pins) = (self.device, self.pins);
        configure(&device, &config, frequency, P::TX, P::RX)?;

        Ok(UartPeripheral {
            device,
            pins,
            config,
            _state: Enabled,
            read_error: None,
        })
    }
}

impl<D: UartDevice, P: ValidUartPinout<D>> UartPeripheral<Enabled, D, P> {
    /// Disable this UART Peripheral, falling back to the Disabled state.
    pub fn disable(self) -> UartPeripheral<Disabled, D, P> {
        // Disable the UART, both TX and RX, and every interrupt source
        self.device
            .csr
            .clear_bits(csr::TXEN.mask() | csr::RXEN.mask());
        self.device.ier.write(0);

        self.transition(Disabled)
    }

    /// The configuration this UART was enabled with.
    pub fn config(&self) -> &UartConfig {
        &self.config
    }

    /// Enables the Receive Interrupt.
    ///
    /// The relevant UARTx IRQ will fire for every received byte.
    pub fn enable_rx_interrupt(&mut self) {
        super::reader::enable_rx_interrupt(&self.device)
    }

    /// Enables the Transmit Interrupt.
    ///
    /// The relevant UARTx IRQ will fire when the shift register runs empty.
    pub fn enable_tx_interrupt(&mut self) {
        super::writer::enable_tx_interrupt(&self.device)
    }

    /// Disables the Receive Interrupt.
    pub fn disable_rx_interrupt(&mut self) {
        super::reader::disable_rx_interrupt(&self.device)
    }

    /// Disables the Transmit Interrupt.
    pub fn disable_tx_interrupt(&mut self) {
        super::writer::disable_tx_interrupt(&self.device)
    }

    /// Is there space in the UART TX buffer for new data to be written?
    pub fn uart_is_writable(&self) -> bool {
        super::writer::uart_is_writable(&self.device)
    }

    /// Is the UART still busy transmitting data?
    pub fn uart_is_busy(&self) -> bool {
        self.device.csr.bit(csr::BUSY)
    }

    /// Is there data in the UART RX buffer ready to be read?
    pub fn uart_is_readable(&self) -> bool {
        super::reader::is_readable(&self.device)
    }

    /// Writes bytes to the UART.
    /// This function writes as long as it can. As soon as the TX buffer is full, if :
    /// - 0 bytes were written, a WouldBlock Error is returned
    /// - some bytes were written, it is deemed to be a success
    ///
    /// Upon success, the remaining slice is returned.
    pub fn write_raw<'d>(&self, data: &'d [u8]) -> nb::Result<&'d [u8], Infallible> {
        super::writer::write_raw(&self.device, data)
    }

    /// Reads bytes from the UART.
    /// This function reads as long as it can. As soon as the RX buffer is empty, if :
    /// - 0 bytes were read, a WouldBlock Error is returned
    /// - some bytes were read, it is deemed to be a success
    ///
    /// Upon success, it will return how many bytes were read.
    pub fn read_raw<'b>(&self, buffer: &'b mut [u8]) -> nb::Result<usize, ReadError<'b>> {
        super::reader::read_raw(&self.device, buffer)
    }

    /// Writes bytes to the UART.
    ///
    /// This function blocks until the full buffer has been sent.
    pub fn write_full_blocking(&self, data: &[u8]) {
        super::writer::write_full_blocking(&self.device, data);
    }

    /// Reads bytes from the UART.
    ///
    /// This function blocks until the full buffer has been received.
    pub fn read_full_blocking(&self, buffer: &mut [u8]) -> Result<(), ReadErrorType> {
        super::reader::read_full_blocking(&self.device, buffer)
    }

    /// Starts an interrupt driven transmission of `data`.
    pub fn start_send<'d>(&mut self, data: &'d [u8]) -> TxTransfer<'d> {
        super::writer::start_send(&self.device, data)
    }

    /// Advances an interrupt driven transmission from the UART interrupt.
    /// Returns `true` once the last byte went out.
    pub fn on_tx_interrupt(&mut self, transfer: &mut TxTransfer<'_>) -> bool {
        super::writer::on_tx_interrupt(&self.device, transfer)
    }

    /// Join the reader and writer halves together back into the original Uart peripheral.
    ///
    /// A reader/writer pair can be obtained by calling [`split`].
    ///
    /// [`split`]: #method.split
    pub fn join(reader: Reader<D, P>, writer: Writer<D, P>) -> Self {
        let _ = writer;
        Self {
            device: reader.device,
            _state: Enabled,
            pins: reader.pins,
            config: reader.config,
            read_error: reader.read_error,
        }
    }
}

macro_rules! split {
    ($($UART:ident),+) => {
        $(
            impl<P: ValidUartPinout<$UART>> UartPeripheral<Enabled, $UART, P> {
                /// Split this peripheral into a separate reader and writer.
                pub fn split(self) -> (Reader<$UART, P>, Writer<$UART, P>) {
                    let reader = Reader {
                        device: self.device,
                        pins: self.pins,
                        config: self.config,
                        read_error: self.read_error,
                    };
                    // Safety: reader and writer will never write to the same address
                    let device_copy = unsafe { Peripherals::steal().$UART };
                    let writer = Writer {
                        device: device_copy,
                        device_marker: core::marker::PhantomData,
                        pins: core::marker::PhantomData,
                    };
                    (reader, writer)
                }
            }
        )+
    };
}

split!(UART0, UART1, UART3, UART4, UART5);

/// The baud rate generator counts `BGR + 1` operation clock cycles per bit.
pub(crate) fn calculate_bgr(wanted_baudrate: HertzU32, frequency: HertzU32) -> Result<u16, Error> {
    let div = frequency
        .to_Hz()
        .checked_div(wanted_baudrate.to_Hz())
        .ok_or(Error::BadArgument)?;

    match div {
        0 => Err(Error::BadArgument),
        d => u16::try_from(d - 1).map_err(|_| Error::BadArgument),
    }
}

fn format_bits(config: &UartConfig) -> u32 {
    let parity = match config.parity {
        None => 0,
        Some(Parity::Even) => 1,
        Some(Parity::Odd) => 2,
    };
    let width = match config.data_bits {
        DataBits::Seven => 0,
        DataBits::Eight => 1,
        DataBits::Nine => 2,
        DataBits::Six => 3,
    };
    let stop = match config.stop_bits {
        StopBits::One => 0,
        StopBits::Two => 1,
    };
    csr::PARITY.val(parity) | csr::PDSEL.val(width) | csr::STOPCFG.val(stop)
}

pub(crate) fn configure(
    rb: &RegisterBlock,
    config: &UartConfig,
    frequency: HertzU32,
    tx: bool,
    rx: bool,
) -> Result<(), Error> {
    let bgr = calculate_bgr(config.baudrate, frequency)?;

    rb.csr.write(0);
    rb.bgr.write(bgr as u32);
    rb.csr.write(format_bits(config) | csr::TXEN.val(tx as u32) | csr::RXEN.val(rx as u32));

    Ok(())
}

impl<D: UartDevice, P: ValidUartPinout<D>> eh0::Read<u8> for UartPeripheral<Enabled, D, P> {
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

impl<D: UartDevice, P: ValidUartPinout<D>> ErrorType for UartPeripheral<Enabled, D, P> {
    type Error = ReadErrorType;
}

impl<D: UartDevice, P: ValidUartPinout<D>> Read<u8> for UartPeripheral<Enabled, D, P> {
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

impl<D: UartDevice, P: ValidUartPinout<D>> eh0::Write<u8> for UartPeripheral<Enabled, D, P> {
    type Error = Infallible;

    fn write(&mut self, word: u8) -> nb::Result<(), Self::Error> {
        if self.write_raw(&[word]).is_err() {
            Err(WouldBlock)
        } else {
            Ok(())
        }
    }

    fn flush(&mut self) -> nb::Result<(), Self::Error> {
        super::writer::transmit_flushed(&self.device)
    }
}

impl<D: UartDevice, P: ValidUartPinout<D>> Write<u8> for UartPeripheral<Enabled, D, P> {
    fn write(&mut self, word: u8) -> nb::Result<(), Self::Error> {
        if self.write_raw(&[word]).is_err() {
            Err(WouldBlock)
        } else {
            Ok(())
        }
    }

    fn flush(&mut self) -> nb::Result<(), Self::Error> {
        super::writer::transmit_flushed(&self.device).map_err(|e| match e {
            WouldBlock => WouldBlock,
            Other(v) => match v {},
        })
    }
}

impl<D: UartDevice, P: ValidUartPinout<D>> fmt::Write for UartPeripheral<Enabled, D, P> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        s.bytes()
            .try_for_each(|c| nb::block!(eh0::Write::write(self, c)))
            .map_err(|_| fmt::Error)
    }
}

impl embedded_io::Error for ReadErrorType {
    fn kind(&self) -> embedded_io::ErrorKind {
        embedded_io::ErrorKind::Other
    }
}

impl<D: UartDevice, P: ValidUartPinout<D>> embedded_io::ErrorType
    for UartPeripheral<Enabled, D, P>
{
    type Error = ReadErrorType;
}

impl<D: UartDevice, P: ValidUartPinout<D>> embedded_io::Read for UartPeripheral<Enabled, D, P> {
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

impl<D: UartDevice, P: ValidUartPinout<D>> embedded_io::ReadReady
    for UartPeripheral<Enabled, D, P>
{
    fn read_ready(&mut self) -> Result<bool, Self::Error> {
        Ok(self.uart_is_readable() || self.read_error.is_some())
    }
}

impl<D: UartDevice, P: ValidUartPinout<D>> embedded_io::Write for UartPeripheral<Enabled, D, P> {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        // Blocks if and only if no bytes can be written.
        let remaining = match nb::block!(super::writer::write_raw(&self.device, buf)) {
            Ok(remaining) => remaining,
            Err(v) => match v {},
        };
        Ok(buf.len() - remaining.len())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        match nb::block!(super::writer::transmit_flushed(&self.device)) {
            Ok(()) => Ok(()),
            Err(v) => match v {},
        }
    }
}

impl<D: UartDevice, P: ValidUartPinout<D>> embedded_io::WriteReady
    for UartPeripheral<Enabled, D, P>
{
    fn write_ready(&mut self) -> Result<bool, Self::Error> {
        Ok(self.uart_is_writable())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fugit::RateExtU32;

    fn block() -> RegisterBlock {
        unsafe { core::mem::zeroed() }
    }

    #[test]
    fn bgr_from_clock() {
        assert_eq!(calculate_bgr(115_200.Hz(), 8.MHz()), Ok(68));
        assert_eq!(calculate_bgr(9600.Hz(), 24.MHz()), Ok(2499));
    }

    #[test]
    fn bgr_out_of_range() {
        assert_eq!(calculate_bgr(0.Hz(), 8.MHz()), Err(Error::BadArgument));
        assert_eq!(calculate_bgr(9600.Hz(), 4800.Hz()), Err(Error::BadArgument));
        assert_eq!(calculate_bgr(300.Hz(), 64.MHz()), Err(Error::BadArgument));
    }

    #[test]
    fn configure_8n1() {
        let rb = block();
        let config = UartConfig::default();
        configure(&rb, &config, 16.MHz(), true, true).unwrap();
        assert_eq!(rb.bgr.read(), 16_000_000 / 115_200 - 1);
        let csr_value = rb.csr.read();
        assert_eq!(csr::PDSEL.get(csr_value), 1);
        assert_eq!(csr::PARITY.get(csr_value), 0);
        assert_eq!(csr::STOPCFG.get(csr_value), 0);
        assert!(rb.csr.bit(csr::TXEN));
        assert!(rb.csr.bit(csr::RXEN));
    }

    #[test]
    fn format_odd_parity_two_stop_nine_bits() {
        let config = UartConfig::new(9600.Hz(), DataBits::Nine, Some(Parity::Odd), StopBits::Two);
        let bits = format_bits(&config);
        assert_eq!(csr::PARITY.get(bits), 2);
        assert_eq!(csr::PDSEL.get(bits), 2);
        assert_eq!(csr::STOPCFG.get(bits), 1);
    }

    #[test]
    fn six_bit_frames_use_last_width_code() {
        let config = UartConfig::new(9600.Hz(), DataBits::Six, Some(Parity::Even), StopBits::One);
        let bits = format_bits(&config);
        assert_eq!(csr::PDSEL.get(bits), 3);
        assert_eq!(csr::PARITY.get(bits), 1);
    }

    #[test]
    fn rejected_baudrate_leaves_uart_untouched() {
        let rb = block();
        rb.csr.write(csr::TXEN.mask());
        let config = UartConfig::new(0.Hz(), DataBits::Eight, None, StopBits::One);
        assert_eq!(configure(&rb, &config, 8.MHz(), true, true), Err(Error::BadArgument));
        assert_eq!(rb.csr.read(), csr::TXEN.mask());
    }
}
