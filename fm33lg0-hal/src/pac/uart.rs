//! UART registers (UART0, UART1, UART3, UART4, UART5)

use super::{Field, Reg};

/// Register block
#[repr(C)]
pub struct RegisterBlock {
    /// Control and status
    pub csr: Reg,
    /// Interrupt enable
    pub ier: Reg,
    /// Interrupt status
    pub isr: Reg,
    /// Timeout and delay
    pub todr: Reg,
    /// Receive buffer
    pub rxbuf: Reg,
    /// Transmit buffer
    pub txbuf: Reg,
    /// Baud rate generator
    pub bgr: Reg,
}

/// CSR fields
pub mod csr {
    use super::Field;
    pub const TXEN: Field = Field::bit(0);
    pub const RXEN: Field = Field::bit(1);
    pub const RXPOL: Field = Field::bit(2);
    pub const TXPOL: Field = Field::bit(3);
    /// Parity: 0 none, 1 even, 2 odd
    pub const PARITY: Field = Field::new(4, 2);
    /// Data width: 0 7 bits, 1 8 bits, 2 9 bits, 3 6 bits
    pub const PDSEL: Field = Field::new(6, 2);
    /// Two stop bits
    pub const STOPCFG: Field = Field::bit(8);
    /// MSB first
    pub const BITORD: Field = Field::bit(9);
    pub const DMATXIFCFG: Field = Field::bit(10);
    pub const IOSWAP: Field = Field::bit(12);
    /// Receive timeout enable
    pub const RXTOEN: Field = Field::bit(16);
    /// Infrared modulation enable
    pub const TXIREN: Field = Field::bit(17);
    pub const BUSY: Field = Field::bit(24);
}

/// IER fields
pub mod ier {
    use super::Field;
    /// Transmit shift register empty
    pub const TXSEIE: Field = Field::bit(0);
    /// Transmit buffer empty
    pub const TXBEIE: Field = Field::bit(1);
    /// Receive buffer full
    pub const RXBFIE: Field = Field::bit(8);
    pub const NEWUPIE: Field = Field::bit(9);
    /// Receive error
    pub const RXERRIE: Field = Field::bit(10);
    /// Receive timeout
    pub const RXTOIE: Field = Field::bit(11);
}

/// ISR fields, write one to clear except RXBF and TXBE
pub mod isr {
    use super::Field;
    pub const TXSE: Field = Field::bit(0);
    pub const TXBE: Field = Field::bit(1);
    pub const RXBF: Field = Field::bit(8);
    pub const NEWKF: Field = Field::bit(9);
    pub const RXTO: Field = Field::bit(11);
    /// Overrun error
    pub const OERR: Field = Field::bit(16);
    /// Framing error
    pub const FERR: Field = Field::bit(17);
    /// Parity error
    pub const PERR: Field = Field::bit(18);
}

/// TODR fields
pub mod todr {
    use super::Field;
    /// Receive timeout, in bit times
    pub const RXTO_LEN: Field = Field::new(0, 8);
    /// Transmit delay, in bit times
    pub const TXDLY_LEN: Field = Field::new(8, 8);
}

pub mod rxbuf {
    use super::Field;
    pub const DATA: Field = Field::new(0, 9);
}

pub mod bgr {
    use super::Field;
    pub const BGR: Field = Field::new(0, 16);
}
