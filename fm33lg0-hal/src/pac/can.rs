//! CAN controller registers

use super::{Field, Reg};

/// One message slot: identifier, length and two data words.
#[repr(C)]
pub struct Mailbox {
    /// Identifier
    pub id: Reg,
    /// Data length code
    pub dlc: Reg,
    /// Data bytes 0..3
    pub dw1: Reg,
    /// Data bytes 4..7
    pub dw2: Reg,
}

/// Acceptance filter mask and identifier pair.
#[repr(C)]
pub struct Filter {
    /// Mask
    pub afmr: Reg,
    /// Identifier
    pub afir: Reg,
}

/// Register block
#[repr(C)]
pub struct RegisterBlock {
    /// Software reset and enable
    pub cr: Reg,
    /// Mode select
    pub msr: Reg,
    /// Baud rate prescaler
    pub brpr: Reg,
    /// Bit timing
    pub btr: Reg,
    /// Error counters
    pub ecr: Reg,
    /// Error status, write one to clear
    pub esr: Reg,
    /// Status
    pub sr: Reg,
    /// Interrupt status
    pub isr: Reg,
    /// Interrupt enable
    pub ier: Reg,
    /// Interrupt clear
    pub icr: Reg,
    _reserved: [Reg; 2],
    /// Transmit FIFO
    pub txfifo: Mailbox,
    /// High priority transmit buffer
    pub hpb: Mailbox,
    /// Receive FIFO
    pub rxfifo: Mailbox,
    /// Acceptance filter enable
    pub afr: Reg,
    /// Acceptance filters 1..4
    pub filter: [Filter; 4],
}

pub mod cr {
    use super::Field;
    pub const SRST: Field = Field::bit(0);
    pub const CEN: Field = Field::bit(1);
}

pub mod msr {
    use super::Field;
    pub const LPBACK: Field = Field::bit(1);
}

pub mod brpr {
    use super::Field;
    pub const BRP: Field = Field::new(0, 8);
}

pub mod btr {
    use super::Field;
    /// Time segment 1 minus one
    pub const TS1: Field = Field::new(0, 4);
    /// Time segment 2 minus one
    pub const TS2: Field = Field::new(4, 3);
    /// Synchronization jump width minus one
    pub const SJW: Field = Field::new(7, 2);
}

pub mod ecr {
    use super::Field;
    pub const TEC: Field = Field::new(0, 8);
    pub const REC: Field = Field::new(8, 8);
}

pub mod esr {
    use super::Field;
    pub const CRCER: Field = Field::bit(0);
    pub const FMER: Field = Field::bit(1);
    pub const STER: Field = Field::bit(2);
    pub const BERR: Field = Field::bit(3);
    pub const ACKER: Field = Field::bit(4);
}

pub mod sr {
    use super::Field;
    pub const CONFIG: Field = Field::bit(0);
    pub const LBACK: Field = Field::bit(1);
    pub const NORMAL: Field = Field::bit(3);
    pub const BIDLE: Field = Field::bit(4);
    pub const BBSY: Field = Field::bit(5);
    pub const ERRWRN: Field = Field::bit(6);
    /// Error state: 1 active, 2 bus off, 3 passive
    pub const ESTAT: Field = Field::new(7, 2);
    /// Acceptance filter busy
    pub const ACFBSY: Field = Field::bit(11);
}

/// Bits shared by ISR, IER and ICR
pub mod int {
    use super::Field;
    /// Arbitration lost
    pub const ARBLST: Field = Field::bit(0);
    /// Transmission done
    pub const TXOK: Field = Field::bit(1);
    /// Transmit FIFO full
    pub const TXFLL: Field = Field::bit(2);
    /// High priority buffer full
    pub const TXBFLL: Field = Field::bit(3);
    /// Frame received
    pub const RXOK: Field = Field::bit(4);
    /// Receive FIFO underflow
    pub const RXUFLW: Field = Field::bit(5);
    /// Receive FIFO overflow
    pub const RXOFLW: Field = Field::bit(6);
    /// Receive FIFO not empty
    pub const RXNEMP: Field = Field::bit(7);
    /// Error
    pub const ERROR: Field = Field::bit(8);
    /// Bus off
    pub const BSOFF: Field = Field::bit(9);
}

/// Mailbox ID register fields, also the layout of AFMR and AFIR
pub mod id {
    use super::Field;
    /// Base identifier
    pub const ID11: Field = Field::new(0, 11);
    /// Substitute remote request, RTR of standard frames
    pub const SRR: Field = Field::bit(11);
    /// Identifier extension
    pub const IDE: Field = Field::bit(12);
    /// Identifier extension bits
    pub const ID18: Field = Field::new(13, 18);
    /// Remote transmission request (extended frames)
    pub const RTR: Field = Field::bit(31);
}

pub mod dlc {
    use super::Field;
    pub const DLC: Field = Field::new(0, 4);
}

pub mod afr {
    use super::Field;

    /// Enable bit of filter `n`.
    pub const fn uaf(n: u8) -> Field {
        Field::bit(n)
    }
}
