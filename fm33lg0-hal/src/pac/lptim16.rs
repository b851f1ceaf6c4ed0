//! Low power 16-bit timer registers

use super::{Field, Reg};

/// Register block
#[repr(C)]
pub struct RegisterBlock {
    /// Configuration
    pub cfgr: Reg,
    /// Counter
    pub cnt: Reg,
    /// Capture/compare control and status
    pub ccsr: Reg,
    /// Auto-reload
    pub arr: Reg,
    /// Interrupt enable
    pub ier: Reg,
    /// Interrupt status
    pub isr: Reg,
    /// Control
    pub cr: Reg,
    _reserved0: Reg,
    /// Capture/compare channel 1
    pub ccr1: Reg,
    /// Capture/compare channel 2
    pub ccr2: Reg,
}

pub mod cfgr {
    use super::Field;
    /// Operation mode
    pub const TMODE: Field = Field::new(0, 2);
    /// One shot
    pub const ONST: Field = Field::bit(2);
    /// Quadrature encoder mode
    pub const QEMD: Field = Field::new(3, 2);
    /// ETR trigger edge
    pub const TRIGCFG: Field = Field::new(5, 2);
    /// ETR count edge (falling when set)
    pub const EDGESEL: Field = Field::bit(7);
    /// Prescaler, power of two
    pub const DIVSEL: Field = Field::new(10, 3);
    /// Prescaler input: ETR when set
    pub const PSCSEL: Field = Field::bit(14);
    /// Trigger output select
    pub const MMS: Field = Field::new(16, 3);
    /// ETR analog filter enable
    pub const ETR_AFEN: Field = Field::bit(24);
}

pub mod ccsr {
    use super::Field;

    /// Channel mode (disabled, input, output) of channel `n` (0 or 1)
    pub const fn ccs(n: u8) -> Field {
        Field::new(2 * n, 2)
    }
    /// Capture edge of channel `n`
    pub const fn capcfg(n: u8) -> Field {
        Field::new(8 + 2 * n, 2)
    }
    /// Digital input filter of channel `n`
    pub const fn filt(n: u8) -> Field {
        Field::bit(12 + n)
    }
    /// Input or output polarity of channel `n`
    pub const fn ccp(n: u8) -> Field {
        Field::bit(16 + n)
    }
    /// Edge of the last capture on channel `n`, set when falling
    pub const fn capedge(n: u8) -> Field {
        Field::bit(20 + n)
    }
    /// Channel 1 capture source
    pub const CAP1SSEL: Field = Field::new(24, 2);
    /// Channel 1 capture prescaler
    pub const CAP1PSC: Field = Field::new(26, 6);
}

pub mod cr {
    use super::Field;
    pub const EN: Field = Field::bit(0);
}

/// IER and ISR share their layout, ISR bits are write one to clear
pub mod isr {
    use super::Field;

    /// Capture/compare event of channel `n`
    pub const fn cc(n: u8) -> Field {
        Field::bit(n)
    }
    /// Counter overflow
    pub const OV: Field = Field::bit(6);
    /// External trigger
    pub const TRIG: Field = Field::bit(7);
    /// Capture overrun of channel `n`
    pub const fn ovr(n: u8) -> Field {
        Field::bit(8 + n)
    }
}
