//! Volatile register cells and bit fields
//!
//! Every peripheral register is a [`Reg`]; its bit fields are [`Field`]
//! constants declared next to the register block. The accessors map one to
//! one onto the classic `READ_REG`, `WRITE_REG`, `SET_BIT`, `CLEAR_BIT`,
//! `READ_BIT` and `MODIFY_REG` operations.

use vcell::VolatileCell;

/// A 32-bit memory mapped register.
#[repr(transparent)]
pub struct Reg(VolatileCell<u32>);

impl Reg {
    /// Reads the whole register.
    #[inline(always)]
    pub fn read(&self) -> u32 {
        self.0.get()
    }

    /// Writes the whole register.
    #[inline(always)]
    pub fn write(&self, value: u32) {
        self.0.set(value)
    }

    /// Read-modify-write.
    #[inline(always)]
    pub fn modify<F: FnOnce(u32) -> u32>(&self, f: F) {
        self.write(f(self.read()))
    }

    /// Sets every bit of `mask`.
    #[inline(always)]
    pub fn set_bits(&self, mask: u32) {
        self.modify(|r| r | mask)
    }

    /// Clears every bit of `mask`.
    #[inline(always)]
    pub fn clear_bits(&self, mask: u32) {
        self.modify(|r| r & !mask)
    }

    /// True if every bit of `mask` is set.
    #[inline(always)]
    pub fn is_set(&self, mask: u32) -> bool {
        self.read() & mask == mask
    }

    /// Reads `field`, shifted down to bit 0.
    #[inline(always)]
    pub fn read_field(&self, field: Field) -> u32 {
        field.get(self.read())
    }

    /// Replaces `field` with `value`, leaving the other bits untouched.
    #[inline(always)]
    pub fn write_field(&self, field: Field, value: u32) {
        self.modify(|r| field.set(r, value))
    }

    /// Sets or clears a single bit field.
    #[inline(always)]
    pub fn write_bit(&self, field: Field, value: bool) {
        self.write_field(field, value as u32)
    }

    /// True if a single bit field is set.
    #[inline(always)]
    pub fn bit(&self, field: Field) -> bool {
        self.read() & field.mask() != 0
    }
}

/// Position and width of a bit field inside a register.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Field {
    /// Position of the least significant bit.
    pub pos: u8,
    /// Width in bits.
    pub width: u8,
}

impl Field {
    /// A field of `width` bits starting at `pos`.
    pub const fn new(pos: u8, width: u8) -> Field {
        Field { pos, width }
    }

    /// A single bit at `pos`.
    pub const fn bit(pos: u8) -> Field {
        Field { pos, width: 1 }
    }

    /// In-place mask of the field.
    pub const fn mask(self) -> u32 {
        (((1u64 << self.width) - 1) << self.pos) as u32
    }

    /// `value` shifted into place and truncated to the field width.
    pub const fn val(self, value: u32) -> u32 {
        (value << self.pos) & self.mask()
    }

    /// Extracts the field from a register value.
    pub const fn get(self, reg: u32) -> u32 {
        (reg & self.mask()) >> self.pos
    }

    /// Replaces the field inside a register value.
    pub const fn set(self, reg: u32, value: u32) -> u32 {
        (reg & !self.mask()) | self.val(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_masks() {
        assert_eq!(Field::bit(0).mask(), 0x1);
        assert_eq!(Field::new(16, 2).mask(), 0x3 << 16);
        assert_eq!(Field::new(0, 32).mask(), 0xFFFF_FFFF);
        assert_eq!(Field::new(16, 7).val(0xFF), 0x7F << 16);
    }

    #[test]
    fn register_accessors() {
        let reg = Reg(VolatileCell::new(0));
        reg.set_bits(0b1010);
        assert!(reg.is_set(0b1000));
        assert!(!reg.is_set(0b0101));

        reg.write_field(Field::new(8, 4), 0x5);
        assert_eq!(reg.read(), 0x50A);
        assert_eq!(reg.read_field(Field::new(8, 4)), 0x5);

        reg.clear_bits(0b0010);
        assert_eq!(reg.read(), 0x508);

        reg.write_bit(Field::bit(31), true);
        assert!(reg.bit(Field::bit(31)));
        reg.write(0);
        assert_eq!(reg.read(), 0);
    }
}
