//! Bit fields packed into single register bytes.
//!
//! The Exynos GPIO banks pack several pins into every control byte: one bit
//! per pin in DAT, a 4-bit nibble per pin in CON and 2 bits per pin in UPD and
//! DRV. A [`RegisterField`] names exactly the bits that belong to one pin, so
//! every update can be expressed as "clear my mask, or in my value" and
//! sibling pins are never touched.

use crate::Level;

/// A `bit_width`-wide field starting at `bit_offset` inside the register
/// byte at `byte_offset` (relative to the GPIO base).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RegisterField {
    byte_offset: usize,
    bit_offset: u8,
    bit_width: u8,
}

impl RegisterField {
    /// # Panics
    ///
    /// Panics if the field is empty or does not fit in one byte. In a `const`
    /// context this is a compile error.
    pub const fn new(byte_offset: usize, bit_offset: u8, bit_width: u8) -> Self {
        assert!(bit_width > 0, "register field must be at least one bit wide");
        assert!(
            bit_offset as u32 + bit_width as u32 <= 8,
            "register field must fit in one byte"
        );
        Self {
            byte_offset,
            bit_offset,
            bit_width,
        }
    }

    #[inline]
    pub const fn byte_offset(&self) -> usize {
        self.byte_offset
    }

    #[inline]
    pub const fn bit_offset(&self) -> u8 {
        self.bit_offset
    }

    #[inline]
    pub const fn bit_width(&self) -> u8 {
        self.bit_width
    }

    /// Mask of the bits owned by this field within its byte.
    #[inline]
    pub const fn mask(&self) -> u8 {
        (((1u16 << self.bit_width) - 1) << self.bit_offset) as u8
    }

    /// Right-aligned value of this field in `byte`.
    #[inline]
    pub const fn extract(&self, byte: u8) -> u8 {
        (byte & self.mask()) >> self.bit_offset
    }

    /// `byte` with this field replaced by `value`. Bits of `value` wider than
    /// the field are dropped; bits outside the mask are returned unchanged.
    #[inline]
    pub const fn insert(&self, byte: u8, value: u8) -> u8 {
        let mask = self.mask();
        (byte & !mask) | ((((value as u16) << self.bit_offset) as u8) & mask)
    }
}

/// Sets or clears a single bit of `byte`, leaving the other seven alone.
///
/// This is the update applied by a data register write: `High` ORs in
/// `1 << bit`, `Low` ANDs with its complement.
#[inline]
pub const fn apply_bit(byte: u8, bit: u8, level: Level) -> u8 {
    let mask = 1u8 << bit;
    match level {
        Level::High => byte | mask,
        Level::Low => byte & !mask,
    }
}
