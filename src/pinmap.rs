//! Pin name lookup tables.
//!
//! A [`PinMap`] is plain data: a slice of [`PinEntry`] rows tying a header
//! pin name to its sysfs line and its register location. Boards supply the
//! table (see [`crate::board`]); nothing here knows about a particular SoC.

use crate::error::{Error, Result};
use crate::field::RegisterField;

/// Size of the mapped register window.
pub const WINDOW_SIZE: usize = 4096;

/// CON sits this many bytes below the DAT register of the same port.
const CON_BELOW_DAT: usize = 4;
/// UPD sits this many bytes above DAT.
const UPD_ABOVE_DAT: usize = 4;
/// DRV sits this many bytes above DAT.
const DRV_ABOVE_DAT: usize = 8;

/// Location of one pin's bit in a port data register.
///
/// `register_offset` is the DAT register of the pin's port, relative to the
/// GPIO base address. The CON, UPD and DRV registers of the same port are
/// derived from it, so the offset must leave room for all of them inside the
/// window.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PinDescriptor {
    register_offset: u16,
    bit_index: u8,
}

impl PinDescriptor {
    /// # Panics
    ///
    /// Panics if `bit_index >= 8` or the port's registers would not fit in
    /// the window. Descriptors built in a `const` table fail to compile
    /// instead.
    pub const fn new(register_offset: u16, bit_index: u8) -> Self {
        assert!(bit_index < 8, "bit index must be below 8");
        assert!(
            register_offset as usize >= CON_BELOW_DAT,
            "no room for the CON register below DAT"
        );
        // DRV spans two bytes for an 8-pin port.
        assert!(
            register_offset as usize + DRV_ABOVE_DAT + 2 <= WINDOW_SIZE,
            "port registers must fit in the mapped window"
        );
        Self {
            register_offset,
            bit_index,
        }
    }

    #[inline]
    pub const fn register_offset(&self) -> u16 {
        self.register_offset
    }

    #[inline]
    pub const fn bit_index(&self) -> u8 {
        self.bit_index
    }

    /// The pin's level bit in DAT.
    pub const fn data_field(&self) -> RegisterField {
        RegisterField::new(self.register_offset as usize, self.bit_index, 1)
    }

    /// The pin's function nibble in CON: two pins per byte, even pins in the
    /// low nibble.
    pub const fn function_field(&self) -> RegisterField {
        let bit = self.bit_index as usize;
        RegisterField::new(
            self.register_offset as usize - CON_BELOW_DAT + bit / 2,
            (self.bit_index % 2) * 4,
            4,
        )
    }

    /// The pin's pull-up/down pair in UPD: four pins per byte.
    pub const fn pull_field(&self) -> RegisterField {
        let bit = self.bit_index as usize;
        RegisterField::new(
            self.register_offset as usize + UPD_ABOVE_DAT + bit / 4,
            (self.bit_index % 4) * 2,
            2,
        )
    }

    /// The pin's drive-strength pair in DRV: four pins per byte.
    pub const fn drive_field(&self) -> RegisterField {
        let bit = self.bit_index as usize;
        RegisterField::new(
            self.register_offset as usize + DRV_ABOVE_DAT + bit / 4,
            (self.bit_index % 4) * 2,
            2,
        )
    }
}

/// Kernel GPIO line number, as used under `/sys/class/gpio/gpio<N>`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SysfsPinId {
    line: u32,
}

impl SysfsPinId {
    pub const fn new(line: u32) -> Self {
        Self { line }
    }

    #[inline]
    pub const fn line(&self) -> u32 {
        self.line
    }
}

/// One row of a pin table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PinEntry {
    pub name: &'static str,
    pub sysfs: SysfsPinId,
    pub register: PinDescriptor,
}

impl PinEntry {
    pub const fn new(name: &'static str, line: u32, register_offset: u16, bit_index: u8) -> Self {
        Self {
            name,
            sysfs: SysfsPinId::new(line),
            register: PinDescriptor::new(register_offset, bit_index),
        }
    }
}

/// An immutable pin table.
///
/// Header pins that carry power, ground or reserved functions are simply
/// absent; looking them up is an [`Error::UnknownPin`], never a default.
#[derive(Clone, Copy, Debug)]
pub struct PinMap<'a> {
    entries: &'a [PinEntry],
}

impl<'a> PinMap<'a> {
    pub const fn new(entries: &'a [PinEntry]) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &'a [PinEntry] {
        self.entries
    }

    pub fn entry(&self, name: &str) -> Result<&'a PinEntry> {
        self.entries
            .iter()
            .find(|entry| entry.name == name)
            .ok_or_else(|| Error::UnknownPin {
                name: name.to_owned(),
            })
    }

    /// Register location of `name`.
    pub fn lookup(&self, name: &str) -> Result<PinDescriptor> {
        self.entry(name).map(|entry| entry.register)
    }

    /// Sysfs line of `name`.
    pub fn lookup_sysfs(&self, name: &str) -> Result<SysfsPinId> {
        self.entry(name).map(|entry| entry.sysfs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: &[PinEntry] = &[
        PinEntry::new("pin27", 88, 0x0184, 1),
        PinEntry::new("pin31", 87, 0x0184, 0),
    ];

    #[test]
    fn lookup_hits() {
        let map = PinMap::new(TABLE);
        assert_eq!(map.lookup("pin27").unwrap(), PinDescriptor::new(0x0184, 1));
        assert_eq!(map.lookup_sysfs("pin31").unwrap().line(), 87);
    }

    #[test]
    fn lookup_miss_is_unknown_pin() {
        let map = PinMap::new(TABLE);
        match map.lookup("pin99") {
            Err(Error::UnknownPin { name }) => assert_eq!(name, "pin99"),
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(map.lookup_sysfs("pin99"), Err(Error::UnknownPin { .. })));
    }

    #[test]
    fn derived_fields_follow_port_layout() {
        // GPF0: CON 0x180, DAT 0x184, UPD 0x188, DRV 0x18c
        let pin = PinDescriptor::new(0x0184, 5);
        assert_eq!(pin.data_field(), RegisterField::new(0x184, 5, 1));
        assert_eq!(pin.function_field(), RegisterField::new(0x182, 4, 4));
        assert_eq!(pin.pull_field(), RegisterField::new(0x189, 2, 2));
        assert_eq!(pin.drive_field(), RegisterField::new(0x18d, 2, 2));

        let pin = PinDescriptor::new(0x0184, 0);
        assert_eq!(pin.function_field(), RegisterField::new(0x180, 0, 4));
        assert_eq!(pin.pull_field(), RegisterField::new(0x188, 0, 2));
    }

    #[test]
    #[should_panic]
    fn bit_index_eight_is_rejected() {
        let _ = PinDescriptor::new(0x0184, 8);
    }

    #[test]
    #[should_panic]
    fn offset_past_window_is_rejected() {
        let _ = PinDescriptor::new(0x0ff8, 0);
    }
}
