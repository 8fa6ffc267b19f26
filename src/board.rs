//! Board pinouts.

use crate::low::Board;
use crate::pinmap::{PinEntry, PinMap};

/// Hardkernel ODROID-X and ODROID-X2 (Exynos 4412), expansion header pins.
///
/// Ports used by the header (DAT register offsets from the GPIO base):
/// GPF0 `0x184`, GPF1 `0x1a4`, GPF2 `0x1c4`, GPF3 `0x1e4`.
pub struct OdroidX;

static ODROID_X_PINS: [PinEntry; 28] = [
    PinEntry::new("pin17", 112, 0x01c4, 7),
    PinEntry::new("pin18", 115, 0x01e4, 1),
    PinEntry::new("pin19", 93, 0x0184, 6),
    PinEntry::new("pin20", 100, 0x01a4, 4),
    PinEntry::new("pin21", 108, 0x01c4, 3),
    PinEntry::new("pin22", 91, 0x0184, 4),
    PinEntry::new("pin23", 90, 0x0184, 3),
    PinEntry::new("pin24", 99, 0x01a4, 3),
    PinEntry::new("pin25", 111, 0x01c4, 6),
    PinEntry::new("pin26", 103, 0x01a4, 7),
    PinEntry::new("pin27", 88, 0x0184, 1),
    PinEntry::new("pin28", 98, 0x01a4, 2),
    PinEntry::new("pin29", 89, 0x0184, 2),
    PinEntry::new("pin30", 114, 0x01e4, 0),
    PinEntry::new("pin31", 87, 0x0184, 0),
    PinEntry::new("pin33", 94, 0x0184, 7),
    PinEntry::new("pin34", 105, 0x01c4, 0),
    PinEntry::new("pin35", 97, 0x01a4, 1),
    PinEntry::new("pin36", 102, 0x01a4, 6),
    PinEntry::new("pin37", 107, 0x01c4, 2),
    PinEntry::new("pin38", 110, 0x01c4, 5),
    PinEntry::new("pin39", 101, 0x01a4, 5),
    PinEntry::new("pin40", 117, 0x01e4, 3),
    PinEntry::new("pin41", 92, 0x0184, 5),
    PinEntry::new("pin42", 96, 0x01a4, 0),
    PinEntry::new("pin43", 116, 0x01e4, 2),
    PinEntry::new("pin44", 106, 0x01c4, 1),
    PinEntry::new("pin45", 109, 0x01c4, 4),
];

impl Board for OdroidX {
    const NAME: &'static str = "ODROID-X";
    const GPIO_BASE: u64 = 0x1140_0000;

    fn pins() -> PinMap<'static> {
        PinMap::new(&ODROID_X_PINS)
    }
}
