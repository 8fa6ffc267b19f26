//! In-memory register window.
//!
//! Behaves like a mapped GPIO page without hardware side effects: writes
//! stick, there is no settle time, and `close` is enforced the same way as
//! on a real mapping. Useful for testing code written against
//! [`crate::GpioRegisters`].

use crate::error::{Error, Result};
use crate::low::register::GpioRegisters;
use crate::pinmap::WINDOW_SIZE;

#[derive(Clone, Debug)]
pub struct SimulatedRegisters {
    bytes: Option<Box<[u8]>>,
    writes: u64,
}

impl SimulatedRegisters {
    /// A zeroed window of [`WINDOW_SIZE`] bytes.
    pub fn new() -> Self {
        Self::filled(0)
    }

    pub fn filled(value: u8) -> Self {
        Self {
            bytes: Some(vec![value; WINDOW_SIZE].into_boxed_slice()),
            writes: 0,
        }
    }

    /// Byte at `offset`, bypassing the write counter and close state.
    ///
    /// # Panics
    ///
    /// Panics if the window is closed or `offset` is out of range.
    pub fn byte(&self, offset: usize) -> u8 {
        self.bytes.as_ref().expect("simulated window is closed")[offset]
    }

    /// Preload a byte without counting it as a write.
    ///
    /// # Panics
    ///
    /// Panics if the window is closed or `offset` is out of range.
    pub fn set_byte(&mut self, offset: usize, value: u8) {
        self.bytes.as_mut().expect("simulated window is closed")[offset] = value;
    }

    /// Number of `write_byte` calls so far.
    pub fn writes(&self) -> u64 {
        self.writes
    }

    pub fn is_closed(&self) -> bool {
        self.bytes.is_none()
    }

    fn slot(&self, offset: usize) -> Result<usize> {
        let bytes = self.bytes.as_ref().ok_or(Error::MappingClosed)?;
        if offset < bytes.len() {
            Ok(offset)
        } else {
            Err(Error::OffsetOutOfRange {
                offset,
                len: bytes.len(),
            })
        }
    }
}

impl Default for SimulatedRegisters {
    fn default() -> Self {
        Self::new()
    }
}

// SAFETY: all accesses go through `slot`, which checks the close state and
// the bounds of the backing slice.
unsafe impl GpioRegisters for SimulatedRegisters {
    fn len(&self) -> usize {
        self.bytes.as_ref().map_or(0, |bytes| bytes.len())
    }

    fn read_byte(&self, offset: usize) -> Result<u8> {
        let offset = self.slot(offset)?;
        Ok(self.byte(offset))
    }

    fn write_byte(&mut self, offset: usize, value: u8) -> Result<()> {
        let offset = self.slot(offset)?;
        self.set_byte(offset, value);
        self.writes += 1;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.bytes.take().map(drop).ok_or(Error::MappingClosed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_range_offset_is_an_error() {
        let mut regs = SimulatedRegisters::new();
        assert!(matches!(
            regs.read_byte(WINDOW_SIZE),
            Err(Error::OffsetOutOfRange { offset: WINDOW_SIZE, len: WINDOW_SIZE })
        ));
        assert!(regs.write_byte(WINDOW_SIZE + 7, 1).is_err());
        assert_eq!(regs.writes(), 0);
    }

    #[test]
    fn close_is_once_only() {
        let mut regs = SimulatedRegisters::filled(0x33);
        assert_eq!(regs.read_byte(10).unwrap(), 0x33);
        regs.close().unwrap();
        assert!(regs.is_closed());
        assert_eq!(regs.len(), 0);
        assert!(matches!(regs.read_byte(10), Err(Error::MappingClosed)));
        assert!(matches!(regs.write_byte(10, 0), Err(Error::MappingClosed)));
        assert!(matches!(regs.close(), Err(Error::MappingClosed)));
    }
}
