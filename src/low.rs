//! Low-level GPIO building blocks used by the typed API in the crate root.
//!
//! This module defines the platform-facing seam of the crate:
//!
//! - [`Board`] describes one board: where its GPIO block lives in physical
//!   memory and which header pin sits on which register bit.
//! - [`register::GpioRegisters`] is a byte-addressed window onto the GPIO
//!   register block. [`crate::mem::MemoryMapping`] is the real one,
//!   [`crate::sim::SimulatedRegisters`] an in-memory stand-in.
//! - [`io::Gpio`] wraps a window and implements the pin operations on top of
//!   it: read/write a pin bit, set direction, pull mode and drive strength.
//!
//! Safety notes:
//! - A `GpioRegisters` implementation must only touch the bytes it was asked
//!   for and must use volatile accesses so every read and write reaches the
//!   hardware in program order.
//! - Nothing here is synchronized. Another process can map the same page and
//!   race the read-modify-write sequences below; callers that share a port
//!   with other writers must serialize externally.

use crate::error::Result;
use crate::mem::MemoryMapping;
use crate::pinmap::{PinDescriptor, PinMap, SysfsPinId};

/// Description of a board's GPIO hardware.
///
/// The access layers never name a board; they are handed descriptors looked
/// up here. Supporting a different pinout means adding another `Board`
/// implementation with its own table.
pub trait Board {
    /// Human readable board name, used in log output.
    const NAME: &'static str;

    /// Physical address of the GPIO register block.
    const GPIO_BASE: u64;

    /// Device node giving access to physical memory.
    const MEM_DEVICE: &'static str = "/dev/mem";

    /// The board's pin table.
    fn pins() -> PinMap<'static>;

    /// Map this board's GPIO block and return a handle over it.
    ///
    /// This default implementation calls [`MemoryMapping::open_at`] with
    /// `MEM_DEVICE` and `GPIO_BASE`.
    fn open() -> Result<io::Gpio<MemoryMapping>> {
        log::debug!("opening GPIO registers of {}", Self::NAME);
        MemoryMapping::open_at(Self::MEM_DEVICE, Self::GPIO_BASE).map(io::Gpio::new)
    }

    fn lookup(name: &str) -> Result<PinDescriptor> {
        Self::pins().lookup(name)
    }

    fn lookup_sysfs(name: &str) -> Result<SysfsPinId> {
        Self::pins().lookup_sysfs(name)
    }
}

/// Register-level trait describing the window a [`io::Gpio`] operates on.
///
/// Offsets are byte offsets relative to the GPIO base address.
pub mod register {
    use crate::error::Result;

    /// Byte access to a GPIO register block.
    ///
    /// # Safety
    ///
    /// Implementers must bounds-check every offset against [`len`] and
    /// return [`crate::Error::OffsetOutOfRange`] instead of touching memory
    /// outside the window. After [`close`] every access must fail with
    /// [`crate::Error::MappingClosed`].
    ///
    /// [`len`]: GpioRegisters::len
    /// [`close`]: GpioRegisters::close
    pub unsafe trait GpioRegisters {
        /// Number of addressable bytes from the GPIO base.
        fn len(&self) -> usize;

        fn read_byte(&self, offset: usize) -> Result<u8>;

        fn write_byte(&mut self, offset: usize, value: u8) -> Result<()>;

        /// Release the window. A second call fails with `MappingClosed`.
        fn close(&mut self) -> Result<()>;
    }
}

/// Pin operations on top of a register window.
pub mod io {
    use std::thread;
    use std::time::Duration;

    use super::register::GpioRegisters;
    use crate::error::Result;
    use crate::field::{RegisterField, apply_bit};
    use crate::pinmap::PinDescriptor;
    use crate::{Direction, DriveStrength, Input, Io, Level, Output, PullMode};

    /// Delay after a direction or pull change before the next state change on
    /// a pin in the same register byte is guaranteed to observe it.
    ///
    /// A CON/UPD update can take several hundred clock cycles to show up in
    /// the DAT register. If another pin in the same byte is written before
    /// then, its read-modify-write picks up the stale byte and undoes the
    /// change. [`Gpio::settle`] waits this long; nothing waits implicitly.
    pub const CONFIG_SETTLE_DELAY: Duration = Duration::from_millis(5);

    /// Handle to a GPIO register window.
    ///
    /// All bit updates are read-modify-write sequences on a single byte. They
    /// are not atomic: a concurrent writer of the same byte (another process
    /// mapping the same page) can lose updates. No lock is taken, because any
    /// locking would change the toggle timing callers measure.
    pub struct Gpio<R: GpioRegisters> {
        registers: R,
        settle_delay: Duration,
    }

    impl<R> Gpio<R>
    where
        R: GpioRegisters,
    {
        /// Wrap `registers` with the default settle delay.
        pub fn new(registers: R) -> Self {
            Self {
                registers,
                settle_delay: CONFIG_SETTLE_DELAY,
            }
        }

        /// Override the delay used by [`Gpio::settle`].
        pub fn with_settle_delay(mut self, delay: Duration) -> Self {
            self.settle_delay = delay;
            self
        }

        /// Delay [`Gpio::settle`] blocks for.
        #[inline]
        pub fn settle_delay(&self) -> Duration {
            self.settle_delay
        }

        /// Block for the settle delay. Call this between a configuration
        /// change and the next write to a pin sharing the same register byte.
        pub fn settle(&self) {
            thread::sleep(self.settle_delay);
        }

        /// The underlying register window.
        pub fn registers(&self) -> &R {
            &self.registers
        }

        /// Mutable access to the underlying register window.
        pub fn registers_mut(&mut self) -> &mut R {
            &mut self.registers
        }

        /// Give back the register window without closing it.
        pub fn into_inner(self) -> R {
            self.registers
        }

        /// Release the underlying window. Later calls fail with
        /// [`crate::Error::MappingClosed`].
        pub fn close(&mut self) -> Result<()> {
            self.registers.close()
        }

        /// Raw byte at `offset` from the GPIO base.
        pub fn read_register(&self, offset: usize) -> Result<u8> {
            self.registers.read_byte(offset)
        }

        /// Current level of the pin's DAT bit.
        #[inline]
        pub fn read_bit(&self, pin: &PinDescriptor) -> Result<Level> {
            self.read_field(pin.data_field()).map(Level::from_bit)
        }

        /// Set or clear the pin's DAT bit, leaving the other seven bits of the
        /// byte as they were read.
        #[inline]
        pub fn write_bit(&mut self, pin: &PinDescriptor, level: Level) -> Result<()> {
            let field = pin.data_field();
            let offset = field.byte_offset();
            let byte = self.registers.read_byte(offset)?;
            self.registers.write_byte(offset, apply_bit(byte, field.bit_offset(), level))
        }

        /// Flip the pin `count` times in each direction as fast as possible.
        ///
        /// The two byte images are computed once from the current DAT value
        /// and then written alternately, so any change made to the other bits
        /// of the byte while toggling is overwritten. The pin ends at its
        /// starting level.
        pub fn toggle(&mut self, pin: &PinDescriptor, count: usize) -> Result<()> {
            let field = pin.data_field();
            let offset = field.byte_offset();
            let restored = self.registers.read_byte(offset)?;
            let flipped = restored ^ field.mask();
            for _ in 0..count {
                self.registers.write_byte(offset, flipped)?;
                self.registers.write_byte(offset, restored)?;
            }
            Ok(())
        }

        /// Set the pin's pull mode and direction.
        ///
        /// Only the pin's own CON nibble and UPD pair are modified. See
        /// [`CONFIG_SETTLE_DELAY`] before writing a neighbouring pin.
        pub fn configure_pin(
            &mut self,
            pin: &PinDescriptor,
            pull: PullMode,
            direction: Direction,
        ) -> Result<()> {
            self.set_direction(pin, direction)?;
            self.set_pull_mode(pin, pull)
        }

        /// Write the pin's CON nibble.
        pub fn set_direction(&mut self, pin: &PinDescriptor, direction: Direction) -> Result<()> {
            self.update_field(pin.function_field(), direction.bits())
        }

        /// Write the pin's UPD pair.
        pub fn set_pull_mode(&mut self, pin: &PinDescriptor, pull: PullMode) -> Result<()> {
            self.update_field(pin.pull_field(), pull.bits())
        }

        /// Write the pin's DRV pair.
        pub fn set_drive_strength(
            &mut self,
            pin: &PinDescriptor,
            strength: DriveStrength,
        ) -> Result<()> {
            self.update_field(pin.drive_field(), strength.bits())
        }

        /// Configured direction, or `None` when the CON nibble selects an
        /// alternate function.
        pub fn direction(&self, pin: &PinDescriptor) -> Result<Option<Direction>> {
            self.read_field(pin.function_field()).map(Direction::from_bits)
        }

        /// Configured pull mode, or `None` for the reserved `0b11` encoding.
        pub fn pull_mode(&self, pin: &PinDescriptor) -> Result<Option<PullMode>> {
            self.read_field(pin.pull_field()).map(PullMode::from_bits)
        }

        /// Configured drive strength. Every encoding is valid.
        pub fn drive_strength(&self, pin: &PinDescriptor) -> Result<DriveStrength> {
            self.read_field(pin.drive_field()).map(DriveStrength::from_bits)
        }

        /// Configure `pin` as an input and return a typed handle to it.
        pub fn input(&mut self, pin: PinDescriptor, pull: PullMode) -> Result<Io<'_, R, Input>> {
            Io::init(self, pin, pull)
        }

        /// Configure `pin` as an output and return a typed handle to it.
        ///
        /// Pull resistors waste current on a driven pin; pass
        /// [`PullMode::Disabled`] unless there is a reason not to.
        pub fn output(&mut self, pin: PinDescriptor, pull: PullMode) -> Result<Io<'_, R, Output>> {
            Io::init(self, pin, pull)
        }

        fn read_field(&self, field: RegisterField) -> Result<u8> {
            let byte = self.registers.read_byte(field.byte_offset())?;
            Ok(field.extract(byte))
        }

        fn update_field(&mut self, field: RegisterField, value: u8) -> Result<()> {
            let offset = field.byte_offset();
            let byte = self.registers.read_byte(offset)?;
            let updated = field.insert(byte, value);
            log::trace!("register {offset:#06x}: {byte:#04x} -> {updated:#04x}");
            self.registers.write_byte(offset, updated)
        }
    }
}
