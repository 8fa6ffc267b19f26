//! odroid-gpio — GPIO pin control for the ODROID-X/X2 from Linux user space.
//!
//! Two access paths are provided:
//!
//! - **Registers**: the GPIO register page is mapped from `/dev/mem` and pins
//!   are driven by flipping bits in it ([`Board::open`], [`Gpio`]). Fast
//!   (MHz toggle rates) but needs root.
//! - **sysfs**: lines are exported and driven through `/sys/class/gpio`
//!   ([`SysfsGpio`]). Slow but available to any user allowed to write there.
//!
//! Pins are named by header position (`"pin27"`) and resolved through the
//! board's pin table ([`OdroidX`]).
//!
//! # Timing hazards
//!
//! Register updates are plain read-modify-write cycles on one byte. After a
//! direction or pull change, wait [`CONFIG_SETTLE_DELAY`] (see
//! [`Gpio::settle`]) before writing another pin of the same port, or the stale
//! byte may be written back. Through sysfs, a `1` can read back as `0` for
//! about [`VALUE_READBACK_SETTLE`]. Neither delay is applied for you.
//!
//! Example (simulated)
//! The example below runs against [`SimulatedRegisters`] instead of a real
//! mapping and shows the typical configure/settle/write sequence.
#![doc = include_str!("../doc/simulated_example.md")]

mod low;

pub mod board;
pub mod error;
pub mod field;
pub mod mem;
pub mod pinmap;
pub mod sim;
pub mod sysfs;

use core::marker::PhantomData;

pub use board::OdroidX;
pub use error::{Error, Result};
pub use low::{
    Board,
    io::{CONFIG_SETTLE_DELAY, Gpio},
    register::GpioRegisters,
};
pub use mem::MemoryMapping;
pub use pinmap::{PinDescriptor, PinEntry, PinMap, SysfsPinId};
pub use sim::SimulatedRegisters;
pub use sysfs::{SysfsGpio, SysfsPin, VALUE_READBACK_SETTLE};

mod private {
    // Sealed trait to prevent external implementations of `Mode`.
    pub trait Sealed {}
    impl Sealed for super::Input {}
    impl Sealed for super::Output {}
}

use self::private::Sealed;

/// Trait implemented by the typed direction markers (`Input`, `Output`).
///
/// This trait is sealed; [`Io`] relies on there being exactly these two.
pub trait Mode: Sealed {
    /// Direction written to the pin's CON nibble when the handle is created.
    const DIRECTION: Direction;
}

/// Logical level of a GPIO pin.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Level {
    /// Logical low / 0.
    Low,
    /// Logical high / 1.
    High,
}

impl Level {
    /// `0` is low, anything else high.
    #[inline]
    pub const fn from_bit(bit: u8) -> Self {
        if bit == 0 { Level::Low } else { Level::High }
    }

    /// `0` for low, `1` for high.
    #[inline]
    pub const fn bit(self) -> u8 {
        match self {
            Level::Low => 0,
            Level::High => 1,
        }
    }
}

impl From<bool> for Level {
    fn from(high: bool) -> Self {
        if high { Level::High } else { Level::Low }
    }
}

impl core::ops::Not for Level {
    type Output = Level;

    fn not(self) -> Level {
        match self {
            Level::Low => Level::High,
            Level::High => Level::Low,
        }
    }
}

/// Direction for a single GPIO pin.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Configure the pin as input.
    Input,
    /// Configure the pin as output.
    Output,
}

impl Direction {
    /// CON nibble encoding.
    pub const fn bits(self) -> u8 {
        match self {
            Direction::Input => 0b0000,
            Direction::Output => 0b0001,
        }
    }

    /// `None` for the alternate-function encodings.
    pub const fn from_bits(bits: u8) -> Option<Self> {
        match bits {
            0b0000 => Some(Direction::Input),
            0b0001 => Some(Direction::Output),
            _ => None,
        }
    }
}

/// Internal pull resistor setting.
///
/// An input left unconnected with pulls disabled floats and leaks current;
/// a driven output should have pulls disabled.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PullMode {
    /// No pull resistor; the pin floats when undriven.
    Disabled,
    /// Weak pull towards ground.
    PullDown,
    /// Weak pull towards the supply.
    PullUp,
}

impl PullMode {
    /// UPD pair encoding.
    pub const fn bits(self) -> u8 {
        match self {
            PullMode::Disabled => 0b00,
            PullMode::PullDown => 0b01,
            PullMode::PullUp => 0b10,
        }
    }

    /// `None` for the reserved `0b11` encoding.
    pub const fn from_bits(bits: u8) -> Option<Self> {
        match bits {
            0b00 => Some(PullMode::Disabled),
            0b01 => Some(PullMode::PullDown),
            0b10 => Some(PullMode::PullUp),
            _ => None,
        }
    }
}

/// Output driver strength. Register access only; sysfs cannot set it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DriveStrength {
    /// Lowest drive current, the reset default.
    X1,
    /// Twice the 1x current.
    X2,
    /// Three times the 1x current.
    X3,
    /// Highest drive current.
    X4,
}

impl DriveStrength {
    /// DRV pair encoding. Note 2x and 3x are bit-reversed.
    pub const fn bits(self) -> u8 {
        match self {
            DriveStrength::X1 => 0b00,
            DriveStrength::X2 => 0b10,
            DriveStrength::X3 => 0b01,
            DriveStrength::X4 => 0b11,
        }
    }

    /// Only the low two bits are looked at.
    pub const fn from_bits(bits: u8) -> Self {
        match bits & 0b11 {
            0b00 => DriveStrength::X1,
            0b10 => DriveStrength::X2,
            0b01 => DriveStrength::X3,
            _ => DriveStrength::X4,
        }
    }
}

/// Typed pin handle borrowed from a [`Gpio`].
///
/// Generic parameters:
/// - `R`: register window implementing `GpioRegisters`.
/// - `M`: direction marker type (`Input` or `Output`).
pub struct Io<'g, R, M>
where
    R: GpioRegisters,
{
    gpio: &'g mut Gpio<R>,
    pin: PinDescriptor,
    mode: PhantomData<fn() -> M>,
}

/// Marker type for an input pin.
pub struct Input;
/// Marker type for an output pin.
pub struct Output;

impl Mode for Input {
    const DIRECTION: Direction = Direction::Input;
}
impl Mode for Output {
    const DIRECTION: Direction = Direction::Output;
}

impl<'g, R, M> Io<'g, R, M>
where
    R: GpioRegisters,
    M: Mode,
{
    /// Configure `pin` for direction `M` with the given pull mode.
    pub fn init(gpio: &'g mut Gpio<R>, pin: PinDescriptor, pull: PullMode) -> Result<Self> {
        gpio.configure_pin(&pin, pull, M::DIRECTION)?;
        Ok(Self {
            gpio,
            pin,
            mode: PhantomData,
        })
    }

    /// Register location of the pin this handle drives.
    pub fn descriptor(&self) -> PinDescriptor {
        self.pin
    }

    /// Change the pin's pull resistor without touching its direction.
    pub fn set_pull_mode(&mut self, pull: PullMode) -> Result<()> {
        self.gpio.set_pull_mode(&self.pin, pull)
    }

    /// Wait out the configuration settle delay of the parent [`Gpio`].
    pub fn settle(&self) {
        self.gpio.settle();
    }
}

impl<R> Io<'_, R, Input>
where
    R: GpioRegisters,
{
    /// Read the current logical level of the pin.
    pub fn read(&self) -> Result<Level> {
        self.gpio.read_bit(&self.pin)
    }
}

impl<R> Io<'_, R, Output>
where
    R: GpioRegisters,
{
    /// Write a logical level to the pin.
    #[inline]
    pub fn write(&mut self, level: Level) -> Result<()> {
        self.gpio.write_bit(&self.pin, level)
    }

    /// Drive the pin low.
    #[inline]
    pub fn set_low(&mut self) -> Result<()> {
        self.write(Level::Low)
    }

    /// Drive the pin high.
    #[inline]
    pub fn set_high(&mut self) -> Result<()> {
        self.write(Level::High)
    }

    /// Level currently latched in the data register.
    pub fn level(&self) -> Result<Level> {
        self.gpio.read_bit(&self.pin)
    }

    /// Flip the pin `count` times in each direction. See [`Gpio::toggle`].
    pub fn toggle(&mut self, count: usize) -> Result<()> {
        self.gpio.toggle(&self.pin, count)
    }

    /// Set the output driver strength.
    pub fn set_drive_strength(&mut self, strength: DriveStrength) -> Result<()> {
        self.gpio.set_drive_strength(&self.pin, strength)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodings_round_trip() {
        for d in [Direction::Input, Direction::Output] {
            assert_eq!(Direction::from_bits(d.bits()), Some(d));
        }
        for p in [PullMode::Disabled, PullMode::PullDown, PullMode::PullUp] {
            assert_eq!(PullMode::from_bits(p.bits()), Some(p));
        }
        for s in [
            DriveStrength::X1,
            DriveStrength::X2,
            DriveStrength::X3,
            DriveStrength::X4,
        ] {
            assert_eq!(DriveStrength::from_bits(s.bits()), s);
        }
        assert_eq!(PullMode::from_bits(0b11), None);
    }

    #[test]
    fn level_conversions() {
        assert_eq!(Level::from(true), Level::High);
        assert_eq!(Level::from_bit(0), Level::Low);
        assert_eq!(Level::from_bit(1).bit(), 1);
        assert_eq!(!Level::Low, Level::High);
    }

    #[test]
    fn typed_output_pin() {
        let mut gpio = Gpio::new(SimulatedRegisters::new());
        let pin = OdroidX::lookup("pin27").unwrap();
        {
            let mut out = gpio.output(pin, PullMode::Disabled).unwrap();
            out.set_high().unwrap();
            assert_eq!(out.level().unwrap(), Level::High);
            out.set_drive_strength(DriveStrength::X4).unwrap();
            out.set_low().unwrap();
            assert_eq!(out.level().unwrap(), Level::Low);
        }
        assert_eq!(gpio.direction(&pin).unwrap(), Some(Direction::Output));
        assert_eq!(gpio.drive_strength(&pin).unwrap(), DriveStrength::X4);
    }

    #[test]
    fn typed_input_pin() {
        let mut gpio = Gpio::new(SimulatedRegisters::new());
        let pin = OdroidX::lookup("pin22").unwrap();
        gpio.registers_mut().set_byte(0x184, 1 << 4);
        let input = gpio.input(pin, PullMode::PullUp).unwrap();
        assert_eq!(input.read().unwrap(), Level::High);
        drop(input);
        assert_eq!(gpio.pull_mode(&pin).unwrap(), Some(PullMode::PullUp));
    }
}
