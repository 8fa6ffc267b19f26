//! Error type shared by the register and sysfs access paths.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Everything that can go wrong while talking to the GPIO hardware.
///
/// Register-path and sysfs-path failures are kept apart so a caller can
/// still tell an export refusal from a pin that was never exported.
#[derive(Error, Debug)]
pub enum Error {
    /// The physical memory device could not be opened or mapped. Opening
    /// `/dev/mem` normally requires root.
    #[error("cannot {operation} {}", .device.display())]
    Mapping {
        device: PathBuf,
        operation: &'static str,
        #[source]
        source: io::Error,
    },
    #[error("failed to unmap the GPIO register window")]
    Unmap(#[source] io::Error),
    /// The register window was already released with `close`.
    #[error("register window used after close")]
    MappingClosed,
    #[error("register offset {offset:#06x} is outside the {len}-byte window")]
    OffsetOutOfRange { offset: usize, len: usize },
    /// The kernel refused to export a GPIO line.
    #[error("cannot export gpio{line}")]
    Export {
        line: u32,
        #[source]
        source: io::Error,
    },
    /// The line's control node is missing, i.e. the pin was never exported.
    #[error("gpio{line} is not set up (missing {})", .node.display())]
    PinNotConfigured {
        line: u32,
        node: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("I/O error on {}", .path.display())]
    Sysfs {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("unexpected content {content:?} in {}", .path.display())]
    InvalidValue { path: PathBuf, content: String },
    /// Lookup miss in the board's pin table.
    #[error("unknown pin {name:?}")]
    UnknownPin { name: String },
}

pub type Result<T> = core::result::Result<T, Error>;
