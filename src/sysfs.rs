//! GPIO access through the legacy sysfs interface.
//!
//! Each operation opens the control node it needs, does one read or write and
//! closes it again, so no file handle outlives the call. This is orders of
//! magnitude slower than the register path but needs no access to
//! `/dev/mem`.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Error, Result};
use crate::pinmap::SysfsPinId;
use crate::{Direction, Level};

/// Default location of the sysfs GPIO class.
pub const SYSFS_GPIO_ROOT: &str = "/sys/class/gpio";

/// Time after writing `1` to a value node during which reading it back may
/// still return `0`.
///
/// This is observed hardware behavior. [`SysfsGpio::get_value`] does not
/// hide it; callers verifying their own writes should wait at least this long.
pub const VALUE_READBACK_SETTLE: Duration = Duration::from_micros(100);

/// Handle to a sysfs GPIO class directory.
#[derive(Clone, Debug)]
pub struct SysfsGpio {
    root: PathBuf,
}

impl Default for SysfsGpio {
    fn default() -> Self {
        Self::new()
    }
}

impl SysfsGpio {
    pub fn new() -> Self {
        Self::with_root(SYSFS_GPIO_ROOT)
    }

    /// Use a different class directory, e.g. a fake tree in tests.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `<root>/gpio<N>`
    pub fn line_dir(&self, pin: SysfsPinId) -> PathBuf {
        self.root.join(format!("gpio{}", pin.line()))
    }

    pub fn is_exported(&self, pin: SysfsPinId) -> bool {
        self.line_dir(pin).is_dir()
    }

    /// Make sure `gpio<N>` exists, asking the kernel to export it if not.
    ///
    /// Returns `true` if this call did the export, `false` if the line was
    /// already exported.
    pub fn export_pin(&self, pin: SysfsPinId) -> Result<bool> {
        if self.is_exported(pin) {
            return Ok(false);
        }
        log::debug!("exporting gpio{}", pin.line());
        let line = pin.line();
        write_node(&self.root.join("export"), &line.to_string())
            .map(|()| true)
            .map_err(|source| Error::Export { line, source })
    }

    /// Hand the line back to the kernel.
    pub fn unexport_pin(&self, pin: SysfsPinId) -> Result<()> {
        let path = self.root.join("unexport");
        log::debug!("unexporting gpio{}", pin.line());
        write_node(&path, &pin.line().to_string()).map_err(|source| Error::Sysfs { path, source })
    }

    pub fn set_direction(&self, pin: SysfsPinId, direction: Direction) -> Result<()> {
        let node = self.line_dir(pin).join("direction");
        let text = match direction {
            Direction::Input => "in",
            Direction::Output => "out",
        };
        write_node(&node, text).map_err(|source| node_error(pin, node, source))
    }

    pub fn direction(&self, pin: SysfsPinId) -> Result<Direction> {
        let node = self.line_dir(pin).join("direction");
        let content =
            fs::read_to_string(&node).map_err(|source| node_error(pin, node.clone(), source))?;
        match content.trim() {
            "in" => Ok(Direction::Input),
            // "high" and "low" are accepted on write as output-with-level
            "out" | "high" | "low" => Ok(Direction::Output),
            other => Err(Error::InvalidValue {
                path: node,
                content: other.to_owned(),
            }),
        }
    }

    /// Drive the line. Fails with [`Error::PinNotConfigured`] if the line was
    /// never exported.
    pub fn set_value(&self, pin: SysfsPinId, level: Level) -> Result<()> {
        let node = self.line_dir(pin).join("value");
        let text = match level {
            Level::Low => "0",
            Level::High => "1",
        };
        write_node(&node, text).map_err(|source| node_error(pin, node, source))
    }

    /// Read the line. See [`VALUE_READBACK_SETTLE`] for reads that follow a
    /// write closely.
    pub fn get_value(&self, pin: SysfsPinId) -> Result<Level> {
        let node = self.line_dir(pin).join("value");
        let content =
            fs::read_to_string(&node).map_err(|source| node_error(pin, node.clone(), source))?;
        match content.trim() {
            "0" => Ok(Level::Low),
            "1" => Ok(Level::High),
            other => Err(Error::InvalidValue {
                path: node,
                content: other.to_owned(),
            }),
        }
    }

    /// Export `pin`, set its direction and return a guard for it.
    ///
    /// The guard unexports the line when dropped, but only if this call
    /// exported it. A line someone else exported is left in place.
    pub fn claim(&self, pin: SysfsPinId, direction: Direction) -> Result<SysfsPin<'_>> {
        let exported = self.export_pin(pin)?;
        let claimed = SysfsPin {
            gpio: self,
            pin,
            exported,
            released: false,
        };
        self.set_direction(pin, direction)?;
        Ok(claimed)
    }
}

/// Write `text` to an existing node. Never creates files.
fn write_node(path: &Path, text: &str) -> io::Result<()> {
    let mut node = OpenOptions::new().write(true).truncate(true).open(path)?;
    node.write_all(text.as_bytes())
}

/// A missing node means the line was never exported.
fn node_error(pin: SysfsPinId, node: PathBuf, source: io::Error) -> Error {
    if source.kind() == io::ErrorKind::NotFound {
        Error::PinNotConfigured {
            line: pin.line(),
            node,
            source,
        }
    } else {
        Error::Sysfs { path: node, source }
    }
}

/// An exported line, unexported on drop if the guard exported it.
#[derive(Debug)]
pub struct SysfsPin<'a> {
    gpio: &'a SysfsGpio,
    pin: SysfsPinId,
    exported: bool,
    released: bool,
}

impl SysfsPin<'_> {
    pub fn id(&self) -> SysfsPinId {
        self.pin
    }

    /// Whether this guard exported the line and will unexport it.
    pub fn owns_export(&self) -> bool {
        self.exported
    }

    pub fn set_value(&self, level: Level) -> Result<()> {
        self.gpio.set_value(self.pin, level)
    }

    pub fn get_value(&self) -> Result<Level> {
        self.gpio.get_value(self.pin)
    }

    pub fn set_direction(&self, direction: Direction) -> Result<()> {
        self.gpio.set_direction(self.pin, direction)
    }

    /// Unexport now and report the outcome instead of logging it. A line
    /// the guard did not export is left exported.
    pub fn release(mut self) -> Result<()> {
        self.released = true;
        if self.exported {
            self.gpio.unexport_pin(self.pin)
        } else {
            Ok(())
        }
    }
}

impl Drop for SysfsPin<'_> {
    fn drop(&mut self) {
        if self.exported
            && !self.released
            && let Err(err) = self.gpio.unexport_pin(self.pin)
        {
            log::warn!("failed to unexport gpio{}: {err}", self.pin.line());
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    /// A throwaway class directory with `export`/`unexport` nodes.
    struct FakeTree {
        root: PathBuf,
    }

    impl FakeTree {
        fn new() -> Self {
            static NEXT: AtomicUsize = AtomicUsize::new(0);
            let root = std::env::temp_dir().join(format!(
                "odroid-gpio-sysfs-{}-{}",
                std::process::id(),
                NEXT.fetch_add(1, Ordering::Relaxed)
            ));
            fs::create_dir_all(&root).unwrap();
            fs::write(root.join("export"), "").unwrap();
            fs::write(root.join("unexport"), "").unwrap();
            Self { root }
        }

        /// Simulate the kernel creating `gpio<N>` after an export.
        fn add_line(&self, line: u32) {
            let dir = self.root.join(format!("gpio{line}"));
            fs::create_dir_all(&dir).unwrap();
            fs::write(dir.join("direction"), "in\n").unwrap();
            fs::write(dir.join("value"), "0\n").unwrap();
        }

        fn read(&self, node: &str) -> String {
            fs::read_to_string(self.root.join(node)).unwrap()
        }

        fn gpio(&self) -> SysfsGpio {
            SysfsGpio::with_root(&self.root)
        }
    }

    impl Drop for FakeTree {
        fn drop(&mut self) {
            let _ = fs::remove_dir_all(&self.root);
        }
    }

    const PIN27: SysfsPinId = SysfsPinId::new(88);

    #[test]
    fn export_writes_line_number() {
        let tree = FakeTree::new();
        assert!(tree.gpio().export_pin(PIN27).unwrap());
        assert_eq!(tree.read("export"), "88");
    }

    #[test]
    fn export_is_idempotent() {
        let tree = FakeTree::new();
        tree.add_line(88);
        assert!(!tree.gpio().export_pin(PIN27).unwrap());
        assert_eq!(tree.read("export"), "");
    }

    #[test]
    fn export_refused_is_export_error() {
        let tree = FakeTree::new();
        fs::remove_file(tree.root.join("export")).unwrap();
        match tree.gpio().export_pin(PIN27) {
            Err(Error::Export { line, .. }) => assert_eq!(line, 88),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn value_on_unexported_line_is_not_configured() {
        let tree = FakeTree::new();
        let gpio = tree.gpio();
        match gpio.set_value(PIN27, Level::High) {
            Err(Error::PinNotConfigured { line, node, .. }) => {
                assert_eq!(line, 88);
                assert!(node.ends_with("gpio88/value"));
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(gpio.get_value(PIN27), Err(Error::PinNotConfigured { .. })));
        assert!(matches!(
            gpio.set_direction(PIN27, Direction::Output),
            Err(Error::PinNotConfigured { .. })
        ));
    }

    #[test]
    fn direction_and_value_nodes() {
        let tree = FakeTree::new();
        tree.add_line(88);
        let gpio = tree.gpio();

        gpio.set_direction(PIN27, Direction::Output).unwrap();
        assert_eq!(tree.read("gpio88/direction"), "out");
        assert_eq!(gpio.direction(PIN27).unwrap(), Direction::Output);

        gpio.set_value(PIN27, Level::High).unwrap();
        assert_eq!(tree.read("gpio88/value"), "1");
        assert_eq!(gpio.get_value(PIN27).unwrap(), Level::High);

        gpio.set_value(PIN27, Level::Low).unwrap();
        assert_eq!(gpio.get_value(PIN27).unwrap(), Level::Low);
    }

    #[test]
    fn garbage_value_is_reported() {
        let tree = FakeTree::new();
        tree.add_line(88);
        fs::write(tree.root.join("gpio88/value"), "x\n").unwrap();
        assert!(matches!(
            tree.gpio().get_value(PIN27),
            Err(Error::InvalidValue { content, .. }) if content == "x"
        ));
    }

    #[test]
    fn claim_leaves_foreign_export_in_place() {
        let tree = FakeTree::new();
        tree.add_line(87);
        let gpio = tree.gpio();
        let enable = SysfsPinId::new(87);
        {
            let pin = gpio.claim(enable, Direction::Output).unwrap();
            assert!(!pin.owns_export());
            pin.set_value(Level::High).unwrap();
        }
        assert_eq!(tree.read("export"), "");
        assert_eq!(tree.read("unexport"), "");

        let pin = gpio.claim(enable, Direction::Output).unwrap();
        pin.release().unwrap();
        assert_eq!(tree.read("unexport"), "");
    }

    #[test]
    fn owned_export_is_unexported_on_drop() {
        let tree = FakeTree::new();
        tree.add_line(88);
        let gpio = tree.gpio();
        {
            // as if claim had exported the line itself
            let pin = SysfsPin {
                gpio: &gpio,
                pin: PIN27,
                exported: true,
                released: false,
            };
            pin.set_value(Level::High).unwrap();
            assert_eq!(tree.read("unexport"), "");
        }
        assert_eq!(tree.read("unexport"), "88");
    }

    #[test]
    fn owned_export_is_unexported_on_release() {
        let tree = FakeTree::new();
        tree.add_line(88);
        let gpio = tree.gpio();
        let pin = SysfsPin {
            gpio: &gpio,
            pin: PIN27,
            exported: true,
            released: false,
        };
        pin.release().unwrap();
        assert_eq!(tree.read("unexport"), "88");
    }

    #[test]
    fn claim_failure_still_unexports() {
        let tree = FakeTree::new();
        // export succeeds but the kernel never creates gpio88
        let gpio = tree.gpio();
        assert!(gpio.claim(PIN27, Direction::Output).is_err());
        assert_eq!(tree.read("export"), "88");
        assert_eq!(tree.read("unexport"), "88");
    }

    #[test]
    fn release_reports_errors() {
        let tree = FakeTree::new();
        tree.add_line(88);
        let gpio = tree.gpio();
        let pin = SysfsPin {
            gpio: &gpio,
            pin: PIN27,
            exported: true,
            released: false,
        };
        fs::remove_file(tree.root.join("unexport")).unwrap();
        assert!(matches!(pin.release(), Err(Error::Sysfs { .. })));
    }
}
