//! Physical memory mapping of the GPIO register page.
//!
//! The page is mapped `MAP_SHARED` through a device opened with `O_SYNC`, so
//! stores go straight to the hardware. Any other process can map the same
//! page at the same time; nothing coordinates them.

use std::fs::{File, OpenOptions};
use std::io;
use std::os::unix::fs::OpenOptionsExt;
use std::os::unix::io::AsRawFd;
use std::path::{Path, PathBuf};
use std::ptr::{self, NonNull};

use crate::error::{Error, Result};
use crate::low::register::GpioRegisters;

/// Fallback when `sysconf` cannot report the page size.
const DEFAULT_PAGE_SIZE: usize = 4096;

fn page_size() -> usize {
    // SAFETY: sysconf has no memory-safety preconditions.
    let size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
    if size > 0 {
        size as usize
    } else {
        DEFAULT_PAGE_SIZE
    }
}

/// One page of physical memory containing the GPIO register block.
///
/// Offsets passed to [`GpioRegisters`] are relative to the GPIO base address
/// the mapping was opened with, which need not be page aligned.
///
/// Release it with [`close`](GpioRegisters::close); dropping an open mapping
/// unmaps it as well, logging any failure.
#[derive(Debug)]
pub struct MemoryMapping {
    base: Option<NonNull<u8>>,
    page_len: usize,
    page_offset: usize,
    device: PathBuf,
    // Kept open for the lifetime of the mapping.
    _file: File,
}

impl MemoryMapping {
    /// Map the page containing `gpio_base` from `device` (usually `/dev/mem`).
    pub fn open_at(device: impl AsRef<Path>, gpio_base: u64) -> Result<Self> {
        let device = device.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .custom_flags(libc::O_SYNC)
            .open(&device)
            .map_err(|source| Error::Mapping {
                device: device.clone(),
                operation: "open",
                source,
            })?;

        let page_len = page_size();
        let mask = page_len as u64 - 1;
        let target = gpio_base & !mask;
        let page_offset = (gpio_base & mask) as usize;

        // SAFETY: a fresh shared mapping of a valid descriptor; the result is
        // checked against MAP_FAILED before use.
        let addr = unsafe {
            libc::mmap(
                ptr::null_mut(),
                page_len,
                libc::PROT_READ | libc::PROT_WRITE,
                libc::MAP_SHARED,
                file.as_raw_fd(),
                target as libc::off_t,
            )
        };
        if addr == libc::MAP_FAILED {
            return Err(Error::Mapping {
                device,
                operation: "mmap",
                source: io::Error::last_os_error(),
            });
        }
        let base = NonNull::new(addr.cast::<u8>()).ok_or_else(|| Error::Mapping {
            device: device.clone(),
            operation: "mmap",
            source: io::Error::other("mmap returned a null mapping"),
        })?;

        log::debug!(
            "mapped {:#x} bytes of {} at physical {target:#x}",
            page_len,
            device.display()
        );
        Ok(Self {
            base: Some(base),
            page_len,
            page_offset,
            device,
            _file: file,
        })
    }

    pub fn device(&self) -> &Path {
        &self.device
    }

    pub fn is_closed(&self) -> bool {
        self.base.is_none()
    }

    fn address(&self, offset: usize) -> Result<*mut u8> {
        let base = self.base.ok_or(Error::MappingClosed)?;
        let len = self.len();
        if offset >= len {
            return Err(Error::OffsetOutOfRange { offset, len });
        }
        // SAFETY: page_offset + offset < page_len, so the pointer stays
        // inside the mapped page.
        Ok(unsafe { base.as_ptr().add(self.page_offset + offset) })
    }

    fn unmap(base: NonNull<u8>, len: usize) -> io::Result<()> {
        // SAFETY: `base` came from mmap with the same length and is unmapped
        // at most once, since callers take it out of the Option first.
        if unsafe { libc::munmap(base.as_ptr().cast(), len) } == -1 {
            Err(io::Error::last_os_error())
        } else {
            Ok(())
        }
    }
}

// SAFETY: `address` rejects closed mappings and offsets outside the page,
// and all accesses are volatile.
unsafe impl GpioRegisters for MemoryMapping {
    fn len(&self) -> usize {
        if self.base.is_some() {
            self.page_len - self.page_offset
        } else {
            0
        }
    }

    #[inline]
    fn read_byte(&self, offset: usize) -> Result<u8> {
        let addr = self.address(offset)?;
        // SAFETY: `addr` is inside the live mapping.
        Ok(unsafe { ptr::read_volatile(addr) })
    }

    #[inline]
    fn write_byte(&mut self, offset: usize, value: u8) -> Result<()> {
        let addr = self.address(offset)?;
        // SAFETY: `addr` is inside the live mapping.
        unsafe { ptr::write_volatile(addr, value) };
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        let base = self.base.take().ok_or(Error::MappingClosed)?;
        Self::unmap(base, self.page_len).map_err(Error::Unmap)?;
        log::debug!("unmapped GPIO registers from {}", self.device.display());
        Ok(())
    }
}

impl Drop for MemoryMapping {
    fn drop(&mut self) {
        if let Some(base) = self.base.take()
            && let Err(err) = Self::unmap(base, self.page_len)
        {
            log::warn!("failed to unmap {}: {err}", self.device.display());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_device_is_a_mapping_error() {
        let err = MemoryMapping::open_at("/nonexistent/mem", 0x1140_0000).unwrap_err();
        match err {
            Error::Mapping {
                device, operation, ..
            } => {
                assert_eq!(device, Path::new("/nonexistent/mem"));
                assert_eq!(operation, "open");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    // /dev/zero gives an ordinary shared page, so the mapping logic can be
    // exercised without GPIO hardware or root.
    #[test]
    fn mapped_page_round_trip_and_bounds() {
        let mut mapping = MemoryMapping::open_at("/dev/zero", 0).unwrap();
        let len = mapping.len();
        assert_eq!(len, page_size());

        mapping.write_byte(0x184, 0xaa).unwrap();
        assert_eq!(mapping.read_byte(0x184).unwrap(), 0xaa);
        mapping.write_byte(len - 1, 0x55).unwrap();
        assert_eq!(mapping.read_byte(len - 1).unwrap(), 0x55);

        assert!(matches!(
            mapping.read_byte(len),
            Err(Error::OffsetOutOfRange { offset, len: l }) if offset == len && l == len
        ));
        assert!(matches!(
            mapping.write_byte(len + 3, 0),
            Err(Error::OffsetOutOfRange { .. })
        ));
    }

    #[test]
    fn mapping_is_unusable_after_close() {
        let mut mapping = MemoryMapping::open_at("/dev/zero", 0).unwrap();
        mapping.close().unwrap();
        assert!(mapping.is_closed());
        assert_eq!(mapping.len(), 0);
        assert!(matches!(mapping.read_byte(0), Err(Error::MappingClosed)));
        assert!(matches!(mapping.write_byte(0, 1), Err(Error::MappingClosed)));
        assert!(matches!(mapping.close(), Err(Error::MappingClosed)));
        // dropping a closed mapping must not unmap again
        drop(mapping);
    }

    #[test]
    fn unaligned_base_is_offset_into_the_page() {
        let page = page_size() as u64;
        let mapping = MemoryMapping::open_at("/dev/zero", page + 0x100).unwrap();
        assert_eq!(mapping.len(), page_size() - 0x100);
        assert!(mapping.read_byte(page_size() - 0x100).is_err());
    }

    #[test]
    fn page_size_is_a_power_of_two() {
        assert!(page_size().is_power_of_two());
    }
}
