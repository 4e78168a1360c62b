//! # Page mapping primitive
//!
//! The resolver decides *what* backs a page; a [`PageMapper`] performs the
//! mapping. [`MmapMapper`] is the production implementation on top of
//! `mmap(2)` with `MAP_FIXED`; tests substitute a recording mapper.
//!
//! All operations must stay usable from a signal handler: no allocation, no
//! locks, no buffered I/O. Errors carry `io::Error::last_os_error()`, which
//! only stores the raw `errno`.

use core::ptr;
use libc::{MAP_ANONYMOUS, MAP_FAILED, MAP_FIXED, MAP_PRIVATE, PROT_EXEC, PROT_READ, PROT_WRITE};
use loader_addresses::{PageSize, Size4K, VirtualPage};
use std::io;
use std::os::fd::{AsRawFd, BorrowedFd};

#[allow(clippy::cast_possible_truncation)]
const PAGE_LEN: usize = Size4K::SIZE as usize;

/// Every demand-mapped page is readable, writable and executable.
const PAGE_PROT: libc::c_int = PROT_READ | PROT_WRITE | PROT_EXEC;

#[derive(Debug, thiserror::Error)]
pub enum MapError {
    #[error("mmap failed for file-backed page {page} (file offset {offset:#x})")]
    FileBacked {
        page: VirtualPage<Size4K>,
        offset: u64,
        #[source]
        source: io::Error,
    },
    #[error("mmap failed for zero page {page}")]
    Anonymous {
        page: VirtualPage<Size4K>,
        #[source]
        source: io::Error,
    },
    #[error("page {page} is outside the host address space")]
    AddressOutOfRange { page: VirtualPage<Size4K> },
    #[error("file offset {offset:#x} for page {page} is not representable")]
    OffsetOutOfRange {
        page: VirtualPage<Size4K>,
        offset: u64,
    },
}

/// Places single pages at fixed addresses.
///
/// Implementations replace whatever was mapped at `page` before, so mapping
/// the same page twice with the same source is equivalent to mapping it once.
pub trait PageMapper {
    /// Map one page at `page`, privately backed by the executable at
    /// `file_offset`.
    ///
    /// # Errors
    /// Fails if the page cannot be placed.
    fn map_file_page(&self, page: VirtualPage<Size4K>, file_offset: u64) -> Result<(), MapError>;

    /// Map one zero-initialized anonymous page at `page`.
    ///
    /// # Errors
    /// Fails if the page cannot be placed.
    fn map_zero_page(&self, page: VirtualPage<Size4K>) -> Result<(), MapError>;

    /// Zero bytes `from..4096` of a page this mapper just mapped.
    ///
    /// # Errors
    /// Fails if the page is not addressable.
    fn zero_tail(&self, page: VirtualPage<Size4K>, from: u64) -> Result<(), MapError>;
}

/// [`PageMapper`] backed by `mmap(2)` on the executable's file descriptor.
pub struct MmapMapper<'fd> {
    fd: BorrowedFd<'fd>,
}

impl<'fd> MmapMapper<'fd> {
    /// # Safety
    /// `MAP_FIXED` silently replaces existing mappings. The caller must
    /// ensure that every page later handed to this mapper belongs to the
    /// loaded image and not to memory the loader itself is using.
    #[must_use]
    pub const unsafe fn new(fd: BorrowedFd<'fd>) -> Self {
        Self { fd }
    }

    fn page_ptr(page: VirtualPage<Size4K>) -> Result<*mut libc::c_void, MapError> {
        page.base()
            .as_mut_ptr()
            .ok_or(MapError::AddressOutOfRange { page })
    }
}

impl PageMapper for MmapMapper<'_> {
    fn map_file_page(&self, page: VirtualPage<Size4K>, file_offset: u64) -> Result<(), MapError> {
        let addr = Self::page_ptr(page)?;
        let offset = libc::off_t::try_from(file_offset).map_err(|_| MapError::OffsetOutOfRange {
            page,
            offset: file_offset,
        })?;

        // SAFETY: fixed placement over image-owned addresses is guaranteed by
        // the constructor's contract; the descriptor outlives this call.
        let mapped = unsafe {
            libc::mmap(
                addr,
                PAGE_LEN,
                PAGE_PROT,
                MAP_PRIVATE | MAP_FIXED,
                self.fd.as_raw_fd(),
                offset,
            )
        };

        if mapped == MAP_FAILED || mapped != addr {
            return Err(MapError::FileBacked {
                page,
                offset: file_offset,
                source: io::Error::last_os_error(),
            });
        }
        Ok(())
    }

    fn map_zero_page(&self, page: VirtualPage<Size4K>) -> Result<(), MapError> {
        let addr = Self::page_ptr(page)?;

        // SAFETY: as above; anonymous mappings ignore the descriptor.
        let mapped = unsafe {
            libc::mmap(
                addr,
                PAGE_LEN,
                PAGE_PROT,
                MAP_PRIVATE | MAP_FIXED | MAP_ANONYMOUS,
                -1,
                0,
            )
        };

        if mapped == MAP_FAILED || mapped != addr {
            return Err(MapError::Anonymous {
                page,
                source: io::Error::last_os_error(),
            });
        }
        Ok(())
    }

    fn zero_tail(&self, page: VirtualPage<Size4K>, from: u64) -> Result<(), MapError> {
        let Ok(from) = usize::try_from(from) else {
            return Ok(());
        };
        if from >= PAGE_LEN {
            return Ok(());
        }

        let addr = Self::page_ptr(page)?.cast::<u8>();
        // SAFETY: the whole page was mapped writable just before this call,
        // and `from < PAGE_LEN` keeps the range inside it.
        unsafe { ptr::write_bytes(addr.add(from), 0, PAGE_LEN - from) };
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use loader_addresses::VirtualAddress;
    use std::io::Write;
    use std::os::fd::AsFd;

    /// A page-aligned address the test owns, reserved through `mmap`.
    struct Reserved(*mut libc::c_void);

    impl Reserved {
        fn new() -> Self {
            let addr = unsafe {
                libc::mmap(
                    ptr::null_mut(),
                    PAGE_LEN,
                    PROT_READ,
                    MAP_PRIVATE | MAP_ANONYMOUS,
                    -1,
                    0,
                )
            };
            assert_ne!(addr, MAP_FAILED);
            Self(addr)
        }

        fn page(&self) -> VirtualPage<Size4K> {
            VirtualAddress::from_ptr(self.0).page()
        }

        fn bytes(&self) -> &[u8] {
            unsafe { std::slice::from_raw_parts(self.0.cast::<u8>(), PAGE_LEN) }
        }
    }

    impl Drop for Reserved {
        fn drop(&mut self) {
            unsafe { libc::munmap(self.0, PAGE_LEN) };
        }
    }

    #[test]
    fn file_page_then_tail_zeroing() {
        let mut file = tempfile::tempfile().unwrap();
        let mut content = vec![0x11; PAGE_LEN];
        content.extend(vec![0xAB; PAGE_LEN]);
        file.write_all(&content).unwrap();

        let target = Reserved::new();
        let mapper = unsafe { MmapMapper::new(file.as_fd()) };
        mapper.map_file_page(target.page(), 0x1000).unwrap();
        assert!(target.bytes().iter().all(|&b| b == 0xAB));

        mapper.zero_tail(target.page(), 100).unwrap();
        assert!(target.bytes()[..100].iter().all(|&b| b == 0xAB));
        assert!(target.bytes()[100..].iter().all(|&b| b == 0));
    }

    #[test]
    fn zero_page_replaces_existing_mapping() {
        let file = tempfile::tempfile().unwrap();
        let target = Reserved::new();
        let mapper = unsafe { MmapMapper::new(file.as_fd()) };

        mapper.map_zero_page(target.page()).unwrap();
        assert!(target.bytes().iter().all(|&b| b == 0));

        // The page is writable and executable now.
        unsafe { *target.0.cast::<u8>() = 0x5A };
        assert_eq!(target.bytes()[0], 0x5A);
    }

    #[test]
    fn unaligned_file_offset_is_rejected() {
        let mut file = tempfile::tempfile().unwrap();
        file.write_all(&[0; 2 * PAGE_LEN]).unwrap();
        let target = Reserved::new();
        let mapper = unsafe { MmapMapper::new(file.as_fd()) };

        let err = mapper.map_file_page(target.page(), 0x10).unwrap_err();
        assert!(matches!(err, MapError::FileBacked { offset: 0x10, .. }));
    }

    #[test]
    fn tail_past_page_end_is_a_no_op() {
        let file = tempfile::tempfile().unwrap();
        let target = Reserved::new();
        let mapper = unsafe { MmapMapper::new(file.as_fd()) };
        mapper.map_zero_page(target.page()).unwrap();
        mapper.zero_tail(target.page(), Size4K::SIZE).unwrap();
    }
}
