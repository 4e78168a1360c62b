//! Everything the fault handler needs, owned in one place.

use crate::mapper::{MmapMapper, PageMapper};
use crate::resolver::{PageResolver, Resolution, ResolveError};
use crate::stats::{LoaderStatistics, TailLedger};
use loader_addresses::VirtualAddress;
use loader_elf::{BinaryImage, ElfError};
use std::os::fd::AsFd;
use std::path::Path;

/// The loaded image plus its per-run bookkeeping.
///
/// The segment table is immutable after [`load`](Self::load); the statistics
/// and tail ledger are atomics. A shared reference is therefore all a fault
/// handler ever needs.
#[derive(Debug)]
pub struct LoaderContext {
    image: BinaryImage,
    statistics: LoaderStatistics,
    tails: TailLedger,
}

impl LoaderContext {
    /// Open `path` and prepare a context for it.
    ///
    /// # Errors
    /// Any [`ElfError`] from reading the metadata.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ElfError> {
        BinaryImage::open(path).map(Self::new)
    }

    #[must_use]
    pub fn new(image: BinaryImage) -> Self {
        let tails = TailLedger::new(image.segments().len());
        Self {
            image,
            statistics: LoaderStatistics::new(),
            tails,
        }
    }

    #[must_use]
    pub const fn entry(&self) -> VirtualAddress {
        self.image.header().entry
    }

    #[must_use]
    pub const fn image(&self) -> &BinaryImage {
        &self.image
    }

    #[must_use]
    pub const fn statistics(&self) -> &LoaderStatistics {
        &self.statistics
    }

    pub fn resolver<'a, M: PageMapper>(&'a self, mapper: &'a M) -> PageResolver<'a, M> {
        PageResolver::new(self.image.segments(), &self.tails, &self.statistics, mapper)
    }

    /// Count one fault and resolve it through `mapper`.
    ///
    /// # Errors
    /// See [`PageResolver::resolve`].
    pub fn handle_fault_with<M: PageMapper>(
        &self,
        fault: VirtualAddress,
        mapper: &M,
    ) -> Result<Resolution, ResolveError> {
        self.statistics.record_fault();
        self.resolver(mapper).resolve(fault)
    }

    /// Count one fault and map its page into the running process.
    ///
    /// # Safety
    /// Pages are placed with `MAP_FIXED`. The image's `LOAD` segments must not
    /// overlap memory in use by the loader itself.
    ///
    /// # Errors
    /// See [`PageResolver::resolve`].
    pub unsafe fn handle_fault(&self, fault: VirtualAddress) -> Result<Resolution, ResolveError> {
        // SAFETY: forwarded to the caller.
        let mapper = unsafe { MmapMapper::new(self.image.as_fd()) };
        self.handle_fault_with(fault, &mapper)
    }
}
