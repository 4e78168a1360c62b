//! # Page Resolution Engine
//!
//! Turns a faulting address into exactly one mapped page.
//!
//! ```text
//! fault address ──align down──▶ page base
//!        │
//!        ▼
//! first LOAD segment with vaddr ≤ base < vaddr + memsz   (none → Unowned)
//!        │
//!        ▼
//! off = base − vaddr
//!   off <  filesz, off + 4K ≤ filesz  → FileBacked
//!   off <  filesz, off + 4K >  filesz → Partial (map file, zero the tail)
//!   off ≥  filesz                     → Zero (anonymous)
//! ```
//!
//! A segment's internal fragmentation (`4096 − memsz mod 4096`) is charged
//! when, and only when, its last page is resolved, at most once per segment.
//!
//! The success path performs table lookups, integer arithmetic, atomic
//! updates and the mapper calls; nothing else.

use crate::mapper::{MapError, PageMapper};
use crate::stats::{LoaderStatistics, TailLedger};
use loader_addresses::{PageSize, Size4K, VirtualAddress, VirtualPage};
use loader_elf::SegmentTable;

/// How a resolved page was populated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageKind {
    /// Entirely file content.
    FileBacked,
    /// File content up to `zero_from`, zeroes after it.
    Partial { zero_from: u64 },
    /// Anonymous zero page.
    Zero,
}

/// Outcome of a successful resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub page: VirtualPage<Size4K>,
    /// Program-header index of the owning segment.
    pub segment: usize,
    pub kind: PageKind,
    /// Fragmentation bytes charged by this resolution, if any.
    pub fragmentation: Option<u64>,
}

#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("Unhandled segmentation fault at address {0}")]
    Unowned(VirtualAddress),
    #[error(transparent)]
    Map(#[from] MapError),
}

/// Borrowed view over everything a fault resolution touches.
pub struct PageResolver<'a, M> {
    segments: &'a SegmentTable,
    tails: &'a TailLedger,
    statistics: &'a LoaderStatistics,
    mapper: &'a M,
}

impl<'a, M: PageMapper> PageResolver<'a, M> {
    pub const fn new(
        segments: &'a SegmentTable,
        tails: &'a TailLedger,
        statistics: &'a LoaderStatistics,
        mapper: &'a M,
    ) -> Self {
        Self {
            segments,
            tails,
            statistics,
            mapper,
        }
    }

    /// Map the page containing `fault`.
    ///
    /// Counts an allocation on success. Does not count the fault itself;
    /// that is the dispatcher's job.
    ///
    /// # Errors
    /// - [`ResolveError::Unowned`] if no `LOAD` segment covers the page base,
    /// - [`ResolveError::Map`] if the mapper fails.
    pub fn resolve(&self, fault: VirtualAddress) -> Result<Resolution, ResolveError> {
        let page = fault.page::<Size4K>();
        let (index, seg) = self
            .segments
            .find_containing(page)
            .ok_or(ResolveError::Unowned(fault))?;
        let offset = seg.page_offset(page).ok_or(ResolveError::Unowned(fault))?;

        let kind = if offset < seg.filesz {
            self.mapper.map_file_page(page, seg.offset + offset)?;
            if offset + Size4K::SIZE > seg.filesz {
                let zero_from = seg.filesz - offset;
                self.mapper.zero_tail(page, zero_from)?;
                PageKind::Partial { zero_from }
            } else {
                PageKind::FileBacked
            }
        } else {
            self.mapper.map_zero_page(page)?;
            PageKind::Zero
        };

        self.statistics.record_allocation();

        let is_last_page = seg.last_page_index() == Some(offset >> Size4K::SHIFT);
        let slack = seg.tail_slack();
        let fragmentation = if is_last_page && slack != 0 && self.tails.charge_once(index) {
            self.statistics.add_fragmentation(slack);
            Some(slack)
        } else {
            None
        };

        Ok(Resolution {
            page,
            segment: index,
            kind,
            fragmentation,
        })
    }
}
