use crate::{ElfError, SEGMENT_ENTRY_SIZE, SegmentDescriptor};
use loader_addresses::{Size4K, VirtualPage};

/// The program-header table, kept in file order.
///
/// Read-only after load. Lookups consider `LOAD` entries only and return the
/// entry's index in the table, which is stable for the table's lifetime.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SegmentTable {
    entries: Vec<SegmentDescriptor>,
}

impl SegmentTable {
    /// Decode `bytes` as consecutive `Elf32_Phdr` entries.
    ///
    /// # Errors
    /// Rejects a `LOAD` entry whose file size exceeds its memory size.
    pub fn parse(bytes: &[u8]) -> Result<Self, ElfError> {
        let mut entries = Vec::new();
        entries
            .try_reserve_exact(bytes.len() / SEGMENT_ENTRY_SIZE)
            .map_err(|_| ElfError::OutOfMemory)?;

        let (raw_entries, _) = bytes.as_chunks::<SEGMENT_ENTRY_SIZE>();
        for (index, raw) in raw_entries.iter().enumerate() {
            let seg = SegmentDescriptor::parse(raw);
            if seg.is_load() && seg.filesz > seg.memsz {
                return Err(ElfError::FileBackedExceedsMemory { index });
            }
            entries.push(seg);
        }

        Ok(Self { entries })
    }

    #[must_use]
    pub const fn from_entries(entries: Vec<SegmentDescriptor>) -> Self {
        Self { entries }
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&SegmentDescriptor> {
        self.entries.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SegmentDescriptor> {
        self.entries.iter()
    }

    /// `LOAD` entries with their table indices.
    pub fn loadable(&self) -> impl Iterator<Item = (usize, &SegmentDescriptor)> {
        self.entries.iter().enumerate().filter(|(_, s)| s.is_load())
    }

    /// The first `LOAD` segment whose in-memory range contains the base of
    /// `page`.
    ///
    /// Allocation-free; safe to call from a signal handler.
    #[must_use]
    pub fn find_containing(&self, page: VirtualPage<Size4K>) -> Option<(usize, &SegmentDescriptor)> {
        self.loadable().find(|(_, s)| s.contains(page.base()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{PFlags, SegmentType};
    use loader_addresses::VirtualAddress;

    fn seg(kind: SegmentType, vaddr: u64, memsz: u64) -> SegmentDescriptor {
        SegmentDescriptor {
            kind,
            vaddr: VirtualAddress::new(vaddr),
            offset: 0,
            filesz: 0,
            memsz,
            flags: PFlags::new(),
            align: 0x1000,
        }
    }

    fn page(addr: u64) -> VirtualPage<Size4K> {
        VirtualAddress::new(addr).page()
    }

    #[test]
    fn ignores_non_load_segments() {
        let table = SegmentTable::from_entries(vec![
            seg(SegmentType::Note, 0x1_0000, 0x1000),
            seg(SegmentType::Load, 0x1_0000, 0x1000),
        ]);
        assert_eq!(table.find_containing(page(0x1_0123)).map(|(i, _)| i), Some(1));
    }

    #[test]
    fn first_match_wins() {
        let table = SegmentTable::from_entries(vec![
            seg(SegmentType::Load, 0x1_0000, 0x3000),
            seg(SegmentType::Load, 0x1_2000, 0x1000),
        ]);
        assert_eq!(table.find_containing(page(0x1_2000)).map(|(i, _)| i), Some(0));
    }

    #[test]
    fn unowned_addresses_miss() {
        let table = SegmentTable::from_entries(vec![seg(SegmentType::Load, 0x1_0000, 0x10)]);
        assert!(table.find_containing(page(0x2_0000)).is_none());
        assert!(table.find_containing(page(0x0_F000)).is_none());
    }

    #[test]
    fn rejects_filesz_above_memsz() {
        let mut raw = [0u8; SEGMENT_ENTRY_SIZE];
        raw[0..4].copy_from_slice(&1u32.to_le_bytes());
        raw[16..20].copy_from_slice(&0x20u32.to_le_bytes());
        raw[20..24].copy_from_slice(&0x10u32.to_le_bytes());
        assert!(matches!(
            SegmentTable::parse(&raw),
            Err(ElfError::FileBackedExceedsMemory { index: 0 })
        ));
    }
}
