use crate::{SEGMENT_ENTRY_SIZE, le32};
use core::fmt;
use loader_addresses::{PageSize, Size4K, VirtualAddress, VirtualPage, page_count};

/// `Elf32_Phdr.p_type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SegmentType {
    Null,
    Load,
    Dynamic,
    Interp,
    Note,
    Shlib,
    Phdr,
    Tls,
    Other(u32),
}

impl From<u32> for SegmentType {
    fn from(value: u32) -> Self {
        match value {
            0 => Self::Null,
            1 => Self::Load,
            2 => Self::Dynamic,
            3 => Self::Interp,
            4 => Self::Note,
            5 => Self::Shlib,
            6 => Self::Phdr,
            7 => Self::Tls,
            other => Self::Other(other),
        }
    }
}

/// Bitfield wrapper for `Elf32_Phdr.p_flags` (32-bit)
///
/// Layout (LSB→MSB):
/// - bit 0: execute
/// - bit 1: write
/// - bit 2: read
/// - bits 3..31: reserved (must be zero for standard flags)
#[bitfield_struct::bitfield(u32)]
#[derive(PartialEq, Eq)]
pub struct PFlags {
    #[bits(1)]
    pub execute: bool,
    #[bits(1)]
    pub write: bool,
    #[bits(1)]
    pub read: bool,
    #[bits(29)]
    __: u32,
}

impl fmt::Display for PFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let r = if self.read() { 'R' } else { '-' };
        let w = if self.write() { 'W' } else { '-' };
        let x = if self.execute() { 'X' } else { '-' };
        write!(f, "{r}{w}{x}")
    }
}

/// One program-header entry.
///
/// Sizes and offsets are widened to `u64` so `vaddr + memsz` and
/// `offset + filesz` never overflow for 32-bit inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentDescriptor {
    pub kind: SegmentType,
    pub vaddr: VirtualAddress,
    pub offset: u64,
    pub filesz: u64,
    pub memsz: u64,
    pub flags: PFlags,
    pub align: u64,
}

impl SegmentDescriptor {
    /// Decode one `Elf32_Phdr`.
    #[must_use]
    pub fn parse(s: &[u8; SEGMENT_ENTRY_SIZE]) -> Self {
        Self {
            kind: SegmentType::from(le32(&s[0..4])),
            offset: u64::from(le32(&s[4..8])),
            vaddr: VirtualAddress::from(le32(&s[8..12])),
            // s[12..16] is p_paddr, meaningless in user space.
            filesz: u64::from(le32(&s[16..20])),
            memsz: u64::from(le32(&s[20..24])),
            flags: PFlags::from_bits(le32(&s[24..28])),
            align: u64::from(le32(&s[28..32])),
        }
    }

    #[inline]
    #[must_use]
    pub fn is_load(&self) -> bool {
        self.kind == SegmentType::Load
    }

    /// First address past the in-memory image.
    #[inline]
    #[must_use]
    pub fn end(&self) -> VirtualAddress {
        self.vaddr + self.memsz
    }

    /// Whether `addr` lies in `[vaddr, vaddr + memsz)`.
    #[inline]
    #[must_use]
    pub fn contains(&self, addr: VirtualAddress) -> bool {
        addr >= self.vaddr && addr < self.end()
    }

    /// Pages spanned by the in-memory image, counted from `vaddr`.
    #[inline]
    #[must_use]
    pub const fn page_count(&self) -> u64 {
        page_count::<Size4K>(self.memsz)
    }

    /// Index of the final page, `None` for an empty segment.
    #[inline]
    #[must_use]
    pub const fn last_page_index(&self) -> Option<u64> {
        self.page_count().checked_sub(1)
    }

    /// Unused bytes at the end of the final page (internal fragmentation).
    #[inline]
    #[must_use]
    pub const fn tail_slack(&self) -> u64 {
        match self.memsz & Size4K::MASK {
            0 => 0,
            used => Size4K::SIZE - used,
        }
    }

    /// Whether pages of this segment map onto page-aligned file offsets.
    #[must_use]
    pub const fn is_page_aligned(&self) -> bool {
        self.vaddr.as_u64() & Size4K::MASK == 0 && self.offset & Size4K::MASK == 0
    }

    /// Byte offset of `page` from the segment start, if the page base lies
    /// inside the in-memory image.
    #[must_use]
    pub fn page_offset(&self, page: VirtualPage<Size4K>) -> Option<u64> {
        let off = page.offset_from(self.vaddr)?;
        (off < self.memsz).then_some(off)
    }
}

impl fmt::Display for SegmentDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:?} {} vaddr={} memsz={:#x} filesz={:#x} offset={:#x}",
            self.kind, self.flags, self.vaddr, self.memsz, self.filesz, self.offset
        )
    }
}
