//! # 32-bit ELF metadata
//!
//! Reads the two pieces of an `ELFCLASS32` executable a demand-paging loader
//! needs up front: the file header and the program-header table. Segment
//! contents are never read here; they are mapped page by page later, straight
//! from the file descriptor held by [`BinaryImage`].

mod error;
mod header;
mod image;
mod segment;
mod table;

pub use error::ElfError;
pub use header::FileHeader;
pub use image::{BinaryImage, read_metadata};
pub use segment::{PFlags, SegmentDescriptor, SegmentType};
pub use table::SegmentTable;

/// Size of `Elf32_Ehdr` in bytes.
pub const FILE_HEADER_SIZE: usize = 52;

/// Size of `Elf32_Phdr` in bytes.
pub const SEGMENT_ENTRY_SIZE: usize = 32;

pub(crate) const ELFCLASS32: u8 = 1;
pub(crate) const ELFDATA2LSB: u8 = 1;
pub(crate) const EV_CURRENT: u32 = 1;
pub(crate) const ET_EXEC: u16 = 2;
pub(crate) const EM_386: u16 = 3;

#[inline]
pub(crate) fn le16(x: &[u8]) -> u16 {
    u16::from_le_bytes([x[0], x[1]])
}

#[inline]
pub(crate) fn le32(x: &[u8]) -> u32 {
    u32::from_le_bytes([x[0], x[1], x[2], x[3]])
}
