//! # ELF Header Parsing

use crate::{
    ELFCLASS32, ELFDATA2LSB, EM_386, ET_EXEC, EV_CURRENT, ElfError, FILE_HEADER_SIZE,
    SEGMENT_ENTRY_SIZE, le16, le32,
};
use loader_addresses::VirtualAddress;

/// The load-bearing fields of an `Elf32_Ehdr`.
///
/// Immutable once read; only the entry point and the program-header table
/// location are consulted after validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileHeader {
    /// `e_type`
    pub object_type: u16,
    /// `e_machine`
    pub machine: u16,
    /// `e_entry`
    pub entry: VirtualAddress,
    /// `e_phoff`
    pub segment_table_offset: u64,
    /// `e_phentsize`
    pub segment_entry_size: u16,
    /// `e_phnum`
    pub segment_count: u16,
}

impl FileHeader {
    const EI_MAGIC_BYTES: [u8; 4] = [0x7F, b'E', b'L', b'F'];

    /// Decode and validate a 32-bit little-endian `ET_EXEC` header for i386.
    ///
    /// # Errors
    /// Returns the first validation failure found, checked in header order.
    pub fn parse(bytes: &[u8; FILE_HEADER_SIZE]) -> Result<Self, ElfError> {
        if bytes[0..4] != Self::EI_MAGIC_BYTES {
            return Err(ElfError::BadMagic);
        }
        if bytes[4] != ELFCLASS32 {
            return Err(ElfError::UnsupportedClass(bytes[4]));
        }
        if bytes[5] != ELFDATA2LSB {
            return Err(ElfError::UnsupportedEncoding(bytes[5]));
        }
        if u32::from(bytes[6]) != EV_CURRENT {
            return Err(ElfError::UnsupportedVersion(u32::from(bytes[6])));
        }

        let object_type = le16(&bytes[16..18]);
        let machine = le16(&bytes[18..20]);
        let version = le32(&bytes[20..24]);
        let entry = le32(&bytes[24..28]);
        let phoff = le32(&bytes[28..32]);
        let phentsize = le16(&bytes[42..44]);
        let phnum = le16(&bytes[44..46]);

        if version != EV_CURRENT {
            return Err(ElfError::UnsupportedVersion(version));
        }
        if object_type != ET_EXEC {
            return Err(ElfError::UnsupportedType(object_type));
        }
        if machine != EM_386 {
            return Err(ElfError::UnsupportedMachine(machine));
        }
        if usize::from(phentsize) != SEGMENT_ENTRY_SIZE {
            return Err(ElfError::BadSegmentEntrySize(phentsize));
        }

        Ok(Self {
            object_type,
            machine,
            entry: VirtualAddress::from(entry),
            segment_table_offset: u64::from(phoff),
            segment_entry_size: phentsize,
            segment_count: phnum,
        })
    }

    /// Byte length of the program-header table.
    #[must_use]
    pub fn segment_table_len(&self) -> usize {
        usize::from(self.segment_count) * usize::from(self.segment_entry_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header() -> [u8; FILE_HEADER_SIZE] {
        let mut b = [0u8; FILE_HEADER_SIZE];
        b[0..4].copy_from_slice(b"\x7FELF");
        b[4] = 1;
        b[5] = 1;
        b[6] = 1;
        b[16..18].copy_from_slice(&2u16.to_le_bytes());
        b[18..20].copy_from_slice(&3u16.to_le_bytes());
        b[20..24].copy_from_slice(&1u32.to_le_bytes());
        b[24..28].copy_from_slice(&0x0001_0000u32.to_le_bytes());
        b[28..32].copy_from_slice(&52u32.to_le_bytes());
        b[40..42].copy_from_slice(&52u16.to_le_bytes());
        b[42..44].copy_from_slice(&32u16.to_le_bytes());
        b[44..46].copy_from_slice(&2u16.to_le_bytes());
        b
    }

    #[test]
    fn parses_load_bearing_fields() {
        let h = FileHeader::parse(&header()).unwrap();
        assert_eq!(h.entry, VirtualAddress::new(0x0001_0000));
        assert_eq!(h.segment_table_offset, 52);
        assert_eq!(h.segment_count, 2);
        assert_eq!(h.segment_table_len(), 64);
    }

    #[test]
    fn rejects_bad_magic() {
        let mut b = header();
        b[1] = b'X';
        assert!(matches!(FileHeader::parse(&b), Err(ElfError::BadMagic)));
    }

    #[test]
    fn rejects_elf64() {
        let mut b = header();
        b[4] = 2;
        assert!(matches!(
            FileHeader::parse(&b),
            Err(ElfError::UnsupportedClass(2))
        ));
    }

    #[test]
    fn rejects_big_endian() {
        let mut b = header();
        b[5] = 2;
        assert!(matches!(
            FileHeader::parse(&b),
            Err(ElfError::UnsupportedEncoding(2))
        ));
    }

    #[test]
    fn rejects_shared_objects() {
        let mut b = header();
        b[16..18].copy_from_slice(&3u16.to_le_bytes());
        assert!(matches!(
            FileHeader::parse(&b),
            Err(ElfError::UnsupportedType(3))
        ));
    }

    #[test]
    fn rejects_foreign_machine() {
        let mut b = header();
        b[18..20].copy_from_slice(&62u16.to_le_bytes());
        assert!(matches!(
            FileHeader::parse(&b),
            Err(ElfError::UnsupportedMachine(62))
        ));
    }

    #[test]
    fn rejects_odd_entry_size() {
        let mut b = header();
        b[42..44].copy_from_slice(&56u16.to_le_bytes());
        assert!(matches!(
            FileHeader::parse(&b),
            Err(ElfError::BadSegmentEntrySize(56))
        ));
    }
}
