use std::io;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ElfError {
    #[error("Failed to open {}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Failed to read from the executable")]
    Read(#[from] io::Error),
    #[error("The ELF header is truncated ({read} of 52 bytes)")]
    TruncatedHeader { read: usize },
    #[error("The program header table is truncated ({read} of {expected} bytes)")]
    TruncatedSegmentTable { expected: usize, read: usize },
    #[error("The program header table could not be allocated")]
    OutOfMemory,
    #[error("The file is not an ELF image (bad magic)")]
    BadMagic,
    #[error("Unsupported ELF class {0}; only ELFCLASS32 is supported")]
    UnsupportedClass(u8),
    #[error("Unsupported data encoding {0}; only little-endian is supported")]
    UnsupportedEncoding(u8),
    #[error("Unsupported ELF version {0}")]
    UnsupportedVersion(u32),
    #[error("Unsupported object type {0}; only ET_EXEC is supported")]
    UnsupportedType(u16),
    #[error("Unsupported machine {0}; only EM_386 is supported")]
    UnsupportedMachine(u16),
    #[error("Program header entries are {0} bytes; expected 32")]
    BadSegmentEntrySize(u16),
    #[error("LOAD segment #{index} has a larger file size than memory size")]
    FileBackedExceedsMemory { index: usize },
}
