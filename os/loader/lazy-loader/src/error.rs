use loader_addresses::VirtualAddress;
use loader_elf::ElfError;
use std::io;

/// Setup and installation failures. All of them abort before the loaded
/// program runs.
#[derive(Debug, thiserror::Error)]
pub enum LoaderError {
    #[error(transparent)]
    Elf(#[from] ElfError),
    #[error("Failed to install the SIGSEGV handler")]
    InstallHandler(#[source] io::Error),
    #[error("A loader context is already installed")]
    AlreadyInstalled,
    #[error("Entry point {0} is not addressable on this host")]
    EntryOutOfRange(VirtualAddress),
    #[error("Failed to write the report")]
    Report(#[source] io::Error),
}
