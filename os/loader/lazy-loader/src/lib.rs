//! # Demand-Paged ELF Loader
//!
//! Runs a 32-bit ELF executable without loading it up front. Only the file
//! header and program-header table are read before control is transferred to
//! the entry point; every page of every `LOAD` segment is mapped the first
//! time the program touches it.
//!
//! ```text
//!  launcher::run
//!     │  LoaderContext::load (header + segment table)
//!     │  FaultDispatcher::install (SIGSEGV, SA_SIGINFO)
//!     ▼
//!  entry() ──fault──▶ dispatcher ──▶ PageResolver ──▶ PageMapper (mmap)
//!     ▲                                                   │
//!     └──────────── instruction re-executes ◀─────────────┘
//!     │
//!     ▼
//!  Report { return value, faults, allocations, fragmentation }
//! ```
//!
//! ## Components
//!
//! - [`LoaderStatistics`]: fault, allocation and fragmentation counters.
//! - [`PageResolver`]: classifies a faulting page as file-backed, partial or
//!   zero-fill and maps it through a [`PageMapper`].
//! - [`FaultDispatcher`]: the `SIGSEGV` registration guard.
//! - [`run`]: the launcher tying it together.
//!
//! Resolved pages are readable, writable and executable, privately mapped.

pub mod cli;
mod context;
mod dispatcher;
mod error;
mod launcher;
mod mapper;
mod report;
mod resolver;
mod stats;

pub use context::LoaderContext;
pub use dispatcher::{EXIT_FATAL, FaultDispatcher};
pub use error::LoaderError;
pub use launcher::run;
pub use mapper::{MapError, MmapMapper, PageMapper};
pub use report::Report;
pub use resolver::{PageKind, PageResolver, Resolution, ResolveError};
pub use stats::{LoaderStatistics, StatisticsSnapshot, TailLedger};
