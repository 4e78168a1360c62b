//! # Execution Launcher
//!
//! Load, install, jump, report. The entry page is not mapped when control is
//! transferred; the very first instruction fetch faults it in.

use crate::context::LoaderContext;
use crate::dispatcher::FaultDispatcher;
use crate::error::LoaderError;
use crate::report::Report;
use core::mem;
use log::{debug, info};
use std::path::Path;

/// The loaded program's entry point, called with the C ABI.
type EntryPoint = extern "C" fn() -> i32;

/// Run the executable at `path` to completion.
///
/// On success the loader context has been released again (file closed,
/// segment table freed, `SIGSEGV` disposition restored); mapped pages stay in
/// place until the process exits.
///
/// A fault that cannot be resolved does not return here: the process ends
/// with exit status 1.
///
/// # Errors
/// Any setup or installation failure; the program has not run in that case.
pub fn run(path: impl AsRef<Path>) -> Result<Report, LoaderError> {
    let context = LoaderContext::load(path)?;
    let entry = context.entry();
    let entry_ptr = entry
        .as_mut_ptr::<u8>()
        .ok_or(LoaderError::EntryOutOfRange(entry))?;

    let dispatcher = FaultDispatcher::install(context)?;

    info!("Transferring control to entry point {entry}");
    // SAFETY: the dispatcher maps the image's pages as they are touched; the
    // entry point is trusted to be code in one of them.
    let return_value = unsafe { call_entry(entry_ptr) };
    debug!("Entry point returned {return_value}");

    let statistics = dispatcher
        .context()
        .map(|context| context.statistics().snapshot())
        .unwrap_or_default();
    drop(dispatcher.uninstall());

    Ok(Report {
        return_value,
        statistics,
    })
}

/// # Safety
/// `entry` must point to code following the C calling convention for a
/// parameterless function returning `i32`, or into an unmapped page whose
/// fault resolves to such code.
unsafe fn call_entry(entry: *mut u8) -> i32 {
    // SAFETY: data and function pointers have the same size on all supported
    // targets; validity of the target is the caller's obligation.
    let start: EntryPoint = unsafe { mem::transmute::<*mut u8, EntryPoint>(entry) };
    start()
}
