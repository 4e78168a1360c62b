//! # Fault Dispatcher
//!
//! Routes `SIGSEGV` to the loader context.
//!
//! ```text
//! hardware fault ─▶ kernel ─▶ on_fault(SIGSEGV, siginfo)
//!                                 │ si_addr
//!                                 ▼
//!                     ACTIVE.get() ─▶ LoaderContext::handle_fault
//!                                 │
//!                 Ok ◀────────────┴────────────▶ Err
//!     return; the faulting           "Fatal error: ..." on fd 2,
//!     instruction re-executes        drop the context, _exit(1)
//! ```
//!
//! The context lives in a process-wide [`InstallSlot`] because a signal
//! handler has no other way to reach it. [`FaultDispatcher`] is the guard
//! that owns the registration: dropping it restores the previous disposition
//! and releases the context.

use crate::context::LoaderContext;
use crate::error::LoaderError;
use core::{mem, ptr};
use loader_addresses::VirtualAddress;
use loader_console::console_trace;
use loader_sync::InstallSlot;
use log::{debug, info};
use std::error::Error;
use std::io;

/// Exit status of a fault that cannot be resolved.
pub const EXIT_FATAL: libc::c_int = 1;

static ACTIVE: InstallSlot<LoaderContext> = InstallSlot::new();

type SignalHandler = extern "C" fn(libc::c_int, *mut libc::siginfo_t, *mut libc::c_void);

/// Registration of the `SIGSEGV` handler for one [`LoaderContext`].
pub struct FaultDispatcher {
    previous: libc::sigaction,
    restored: bool,
}

impl FaultDispatcher {
    /// Publish `context` and start handling `SIGSEGV` with it.
    ///
    /// # Errors
    /// - [`LoaderError::AlreadyInstalled`] if another dispatcher is live,
    /// - [`LoaderError::InstallHandler`] if `sigaction(2)` fails; the context
    ///   is released in that case.
    pub fn install(context: LoaderContext) -> Result<Self, LoaderError> {
        ACTIVE
            .install(Box::new(context))
            .map_err(|_| LoaderError::AlreadyInstalled)?;

        // SAFETY: all-zero is a valid `sigaction`; the fields that matter are
        // filled in below.
        let mut action: libc::sigaction = unsafe { mem::zeroed() };
        action.sa_sigaction = on_fault as SignalHandler as libc::sighandler_t;
        action.sa_flags = libc::SA_SIGINFO;
        // SAFETY: as above.
        let mut previous: libc::sigaction = unsafe { mem::zeroed() };
        // SAFETY: all pointers refer to live, writable values.
        let rc = unsafe {
            libc::sigemptyset(&raw mut action.sa_mask);
            libc::sigaction(libc::SIGSEGV, &raw const action, &raw mut previous)
        };

        if rc != 0 {
            let err = io::Error::last_os_error();
            drop(ACTIVE.take());
            return Err(LoaderError::InstallHandler(err));
        }

        info!("SIGSEGV handler installed");
        Ok(Self {
            previous,
            restored: false,
        })
    }

    /// The installed context.
    #[must_use]
    pub fn context(&self) -> Option<&LoaderContext> {
        // SAFETY: the slot is emptied only by `uninstall`/`drop`, which need
        // this guard by value or by unique reference, or by the fatal path,
        // which never returns.
        unsafe { ACTIVE.get() }
    }

    /// Restore the previous `SIGSEGV` disposition and take the context back.
    #[must_use]
    pub fn uninstall(mut self) -> Option<Box<LoaderContext>> {
        self.restore();
        ACTIVE.take()
    }

    fn restore(&mut self) {
        if self.restored {
            return;
        }
        // SAFETY: `previous` was filled in by the kernel during `install`.
        let rc = unsafe { libc::sigaction(libc::SIGSEGV, &raw const self.previous, ptr::null_mut()) };
        if rc == 0 {
            debug!("SIGSEGV handler restored");
        } else {
            debug!("Failed to restore SIGSEGV handler: {}", io::Error::last_os_error());
        }
        self.restored = true;
    }
}

impl Drop for FaultDispatcher {
    fn drop(&mut self) {
        self.restore();
        if ACTIVE.take().is_some() {
            debug!("Loader context released");
        }
    }
}

extern "C" fn on_fault(_signal: libc::c_int, info: *mut libc::siginfo_t, _ucontext: *mut libc::c_void) {
    // SAFETY: with SA_SIGINFO the kernel passes a valid `siginfo_t`.
    let fault = VirtualAddress::from_ptr(unsafe { (*info).si_addr() });

    // SAFETY: see `FaultDispatcher::context`.
    let Some(context) = (unsafe { ACTIVE.get() }) else {
        console_trace!("Fatal error: segmentation fault at {fault} with no image loaded\n");
        terminate();
    };

    // SAFETY: pages are only mapped inside LOAD segments of the image.
    if let Err(err) = unsafe { context.handle_fault(fault) } {
        console_trace!("Fatal error: {err}");
        let mut source = err.source();
        while let Some(cause) = source {
            console_trace!(": {cause}");
            source = cause.source();
        }
        console_trace!("\n");
        terminate();
    }
}

/// Release the loader context and end the process without unwinding.
fn terminate() -> ! {
    drop(ACTIVE.take());
    // SAFETY: `_exit` is async-signal-safe and does not return.
    unsafe { libc::_exit(EXIT_FATAL) }
}
