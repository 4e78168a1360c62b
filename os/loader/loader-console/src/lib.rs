//! # Unbuffered Diagnostic Console
//!
//! Diagnostic output for code that may run inside a signal handler.
//!
//! ## Overview
//!
//! The loader resolves page faults from a `SIGSEGV` handler. Inside that
//! handler the usual output paths are off limits: `std::io::stderr` takes a
//! reentrant lock, `eprintln!` may allocate, and `format!` certainly does.
//! This crate provides an output path that does none of that:
//!
//! ```text
//! console_trace! macro
//!     ↓
//! core::format_args!  (no allocation)
//!     ↓
//! StderrSink (fmt::Write)
//!     ↓
//! write(2, ...)       (async-signal-safe)
//! ```
//!
//! Every `write_str` call goes straight to the file descriptor; nothing is
//! buffered, so output is not lost when the process ends through `_exit`.
//!
//! ## Core Components
//!
//! ### Console Logger ([`ConsoleLogger`])
//! A `log::Log` implementation that routes records through the same sink,
//! formatted as `[LEVEL] target: message`.
//!
//! ### Trace Macro ([`console_trace!`])
//! Direct output bypassing the logging framework and its level filter. Use it
//! for the last words of a process that is about to terminate.
//!
//! ## `enabled` Feature (default)
//!
//! When disabled, [`console_trace!`] and the logger become no-ops.
//!
//! ## Usage
//! ```rust,no_run
//! use loader_console::{ConsoleLogger, console_trace};
//! use log::{LevelFilter, info};
//!
//! ConsoleLogger::new(LevelFilter::Info).init().expect("logger initialization");
//! info!("image opened");
//! console_trace!("Fatal error: fault at {:#x}\n", 0x1234);
//! ```

#![cfg_attr(not(any(test, doctest)), no_std)]
#![allow(unsafe_code, clippy::inline_always)]

mod logger;

pub use logger::ConsoleLogger;

#[cfg(feature = "enabled")]
#[doc(hidden)]
pub mod console_fmt {
    use core::fmt::{self, Write};

    /// Standard error.
    const STDERR_FD: libc::c_int = 2;

    /// Write all of `bytes` to standard error, retrying on partial writes and `EINTR`.
    fn write_all(mut bytes: &[u8]) -> fmt::Result {
        while !bytes.is_empty() {
            // SAFETY: the pointer/length pair describes a live slice.
            let n = unsafe { libc::write(STDERR_FD, bytes.as_ptr().cast(), bytes.len()) };
            if n < 0 {
                // SAFETY: errno location is thread-local and always valid.
                if unsafe { *libc::__errno_location() } == libc::EINTR {
                    continue;
                }
                return Err(fmt::Error);
            }
            if n == 0 {
                return Err(fmt::Error);
            }
            #[allow(clippy::cast_sign_loss)]
            let written = n as usize;
            bytes = &bytes[written..];
        }
        Ok(())
    }

    /// A `fmt::Write` that forwards every fragment directly to `write(2)`.
    pub struct StderrSink;

    impl Write for StderrSink {
        #[inline]
        fn write_str(&mut self, s: &str) -> fmt::Result {
            write_all(s.as_bytes())
        }

        #[inline]
        fn write_char(&mut self, c: char) -> fmt::Result {
            // UTF-8 encode without allocation.
            let mut buf = [0u8; 4];
            let s = c.encode_utf8(&mut buf);
            self.write_str(s)
        }
    }

    #[doc(hidden)]
    #[inline]
    pub fn console_write(args: fmt::Arguments) {
        // Best effort; there is nowhere left to report a failing stderr.
        let _ = fmt::write(&mut StderrSink, args);
    }
}

#[cfg(not(feature = "enabled"))]
#[doc(hidden)]
pub mod console_fmt {
    use core::fmt;

    #[doc(hidden)]
    #[inline(always)]
    pub fn console_write(_: fmt::Arguments) {
        // no-op when feature disabled
    }
}

/// Write formatted text to standard error without allocating or buffering.
#[macro_export]
macro_rules! console_trace {
    ($($arg:tt)*) => {{
        // No allocation: `format_args!` builds a lightweight `Arguments`.
        $crate::console_fmt::console_write(core::format_args!($($arg)*));
    }};
}
