//! # Parallel For
//!
//! Splits an index range across a fixed number of threads and blocks until
//! every index has been visited.
//!
//! ```text
//! [low ─────────────────────────────────── high)
//!  │ chunk 0 │ chunk 1 │  ...  │ chunk n-1 │
//!   worker 0  worker 1          caller
//! ```
//!
//! Chunk `t` of `n` holds `base + (t < rem)` indices, where
//! `base = len / n` and `rem = len % n`, so chunk sizes differ by at most one
//! and the larger chunks come first. Workers are scoped threads; the calling
//! thread always runs the last chunk itself. If a worker cannot be spawned,
//! the caller runs the remaining chunks inline.
//!
//! The 2D form splits only the outer range; every chunk walks the full inner
//! range for each of its outer indices.
//!
//! ```rust
//! use std::sync::atomic::{AtomicI64, Ordering};
//!
//! let sum = AtomicI64::new(0);
//! parallel_for::parallel_for(0, 100, 4, |i| {
//!     sum.fetch_add(i64::from(i), Ordering::Relaxed);
//! })
//! .unwrap();
//! assert_eq!(sum.into_inner(), 4950);
//! ```

use log::{info, warn};
use std::ops::Range;
use std::thread;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ParallelForError {
    #[error("parallel_for needs at least one thread")]
    NoThreads,
    #[error("parallel_for was given an empty iteration range")]
    EmptyRange,
}

/// Timing of one completed call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParallelForStats {
    pub elapsed: Duration,
    /// Logical threads requested, the caller included.
    pub threads: usize,
}

/// Call `f(i)` for every `i` in `low..high` using `threads` threads, the
/// caller included.
///
/// # Errors
/// [`ParallelForError::NoThreads`] if `threads == 0`,
/// [`ParallelForError::EmptyRange`] if `high <= low`. Nothing runs in either
/// case.
pub fn parallel_for<F>(low: i32, high: i32, threads: usize, f: F) -> Result<ParallelForStats, ParallelForError>
where
    F: Fn(i32) + Sync,
{
    check(threads, &[(low, high)])?;

    let started = Instant::now();
    distribute(low, high, threads, &|range: Range<i32>| range.for_each(&f));
    let elapsed = started.elapsed();

    info!("parallel_for (1D) took {elapsed:?} using {threads} threads");
    Ok(ParallelForStats { elapsed, threads })
}

/// Call `f(i, j)` for every `i` in `low1..high1` and `j` in `low2..high2`
/// using `threads` threads, the caller included. Only the outer range is
/// split.
///
/// # Errors
/// As [`parallel_for`]; the range check applies to both dimensions.
pub fn parallel_for_2d<F>(
    low1: i32,
    high1: i32,
    low2: i32,
    high2: i32,
    threads: usize,
    f: F,
) -> Result<ParallelForStats, ParallelForError>
where
    F: Fn(i32, i32) + Sync,
{
    check(threads, &[(low1, high1), (low2, high2)])?;

    let started = Instant::now();
    distribute(low1, high1, threads, &|outer: Range<i32>| {
        for i in outer {
            for j in low2..high2 {
                f(i, j);
            }
        }
    });
    let elapsed = started.elapsed();

    info!("parallel_for (2D) took {elapsed:?} using {threads} threads");
    Ok(ParallelForStats { elapsed, threads })
}

fn check(threads: usize, ranges: &[(i32, i32)]) -> Result<(), ParallelForError> {
    if threads == 0 {
        return Err(ParallelForError::NoThreads);
    }
    if ranges.iter().any(|&(low, high)| high <= low) {
        return Err(ParallelForError::EmptyRange);
    }
    Ok(())
}

/// The `index`-th of `count` contiguous chunks of `low..high`.
///
/// `count` must be non-zero.
#[must_use]
pub fn chunk(low: i32, high: i32, index: usize, count: usize) -> Range<i32> {
    let len = u64::try_from(i64::from(high) - i64::from(low)).unwrap_or(0);
    let count = count as u64;
    let index = index as u64;
    let (base, rem) = (len / count, len % count);

    let start = index * base + index.min(rem);
    let size = base + u64::from(index < rem);

    // Both bounds lie within `0..=len`, and `low + len == high` fits `i32`.
    let at = |offset: u64| {
        i32::try_from(i64::from(low) + i64::try_from(offset.min(len)).unwrap_or(0)).unwrap_or(high)
    };
    at(start)..at(start + size)
}

fn distribute(low: i32, high: i32, threads: usize, run: &(dyn Fn(Range<i32>) + Sync)) {
    let last = threads - 1;

    thread::scope(|scope| {
        let mut inline_from = last;
        for t in 0..last {
            let range = chunk(low, high, t, threads);
            if range.is_empty() {
                continue;
            }
            let spawned = thread::Builder::new()
                .name(format!("parallel-for-{t}"))
                .spawn_scoped(scope, move || run(range));
            if let Err(err) = spawned {
                warn!("Failed to spawn worker {t}: {err}; running the remaining chunks inline");
                inline_from = t;
                break;
            }
        }

        for t in inline_from..threads {
            run(chunk(low, high, t, threads));
        }
    });
}
