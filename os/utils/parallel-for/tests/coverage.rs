use parallel_for::{chunk, parallel_for, parallel_for_2d};
use proptest::prelude::*;
use std::collections::HashSet;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};
use std::thread;

fn counters(len: usize) -> Vec<AtomicU32> {
    (0..len).map(|_| AtomicU32::new(0)).collect()
}

#[test]
fn visits_every_index_once() {
    let hits = counters(1000);
    let stats = parallel_for(0, 1000, 8, |i| {
        hits[usize::try_from(i).unwrap()].fetch_add(1, Ordering::Relaxed);
    })
    .unwrap();

    assert_eq!(stats.threads, 8);
    assert!(hits.iter().all(|h| h.load(Ordering::Relaxed) == 1));
}

#[test]
fn single_thread_runs_on_the_caller() {
    let caller = thread::current().id();
    let seen = Mutex::new(HashSet::new());
    parallel_for(-5, 5, 1, |_| {
        seen.lock().unwrap().insert(thread::current().id());
    })
    .unwrap();

    assert_eq!(seen.into_inner().unwrap(), HashSet::from([caller]));
}

#[test]
fn caller_runs_the_last_chunk() {
    let caller = thread::current().id();
    let last = chunk(0, 40, 3, 4);
    let owners = Mutex::new(Vec::new());
    parallel_for(0, 40, 4, |i| {
        owners.lock().unwrap().push((i, thread::current().id()));
    })
    .unwrap();

    for (i, owner) in owners.into_inner().unwrap() {
        assert_eq!(last.contains(&i), owner == caller, "index {i}");
    }
}

#[test]
fn two_dimensional_covers_the_grid() {
    let (rows, cols) = (17, 9);
    let hits = counters(rows * cols);
    parallel_for_2d(0, 17, 100, 109, 3, |i, j| {
        let (i, j) = (usize::try_from(i).unwrap(), usize::try_from(j - 100).unwrap());
        hits[i * cols + j].fetch_add(1, Ordering::Relaxed);
    })
    .unwrap();

    assert!(hits.iter().all(|h| h.load(Ordering::Relaxed) == 1));
}

#[test]
fn more_threads_than_work() {
    let hits = counters(3);
    parallel_for(0, 3, 16, |i| {
        hits[usize::try_from(i).unwrap()].fetch_add(1, Ordering::Relaxed);
    })
    .unwrap();

    assert!(hits.iter().all(|h| h.load(Ordering::Relaxed) == 1));
}

proptest! {
    #[test]
    fn chunks_partition_the_range(low in -1000i32..1000, len in 1i32..500, threads in 1usize..32) {
        let high = low + len;
        let mut expected_start = low;
        for t in 0..threads {
            let c = chunk(low, high, t, threads);
            prop_assert_eq!(c.start, expected_start);
            prop_assert!(c.len() <= chunk(low, high, 0, threads).len());
            expected_start = c.end;
        }
        prop_assert_eq!(expected_start, high);
    }

    #[test]
    fn sum_matches_sequential(low in -200i32..200, len in 1i32..300, threads in 1usize..8) {
        let high = low + len;
        let sum = std::sync::atomic::AtomicI64::new(0);
        parallel_for(low, high, threads, |i| {
            sum.fetch_add(i64::from(i), Ordering::Relaxed);
        })
        .unwrap();
        prop_assert_eq!(sum.into_inner(), (low..high).map(i64::from).sum::<i64>());
    }
}
