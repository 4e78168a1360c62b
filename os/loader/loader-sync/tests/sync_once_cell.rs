use loader_sync::SyncOnceCell;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

#[test]
fn set_once() {
    let cell = SyncOnceCell::new();
    assert!(cell.get().is_none());
    assert_eq!(cell.set(7_u32).copied(), Ok(7));
    assert_eq!(cell.set(8_u32), Err(8));
    assert_eq!(cell.get().copied(), Some(7));
}

#[test]
fn get_or_init_runs_initializer_once() {
    static CELL: SyncOnceCell<usize> = SyncOnceCell::new();
    static CALLS: AtomicUsize = AtomicUsize::new(0);

    thread::scope(|s| {
        for _ in 0..8 {
            s.spawn(|| {
                let v = CELL.get_or_init(|| {
                    CALLS.fetch_add(1, Ordering::SeqCst);
                    42
                });
                assert_eq!(*v, 42);
            });
        }
    });

    assert_eq!(CALLS.load(Ordering::SeqCst), 1);
}
