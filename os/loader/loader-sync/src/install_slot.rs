use alloc::boxed::Box;
use core::ptr;
use core::sync::atomic::{AtomicPtr, Ordering};

/// An owning slot that publishes one boxed value to asynchronous readers.
///
/// The installer moves a value in with [`install`](Self::install) and gets it
/// back with [`take`](Self::take). In between, a signal handler can borrow it
/// with [`get`](Self::get), which is a single atomic load and therefore safe in
/// trap context.
///
/// The slot does not track outstanding borrows: `take` must only be called once
/// no reader can be running, i.e. after the handler that reads the slot has
/// been deregistered, or from the reader itself on a path that never returns
/// into code holding a borrow.
pub struct InstallSlot<T> {
    ptr: AtomicPtr<T>,
}

impl<T> Default for InstallSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> InstallSlot<T> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            ptr: AtomicPtr::new(ptr::null_mut()),
        }
    }

    /// Move `value` into the slot.
    ///
    /// # Errors
    /// Returns `value` unchanged if the slot is already occupied.
    pub fn install(&self, value: Box<T>) -> Result<(), Box<T>> {
        let raw = Box::into_raw(value);
        match self
            .ptr
            .compare_exchange(ptr::null_mut(), raw, Ordering::AcqRel, Ordering::Acquire)
        {
            Ok(_) => Ok(()),
            // SAFETY: `raw` came from `Box::into_raw` above and was not published.
            Err(_) => Err(unsafe { Box::from_raw(raw) }),
        }
    }

    /// Whether a value is currently installed.
    #[inline]
    pub fn is_installed(&self) -> bool {
        !self.ptr.load(Ordering::Acquire).is_null()
    }

    /// Borrow the installed value.
    ///
    /// # Safety
    /// The caller must guarantee that no concurrent or subsequent
    /// [`take`](Self::take) invalidates the reference while it is alive.
    #[inline]
    pub unsafe fn get(&self) -> Option<&T> {
        let raw = self.ptr.load(Ordering::Acquire);
        // SAFETY: non-null pointers in the slot always come from `Box::into_raw`;
        // liveness is the caller's obligation.
        unsafe { raw.as_ref() }
    }

    /// Move the installed value out, leaving the slot empty.
    pub fn take(&self) -> Option<Box<T>> {
        let raw = self.ptr.swap(ptr::null_mut(), Ordering::AcqRel);
        if raw.is_null() {
            None
        } else {
            // SAFETY: the swap transferred sole ownership of `raw` to us.
            Some(unsafe { Box::from_raw(raw) })
        }
    }
}

impl<T> Drop for InstallSlot<T> {
    fn drop(&mut self) {
        drop(self.take());
    }
}

// Safety: the slot hands out `&T` across threads and moves `T` between them.
unsafe impl<T: Send + Sync> Sync for InstallSlot<T> {}
unsafe impl<T: Send> Send for InstallSlot<T> {}
