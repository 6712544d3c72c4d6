//! Spinlock and counter primitives layered on `std::sync::atomic` (spec.md
//! §4.2).
//!
//! `std::sync::atomic` already covers raw per-width atomic access directly,
//! so the piece worth building here is a spinlock over arbitrary state,
//! layered on top of it: used at several call sites in this engine
//! (`FullScreenResolve`'s process-wide geometry guard among them) for a
//! section too short-lived to justify a full mutex parked on the OS
//! scheduler.

use std::cell::UnsafeCell;
use std::hint;
use std::sync::atomic::{AtomicBool, Ordering};

/// A spinlock-guarded value. Busy-waits rather than parking the calling
/// thread, so it should only protect sections that are expected to be held
/// for a handful of instructions (e.g. swapping a refcounted singleton into
/// place once).
pub struct SpinLock<T> {
    locked: AtomicBool,
    value: UnsafeCell<T>,
}

// Safety: `value` is only ever accessed while `locked` is held exclusively.
unsafe impl<T: Send> Send for SpinLock<T> {}
unsafe impl<T: Send> Sync for SpinLock<T> {}

impl<T> SpinLock<T> {
    pub const fn new(value: T) -> Self {
        Self {
            locked: AtomicBool::new(false),
            value: UnsafeCell::new(value),
        }
    }

    pub fn lock(&self) -> SpinLockGuard<'_, T> {
        while self
            .locked
            .compare_exchange_weak(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            hint::spin_loop();
        }
        SpinLockGuard { lock: self }
    }
}

pub struct SpinLockGuard<'a, T> {
    lock: &'a SpinLock<T>,
}

impl<T> std::ops::Deref for SpinLockGuard<'_, T> {
    type Target = T;
    fn deref(&self) -> &T {
        // Safety: holding the guard implies `locked` is held by us.
        unsafe { &*self.lock.value.get() }
    }
}

impl<T> std::ops::DerefMut for SpinLockGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        // Safety: holding the guard implies `locked` is held by us.
        unsafe { &mut *self.lock.value.get() }
    }
}

impl<T> Drop for SpinLockGuard<'_, T> {
    fn drop(&mut self) {
        self.lock.locked.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn only_one_thread_observes_the_critical_section_at_a_time() {
        let lock = Arc::new(SpinLock::new(0u32));
        let mut handles = Vec::new();
        for _ in 0..8 {
            let lock = lock.clone();
            handles.push(thread::spawn(move || {
                for _ in 0..1000 {
                    *lock.lock() += 1;
                }
            }));
        }
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(*lock.lock(), 8000);
    }
}
