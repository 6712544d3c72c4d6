//! Threading primitives (spec.md §4.2).

mod atomic;
mod thread;
mod tls;

pub use atomic::{SpinLock, SpinLockGuard};
pub use thread::{current_id, sleep, yield_now, Thread, ThreadId};
pub use tls::ThreadLocalSlot;
