//! The polymorphic allocator contract from spec.md §4.1.
//!
//! Grounded on `Core/include/DeepSea/Core/Memory/GenericAllocator.h` and
//! `modules/Core/Core/src/Memory/SystemAllocator.c`: every allocator tracks
//! cumulative size, total allocation count, and current allocation count,
//! all updated atomically so the accounting invariants in spec.md §3.2 hold
//! under concurrent use.

use std::alloc::Layout;
use std::ptr::NonNull;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::{track_error, Error, Result};

/// The maximum alignment the platform allocator honors. 16 covers SIMD
/// types on every target DeepSea runs on without forcing every caller to
/// query it.
pub const MAX_ALIGNMENT: usize = 16;

/// Rounds `size` up to a multiple of [`MAX_ALIGNMENT`].
#[must_use]
pub const fn aligned_size(size: usize) -> usize {
    (size + MAX_ALIGNMENT - 1) & !(MAX_ALIGNMENT - 1)
}

/// Running allocation counters, shared by every allocator kind.
///
/// Kept as a distinct struct (rather than inlined into each allocator) since
/// every concrete allocator needs the exact same three atomics and the same
/// accessor semantics; spec.md §3.2 requires them to move in lockstep
/// regardless of which concrete allocator kind is doing the accounting.
#[derive(Debug, Default)]
pub struct Accounting {
    size: AtomicU64,
    total_allocations: AtomicU64,
    current_allocations: AtomicU64,
}

impl Accounting {
    #[must_use]
    pub fn size(&self) -> u64 {
        self.size.load(Ordering::Acquire)
    }

    #[must_use]
    pub fn total_allocations(&self) -> u64 {
        self.total_allocations.load(Ordering::Acquire)
    }

    #[must_use]
    pub fn current_allocations(&self) -> u64 {
        self.current_allocations.load(Ordering::Acquire)
    }

    pub(crate) fn record_alloc(&self, size: u64) {
        self.size.fetch_add(size, Ordering::AcqRel);
        self.total_allocations.fetch_add(1, Ordering::AcqRel);
        self.current_allocations.fetch_add(1, Ordering::AcqRel);
    }

    pub(crate) fn record_free(&self, size: u64) {
        self.size.fetch_sub(size, Ordering::AcqRel);
        self.current_allocations.fetch_sub(1, Ordering::AcqRel);
    }

    /// CAS loop used by [`crate::memory::SystemAllocator`] to enforce a byte
    /// limit without a lock: returns the previous size if the update was
    /// accepted, or `None` if accepting `additional` would exceed `limit`.
    pub(crate) fn try_add_bounded(&self, additional: u64, limit: u64) -> Option<u64> {
        let mut current = self.size.load(Ordering::Acquire);
        loop {
            let updated = current.checked_add(additional)?;
            if updated > limit {
                return None;
            }
            match self.size.compare_exchange_weak(
                current,
                updated,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(prev) => return Some(prev),
                Err(actual) => current = actual,
            }
        }
    }

    pub(crate) fn reset(&self) {
        self.size.store(0, Ordering::Release);
        self.total_allocations.store(0, Ordering::Release);
        self.current_allocations.store(0, Ordering::Release);
    }
}

/// A single heap block handed out by an [`Allocator`].
///
/// Carries the [`Layout`] it was allocated with so `free` can hand the same
/// layout back to the global allocator: Rust's `GlobalAlloc` requires the
/// allocation's layout again at dealloc time, unlike a bare pointer free.
pub struct AllocatedBlock {
    pub ptr: NonNull<u8>,
    pub layout: Layout,
}

/// The allocator trait every DeepSea allocator kind implements.
///
/// `size == 0` must return `Ok(None)` without touching accounting, matching
/// spec.md §8's boundary behavior. `alignment` must be a power of two no
/// greater than [`MAX_ALIGNMENT`].
pub trait Allocator: Send + Sync {
    /// Allocates `size` bytes aligned to `alignment`.
    fn alloc(&self, size: usize, alignment: usize) -> Result<Option<AllocatedBlock>>;

    /// Frees a block previously returned by `alloc` (or `realloc`) on this
    /// allocator. Freeing `None` (the null-pointer case) always succeeds.
    fn free(&self, block: Option<AllocatedBlock>) -> Result<()>;

    /// A read-only view of this allocator's running counters.
    fn accounting(&self) -> &Accounting;
}

pub(crate) fn validate_alignment(alignment: usize) -> Result<()> {
    if alignment == 0 || !alignment.is_power_of_two() || alignment > MAX_ALIGNMENT {
        return Err(track_error(Error::InvalidArgument(format!(
            "alignment {alignment} must be a power of two <= {MAX_ALIGNMENT}"
        ))));
    }
    Ok(())
}
