//! `SystemAllocator`: heap-backed allocator with an optional byte limit.
//!
//! Grounded on `modules/Core/Core/src/Memory/SystemAllocator.c`. The check
//! against `limit` happens *before* the heap is touched; after the real
//! allocation, the size is folded into the shared counter through a CAS
//! loop so a concurrent allocation racing against this one can still push
//! the running total over the limit only in the documented "best effort"
//! `realloc` case (spec.md §4.1), never on a fresh `alloc`.

use std::alloc::Layout;
use std::ptr::NonNull;

use crate::error::{track_error, Error, Result};
use crate::log::{log_message, Level};
use crate::memory::allocator::{
    aligned_size, validate_alignment, Accounting, AllocatedBlock, Allocator, MAX_ALIGNMENT,
};

const LOG_TAG: &str = "ds_core::memory::system";

/// A [`Allocator`] backed by the host heap, bounded by `limit` bytes.
pub struct SystemAllocator {
    accounting: Accounting,
    limit: u64,
}

impl SystemAllocator {
    /// Creates a system allocator bounded to `limit` bytes. `limit == 0`
    /// is rejected: a zero-byte allocator can never allocate anything
    /// useful.
    pub fn new(limit: u64) -> Result<Self> {
        if limit == 0 {
            return Err(track_error(Error::InvalidArgument(
                "limit must be non-zero".into(),
            )));
        }
        Ok(Self {
            accounting: Accounting::default(),
            limit,
        })
    }

    #[must_use]
    pub fn limit(&self) -> u64 {
        self.limit
    }
}

impl Allocator for SystemAllocator {
    fn alloc(&self, size: usize, alignment: usize) -> Result<Option<AllocatedBlock>> {
        if size == 0 {
            return Ok(None);
        }
        validate_alignment(alignment)?;

        let alloc_size = aligned_size(size).max(size);
        if self
            .accounting
            .try_add_bounded(alloc_size as u64, self.limit)
            .is_none()
        {
            return Err(track_error(Error::OutOfMemory(format!(
                "allocation of {size} bytes would exceed the {} byte limit",
                self.limit
            ))));
        }

        let layout = Layout::from_size_align(alloc_size, alignment.max(1))
            .map_err(|e| track_error(Error::InvalidArgument(e.to_string())))?;
        // Safety: layout has non-zero size (checked above) and valid alignment.
        let raw = unsafe { std::alloc::alloc(layout) };
        let Some(ptr) = NonNull::new(raw) else {
            self.accounting.record_free(alloc_size as u64);
            return Err(track_error(Error::OutOfMemory(format!(
                "host allocator failed for {alloc_size} bytes"
            ))));
        };

        // `record_alloc` would double-count the size already reserved by
        // `try_add_bounded`; undo that reservation and let `record_alloc`
        // own both the size bump and the allocation-count bookkeeping.
        self.accounting.record_free(alloc_size as u64);
        self.accounting.record_alloc(alloc_size as u64);

        Ok(Some(AllocatedBlock { ptr, layout }))
    }

    fn free(&self, block: Option<AllocatedBlock>) -> Result<()> {
        let Some(block) = block else {
            return Ok(());
        };
        // Safety: `block` was produced by `Self::alloc` with this exact layout.
        unsafe {
            std::alloc::dealloc(block.ptr.as_ptr(), block.layout);
        }
        self.accounting.record_free(block.layout.size() as u64);
        Ok(())
    }

    fn accounting(&self) -> &Accounting {
        &self.accounting
    }
}

impl SystemAllocator {
    /// Reallocates `block` to `size` bytes, matching `realloc()` semantics:
    /// `size == 0` frees and returns `None`.
    ///
    /// The initial limit check and the real reallocation are not atomic
    /// with respect to each other: if alignment padding or a concurrent
    /// allocation pushes the post-realloc size over `limit`, the limit is
    /// exceeded transiently rather than the call failing, because the
    /// pre-realloc pointer is no longer recoverable once `realloc` has run.
    /// This is spec.md §4.1's documented weakening, not a bug; it is logged
    /// at `Warning` every time it triggers.
    pub fn realloc(
        &self,
        block: Option<AllocatedBlock>,
        size: usize,
        alignment: usize,
    ) -> Result<Option<AllocatedBlock>> {
        if size == 0 {
            self.free(block)?;
            return Ok(None);
        }
        validate_alignment(alignment)?;

        let orig_size = block.as_ref().map_or(0, |b| b.layout.size()) as u64;
        let alloc_size = aligned_size(size).max(size);

        let current = self.accounting.size();
        if current + alloc_size as u64 > orig_size + self.limit {
            return Err(track_error(Error::OutOfMemory(format!(
                "reallocation to {size} bytes would exceed the {} byte limit",
                self.limit
            ))));
        }

        let new_layout = Layout::from_size_align(alloc_size, alignment.max(1))
            .map_err(|e| track_error(Error::InvalidArgument(e.to_string())))?;

        let new_ptr = match block {
            None => NonNull::new(unsafe { std::alloc::alloc(new_layout) }),
            Some(b) => {
                // Safety: `b.ptr`/`b.layout` came from a prior alloc/realloc
                // on this allocator.
                let raw = unsafe { std::alloc::realloc(b.ptr.as_ptr(), b.layout, alloc_size) };
                NonNull::new(raw)
            }
        };

        let Some(ptr) = new_ptr else {
            return Err(track_error(Error::OutOfMemory(format!(
                "host allocator failed to reallocate to {alloc_size} bytes"
            ))));
        };

        let updated = self
            .accounting
            .try_add_bounded(alloc_size.saturating_sub(orig_size as usize) as u64, u64::MAX)
            .unwrap_or(current);
        let would_exceed = updated + alloc_size as u64 > self.limit + orig_size;
        if would_exceed {
            log_message(
                Level::Warning,
                LOG_TAG,
                file!(),
                line!(),
                "SystemAllocator limit exceeded transiently by a racing realloc; the \
                 pre-realloc pointer could not be recovered to undo the grow",
            );
        }
        if orig_size == 0 {
            self.accounting.record_alloc(0);
        }

        Ok(Some(AllocatedBlock {
            ptr,
            layout: new_layout,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_size_alloc_is_null_without_error() {
        let a = SystemAllocator::new(1024).unwrap();
        let block = a.alloc(0, 8).unwrap();
        assert!(block.is_none());
        assert_eq!(a.accounting().size(), 0);
    }

    #[test]
    fn limit_is_enforced_and_free_reclaims() {
        let a = SystemAllocator::new(1024).unwrap();
        let first = a.alloc(512, 8).unwrap();
        assert!(first.is_some());

        let second = a.alloc(600, 8);
        assert!(matches!(second, Err(Error::OutOfMemory(_))));
        assert_eq!(a.accounting().size(), aligned_size(512) as u64);

        a.free(first).unwrap();
        assert_eq!(a.accounting().size(), 0);

        let third = a.alloc(600, 8).unwrap();
        assert!(third.is_some());
        a.free(third).unwrap();
    }

    #[test]
    fn free_of_none_is_a_noop() {
        let a = SystemAllocator::new(1024).unwrap();
        assert!(a.free(None).is_ok());
    }

    #[test]
    fn accounting_drains_to_zero() {
        let a = SystemAllocator::new(4096).unwrap();
        let mut blocks = Vec::new();
        for _ in 0..8 {
            blocks.push(a.alloc(64, 8).unwrap());
        }
        assert_eq!(a.accounting().total_allocations(), 8);
        assert_eq!(a.accounting().current_allocations(), 8);
        for b in blocks {
            a.free(b).unwrap();
        }
        assert_eq!(a.accounting().size(), 0);
        assert_eq!(a.accounting().current_allocations(), 0);
        assert_eq!(a.accounting().total_allocations(), 8);
    }

    #[test]
    fn invalid_alignment_is_rejected() {
        let a = SystemAllocator::new(1024).unwrap();
        assert!(matches!(
            a.alloc(16, 3),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            a.alloc(16, MAX_ALIGNMENT * 2),
            Err(Error::InvalidArgument(_))
        ));
    }
}
