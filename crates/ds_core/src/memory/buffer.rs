//! `BufferAllocator`: a bump allocator over a caller-provided or owned
//! buffer, with no individual `free` — only bulk `reset`.
//!
//! Grounded on spec.md §4.1's description of the "buffer" allocator kind
//! (linear/arena allocation, `free` nominally permitted but a no-op besides
//! accounting, the whole buffer reclaimed at once via `reset`).

use std::alloc::Layout;
use std::ptr::NonNull;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::{track_error, Error, Result};
use crate::memory::allocator::{aligned_size, validate_alignment, Accounting, AllocatedBlock, Allocator};

/// A linear (bump) allocator: allocations are served from a monotonically
/// advancing offset into a fixed-size buffer, and individual `free` calls
/// only update accounting, not the offset: memory can't be freed
/// individually once allocated, only reset as a whole.
pub struct BufferAllocator {
    buffer: NonNull<u8>,
    buffer_layout: Layout,
    capacity: usize,
    offset: AtomicUsize,
    accounting: Accounting,
    owns_buffer: bool,
}

// Safety: the buffer is only ever written to disjoint, bump-allocated
// regions; `offset` is the sole point of synchronization for picking a
// region.
unsafe impl Send for BufferAllocator {}
unsafe impl Sync for BufferAllocator {}

impl BufferAllocator {
    /// Allocates and owns a `capacity`-byte backing buffer.
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(track_error(Error::InvalidArgument(
                "capacity must be non-zero".into(),
            )));
        }
        let layout = Layout::from_size_align(capacity, 1)
            .map_err(|e| track_error(Error::InvalidArgument(e.to_string())))?;
        // Safety: layout has non-zero size.
        let raw = unsafe { std::alloc::alloc(layout) };
        let buffer = NonNull::new(raw).ok_or_else(|| {
            track_error(Error::OutOfMemory(format!(
                "failed to allocate {capacity}-byte buffer"
            )))
        })?;
        Ok(Self {
            buffer,
            buffer_layout: layout,
            capacity,
            offset: AtomicUsize::new(0),
            accounting: Accounting::default(),
            owns_buffer: true,
        })
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[must_use]
    pub fn remaining(&self) -> usize {
        self.capacity - self.offset.load(Ordering::Acquire)
    }

    /// Rewinds the bump offset to zero, making the entire buffer available
    /// again. Like the pool allocator's `reset`, this invalidates every
    /// outstanding block.
    pub fn reset(&self) {
        self.offset.store(0, Ordering::Release);
        self.accounting.reset();
    }
}

impl Allocator for BufferAllocator {
    fn alloc(&self, size: usize, alignment: usize) -> Result<Option<AllocatedBlock>> {
        if size == 0 {
            return Ok(None);
        }
        validate_alignment(alignment)?;
        let alloc_size = aligned_size(size).max(size);

        let mut current = self.offset.load(Ordering::Acquire);
        let new_offset = loop {
            let base_addr = self.buffer.as_ptr() as usize + current;
            let aligned_addr = (base_addr + alignment - 1) & !(alignment - 1);
            let padding = aligned_addr - base_addr;
            let updated = current
                .checked_add(padding)
                .and_then(|v| v.checked_add(alloc_size))
                .ok_or_else(|| {
                    track_error(Error::OutOfMemory(
                        "buffer allocator offset overflow".into(),
                    ))
                })?;
            if updated > self.capacity {
                return Err(track_error(Error::OutOfMemory(format!(
                    "buffer allocator exhausted: {} of {} bytes used, {size} requested",
                    current, self.capacity
                ))));
            }
            match self.offset.compare_exchange_weak(
                current,
                updated,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => break updated - alloc_size,
                Err(actual) => current = actual,
            }
        };

        self.accounting.record_alloc(alloc_size as u64);
        // Safety: `new_offset + alloc_size <= capacity`, checked above.
        let ptr = unsafe {
            NonNull::new_unchecked(self.buffer.as_ptr().add(new_offset))
        };
        let layout = Layout::from_size_align(alloc_size, alignment.max(1))
            .expect("already validated alignment and size");
        Ok(Some(AllocatedBlock { ptr, layout }))
    }

    fn free(&self, block: Option<AllocatedBlock>) -> Result<()> {
        let Some(block) = block else {
            return Ok(());
        };
        // No individual reclamation; only the accounting moves.
        self.accounting.record_free(block.layout.size() as u64);
        Ok(())
    }

    fn accounting(&self) -> &Accounting {
        &self.accounting
    }
}

impl Drop for BufferAllocator {
    fn drop(&mut self) {
        if self.owns_buffer {
            // Safety: paired with the allocation in `new`.
            unsafe {
                std::alloc::dealloc(self.buffer.as_ptr(), self.buffer_layout);
            }
        }
    }
}
