//! `PoolAllocator`: fixed-size-chunk allocator with an intrusive free list.
//!
//! Grounded on `Core/src/Memory/PoolAllocator.c`. The key trick worth
//! preserving is lazy link initialization: a chunk's "next free" word is
//! only ever written once it has been handed out and freed at least once,
//! so constructing a pool with `chunk_count` chunks is O(1) rather than
//! O(chunk_count).

use std::alloc::Layout;
use std::ptr::NonNull;

use parking_lot::Mutex;

use crate::error::{track_error, Error, Result};
use crate::memory::allocator::{
    aligned_size, validate_alignment, Accounting, AllocatedBlock, Allocator,
};

struct PoolState {
    /// Index of the first free chunk, following the intrusive list threaded
    /// through each freed chunk's first `size_of::<usize>()` bytes.
    free_head: Option<usize>,
    /// Number of chunks, counting from the start of the buffer, whose link
    /// word has ever been written. Chunks past this point have never been
    /// allocated, so they need no list entry yet.
    initialized_count: usize,
}

/// A fixed-chunk-size pool allocator, backed by one upfront heap allocation.
pub struct PoolAllocator {
    buffer: NonNull<u8>,
    buffer_layout: Layout,
    chunk_size: usize,
    chunk_count: usize,
    state: Mutex<PoolState>,
    accounting: Accounting,
}

// Safety: all mutable access to `buffer`'s contents goes through `state`'s
// mutex; `buffer`/`buffer_layout` themselves are never mutated after
// construction.
unsafe impl Send for PoolAllocator {}
unsafe impl Sync for PoolAllocator {}

impl PoolAllocator {
    /// Creates a pool of `chunk_count` chunks, each able to hold
    /// `min_chunk_size` bytes aligned to `alignment`.
    pub fn new(min_chunk_size: usize, chunk_count: usize, alignment: usize) -> Result<Self> {
        validate_alignment(alignment)?;
        if chunk_count == 0 {
            return Err(track_error(Error::InvalidArgument(
                "chunk_count must be non-zero".into(),
            )));
        }
        let link_size = std::mem::size_of::<usize>();
        let chunk_size = aligned_size(min_chunk_size.max(link_size));

        let total = chunk_size.checked_mul(chunk_count).ok_or_else(|| {
            track_error(Error::InvalidArgument("pool size overflows usize".into()))
        })?;
        let buffer_layout = Layout::from_size_align(total, alignment.max(1))
            .map_err(|e| track_error(Error::InvalidArgument(e.to_string())))?;

        // Safety: buffer_layout has non-zero size (chunk_count/chunk_size
        // both checked non-zero above).
        let raw = unsafe { std::alloc::alloc(buffer_layout) };
        let buffer = NonNull::new(raw).ok_or_else(|| {
            track_error(Error::OutOfMemory(format!(
                "failed to allocate {total}-byte pool"
            )))
        })?;

        Ok(Self {
            buffer,
            buffer_layout,
            chunk_size,
            chunk_count,
            state: Mutex::new(PoolState {
                free_head: None,
                initialized_count: 0,
            }),
            accounting: Accounting::default(),
        })
    }

    #[must_use]
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    #[must_use]
    pub fn chunk_count(&self) -> usize {
        self.chunk_count
    }

    fn chunk_ptr(&self, index: usize) -> NonNull<u8> {
        // Safety: `index < chunk_count`, so this stays within `buffer`'s
        // allocation.
        unsafe { NonNull::new_unchecked(self.buffer.as_ptr().add(index * self.chunk_size)) }
    }

    /// Safety: `index` must be an already-initialized (i.e. previously
    /// handed-out-at-least-once) chunk.
    unsafe fn read_link(&self, index: usize) -> Option<usize> {
        let raw = self.chunk_ptr(index).cast::<usize>().read();
        if raw == usize::MAX {
            None
        } else {
            Some(raw)
        }
    }

    /// Safety: `index` must be a valid chunk index.
    unsafe fn write_link(&self, index: usize, next: Option<usize>) {
        self.chunk_ptr(index)
            .cast::<usize>()
            .write(next.unwrap_or(usize::MAX));
    }

    fn index_of(&self, ptr: NonNull<u8>) -> Option<usize> {
        let base = self.buffer.as_ptr() as usize;
        let addr = ptr.as_ptr() as usize;
        if addr < base {
            return None;
        }
        let offset = addr - base;
        if offset % self.chunk_size != 0 {
            return None;
        }
        let idx = offset / self.chunk_size;
        (idx < self.chunk_count).then_some(idx)
    }

    /// Resets the pool to its just-constructed state: every chunk is free,
    /// and the free list is rebuilt from scratch. Invalidates every
    /// outstanding `AllocatedBlock` from this pool — the caller is
    /// responsible for not touching any block allocated before the reset.
    pub fn reset(&self) {
        let mut state = self.state.lock();
        state.free_head = None;
        state.initialized_count = 0;
        self.accounting.reset();
    }

    /// Walks the free list, confirming it terminates, never revisits a
    /// chunk, and never references a chunk outside the initialized range.
    /// Returns [`Error::Format`] describing the first inconsistency found;
    /// a clean pool (including a freshly constructed or just-reset one)
    /// always validates.
    pub fn validate(&self) -> Result<()> {
        let state = self.state.lock();
        let mut visited = vec![false; self.chunk_count];
        let mut current = state.free_head;
        while let Some(index) = current {
            if index >= state.initialized_count {
                return Err(track_error(Error::Format(format!(
                    "pool free list references chunk {index}, past the \
                     {}-chunk initialized range",
                    state.initialized_count
                ))));
            }
            if visited[index] {
                return Err(track_error(Error::Format(format!(
                    "pool free list cycles back to chunk {index}"
                ))));
            }
            visited[index] = true;
            // Safety: `index < state.initialized_count`, so its link word
            // has been written at least once.
            current = unsafe { self.read_link(index) };
        }
        Ok(())
    }
}

impl Allocator for PoolAllocator {
    fn alloc(&self, size: usize, alignment: usize) -> Result<Option<AllocatedBlock>> {
        if size == 0 {
            return Ok(None);
        }
        validate_alignment(alignment)?;
        if size > self.chunk_size || alignment > self.buffer_layout.align() {
            return Err(track_error(Error::InvalidArgument(format!(
                "request for {size} bytes aligned to {alignment} exceeds this pool's \
                 {0}-byte chunk size",
                self.chunk_size
            ))));
        }

        let index = {
            let mut state = self.state.lock();
            if let Some(head) = state.free_head {
                // Safety: `head` was linked while initialized.
                state.free_head = unsafe { self.read_link(head) };
                head
            } else if state.initialized_count < self.chunk_count {
                let idx = state.initialized_count;
                state.initialized_count += 1;
                idx
            } else {
                return Err(track_error(Error::OutOfMemory(format!(
                    "pool exhausted: all {} chunks in use",
                    self.chunk_count
                ))));
            }
        };

        self.accounting.record_alloc(self.chunk_size as u64);
        let layout = Layout::from_size_align(self.chunk_size, self.buffer_layout.align())
            .expect("chunk layout derived from a valid buffer layout");
        Ok(Some(AllocatedBlock {
            ptr: self.chunk_ptr(index),
            layout,
        }))
    }

    fn free(&self, block: Option<AllocatedBlock>) -> Result<()> {
        let Some(block) = block else {
            return Ok(());
        };
        let index = self.index_of(block.ptr).ok_or_else(|| {
            track_error(Error::InvalidArgument(
                "pointer does not belong to this pool".into(),
            ))
        })?;

        let mut state = self.state.lock();
        // Safety: `index` was initialized when it was handed out by `alloc`.
        unsafe {
            self.write_link(index, state.free_head);
        }
        state.free_head = Some(index);
        drop(state);

        self.accounting.record_free(self.chunk_size as u64);
        Ok(())
    }

    fn accounting(&self) -> &Accounting {
        &self.accounting
    }
}

impl Drop for PoolAllocator {
    fn drop(&mut self) {
        // Safety: `buffer`/`buffer_layout` were produced together in `new`
        // and never reallocated.
        unsafe {
            std::alloc::dealloc(self.buffer.as_ptr(), self.buffer_layout);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocates_up_to_chunk_count_then_fails() {
        let pool = PoolAllocator::new(32, 4, 8).unwrap();
        let mut blocks = Vec::new();
        for _ in 0..4 {
            blocks.push(pool.alloc(32, 8).unwrap());
        }
        assert!(matches!(pool.alloc(32, 8), Err(Error::OutOfMemory(_))));
        assert_eq!(pool.accounting().current_allocations(), 4);
    }

    #[test]
    fn freed_chunks_are_reused_lifo() {
        let pool = PoolAllocator::new(16, 3, 8).unwrap();
        let a = pool.alloc(16, 8).unwrap().unwrap();
        let a_ptr = a.ptr;
        let _b = pool.alloc(16, 8).unwrap().unwrap();
        pool.free(Some(a)).unwrap();
        let c = pool.alloc(16, 8).unwrap().unwrap();
        assert_eq!(c.ptr, a_ptr);
    }

    #[test]
    fn request_larger_than_chunk_size_rejected() {
        let pool = PoolAllocator::new(16, 2, 8).unwrap();
        assert!(matches!(pool.alloc(17, 8), Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn reset_frees_all_chunks() {
        let pool = PoolAllocator::new(16, 2, 8).unwrap();
        let _a = pool.alloc(16, 8).unwrap();
        let _b = pool.alloc(16, 8).unwrap();
        assert!(pool.alloc(16, 8).is_err());
        pool.reset();
        assert!(pool.alloc(16, 8).unwrap().is_some());
    }

    #[test]
    fn zero_size_alloc_is_none() {
        let pool = PoolAllocator::new(16, 2, 8).unwrap();
        assert!(pool.alloc(0, 8).unwrap().is_none());
    }

    #[test]
    fn validate_passes_on_a_fresh_pool_and_after_alloc_free_cycles() {
        let pool = PoolAllocator::new(16, 4, 8).unwrap();
        pool.validate().unwrap();
        let mut blocks = Vec::new();
        for _ in 0..4 {
            blocks.push(pool.alloc(16, 8).unwrap());
        }
        pool.validate().unwrap();
        for block in blocks {
            pool.free(block).unwrap();
        }
        pool.validate().unwrap();
        pool.reset();
        pool.validate().unwrap();
    }

    #[test]
    fn alloc_failure_updates_the_thread_local_last_error() {
        use crate::error::{last_error, set_last_error, ErrorKind};

        let pool = PoolAllocator::new(16, 1, 8).unwrap();
        let _a = pool.alloc(16, 8).unwrap();
        set_last_error(ErrorKind::None);
        assert!(pool.alloc(16, 8).is_err());
        assert_eq!(last_error(), ErrorKind::OutOfMemory);
    }

    #[test]
    fn validate_rejects_a_cyclic_free_list() {
        let pool = PoolAllocator::new(16, 3, 8).unwrap();
        let a = pool.alloc(16, 8).unwrap().unwrap();
        let b = pool.alloc(16, 8).unwrap().unwrap();
        pool.free(Some(a)).unwrap();
        pool.free(Some(b)).unwrap();
        // Corrupt the free list by pointing the head chunk back at itself.
        let head = pool.state.lock().free_head.unwrap();
        unsafe {
            pool.write_link(head, Some(head));
        }
        assert!(matches!(pool.validate(), Err(Error::Format(_))));
    }
}
