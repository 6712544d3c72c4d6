//! `GenericAllocator`: adapts an arbitrary alloc/free pair into the
//! [`Allocator`] trait, for callers that hold a host-provided allocator
//! rather than one of the concrete kinds in this module.
//!
//! Grounded on `Core/include/DeepSea/Core/Memory/GenericAllocator.h`, which
//! defines the base `dsAllocator` as a pair of function pointers
//! (`allocFunc`/`freeFunc`) plus `userData`; every concrete allocator kind
//! embeds that base struct and every call site that doesn't care which
//! concrete kind it has just calls through the function pointers. A trait
//! object (`&dyn Allocator`) already gives Rust callers that, so this type
//! exists specifically for wrapping a *non-`Allocator`* pair of host
//! closures (e.g. bindings to a foreign allocator) into one.

use std::alloc::Layout;
use std::ptr::NonNull;

use crate::error::{track_error, Error, Result};
use crate::memory::allocator::{validate_alignment, Accounting, AllocatedBlock, Allocator};

/// A raw allocate function: `(size, alignment) -> raw pointer or null`.
pub type RawAllocFn = dyn Fn(usize, usize) -> *mut u8 + Send + Sync;
/// A raw free function, given back the exact `(ptr, size, alignment)` a
/// prior `RawAllocFn` call returned/received.
pub type RawFreeFn = dyn Fn(NonNull<u8>, usize, usize) + Send + Sync;

/// Wraps host-provided raw alloc/free closures as an [`Allocator`], adding
/// the same accounting every concrete DeepSea allocator kind provides.
pub struct GenericAllocator {
    alloc_fn: Box<RawAllocFn>,
    free_fn: Box<RawFreeFn>,
    accounting: Accounting,
}

impl GenericAllocator {
    pub fn new(
        alloc_fn: impl Fn(usize, usize) -> *mut u8 + Send + Sync + 'static,
        free_fn: impl Fn(NonNull<u8>, usize, usize) + Send + Sync + 'static,
    ) -> Self {
        Self {
            alloc_fn: Box::new(alloc_fn),
            free_fn: Box::new(free_fn),
            accounting: Accounting::default(),
        }
    }
}

impl Allocator for GenericAllocator {
    fn alloc(&self, size: usize, alignment: usize) -> Result<Option<AllocatedBlock>> {
        if size == 0 {
            return Ok(None);
        }
        validate_alignment(alignment)?;
        let raw = (self.alloc_fn)(size, alignment);
        let Some(ptr) = NonNull::new(raw) else {
            return Err(track_error(Error::OutOfMemory(format!(
                "generic allocator backend returned null for {size} bytes"
            ))));
        };
        self.accounting.record_alloc(size as u64);
        let layout = Layout::from_size_align(size, alignment.max(1))
            .map_err(|e| track_error(Error::InvalidArgument(e.to_string())))?;
        Ok(Some(AllocatedBlock { ptr, layout }))
    }

    fn free(&self, block: Option<AllocatedBlock>) -> Result<()> {
        let Some(block) = block else {
            return Ok(());
        };
        (self.free_fn)(block.ptr, block.layout.size(), block.layout.align());
        self.accounting.record_free(block.layout.size() as u64);
        Ok(())
    }

    fn accounting(&self) -> &Accounting {
        &self.accounting
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::alloc::{alloc, dealloc};

    #[test]
    fn wraps_raw_functions_with_accounting() {
        let allocator = GenericAllocator::new(
            |size, align| unsafe {
                alloc(Layout::from_size_align(size, align.max(1)).unwrap())
            },
            |ptr, size, align| unsafe {
                dealloc(
                    ptr.as_ptr(),
                    Layout::from_size_align(size, align.max(1)).unwrap(),
                )
            },
        );
        let block = allocator.alloc(32, 8).unwrap();
        assert!(block.is_some());
        assert_eq!(allocator.accounting().current_allocations(), 1);
        allocator.free(block).unwrap();
        assert_eq!(allocator.accounting().current_allocations(), 0);
    }
}
