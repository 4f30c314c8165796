// Copyright (c) The fault-harness Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Allocation primitives that code under test is written against.
//!
//! Code that wants its out-of-memory paths exercised takes an `&mut impl Allocator` instead of
//! allocating directly. In production that is a [`SystemAllocator`]; under test it is the
//! [`FaultyAllocator`] owned by the harness, whose [`FaultInjector`] decides which calls fail.
//!
//! The two operations mirror `malloc` and `realloc`: allocation signals failure by returning
//! `None`, and a failed resize leaves the original block untouched.

use crate::{
    errors::AllocError,
    fault::{FaultInjector, FaultKind},
};
use std::{
    alloc::{self, Layout},
    fmt,
    ptr::NonNull,
    slice,
};
use tracing::{debug, trace};

/// Alignment of every block, matching what a general-purpose allocator guarantees.
pub const BLOCK_ALIGN: usize = 16;

/// An owned, heap-allocated block of initialized bytes.
///
/// The block is freed when dropped. Zero-sized blocks do not own any allocation.
pub struct Block {
    ptr: NonNull<u8>,
    len: usize,
}

impl Block {
    /// Returns a zero-sized block that owns no memory.
    pub fn empty() -> Self {
        Self {
            ptr: NonNull::dangling(),
            len: 0,
        }
    }

    /// Returns the size of the block in bytes.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true if the block is zero-sized.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the block's start address.
    pub fn as_ptr(&self) -> *const u8 {
        self.ptr.as_ptr()
    }

    /// Returns the contents of the block.
    pub fn as_slice(&self) -> &[u8] {
        // SAFETY: ptr is valid for len initialized bytes (dangling and aligned when len is 0),
        // and the borrow of self prevents a concurrent resize or free.
        unsafe { slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }

    /// Returns the contents of the block, mutably.
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        // SAFETY: as in as_slice, and the mutable borrow guarantees exclusive access.
        unsafe { slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len) }
    }
}

impl fmt::Debug for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Block")
            .field("ptr", &self.ptr)
            .field("len", &self.len)
            .finish()
    }
}

impl Drop for Block {
    fn drop(&mut self) {
        if let Some(layout) = block_layout(self.len) {
            // SAFETY: non-empty blocks are only ever created by SystemAllocator with exactly
            // this layout.
            unsafe { alloc::dealloc(self.ptr.as_ptr(), layout) };
        }
    }
}

/// Returns the layout for a non-empty block of `size` bytes, or `None` for zero-sized blocks and
/// sizes no allocator could satisfy.
fn block_layout(size: usize) -> Option<Layout> {
    if size == 0 {
        return None;
    }
    Layout::from_size_align(size, BLOCK_ALIGN).ok()
}

/// The allocation interface that code under test is written against.
pub trait Allocator {
    /// Allocates a block of `size` bytes. Returns `None` on failure.
    fn allocate(&mut self, size: usize) -> Option<Block>;

    /// Resizes `block` to `new_size` bytes, preserving its contents up to the smaller of the two
    /// sizes.
    ///
    /// On failure, `block` is left exactly as it was.
    fn resize(&mut self, block: &mut Block, new_size: usize) -> Result<(), AllocError>;
}

impl<A: Allocator + ?Sized> Allocator for &mut A {
    fn allocate(&mut self, size: usize) -> Option<Block> {
        (**self).allocate(size)
    }

    fn resize(&mut self, block: &mut Block, new_size: usize) -> Result<(), AllocError> {
        (**self).resize(block, new_size)
    }
}

/// The real allocator, backed by the global allocator.
///
/// Fresh blocks and the grown tail of resized blocks are zero-filled.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemAllocator;

impl Allocator for SystemAllocator {
    fn allocate(&mut self, size: usize) -> Option<Block> {
        if size == 0 {
            return Some(Block::empty());
        }
        let layout = block_layout(size)?;
        // SAFETY: layout has a non-zero size.
        let ptr = unsafe { alloc::alloc_zeroed(layout) };
        NonNull::new(ptr).map(|ptr| Block { ptr, len: size })
    }

    fn resize(&mut self, block: &mut Block, new_size: usize) -> Result<(), AllocError> {
        let old_size = block.len;
        if new_size == old_size {
            return Ok(());
        }
        if new_size == 0 {
            // Dropping the old block frees it.
            *block = Block::empty();
            return Ok(());
        }

        let Some(old_layout) = block_layout(old_size) else {
            // Growing an empty block is a fresh allocation.
            *block = self
                .allocate(new_size)
                .ok_or_else(|| AllocError::new(new_size))?;
            return Ok(());
        };
        // Rejects sizes that would overflow isize once rounded up to the alignment.
        block_layout(new_size).ok_or_else(|| AllocError::new(new_size))?;

        // SAFETY: block.ptr was allocated with old_layout, and new_size is non-zero and valid for
        // BLOCK_ALIGN as checked above.
        let ptr = unsafe { alloc::realloc(block.ptr.as_ptr(), old_layout, new_size) };
        // A null return leaves the original allocation in place.
        let ptr = NonNull::new(ptr).ok_or_else(|| AllocError::new(new_size))?;

        if new_size > old_size {
            // SAFETY: the allocation is valid for new_size bytes; only the tail past old_size is
            // uninitialized.
            unsafe { ptr.as_ptr().add(old_size).write_bytes(0, new_size - old_size) };
        }
        block.ptr = ptr;
        block.len = new_size;
        Ok(())
    }
}

/// An allocator that fails according to a [`FaultInjector`] schedule.
///
/// Calls that the schedule permits are delegated to the inner allocator, whose own failures pass
/// through unchanged. Calls that the schedule rejects return the failure indicator without
/// touching the inner allocator.
#[derive(Clone, Debug, Default)]
pub struct FaultyAllocator<A = SystemAllocator> {
    inner: A,
    faults: FaultInjector,
}

impl FaultyAllocator {
    /// Creates a fault-injecting wrapper around the system allocator, with injection disabled.
    pub fn system() -> Self {
        Self::new(SystemAllocator)
    }
}

impl<A: Allocator> FaultyAllocator<A> {
    /// Wraps `inner`, with injection disabled.
    pub fn new(inner: A) -> Self {
        Self {
            inner,
            faults: FaultInjector::new(),
        }
    }

    /// Returns the failure schedule.
    pub fn faults(&self) -> &FaultInjector {
        &self.faults
    }

    /// Returns the failure schedule, mutably.
    pub fn faults_mut(&mut self) -> &mut FaultInjector {
        &mut self.faults
    }

    /// Returns the wrapped allocator.
    pub fn inner(&self) -> &A {
        &self.inner
    }

    /// Returns the wrapped allocator, mutably. Calls made through it bypass the schedule.
    pub fn inner_mut(&mut self) -> &mut A {
        &mut self.inner
    }

    /// Makes allocate fail from its `n`-th call onwards.
    pub fn malloc_disable_after(&mut self, n: i64) {
        self.faults.malloc_disable_after(n);
    }

    /// Makes resize fail from its `n`-th call onwards.
    pub fn realloc_disable_after(&mut self, n: i64) {
        self.faults.realloc_disable_after(n);
    }

    /// Stops injecting allocate failures.
    pub fn malloc_enable(&mut self) {
        self.faults.malloc_enable();
    }

    /// Stops injecting resize failures.
    pub fn realloc_enable(&mut self) {
        self.faults.realloc_enable();
    }

    /// Makes every subsequent allocate fail.
    pub fn malloc_disable(&mut self) {
        self.faults.malloc_disable();
    }

    /// Makes every subsequent resize fail.
    pub fn realloc_disable(&mut self) {
        self.faults.realloc_disable();
    }

    fn admit(&mut self, kind: FaultKind, size: usize) -> bool {
        let channel = self.faults.channel_mut(kind);
        let call = channel.call_count();
        let admitted = channel.admit();
        if admitted {
            trace!(%kind, call, size, "delegating to inner allocator");
        } else {
            debug!(
                %kind,
                call,
                size,
                fail_after = channel.fail_after(),
                "injecting allocation failure"
            );
        }
        admitted
    }
}

impl<A: Allocator> Allocator for FaultyAllocator<A> {
    fn allocate(&mut self, size: usize) -> Option<Block> {
        if self.admit(FaultKind::Allocate, size) {
            self.inner.allocate(size)
        } else {
            None
        }
    }

    fn resize(&mut self, block: &mut Block, new_size: usize) -> Result<(), AllocError> {
        if self.admit(FaultKind::Resize, new_size) {
            self.inner.resize(block, new_size)
        } else {
            Err(AllocError::new(new_size))
        }
    }
}
