// Copyright (c) The fault-harness Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use fault_harness::{
    Allocator, Block, Harness, HarnessBuilder, ReporterOutput, RunStats, TestOutcome,
    errors::AllocError,
};

/// Everything a harness produced.
#[derive(Debug)]
pub(crate) struct Captured {
    pub(crate) stdout: String,
    pub(crate) stderr: String,
    pub(crate) stats: RunStats,
    pub(crate) outcomes: Vec<TestOutcome>,
}

/// Runs `f` against a fresh harness writing into buffers.
pub(crate) fn capture(f: impl FnOnce(&mut Harness<'_>)) -> Captured {
    capture_with(HarnessBuilder::new(), f)
}

/// Runs `f` against a harness built by `builder`, writing into buffers.
pub(crate) fn capture_with(
    builder: HarnessBuilder,
    f: impl FnOnce(&mut Harness<'_>),
) -> Captured {
    let mut stdout = Vec::new();
    let mut stderr = Vec::new();
    let (stats, outcomes) = {
        let mut harness = builder.build(ReporterOutput::Buffer {
            stdout: &mut stdout,
            stderr: &mut stderr,
        });
        f(&mut harness);
        (harness.stats(), harness.outcomes().to_vec())
    };

    Captured {
        stdout: String::from_utf8(stdout).expect("stdout is valid UTF-8"),
        stderr: String::from_utf8(stderr).expect("stderr is valid UTF-8"),
        stats,
        outcomes,
    }
}

/// A growable byte buffer written against [`Allocator`], standing in for code under test.
///
/// Capacity doubles on growth. A failed push leaves the buffer exactly as it was.
#[derive(Debug)]
pub(crate) struct ByteVec {
    block: Block,
    len: usize,
}

impl ByteVec {
    pub(crate) fn with_capacity(alloc: &mut impl Allocator, capacity: usize) -> Option<Self> {
        Some(Self {
            block: alloc.allocate(capacity)?,
            len: 0,
        })
    }

    pub(crate) fn push(&mut self, alloc: &mut impl Allocator, byte: u8) -> Result<(), AllocError> {
        if self.len == self.block.len() {
            let new_capacity = (self.block.len() * 2).max(1);
            alloc.resize(&mut self.block, new_capacity)?;
        }
        self.block.as_mut_slice()[self.len] = byte;
        self.len += 1;
        Ok(())
    }

    pub(crate) fn extend(
        &mut self,
        alloc: &mut impl Allocator,
        bytes: &[u8],
    ) -> Result<(), AllocError> {
        for &byte in bytes {
            self.push(alloc, byte)?;
        }
        Ok(())
    }

    pub(crate) fn capacity(&self) -> usize {
        self.block.len()
    }

    pub(crate) fn as_slice(&self) -> &[u8] {
        &self.block.as_slice()[..self.len]
    }
}

/// An inner allocator that refuses any request larger than `limit`, simulating genuine memory
/// exhaustion.
#[derive(Debug)]
pub(crate) struct LimitedAllocator {
    pub(crate) limit: usize,
    pub(crate) refusals: usize,
}

impl LimitedAllocator {
    pub(crate) fn new(limit: usize) -> Self {
        Self { limit, refusals: 0 }
    }
}

impl Allocator for LimitedAllocator {
    fn allocate(&mut self, size: usize) -> Option<Block> {
        if size > self.limit {
            self.refusals += 1;
            return None;
        }
        fault_harness::SystemAllocator.allocate(size)
    }

    fn resize(&mut self, block: &mut Block, new_size: usize) -> Result<(), AllocError> {
        if new_size > self.limit {
            self.refusals += 1;
            return Err(AllocError::new(new_size));
        }
        fault_harness::SystemAllocator.resize(block, new_size)
    }
}
