// Copyright (c) The fault-harness Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

#![warn(missing_docs)]

//! A tiny unit-test harness for small programs, with deterministic allocation failure injection.
//!
//! Tests are plain functions that take a [`TestContext`]. Inside a test, [`test_assert!`] checks a
//! condition and returns from the test on failure. A [`Harness`] runs tests one at a time,
//! printing `OK\t<name>` for each passing test and a `FAIL` report for each failing one, and
//! [`Harness::print_summary`] prints the final counts.
//!
//! Code under test that takes an `&mut impl` [`Allocator`] can be driven out of memory on demand:
//! `malloc_disable_after(n)` lets the next `n` allocations succeed and fails every one after that
//! (and likewise `realloc_disable_after` for resizes). A failed assertion turns injection off
//! again, so cleanup code is never starved.
//!
//! # Examples
//!
//! ```
//! use fault_harness::{
//!     Allocator, Block, Harness, ReporterOutput, harness_test, run_test, test_assert,
//! };
//!
//! /// Code under test: copies `data` into a freshly allocated block.
//! fn duplicate(alloc: &mut impl Allocator, data: &[u8]) -> Option<Block> {
//!     let mut block = alloc.allocate(data.len())?;
//!     block.as_mut_slice().copy_from_slice(data);
//!     Some(block)
//! }
//!
//! harness_test! {
//!     fn duplicate_reports_out_of_memory(ctx) {
//!         ctx.malloc_disable_after(1);
//!         test_assert!(ctx, duplicate(ctx, b"abc").is_some());
//!         test_assert!(ctx, duplicate(ctx, b"abc").is_none());
//!     }
//! }
//!
//! let mut stdout = Vec::new();
//! let mut stderr = Vec::new();
//! let mut harness = Harness::new(ReporterOutput::Buffer {
//!     stdout: &mut stdout,
//!     stderr: &mut stderr,
//! });
//! run_test!(harness, duplicate_reports_out_of_memory);
//! harness.print_summary();
//! assert_eq!(harness.stats().passed, 1);
//! drop(harness);
//!
//! assert_eq!(
//!     String::from_utf8(stdout).unwrap(),
//!     "OK\tduplicate_reports_out_of_memory\n\n1 total, 1 passed, 0 failed.\n",
//! );
//! ```

pub mod allocator;
pub mod errors;
pub mod fault;
pub mod harness;
mod macros;
pub mod output;
pub mod reporter;
mod stopwatch;

pub use allocator::{Allocator, Block, FaultyAllocator, SystemAllocator};
pub use fault::{FaultChannel, FaultInjector, FaultKind};
pub use harness::{
    FailureRecord, Harness, HarnessBuilder, RunStats, TestContext, TestOutcome, TestStatus,
};
pub use output::Color;
pub use reporter::ReporterOutput;
