// Copyright (c) The fault-harness Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Deterministic allocation failure schedules.
//!
//! A [`FaultChannel`] is a (call counter, fail-after threshold) pair governing one allocation
//! primitive. Every call through the primitive bumps the counter; once the counter's value before
//! the call reaches the threshold, the call fails. A negative threshold never fails.
//!
//! [`FaultInjector`] groups the two channels used by
//! [`FaultyAllocator`](crate::FaultyAllocator): one for allocate and one for resize.

use std::fmt;

/// The threshold that disables fault injection on a channel.
pub const NEVER_FAIL: i64 = -1;

/// Identifies one of the two fault channels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FaultKind {
    /// The allocate-a-block primitive (`malloc`).
    Allocate,

    /// The resize-a-block primitive (`realloc`).
    Resize,
}

impl fmt::Display for FaultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Allocate => write!(f, "malloc"),
            Self::Resize => write!(f, "realloc"),
        }
    }
}

/// The failure schedule for a single allocation primitive.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FaultChannel {
    call_count: u64,
    fail_after: i64,
}

impl FaultChannel {
    /// Creates a channel that never injects failures.
    pub const fn new() -> Self {
        Self {
            call_count: 0,
            fail_after: NEVER_FAIL,
        }
    }

    /// Resets the call counter and makes the `n`-th call (0-indexed) and every later call fail.
    ///
    /// A negative `n` turns injection off.
    pub fn disable_after(&mut self, n: i64) {
        self.call_count = 0;
        self.fail_after = n;
    }

    /// Turns injection off. Equivalent to `disable_after(-1)`.
    pub fn enable(&mut self) {
        self.disable_after(NEVER_FAIL);
    }

    /// Makes every subsequent call fail. Equivalent to `disable_after(0)`.
    pub fn disable(&mut self) {
        self.disable_after(0);
    }

    /// Returns the number of calls made since the channel was last configured.
    pub fn call_count(&self) -> u64 {
        self.call_count
    }

    /// Returns the raw fail-after threshold. Negative means "never fail".
    pub fn fail_after(&self) -> i64 {
        self.fail_after
    }

    /// Returns true if the next call through this channel would fail.
    pub fn would_fail_next(&self) -> bool {
        !self.permits(self.call_count)
    }

    /// Records a call and returns whether it may proceed to the real primitive.
    pub(crate) fn admit(&mut self) -> bool {
        let prev = self.call_count;
        self.call_count = self.call_count.saturating_add(1);
        self.permits(prev)
    }

    fn permits(&self, call_index: u64) -> bool {
        match u64::try_from(self.fail_after) {
            Ok(threshold) => call_index < threshold,
            // Negative thresholds never fail.
            Err(_) => true,
        }
    }
}

impl Default for FaultChannel {
    fn default() -> Self {
        Self::new()
    }
}

/// Both fault channels, addressed independently.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FaultInjector {
    allocate: FaultChannel,
    resize: FaultChannel,
}

impl FaultInjector {
    /// Creates an injector with both channels set to never fail.
    pub const fn new() -> Self {
        Self {
            allocate: FaultChannel::new(),
            resize: FaultChannel::new(),
        }
    }

    /// Returns the channel for the given primitive.
    pub fn channel(&self, kind: FaultKind) -> &FaultChannel {
        match kind {
            FaultKind::Allocate => &self.allocate,
            FaultKind::Resize => &self.resize,
        }
    }

    /// Returns the channel for the given primitive, mutably.
    pub fn channel_mut(&mut self, kind: FaultKind) -> &mut FaultChannel {
        match kind {
            FaultKind::Allocate => &mut self.allocate,
            FaultKind::Resize => &mut self.resize,
        }
    }

    /// Makes allocate fail from its `n`-th call onwards.
    pub fn malloc_disable_after(&mut self, n: i64) {
        self.allocate.disable_after(n);
    }

    /// Makes resize fail from its `n`-th call onwards.
    pub fn realloc_disable_after(&mut self, n: i64) {
        self.resize.disable_after(n);
    }

    /// Stops injecting allocate failures.
    pub fn malloc_enable(&mut self) {
        self.allocate.enable();
    }

    /// Stops injecting resize failures.
    pub fn realloc_enable(&mut self) {
        self.resize.enable();
    }

    /// Makes every subsequent allocate fail.
    pub fn malloc_disable(&mut self) {
        self.allocate.disable();
    }

    /// Makes every subsequent resize fail.
    pub fn realloc_disable(&mut self) {
        self.resize.disable();
    }

    /// Turns injection off on both channels, resetting their counters.
    pub fn enable_all(&mut self) {
        self.malloc_enable();
        self.realloc_enable();
    }
}
