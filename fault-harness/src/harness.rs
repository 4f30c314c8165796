// Copyright (c) The fault-harness Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The test harness: runs test bodies, tallies outcomes and prints reports.
//!
//! All state lives in a [`Harness`]; nothing is process-global, so independent harnesses can
//! coexist. Test bodies receive a [`TestContext`], through which they make assertions, control
//! fault injection and allocate memory.

use crate::{
    allocator::{Allocator, Block, FaultyAllocator, SystemAllocator},
    errors::{AllocError, DisplayErrorChain},
    fault::FaultInjector,
    output::Color,
    reporter::{Reporter, ReporterOutput},
    stopwatch::stopwatch,
};
use chrono::{DateTime, Local};
use std::time::Duration;
use tracing::{debug, warn};

/// Diagnostic information about a failed assertion.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FailureRecord {
    expression: String,
    file: String,
    line: u32,
}

impl FailureRecord {
    /// Creates a new failure record.
    pub fn new(expression: impl Into<String>, file: impl Into<String>, line: u32) -> Self {
        Self {
            expression: expression.into(),
            file: file.into(),
            line,
        }
    }

    /// Returns the source text of the condition that failed.
    pub fn expression(&self) -> &str {
        &self.expression
    }

    /// Returns the source file containing the assertion.
    pub fn file(&self) -> &str {
        &self.file
    }

    /// Returns the line of the assertion.
    pub fn line(&self) -> u32 {
        self.line
    }
}

/// Pass/fail counts for a run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunStats {
    /// The number of tests that finished without a failed assertion.
    pub passed: usize,

    /// The number of tests with at least one failed assertion.
    pub failed: usize,
}

impl RunStats {
    /// Returns the number of tests run.
    pub fn total(&self) -> usize {
        self.passed + self.failed
    }
}

/// Whether a test passed or failed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TestStatus {
    /// Every assertion held.
    Pass,

    /// An assertion failed. Contains the last failed assertion.
    Fail(FailureRecord),
}

impl TestStatus {
    /// Returns true if the test passed.
    pub fn is_success(&self) -> bool {
        matches!(self, TestStatus::Pass)
    }
}

/// The outcome of a single call to [`Harness::run`].
#[derive(Clone, Debug)]
pub struct TestOutcome {
    /// The name of the test.
    pub name: String,

    /// Whether the test passed.
    pub status: TestStatus,

    /// When the test started.
    pub start_time: DateTime<Local>,

    /// How long the test body took.
    pub time_taken: Duration,
}

#[derive(Debug, Default)]
struct RunState {
    pass_count: usize,
    fail_count: usize,
    // The failure within the test currently running, if any.
    current_failure: Option<FailureRecord>,
    last_failure: Option<FailureRecord>,
}

/// Harness builder.
#[derive(Debug, Default)]
pub struct HarnessBuilder {
    color: Color,
}

impl HarnessBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether report lines are colorized.
    pub fn set_color(&mut self, color: Color) -> &mut Self {
        self.color = color;
        self
    }

    /// Creates a harness that allocates through the system allocator.
    pub fn build<'a>(&self, output: ReporterOutput<'a>) -> Harness<'a> {
        self.build_with_allocator(output, SystemAllocator)
    }

    /// Creates a harness that allocates through `allocator`.
    pub fn build_with_allocator<'a, A: Allocator>(
        &self,
        output: ReporterOutput<'a>,
        allocator: A,
    ) -> Harness<'a, A> {
        Harness {
            reporter: Reporter::new(output, self.color),
            state: RunState::default(),
            allocator: FaultyAllocator::new(allocator),
            outcomes: Vec::new(),
        }
    }
}

/// Runs tests and reports their outcomes.
#[derive(Debug)]
pub struct Harness<'a, A = SystemAllocator> {
    reporter: Reporter<'a>,
    state: RunState,
    allocator: FaultyAllocator<A>,
    outcomes: Vec<TestOutcome>,
}

impl<'a> Harness<'a> {
    /// Creates a harness with default settings.
    pub fn new(output: ReporterOutput<'a>) -> Self {
        HarnessBuilder::new().build(output)
    }
}

impl<A: Allocator> Harness<'_, A> {
    /// Runs a test body and reports its outcome.
    ///
    /// If no assertion in the body failed, the pass count is incremented and an `OK` line is
    /// printed to standard output. Otherwise a failure report naming the last failed assertion is
    /// printed to standard error. Either way, later runs proceed normally.
    pub fn run<F>(&mut self, name: &str, body: F)
    where
        F: FnOnce(&mut TestContext<'_, A>),
    {
        let prev_fail_count = self.state.fail_count;
        self.state.current_failure = None;
        debug!(test = name, "starting test");

        let stopwatch = stopwatch();
        body(&mut TestContext {
            state: &mut self.state,
            allocator: &mut self.allocator,
        });
        let snapshot = stopwatch.snapshot();

        let failure = self.state.current_failure.take();
        debug_assert_eq!(
            failure.is_some(),
            self.state.fail_count != prev_fail_count,
            "fail count changes exactly when the test records a failure"
        );
        let status = match failure {
            None => {
                self.state.pass_count += 1;
                TestStatus::Pass
            }
            Some(failure) => TestStatus::Fail(failure),
        };
        debug!(
            test = name,
            passed = status.is_success(),
            time_taken = ?snapshot.duration,
            "finished test"
        );

        let res = match &status {
            TestStatus::Pass => self.reporter.report_success(name),
            TestStatus::Fail(failure) => self.reporter.report_failure(name, failure),
        };
        if let Err(error) = res {
            warn!(
                "failed to report outcome of test `{name}`: {}",
                DisplayErrorChain::new(error)
            );
        }

        self.outcomes.push(TestOutcome {
            name: name.to_owned(),
            status,
            start_time: snapshot.start_time,
            time_taken: snapshot.duration,
        });
    }

    /// Prints the total, passed and failed counts to standard output.
    pub fn print_summary(&mut self) {
        if let Err(error) = self.reporter.report_summary(self.stats()) {
            warn!(
                "failed to print test summary: {}",
                DisplayErrorChain::new(error)
            );
        }
    }

    /// Returns the current pass/fail counts.
    pub fn stats(&self) -> RunStats {
        RunStats {
            passed: self.state.pass_count,
            failed: self.state.fail_count,
        }
    }

    /// Returns the most recent failed assertion across all runs, if any.
    pub fn last_failure(&self) -> Option<&FailureRecord> {
        self.state.last_failure.as_ref()
    }

    /// Returns the outcomes of all tests run so far, in order.
    pub fn outcomes(&self) -> &[TestOutcome] {
        &self.outcomes
    }

    /// Returns the failure schedule.
    pub fn faults(&self) -> &FaultInjector {
        self.allocator.faults()
    }

    /// Returns the fault-injecting allocator, for use outside of a test body.
    pub fn allocator_mut(&mut self) -> &mut FaultyAllocator<A> {
        &mut self.allocator
    }

    /// Clears all counters, recorded failures and outcomes, and turns fault injection off.
    pub fn reset(&mut self) {
        self.state = RunState::default();
        self.outcomes.clear();
        self.allocator.faults_mut().enable_all();
    }
}

/// The handle a test body uses to talk to the harness.
///
/// Implements [`Allocator`] by forwarding to the harness's fault-injecting allocator, so it can
/// be passed directly to code under test.
#[derive(Debug)]
pub struct TestContext<'h, A = SystemAllocator> {
    state: &'h mut RunState,
    allocator: &'h mut FaultyAllocator<A>,
}

impl<A: Allocator> TestContext<'_, A> {
    /// Records the outcome of an assertion and returns whether `condition` held.
    ///
    /// On failure, the test is marked as failed (the fail count is incremented once per test),
    /// the failure is recorded, and fault injection is turned off on both channels so that any
    /// cleanup the caller performs is not starved of memory.
    ///
    /// This is normally called through [`test_assert!`](crate::test_assert), which also returns
    /// from the test body on failure.
    pub fn check(&mut self, condition: bool, expression: &str, file: &str, line: u32) -> bool {
        if condition {
            return true;
        }

        if self.state.current_failure.is_none() {
            self.state.fail_count += 1;
        }
        let record = FailureRecord::new(expression, file, line);
        debug!(expression, file, line, "assertion failed");
        self.state.last_failure = Some(record.clone());
        self.state.current_failure = Some(record);
        self.allocator.faults_mut().enable_all();
        false
    }

    /// Returns true if an assertion has failed in this test.
    pub fn has_failed(&self) -> bool {
        self.state.current_failure.is_some()
    }

    /// Returns the failure schedule.
    pub fn faults(&self) -> &FaultInjector {
        self.allocator.faults()
    }

    /// Returns the fault-injecting allocator.
    pub fn allocator(&mut self) -> &mut FaultyAllocator<A> {
        self.allocator
    }

    /// Makes allocate fail from its `n`-th call onwards.
    pub fn malloc_disable_after(&mut self, n: i64) {
        self.allocator.malloc_disable_after(n);
    }

    /// Makes resize fail from its `n`-th call onwards.
    pub fn realloc_disable_after(&mut self, n: i64) {
        self.allocator.realloc_disable_after(n);
    }

    /// Stops injecting allocate failures.
    pub fn malloc_enable(&mut self) {
        self.allocator.malloc_enable();
    }

    /// Stops injecting resize failures.
    pub fn realloc_enable(&mut self) {
        self.allocator.realloc_enable();
    }

    /// Makes every subsequent allocate fail.
    pub fn malloc_disable(&mut self) {
        self.allocator.malloc_disable();
    }

    /// Makes every subsequent resize fail.
    pub fn realloc_disable(&mut self) {
        self.allocator.realloc_disable();
    }
}

impl<A: Allocator> Allocator for TestContext<'_, A> {
    fn allocate(&mut self, size: usize) -> Option<Block> {
        self.allocator.allocate(size)
    }

    fn resize(&mut self, block: &mut Block, new_size: usize) -> Result<(), AllocError> {
        self.allocator.resize(block, new_size)
    }
}
