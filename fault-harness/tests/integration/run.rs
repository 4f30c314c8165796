// Copyright (c) The fault-harness Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::fixtures::{LimitedAllocator, capture, capture_with};
use fault_harness::{
    Allocator, Color, FailureRecord, FaultInjector, HarnessBuilder, ReporterOutput, RunStats,
    TestContext, TestStatus, harness_test, run_test, test_assert,
};
use pretty_assertions::assert_eq;

harness_test! {
    fn arithmetic_holds(ctx) {
        test_assert!(ctx, 1 + 1 == 2);
        test_assert!(ctx, "abc".len() == 3);
    }
}

harness_test! {
    fn three_failures(ctx) {
        test_assert!(ctx, 1 + 1 == 3);
        test_assert!(ctx, false);
        test_assert!(ctx, "a" == "b");
    }
}

mod cases {
    use fault_harness::{harness_test, test_assert};

    harness_test! {
        pub(crate) fn nested(ctx) {
            test_assert!(ctx, true);
        }
    }
}

fn failure_block(name: &str, failure: &FailureRecord) -> String {
    format!(
        "FAIL  {name}\n\n      In file {}, line {}:\n\n          {}\n\n      \
         Assertion of the above expression failed.\n\n",
        failure.file(),
        failure.line(),
        failure.expression(),
    )
}

#[test]
fn passing_test_prints_ok() {
    let captured = capture(|harness| {
        run_test!(harness, arithmetic_holds);
    });

    assert_eq!(captured.stdout, "OK\tarithmetic_holds\n");
    assert_eq!(captured.stderr, "");
    assert_eq!(captured.stats, RunStats { passed: 1, failed: 0 });
    assert_eq!(captured.outcomes[0].name, "arithmetic_holds");
    assert_eq!(captured.outcomes[0].status, TestStatus::Pass);
}

#[test]
fn one_pass_one_fail_summary() {
    let captured = capture(|harness| {
        run_test!(harness, arithmetic_holds);
        run_test!(harness, three_failures);
        harness.print_summary();
    });

    // The fail count counts failing tests, not failing assertions.
    assert_eq!(captured.stats, RunStats { passed: 1, failed: 1 });
    assert_eq!(captured.stats.total(), 2);
    assert_eq!(
        captured.stdout,
        "OK\tarithmetic_holds\n\n2 total, 1 passed, 1 failed.\n"
    );

    let TestStatus::Fail(failure) = &captured.outcomes[1].status else {
        panic!("three_failures should have failed");
    };
    // Only the first assertion runs.
    assert_eq!(failure.expression(), "1 + 1 == 3");
    assert_eq!(failure.file(), file!());
    assert!(failure.line() > 0);
    assert_eq!(captured.stderr, failure_block("three_failures", failure));
}

#[test]
fn failed_assertion_returns_from_test() {
    let mut reached_after_failure = false;
    let mut reached_before_failure = false;

    let captured = capture(|harness| {
        harness.run("short_circuit", |ctx| {
            reached_before_failure = true;
            test_assert!(ctx, 2 < 1);
            reached_after_failure = true;
        });
    });

    assert!(reached_before_failure);
    assert!(!reached_after_failure, "statement after failed assertion ran");
    assert_eq!(captured.stats, RunStats { passed: 0, failed: 1 });
}

#[test]
fn failing_test_does_not_stop_later_runs() {
    let captured = capture(|harness| {
        run_test!(harness, three_failures);
        run_test!(harness, arithmetic_holds);
        run_test!(harness, three_failures);
        run_test!(harness, arithmetic_holds);
        harness.print_summary();
    });

    assert_eq!(captured.stats, RunStats { passed: 2, failed: 2 });
    assert_eq!(
        captured.stdout,
        "OK\tarithmetic_holds\nOK\tarithmetic_holds\n\n4 total, 2 passed, 2 failed.\n"
    );
    assert_eq!(captured.stderr.matches("FAIL  three_failures\n").count(), 2);
}

#[test]
fn assertions_in_helpers_count_once() {
    fn expect_len(ctx: &mut TestContext<'_>, bytes: &[u8], len: usize) {
        test_assert!(ctx, bytes.len() == len);
    }

    let mut helper_calls = 0;
    let captured = capture(|harness| {
        harness.run("helpers", |ctx| {
            // A failed assertion only returns from the helper it is in.
            expect_len(ctx, b"ab", 3);
            helper_calls += 1;
            expect_len(ctx, b"abc", 1);
            helper_calls += 1;
        });
        assert_eq!(
            harness.last_failure().map(FailureRecord::expression),
            Some("bytes.len() == len")
        );
    });

    assert_eq!(helper_calls, 2);
    assert_eq!(captured.stats, RunStats { passed: 0, failed: 1 });
    assert_eq!(captured.stderr.matches("FAIL  helpers\n").count(), 1);
}

#[test]
fn summary_mid_run_reports_partial_counts() {
    let captured = capture(|harness| {
        run_test!(harness, arithmetic_holds);
        harness.print_summary();
        run_test!(harness, three_failures);
        harness.print_summary();
    });

    assert_eq!(
        captured.stdout,
        "OK\tarithmetic_holds\n\
         \n1 total, 1 passed, 0 failed.\n\
         \n2 total, 1 passed, 1 failed.\n"
    );
}

#[test]
fn empty_run_summary() {
    let captured = capture(|harness| harness.print_summary());
    assert_eq!(captured.stdout, "\n0 total, 0 passed, 0 failed.\n");
    assert_eq!(captured.stats.total(), 0);
}

#[test]
fn run_test_uses_path_as_name() {
    let captured = capture(|harness| {
        run_test!(harness, cases::nested);
    });
    assert_eq!(captured.stdout, "OK\tcases::nested\n");
}

#[test]
fn harnesses_are_independent() {
    let mut first_out = Vec::new();
    let mut first_err = Vec::new();
    let mut second_out = Vec::new();
    let mut second_err = Vec::new();

    let mut first = HarnessBuilder::new().build(ReporterOutput::Buffer {
        stdout: &mut first_out,
        stderr: &mut first_err,
    });
    let mut second = HarnessBuilder::new().build(ReporterOutput::Buffer {
        stdout: &mut second_out,
        stderr: &mut second_err,
    });

    first.run("configure", |ctx| ctx.malloc_disable());
    run_test!(first, three_failures);
    run_test!(second, arithmetic_holds);

    assert_eq!(first.stats(), RunStats { passed: 1, failed: 1 });
    assert_eq!(second.stats(), RunStats { passed: 1, failed: 0 });
    // The failed assertion in `first` re-enabled its allocator; `second` was never disabled.
    assert_eq!(*first.faults(), FaultInjector::new());
    second.run("allocates", |ctx| {
        test_assert!(ctx, ctx.allocate(4).is_some());
    });
    assert_eq!(second.stats().passed, 2);
}

#[test]
fn colorized_buffer_output() {
    let mut builder = HarnessBuilder::new();
    builder.set_color(Color::Always);
    let captured = capture_with(builder, |harness| {
        run_test!(harness, arithmetic_holds);
        run_test!(harness, three_failures);
    });

    assert!(captured.stdout.contains("\x1b["));
    assert!(captured.stdout.ends_with("\tarithmetic_holds\n"));
    assert!(captured.stderr.contains("\x1b["));
    assert!(captured.stderr.contains("  three_failures\n\n"));
}

harness_test! {
    fn limited_allocations(ctx: LimitedAllocator) {
        test_assert!(ctx, ctx.allocate(8).is_some());
        test_assert!(ctx, ctx.allocate(1024).is_none());
    }
}

#[test]
fn custom_inner_allocator() {
    let mut stdout = Vec::new();
    let mut stderr = Vec::new();
    let mut harness = HarnessBuilder::new().build_with_allocator(
        ReporterOutput::Buffer {
            stdout: &mut stdout,
            stderr: &mut stderr,
        },
        LimitedAllocator::new(64),
    );

    run_test!(harness, limited_allocations);
    assert_eq!(harness.stats(), RunStats { passed: 1, failed: 0 });
    assert_eq!(harness.allocator_mut().inner().refusals, 1);
    drop(harness);

    assert_eq!(String::from_utf8(stdout).unwrap(), "OK\tlimited_allocations\n");
}
