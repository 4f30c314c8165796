// Copyright (c) The fault-harness Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Macros for declaring, asserting in and running tests.

/// Declares a test function.
///
/// ```
/// use fault_harness::{harness_test, test_assert};
///
/// harness_test! {
///     /// Addition still works.
///     fn adds(ctx) {
///         test_assert!(ctx, 1 + 1 == 2);
///     }
/// }
/// ```
///
/// expands to `fn adds(ctx: &mut TestContext<'_>) { ... }`. To run a test against a harness with
/// a custom inner allocator, name its type: `fn adds(ctx: MyAllocator) { ... }`.
#[macro_export]
macro_rules! harness_test {
    ($(#[$meta:meta])* $vis:vis fn $name:ident($ctx:ident) $body:block) => {
        $(#[$meta])*
        $vis fn $name($ctx: &mut $crate::TestContext<'_>) $body
    };
    ($(#[$meta:meta])* $vis:vis fn $name:ident($ctx:ident : $alloc:ty) $body:block) => {
        $(#[$meta])*
        $vis fn $name($ctx: &mut $crate::TestContext<'_, $alloc>) $body
    };
}

/// Asserts a condition inside a test body.
///
/// If the condition is false, the failure is recorded against the running test (see
/// [`TestContext::check`](crate::TestContext::check)) and the enclosing function returns
/// immediately. The enclosing function must return `()`.
#[macro_export]
macro_rules! test_assert {
    ($ctx:expr, $cond:expr $(,)?) => {{
        let condition: bool = $cond;
        if !$ctx.check(
            condition,
            ::core::stringify!($cond),
            ::core::file!(),
            ::core::line!(),
        ) {
            return;
        }
    }};
}

/// Runs a declared test, using its path as the test name.
///
/// `run_test!(harness, my_test)` is `harness.run("my_test", my_test)`.
#[macro_export]
macro_rules! run_test {
    ($harness:expr, $test:path $(,)?) => {
        $harness.run(::core::stringify!($test), $test)
    };
}
