// Copyright (c) The fault-harness Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Errors produced by fault-harness.

use crate::output::Color;
use std::{fmt, io};
use thiserror::Error;

/// A resize request could not be satisfied.
///
/// Returned by [`Allocator::resize`](crate::Allocator::resize). The block passed in is left
/// untouched, exactly as if the request had never been made. Injected failures and genuine
/// allocator failures are indistinguishable through this type.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
#[error("failed to resize block to {requested} bytes")]
pub struct AllocError {
    requested: usize,
}

impl AllocError {
    /// Creates a new error for a request of `requested` bytes.
    ///
    /// Custom [`Allocator`](crate::Allocator) implementations return this to signal failure.
    pub fn new(requested: usize) -> Self {
        Self { requested }
    }

    /// Returns the size that was requested.
    pub fn requested(&self) -> usize {
        self.requested
    }
}

/// The kind of report line that failed to be written.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReportLineKind {
    /// The `OK` line for a passing test.
    Success,

    /// The `FAIL` block for a failing test.
    Failure,

    /// The final summary line.
    Summary,
}

impl fmt::Display for ReportLineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => write!(f, "success line"),
            Self::Failure => write!(f, "failure report"),
            Self::Summary => write!(f, "summary line"),
        }
    }
}

/// An error that occurred while writing a report line.
#[derive(Debug, Error)]
#[error("error writing {kind}")]
pub struct WriteEventError {
    kind: ReportLineKind,
    #[source]
    err: io::Error,
}

impl WriteEventError {
    pub(crate) fn new(kind: ReportLineKind, err: io::Error) -> Self {
        Self { kind, err }
    }

    /// Returns the kind of line that failed to be written.
    pub fn kind(&self) -> ReportLineKind {
        self.kind
    }
}

/// Error returned while parsing a [`Color`] value from a string.
#[derive(Clone, Debug, Error)]
#[error(
    "unrecognized value for color: {input}\n(known values: {})",
    Color::variants().join(", "),
)]
pub struct ColorParseError {
    input: String,
}

impl ColorParseError {
    pub(crate) fn new(input: impl Into<String>) -> Self {
        Self {
            input: input.into(),
        }
    }
}

/// Displays an error along with its chain of sources.
#[derive(Clone, Copy, Debug)]
pub struct DisplayErrorChain<E> {
    error: E,
}

impl<E: std::error::Error> DisplayErrorChain<E> {
    /// Creates a new `DisplayErrorChain`.
    pub fn new(error: E) -> Self {
        Self { error }
    }
}

impl<E: std::error::Error> fmt::Display for DisplayErrorChain<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        let mut source = self.error.source();
        if source.is_some() {
            write!(f, "\n  caused by:")?;
        }
        while let Some(err) = source {
            write!(f, "\n  - {err}")?;
            source = err.source();
        }
        Ok(())
    }
}
