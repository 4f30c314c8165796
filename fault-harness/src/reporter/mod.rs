// Copyright (c) The fault-harness Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Prints test outcomes and the run summary.
//!
//! Success lines and the summary go to standard output, failure reports go to standard error.
//! Both can be redirected into in-memory buffers through [`ReporterOutput::Buffer`].

mod displayer;
mod helpers;

use crate::{
    errors::{ReportLineKind, WriteEventError},
    harness::{FailureRecord, RunStats},
    output::Color,
};
use helpers::Styles;
use std::{
    fmt,
    io::{self, Write},
};

/// Output destinations for the reporter.
///
/// This is usually the process's standard streams, but can be in-memory buffers for tests.
pub enum ReporterOutput<'a> {
    /// Write to the process's standard output and standard error.
    Terminal,

    /// Write to buffers.
    Buffer {
        /// Receives success lines and the summary.
        stdout: &'a mut Vec<u8>,

        /// Receives failure reports.
        stderr: &'a mut Vec<u8>,
    },
}

impl fmt::Debug for ReporterOutput<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Terminal => f.write_str("Terminal"),
            Self::Buffer { stdout, stderr } => f
                .debug_struct("Buffer")
                .field("stdout_len", &stdout.len())
                .field("stderr_len", &stderr.len())
                .finish(),
        }
    }
}

#[derive(Clone, Copy, Debug)]
enum Stream {
    Stdout,
    Stderr,
}

/// Writes report lines to the configured output.
#[derive(Debug)]
pub(crate) struct Reporter<'a> {
    stdout_styles: Styles,
    stderr_styles: Styles,
    output: ReporterOutput<'a>,
}

impl<'a> Reporter<'a> {
    pub(crate) fn new(output: ReporterOutput<'a>, color: Color) -> Self {
        let mut stdout_styles = Styles::default();
        let mut stderr_styles = Styles::default();
        let (colorize_stdout, colorize_stderr) = match &output {
            ReporterOutput::Terminal => (
                color.should_colorize(supports_color::Stream::Stdout),
                color.should_colorize(supports_color::Stream::Stderr),
            ),
            // Buffers are never terminals, so only an explicit request colorizes them.
            ReporterOutput::Buffer { .. } => (color == Color::Always, color == Color::Always),
        };
        if colorize_stdout {
            stdout_styles.colorize();
        }
        if colorize_stderr {
            stderr_styles.colorize();
        }

        Self {
            stdout_styles,
            stderr_styles,
            output,
        }
    }

    pub(crate) fn report_success(&mut self, name: &str) -> Result<(), WriteEventError> {
        let styles = self.stdout_styles.clone();
        self.write_to(Stream::Stdout, |writer| {
            displayer::write_success(name, &styles, writer)
        })
        .map_err(|err| WriteEventError::new(ReportLineKind::Success, err))
    }

    pub(crate) fn report_failure(
        &mut self,
        name: &str,
        failure: &FailureRecord,
    ) -> Result<(), WriteEventError> {
        let styles = self.stderr_styles.clone();
        self.write_to(Stream::Stderr, |writer| {
            displayer::write_failure(name, failure, &styles, writer)
        })
        .map_err(|err| WriteEventError::new(ReportLineKind::Failure, err))
    }

    pub(crate) fn report_summary(&mut self, stats: RunStats) -> Result<(), WriteEventError> {
        let styles = self.stdout_styles.clone();
        self.write_to(Stream::Stdout, |writer| {
            displayer::write_summary(stats, &styles, writer)
        })
        .map_err(|err| WriteEventError::new(ReportLineKind::Summary, err))
    }

    fn write_to(
        &mut self,
        stream: Stream,
        f: impl FnOnce(&mut dyn Write) -> io::Result<()>,
    ) -> io::Result<()> {
        match (&mut self.output, stream) {
            (ReporterOutput::Terminal, Stream::Stdout) => {
                let mut stdout = io::stdout().lock();
                f(&mut stdout)?;
                stdout.flush()
            }
            (ReporterOutput::Terminal, Stream::Stderr) => {
                let mut stderr = io::stderr().lock();
                f(&mut stderr)?;
                stderr.flush()
            }
            (ReporterOutput::Buffer { stdout, .. }, Stream::Stdout) => f(&mut **stdout),
            (ReporterOutput::Buffer { stderr, .. }, Stream::Stderr) => f(&mut **stderr),
        }
    }
}
