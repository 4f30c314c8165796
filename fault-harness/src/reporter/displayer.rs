// Copyright (c) The fault-harness Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The text formats for test outcomes and the run summary.
//!
//! Without colorization, these are byte-for-byte stable:
//!
//! * success: `OK\t<name>\n`
//! * failure: a `FAIL` header followed by the failing file, line and expression
//! * summary: `\n<total> total, <passed> passed, <failed> failed.\n`

use super::helpers::Styles;
use crate::harness::{FailureRecord, RunStats};
use owo_colors::OwoColorize;
use std::io::{self, Write};

pub(super) fn write_success(
    name: &str,
    styles: &Styles,
    mut writer: impl Write,
) -> io::Result<()> {
    writeln!(writer, "{}\t{name}", "OK".style(styles.pass))
}

pub(super) fn write_failure(
    name: &str,
    failure: &FailureRecord,
    styles: &Styles,
    mut writer: impl Write,
) -> io::Result<()> {
    writeln!(writer, "{}  {name}\n", "FAIL".style(styles.fail))?;
    writeln!(
        writer,
        "      In file {}, line {}:\n",
        failure.file(),
        failure.line()
    )?;
    writeln!(writer, "          {}\n", failure.expression())?;
    writeln!(writer, "      Assertion of the above expression failed.\n")
}

pub(super) fn write_summary(
    stats: RunStats,
    styles: &Styles,
    mut writer: impl Write,
) -> io::Result<()> {
    write!(
        writer,
        "\n{} total, {} passed, {} failed.\n",
        stats.total().style(styles.count),
        stats.passed.style(styles.count),
        stats.failed.style(styles.count),
    )
}
