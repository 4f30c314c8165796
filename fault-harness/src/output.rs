// Copyright (c) The fault-harness Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration of harness output colorization.

use crate::errors::ColorParseError;
use std::{fmt, str::FromStr};

/// Specifies whether to colorize output.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[must_use]
pub enum Color {
    /// Colorize if the destination is a terminal that supports it.
    #[default]
    Auto,

    /// Always colorize.
    Always,

    /// Never colorize.
    Never,
}

impl Color {
    /// Returns the string forms accepted by [`FromStr`].
    pub fn variants() -> [&'static str; 3] {
        ["auto", "always", "never"]
    }

    /// Returns true if output written to `stream` should be colorized.
    pub fn should_colorize(self, stream: supports_color::Stream) -> bool {
        match self {
            Color::Auto => supports_color::on_cached(stream).is_some(),
            Color::Always => true,
            Color::Never => false,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Color::Auto => write!(f, "auto"),
            Color::Always => write!(f, "always"),
            Color::Never => write!(f, "never"),
        }
    }
}

impl FromStr for Color {
    type Err = ColorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let val = match s {
            "auto" => Color::Auto,
            "always" => Color::Always,
            "never" => Color::Never,
            other => return Err(ColorParseError::new(other)),
        };
        Ok(val)
    }
}
