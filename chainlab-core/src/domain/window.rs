//! Trailing window length for rolling statistics.

use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Length of the trailing window ending at the current sample.
///
/// `Infinite` means "all history so far" (an expanding window).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "RawWindow")]
pub enum WindowSize {
    Days(usize),
    Infinite,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid window size '{0}': expected a positive day count or 'infinite'")]
pub struct WindowParseError(pub String);

impl WindowSize {
    /// Create a finite window. Zero-length windows are rejected.
    pub fn days(n: usize) -> Result<Self, WindowParseError> {
        if n == 0 {
            return Err(WindowParseError(n.to_string()));
        }
        Ok(Self::Days(n))
    }

    /// First index of the window that ends at `i` (inclusive).
    pub fn start_index(self, i: usize) -> usize {
        match self {
            Self::Days(w) => (i + 1).saturating_sub(w.max(1)),
            Self::Infinite => 0,
        }
    }
}

impl Default for WindowSize {
    fn default() -> Self {
        Self::Days(365)
    }
}

impl fmt::Display for WindowSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Days(n) => write!(f, "{n}"),
            Self::Infinite => f.write_str("infinite"),
        }
    }
}

impl FromStr for WindowSize {
    type Err = WindowParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("infinite") || trimmed.eq_ignore_ascii_case("inf") {
            return Ok(Self::Infinite);
        }
        let n: usize = trimmed
            .parse()
            .map_err(|_| WindowParseError(s.to_string()))?;
        Self::days(n).map_err(|_| WindowParseError(s.to_string()))
    }
}

impl Serialize for WindowSize {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Days(n) => serializer.serialize_u64(*n as u64),
            Self::Infinite => serializer.serialize_str("infinite"),
        }
    }
}

/// Wire form: either a bare day count or a label such as `"infinite"` / `"90"`.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawWindow {
    Days(usize),
    Label(String),
}

impl TryFrom<RawWindow> for WindowSize {
    type Error = WindowParseError;

    fn try_from(raw: RawWindow) -> Result<Self, Self::Error> {
        match raw {
            RawWindow::Days(n) => Self::days(n),
            RawWindow::Label(label) => label.parse(),
        }
    }
}
