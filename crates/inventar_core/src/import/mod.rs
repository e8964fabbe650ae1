//! Import pipeline: raw tabular input -> validated items -> batch commit.
//!
//! # Responsibility
//! - Turn loosely structured spreadsheet rows into validated items with
//!   per-row error isolation.
//! - Commit validated rows through the facade without losing partial
//!   progress on error.
//!
//! # Invariants
//! - One row's failure never aborts another row's processing.
//! - Row-scoped faults are collected as values, never raised past the
//!   reconciler; only the missing required column aborts a whole import.

pub mod batch;
pub mod reconciler;
pub mod table;
pub mod worker;

use std::error::Error;
use std::fmt::{Display, Formatter};

/// Import-wide failure concerning the whole source file.
#[derive(Debug)]
pub enum ImportError {
    /// The required column is absent from the header row.
    MissingColumn(&'static str),
    UnsupportedFormat(String),
    Io(std::io::Error),
    Csv(csv::Error),
}

impl Display for ImportError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingColumn(column) => write!(f, "required column `{column}` is missing"),
            Self::UnsupportedFormat(suffix) => {
                write!(f, "unsupported import format `{suffix}`")
            }
            Self::Io(err) => write!(f, "failed to read import source: {err}"),
            Self::Csv(err) => write!(f, "failed to parse import source: {err}"),
        }
    }
}

impl Error for ImportError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Csv(err) => Some(err),
            Self::MissingColumn(_) | Self::UnsupportedFormat(_) => None,
        }
    }
}

impl From<std::io::Error> for ImportError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<csv::Error> for ImportError {
    fn from(value: csv::Error) -> Self {
        Self::Csv(value)
    }
}
