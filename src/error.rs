//! Crate-wide error type.

use std::path::PathBuf;

use thiserror::Error;

use crate::config::ConfigError;

/// Errors surfaced by the simulator, the LCOE engine and their file I/O.
///
/// A Monte Carlo iteration with no valid LCOE is not an error; it is excluded
/// and counted in the report.
#[derive(Debug, Error)]
pub enum Error {
    /// A required input artifact does not exist.
    #[error("missing input: \"{}\" not found", path.display())]
    MissingInput { path: PathBuf },

    /// A CSV input lacks a required column.
    #[error("\"{}\": no column matching `{column}`", path.display())]
    MissingColumn { path: PathBuf, column: String },

    /// A caller-supplied value is outside its valid domain.
    #[error("invalid input `{field}`: {message}")]
    InvalidInput { field: String, message: String },

    /// Scenario configuration failed to load or validate.
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn invalid(field: &str, message: impl Into<String>) -> Self {
        Self::InvalidInput {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
