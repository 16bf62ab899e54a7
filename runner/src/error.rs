//! Error types for the runner.

use std::path::PathBuf;

/// All errors that can occur during a run.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Core(#[from] tradeops::Error),

    #[error("config error: {0}")]
    Config(String),

    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("CSV error in {path}: {source}")]
    Csv { path: PathBuf, source: csv::Error },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid date {0:?}, expected YYYYMMDD")]
    InvalidDate(String),

    #[error("audit log error: {0}")]
    Audit(#[from] std::io::Error),
}

impl Error {
    /// Whether the error comes from bad input data or configuration rather
    /// than from a failing collaborator.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Error::Config(_)
                | Error::TomlParse(_)
                | Error::InvalidDate(_)
                | Error::Core(
                    tradeops::Error::InvalidConfig(_)
                        | tradeops::Error::InvalidSignal(_)
                        | tradeops::Error::InvalidPrice(_)
                        | tradeops::Error::DuplicatePosition(_)
                        | tradeops::Error::InvalidDirection(_)
                        | tradeops::Error::InvalidOffset(_)
                        | tradeops::Error::UnknownInstrument(_)
                )
        )
    }

    pub(crate) fn csv(path: impl Into<PathBuf>, source: csv::Error) -> Self {
        Error::Csv {
            path: path.into(),
            source,
        }
    }
}

/// Collaborator failures cross the core boundary as storage errors.
impl From<Error> for tradeops::Error {
    fn from(e: Error) -> Self {
        match e {
            Error::Core(inner) => inner,
            other => tradeops::Error::Storage(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
