//! Error types for rebound.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Caller input rejected before touching storage.
    #[error("invalid {field}: {reason}")]
    Validation { field: &'static str, reason: String },

    #[error("storage error: {0}")]
    Storage(#[from] sqlx::Error),

    #[error("migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl Error {
    pub(crate) fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Validation {
            field,
            reason: reason.into(),
        }
    }

    /// Whether retrying the same call later may succeed.
    ///
    /// Only storage failures qualify. The engine never retries on its own;
    /// an automatic retry of enqueue could duplicate a job.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Storage(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_storage_errors_are_transient() {
        assert!(Error::Storage(sqlx::Error::PoolTimedOut).is_transient());
        assert!(!Error::validation("queue", "must not be empty").is_transient());
        assert!(!Error::Config("bad".into()).is_transient());
    }

    #[test]
    fn validation_error_names_the_field() {
        let err = Error::validation("ttr", "must be positive");
        assert_eq!(err.to_string(), "invalid ttr: must be positive");
    }
}
