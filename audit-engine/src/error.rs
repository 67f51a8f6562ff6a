use std::fmt;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuditError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Audit dispatch failed: {0}")]
    Dispatch(DispatchFailure),

    #[error("Audit storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, AuditError>;

/// A single provider that failed to persist its record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderFailure {
    pub provider: String,
    pub message: String,
}

/// Every provider failure from one dispatch.
///
/// Providers that succeeded are not listed; their records were persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchFailure {
    pub failures: Vec<ProviderFailure>,
    pub attempted: usize,
}

impl DispatchFailure {
    pub fn failed_providers(&self) -> impl Iterator<Item = &str> {
        self.failures.iter().map(|f| f.provider.as_str())
    }
}

impl fmt::Display for DispatchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} of {} providers failed",
            self.failures.len(),
            self.attempted
        )?;
        for failure in &self.failures {
            write!(f, "; {}: {}", failure.provider, failure.message)?;
        }
        Ok(())
    }
}
