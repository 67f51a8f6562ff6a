use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoggerError {
    #[error("A global tracing subscriber is already installed")]
    AlreadyInitialized,

    #[error("Invalid log filter: {0}")]
    InvalidFilter(String),
}

pub type Result<T> = std::result::Result<T, LoggerError>;
