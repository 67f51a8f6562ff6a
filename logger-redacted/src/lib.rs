//! Logging setup for the audit workspace
//!
//! Audit records carry user identifiers, client addresses and entity payloads.
//! This crate owns two things:
//!
//! - **Subscriber setup**: a `tracing_subscriber` registry with an `EnvFilter`
//!   and either human readable or JSON output
//! - **PII redaction**: regex based masking of emails, phone numbers, SSNs,
//!   card numbers and IPv4 addresses before they reach a log sink
//!
//! # Detected Data Types
//!
//! - **Email Addresses**: user@example.com → u***@e***
//! - **Phone Numbers**: (555) 123-4567 → (***) ***-****
//! - **SSN**: 123-45-6789 → ***-**-****
//! - **Credit Cards**: 4111-1111-1111-1111 → ****-****-****-1111
//! - **IP Addresses**: 192.168.1.1 → 192.***.***.1
//!
//! With `hash_for_correlation` enabled every match is replaced by a short
//! SHA-256 digest instead, so two log lines about the same value can still be
//! joined without exposing it.
//!
//! # Example
//!
//! ```rust,no_run
//! use logger_redacted::{init_logging, LoggerConfig, PiiRedactor, RedactionConfig};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     init_logging(&LoggerConfig::default())?;
//!
//!     let redactor = PiiRedactor::new(RedactionConfig::default());
//!     tracing::info!("login from {}", redactor.redact("10.0.0.5"));
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod redactor;
pub mod subscriber;

pub use config::*;
pub use error::*;
pub use redactor::*;
pub use subscriber::*;
