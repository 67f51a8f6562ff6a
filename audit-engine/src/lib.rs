//! Entity audit logging with fan-out to pluggable providers
//!
//! This crate records what happened to persisted entities, and who did it:
//! - Insert, update and delete auditing gated by configuration switches
//! - Full snapshots on insert, changed fields only on update
//! - Free-form custom events ("Login", "Export", ...)
//! - Concurrent fan-out to every registered provider with aggregated failures
//! - Best-effort user and client address resolution
//!
//! # Configuration Switches
//!
//! - `<Area>:Audit:<Operation>:Action`: record the operation at all (default off)
//! - `<Area>:Audit:<Operation>:Data`: capture the data payload (default on)
//!
//! `<Area>` defaults to `Database`; `<Operation>` is `Insert`, `Update` or `Delete`.
//!
//! # Example
//!
//! ```rust
//! use audit_engine::{AuditLog, InMemoryAuditLogger};
//! use config_engine::{AuditKeys, MemoryConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let keys = AuditKeys::default();
//!     let config = MemoryConfig::new().with(keys.action("Insert"), true);
//!     let memory = InMemoryAuditLogger::default();
//!
//!     let audit = AuditLog::builder()
//!         .config(config)
//!         .provider(memory.clone())
//!         .build();
//!
//!     audit
//!         .record_event_as("Login", "", None, Some("user-42"), Some("10.0.0.5"))
//!         .await?;
//!
//!     assert_eq!(memory.records()[0].event, "Login");
//!     Ok(())
//! }
//! ```

pub mod capture;
pub mod dispatcher;
pub mod entity;
pub mod entry;
pub mod error;
pub mod identity;
pub mod provider;
pub mod providers;

pub use capture::*;
pub use dispatcher::*;
pub use entity::*;
pub use entry::*;
pub use error::*;
pub use identity::*;
pub use provider::*;
pub use providers::*;
