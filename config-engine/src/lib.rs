//! Configuration lookup for the audit workspace
//!
//! The audit dispatcher only ever asks two questions of configuration: "is this
//! switch on?" and "what is this string?". This crate provides:
//! - The [`ConfigLookup`] trait the dispatcher consumes
//! - The `<Area>:Audit:<Operation>:<Flag>` key convention ([`AuditKeys`])
//! - [`MemoryConfig`], a concurrent in-memory store for tests and embedding
//! - [`LayeredConfig`], files plus environment variables via the `config` crate
//!
//! # Key Format
//!
//! Keys use `:` as the section separator, e.g. `Database:Audit:Insert:Action`.
//! File and environment backed sources map `:` onto the nested table path
//! `Database.Audit.Insert.Action`; environment variables use `__` between
//! sections (`AUDIT_DATABASE__AUDIT__INSERT__ACTION=true`).
//!
//! # Example
//!
//! ```rust
//! use config_engine::{AuditKeys, ConfigLookup, MemoryConfig};
//!
//! let config = MemoryConfig::new();
//! let keys = AuditKeys::default();
//! config.set(keys.action("Insert"), "true");
//!
//! assert!(config.get_bool(&keys.action("Insert"), false));
//! assert!(config.get_bool(&keys.data("Insert"), true));
//! ```

pub mod error;
pub mod lookup;
pub mod providers;

pub use error::*;
pub use lookup::*;
pub use providers::*;
