// Bundled audit logger providers

pub mod file;
pub mod memory;
pub mod tracing_logger;

pub use file::JsonFileAuditLogger;
pub use memory::InMemoryAuditLogger;
pub use tracing_logger::TracingAuditLogger;
