//! Audit side channel.
//!
//! # Data Flow
//! ```text
//! Forwarding engine decides the caller's status
//!     → record.rs (AuditRecord { service: "Request: M P", message: "Response: S" })
//!     → emitter.rs (semaphore permit → detached task → POST {log-backend}/logs)
//!     → on failure: warn log + metric, nothing else
//! ```
//!
//! # Design Decisions
//! - Best effort: audit completeness is never a correctness requirement
//! - The caller never waits on, or observes, audit delivery

pub mod emitter;
pub mod record;

pub use emitter::{AuditEmitter, AuditError};
pub use record::AuditRecord;
