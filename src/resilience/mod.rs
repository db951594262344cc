//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Request to backend / audit collaborator:
//!     → timeouts.rs (enforce deadline)
//!     → On failure: surfaced to the caller as 502/504, never retried
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every external call has a deadline
//! - No retries: request bodies are streamed and forwarded at most once

pub mod timeouts;

pub use timeouts::{with_timeout, TimeoutError};
