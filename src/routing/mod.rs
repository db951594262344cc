//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (method, path)
//!     → table.rs (ordered scan, method filter)
//!     → pattern.rs (segment-wise structural match, bind :params)
//!     → Return: ResolvedRoute { entry, params } or RouteNotFound
//!
//! Route Compilation (at startup):
//!     BackendsConfig
//!     → RouteTable::gateway (parse patterns, check placeholders, bake base URLs)
//!     → Freeze as immutable table shared via Arc
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - No regex in hot path (segment comparison only)
//! - Deterministic: same input always matches same route
//! - First match wins (table order)

pub mod pattern;
pub mod table;

pub use pattern::{PathParam, PathParams, PathPattern, PatternError, Segment};
pub use table::{ResolvedRoute, RouteEntry, RouteNotFound, RouteTable, RouteTableError};
