//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware)
//!     → request.rs (request ID, header filtering)
//!     → forward.rs (route lookup, backend call, audit dispatch)
//!     → client.rs (pooled outbound connections)
//!     → response.rs (relay backend answer, or map failure to 404/502/504)
//!     → Send to client
//! ```

pub mod client;
pub mod forward;
pub mod request;
pub mod response;
pub mod server;

pub use request::{RequestIdExt, UuidRequestId, X_REQUEST_ID};
pub use response::GatewayError;
pub use server::{AppState, GatewayServer, ServerError};
