//! API Gateway Library
//!
//! Routes `/service` and `/logs` requests to the records and log backends,
//! relays their answers verbatim and emits a best-effort audit record per request.

pub mod audit;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod resilience;
pub mod routing;

pub use config::schema::GatewayConfig;
pub use http::GatewayServer;
pub use lifecycle::Shutdown;
pub use routing::RouteTable;
