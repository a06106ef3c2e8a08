//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs   (Axum setup, middleware, catch-all route)
//!     → proxy.rs    (per-request orchestration, failure containment)
//!     → request.rs  (build the upstream request)
//!     → upstream.rs (send, return on headers)
//!     → response.rs (filter headers, rewrite HTML or stream)
//!     → Send to client
//! ```

pub mod headers;
pub mod proxy;
pub mod request;
pub mod response;
pub mod server;
pub mod upstream;

pub use headers::HeaderFilter;
pub use proxy::ProxyOrchestrator;
pub use request::{InboundContext, OutboundRequest, RequestForwarder};
pub use response::ResponseRelay;
pub use server::HttpServer;
pub use upstream::{UpstreamClient, UpstreamResponse};
