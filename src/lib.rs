//! Reddit trademark proxy library.
//!
//! Forwards every request to a single upstream host, rewrites absolute
//! upstream links in HTML responses to point back at the proxy, and appends
//! a trademark sign to every six-letter word in visible text.

pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod rewrite;

pub use config::ProxyConfig;
pub use error::ProxyError;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use rewrite::{ContentRewriter, HostMapping};
