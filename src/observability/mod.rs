//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → stdout (pretty or JSON)
//!     → Metrics endpoint (Prometheus scrape), when enabled
//! ```
//!
//! # Design Decisions
//! - Structured logging for machine parsing
//! - Request ID (x-request-id) attached to every request span
//! - Metrics are cheap and silent until a recorder is installed

pub mod logging;
pub mod metrics;
