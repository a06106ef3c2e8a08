//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the proxy.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the proxy.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// The single backend every request is forwarded to.
    pub upstream: UpstreamConfig,

    /// Header names stripped in each direction.
    pub headers: HeaderRulesConfig,

    /// Size limits for buffered bodies.
    pub limits: LimitsConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Upstream (backend) configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Backend host, optionally with a port (e.g., "www.reddit.com").
    pub target_host: String,

    /// Scheme used to reach the backend ("http" or "https").
    pub protocol: String,

    /// Overall per-call timeout in seconds.
    pub timeout_secs: u64,

    /// User-Agent sent when the client did not supply one.
    pub user_agent: String,

    /// Skip TLS certificate validation. Development only.
    pub accept_invalid_certs: bool,

    /// Let the upstream client follow redirects itself.
    pub follow_redirects: bool,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            target_host: "www.reddit.com".to_string(),
            protocol: "https".to_string(),
            timeout_secs: 30,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"
                .to_string(),
            accept_invalid_certs: false,
            follow_redirects: true,
        }
    }
}

/// Header exclusion lists. Names are matched case-insensitively.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HeaderRulesConfig {
    /// Inbound headers never copied onto the upstream request.
    pub excluded_request: Vec<String>,

    /// Upstream headers never copied onto the client response.
    pub excluded_response: Vec<String>,
}

impl Default for HeaderRulesConfig {
    fn default() -> Self {
        Self {
            excluded_request: [
                "Host",
                "Connection",
                "Keep-Alive",
                "Proxy-Connection",
                "Transfer-Encoding",
                "Upgrade",
                "Accept-Encoding",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            excluded_response: ["Transfer-Encoding", "Connection", "Keep-Alive", "Server"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

/// Body size limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Largest inbound request body that will be buffered for forwarding.
    pub max_request_body_bytes: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_request_body_bytes: 64 * 1024 * 1024, // 64MB
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format ("pretty" or "json").
    pub log_format: String,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
