//! Top-level proxy failures and their client-facing rendering.

use axum::http::header::{InvalidHeaderValue, CONTENT_TYPE};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::rewrite::RewriteError;

/// Any failure that aborts a proxied request before its response is sent.
#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    /// Connect, TLS, DNS, timeout or body-read failure on the upstream side.
    #[error("{0}")]
    Upstream(#[from] reqwest::Error),

    /// The inbound request body could not be read or exceeded the limit.
    #[error("failed to read request body: {0}")]
    RequestBody(#[from] axum::Error),

    /// `{protocol}://{target_host}{path}` did not form a valid URL.
    #[error("invalid upstream URL '{url}': {source}")]
    InvalidTarget {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("invalid header value: {0}")]
    InvalidHeader(#[from] InvalidHeaderValue),

    #[error(transparent)]
    Rewrite(#[from] RewriteError),
}

impl ProxyError {
    /// Coarse label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            ProxyError::Upstream(e) if e.is_timeout() => "timeout",
            ProxyError::Upstream(e) if e.is_connect() => "connect",
            ProxyError::Upstream(_) => "upstream",
            ProxyError::RequestBody(_) => "request_body",
            ProxyError::InvalidTarget { .. } => "invalid_target",
            ProxyError::InvalidHeader(_) => "invalid_header",
            ProxyError::Rewrite(_) => "rewrite",
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            [(CONTENT_TYPE, "text/plain")],
            format!("Proxy Error: {}", self),
        )
            .into_response()
    }
}
