//! Per-request proxy pipeline.
//!
//! ```text
//! inbound → RequestForwarder → UpstreamClient → ResponseRelay → client
//!                    └──────── any ProxyError ────────┘
//!                                  ↓
//!                     500 "Proxy Error: {message}"
//! ```

use std::time::Instant;

use axum::body::Body;
use axum::http::Request;
use axum::response::{IntoResponse, Response};

use crate::config::ProxyConfig;
use crate::error::ProxyError;
use crate::http::request::{InboundContext, RequestForwarder};
use crate::http::response::ResponseRelay;
use crate::http::upstream::{UpstreamClient, UpstreamResponse};
use crate::observability::metrics;

/// Ties forwarding, the upstream call and relaying together and contains
/// every failure at the request boundary.
#[derive(Debug, Clone)]
pub struct ProxyOrchestrator {
    forwarder: RequestForwarder,
    client: UpstreamClient,
    relay: ResponseRelay,
}

impl ProxyOrchestrator {
    pub fn new(config: &ProxyConfig) -> Result<Self, reqwest::Error> {
        Ok(Self {
            forwarder: RequestForwarder::new(config),
            client: UpstreamClient::new(&config.upstream)?,
            relay: ResponseRelay::new(config),
        })
    }

    /// Proxy one request. Never fails: errors become a 500 response.
    pub async fn handle(&self, request: Request<Body>) -> Response {
        let start = Instant::now();
        let method = request.method().clone();
        let path = request.uri().path().to_owned();
        let inbound = InboundContext::from_request(&request);

        let response = match self.proxy(request, &inbound).await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(method = %method, path = %path, error = %e, "Proxy error");
                metrics::record_failure(e.kind());
                e.into_response()
            }
        };

        metrics::record_request(method.as_str(), response.status().as_u16(), start);
        response
    }

    async fn proxy(
        &self,
        request: Request<Body>,
        inbound: &InboundContext,
    ) -> Result<Response, ProxyError> {
        let outbound = self.forwarder.build(request).await?;
        let upstream = self.client.send(outbound).await?;
        let upstream = log_unsuccessful(upstream).await?;
        self.relay.relay(upstream, inbound).await
    }
}

/// Statuses outside 2xx/3xx are passed on untouched but their body is
/// captured for the log first.
async fn log_unsuccessful(upstream: UpstreamResponse) -> Result<UpstreamResponse, ProxyError> {
    let status = upstream.status();
    if status.is_success() || status.is_redirection() {
        return Ok(upstream);
    }

    let upstream = upstream.into_buffered().await?;
    let body = upstream.buffered_text().unwrap_or_default();
    tracing::warn!(status = %status, body = %body, "Upstream returned non-success status");
    Ok(upstream)
}
