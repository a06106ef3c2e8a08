//! Upstream transport.
//!
//! # Responsibilities
//! - Own the shared, pooled `reqwest` client
//! - Send an `OutboundRequest` and hand back as soon as headers arrive
//! - Keep the response body unread until the relay decides how to consume it

use std::time::Duration;

use axum::body::Body;
use axum::http::{HeaderMap, StatusCode};
use bytes::Bytes;
use futures_util::TryStreamExt;

use crate::config::UpstreamConfig;
use crate::error::ProxyError;
use crate::http::request::OutboundRequest;

/// Shared client for the single backend.
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    inner: reqwest::Client,
}

impl UpstreamClient {
    pub fn new(config: &UpstreamConfig) -> Result<Self, reqwest::Error> {
        let mut builder = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.as_str());

        if config.accept_invalid_certs {
            tracing::warn!("TLS certificate validation disabled for upstream");
            builder = builder.danger_accept_invalid_certs(true);
        }
        if !config.follow_redirects {
            builder = builder.redirect(reqwest::redirect::Policy::none());
        }

        Ok(Self {
            inner: builder.build()?,
        })
    }

    /// Send the request. Resolves once the status line and headers are in;
    /// the body is still on the wire.
    pub async fn send(&self, request: OutboundRequest) -> Result<UpstreamResponse, ProxyError> {
        let mut builder = self
            .inner
            .request(request.method, request.url)
            .headers(request.headers);
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await?;
        Ok(UpstreamResponse::streaming(response))
    }
}

enum UpstreamBody {
    Streaming(reqwest::Response),
    Buffered(Bytes),
}

/// A response from the backend whose body has not been consumed yet.
pub struct UpstreamResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: UpstreamBody,
}

impl UpstreamResponse {
    fn streaming(response: reqwest::Response) -> Self {
        Self {
            status: response.status(),
            headers: response.headers().clone(),
            body: UpstreamBody::Streaming(response),
        }
    }

    /// A response whose body is already in memory.
    pub fn buffered(status: StatusCode, headers: HeaderMap, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers,
            body: UpstreamBody::Buffered(body.into()),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Read the whole body into memory.
    pub async fn bytes(self) -> Result<Bytes, ProxyError> {
        match self.body {
            UpstreamBody::Streaming(response) => Ok(response.bytes().await?),
            UpstreamBody::Buffered(bytes) => Ok(bytes),
        }
    }

    /// Pull the body into memory so it can be inspected and still relayed.
    pub async fn into_buffered(self) -> Result<Self, ProxyError> {
        let status = self.status;
        let headers = self.headers.clone();
        let bytes = self.bytes().await?;
        Ok(Self::buffered(status, headers, bytes))
    }

    /// Buffered body as text, or `None` while it is still streaming.
    pub fn buffered_text(&self) -> Option<String> {
        match &self.body {
            UpstreamBody::Buffered(bytes) => Some(String::from_utf8_lossy(bytes).into_owned()),
            UpstreamBody::Streaming(_) => None,
        }
    }

    /// Turn the body into a client body without buffering it.
    ///
    /// Errors after this point can no longer change the status the client
    /// sees; they are logged and the connection is cut.
    pub fn into_body(self) -> Body {
        match self.body {
            UpstreamBody::Buffered(bytes) => Body::from(bytes),
            UpstreamBody::Streaming(response) => {
                let stream = response.bytes_stream().inspect_err(|e| {
                    tracing::warn!(error = %e, "Upstream body failed mid-stream");
                });
                Body::from_stream(stream)
            }
        }
    }
}

impl std::fmt::Debug for UpstreamResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let body = match &self.body {
            UpstreamBody::Streaming(_) => "streaming".to_string(),
            UpstreamBody::Buffered(bytes) => format!("{} bytes", bytes.len()),
        };
        f.debug_struct("UpstreamResponse")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .field("body", &body)
            .finish()
    }
}
