//! Request handling and transformation.
//!
//! # Responsibilities
//! - Capture the host and scheme the client used to reach the proxy
//! - Build the upstream URL from the fixed target and the inbound path/query
//! - Copy headers minus the exclusion set, overriding Host
//! - Buffer the body and derive Content-Type explicitly
//!
//! # Design Decisions
//! - Content-Type/Content-Length are never copied; they come from the body
//! - A bad header or content type costs only that header, never the request
//! - The body is read at most once

use axum::body::Body;
use axum::http::header::{CONTENT_LENGTH, CONTENT_TYPE, HOST};
use axum::http::{HeaderMap, HeaderValue, Method, Request};
use bytes::Bytes;
use url::Url;

use crate::config::ProxyConfig;
use crate::error::ProxyError;
use crate::http::headers::{copy_headers, HeaderFilter};

/// How the client addressed the proxy; used to point rewritten URLs back here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundContext {
    pub host: String,
    pub scheme: String,
}

impl InboundContext {
    /// Host comes from the Host header, falling back to the URI authority
    /// (HTTP/2). Scheme is the URI scheme when present, else plain `http`.
    pub fn from_request<B>(request: &Request<B>) -> Self {
        let host = request
            .headers()
            .get(HOST)
            .and_then(|h| h.to_str().ok())
            .map(str::to_owned)
            .or_else(|| request.uri().authority().map(|a| a.to_string()))
            .unwrap_or_default();

        let scheme = request.uri().scheme_str().unwrap_or("http").to_owned();

        Self { host, scheme }
    }
}

/// A fully prepared upstream request.
#[derive(Debug)]
pub struct OutboundRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    /// Present only when the inbound request declared a body.
    pub body: Option<Bytes>,
}

/// Builds upstream requests against the single configured backend.
#[derive(Debug, Clone)]
pub struct RequestForwarder {
    target_host: String,
    protocol: String,
    excluded: HeaderFilter,
    max_body_bytes: usize,
}

impl RequestForwarder {
    pub fn new(config: &ProxyConfig) -> Self {
        Self {
            target_host: config.upstream.target_host.clone(),
            protocol: config.upstream.protocol.clone(),
            excluded: HeaderFilter::new(&config.headers.excluded_request),
            max_body_bytes: config.limits.max_request_body_bytes,
        }
    }

    /// `{protocol}://{target_host}{path}{?query}`.
    pub fn target_url(&self, request: &Request<Body>) -> Result<Url, ProxyError> {
        let uri = request.uri();
        let mut url = format!("{}://{}{}", self.protocol, self.target_host, uri.path());
        if let Some(query) = uri.query() {
            url.push('?');
            url.push_str(query);
        }
        Url::parse(&url).map_err(|source| ProxyError::InvalidTarget { url, source })
    }

    /// Consume an inbound request and produce its upstream counterpart.
    pub async fn build(&self, request: Request<Body>) -> Result<OutboundRequest, ProxyError> {
        let url = self.target_url(&request)?;
        let (parts, body) = request.into_parts();

        tracing::debug!(method = %parts.method, url = %url, "Creating proxy request");

        let mut headers = HeaderMap::with_capacity(parts.headers.len());
        copy_headers(&parts.headers, &mut headers, "request", |name| {
            name != CONTENT_TYPE
                && name != CONTENT_LENGTH
                && !self.excluded.is_excluded(name.as_str())
        });
        headers.insert(HOST, HeaderValue::from_str(&self.target_host)?);

        let declared_length = parts
            .headers
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok())
            .unwrap_or(0);
        let declared_type = parts.headers.get(CONTENT_TYPE).filter(|v| !v.is_empty());

        let body = if declared_length > 0 || declared_type.is_some() {
            tracing::debug!(
                content_length = declared_length,
                content_type = ?declared_type,
                "Buffering request body"
            );
            let bytes = axum::body::to_bytes(body, self.max_body_bytes).await?;

            if let Some(raw) = declared_type {
                match parse_media_type(raw) {
                    Ok(media_type) => {
                        headers.insert(CONTENT_TYPE, media_type);
                    }
                    Err(reason) => {
                        tracing::warn!(
                            content_type = ?raw,
                            error = %reason,
                            "Failed to parse Content-Type"
                        );
                    }
                }
            }

            Some(bytes)
        } else {
            None
        };

        Ok(OutboundRequest {
            method: parts.method,
            url,
            headers,
            body,
        })
    }
}

/// Parse a declared content type into a normalized header value.
fn parse_media_type(raw: &HeaderValue) -> Result<HeaderValue, String> {
    let text = raw.to_str().map_err(|e| e.to_string())?;
    let media_type: mime::Mime = text
        .trim()
        .parse()
        .map_err(|e: mime::FromStrError| e.to_string())?;
    HeaderValue::from_str(media_type.as_ref()).map_err(|e| e.to_string())
}
