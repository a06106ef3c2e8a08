//! Response handling and transformation.
//!
//! # Responsibilities
//! - Copy status and headers from the backend response, minus exclusions
//! - Rewrite HTML bodies so links lead back through the proxy
//! - Stream every other body through untouched
//!
//! # Design Decisions
//! - Only `text/html` and `*/*+html` are buffered; everything else streams
//! - Rewritten HTML is always declared UTF-8 and its length left to the server

use axum::body::Body;
use axum::http::header::{CONTENT_LENGTH, CONTENT_TYPE};
use axum::http::{HeaderMap, HeaderValue};
use axum::response::Response;

use crate::config::ProxyConfig;
use crate::error::ProxyError;
use crate::http::headers::{copy_headers, HeaderFilter};
use crate::http::request::InboundContext;
use crate::http::upstream::UpstreamResponse;
use crate::rewrite::{ContentRewriter, HostMapping};

/// Media type of a response, if it declares a parseable one.
pub fn media_type(headers: &HeaderMap) -> Option<mime::Mime> {
    headers
        .get(CONTENT_TYPE)?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()
}

/// `text/html`, or any subtype carrying a `+html` suffix.
pub fn is_html(media_type: &mime::Mime) -> bool {
    (media_type.type_() == mime::TEXT && media_type.subtype() == mime::HTML)
        || media_type.suffix() == Some(mime::HTML)
}

/// Rebuilds backend responses for the client.
#[derive(Debug, Clone)]
pub struct ResponseRelay {
    target_host: String,
    excluded: HeaderFilter,
    rewriter: ContentRewriter,
}

impl ResponseRelay {
    pub fn new(config: &ProxyConfig) -> Self {
        Self {
            target_host: config.upstream.target_host.clone(),
            excluded: HeaderFilter::new(&config.headers.excluded_response),
            rewriter: ContentRewriter::new(),
        }
    }

    /// Convert an upstream response into the response sent to the client.
    pub async fn relay(
        &self,
        upstream: UpstreamResponse,
        inbound: &InboundContext,
    ) -> Result<Response, ProxyError> {
        let status = upstream.status();
        let resolved = media_type(upstream.headers());

        tracing::debug!(
            status = %status,
            content_type = ?resolved.as_ref().map(|m| m.essence_str().to_owned()),
            "Handling proxy response"
        );

        let mut headers = HeaderMap::with_capacity(upstream.headers().len());
        copy_headers(upstream.headers(), &mut headers, "response", |name| {
            !self.excluded.is_excluded(name.as_str())
        });

        let body = match resolved.filter(is_html) {
            Some(html_type) => {
                let raw = upstream.bytes().await?;
                let text = String::from_utf8_lossy(&raw);
                let rewritten = self.rewriter.rewrite(
                    &text,
                    &HostMapping {
                        target_host: &self.target_host,
                        proxy_host: &inbound.host,
                        scheme: &inbound.scheme,
                    },
                )?;

                let content_type = format!("{}; charset=utf-8", html_type.essence_str());
                headers.insert(CONTENT_TYPE, HeaderValue::from_str(&content_type)?);
                headers.remove(CONTENT_LENGTH);
                Body::from(rewritten)
            }
            None => upstream.into_body(),
        };

        let mut response = Response::new(body);
        *response.status_mut() = status;
        *response.headers_mut() = headers;
        Ok(response)
    }
}
