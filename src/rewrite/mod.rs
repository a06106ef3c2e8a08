//! HTML content rewriting.
//!
//! # Data Flow
//! ```text
//! upstream HTML text
//!     → dom.rs   (parse into an owned RcDom)
//!     → urls.rs  (backend URLs in attributes → proxy URLs)
//!     → text.rs  (™ after six-letter words, outside script/style)
//!     → dom.rs   (serialize)
//!     → client
//! ```
//!
//! # Design Decisions
//! - One document per response; nothing survives the call
//! - Iterative traversal only
//! - The word matcher is a process-wide immutable regex

pub mod dom;
pub mod text;
pub mod urls;

use std::time::Instant;

use crate::observability::metrics;

pub use text::mark_six_letter_words;
pub use urls::UrlReplacer;

/// Errors produced while turning the rewritten tree back into markup.
#[derive(Debug, thiserror::Error)]
pub enum RewriteError {
    #[error("failed to serialize document: {0}")]
    Serialize(#[from] std::io::Error),
    #[error("serialized document is not UTF-8: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),
}

/// The hosts and scheme a rewrite maps between.
#[derive(Debug, Clone, Copy)]
pub struct HostMapping<'a> {
    /// Backend host as it appears in upstream markup.
    pub target_host: &'a str,
    /// Host the client used to reach the proxy.
    pub proxy_host: &'a str,
    /// Scheme the client used to reach the proxy.
    pub scheme: &'a str,
}

/// Rewrites HTML documents so they point back at the proxy.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContentRewriter;

impl ContentRewriter {
    pub fn new() -> Self {
        Self
    }

    /// Rewrite URL attributes and visible text, returning the new markup.
    ///
    /// An empty body stays empty instead of becoming a skeleton document.
    pub fn rewrite(&self, html: &str, mapping: &HostMapping<'_>) -> Result<String, RewriteError> {
        if html.is_empty() {
            return Ok(String::new());
        }

        let start = Instant::now();
        let dom = dom::parse(html);

        let urls = urls::rewrite_url_attributes(&dom.document, &UrlReplacer::new(mapping));
        let texts = text::transform_text_nodes(&dom.document);

        let output = dom::to_html(&dom)?;

        tracing::debug!(
            target_host = mapping.target_host,
            proxy_host = mapping.proxy_host,
            urls_rewritten = urls,
            text_nodes_marked = texts,
            input_bytes = html.len(),
            output_bytes = output.len(),
            "HTML rewritten"
        );
        metrics::record_rewrite(start);

        Ok(output)
    }
}
