//! URL attribute rewriting.
//!
//! Elements are *selected* by a narrower attribute set than the one that is
//! *rewritten*: an element whose only URL attribute is `data-src` or `srcset`
//! is never visited. This matches the behaviour the proxy has always had and
//! is kept until someone decides otherwise.

use html5ever::tendril::StrTendril;
use markup5ever_rcdom::{Handle, NodeData};

use crate::rewrite::dom::{walk, Walk};
use crate::rewrite::HostMapping;

/// Attributes whose presence makes an element a rewrite candidate.
const SELECTING_ATTRIBUTES: [&str; 4] = ["href", "src", "action", "data-url"];

/// Attributes rewritten on a candidate element.
const URL_ATTRIBUTES: [&str; 6] = ["href", "src", "action", "data-url", "data-src", "srcset"];

/// Literal host substitutions applied to a single attribute value.
#[derive(Debug, Clone)]
pub struct UrlReplacer {
    /// `(needle, replacement)` in application order.
    rules: [(String, String); 3],
}

impl UrlReplacer {
    pub fn new(mapping: &HostMapping<'_>) -> Self {
        let proxied = format!("{}://{}", mapping.scheme, mapping.proxy_host);
        Self {
            rules: [
                (format!("https://{}", mapping.target_host), proxied.clone()),
                (format!("http://{}", mapping.target_host), proxied),
                (
                    format!("//{}", mapping.target_host),
                    format!("//{}", mapping.proxy_host),
                ),
            ],
        }
    }

    /// Apply the three substitutions, in order, to the whole value.
    ///
    /// Multi-URL values such as `srcset` are handled by the same
    /// whole-string pass rather than per token.
    pub fn replace(&self, value: &str) -> String {
        if value.is_empty() {
            return String::new();
        }

        self.rules
            .iter()
            .fold(value.to_string(), |acc, (needle, replacement)| {
                acc.replace(needle.as_str(), replacement)
            })
    }
}

fn is_one_of(name: &str, set: &[&str]) -> bool {
    set.iter().any(|candidate| candidate.eq_ignore_ascii_case(name))
}

/// Rewrite backend URLs in the attributes of every selected element.
///
/// Returns the number of attribute values that changed.
pub fn rewrite_url_attributes(root: &Handle, replacer: &UrlReplacer) -> usize {
    let mut rewritten = 0;

    walk(root, |node| {
        let NodeData::Element { attrs, .. } = &node.data else {
            return Walk::Descend;
        };

        let selected = attrs
            .borrow()
            .iter()
            .any(|attr| is_one_of(&attr.name.local, &SELECTING_ATTRIBUTES));
        if !selected {
            return Walk::Descend;
        }

        for attr in attrs.borrow_mut().iter_mut() {
            if !is_one_of(&attr.name.local, &URL_ATTRIBUTES) || attr.value.is_empty() {
                continue;
            }
            let updated = replacer.replace(&attr.value);
            if updated.as_str() != &*attr.value {
                attr.value = StrTendril::from(updated);
                rewritten += 1;
            }
        }

        Walk::Descend
    });

    rewritten
}
