//! Visible-text transformation: a trademark sign after every six-letter word.

use std::fmt::Write;
use std::sync::LazyLock;

use html5ever::tendril::StrTendril;
use markup5ever_rcdom::{Handle, NodeData};
use regex::Regex;

use crate::rewrite::dom::{element_name, walk, Walk};

/// Appended after each matched word.
pub const TRADEMARK: char = '\u{2122}';

/// Replacement template: the matched word followed by [`TRADEMARK`].
const MARKED_WORD: &str = "${0}\u{2122}";

// SAFETY: .expect() on LazyLock with a compile-time literal pattern,
// covered by `six_letter_pattern_compiles`.
static SIX_LETTER_WORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b[a-zA-Z]{6}\b").expect("BUG: SIX_LETTER_WORD regex is invalid")
});

/// Elements whose text is code, not prose.
const OPAQUE_ELEMENTS: [&str; 2] = ["script", "style"];

/// Mark every standalone run of exactly six ASCII letters.
///
/// The match runs over the HTML-encoded form of the text, the same view a
/// browser's source would show, and the result is decoded again so the tree
/// keeps holding plain characters.
pub fn mark_six_letter_words(text: &str) -> String {
    let encoded = encode_text(text);
    let marked = SIX_LETTER_WORD.replace_all(&encoded, MARKED_WORD);
    html_escape::decode_html_entities(&marked).into_owned()
}

/// Markup characters as entities, plus U+00A0..=U+00FF and characters
/// outside the BMP as numeric references, so an accented letter next to a
/// word acts as a boundary.
fn encode_text(text: &str) -> String {
    let safe = html_escape::encode_safe(text);
    let mut out = String::with_capacity(safe.len());
    for c in safe.chars() {
        match u32::from(c) {
            code @ (0xA0..=0xFF | 0x1_0000..) => {
                let _ = write!(out, "&#{code};");
            }
            _ => out.push(c),
        }
    }
    out
}

/// Apply [`mark_six_letter_words`] to every text node outside `<script>`
/// and `<style>`.
///
/// Returns the number of text nodes that changed.
pub fn transform_text_nodes(root: &Handle) -> usize {
    let mut changed = 0;

    walk(root, |node| {
        if let Some(name) = element_name(node) {
            if OPAQUE_ELEMENTS.iter().any(|opaque| opaque.eq_ignore_ascii_case(name)) {
                return Walk::SkipChildren;
            }
        }

        if let NodeData::Text { contents } = &node.data {
            let updated = mark_six_letter_words(&contents.borrow());
            if updated.as_str() != &**contents.borrow() {
                *contents.borrow_mut() = StrTendril::from(updated);
                changed += 1;
            }
        }

        Walk::Descend
    });

    changed
}
