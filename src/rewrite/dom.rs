//! Parsing, traversal and serialization of the rewritable document.
//!
//! The tree is an `RcDom`: single-owner, `Rc`-linked, never shared across
//! requests and never held across an `.await`.

use html5ever::serialize::{serialize, SerializeOpts};
use html5ever::tendril::TendrilSink;
use html5ever::tree_builder::TreeBuilderOpts;
use html5ever::{parse_document, ParseOpts};
use markup5ever_rcdom::{Handle, NodeData, RcDom, SerializableHandle};

use crate::rewrite::RewriteError;

/// Controls whether [`walk`] descends into a node's children.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Walk {
    Descend,
    SkipChildren,
}

/// Parse markup into a best-effort document tree.
///
/// Scripting is off so `<noscript>` children are parsed as elements rather
/// than one raw text node.
pub fn parse(html: &str) -> RcDom {
    let opts = ParseOpts {
        tree_builder: TreeBuilderOpts {
            scripting_enabled: false,
            ..Default::default()
        },
        ..Default::default()
    };
    parse_document(RcDom::default(), opts).one(html)
}

/// Serialize the document back to markup.
pub fn to_html(dom: &RcDom) -> Result<String, RewriteError> {
    let document: SerializableHandle = dom.document.clone().into();
    let opts = SerializeOpts {
        scripting_enabled: false,
        ..Default::default()
    };
    let mut out = Vec::new();
    serialize(&mut out, &document, opts)?;
    Ok(String::from_utf8(out)?)
}

/// Pre-order traversal with an explicit stack, so hostile nesting depth
/// cannot exhaust the call stack.
///
/// `<template>` contents live outside the child list in the DOM and are
/// visited as if they were the template's children.
pub fn walk(root: &Handle, mut visit: impl FnMut(&Handle) -> Walk) {
    let mut stack = vec![root.clone()];

    while let Some(node) = stack.pop() {
        if visit(&node) == Walk::SkipChildren {
            continue;
        }

        // Pushed in reverse so siblings pop in document order.
        let children = node.children.borrow();
        stack.extend(children.iter().rev().cloned());

        if let NodeData::Element {
            template_contents, ..
        } = &node.data
        {
            if let Some(contents) = template_contents.borrow().as_ref() {
                stack.push(contents.clone());
            }
        }
    }
}

/// Local name of an element node, `None` for every other node kind.
pub fn element_name(node: &Handle) -> Option<&str> {
    match &node.data {
        NodeData::Element { name, .. } => Some(&*name.local),
        _ => None,
    }
}
