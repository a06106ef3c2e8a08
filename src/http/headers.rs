//! Case-insensitive header exclusion and per-header fault-tolerant copying.

use std::collections::HashSet;

use axum::http::{HeaderMap, HeaderName};

/// A set of header names that must not cross the proxy in one direction.
#[derive(Debug, Clone, Default)]
pub struct HeaderFilter {
    /// Lowercased names.
    excluded: HashSet<String>,
}

impl HeaderFilter {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            excluded: names
                .into_iter()
                .map(|name| name.as_ref().trim().to_ascii_lowercase())
                .collect(),
        }
    }

    /// True if `name` is excluded, ignoring ASCII case.
    pub fn is_excluded(&self, name: &str) -> bool {
        self.excluded.contains(&name.to_ascii_lowercase())
    }
}

/// Append every header of `source` accepted by `keep` onto `target`.
///
/// Each value is appended on its own; one that cannot be added is logged and
/// skipped without affecting the rest. Returns the number of values copied.
pub fn copy_headers(
    source: &HeaderMap,
    target: &mut HeaderMap,
    direction: &'static str,
    keep: impl Fn(&HeaderName) -> bool,
) -> usize {
    let mut copied = 0;

    for (name, value) in source.iter() {
        if !keep(name) {
            continue;
        }
        match target.try_append(name.clone(), value.clone()) {
            Ok(_) => copied += 1,
            Err(e) => {
                tracing::warn!(
                    direction,
                    header = %name,
                    error = %e,
                    "Failed to copy header"
                );
            }
        }
    }

    copied
}
