//! The allowed-filter set.

use std::collections::BTreeMap;

use serde::{Serialize, Serializer};

use crate::pattern::{dot_count, parse_whitelist, WhitelistPattern};

/// Filter names that may run during one configuration epoch, keyed by name
/// with the name's dot count as value.
///
/// Built in full from a whitelist and the names a registry reports. Never
/// patched in place; a reload builds a new set.
#[derive(Debug, Clone, Default)]
pub struct AllowedFilterSet {
    filters: BTreeMap<String, usize>,
    /// Each key compiled as a pattern, for [`AllowedFilterSet::permits`].
    matchers: Vec<WhitelistPattern>,
}

impl AllowedFilterSet {
    /// Intersect `known` filter names with `patterns`.
    ///
    /// A name is kept when some pattern admits it (glob match and equal dot
    /// count). Patterns are tried in order and the first hit wins.
    #[must_use]
    pub fn build<I, S>(patterns: &[WhitelistPattern], known: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut filters = BTreeMap::new();
        for name in known {
            let name = name.as_ref();
            if patterns.iter().any(|p| p.admits(name)) {
                filters.insert(name.to_string(), dot_count(name));
            }
        }
        let matchers = filters.keys().map(|k| WhitelistPattern::new(k)).collect();
        Self { filters, matchers }
    }

    /// Parse `whitelist` and build the set in one step.
    #[must_use]
    pub fn from_whitelist<I, S>(whitelist: &str, known: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::build(&parse_whitelist(whitelist), known)
    }

    /// Exact membership.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.filters.contains_key(name)
    }

    /// Whether a requested filter may run.
    ///
    /// Keys are used as patterns under the same glob + dot-count rule. A
    /// registry may report a family such as `convert.*`; requests for its
    /// members (`convert.base64-encode`) are permitted through that key.
    #[must_use]
    pub fn permits(&self, name: &str) -> bool {
        self.matchers.iter().any(|m| m.admits(name))
    }

    /// Dot count recorded for `name`.
    #[must_use]
    pub fn dot_count(&self, name: &str) -> Option<usize> {
        self.filters.get(name).copied()
    }

    /// Names in lexicographic order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.filters.keys().map(String::as_str)
    }

    /// `(name, dot count)` pairs in lexicographic order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.filters.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Number of allowed names.
    #[must_use]
    pub fn len(&self) -> usize {
        self.filters.len()
    }

    /// `true` when nothing is allowed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }
}

impl PartialEq for AllowedFilterSet {
    fn eq(&self, other: &Self) -> bool {
        self.filters == other.filters
    }
}

impl Eq for AllowedFilterSet {}

impl Serialize for AllowedFilterSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.filters.iter())
    }
}
