//! Named stream filters.
//!
//! A [`TransformRegistry`] maps filter names to byte-in / byte-out
//! conversions. [`StandardRegistry`] ships the usual set:
//!
//! ```text
//! string.rot13        string.toupper       string.tolower     string.strip_tags
//! convert.*           (base64-encode, base64-decode,
//!                      quoted-printable-encode, quoted-printable-decode)
//! convert.iconv.*     (convert.iconv.<from>/<to>)
//! dechunk             consumed
//! zlib.*              (deflate, inflate)
//! bzip2.*             (compress, decompress)
//! ```
//!
//! Names ending in `.*` are families: a request for `convert.base64-encode`
//! resolves to the `convert.*` entry, which receives the full requested name.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use thiserror::Error;

pub mod compress;
pub mod convert;
pub mod dechunk;
pub mod iconv;
pub mod string;

/// Why a registry could not run a filter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransformError {
    /// No filter or family is registered under this name, or the family does
    /// not know this member.
    #[error("unknown filter: {0}")]
    Unknown(String),

    /// The filter rejected its input.
    #[error("{reason}")]
    InvalidInput {
        /// Filter that rejected the input.
        name: String,
        /// One-line description.
        reason: String,
    },

    /// The registry itself cannot answer.
    #[error("transform registry unavailable: {0}")]
    Unavailable(String),
}

impl TransformError {
    /// Shorthand for [`TransformError::InvalidInput`].
    pub fn invalid(name: &str, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}

/// Source of named filters consulted by the whitelist engine.
pub trait TransformRegistry: Send + Sync {
    /// Every filter name the registry can run, including family wildcards
    /// such as `convert.*`.
    fn known_transforms(&self) -> Result<BTreeSet<String>, TransformError>;

    /// Run the filter `name` over `input`.
    fn execute(&self, name: &str, input: &[u8]) -> Result<Vec<u8>, TransformError>;
}

/// A single filter (or filter family) implementation.
///
/// `name` is the name that was requested, which for a family differs from
/// the name it was registered under.
pub trait StreamFilter: Send + Sync {
    /// Transform `input`.
    fn filter(&self, name: &str, input: &[u8]) -> Result<Vec<u8>, TransformError>;
}

impl<F> StreamFilter for F
where
    F: Fn(&str, &[u8]) -> Result<Vec<u8>, TransformError> + Send + Sync,
{
    fn filter(&self, name: &str, input: &[u8]) -> Result<Vec<u8>, TransformError> {
        self(name, input)
    }
}

/// In-process registry of [`StreamFilter`]s.
#[derive(Clone)]
pub struct StandardRegistry {
    filters: BTreeMap<String, Arc<dyn StreamFilter>>,
}

impl StandardRegistry {
    /// Registry preloaded with the built-in filters.
    #[must_use]
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry
            .register("string.rot13", string::Rot13)
            .register("string.toupper", string::ToUpper)
            .register("string.tolower", string::ToLower)
            .register("string.strip_tags", string::StripTags)
            .register("convert.*", convert::Convert)
            .register("convert.iconv.*", iconv::Iconv)
            .register("dechunk", dechunk::Dechunk)
            .register("zlib.*", compress::Zlib)
            .register("bzip2.*", compress::Bzip2)
            .register("consumed", compress::Consumed);
        registry
    }

    /// Registry with no filters.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            filters: BTreeMap::new(),
        }
    }

    /// Register (or replace) a filter under `name`.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        filter: impl StreamFilter + 'static,
    ) -> &mut Self {
        self.filters.insert(name.into(), Arc::new(filter));
        self
    }

    /// Find the filter for `name`: the exact entry first, then the closest
    /// enclosing family (`a.b.c` tries `a.b.*`, then `a.*`).
    fn resolve(&self, name: &str) -> Option<&Arc<dyn StreamFilter>> {
        if let Some(filter) = self.filters.get(name) {
            return Some(filter);
        }
        let mut prefix = name;
        while let Some(idx) = prefix.rfind('.') {
            prefix = &prefix[..idx];
            if let Some(filter) = self.filters.get(&format!("{prefix}.*")) {
                return Some(filter);
            }
        }
        None
    }
}

impl Default for StandardRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for StandardRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StandardRegistry")
            .field("filters", &self.filters.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl TransformRegistry for StandardRegistry {
    fn known_transforms(&self) -> Result<BTreeSet<String>, TransformError> {
        Ok(self.filters.keys().cloned().collect())
    }

    fn execute(&self, name: &str, input: &[u8]) -> Result<Vec<u8>, TransformError> {
        let filter = self
            .resolve(name)
            .ok_or_else(|| TransformError::Unknown(name.to_string()))?;
        filter.filter(name, input)
    }
}

/// The part of `name` after `family`'s `.*`, e.g. `base64-encode` for
/// `convert.base64-encode` in family `convert`.
pub(crate) fn family_member<'a>(family: &str, name: &'a str) -> Result<&'a str, TransformError> {
    name.strip_prefix(family)
        .and_then(|rest| rest.strip_prefix('.'))
        .filter(|member| !member.is_empty())
        .ok_or_else(|| TransformError::Unknown(name.to_string()))
}
