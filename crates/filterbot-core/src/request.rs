//! Request and outcome values.

use std::fmt;

/// A filter invocation extracted from an inbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterRequest<'a> {
    /// Requested filter name (first token).
    pub filter: &'a str,
    /// Text to transform (everything after the first token).
    pub payload: &'a str,
}

impl<'a> FilterRequest<'a> {
    /// Split command arguments into a filter name and a payload.
    ///
    /// The first whitespace-delimited token is the filter name. The payload
    /// starts at the second token and keeps its internal whitespace as typed;
    /// only the surrounding whitespace is dropped. Returns `None` unless both
    /// parts are present.
    #[must_use]
    pub fn parse(args: &'a str) -> Option<Self> {
        let args = args.trim();
        let (filter, rest) = args.split_once(char::is_whitespace)?;
        let payload = rest.trim();
        if payload.is_empty() {
            return None;
        }
        Some(Self { filter, payload })
    }
}

/// Outcome of applying a filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterResult {
    /// The whitelist does not permit the filter; nothing ran.
    Denied {
        /// Requested filter name.
        filter: String,
    },
    /// The filter ran.
    Applied {
        /// Requested filter name.
        filter: String,
        /// Raw output bytes; not guaranteed to be text.
        output: Vec<u8>,
    },
    /// The filter was permitted but the registry could not run it.
    ApplyFailed {
        /// Requested filter name.
        filter: String,
        /// One-line reason reported by the registry.
        reason: String,
    },
}

impl FilterResult {
    /// Name of the filter this result refers to.
    #[must_use]
    pub fn filter(&self) -> &str {
        match self {
            Self::Denied { filter }
            | Self::Applied { filter, .. }
            | Self::ApplyFailed { filter, .. } => filter,
        }
    }

    /// `true` for [`FilterResult::Applied`].
    #[must_use]
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied { .. })
    }

    /// Output bytes, if the filter ran.
    #[must_use]
    pub fn output(&self) -> Option<&[u8]> {
        match self {
            Self::Applied { output, .. } => Some(output),
            _ => None,
        }
    }
}

impl fmt::Display for FilterResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Denied { filter } => write!(f, "{filter}: denied"),
            Self::Applied { filter, output } => {
                write!(f, "{filter}: {}", String::from_utf8_lossy(output))
            }
            Self::ApplyFailed { filter, reason } => write!(f, "{filter}: failed ({reason})"),
        }
    }
}
