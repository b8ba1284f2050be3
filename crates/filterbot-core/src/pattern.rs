//! Whitelist patterns.
//!
//! A whitelist is a comma-separated list of shell-style globs such as
//! `"string.*,convert.*"`. Each glob carries the number of `.` characters it
//! contains; a filter name is admitted only when the glob matches **and** the
//! name has the same number of dots. This bounds `*` to a single segment
//! depth: `string.*` admits `string.rot13` but not `string.sub.name`.

use std::fmt;

use glob::{MatchOptions, Pattern};

/// Whitelist used when none is configured.
pub const DEFAULT_WHITELIST: &str = "string.*,convert.*";

/// Matching options pinned so behaviour never depends on the host platform.
///
/// `*` and `?` match `.` and `/` like any other character, and case matters.
const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: false,
    require_literal_leading_dot: false,
};

/// Count the `.` characters in `name`.
#[must_use]
pub fn dot_count(name: &str) -> usize {
    name.bytes().filter(|b| *b == b'.').count()
}

/// A compiled whitelist glob together with its dot count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WhitelistPattern {
    raw: String,
    dots: usize,
    /// `None` when the text is not a valid glob; the pattern then only
    /// matches itself.
    matcher: Option<Pattern>,
}

impl WhitelistPattern {
    /// Compile a single pattern.
    ///
    /// Supports `*`, `?`, `[abc]`, `[a-z]` and `[!abc]`. Runs of `*` collapse
    /// into one. A pattern that cannot be compiled (for instance an unclosed
    /// `[`) is matched literally.
    #[must_use]
    pub fn new(raw: &str) -> Self {
        let matcher = Pattern::new(&collapse_stars(raw)).ok();
        Self {
            raw: raw.to_string(),
            dots: dot_count(raw),
            matcher,
        }
    }

    /// The pattern text as configured (after trimming).
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Number of `.` characters in the pattern.
    #[must_use]
    pub fn dot_count(&self) -> usize {
        self.dots
    }

    /// Plain glob match, ignoring the dot-count rule.
    #[must_use]
    pub fn glob_matches(&self, name: &str) -> bool {
        match &self.matcher {
            Some(matcher) => matcher.matches_with(name, MATCH_OPTIONS),
            None => self.raw == name,
        }
    }

    /// Glob match plus dot-count equality.
    #[must_use]
    pub fn admits(&self, name: &str) -> bool {
        dot_count(name) == self.dots && self.glob_matches(name)
    }
}

impl fmt::Display for WhitelistPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Split a whitelist configuration string into patterns.
///
/// Entries are trimmed. Empty entries are kept; they only ever admit the
/// empty name, which no registry reports.
#[must_use]
pub fn parse_whitelist(config: &str) -> Vec<WhitelistPattern> {
    config
        .split(',')
        .map(|entry| WhitelistPattern::new(entry.trim()))
        .collect()
}

/// `glob` reserves `**` for recursive path matching; shell matching treats it
/// as a plain `*`.
fn collapse_stars(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut prev_star = false;
    for c in raw.chars() {
        if c == '*' && prev_star {
            continue;
        }
        prev_star = c == '*';
        out.push(c);
    }
    out
}
