//! `string.*` filters.

use super::{StreamFilter, TransformError};

/// `string.rot13`: rotate ASCII letters by 13 places.
#[derive(Debug, Clone, Copy, Default)]
pub struct Rot13;

impl StreamFilter for Rot13 {
    fn filter(&self, _name: &str, input: &[u8]) -> Result<Vec<u8>, TransformError> {
        Ok(input.iter().map(|&b| rot13(b)).collect())
    }
}

fn rot13(b: u8) -> u8 {
    match b {
        b'a'..=b'z' => (b - b'a' + 13) % 26 + b'a',
        b'A'..=b'Z' => (b - b'A' + 13) % 26 + b'A',
        _ => b,
    }
}

/// `string.toupper`: ASCII upper-casing, independent of locale.
#[derive(Debug, Clone, Copy, Default)]
pub struct ToUpper;

impl StreamFilter for ToUpper {
    fn filter(&self, _name: &str, input: &[u8]) -> Result<Vec<u8>, TransformError> {
        Ok(input.to_ascii_uppercase())
    }
}

/// `string.tolower`: ASCII lower-casing, independent of locale.
#[derive(Debug, Clone, Copy, Default)]
pub struct ToLower;

impl StreamFilter for ToLower {
    fn filter(&self, _name: &str, input: &[u8]) -> Result<Vec<u8>, TransformError> {
        Ok(input.to_ascii_lowercase())
    }
}

/// `string.strip_tags`: drop HTML/XML tags and comments, keep text.
///
/// A `<` followed by whitespace (or at the very end) is plain text, so
/// `a < b` survives. Quotes inside a tag are honoured, which keeps
/// `<a title="x>y">` from ending early. An unterminated tag swallows the
/// rest of the input.
#[derive(Debug, Clone, Copy, Default)]
pub struct StripTags;

#[derive(Clone, Copy, PartialEq, Eq)]
enum TagState {
    Text,
    Tag { depth: usize, quote: Option<u8> },
    Comment,
}

impl StreamFilter for StripTags {
    fn filter(&self, _name: &str, input: &[u8]) -> Result<Vec<u8>, TransformError> {
        let mut out = Vec::with_capacity(input.len());
        let mut state = TagState::Text;
        let mut i = 0;

        while i < input.len() {
            let b = input[i];
            state = match state {
                TagState::Text if b == b'<' => {
                    if input[i..].starts_with(b"<!--") {
                        i += 3;
                        TagState::Comment
                    } else if input.get(i + 1).is_none_or(u8::is_ascii_whitespace) {
                        out.push(b);
                        TagState::Text
                    } else {
                        TagState::Tag {
                            depth: 1,
                            quote: None,
                        }
                    }
                }
                TagState::Text => {
                    out.push(b);
                    TagState::Text
                }
                TagState::Tag {
                    depth,
                    quote: Some(q),
                } => TagState::Tag {
                    depth,
                    quote: (b != q).then_some(q),
                },
                TagState::Tag { depth, quote: None } => match b {
                    b'"' | b'\'' => TagState::Tag {
                        depth,
                        quote: Some(b),
                    },
                    b'<' => TagState::Tag {
                        depth: depth + 1,
                        quote: None,
                    },
                    b'>' if depth == 1 => TagState::Text,
                    b'>' => TagState::Tag {
                        depth: depth - 1,
                        quote: None,
                    },
                    _ => state,
                },
                TagState::Comment => {
                    if input[i..].starts_with(b"-->") {
                        i += 2;
                        TagState::Text
                    } else {
                        TagState::Comment
                    }
                }
            };
            i += 1;
        }

        Ok(out)
    }
}
