//! `convert.iconv.*`: character set conversion.
//!
//! Names take the form `convert.iconv.<from>/<to>` (or `<from>.<to>`).
//! A target suffixed with `//IGNORE` drops characters it cannot represent;
//! `//TRANSLIT` replaces them with `?`. Without a suffix they are an error.

use super::{StreamFilter, TransformError, family_member};

/// The `convert.iconv.*` family.
#[derive(Debug, Clone, Copy, Default)]
pub struct Iconv;

/// Supported character sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Charset {
    /// UTF-8
    Utf8,
    /// ISO-8859-1 / Latin-1
    Latin1,
    /// 7-bit US-ASCII
    Ascii,
    /// UTF-16, little endian
    Utf16Le,
    /// UTF-16, big endian
    Utf16Be,
}

/// What to do with characters the target charset cannot hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Unrepresentable {
    Fail,
    Ignore,
    Translit,
}

impl Charset {
    /// Look up a charset by (case-insensitive) name or common alias.
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        match label.to_ascii_lowercase().as_str() {
            "utf-8" | "utf8" => Some(Self::Utf8),
            "iso-8859-1" | "iso8859-1" | "latin1" | "l1" => Some(Self::Latin1),
            "us-ascii" | "ascii" => Some(Self::Ascii),
            "utf-16le" | "utf16le" => Some(Self::Utf16Le),
            "utf-16be" | "utf16be" => Some(Self::Utf16Be),
            _ => None,
        }
    }

    /// Canonical name.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Utf8 => "UTF-8",
            Self::Latin1 => "ISO-8859-1",
            Self::Ascii => "US-ASCII",
            Self::Utf16Le => "UTF-16LE",
            Self::Utf16Be => "UTF-16BE",
        }
    }

    fn decode(self, input: &[u8]) -> Result<Vec<char>, String> {
        match self {
            Self::Utf8 => std::str::from_utf8(input)
                .map(|s| s.chars().collect())
                .map_err(|e| format!("illegal UTF-8 sequence at byte {}", e.valid_up_to())),
            Self::Latin1 => Ok(input.iter().map(|&b| char::from(b)).collect()),
            Self::Ascii => input
                .iter()
                .enumerate()
                .map(|(i, &b)| {
                    if b.is_ascii() {
                        Ok(char::from(b))
                    } else {
                        Err(format!("illegal US-ASCII byte 0x{b:02X} at byte {i}"))
                    }
                })
                .collect(),
            Self::Utf16Le | Self::Utf16Be => {
                if input.len() % 2 != 0 {
                    return Err(format!("odd number of bytes for {}", self.label()));
                }
                let units = input.chunks_exact(2).map(|pair| {
                    let pair = [pair[0], pair[1]];
                    if self == Self::Utf16Le {
                        u16::from_le_bytes(pair)
                    } else {
                        u16::from_be_bytes(pair)
                    }
                });
                char::decode_utf16(units)
                    .map(|r| {
                        r.map_err(|e| {
                            format!("unpaired surrogate 0x{:04X}", e.unpaired_surrogate())
                        })
                    })
                    .collect()
            }
        }
    }

    fn encode(self, c: char, out: &mut Vec<u8>) -> bool {
        match self {
            Self::Utf8 => {
                let mut buf = [0u8; 4];
                out.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
            }
            Self::Latin1 => match u8::try_from(u32::from(c)) {
                Ok(b) => out.push(b),
                Err(_) => return false,
            },
            Self::Ascii => match u8::try_from(u32::from(c)) {
                Ok(b) if b.is_ascii() => out.push(b),
                _ => return false,
            },
            Self::Utf16Le | Self::Utf16Be => {
                let mut buf = [0u16; 2];
                for unit in c.encode_utf16(&mut buf) {
                    let bytes = if self == Self::Utf16Le {
                        unit.to_le_bytes()
                    } else {
                        unit.to_be_bytes()
                    };
                    out.extend_from_slice(&bytes);
                }
            }
        }
        true
    }
}

impl StreamFilter for Iconv {
    fn filter(&self, name: &str, input: &[u8]) -> Result<Vec<u8>, TransformError> {
        let charsets = family_member("convert.iconv", name)?;
        let (from, to) = charsets
            .split_once(['/', '.'])
            .ok_or_else(|| TransformError::Unknown(name.to_string()))?;

        let (to, mode) = match to.split_once("//") {
            Some((charset, suffix)) if suffix.eq_ignore_ascii_case("ignore") => {
                (charset, Unrepresentable::Ignore)
            }
            Some((charset, suffix)) if suffix.eq_ignore_ascii_case("translit") => {
                (charset, Unrepresentable::Translit)
            }
            Some(_) => return Err(TransformError::Unknown(name.to_string())),
            None => (to, Unrepresentable::Fail),
        };

        let unknown = || TransformError::Unknown(name.to_string());
        let from = Charset::from_label(from).ok_or_else(unknown)?;
        let to = Charset::from_label(to).ok_or_else(unknown)?;

        let chars = from
            .decode(input)
            .map_err(|reason| TransformError::invalid(name, reason))?;

        let mut out = Vec::with_capacity(input.len());
        for c in chars {
            if to.encode(c, &mut out) {
                continue;
            }
            match mode {
                Unrepresentable::Fail => {
                    return Err(TransformError::invalid(
                        name,
                        format!("cannot represent U+{:04X} in {}", u32::from(c), to.label()),
                    ));
                }
                Unrepresentable::Ignore => {}
                Unrepresentable::Translit => out.push(b'?'),
            }
        }
        Ok(out)
    }
}
