//! `convert.*` filters: base64 and quoted-printable.

use base64::Engine as _;
use base64::alphabet;
use base64::engine::general_purpose::STANDARD;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};

use super::{StreamFilter, TransformError, family_member};

/// Decoder that accepts input with or without `=` padding.
const LENIENT_BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

const HEX_UPPER: &[u8; 16] = b"0123456789ABCDEF";

/// The `convert.*` family.
///
/// Members: `base64-encode`, `base64-decode`, `quoted-printable-encode`,
/// `quoted-printable-decode`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Convert;

impl StreamFilter for Convert {
    fn filter(&self, name: &str, input: &[u8]) -> Result<Vec<u8>, TransformError> {
        match family_member("convert", name)? {
            "base64-encode" => Ok(STANDARD.encode(input).into_bytes()),
            "base64-decode" => base64_decode(name, input),
            "quoted-printable-encode" => Ok(qp_encode(input)),
            "quoted-printable-decode" => qp_decode(name, input),
            _ => Err(TransformError::Unknown(name.to_string())),
        }
    }
}

fn base64_decode(name: &str, input: &[u8]) -> Result<Vec<u8>, TransformError> {
    let compact: Vec<u8> = input
        .iter()
        .copied()
        .filter(|b| !b.is_ascii_whitespace())
        .collect();
    LENIENT_BASE64
        .decode(compact)
        .map_err(|e| TransformError::invalid(name, format!("invalid base64 input: {e}")))
}

/// Quoted-printable encoding without line wrapping.
///
/// Printable ASCII other than `=` passes through; everything else, including
/// CR and LF, becomes `=XX`. A trailing space or tab is encoded so it
/// survives transports that trim lines.
fn qp_encode(input: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(input.len());
    for (i, &b) in input.iter().enumerate() {
        let is_last = i + 1 == input.len();
        let literal = match b {
            b' ' | b'\t' => !is_last,
            b'=' => false,
            33..=126 => true,
            _ => false,
        };
        if literal {
            out.push(b);
        } else {
            out.push(b'=');
            out.push(HEX_UPPER[usize::from(b >> 4)]);
            out.push(HEX_UPPER[usize::from(b & 0x0F)]);
        }
    }
    out
}

/// Quoted-printable decoding.
///
/// Accepts upper- or lower-case hex, and soft line breaks (`=` followed by
/// optional spaces/tabs and a line ending, or `=` at end of input).
fn qp_decode(name: &str, input: &[u8]) -> Result<Vec<u8>, TransformError> {
    let mut out = Vec::with_capacity(input.len());
    let mut i = 0;
    while i < input.len() {
        if input[i] != b'=' {
            out.push(input[i]);
            i += 1;
            continue;
        }

        let rest = &input[i + 1..];
        if let [hi, lo, ..] = rest {
            if let (Some(hi), Some(lo)) = (hex_value(*hi), hex_value(*lo)) {
                out.push((hi << 4) | lo);
                i += 3;
                continue;
            }
        }

        let pad = rest.iter().take_while(|b| matches!(b, b' ' | b'\t')).count();
        match &rest[pad..] {
            [] => i = input.len(),
            [b'\r', b'\n', ..] => i += 1 + pad + 2,
            [b'\n', ..] => i += 1 + pad + 1,
            _ => {
                return Err(TransformError::invalid(
                    name,
                    format!("invalid quoted-printable sequence at byte {i}"),
                ));
            }
        }
    }
    Ok(out)
}

fn hex_value(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}
