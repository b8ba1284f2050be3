//! `dechunk`: HTTP/1.1 chunked transfer decoding.

use super::{StreamFilter, TransformError};

/// Decodes `<hex-size>[;ext]\r\n<data>\r\n ... 0\r\n\r\n`.
///
/// Bare `\n` line endings are accepted. Trailers after the last chunk are
/// ignored. Input that ends cleanly between chunks is returned as decoded so
/// far.
#[derive(Debug, Clone, Copy, Default)]
pub struct Dechunk;

impl StreamFilter for Dechunk {
    fn filter(&self, name: &str, input: &[u8]) -> Result<Vec<u8>, TransformError> {
        let mut out = Vec::with_capacity(input.len());
        let mut rest = input;

        while !rest.is_empty() {
            let (line, after) = split_line(rest)
                .ok_or_else(|| TransformError::invalid(name, "unterminated chunk-size line"))?;
            let size = parse_size(line).ok_or_else(|| {
                TransformError::invalid(
                    name,
                    format!("invalid chunk size {:?}", String::from_utf8_lossy(line)),
                )
            })?;
            if size == 0 {
                break;
            }
            if after.len() < size {
                return Err(TransformError::invalid(name, "truncated chunk"));
            }
            out.extend_from_slice(&after[..size]);
            rest = match &after[size..] {
                [b'\r', b'\n', tail @ ..] | [b'\n', tail @ ..] => tail,
                [] => &[],
                _ => return Err(TransformError::invalid(name, "missing CRLF after chunk data")),
            };
        }

        Ok(out)
    }
}

/// Split off one line, dropping its `\r\n` or `\n` terminator.
fn split_line(input: &[u8]) -> Option<(&[u8], &[u8])> {
    let nl = input.iter().position(|&b| b == b'\n')?;
    let line = input[..nl].strip_suffix(b"\r").unwrap_or(&input[..nl]);
    Some((line, &input[nl + 1..]))
}

fn parse_size(line: &[u8]) -> Option<usize> {
    let digits = line.split(|&b| b == b';').next()?;
    let digits = std::str::from_utf8(digits).ok()?.trim();
    if digits.is_empty() {
        return None;
    }
    usize::from_str_radix(digits, 16).ok()
}
