//! `zlib.*`, `bzip2.*` and `consumed`.
//!
//! `zlib.deflate` produces a raw deflate stream (no zlib header), matching
//! what `zlib.inflate` accepts.

use std::io::{Read, Write};

use bzip2::read::BzDecoder;
use bzip2::write::BzEncoder;
use flate2::read::DeflateDecoder;
use flate2::write::DeflateEncoder;

use super::{StreamFilter, TransformError, family_member};

/// The `zlib.*` family: `deflate` and `inflate`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Zlib;

impl StreamFilter for Zlib {
    fn filter(&self, name: &str, input: &[u8]) -> Result<Vec<u8>, TransformError> {
        match family_member("zlib", name)? {
            "deflate" => {
                let failed =
                    |e: std::io::Error| TransformError::invalid(name, format!("deflate failed: {e}"));
                let mut encoder = DeflateEncoder::new(Vec::new(), flate2::Compression::default());
                encoder.write_all(input).map_err(failed)?;
                encoder.finish().map_err(failed)
            }
            "inflate" => read_all(DeflateDecoder::new(input))
                .map_err(|e| TransformError::invalid(name, format!("invalid deflate data: {e}"))),
            _ => Err(TransformError::Unknown(name.to_string())),
        }
    }
}

/// The `bzip2.*` family: `compress` and `decompress`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Bzip2;

impl StreamFilter for Bzip2 {
    fn filter(&self, name: &str, input: &[u8]) -> Result<Vec<u8>, TransformError> {
        match family_member("bzip2", name)? {
            "compress" => {
                let failed =
                    |e: std::io::Error| TransformError::invalid(name, format!("bzip2 failed: {e}"));
                let mut encoder = BzEncoder::new(Vec::new(), bzip2::Compression::default());
                encoder.write_all(input).map_err(failed)?;
                encoder.finish().map_err(failed)
            }
            "decompress" => read_all(BzDecoder::new(input))
                .map_err(|e| TransformError::invalid(name, format!("invalid bzip2 data: {e}"))),
            _ => Err(TransformError::Unknown(name.to_string())),
        }
    }
}

/// `consumed`: passes input through unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct Consumed;

impl StreamFilter for Consumed {
    fn filter(&self, _name: &str, input: &[u8]) -> Result<Vec<u8>, TransformError> {
        Ok(input.to_vec())
    }
}

fn read_all(mut reader: impl Read) -> std::io::Result<Vec<u8>> {
    let mut out = Vec::new();
    reader.read_to_end(&mut out)?;
    Ok(out)
}
