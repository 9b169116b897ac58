//! Response body content encodings.

use crate::model::ContentEncoding;
use base64::Engine as _;
use flate2::write::{GzEncoder, ZlibEncoder};
use flate2::Compression;
use std::io::Write;

#[derive(Debug, thiserror::Error)]
#[error("Failed to apply {encoding} encoding: {source}")]
pub struct EncodingError {
    pub encoding: ContentEncoding,
    #[source]
    pub source: std::io::Error,
}

/// Apply one encoding to `body`.
pub fn encode(encoding: ContentEncoding, body: &[u8]) -> Result<Vec<u8>, EncodingError> {
    let wrap = |source| EncodingError { encoding, source };
    match encoding {
        ContentEncoding::Gzip => {
            let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
            encoder.write_all(body).map_err(wrap)?;
            encoder.finish().map_err(wrap)
        }
        ContentEncoding::Deflate => {
            let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
            encoder.write_all(body).map_err(wrap)?;
            encoder.finish().map_err(wrap)
        }
        ContentEncoding::Base64 => {
            Ok(base64::engine::general_purpose::STANDARD
                .encode(body)
                .into_bytes())
        }
        ContentEncoding::Identity => Ok(body.to_vec()),
    }
}

/// Apply `encodings` in order.
pub fn encode_all(encodings: &[ContentEncoding], body: &[u8]) -> Result<Vec<u8>, EncodingError> {
    encodings
        .iter()
        .try_fold(body.to_vec(), |current, encoding| encode(*encoding, &current))
}
