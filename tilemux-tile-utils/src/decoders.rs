//! Gzip helpers for tile payloads.
//!
//! Besides the usual whole-buffer encode/decode pair this module provides
//! [`inflate_into`], which decompresses into a caller-supplied slice and
//! reports when the slice is too small instead of allocating. The tile
//! compositing pipeline uses it to fill one shared buffer with several
//! decompressed payloads back-to-back.

use std::io::{ErrorKind, Read as _, Write as _};

use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;

/// Errors raised by the gzip helpers.
#[derive(thiserror::Error, Debug)]
pub enum CodecError {
    /// The payload is not a valid gzip stream.
    #[error("gzip decompression failed: {0}")]
    Inflate(#[source] std::io::Error),

    /// Compression of the output payload failed.
    #[error("gzip compression failed: {0}")]
    Deflate(#[source] std::io::Error),
}

/// Result of one [`inflate_into`] attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InflateOutcome {
    /// The whole stream was decompressed; holds the number of bytes written.
    Complete(usize),
    /// The destination slice filled up before the stream ended. Nothing of
    /// the attempt is kept; retry with a larger destination.
    NeedSpace,
}

/// Decompresses a gzip stream into `dest`.
///
/// Returns [`InflateOutcome::NeedSpace`] when `dest` cannot hold the whole
/// decompressed payload. Each call starts a fresh inflate; a retry after
/// growing must pass the full source again.
pub fn inflate_into(dest: &mut [u8], src: &[u8]) -> Result<InflateOutcome, CodecError> {
    let mut decoder = GzDecoder::new(src);
    let mut written = 0;
    while written < dest.len() {
        match decoder.read(&mut dest[written..]) {
            Ok(0) => return Ok(InflateOutcome::Complete(written)),
            Ok(n) => written += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => {}
            Err(e) => return Err(CodecError::Inflate(e)),
        }
    }
    // The slice is full; probe one byte to learn whether the stream ended
    // exactly on the boundary.
    let mut probe = [0_u8; 1];
    loop {
        return match decoder.read(&mut probe) {
            Ok(0) => Ok(InflateOutcome::Complete(written)),
            Ok(_) => Ok(InflateOutcome::NeedSpace),
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => Err(CodecError::Inflate(e)),
        };
    }
}

/// Decompresses a whole gzip payload into a fresh buffer.
pub fn decode_gzip(data: &[u8]) -> Result<Vec<u8>, CodecError> {
    let mut decoder = GzDecoder::new(data);
    let mut decompressed = Vec::new();
    decoder
        .read_to_end(&mut decompressed)
        .map_err(CodecError::Inflate)?;
    Ok(decompressed)
}

/// Compresses `data` as one gzip stream at the given level (0-9).
pub fn encode_gzip(data: &[u8], level: u32) -> Result<Vec<u8>, CodecError> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::new(level));
    encoder.write_all(data).map_err(CodecError::Deflate)?;
    encoder.finish().map_err(CodecError::Deflate)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip() {
        let payload = b"a small vector tile payload".repeat(64);
        let compressed = encode_gzip(&payload, 6).expect("compress");
        assert_eq!(decode_gzip(&compressed).expect("decompress"), payload);
    }

    #[test]
    fn inflate_into_reports_exact_length() {
        let payload = vec![7_u8; 1000];
        let compressed = encode_gzip(&payload, 6).expect("compress");
        let mut dest = vec![0_u8; 4096];
        let outcome = inflate_into(&mut dest, &compressed).expect("inflate");
        assert_eq!(outcome, InflateOutcome::Complete(1000));
        assert_eq!(&dest[..1000], &payload[..]);
    }

    #[test]
    fn inflate_into_signals_small_buffer() {
        let payload = vec![7_u8; 1000];
        let compressed = encode_gzip(&payload, 6).expect("compress");
        let mut dest = vec![0_u8; 100];
        let outcome = inflate_into(&mut dest, &compressed).expect("inflate");
        assert_eq!(outcome, InflateOutcome::NeedSpace);
    }

    #[test]
    fn inflate_into_exact_fit_completes() {
        let payload = vec![7_u8; 1000];
        let compressed = encode_gzip(&payload, 6).expect("compress");
        let mut dest = vec![0_u8; 1000];
        let outcome = inflate_into(&mut dest, &compressed).expect("inflate");
        assert_eq!(outcome, InflateOutcome::Complete(1000));
        assert_eq!(dest, payload);
    }

    #[test]
    fn inflate_rejects_garbage() {
        let mut dest = vec![0_u8; 64];
        assert!(inflate_into(&mut dest, b"not a gzip stream").is_err());
    }
}
