//! Decompress-and-concatenate pipeline for composite vector tiles.

use tilemux_tile_utils::{InflateOutcome, TileData, inflate_into};

use super::ComposeError;

/// Increment by which the shared decompression buffer grows.
pub(crate) const BUFFER_GROWTH_STEP: usize = 1024 * 1024;

/// Hard cap on the shared buffer; a request that would grow past it is
/// aborted instead.
pub(crate) const MAX_CONCAT_BUFFER: usize = 256 * 1024 * 1024;

/// Gzip level used when recompressing the concatenated payload.
pub(crate) const COMPOSITE_GZIP_LEVEL: u32 = 6;

/// Decompresses each gzip record into one shared buffer, back-to-back.
///
/// Records are processed in order at a running write offset. When a record
/// does not fit the remaining space, the buffer grows by
/// [`BUFFER_GROWTH_STEP`] and that record's decompression restarts from
/// scratch at the same offset; a completed record advances the offset.
/// Returns the concatenated decompressed bytes, exactly the records'
/// payloads in input order.
pub(crate) fn concat_decompressed(records: &[TileData]) -> Result<Vec<u8>, ComposeError> {
    let mut buffer = vec![0_u8; BUFFER_GROWTH_STEP];
    let mut used = 0;

    for record in records {
        loop {
            match inflate_into(&mut buffer[used..], record)? {
                InflateOutcome::Complete(written) => {
                    used += written;
                    break;
                }
                InflateOutcome::NeedSpace => {
                    let grown = buffer.len() + BUFFER_GROWTH_STEP;
                    if grown > MAX_CONCAT_BUFFER {
                        return Err(ComposeError::CompositeTooLarge {
                            limit: MAX_CONCAT_BUFFER,
                        });
                    }
                    buffer.resize(grown, 0);
                }
            }
        }
    }

    buffer.truncate(used);
    Ok(buffer)
}
