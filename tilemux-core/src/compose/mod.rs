//! The tile compositor: per-request orchestration.
//!
//! A request flows ParseURI → ResolveNames → one of three paths
//! (metadata document, single-tile fetch, or composite vector tile) and
//! ends in a [`ServeOutcome`] the host turns into an HTTP response.

mod pipeline;

use std::sync::Arc;

use pipeline::{COMPOSITE_GZIP_LEVEL, concat_decompressed};
use tilemux_tile_utils::{CodecError, Format, TileCoord, TileData, encode_gzip};
use tracing::{debug, info};

use crate::metadata::{MetadataError, TilesetMetadata, merge};
use crate::request::{RequestKind, RouteError, TileRequest, decode_path};
use crate::store::{StoreError, TilesetHandle, TilesetRegistry};

/// A canonical empty vector tile, already gzip-compressed. Served in place
/// of missing vector tiles when [`ComposeOptions::return_empty_tile`] is
/// set.
pub const EMPTY_TILE: [u8; 36] = [
    0x1F, 0x8B, 0x08, 0x00, 0xFA, 0x78, 0x18, 0x5E, 0x00, 0x03, 0x93, 0xE2, 0xE3, 0x62, 0x8F, 0x8F,
    0x4F, 0xCD, 0x2D, 0x28, 0xA9, 0xD4, 0x68, 0x50, 0xA8, 0x60, 0x02, 0x00, 0x64, 0x71, 0x44, 0x36,
    0x10, 0x00, 0x00, 0x00,
];

/// Request-handling policy knobs.
#[derive(Debug, Clone, Default)]
pub struct ComposeOptions {
    /// Serve [`EMPTY_TILE`] instead of a no-tile outcome when a vector
    /// request finds nothing.
    pub return_empty_tile: bool,
}

/// Response payload plus the tags the host needs to emit it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileResponse {
    /// Body bytes, complete; never partial.
    pub body: Vec<u8>,
    /// HTTP content type.
    pub content_type: String,
    /// `Content-Encoding` header value, set exactly for vector tile
    /// responses.
    pub content_encoding: Option<&'static str>,
}

impl TileResponse {
    /// A gzip-compressed vector tile response.
    #[must_use]
    pub fn vector(body: Vec<u8>) -> Self {
        Self {
            body,
            content_type: Format::Mvt.content_type().to_string(),
            content_encoding: Some("gzip"),
        }
    }

    /// A metadata document response.
    #[must_use]
    pub fn json(body: String) -> Self {
        Self {
            body: body.into_bytes(),
            content_type: Format::Json.content_type().to_string(),
            content_encoding: None,
        }
    }
}

/// How a request ended, short of an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServeOutcome {
    /// A complete response body.
    Served(TileResponse),
    /// The route was valid but no tileset had the requested tile.
    NoTile,
    /// The path is not a tile route; another handler should serve it.
    Declined,
}

/// Coarse classification the host maps onto HTTP status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// The request itself is invalid.
    BadRequest,
    /// The request names something that does not exist.
    NotFound,
    /// The server failed; nothing was sent.
    Internal,
}

/// Errors that abort a request.
#[derive(thiserror::Error, Debug)]
pub enum ComposeError {
    /// The path matched a tile route shape but carried invalid pieces.
    #[error(transparent)]
    Route(#[from] RouteError),

    /// A metadata row could not be parsed.
    #[error(transparent)]
    Metadata(#[from] MetadataError),

    /// A requested tileset name is not registered.
    #[error("unknown tileset: {0}")]
    UnknownTileset(String),

    /// The tileset is registered but out of service after an earlier
    /// store failure.
    #[error("tileset {0} is out of service")]
    TilesetUnavailable(String),

    /// The tileset's store failed during this request.
    #[error("tileset {name} store failure: {source}")]
    Store {
        /// Failing tileset.
        name: String,
        /// Underlying store error.
        source: StoreError,
    },

    /// A composite request named a non-vector tileset.
    #[error("cannot composite non-vector tileset {0}")]
    CompositeNotVector(String),

    /// The concatenated payload would exceed the buffer cap.
    #[error("composite tile exceeds {limit} bytes")]
    CompositeTooLarge {
        /// The configured cap.
        limit: usize,
    },

    /// Gzip failure while building the composite payload.
    #[error(transparent)]
    Codec(#[from] CodecError),
}

impl ComposeError {
    /// Classifies the error for the response status.
    #[must_use]
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::Route(_) | Self::Metadata(_) | Self::CompositeNotVector(_) => {
                ErrorClass::BadRequest
            }
            Self::UnknownTileset(_) => ErrorClass::NotFound,
            Self::TilesetUnavailable(_)
            | Self::Store { .. }
            | Self::CompositeTooLarge { .. }
            | Self::Codec(_) => ErrorClass::Internal,
        }
    }
}

/// Per-request orchestrator over a shared [`TilesetRegistry`].
///
/// Cheap to build; holds no state beyond the borrowed registry, options
/// and the request's host name (used for the tiles URL in metadata
/// documents). Store reads are awaited one at a time, in name order.
#[derive(Debug)]
pub struct TileCompositor<'a> {
    registry: &'a TilesetRegistry,
    options: &'a ComposeOptions,
    host: &'a str,
}

impl<'a> TileCompositor<'a> {
    /// Creates a compositor for one request.
    #[must_use]
    pub fn new(registry: &'a TilesetRegistry, options: &'a ComposeOptions, host: &'a str) -> Self {
        Self {
            registry,
            options,
            host,
        }
    }

    /// Decodes a request path and serves it.
    pub async fn serve_path(&self, path: &str) -> Result<ServeOutcome, ComposeError> {
        let Some(request) = decode_path(path)? else {
            return Ok(ServeOutcome::Declined);
        };
        self.serve(&request).await
    }

    /// Serves an already-decoded request.
    ///
    /// Every listed name must resolve before any tile data is read; one
    /// unknown name fails the whole request.
    pub async fn serve(&self, request: &TileRequest) -> Result<ServeOutcome, ComposeError> {
        let handles = self.resolve_names(request)?;
        match request.kind {
            RequestKind::Metadata => self.serve_metadata(request, &handles).await,
            RequestKind::Tile(coord) => self.serve_tile(&handles, coord).await,
        }
    }

    fn resolve_names(
        &self,
        request: &TileRequest,
    ) -> Result<Vec<Arc<TilesetHandle>>, ComposeError> {
        let mut handles = Vec::with_capacity(request.names.len());
        for name in &request.names {
            let handle = self
                .registry
                .resolve(request.version.as_deref(), name)
                .ok_or_else(|| ComposeError::UnknownTileset(name.clone()))?;
            if !handle.is_available() {
                return Err(ComposeError::TilesetUnavailable(name.clone()));
            }
            handles.push(handle);
        }
        Ok(handles)
    }

    async fn serve_metadata(
        &self,
        request: &TileRequest,
        handles: &[Arc<TilesetHandle>],
    ) -> Result<ServeOutcome, ComposeError> {
        if handles.is_empty() {
            return Ok(ServeOutcome::NoTile);
        }

        let mut records = Vec::with_capacity(handles.len());
        for handle in handles {
            let rows = handle
                .metadata_rows()
                .await
                .map_err(|e| ComposeError::Store {
                    name: handle.name().to_string(),
                    source: e,
                })?;
            records.push(TilesetMetadata::from_rows(rows)?);
        }

        let mut combined = if records.len() == 1 {
            records.remove(0)
        } else {
            merge(&records)
        };
        let full_name = request.names.join(",");
        combined.set_tiles_url(self.host, request.version.as_deref(), &full_name);

        debug!("serving metadata for {full_name}");
        Ok(ServeOutcome::Served(TileResponse::json(combined.to_json())))
    }

    async fn serve_tile(
        &self,
        handles: &[Arc<TilesetHandle>],
        coord: TileCoord,
    ) -> Result<ServeOutcome, ComposeError> {
        // Composite responses are built by concatenating decompressed
        // payloads, which only vector tiles support.
        if handles.len() > 1 {
            if let Some(handle) = handles.iter().find(|h| !h.is_vector()) {
                return Err(ComposeError::CompositeNotVector(handle.name().to_string()));
            }
        }

        let mut records: Vec<TileData> = Vec::with_capacity(handles.len());
        for handle in handles {
            let tile = handle.read_tile(coord).await.map_err(|e| ComposeError::Store {
                name: handle.name().to_string(),
                source: e,
            })?;
            let Some(bytes) = tile else { continue };

            if !handle.is_vector() {
                // Raster payloads are codec-compressed already and go out
                // exactly as stored.
                debug!(
                    "serving raster tile {coord} from {} ({} bytes)",
                    handle.name(),
                    bytes.len()
                );
                return Ok(ServeOutcome::Served(TileResponse {
                    body: bytes,
                    content_type: handle.content_type().to_string(),
                    content_encoding: None,
                }));
            }
            records.push(bytes);
        }

        match records.len() {
            0 => Ok(self.no_tile(handles, coord)),
            1 => {
                let body = records.swap_remove(0);
                debug!("serving vector tile {coord} ({} bytes)", body.len());
                Ok(ServeOutcome::Served(TileResponse::vector(body)))
            }
            _ => {
                let concatenated = concat_decompressed(&records)?;
                let body = encode_gzip(&concatenated, COMPOSITE_GZIP_LEVEL)?;
                info!(
                    "composited {} tilesets at {coord} ({} bytes decompressed)",
                    records.len(),
                    concatenated.len()
                );
                Ok(ServeOutcome::Served(TileResponse::vector(body)))
            }
        }
    }

    fn no_tile(&self, handles: &[Arc<TilesetHandle>], coord: TileCoord) -> ServeOutcome {
        if self.options.return_empty_tile && handles.iter().all(|h| h.is_vector()) {
            debug!("serving canonical empty tile for {coord}");
            ServeOutcome::Served(TileResponse::vector(EMPTY_TILE.to_vec()))
        } else {
            ServeOutcome::NoTile
        }
    }
}
