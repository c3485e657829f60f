//! The tile archive seam.
//!
//! tilemux does not read archives itself; the embedding application opens
//! each archive once at startup and hands the core an object implementing
//! [`TileStore`]. The [`registry`] keeps those handles for the process
//! lifetime and serves concurrent lookups from request handlers.

mod registry;

use std::fmt::Debug;

pub use registry::{CatalogEntry, RegistryError, TilesetCatalog, TilesetHandle, TilesetRegistry};
use tilemux_tile_utils::{TileCoord, TileData};

/// Longest accepted tileset identifier, in bytes.
pub const MAX_TILESET_NAME: usize = 40;

/// Errors reported by a tile archive.
///
/// An absent tile is not an error: [`TileStore::read_tile`] returns
/// `Ok(None)` for it. An `Err` means I/O failure or corruption and is
/// fatal for the tileset; the registry stops routing requests to it.
#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    /// Underlying I/O failure.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// The archive content is unreadable or inconsistent.
    #[error("corrupt tile archive: {0}")]
    Corrupt(String),

    /// Any other backend-specific failure.
    #[error(transparent)]
    Backend(#[from] Box<dyn std::error::Error + Send + Sync>),
}

/// One opened tile archive.
///
/// Implementations must support concurrent read-only access from many
/// simultaneous requests; handles live for the process lifetime.
#[async_trait::async_trait]
pub trait TileStore: Send + Sync + Debug {
    /// Tile format declared by the archive (`pbf`, `png`, ...).
    fn format(&self) -> &str;

    /// Reads the tile blob at a TMS coordinate. `Ok(None)` when the
    /// archive has no tile there.
    async fn read_tile(&self, coord: TileCoord) -> Result<Option<TileData>, StoreError>;

    /// Reads the raw metadata rows in storage order.
    async fn metadata_rows(&self) -> Result<Vec<(String, String)>, StoreError>;
}
