//! Registry of opened tilesets.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tilemux_tile_utils::{TileCoord, TileData, TileInfo};
use tracing::{error, info, trace};

use super::{MAX_TILESET_NAME, StoreError, TileStore};

/// A registered tileset: the archive handle plus what was learned about it
/// at registration time.
#[derive(Debug)]
pub struct TilesetHandle {
    name: String,
    version: Option<String>,
    format: String,
    info: Option<TileInfo>,
    store: Arc<dyn TileStore>,
    available: AtomicBool,
}

impl TilesetHandle {
    /// Tileset name as registered.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the archive holds vector (protocol-buffer) tiles.
    #[must_use]
    pub fn is_vector(&self) -> bool {
        self.info.is_some_and(|i| i.format.is_vector())
    }

    /// Parsed format/encoding, when the declared format is recognized.
    #[must_use]
    pub fn info(&self) -> Option<TileInfo> {
        self.info
    }

    /// Content type for tile responses: the recognized format's MIME type,
    /// or the archive-declared string verbatim.
    #[must_use]
    pub fn content_type(&self) -> &str {
        self.info
            .map_or(self.format.as_str(), |i| i.format.content_type())
    }

    /// False once the archive has reported a store error.
    #[must_use]
    pub fn is_available(&self) -> bool {
        self.available.load(Ordering::Relaxed)
    }

    /// Reads one tile, taking the tileset out of service on a store error.
    pub async fn read_tile(&self, coord: TileCoord) -> Result<Option<TileData>, StoreError> {
        match self.store.read_tile(coord).await {
            Ok(tile) => {
                if tile.is_none() {
                    trace!("no tile {coord} in {}", self.name);
                }
                Ok(tile)
            }
            Err(e) => {
                self.take_out_of_service(&e);
                Err(e)
            }
        }
    }

    /// Reads the metadata rows, taking the tileset out of service on a
    /// store error.
    pub async fn metadata_rows(&self) -> Result<Vec<(String, String)>, StoreError> {
        match self.store.metadata_rows().await {
            Ok(rows) => Ok(rows),
            Err(e) => {
                self.take_out_of_service(&e);
                Err(e)
            }
        }
    }

    fn take_out_of_service(&self, cause: &StoreError) {
        error!(
            "tileset {} failed and is out of service until restart: {cause}",
            self.name
        );
        self.available.store(false, Ordering::Relaxed);
    }
}

/// Errors raised while registering tilesets.
#[derive(thiserror::Error, Debug)]
pub enum RegistryError {
    /// The identifier exceeds [`MAX_TILESET_NAME`] bytes.
    #[error("tileset name too long: {0:?}")]
    NameTooLong(String),

    /// A tileset with the same version tag and name already exists.
    #[error("tileset {0:?} is already registered")]
    DuplicateTileset(String),
}

/// Discovery entry describing one registered tileset.
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CatalogEntry {
    /// MIME type its tile responses carry.
    pub content_type: String,
    /// `Content-Encoding` of its tile responses, if any.
    pub content_encoding: Option<String>,
    /// Version tag the tileset was registered under.
    pub version: Option<String>,
}

/// Serializable map of registered tilesets, keyed by `name` or
/// `version/name`.
pub type TilesetCatalog = BTreeMap<String, CatalogEntry>;

/// All tilesets the server knows, indexed by (version tag, name).
///
/// Built once at startup and passed by reference into request handling;
/// lookups need no locking and requests never mutate it beyond taking a
/// failed tileset out of service.
#[derive(Debug, Default)]
pub struct TilesetRegistry(DashMap<(Option<String>, String), Arc<TilesetHandle>>);

impl TilesetRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an opened archive under a name and optional version tag.
    pub fn register(
        &self,
        version: Option<&str>,
        name: &str,
        store: Arc<dyn TileStore>,
    ) -> Result<(), RegistryError> {
        if name.len() > MAX_TILESET_NAME {
            return Err(RegistryError::NameTooLong(name.to_string()));
        }
        let key = (version.map(ToString::to_string), name.to_string());
        if self.0.contains_key(&key) {
            return Err(RegistryError::DuplicateTileset(name.to_string()));
        }

        let format = store.format().to_string();
        let info = TileInfo::from_format_name(&format);
        info!(
            "registered {} {name}: format {format}",
            if info.is_some_and(|i| i.format.is_vector()) {
                "vector tileset"
            } else {
                "raster tileset"
            },
        );
        self.0.insert(
            key,
            Arc::new(TilesetHandle {
                name: name.to_string(),
                version: version.map(ToString::to_string),
                format,
                info,
                store,
                available: AtomicBool::new(true),
            }),
        );
        Ok(())
    }

    /// Looks up a tileset by version tag and name.
    #[must_use]
    pub fn resolve(&self, version: Option<&str>, name: &str) -> Option<Arc<TilesetHandle>> {
        let key = (version.map(ToString::to_string), name.to_string());
        self.0.get(&key).map(|entry| Arc::clone(entry.value()))
    }

    /// Number of registered tilesets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Discovery catalog over all registered tilesets.
    #[must_use]
    pub fn catalog(&self) -> TilesetCatalog {
        self.0
            .iter()
            .map(|entry| {
                let handle = entry.value();
                let key = match &handle.version {
                    Some(version) => format!("{version}/{}", handle.name),
                    None => handle.name.clone(),
                };
                let entry = CatalogEntry {
                    content_type: handle.content_type().to_string(),
                    content_encoding: handle
                        .info
                        .and_then(|i| i.encoding.content_encoding())
                        .map(ToString::to_string),
                    version: handle.version.clone(),
                };
                (key, entry)
            })
            .collect()
    }
}
