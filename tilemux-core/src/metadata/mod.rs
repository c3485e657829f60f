//! Tileset metadata handling.
//!
//! An archive's `metadata` table is a flat list of (key, value) string rows.
//! [`TilesetMetadata`] is the parsed form; [`merge`] combines the records of
//! several tilesets into one, and [`TilesetMetadata::to_json`] renders the
//! TileJSON-style document served to clients.

mod json;
mod merge;
mod parse;

pub use merge::merge;
use tilejson::Bounds;

/// Errors raised while parsing metadata rows.
#[derive(thiserror::Error, Debug)]
pub enum MetadataError {
    /// A `bounds` row did not hold exactly four comma-separated numbers.
    #[error("malformed bounds value {value:?}: {reason}")]
    MalformedBounds {
        /// The offending raw row value.
        value: String,
        /// Parser diagnostic.
        reason: String,
    },
}

/// Parsed metadata of one tileset, or of several tilesets combined.
///
/// Every field is optional; absent fields are omitted from the serialized
/// document. All strings are owned copies of the archive rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TilesetMetadata {
    /// Human-readable tileset name.
    pub name: Option<String>,
    /// Declared tile format (`pbf`, `png`, ...), kept as the raw string.
    pub format: Option<String>,
    /// Attribution line.
    pub attribution: Option<String>,
    /// Tiles URL template, normally filled in per request.
    pub tiles_url: Option<String>,
    /// Raw body of the `vector_layers` array extracted from the `json` row,
    /// re-emitted verbatim.
    pub vector_layers: Option<String>,
    /// Geographic extent: west, south, east, north.
    pub bounds: Option<Bounds>,
    /// Lowest zoom level with tiles.
    pub minzoom: Option<u8>,
    /// Highest zoom level with tiles.
    pub maxzoom: Option<u8>,
    /// Tileset revision.
    pub version: Option<f64>,
    /// Unrecognized rows in encounter order; values are opaque and are
    /// re-emitted without re-escaping.
    pub custom: Vec<(String, String)>,
}

impl TilesetMetadata {
    /// Fills [`tiles_url`](Self::tiles_url) with the template
    /// `https://{host}/{version/}?{name}/{z}/{x}/{y}(.{format})?`.
    ///
    /// The version segment is present only when the request carried a
    /// version tag; the suffix only when the tileset declares a format.
    pub fn set_tiles_url(&mut self, host: &str, version: Option<&str>, full_name: &str) {
        let mut url = format!("https://{host}/");
        if let Some(version) = version {
            url.push_str(version);
            url.push('/');
        }
        url.push_str(full_name);
        url.push_str("/{z}/{x}/{y}");
        if let Some(format) = &self.format {
            url.push('.');
            url.push_str(format);
        }
        self.tiles_url = Some(url);
    }
}
