//! Request path decoding.
//!
//! Turns an incoming URI path into a [`TileRequest`]. A path that is not a
//! tile route at all yields `Ok(None)` so the host can hand the request to
//! another handler; a path that is recognizably a tile route but carries
//! invalid pieces (oversized tileset name, out-of-range coordinates) is an
//! error the host should answer with a bad-request status.

use std::sync::LazyLock;

use regex::Regex;
use tilemux_tile_utils::TileCoord;

use crate::store::MAX_TILESET_NAME;

/// `/{version}?/{names}/{z}/{x}/{y}.{format}`. The format suffix is matched
/// but unused: the served format is the archive's, not the requested one.
static TILE_ROUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^/?(?:(\w+)/)?/?([\w,\-]+)/(\d+)/(\d+)/(\d+)\.(\w+)$")
        .expect("tile route pattern compiles")
});

/// `/{version}?/{names}/metadata.json`
static METADATA_ROUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^/?(?:(\w+)/)?([\w,\-]+)/metadata\.json$")
        .expect("metadata route pattern compiles")
});

/// What a decoded request asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    /// Tile data at the given TMS coordinate.
    Tile(TileCoord),
    /// The (merged) metadata document of the named tilesets.
    Metadata,
}

/// A decoded tile or metadata request.
///
/// Built once by [`decode_path`] and consumed once by the compositor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileRequest {
    /// Version tag from the optional leading path segment.
    pub version: Option<String>,
    /// Requested tileset names, in request order, not deduplicated.
    pub names: Vec<String>,
    /// Tile fetch or metadata request.
    pub kind: RequestKind,
}

/// Errors for paths that match a tile route shape but are invalid.
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum RouteError {
    /// A tileset identifier exceeds [`MAX_TILESET_NAME`] bytes.
    #[error("tileset name too long: {0:?}")]
    NameTooLong(String),

    /// Zoom, x or y does not fit the addressable tile space.
    #[error("tile coordinate out of range: {0}")]
    CoordinateOutOfRange(String),
}

/// Decodes a request path.
///
/// `Ok(None)` means the path is not a tile route and the caller must
/// decline it rather than fail. A `/metadata.json` suffix (matched
/// case-insensitively) selects a metadata request for the preceding
/// name-list segment; anything else must look like
/// `/{version}?/{names}/{z}/{x}/{y}.{format}`. The requested `y` is
/// converted from XYZ to the TMS row numbering used by tile archives.
pub fn decode_path(path: &str) -> Result<Option<TileRequest>, RouteError> {
    if let Some(captures) = METADATA_ROUTE.captures(path) {
        return Ok(Some(TileRequest {
            version: captures.get(1).map(|m| m.as_str().to_string()),
            names: split_names(&captures[2])?,
            kind: RequestKind::Metadata,
        }));
    }

    let Some(captures) = TILE_ROUTE.captures(path) else {
        return Ok(None);
    };

    let out_of_range = || RouteError::CoordinateOutOfRange(path.to_string());
    let z: u8 = captures[3].parse().map_err(|_| out_of_range())?;
    let x: u32 = captures[4].parse().map_err(|_| out_of_range())?;
    let y: u32 = captures[5].parse().map_err(|_| out_of_range())?;
    let coord = TileCoord::from_xyz(z, x, y).ok_or_else(out_of_range)?;

    Ok(Some(TileRequest {
        version: captures.get(1).map(|m| m.as_str().to_string()),
        names: split_names(&captures[2])?,
        kind: RequestKind::Tile(coord),
    }))
}

/// Splits the comma-separated name-list, preserving order and dropping
/// empty pieces. Oversized identifiers are rejected outright, never
/// truncated.
fn split_names(list: &str) -> Result<Vec<String>, RouteError> {
    list.split(',')
        .filter(|name| !name.is_empty())
        .map(|name| {
            if name.len() > MAX_TILESET_NAME {
                Err(RouteError::NameTooLong(name.to_string()))
            } else {
                Ok(name.to_string())
            }
        })
        .collect()
}
