#![doc = include_str!("../README.md")]
#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

use std::fmt::{Display, Formatter};

mod decoders;
pub use decoders::{CodecError, InflateOutcome, decode_gzip, encode_gzip, inflate_into};

/// Raw tile bytes as stored in an archive (PNG, gzipped MVT, etc.).
pub type TileData = Vec<u8>;

/// Tile address in TMS space.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct TileCoord {
    /// Zoom level.
    pub z: u8,
    /// Column, counted from the west.
    pub x: u32,
    /// Row, counted from the south (TMS convention).
    pub y: u32,
}

impl TileCoord {
    /// Builds a TMS coordinate from an XYZ-addressed request.
    ///
    /// XYZ counts rows from the north, TMS from the south:
    /// `y_tms = 2^z - 1 - y_xyz`. Returns `None` when the row does not
    /// exist at this zoom level (`y_xyz >= 2^z`) or the zoom itself is
    /// out of the addressable range.
    #[must_use]
    pub fn from_xyz(z: u8, x: u32, y: u32) -> Option<Self> {
        if z > 30 {
            return None;
        }
        let rows = 1_u32 << z;
        let y = rows.checked_sub(y)?.checked_sub(1)?;
        Some(Self { z, x, y })
    }
}

impl Display for TileCoord {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}", self.z, self.x, self.y)
    }
}

/// Tile payload format, as declared by the archive metadata.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Format {
    /// Mapbox vector tile (protocol buffers).
    Mvt,
    /// PNG raster.
    Png,
    /// JPEG raster.
    Jpeg,
    /// WebP raster.
    Webp,
    /// GIF raster.
    Gif,
    /// JSON document (e.g. UTFGrid).
    Json,
}

impl Format {
    /// Parses an archive-declared format string.
    ///
    /// Returns `None` for formats tilemux does not recognize; callers are
    /// expected to fall back to serving the declared string verbatim as
    /// the content type.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        Some(match value.to_ascii_lowercase().as_str() {
            "pbf" | "mvt" => Self::Mvt,
            "png" => Self::Png,
            "jpg" | "jpeg" => Self::Jpeg,
            "webp" => Self::Webp,
            "gif" => Self::Gif,
            "json" => Self::Json,
            _ => None?,
        })
    }

    /// HTTP content type for this format.
    #[must_use]
    pub fn content_type(&self) -> &'static str {
        match *self {
            Self::Mvt => "application/x-protobuf",
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::Webp => "image/webp",
            Self::Gif => "image/gif",
            Self::Json => "application/json",
        }
    }

    /// Whether payloads of this format can be byte-concatenated after
    /// decompression (vector tiles only).
    #[must_use]
    pub fn is_vector(&self) -> bool {
        matches!(self, Self::Mvt)
    }
}

impl Display for Format {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match *self {
            Self::Mvt => "mvt",
            Self::Png => "png",
            Self::Jpeg => "jpeg",
            Self::Webp => "webp",
            Self::Gif => "gif",
            Self::Json => "json",
        })
    }
}

/// On-the-wire compression of a tile payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Encoding {
    /// Payload is served as-is (raster codecs compress internally).
    Uncompressed,
    /// Payload is gzip-compressed, as vector tiles are stored.
    Gzip,
}

impl Encoding {
    /// Value for the `Content-Encoding` response header, if any.
    #[must_use]
    pub fn content_encoding(&self) -> Option<&'static str> {
        match *self {
            Self::Uncompressed => None,
            Self::Gzip => Some("gzip"),
        }
    }

    /// Whether the payload carries an outer compression layer.
    #[must_use]
    pub fn is_encoded(&self) -> bool {
        *self != Self::Uncompressed
    }
}

/// Format plus encoding of a tileset's payloads.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TileInfo {
    /// Payload format.
    pub format: Format,
    /// Outer compression layer.
    pub encoding: Encoding,
}

impl TileInfo {
    /// Creates a new tile info descriptor.
    #[must_use]
    pub fn new(format: Format, encoding: Encoding) -> Self {
        Self { format, encoding }
    }

    /// Derives the descriptor from an archive-declared format string.
    ///
    /// Vector archives store their tiles gzip-compressed; everything else
    /// is treated as internally-compressed and served unencoded.
    #[must_use]
    pub fn from_format_name(value: &str) -> Option<Self> {
        let format = Format::parse(value)?;
        let encoding = if format.is_vector() {
            Encoding::Gzip
        } else {
            Encoding::Uncompressed
        };
        Some(Self { format, encoding })
    }
}

impl Display for TileInfo {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.encoding.content_encoding() {
            Some(enc) => write!(f, "{}; {enc}", self.format),
            None => write!(f, "{}", self.format),
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("pbf", Some(Format::Mvt))]
    #[case("mvt", Some(Format::Mvt))]
    #[case("PNG", Some(Format::Png))]
    #[case("jpg", Some(Format::Jpeg))]
    #[case("jpeg", Some(Format::Jpeg))]
    #[case("webp", Some(Format::Webp))]
    #[case("tiff", None)]
    #[case("", None)]
    fn format_parsing(#[case] value: &str, #[case] expected: Option<Format>) {
        assert_eq!(Format::parse(value), expected);
    }

    #[test]
    fn vector_archives_are_gzip_encoded() {
        let info = TileInfo::from_format_name("pbf").expect("known format");
        assert_eq!(info.format, Format::Mvt);
        assert_eq!(info.encoding, Encoding::Gzip);
        assert_eq!(info.encoding.content_encoding(), Some("gzip"));

        let info = TileInfo::from_format_name("png").expect("known format");
        assert_eq!(info.encoding, Encoding::Uncompressed);
        assert_eq!(info.encoding.content_encoding(), None);
    }

    #[rstest]
    #[case(3, 2, Some(5))]
    #[case(0, 0, Some(0))]
    #[case(1, 1, Some(0))]
    #[case(1, 2, None)] // row does not exist at zoom 1
    #[case(5, 31, Some(0))]
    fn xyz_row_inversion(#[case] z: u8, #[case] y_xyz: u32, #[case] y_tms: Option<u32>) {
        assert_eq!(TileCoord::from_xyz(z, 0, y_xyz).map(|c| c.y), y_tms);
    }

    #[test]
    fn coord_display() {
        let coord = TileCoord { z: 3, x: 1, y: 5 };
        assert_eq!(coord.to_string(), "3/1/5");
    }
}
