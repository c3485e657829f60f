//! Row-by-row metadata parser.

use std::fmt::Display;
use std::str::FromStr;

use tilejson::Bounds;
use tracing::warn;

use super::{MetadataError, TilesetMetadata};

/// Marker preceding the layer list inside the `json` metadata row.
const VECTOR_LAYERS_MARKER: &str = "\"vector_layers\":[";

impl TilesetMetadata {
    /// Applies one (key, value) metadata row to this record.
    ///
    /// Returns whether the key belongs to the recognized set. Unrecognized
    /// rows are appended to [`custom`](Self::custom) verbatim. Numeric rows
    /// that fail to parse are logged and left unset, except `bounds`, which
    /// must hold exactly four comma-separated numbers or the whole row is
    /// rejected.
    pub fn apply_row(&mut self, key: &str, value: &str) -> Result<bool, MetadataError> {
        match key {
            "name" => self.name = Some(value.to_string()),
            "format" => self.format = Some(value.to_string()),
            "attribution" => self.attribution = Some(value.to_string()),
            "tiles" => self.tiles_url = Some(value.to_string()),
            "minzoom" => self.minzoom = parse_or_warn(key, value),
            "maxzoom" => self.maxzoom = parse_or_warn(key, value),
            "version" => self.version = parse_or_warn(key, value),
            "bounds" => {
                self.bounds =
                    Some(
                        Bounds::from_str(value).map_err(|e| MetadataError::MalformedBounds {
                            value: value.to_string(),
                            reason: e.to_string(),
                        })?,
                    );
            }
            "json" => self.vector_layers = extract_vector_layers(value),
            // Recognized input keys that are never re-emitted.
            "type" | "scheme" => {}
            _ => {
                self.custom.push((key.to_string(), value.to_string()));
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Parses a full row sequence into a fresh record.
    pub fn from_rows<K, V>(rows: impl IntoIterator<Item = (K, V)>) -> Result<Self, MetadataError>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut metadata = Self::default();
        for (key, value) in rows {
            metadata.apply_row(key.as_ref(), value.as_ref())?;
        }
        Ok(metadata)
    }
}

fn parse_or_warn<T: FromStr>(key: &str, value: &str) -> Option<T>
where
    T::Err: Display,
{
    match value.parse() {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            warn!("ignoring unparseable metadata row {key}={value}: {e}");
            None
        }
    }
}

/// Pulls the raw `vector_layers` array body out of the `json` row.
///
/// Takes everything between the marker's `[` and the next `]`. A simple
/// bracket scan: nested arrays inside layer definitions are not specially
/// handled, matching how the fragment is later re-emitted verbatim.
fn extract_vector_layers(json: &str) -> Option<String> {
    let start = json.find(VECTOR_LAYERS_MARKER)?;
    let tail = &json[start..];
    let open = tail.find('[')?;
    let close = tail.find(']')?;
    Some(tail.get(open + 1..close)?.to_string())
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn copies_string_rows_verbatim() {
        let md = TilesetMetadata::from_rows([
            ("name", "Street map"),
            ("format", "pbf"),
            ("attribution", "© OpenStreetMap contributors"),
            ("tiles", "https://example.com/{z}/{x}/{y}.pbf"),
        ])
        .expect("valid rows");
        assert_eq!(md.name.as_deref(), Some("Street map"));
        assert_eq!(md.format.as_deref(), Some("pbf"));
        assert_eq!(md.attribution.as_deref(), Some("© OpenStreetMap contributors"));
        assert_eq!(
            md.tiles_url.as_deref(),
            Some("https://example.com/{z}/{x}/{y}.pbf")
        );
        assert!(md.custom.is_empty());
    }

    #[test]
    fn parses_numeric_rows() {
        let md = TilesetMetadata::from_rows([
            ("minzoom", "0"),
            ("maxzoom", "14"),
            ("version", "2.5"),
        ])
        .expect("valid rows");
        assert_eq!(md.minzoom, Some(0));
        assert_eq!(md.maxzoom, Some(14));
        assert_relative_eq!(md.version.expect("set"), 2.5);
    }

    #[test]
    fn unparseable_numbers_stay_unset() {
        let md = TilesetMetadata::from_rows([("minzoom", "soon"), ("version", "latest")])
            .expect("rows are not rejected");
        assert_eq!(md.minzoom, None);
        assert_eq!(md.version, None);
    }

    #[test]
    fn parses_bounds() {
        let md = TilesetMetadata::from_rows([("bounds", "-10.5,0,25,71.5")]).expect("valid rows");
        let bounds = md.bounds.expect("set");
        assert_relative_eq!(bounds.left, -10.5);
        assert_relative_eq!(bounds.bottom, 0.0);
        assert_relative_eq!(bounds.right, 25.0);
        assert_relative_eq!(bounds.top, 71.5);
    }

    #[test]
    fn short_bounds_are_rejected() {
        let mut md = TilesetMetadata::default();
        let err = md.apply_row("bounds", "-10.5,0,25").expect_err("must fail");
        assert!(matches!(err, MetadataError::MalformedBounds { .. }));
        assert_eq!(md.bounds, None);
    }

    #[test]
    fn extracts_vector_layers_fragment() {
        let json = r#"{"vector_layers":[{"id":"roads"},{"id":"water"}],"tilestats":{}}"#;
        let mut md = TilesetMetadata::default();
        assert!(md.apply_row("json", json).expect("not rejected"));
        assert_eq!(
            md.vector_layers.as_deref(),
            // The scan stops at the first `]`; nested arrays are not parsed.
            Some(r#"{"id":"roads"},{"id":"water"}"#)
        );
    }

    #[test]
    fn json_row_without_marker_is_ignored() {
        let mut md = TilesetMetadata::default();
        assert!(md.apply_row("json", r#"{"tilestats":{}}"#).expect("ok"));
        assert_eq!(md.vector_layers, None);
    }

    #[test]
    fn unknown_keys_accumulate_in_order() {
        let mut md = TilesetMetadata::default();
        assert!(!md.apply_row("generator", "tilemaker").expect("ok"));
        assert!(!md.apply_row("planetiler:osm", "2024-01-01").expect("ok"));
        assert_eq!(
            md.custom,
            vec![
                ("generator".to_string(), "tilemaker".to_string()),
                ("planetiler:osm".to_string(), "2024-01-01".to_string()),
            ]
        );
    }

    #[test]
    fn type_and_scheme_are_recognized_but_dropped() {
        let mut md = TilesetMetadata::default();
        assert!(md.apply_row("type", "overlay").expect("ok"));
        assert!(md.apply_row("scheme", "tms").expect("ok"));
        assert!(md.custom.is_empty());
    }
}
