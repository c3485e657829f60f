//! Cross-tileset metadata merge.

use super::TilesetMetadata;

/// Separator between tileset names in a combined record.
const NAME_SEPARATOR: &str = " + ";
/// Separator between distinct attribution lines.
const ATTRIBUTION_SEPARATOR: &str = " | ";

/// Combines the metadata records of a composite request into one.
///
/// Scalar ranges widen (`minzoom` min, `maxzoom` max, bounds envelope);
/// text fields are joined in input order. `format` is taken from the first
/// record without cross-record validation: a composite over mismatched
/// formats is not detected here. The combined `version` is always `1`.
/// Per-tileset `tiles` URLs and custom rows are not carried over; the URL
/// is finalized for the composite afterwards.
#[must_use]
pub fn merge(records: &[TilesetMetadata]) -> TilesetMetadata {
    let mut combined = TilesetMetadata::default();

    let mut names = Vec::new();
    let mut attributions: Vec<&str> = Vec::new();
    let mut layers = Vec::new();

    for record in records {
        if let Some(name) = record.name.as_deref().filter(|v| !v.is_empty()) {
            names.push(name);
        }
        if let Some(attribution) = record.attribution.as_deref() {
            if !attributions
                .iter()
                .any(|seen| seen.eq_ignore_ascii_case(attribution))
            {
                attributions.push(attribution);
            }
        }
        if let Some(fragment) = record.vector_layers.as_deref().filter(|v| !v.is_empty()) {
            layers.push(fragment);
        }

        combined.minzoom = match (combined.minzoom, record.minzoom) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };
        combined.maxzoom = match (combined.maxzoom, record.maxzoom) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, b) => a.or(b),
        };
        combined.bounds = match (combined.bounds, record.bounds) {
            (Some(a), Some(b)) => Some(a + b),
            (a, b) => a.or(b),
        };
    }

    if !names.is_empty() {
        combined.name = Some(names.join(NAME_SEPARATOR));
    }
    if !attributions.is_empty() {
        combined.attribution = Some(attributions.join(ATTRIBUTION_SEPARATOR));
    }
    if !layers.is_empty() {
        combined.vector_layers = Some(layers.join(","));
    }
    combined.format = records.first().and_then(|r| r.format.clone());
    combined.version = Some(1.0);

    combined
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use tilejson::Bounds;

    use super::*;

    fn record(name: &str) -> TilesetMetadata {
        TilesetMetadata {
            name: Some(name.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn single_record_passes_through_except_version() {
        let input = TilesetMetadata {
            name: Some("vt".to_string()),
            format: Some("pbf".to_string()),
            attribution: Some("OSM".to_string()),
            vector_layers: Some(r#"{"id":"roads"}"#.to_string()),
            bounds: Some(Bounds::new(-10.0, 0.0, 10.0, 20.0)),
            minzoom: Some(2),
            maxzoom: Some(14),
            version: Some(3.0),
            ..Default::default()
        };
        let combined = merge(std::slice::from_ref(&input));
        assert_eq!(combined.name, input.name);
        assert_eq!(combined.format, input.format);
        assert_eq!(combined.attribution, input.attribution);
        assert_eq!(combined.vector_layers, input.vector_layers);
        assert_eq!(combined.bounds, input.bounds);
        assert_eq!(combined.minzoom, input.minzoom);
        assert_eq!(combined.maxzoom, input.maxzoom);
        // The combined version is forced, regardless of inputs.
        assert_relative_eq!(combined.version.expect("set"), 1.0);
    }

    #[test]
    fn names_join_in_order_skipping_empty() {
        let mut unnamed = TilesetMetadata::default();
        unnamed.name = Some(String::new());
        let combined = merge(&[record("vt"), unnamed, record("dem")]);
        assert_eq!(combined.name.as_deref(), Some("vt + dem"));
    }

    #[test]
    fn attribution_dedups_case_insensitively() {
        let mut a = record("a");
        a.attribution = Some("OSM".to_string());
        let mut b = record("b");
        b.attribution = Some("osm".to_string());
        let mut c = record("c");
        c.attribution = Some("NaturalEarth".to_string());

        let combined = merge(&[a, b, c]);
        let attribution = combined.attribution.expect("set");
        assert_eq!(attribution, "OSM | NaturalEarth");
        assert_eq!(attribution.matches("OSM").count(), 1);
    }

    #[test]
    fn zoom_ranges_widen() {
        let mut a = record("a");
        a.minzoom = Some(4);
        a.maxzoom = Some(10);
        let mut b = record("b");
        b.minzoom = Some(2);
        b.maxzoom = Some(8);
        let unset = record("c");

        let combined = merge(&[a, b, unset]);
        assert_eq!(combined.minzoom, Some(2));
        assert_eq!(combined.maxzoom, Some(10));
    }

    #[test]
    fn bounds_merge_to_envelope() {
        let mut a = record("a");
        a.bounds = Some(Bounds::new(-10.0, 0.0, 10.0, 20.0));
        let mut b = record("b");
        b.bounds = Some(Bounds::new(-5.0, 5.0, 15.0, 25.0));

        let combined = merge(&[a, b]);
        assert_eq!(combined.bounds, Some(Bounds::new(-10.0, 0.0, 15.0, 25.0)));
    }

    #[test]
    fn vector_layer_fragments_concatenate() {
        let mut a = record("a");
        a.vector_layers = Some(r#"{"id":"roads"}"#.to_string());
        let empty = record("b");
        let mut c = record("c");
        c.vector_layers = Some(r#"{"id":"water"}"#.to_string());

        let combined = merge(&[a, empty, c]);
        assert_eq!(
            combined.vector_layers.as_deref(),
            Some(r#"{"id":"roads"},{"id":"water"}"#)
        );
    }

    #[test]
    fn format_comes_from_first_record() {
        let mut a = record("a");
        a.format = Some("pbf".to_string());
        let mut b = record("b");
        b.format = Some("png".to_string());
        // Mismatched formats are not detected; the first one wins.
        assert_eq!(merge(&[a, b]).format.as_deref(), Some("pbf"));
    }
}
