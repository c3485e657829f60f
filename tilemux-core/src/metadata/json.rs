//! Metadata document serializer.
//!
//! The document is a single flat JSON object built with a small append-only
//! builder rather than a serde tree: stored string values (including the
//! `vector_layers` fragment and custom rows) are emitted verbatim, without
//! re-escaping, which a structured serializer would not allow.

use std::fmt::Write as _;

use super::TilesetMetadata;

/// Significant digits kept when printing bounds coordinates.
const BOUNDS_DIGITS: i32 = 6;

struct JsonBuilder {
    out: String,
    first: bool,
}

impl JsonBuilder {
    fn new() -> Self {
        Self {
            out: String::from("{"),
            first: true,
        }
    }

    fn key(&mut self, name: &str) {
        if !self.first {
            self.out.push(',');
        }
        self.first = false;
        let _ = write!(self.out, "\"{name}\":");
    }

    /// Emits `"name":"value"`; the value is written as-is.
    fn string_member(&mut self, name: &str, value: &str) {
        self.key(name);
        self.out.push('"');
        self.out.push_str(value);
        self.out.push('"');
    }

    /// Emits `"name":` followed by raw JSON text.
    fn raw_member(&mut self, name: &str, raw: &str) {
        self.key(name);
        self.out.push_str(raw);
    }

    fn finish(mut self) -> String {
        self.out.push('}');
        self.out
    }
}

impl TilesetMetadata {
    /// Renders the record as one compact JSON object.
    ///
    /// Fields appear in a fixed order and are omitted entirely when unset;
    /// a record with nothing set serializes to `{}`. Custom rows follow the
    /// recognized fields as flat members of the same object.
    #[must_use]
    pub fn to_json(&self) -> String {
        let mut json = JsonBuilder::new();

        if let Some(name) = &self.name {
            json.string_member("name", name);
        }
        if let Some(format) = &self.format {
            json.string_member("format", format);
        }
        if let Some(attribution) = &self.attribution {
            json.string_member("attribution", attribution);
        }
        if let Some(tiles_url) = &self.tiles_url {
            json.raw_member("tiles", &format!("[\"{tiles_url}\"]"));
        }
        if let Some(minzoom) = self.minzoom {
            json.raw_member("minzoom", &minzoom.to_string());
        }
        if let Some(maxzoom) = self.maxzoom {
            json.raw_member("maxzoom", &maxzoom.to_string());
        }
        if let Some(version) = self.version {
            json.raw_member("version", &format_version(version));
        }
        if let Some(bounds) = self.bounds {
            let coords = [bounds.left, bounds.bottom, bounds.right, bounds.top]
                .map(|v| format_significant(v, BOUNDS_DIGITS));
            json.raw_member("bounds", &format!("[{}]", coords.join(",")));
        }
        if let Some(fragment) = &self.vector_layers {
            json.raw_member("vector_layers", &format!("[{fragment}]"));
        }
        for (name, value) in &self.custom {
            json.string_member(name, value);
        }

        json.finish()
    }
}

/// Prints `value` with at most `digits` significant digits, trailing zeros
/// suppressed and no bare trailing `.` on integral values.
fn format_significant(value: f64, digits: i32) -> String {
    if value == 0.0 || !value.is_finite() {
        return "0".to_string();
    }
    #[expect(clippy::cast_possible_truncation)]
    let magnitude = value.abs().log10().floor() as i32;
    let decimals = digits - 1 - magnitude;
    let mut formatted = if decimals > 0 {
        #[expect(clippy::cast_sign_loss)]
        let precision = decimals as usize;
        format!("{value:.precision$}")
    } else {
        // All significant digits sit left of the decimal point; round to
        // the appropriate power of ten.
        let scale = 10_f64.powi(-decimals);
        format!("{:.0}", (value / scale).round() * scale)
    };
    if formatted.contains('.') {
        while formatted.ends_with('0') {
            formatted.pop();
        }
        if formatted.ends_with('.') {
            formatted.pop();
        }
    }
    formatted
}

/// Prints a version number without a decimal point when integral, else
/// with up to two fractional digits.
#[expect(clippy::cast_possible_truncation)]
fn format_version(value: f64) -> String {
    if value.is_finite() && value == value.trunc() {
        format!("{}", value as i64)
    } else {
        let mut formatted = format!("{value:.2}");
        while formatted.ends_with('0') {
            formatted.pop();
        }
        if formatted.ends_with('.') {
            formatted.pop();
        }
        formatted
    }
}
