//! RGB color value object.
//!
//! A [`Color`] is three 8-bit channels.  Its canonical text form is the
//! uppercase `#RRGGBB` hex string; equality, hashing and ordering all agree
//! with that form (ordering fixed-width uppercase hex strings is the same as
//! ordering `(r, g, b)` lexicographically).
//!
//! # Example
//!
//! ```rust
//! use chroma_types::Color;
//!
//! let red: Color = "#ff0000".parse().unwrap();
//! assert_eq!(red.to_string(), "#FF0000");
//! assert_eq!(red.distance(&Color::new(254, 0, 0)), 1);
//! ```

use std::fmt;
use std::str::FromStr;

use schemars::JsonSchema;
use schemars::r#gen::SchemaGenerator;
use schemars::schema::Schema;
use serde::{Deserialize, Serialize};

use crate::ChromaError;

/// Largest possible [`Color::distance`] (`3 × 255`).
pub const MAX_DISTANCE: u16 = 3 * 255;

/// An immutable RGB triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Color = Color::new(0, 0, 0);
    pub const WHITE: Color = Color::new(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// L1 (Manhattan) distance over the three channels, in `[0, 765]`.
    pub fn distance(&self, other: &Color) -> u16 {
        u16::from(self.r.abs_diff(other.r))
            + u16::from(self.g.abs_diff(other.g))
            + u16::from(self.b.abs_diff(other.b))
    }

    /// Canonical `#RRGGBB` encoding.
    pub fn to_hex(&self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }

    /// Decode exactly six hex digits, optionally prefixed by `#`.
    ///
    /// # Errors
    ///
    /// [`ChromaError::MalformedColor`] for any other input, including signs,
    /// surrounding whitespace and short or long strings.
    pub fn from_hex(text: &str) -> Result<Self, ChromaError> {
        let digits = text.strip_prefix('#').unwrap_or(text);
        if digits.len() != 6 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(ChromaError::MalformedColor(text.to_string()));
        }
        let channel = |i: usize| {
            u8::from_str_radix(&digits[i..i + 2], 16)
                .map_err(|_| ChromaError::MalformedColor(text.to_string()))
        };
        Ok(Self::new(channel(0)?, channel(2)?, channel(4)?))
    }
}

/// Free-function form of [`Color::distance`].
pub fn distance(a: &Color, b: &Color) -> u16 {
    a.distance(b)
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

impl FromStr for Color {
    type Err = ChromaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_hex()
    }
}

impl TryFrom<String> for Color {
    type Error = ChromaError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_hex(&value)
    }
}

// Serialized as the hex string, so the schema is the string schema.
impl JsonSchema for Color {
    fn schema_name() -> String {
        "Color".to_string()
    }

    fn json_schema(generator: &mut SchemaGenerator) -> Schema {
        String::json_schema(generator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── distance ─────────────────────────────────────────────────────────────

    #[test]
    fn distance_sums_channel_differences() {
        let a = Color::new(10, 200, 30);
        let b = Color::new(20, 180, 30);
        assert_eq!(a.distance(&b), 30);
    }

    #[test]
    fn distance_extremes() {
        assert_eq!(Color::BLACK.distance(&Color::WHITE), MAX_DISTANCE);
        assert_eq!(Color::WHITE.distance(&Color::WHITE), 0);
    }

    // ── encode / decode ──────────────────────────────────────────────────────

    #[test]
    fn encode_is_uppercase_with_hash() {
        assert_eq!(Color::new(0xab, 0x0c, 0xff).to_string(), "#AB0CFF");
    }

    #[test]
    fn decode_accepts_optional_prefix_and_lowercase() {
        assert_eq!(Color::from_hex("#ab0cff").unwrap(), Color::new(0xab, 0x0c, 0xff));
        assert_eq!(Color::from_hex("AB0CFF").unwrap(), Color::new(0xab, 0x0c, 0xff));
    }

    #[test]
    fn decode_rejects_malformed_input() {
        for bad in ["", "#", "#12345", "#1234567", "12345G", "+12345", "#+1+2+3", " 123456", "##123456"] {
            let err = Color::from_hex(bad).unwrap_err();
            assert!(matches!(err, ChromaError::MalformedColor(_)), "accepted {bad:?}");
        }
    }

    // ── ordering / serde ─────────────────────────────────────────────────────

    #[test]
    fn ordering_matches_encoded_form() {
        let mut colors = vec![Color::new(0, 0xA0, 0), Color::new(0, 0x9F, 0xFF), Color::new(1, 0, 0)];
        let mut encoded: Vec<String> = colors.iter().map(Color::to_hex).collect();
        colors.sort();
        encoded.sort();
        let sorted: Vec<String> = colors.iter().map(Color::to_hex).collect();
        assert_eq!(sorted, encoded);
    }

    #[test]
    fn serializes_as_hex_string() {
        let json = serde_json::to_string(&Color::new(255, 0, 16)).unwrap();
        assert_eq!(json, "\"#FF0010\"");
        let back: Color = serde_json::from_str("\"#ff0010\"").unwrap();
        assert_eq!(back, Color::new(255, 0, 16));
        assert!(serde_json::from_str::<Color>("\"red\"").is_err());
    }
}
