use serde::{Deserialize, Serialize};
use thiserror::Error;

/// An opaque RGB color. There is no alpha channel; lamps are driven at full
/// opacity and brightness is tracked separately.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

/// Returned when a hex color string cannot be parsed.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("invalid hex color {input:?}: {reason}")]
pub struct ParseColorError {
    pub input: String,
    pub reason: hex::FromHexError,
}

impl Color {
    pub const RED: Color = Color::from_rgb(255, 0, 0);
    pub const BLUE: Color = Color::from_rgb(0, 0, 255);
    /// Zero sentinel: in persisted records this means "no color specified".
    pub const BLACK: Color = Color::from_rgb(0, 0, 0);

    pub const fn from_rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn is_unset(&self) -> bool {
        *self == Color::BLACK
    }

    /// Parses `RRGGBB` or `#RRGGBB`. Case of the hex digits does not matter.
    pub fn from_hex(input: &str) -> Result<Self, ParseColorError> {
        let digits = input.strip_prefix('#').unwrap_or(input);
        let mut rgb = [0u8; 3];
        // decode_to_slice rejects anything that isn't exactly 6 hex digits
        hex::decode_to_slice(digits, &mut rgb).map_err(|reason| ParseColorError {
            input: input.to_string(),
            reason,
        })?;
        Ok(Self::from_rgb(rgb[0], rgb[1], rgb[2]))
    }

    /// Canonical `#RRGGBB` form, uppercase.
    pub fn to_hex(&self) -> String {
        format!("#{}", hex::encode_upper([self.r, self.g, self.b]))
    }
}

impl std::fmt::Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl std::str::FromStr for Color {
    type Err = ParseColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Color::from_hex(s)
    }
}

impl From<(u8, u8, u8)> for Color {
    fn from((r, g, b): (u8, u8, u8)) -> Self {
        Color::from_rgb(r, g, b)
    }
}
