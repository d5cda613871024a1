//! Hex color parsing and opacity helpers.
//!
//! Only the 7-character `#RRGGBB` form is accepted. Short `#RGB` strings,
//! named colors and missing `#` prefixes are rejected with
//! [`CompositorError::InvalidColor`].

use crate::error::CompositorError;
use image::Rgba;

/// An RGB color parsed from a hex string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub const fn white() -> Self {
        Self::new(255, 255, 255)
    }

    pub const fn black() -> Self {
        Self::new(0, 0, 0)
    }

    /// Format as uppercase `#RRGGBB`.
    pub fn to_hex(self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }

    /// Attach an alpha channel scaled from `opacity`.
    pub fn with_opacity(self, opacity: f32) -> Rgba<u8> {
        Rgba([self.r, self.g, self.b, opacity_to_alpha(opacity)])
    }

    /// Shift every channel by `delta`, wrapping modulo 255.
    ///
    /// The modulus is 255 rather than 256, so a channel at 225 becomes 0.
    pub fn hue_shift(self, delta: u8) -> Self {
        let shift = |c: u8| ((c as u16 + delta as u16) % 255) as u8;
        Self::new(shift(self.r), shift(self.g), shift(self.b))
    }
}

/// Parse a `#RRGGBB` hex string into an [`Rgb`].
pub fn parse_hex(hex: &str) -> Result<Rgb, CompositorError> {
    let invalid = || CompositorError::InvalidColor(hex.to_string());

    if hex.len() != 7 {
        return Err(invalid());
    }
    let digits = hex.strip_prefix('#').ok_or_else(invalid)?;
    if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(invalid());
    }

    let channel = |range: std::ops::Range<usize>| {
        u8::from_str_radix(&digits[range], 16).map_err(|_| invalid())
    };

    Ok(Rgb::new(channel(0..2)?, channel(2..4)?, channel(4..6)?))
}

/// Whether `hex` is a well-formed `#RRGGBB` string.
pub fn is_valid_hex(hex: &str) -> bool {
    parse_hex(hex).is_ok()
}

/// Convert an opacity fraction to an 8-bit alpha value: `round(255 × opacity)`.
pub fn opacity_to_alpha(opacity: f32) -> u8 {
    (255.0 * opacity.clamp(0.0, 1.0)).round() as u8
}
