use std::fmt;

use serde::{Deserialize, Serialize};

use crate::foundation::error::{RaceError, RaceResult};

/// Opaque sRGB color, written and parsed as `#RRGGBB`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Rgb8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb8 {
    pub const BLACK: Self = Self::new(0, 0, 0);
    pub const WHITE: Self = Self::new(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn parse_hex(s: &str) -> RaceResult<Self> {
        let s = s.trim();
        let digits = s.strip_prefix('#').unwrap_or(s);

        if digits.len() != 6 || !digits.is_ascii() {
            return Err(RaceError::validation(format!(
                "hex color must be #RRGGBB (got \"{s}\")"
            )));
        }

        let byte = |pair: &str| {
            u8::from_str_radix(pair, 16)
                .map_err(|_| RaceError::validation(format!("invalid hex byte \"{pair}\"")))
        };

        Ok(Self {
            r: byte(&digits[0..2])?,
            g: byte(&digits[2..4])?,
            b: byte(&digits[4..6])?,
        })
    }

    pub fn to_hex(self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Rgb8 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

impl Serialize for Rgb8 {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Rgb8 {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::parse_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// Output raster size in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameSize {
    pub width: u32,
    pub height: u32,
}

impl FrameSize {
    pub fn validate(self) -> RaceResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(RaceError::validation("frame width/height must be non-zero"));
        }
        // resvg pixmaps above this are not worth allocating for a chart.
        const MAX_DIM: u32 = 16_384;
        if self.width > MAX_DIM || self.height > MAX_DIM {
            return Err(RaceError::validation(format!(
                "frame size too large: {}x{} (max {MAX_DIM}x{MAX_DIM})",
                self.width, self.height
            )));
        }
        Ok(())
    }
}
