use serde::{Deserialize, Serialize};

use crate::app::error::AppError;

/// 24-bit RGB text color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#rrggbb` (the leading `#` is optional).
    pub fn from_hex(s: &str) -> Result<Self, AppError> {
        let hex = s.trim().trim_start_matches('#');
        if hex.len() != 6 || !hex.is_ascii() {
            return Err(AppError::InvalidColor(s.to_string()));
        }
        let channel = |i: usize| {
            u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| AppError::InvalidColor(s.to_string()))
        };
        Ok(Self::rgb(channel(0)?, channel(2)?, channel(4)?))
    }

    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::BLACK
    }
}

/// Largest point size a document can carry; RTF stores half-points in an i16.
pub const MAX_FONT_SIZE: u32 = 1638;

/// Clamp a point size into `1..=MAX_FONT_SIZE`.
pub fn clamp_font_size(size: u32) -> u32 {
    size.clamp(1, MAX_FONT_SIZE)
}

/// Fully resolved character attributes of one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharAttrs {
    pub font_family: String,
    /// Point size, within `1..=MAX_FONT_SIZE`.
    pub font_size: u32,
    pub color: Color,
    #[serde(default)]
    pub bold: bool,
    #[serde(default)]
    pub italic: bool,
    #[serde(default)]
    pub underline: bool,
}

impl CharAttrs {
    pub fn new(font_family: impl Into<String>, font_size: u32, color: Color) -> Self {
        Self {
            font_family: font_family.into(),
            font_size: clamp_font_size(font_size),
            color,
            bold: false,
            italic: false,
            underline: false,
        }
    }
}

impl Default for CharAttrs {
    fn default() -> Self {
        Self::new("Arial", 12, Color::BLACK)
    }
}

/// Partial attribute update; `None` fields leave the run untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CharAttrsPatch {
    pub font_family: Option<String>,
    pub font_size: Option<u32>,
    pub color: Option<Color>,
    pub bold: Option<bool>,
    pub italic: Option<bool>,
    pub underline: Option<bool>,
}

impl CharAttrsPatch {
    pub fn color(color: Color) -> Self {
        Self {
            color: Some(color),
            ..Default::default()
        }
    }

    pub fn font(font: &FontSpec) -> Self {
        Self {
            font_family: Some(font.family.clone()),
            font_size: Some(font.size),
            bold: Some(font.bold),
            italic: Some(font.italic),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn apply(&self, base: &CharAttrs) -> CharAttrs {
        CharAttrs {
            font_family: self
                .font_family
                .clone()
                .unwrap_or_else(|| base.font_family.clone()),
            font_size: self.font_size.map(clamp_font_size).unwrap_or(base.font_size),
            color: self.color.unwrap_or(base.color),
            bold: self.bold.unwrap_or(base.bold),
            italic: self.italic.unwrap_or(base.italic),
            underline: self.underline.unwrap_or(base.underline),
        }
    }
}

/// Paragraph spacing in points.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ParagraphAttrs {
    pub space_above: f32,
    pub space_below: f32,
}

impl ParagraphAttrs {
    pub fn new(space_above: f32, space_below: f32) -> Self {
        Self {
            space_above: space_above.max(0.0),
            space_below: space_below.max(0.0),
        }
    }
}

/// The result of a font choice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FontSpec {
    pub family: String,
    pub size: u32,
    #[serde(default)]
    pub bold: bool,
    #[serde(default)]
    pub italic: bool,
}

impl FontSpec {
    pub fn plain(family: impl Into<String>, size: u32) -> Self {
        Self {
            family: family.into(),
            size,
            bold: false,
            italic: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_hex_round_trip() {
        let c = Color::from_hex("#1a2B3c").unwrap();
        assert_eq!(c, Color::rgb(0x1a, 0x2b, 0x3c));
        assert_eq!(c.to_hex(), "#1a2b3c");
        assert_eq!(Color::from_hex("ff0000").unwrap(), Color::rgb(255, 0, 0));
    }

    #[test]
    fn test_color_hex_invalid() {
        assert!(Color::from_hex("#12345").is_err());
        assert!(Color::from_hex("#gg0000").is_err());
        assert!(Color::from_hex("").is_err());
    }

    #[test]
    fn test_patch_only_touches_set_fields() {
        let base = CharAttrs::default();
        let patched = CharAttrsPatch::color(Color::rgb(255, 0, 0)).apply(&base);
        assert_eq!(patched.color, Color::rgb(255, 0, 0));
        assert_eq!(patched.font_family, "Arial");
        assert_eq!(patched.font_size, 12);
    }

    #[test]
    fn test_font_patch() {
        let font = FontSpec {
            family: "Courier".to_string(),
            size: 18,
            bold: true,
            italic: false,
        };
        let patched = CharAttrsPatch::font(&font).apply(&CharAttrs::default());
        assert_eq!(patched.font_family, "Courier");
        assert_eq!(patched.font_size, 18);
        assert!(patched.bold);
        assert_eq!(patched.color, Color::BLACK);
    }

    #[test]
    fn test_zero_font_size_clamped() {
        let patch = CharAttrsPatch {
            font_size: Some(0),
            ..Default::default()
        };
        assert_eq!(patch.apply(&CharAttrs::default()).font_size, 1);
    }

    #[test]
    fn test_paragraph_attrs_reject_negative() {
        let p = ParagraphAttrs::new(-3.0, 4.0);
        assert_eq!(p.space_above, 0.0);
        assert_eq!(p.space_below, 4.0);
    }

    #[test]
    fn test_font_size_clamped() {
        assert_eq!(CharAttrs::new("Arial", 0, Color::BLACK).font_size, 1);
        assert_eq!(CharAttrs::new("Arial", u32::MAX, Color::BLACK).font_size, MAX_FONT_SIZE);
        let patch = CharAttrsPatch::font(&FontSpec::plain("Arial", 5000));
        assert_eq!(patch.apply(&CharAttrs::default()).font_size, MAX_FONT_SIZE);
    }
}
