//! Path records drawn or typed on the canvas.

mod stroke;
mod text;

pub use stroke::Stroke;
pub use text::{
    compute_text_bounding_box, ApproximateMetrics, Text, TextAlign, TextMeasure, TextMetrics,
};

use kurbo::{Point, Rect};
use peniko::Color;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for paths.
pub type PathId = Uuid;

/// One pointer sample in canvas-local coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub x: f64,
    pub y: f64,
    /// Normalized pen pressure in `0.0..=1.0`.
    pub pressure: f64,
}

impl Sample {
    pub fn new(x: f64, y: f64, pressure: f64) -> Self {
        Self { x, y, pressure }
    }

    /// Sample at full pressure.
    pub fn at(point: Point) -> Self {
        Self::new(point.x, point.y, 1.0)
    }

    pub fn point(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// Serializable color representation (RGBA8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializableColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl SerializableColor {
    pub fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn black() -> Self {
        Self::new(0, 0, 0, 255)
    }

    pub fn white() -> Self {
        Self::new(255, 255, 255, 255)
    }

    pub fn blue() -> Self {
        Self::new(0, 0, 255, 255)
    }

    /// Parse a `#rrggbb` or `#rrggbbaa` hex string.
    pub fn from_hex(s: &str) -> Option<Self> {
        let hex = s.trim().strip_prefix('#')?;
        let channel = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
        match hex.len() {
            6 => Some(Self::new(channel(0)?, channel(2)?, channel(4)?, 255)),
            8 => Some(Self::new(channel(0)?, channel(2)?, channel(4)?, channel(6)?)),
            _ => None,
        }
    }

    /// Format as `#rrggbb`, appending alpha only when not opaque.
    pub fn to_hex(&self) -> String {
        if self.a == 255 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }
}

impl Default for SerializableColor {
    fn default() -> Self {
        Self::black()
    }
}

impl From<Color> for SerializableColor {
    fn from(color: Color) -> Self {
        let rgba = color.to_rgba8();
        Self {
            r: rgba.r,
            g: rgba.g,
            b: rgba.b,
            a: rgba.a,
        }
    }
}

impl From<SerializableColor> for Color {
    fn from(color: SerializableColor) -> Self {
        Color::from_rgba8(color.r, color.g, color.b, color.a)
    }
}

/// Discriminant of a [`Path`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PathKind {
    Stroke,
    Text,
}

/// Common behavior shared by all path records.
pub trait PathTrait {
    /// Get the unique identifier.
    fn id(&self) -> PathId;

    /// Axis-aligned bounds in canvas coordinates.
    fn bounds(&self) -> Rect;
}

/// A drawn stroke or a placed text item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Path {
    Stroke(Stroke),
    Text(Text),
}

impl Path {
    pub fn kind(&self) -> PathKind {
        match self {
            Path::Stroke(_) => PathKind::Stroke,
            Path::Text(_) => PathKind::Text,
        }
    }

    pub fn id(&self) -> PathId {
        self.as_trait().id()
    }

    pub fn bounds(&self) -> Rect {
        self.as_trait().bounds()
    }

    pub fn as_text(&self) -> Option<&Text> {
        match self {
            Path::Text(text) => Some(text),
            Path::Stroke(_) => None,
        }
    }

    pub fn as_text_mut(&mut self) -> Option<&mut Text> {
        match self {
            Path::Text(text) => Some(text),
            Path::Stroke(_) => None,
        }
    }

    pub fn as_stroke(&self) -> Option<&Stroke> {
        match self {
            Path::Stroke(stroke) => Some(stroke),
            Path::Text(_) => None,
        }
    }

    pub fn as_stroke_mut(&mut self) -> Option<&mut Stroke> {
        match self {
            Path::Stroke(stroke) => Some(stroke),
            Path::Text(_) => None,
        }
    }

    /// Whether this is a text path with its selection flag set.
    pub fn is_selected(&self) -> bool {
        self.as_text().is_some_and(|text| text.selected)
    }

    fn as_trait(&self) -> &dyn PathTrait {
        match self {
            Path::Stroke(s) => s,
            Path::Text(t) => t,
        }
    }
}

impl From<Stroke> for Path {
    fn from(stroke: Stroke) -> Self {
        Path::Stroke(stroke)
    }
}

impl From<Text> for Path {
    fn from(text: Text) -> Self {
        Path::Text(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_hex_round_trip() {
        let color = SerializableColor::from_hex("#1a2B3c").unwrap();
        assert_eq!(color, SerializableColor::new(0x1a, 0x2b, 0x3c, 255));
        assert_eq!(color.to_hex(), "#1a2b3c");
    }

    #[test]
    fn test_color_hex_rejects_garbage() {
        assert!(SerializableColor::from_hex("000000").is_none());
        assert!(SerializableColor::from_hex("#00000").is_none());
        assert!(SerializableColor::from_hex("#zzzzzz").is_none());
    }

    #[test]
    fn test_path_kind_dispatch() {
        let stroke: Path =
            Stroke::new(Sample::new(1.0, 2.0, 1.0), SerializableColor::black(), 5.0).into();
        let text: Path = Text::new(
            Point::new(10.0, 10.0),
            "AB".to_string(),
            30.0,
            &ApproximateMetrics,
        )
        .into();

        assert_eq!(stroke.kind(), PathKind::Stroke);
        assert_eq!(text.kind(), PathKind::Text);
        assert!(stroke.as_text().is_none());
        assert!(text.as_stroke().is_none());
        assert!(!text.is_selected());
    }

    #[test]
    fn test_path_serde_tagged() {
        let path: Path =
            Stroke::new(Sample::new(0.0, 0.0, 0.5), SerializableColor::black(), 3.0).into();
        let json = serde_json::to_string(&path).unwrap();
        assert!(json.contains("\"type\":\"stroke\""));
        let back: Path = serde_json::from_str(&json).unwrap();
        assert_eq!(back, path);
    }
}
