//! Placed text annotation.

use super::{PathId, PathTrait, SerializableColor};
use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Horizontal alignment of text relative to its anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    /// Anchor is the left end of the baseline.
    #[default]
    Start,
    /// Anchor is the middle of the baseline.
    Center,
}

/// Measured extents of a line of text, relative to its anchor.
///
/// `left` and `right` are distances from the anchor to the ink extents with
/// alignment already applied; `ascent` and `descent` are distances above and
/// below the baseline. All values are non-negative for ordinary text.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TextMetrics {
    /// Horizontal advance of the whole string.
    pub advance: f64,
    pub ascent: f64,
    pub descent: f64,
    pub left: f64,
    pub right: f64,
}

impl TextMetrics {
    /// Build metrics from an advance width, placing the extents per `align`.
    pub fn from_advance(advance: f64, ascent: f64, descent: f64, align: TextAlign) -> Self {
        let (left, right) = match align {
            TextAlign::Start => (0.0, advance),
            TextAlign::Center => (advance / 2.0, advance / 2.0),
        };
        Self {
            advance,
            ascent,
            descent,
            left,
            right,
        }
    }
}

/// Source of text metrics (a loaded font, or an approximation).
pub trait TextMeasure {
    fn measure(&self, content: &str, font_size: f64, align: TextAlign) -> TextMetrics;
}

/// Font-free metrics used until the stencil typeface has loaded.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApproximateMetrics;

impl ApproximateMetrics {
    /// Average glyph advance as a fraction of the font size.
    pub const CHAR_WIDTH_FACTOR: f64 = 0.55;
    /// Baseline sits this far below the top of the em box.
    pub const ASCENT_FACTOR: f64 = 0.8;
    pub const DESCENT_FACTOR: f64 = 0.2;
}

impl TextMeasure for ApproximateMetrics {
    fn measure(&self, content: &str, font_size: f64, align: TextAlign) -> TextMetrics {
        let advance = content.chars().count() as f64 * font_size * Self::CHAR_WIDTH_FACTOR;
        TextMetrics::from_advance(
            advance,
            font_size * Self::ASCENT_FACTOR,
            font_size * Self::DESCENT_FACTOR,
            align,
        )
    }
}

/// Rectangle enclosing text drawn at `anchor` with the given metrics.
pub fn compute_text_bounding_box(anchor: Point, metrics: &TextMetrics) -> Rect {
    Rect::new(
        anchor.x - metrics.left,
        anchor.y - metrics.ascent,
        anchor.x + metrics.right,
        anchor.y + metrics.descent,
    )
}

/// A text path anchored at a single point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Text {
    pub(crate) id: PathId,
    /// Baseline anchor.
    anchor: Point,
    /// The literal string.
    content: String,
    /// Font size in pixels.
    font_size: f64,
    pub color: SerializableColor,
    align: TextAlign,
    /// Cached box, kept in sync with anchor, content and size.
    bounding_box: Rect,
    /// Select-mode flag.
    pub selected: bool,
}

impl Text {
    /// Create a start-aligned text path and lay it out with `measure`.
    pub fn new(anchor: Point, content: String, font_size: f64, measure: &dyn TextMeasure) -> Self {
        let mut text = Self {
            id: Uuid::new_v4(),
            anchor,
            content,
            font_size,
            color: SerializableColor::black(),
            align: TextAlign::Start,
            bounding_box: Rect::ZERO,
            selected: false,
        };
        text.relayout(measure);
        text
    }

    /// Builder: change alignment and recompute the box.
    pub fn with_align(mut self, align: TextAlign, measure: &dyn TextMeasure) -> Self {
        self.align = align;
        self.relayout(measure);
        self
    }

    /// Builder: set the fill color.
    pub fn with_color(mut self, color: SerializableColor) -> Self {
        self.color = color;
        self
    }

    pub fn anchor(&self) -> Point {
        self.anchor
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn font_size(&self) -> f64 {
        self.font_size
    }

    pub fn align(&self) -> TextAlign {
        self.align
    }

    pub fn bounding_box(&self) -> Rect {
        self.bounding_box
    }

    /// Move the anchor and recompute the box.
    pub fn set_anchor(&mut self, anchor: Point, measure: &dyn TextMeasure) {
        self.anchor = anchor;
        self.relayout(measure);
    }

    /// Replace the content and recompute the box.
    pub fn set_content(&mut self, content: String, measure: &dyn TextMeasure) {
        self.content = content;
        self.relayout(measure);
    }

    /// Change the font size and recompute the box.
    pub fn set_font_size(&mut self, font_size: f64, measure: &dyn TextMeasure) {
        self.font_size = font_size;
        self.relayout(measure);
    }

    /// Recompute the bounding box, e.g. once the real font becomes available.
    pub fn relayout(&mut self, measure: &dyn TextMeasure) {
        let metrics = measure.measure(&self.content, self.font_size, self.align);
        self.bounding_box = compute_text_bounding_box(self.anchor, &metrics);
    }
}

impl PathTrait for Text {
    fn id(&self) -> PathId {
        self.id
    }

    fn bounds(&self) -> Rect {
        self.bounding_box
    }
}
