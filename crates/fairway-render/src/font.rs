//! Stencil typeface loading, measurement and glyph outlines.

use ab_glyph::{Font, FontArc, GlyphId, OutlineCurve, PxScale, ScaleFont};
use fairway_core::canvas::Canvas;
use fairway_core::shapes::{ApproximateMetrics, TextAlign, TextMeasure, TextMetrics};
use kurbo::{BezPath, Point};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Font loading errors.
#[derive(Debug, Error)]
pub enum FontError {
    #[error("Failed to read font {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid font data: {0}")]
    Invalid(String),
}

/// The stencil typeface used for text paths.
#[derive(Clone)]
pub struct StencilFont {
    font: FontArc,
}

impl fmt::Debug for StencilFont {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StencilFont")
            .field("glyphs", &self.font.glyph_count())
            .finish()
    }
}

impl StencilFont {
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, FontError> {
        let font = FontArc::try_from_vec(bytes).map_err(|e| FontError::Invalid(e.to_string()))?;
        Ok(Self { font })
    }

    /// Read a TrueType/OpenType file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, FontError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| FontError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_bytes(bytes)
    }

    /// Scale where one em equals `font_size` pixels.
    ///
    /// `PxScale` is measured in line height (ascent - descent), not em.
    fn scale(&self, font_size: f64) -> PxScale {
        let size = font_size as f32;
        match self.font.units_per_em() {
            Some(units_per_em) if units_per_em > 0.0 => {
                PxScale::from(size * self.font.height_unscaled() / units_per_em)
            }
            _ => PxScale::from(size),
        }
    }

    /// Glyphs of `content` with their pen offsets, plus the total advance.
    fn layout(&self, content: &str, scale: PxScale) -> (Vec<(GlyphId, f32)>, f32) {
        let scaled = self.font.as_scaled(scale);
        let mut glyphs = Vec::with_capacity(content.len());
        let mut pen_x = 0.0;
        let mut prev: Option<GlyphId> = None;

        for ch in content.chars() {
            let id = self.font.glyph_id(ch);
            if let Some(prev) = prev {
                pen_x += scaled.kern(prev, id);
            }
            glyphs.push((id, pen_x));
            pen_x += scaled.h_advance(id);
            prev = Some(id);
        }
        (glyphs, pen_x)
    }

    /// Filled outline of a line of text with its baseline at `anchor`.
    pub fn text_path(
        &self,
        content: &str,
        anchor: Point,
        font_size: f64,
        align: TextAlign,
    ) -> BezPath {
        let scale = self.scale(font_size);
        let scaled = self.font.as_scaled(scale);
        let (h, v) = (f64::from(scaled.h_scale_factor()), f64::from(scaled.v_scale_factor()));
        let (glyphs, advance) = self.layout(content, scale);
        let metrics = TextMetrics::from_advance(f64::from(advance), 0.0, 0.0, align);
        let origin_x = anchor.x - metrics.left;

        let mut path = BezPath::new();
        for (id, pen_x) in glyphs {
            let Some(outline) = self.font.outline(id) else {
                continue;
            };
            let x0 = origin_x + f64::from(pen_x);
            // Font units are y-up.
            let map = |p: ab_glyph::Point| {
                Point::new(x0 + f64::from(p.x) * h, anchor.y - f64::from(p.y) * v)
            };

            let mut current: Option<Point> = None;
            for curve in &outline.curves {
                let (start, end) = match curve {
                    OutlineCurve::Line(a, b) => (map(*a), map(*b)),
                    OutlineCurve::Quad(a, _, b) => (map(*a), map(*b)),
                    OutlineCurve::Cubic(a, _, _, b) => (map(*a), map(*b)),
                };
                if current != Some(start) {
                    if current.is_some() {
                        path.close_path();
                    }
                    path.move_to(start);
                }
                match curve {
                    OutlineCurve::Line(_, _) => path.line_to(end),
                    OutlineCurve::Quad(_, c, _) => path.quad_to(map(*c), end),
                    OutlineCurve::Cubic(_, c1, c2, _) => path.curve_to(map(*c1), map(*c2), end),
                }
                current = Some(end);
            }
            if current.is_some() {
                path.close_path();
            }
        }
        path
    }
}

impl TextMeasure for StencilFont {
    fn measure(&self, content: &str, font_size: f64, align: TextAlign) -> TextMetrics {
        let scale = self.scale(font_size);
        let scaled = self.font.as_scaled(scale);
        let (_, advance) = self.layout(content, scale);
        TextMetrics::from_advance(
            f64::from(advance),
            f64::from(scaled.ascent()),
            -f64::from(scaled.descent()),
            align,
        )
    }
}

/// Loading state of the stencil typeface.
///
/// Text placed while the font is pending uses approximate metrics; once the
/// font resolves every text box on the canvas is recomputed.
#[derive(Debug, Clone, Default)]
pub enum FontLoader {
    #[default]
    Pending,
    Ready(StencilFont),
    Failed(String),
}

impl FontLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the outcome of a font load and refresh text bounds on success.
    pub fn resolve(&mut self, result: Result<StencilFont, FontError>, canvas: &mut Canvas) {
        match result {
            Ok(font) => {
                canvas.refresh_text_bounds(&font);
                *self = FontLoader::Ready(font);
            }
            Err(e) => {
                log::warn!("stencil font unavailable, text keeps approximate metrics: {e}");
                *self = FontLoader::Failed(e.to_string());
            }
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, FontLoader::Ready(_))
    }

    pub fn font(&self) -> Option<&StencilFont> {
        match self {
            FontLoader::Ready(font) => Some(font),
            FontLoader::Pending | FontLoader::Failed(_) => None,
        }
    }

    /// Best available text measurer.
    pub fn measure(&self) -> &dyn TextMeasure {
        match self {
            FontLoader::Ready(font) => font,
            FontLoader::Pending | FontLoader::Failed(_) => &ApproximateMetrics,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fairway_core::shapes::{Path, Sample, Text};
    use fairway_core::tools::{EditorMode, TemplateMode};
    use kurbo::Shape;

    static DEJAVU_SANS: &[u8] = include_bytes!("../assets/DejaVuSans.ttf");

    fn font() -> StencilFont {
        StencilFont::from_bytes(DEJAVU_SANS.to_vec()).unwrap()
    }

    fn texts(canvas: &Canvas) -> Vec<&Text> {
        canvas.store.paths().iter().filter_map(Path::as_text).collect()
    }

    #[test]
    fn test_em_equals_font_size() {
        let font = font();
        let units_per_em = font.font.units_per_em().unwrap();
        let metrics = font.measure("M", 40.0, TextAlign::Start);

        let expected_ascent = 40.0 * f64::from(font.font.ascent_unscaled() / units_per_em);
        assert!((metrics.ascent - expected_ascent).abs() < 1e-3);
        assert!(metrics.ascent < 40.0);
        assert!(metrics.ascent + metrics.descent < 40.0 * 1.2);
    }

    #[test]
    fn test_measure_scales_linearly() {
        let font = font();
        let small = font.measure("PAR", 20.0, TextAlign::Start);
        let large = font.measure("PAR", 40.0, TextAlign::Start);

        assert!((large.advance - 2.0 * small.advance).abs() < 1e-3);
        assert!((large.ascent - 2.0 * small.ascent).abs() < 1e-3);
    }

    #[test]
    fn test_stacked_lines_do_not_overlap() {
        let font = font();
        let mut canvas = Canvas::default();
        canvas.set_template(TemplateMode::Text);
        canvas.set_mode(EditorMode::Type);
        let mut answers = vec!["CD".to_string(), "AB".to_string()];
        let mut prompt = move |_: &str| answers.pop();

        for _ in 0..2 {
            canvas.pointer_down(Sample::new(0.0, 0.0, 1.0), &font, &mut prompt);
            canvas.pointer_up();
        }

        let texts = texts(&canvas);
        assert_eq!(texts.len(), 2);
        let (first, second) = (texts[0].bounding_box(), texts[1].bounding_box());
        assert!(second.y0 >= first.y1, "{first:?} overlaps {second:?}");
    }

    #[test]
    fn test_resolve_relayouts_existing_text() {
        let font = font();
        let mut canvas = Canvas::default();
        let text =
            Text::new(Point::new(50.0, 100.0), "WIDE".to_string(), 40.0, &ApproximateMetrics);
        let approximate = text.bounding_box();
        canvas.store.append(text.into());
        canvas.take_redraw();

        let mut loader = FontLoader::new();
        loader.resolve(Ok(font.clone()), &mut canvas);

        assert!(loader.is_ready());
        assert!(canvas.needs_redraw());
        let resolved = texts(&canvas)[0].bounding_box();
        assert_ne!(resolved, approximate);
        let metrics = font.measure("WIDE", 40.0, TextAlign::Start);
        assert!((resolved.width() - metrics.advance).abs() < 1e-9);
        assert!((resolved.y0 - (100.0 - metrics.ascent)).abs() < 1e-9);
    }

    #[test]
    fn test_text_path_fills_measured_box() {
        let font = font();
        let anchor = Point::new(250.0, 200.0);
        for align in [TextAlign::Start, TextAlign::Center] {
            let text = Text::new(anchor, "FORE".to_string(), 40.0, &font).with_align(align, &font);
            let outline = font.text_path("FORE", anchor, 40.0, align);

            let ink = outline.bounding_box();
            let measured = text.bounding_box().inflate(1.0, 1.0);
            assert!(ink.area() > 0.0);
            assert!(measured.contains_rect(ink), "{ink:?} outside {measured:?}");
        }
    }

    #[test]
    fn test_invalid_bytes_are_rejected() {
        let result = StencilFont::from_bytes(b"definitely not a font".to_vec());
        assert!(matches!(result, Err(FontError::Invalid(_))));
    }

    #[test]
    fn test_missing_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gunplay.otf");
        match StencilFont::load(&path) {
            Err(FontError::Io { path: reported, .. }) => assert_eq!(reported, path),
            other => panic!("expected io error, got {other:?}"),
        }
    }

    #[test]
    fn test_pending_loader_measures_approximately() {
        let loader = FontLoader::new();
        assert!(!loader.is_ready());
        assert!(loader.font().is_none());

        let expected = ApproximateMetrics.measure("PAR", 40.0, TextAlign::Start);
        assert_eq!(loader.measure().measure("PAR", 40.0, TextAlign::Start), expected);
    }

    #[test]
    fn test_failed_load_keeps_canvas() {
        let mut canvas = Canvas::default();
        canvas.take_redraw();
        let mut loader = FontLoader::new();

        loader.resolve(StencilFont::from_bytes(Vec::new()), &mut canvas);

        assert!(matches!(loader, FontLoader::Failed(_)));
        assert!(!canvas.needs_redraw());
    }
}
