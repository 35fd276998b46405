//! Render pass and surface abstraction.

use fairway_core::canvas::Canvas;
use fairway_core::config::EditorConfig;
use fairway_core::shapes::{Path, TextAlign};
use fairway_core::tools::TemplateMode;
use image::RgbaImage;
use kurbo::{BezPath, Point, Rect, Size};
use peniko::Color;
use thiserror::Error;

/// Renderer errors.
#[derive(Debug, Error)]
pub enum RendererError {
    #[error("Surface creation failed: {0}")]
    Surface(String),
    #[error("Image decoding failed: {0}")]
    Decode(String),
    #[error("Image encoding failed: {0}")]
    Encode(String),
}

/// Result type for renderer operations.
pub type RenderResult<T> = Result<T, RendererError>;

/// A 2D drawing target.
///
/// Implementations can rasterise on the CPU, record commands, or forward to
/// a host canvas.
pub trait Surface {
    /// Size of the drawable area in canvas units.
    fn size(&self) -> Size;

    /// Reset every pixel to fully transparent.
    fn clear(&mut self);

    /// Draw `image` scaled into `dest`.
    fn draw_image(&mut self, image: &RgbaImage, dest: Rect);

    /// Fill a closed path (nonzero winding).
    fn fill_path(&mut self, path: &BezPath, color: Color);

    /// Draw a line of text with its baseline at `anchor`.
    fn fill_text(
        &mut self,
        content: &str,
        anchor: Point,
        font_size: f64,
        align: TextAlign,
        color: Color,
    );

    /// Outline a rectangle.
    fn stroke_rect(&mut self, rect: Rect, color: Color, width: f64);
}

/// Context for a single render pass.
pub struct RenderContext<'a> {
    /// Live paths in draw order.
    pub paths: &'a [Path],
    pub template: TemplateMode,
    /// Index of the selected text path.
    pub selected: Option<usize>,
    /// Base image under the drawing.
    pub base_image: Option<&'a RgbaImage>,
    /// Longer side of the base image once fitted.
    pub base_image_dimension: f64,
    pub selection_color: Color,
    pub selection_width: f64,
}

impl<'a> RenderContext<'a> {
    /// Create a context for the canvas' current state.
    pub fn new(canvas: &'a Canvas) -> Self {
        let config = EditorConfig::default();
        Self {
            paths: canvas.store.paths(),
            template: canvas.template(),
            selected: canvas.store.selected_index(),
            base_image: None,
            base_image_dimension: config.base_image_dimension,
            selection_color: config.selection_color.into(),
            selection_width: config.selection_width,
        }
    }

    /// Apply sizes and colors from the editor configuration.
    pub fn with_config(mut self, config: &EditorConfig) -> Self {
        self.base_image_dimension = config.base_image_dimension;
        self.selection_color = config.selection_color.into();
        self.selection_width = config.selection_width;
        self
    }

    pub fn with_base_image(mut self, image: Option<&'a RgbaImage>) -> Self {
        self.base_image = image;
        self
    }

    /// Override the selected index (`None` hides selection boxes).
    pub fn with_selected(mut self, selected: Option<usize>) -> Self {
        self.selected = selected;
        self
    }
}

/// Destination rectangle for a base image: longer side scaled to
/// `dimension`, centred on the surface.
pub fn fit_base_image(image_size: Size, surface_size: Size, dimension: f64) -> Option<Rect> {
    let longest = image_size.width.max(image_size.height);
    if longest <= 0.0 || !longest.is_finite() {
        return None;
    }
    let scale = dimension / longest;
    let size = Size::new(image_size.width * scale, image_size.height * scale);
    let origin = Point::new(
        (surface_size.width - size.width) / 2.0,
        (surface_size.height - size.height) / 2.0,
    );
    Some(Rect::from_origin_size(origin, size))
}

/// Clear the surface and draw every path in store order.
///
/// A missing surface makes this a no-op.
pub fn render_pass(surface: Option<&mut dyn Surface>, ctx: &RenderContext<'_>) {
    let Some(surface) = surface else {
        log::debug!("render pass skipped: no surface");
        return;
    };

    surface.clear();

    if ctx.template.shows_base_image() {
        if let Some(image) = ctx.base_image {
            let image_size = Size::new(image.width() as f64, image.height() as f64);
            let dest = fit_base_image(image_size, surface.size(), ctx.base_image_dimension);
            if let Some(dest) = dest {
                surface.draw_image(image, dest);
            }
        }
    }

    for (index, path) in ctx.paths.iter().enumerate() {
        match path {
            Path::Stroke(stroke) if ctx.template.renders_strokes() => {
                let outline = stroke.outline();
                if !outline.elements().is_empty() {
                    surface.fill_path(&outline, stroke.color.into());
                }
            }
            Path::Text(text) if ctx.template.renders_text() => {
                surface.fill_text(
                    text.content(),
                    text.anchor(),
                    text.font_size(),
                    text.align(),
                    text.color.into(),
                );
                if ctx.selected == Some(index) {
                    let (color, width) = (ctx.selection_color, ctx.selection_width);
                    surface.stroke_rect(text.bounding_box(), color, width);
                }
            }
            Path::Stroke(_) | Path::Text(_) => {}
        }
    }
}
