//! Raster export for the vectorization service.

use crate::font::StencilFont;
use crate::raster::{encode_png, recenter_raster};
use crate::renderer::{render_pass, RenderContext, RenderResult, RendererError};
use crate::skia_impl::SkiaSurface;
use fairway_core::canvas::{Canvas, CanvasError};
use fairway_core::config::EditorConfig;
use fairway_core::tools::TemplateMode;
use image::RgbaImage;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Export errors.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error(transparent)]
    NothingToConvert(#[from] CanvasError),
    #[error(transparent)]
    Render(#[from] RendererError),
}

/// Upload for the vectorization service: a PNG plus the design type.
#[derive(Debug, Clone, PartialEq)]
pub struct ConvertRequest {
    pub image_png: Vec<u8>,
    pub file_name: String,
    pub method: TemplateMode,
}

impl ConvertRequest {
    /// Discriminator sent in the `method` form field.
    pub fn method_str(&self) -> &'static str {
        self.method.as_str()
    }
}

/// Vectorization result. The path data is opaque to the editor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConvertResponse {
    #[serde(rename = "svgData")]
    pub svg_data: String,
}

impl ConvertResponse {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Rasterise the canvas as it would be exported: no selection boxes,
/// transparent where nothing is drawn.
pub fn render_canvas(
    canvas: &Canvas,
    base_image: Option<&RgbaImage>,
    font: Option<&StencilFont>,
    config: &EditorConfig,
) -> RenderResult<RgbaImage> {
    let mut surface =
        SkiaSurface::new(config.canvas_width, config.canvas_height)?.with_font(font.cloned());
    let base_image = base_image.filter(|_| canvas.has_base_image());
    let ctx = RenderContext::new(canvas)
        .with_config(config)
        .with_base_image(base_image)
        .with_selected(None);
    render_pass(Some(&mut surface), &ctx);
    surface.to_rgba_image()
}

/// Produce the conversion upload for the current drawing.
///
/// Fails without touching the canvas when there is nothing to convert.
pub fn export_for_conversion(
    canvas: &Canvas,
    base_image: Option<&RgbaImage>,
    font: Option<&StencilFont>,
    config: &EditorConfig,
) -> Result<ConvertRequest, ExportError> {
    canvas.check_convertible()?;

    let raster = render_canvas(canvas, base_image, font, config)?;
    let centred = recenter_raster(&raster);
    let image_png = encode_png(&centred)?;
    log::info!(
        "exported {} bytes for {} conversion",
        image_png.len(),
        canvas.template()
    );

    Ok(ConvertRequest {
        image_png,
        file_name: config.export_file_name.clone(),
        method: canvas.template(),
    })
}
