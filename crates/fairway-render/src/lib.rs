//! Fairway Ink Render Library
//!
//! Render pass over an abstract drawing surface, plus the raster export that
//! feeds the vectorization service. The default surface rasterises on the CPU
//! with tiny-skia.

mod raster;
mod renderer;

#[cfg(feature = "skia-renderer")]
mod export;
#[cfg(feature = "skia-renderer")]
mod font;
#[cfg(feature = "skia-renderer")]
mod skia_impl;

pub use raster::{decode_image, encode_png, ink_bounds, recenter_raster};
pub use renderer::{
    fit_base_image, render_pass, RenderContext, RenderResult, RendererError, Surface,
};

#[cfg(feature = "skia-renderer")]
pub use export::{
    export_for_conversion, render_canvas, ConvertRequest, ConvertResponse, ExportError,
};
#[cfg(feature = "skia-renderer")]
pub use font::{FontError, FontLoader, StencilFont};
#[cfg(feature = "skia-renderer")]
pub use skia_impl::SkiaSurface;
