//! CPU raster surface built on tiny-skia.

use crate::font::StencilFont;
use crate::renderer::{RenderResult, RendererError, Surface};
use fairway_core::shapes::TextAlign;
use image::RgbaImage;
use kurbo::{BezPath, PathEl, Point, Rect, Size};
use peniko::Color;
use tiny_skia::{
    ColorU8, FillRule, FilterQuality, Paint, PathBuilder, Pixmap, PixmapPaint, Stroke, Transform,
};

fn skia_color(color: Color) -> tiny_skia::Color {
    let rgba = color.to_rgba8();
    tiny_skia::Color::from_rgba8(rgba.r, rgba.g, rgba.b, rgba.a)
}

fn solid_paint(color: Color) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color(skia_color(color));
    paint.anti_alias = true;
    paint
}

/// Convert a kurbo path. Returns `None` for paths without area.
fn skia_path(path: &BezPath) -> Option<tiny_skia::Path> {
    let mut pb = PathBuilder::new();
    for el in path.elements() {
        match *el {
            PathEl::MoveTo(p) => pb.move_to(p.x as f32, p.y as f32),
            PathEl::LineTo(p) => pb.line_to(p.x as f32, p.y as f32),
            PathEl::QuadTo(c, p) => pb.quad_to(c.x as f32, c.y as f32, p.x as f32, p.y as f32),
            PathEl::CurveTo(c1, c2, p) => pb.cubic_to(
                c1.x as f32,
                c1.y as f32,
                c2.x as f32,
                c2.y as f32,
                p.x as f32,
                p.y as f32,
            ),
            PathEl::ClosePath => pb.close(),
        }
    }
    pb.finish()
}

/// Copy an RGBA image into a premultiplied pixmap.
fn image_to_pixmap(image: &RgbaImage) -> Option<Pixmap> {
    let mut pixmap = Pixmap::new(image.width(), image.height())?;
    for (dst, src) in pixmap.pixels_mut().iter_mut().zip(image.pixels()) {
        *dst = ColorU8::from_rgba(src[0], src[1], src[2], src[3]).premultiply();
    }
    Some(pixmap)
}

/// A [`Surface`] that rasterises into an in-memory pixmap.
pub struct SkiaSurface {
    pixmap: Pixmap,
    font: Option<StencilFont>,
}

impl SkiaSurface {
    pub fn new(width: u32, height: u32) -> RenderResult<Self> {
        let pixmap = Pixmap::new(width, height).ok_or_else(|| {
            RendererError::Surface(format!("invalid surface size {width}x{height}"))
        })?;
        Ok(Self { pixmap, font: None })
    }

    /// Use `font` for text. Without a font, text paths are not drawn.
    pub fn with_font(mut self, font: Option<StencilFont>) -> Self {
        self.font = font;
        self
    }

    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    /// Straight-alpha RGBA copy of the pixels.
    pub fn to_rgba_image(&self) -> RenderResult<RgbaImage> {
        let mut raw = Vec::with_capacity(self.pixmap.data().len());
        for pixel in self.pixmap.pixels() {
            let c = pixel.demultiply();
            raw.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
        }
        RgbaImage::from_raw(self.width(), self.height(), raw)
            .ok_or_else(|| RendererError::Surface("pixel buffer size mismatch".to_string()))
    }
}

impl Surface for SkiaSurface {
    fn size(&self) -> Size {
        Size::new(self.width() as f64, self.height() as f64)
    }

    fn clear(&mut self) {
        self.pixmap.fill(tiny_skia::Color::TRANSPARENT);
    }

    fn draw_image(&mut self, image: &RgbaImage, dest: Rect) {
        let Some(source) = image_to_pixmap(image) else {
            log::warn!("skipping empty base image");
            return;
        };
        let sx = (dest.width() / image.width() as f64) as f32;
        let sy = (dest.height() / image.height() as f64) as f32;
        let transform =
            Transform::from_scale(sx, sy).post_translate(dest.x0 as f32, dest.y0 as f32);
        let paint = PixmapPaint {
            quality: FilterQuality::Bilinear,
            ..Default::default()
        };
        self.pixmap.draw_pixmap(0, 0, source.as_ref(), &paint, transform, None);
    }

    fn fill_path(&mut self, path: &BezPath, color: Color) {
        if let Some(path) = skia_path(path) {
            self.pixmap.fill_path(
                &path,
                &solid_paint(color),
                FillRule::Winding,
                Transform::identity(),
                None,
            );
        }
    }

    fn fill_text(
        &mut self,
        content: &str,
        anchor: Point,
        font_size: f64,
        align: TextAlign,
        color: Color,
    ) {
        let Some(font) = &self.font else {
            log::warn!("no stencil font loaded, skipping text {content:?}");
            return;
        };
        let outline = font.text_path(content, anchor, font_size, align);
        self.fill_path(&outline, color);
    }

    fn stroke_rect(&mut self, rect: Rect, color: Color, width: f64) {
        let (x0, y0, x1, y1) = (rect.x0 as f32, rect.y0 as f32, rect.x1 as f32, rect.y1 as f32);
        let Some(rect) = tiny_skia::Rect::from_ltrb(x0, y0, x1, y1) else {
            return;
        };
        let path = PathBuilder::from_rect(rect);
        let stroke = Stroke {
            width: width as f32,
            ..Default::default()
        };
        self.pixmap
            .stroke_path(&path, &solid_paint(color), &stroke, Transform::identity(), None);
    }
}
