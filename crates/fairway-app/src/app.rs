//! Headless editor application.

use crate::script::ScriptStep;
use anyhow::Context;
use fairway_core::canvas::Canvas;
use fairway_core::config::EditorConfig;
use fairway_core::session::Session;
use fairway_core::shapes::{Sample, SerializableColor};
use fairway_core::storage::Storage;
use fairway_core::tools::NoPrompt;
use fairway_render::{
    decode_image, export_for_conversion, render_pass, ConvertRequest, FontLoader, RenderContext,
    SkiaSurface, StencilFont,
};
use image::RgbaImage;
use kurbo::{Point, Rect};
use pollster::block_on;
use std::path::Path;
use std::sync::Arc;

/// Editor state driven by scripted input.
pub struct App<S: Storage> {
    pub config: EditorConfig,
    pub canvas: Canvas,
    pub font: FontLoader,
    base_image: Option<RgbaImage>,
    session: Session<S>,
    /// What the editor currently shows, repainted whenever the canvas asks.
    view: Option<SkiaSurface>,
    redraws: usize,
}

impl<S: Storage> App<S> {
    /// Open the persisted session and restore template, mode and base image.
    pub fn new(config: EditorConfig, storage: Arc<S>, session_key: &str) -> anyhow::Result<Self> {
        let session = block_on(Session::open(storage, session_key))?;
        let mut canvas = Canvas::new(&config);
        canvas.set_template(session.state().template_type);
        canvas.set_mode(session.state().editor_mode);

        let mut app = Self {
            config,
            canvas,
            font: FontLoader::new(),
            base_image: None,
            session,
            view: None,
            redraws: 0,
        };

        if app.session.state().has_image() {
            let url = app.session.state().image_url.clone();
            match read_image(Path::new(&url)) {
                Ok(image) => app.set_base_image(image),
                Err(e) => log::warn!("could not restore base image {url}: {e:#}"),
            }
        }
        app.refresh_view()?;
        Ok(app)
    }

    pub fn session(&self) -> &Session<S> {
        &self.session
    }

    pub fn base_image(&self) -> Option<&RgbaImage> {
        self.base_image.as_ref()
    }

    /// The most recent repaint of the editor view.
    pub fn view(&self) -> Option<&SkiaSurface> {
        self.view.as_ref()
    }

    /// Number of render passes run so far.
    pub fn redraws(&self) -> usize {
        self.redraws
    }

    /// Load the stencil font and refresh text boxes placed so far.
    pub fn load_font(&mut self, path: &Path) -> anyhow::Result<()> {
        self.font.resolve(StencilFont::load(path), &mut self.canvas);
        // The view surface carries the font, so rebuild it.
        self.view = None;
        self.refresh_view()?;
        Ok(())
    }

    /// Run a render pass into the view if the canvas changed since the last one.
    pub fn refresh_view(&mut self) -> anyhow::Result<bool> {
        if !self.canvas.take_redraw() && self.view.is_some() {
            return Ok(false);
        }
        if self.view.is_none() {
            let surface = SkiaSurface::new(self.config.canvas_width, self.config.canvas_height)?
                .with_font(self.font.font().cloned());
            self.view = Some(surface);
        }
        let Some(view) = self.view.as_mut() else {
            return Ok(false);
        };
        let base_image = self.base_image.as_ref().filter(|_| self.canvas.has_base_image());
        let ctx = RenderContext::new(&self.canvas)
            .with_config(&self.config)
            .with_base_image(base_image);
        render_pass(Some(view), &ctx);
        self.redraws += 1;
        Ok(true)
    }

    /// On-screen rectangle of the canvas at the current zoom.
    fn canvas_rect(&self) -> Rect {
        let size = self.canvas.size();
        let scale = self.canvas.scale();
        Rect::from_origin_size(Point::ORIGIN, (size.width * scale, size.height * scale))
    }

    fn set_base_image(&mut self, image: RgbaImage) {
        self.base_image = Some(image);
        self.canvas.load_base_image();
    }

    pub fn run(&mut self, steps: &[ScriptStep]) -> anyhow::Result<()> {
        for (index, step) in steps.iter().enumerate() {
            self.apply(step).with_context(|| format!("step {index} ({step:?}) failed"))?;
            self.refresh_view()?;
        }
        Ok(())
    }

    pub fn apply(&mut self, step: &ScriptStep) -> anyhow::Result<()> {
        let measure = self.font.measure();
        match step {
            ScriptStep::SetTemplate { template } => {
                self.canvas.set_template(*template);
                block_on(self.session.update_template_type(*template))?;
            }
            ScriptStep::SetMode { mode } => {
                self.canvas.set_mode(*mode);
                block_on(self.session.update_editor_mode(*mode))?;
            }
            ScriptStep::SetLineWidth { width } => self.canvas.tools.set_line_width(*width),
            ScriptStep::SetFontSize { size } => self.canvas.tools.set_font_size(*size),
            ScriptStep::SetColor { color } => {
                let color = SerializableColor::from_hex(color)
                    .with_context(|| format!("invalid color {color:?}"))?;
                self.canvas.tools.set_color(color);
            }
            ScriptStep::Pointer { event } => {
                let rect = self.canvas_rect();
                self.canvas.handle_event(event, rect, measure, &mut NoPrompt);
            }
            ScriptStep::Down { x, y, pressure } => {
                self.canvas.pointer_down(Sample::new(*x, *y, *pressure), measure, &mut NoPrompt);
            }
            ScriptStep::Move { x, y, pressure } => {
                self.canvas.pointer_move(Sample::new(*x, *y, *pressure), measure);
            }
            ScriptStep::Up => {
                self.canvas.pointer_up();
            }
            ScriptStep::Type { x, y, text } => {
                let mut answer = |_: &str| Some(text.clone());
                self.canvas.pointer_down(Sample::new(*x, *y, 1.0), measure, &mut answer);
                self.canvas.pointer_up();
            }
            ScriptStep::Undo => {
                self.canvas.undo();
            }
            ScriptStep::Redo => {
                self.canvas.redo();
            }
            ScriptStep::Clear => self.canvas.clear(),
            ScriptStep::DeleteSelected => {
                self.canvas.delete_selected();
            }
            ScriptStep::ZoomIn => self.canvas.zoom_in(),
            ScriptStep::ZoomOut => self.canvas.zoom_out(),
            ScriptStep::LoadImage { path } => {
                let image = read_image(path)?;
                self.set_base_image(image);
                block_on(self.session.update_image_url(path.display().to_string()))?;
            }
            ScriptStep::RemoveImage => {
                self.base_image = None;
                self.canvas.remove_base_image();
                block_on(self.session.update_image_url(""))?;
            }
            ScriptStep::NewDesign => {
                self.base_image = None;
                self.canvas.new_design();
                block_on(self.session.update_image_url(""))?;
            }
        }
        Ok(())
    }

    /// Build the conversion upload and advance the session's model counter.
    pub fn export(&mut self) -> anyhow::Result<ConvertRequest> {
        let request = export_for_conversion(
            &self.canvas,
            self.base_image(),
            self.font.font(),
            &self.config,
        )?;
        let key = block_on(self.session.bump_stl_key())?;
        log::info!("conversion request #{key} ready ({})", request.method_str());
        Ok(request)
    }
}

fn read_image(path: &Path) -> anyhow::Result<RgbaImage> {
    let bytes = std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    Ok(decode_image(&bytes)?)
}
