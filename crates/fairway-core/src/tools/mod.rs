//! Tool system: turns pointer input into path store mutations.

use crate::canvas::PathStore;
use crate::config::{EditorConfig, FONT_SIZE_RANGE, LINE_WIDTH_RANGE};
use crate::selection::{hit_test_text, DragState};
use crate::shapes::{Path, PathId, Sample, SerializableColor, Stroke, Text, TextAlign, TextMeasure};
use kurbo::Point;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How pointer input is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditorMode {
    /// Freehand ink.
    #[default]
    Draw,
    /// Click to place text.
    Type,
    /// Select and move placed text.
    Select,
}

impl EditorMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            EditorMode::Draw => "draw",
            EditorMode::Type => "type",
            EditorMode::Select => "select",
        }
    }
}

/// Overall design type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateMode {
    /// Solid ink drawing only.
    #[default]
    Solid,
    /// Stencil text only, auto-centred.
    Text,
    /// Ink and text together.
    Custom,
}

impl TemplateMode {
    /// Discriminator sent to the vectorization service.
    pub fn as_str(&self) -> &'static str {
        match self {
            TemplateMode::Solid => "solid",
            TemplateMode::Text => "text",
            TemplateMode::Custom => "custom",
        }
    }

    pub fn from_str_opt(s: &str) -> Option<Self> {
        match s {
            "solid" => Some(TemplateMode::Solid),
            "text" => Some(TemplateMode::Text),
            "custom" => Some(TemplateMode::Custom),
            _ => None,
        }
    }

    pub fn renders_strokes(&self) -> bool {
        matches!(self, TemplateMode::Solid | TemplateMode::Custom)
    }

    pub fn renders_text(&self) -> bool {
        matches!(self, TemplateMode::Text | TemplateMode::Custom)
    }

    /// Whether a base image is shown under the drawing.
    pub fn shows_base_image(&self) -> bool {
        !matches!(self, TemplateMode::Text)
    }
}

impl fmt::Display for TemplateMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Source of text for type mode.
pub trait TextPrompt {
    /// Ask the user for text. `None` means the prompt was cancelled.
    fn prompt(&mut self, message: &str) -> Option<String>;
}

impl<F> TextPrompt for F
where
    F: FnMut(&str) -> Option<String>,
{
    fn prompt(&mut self, message: &str) -> Option<String> {
        self(message)
    }
}

/// Prompt that never yields text, for hosts without text entry.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPrompt;

impl TextPrompt for NoPrompt {
    fn prompt(&mut self, _message: &str) -> Option<String> {
        None
    }
}

/// Message shown when asking for text.
pub const TEXT_PROMPT_MESSAGE: &str = "Enter text:";

/// Style applied to new paths.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolStyle {
    pub color: SerializableColor,
    pub line_width: f64,
    pub font_size: f64,
}

impl Default for ToolStyle {
    fn default() -> Self {
        let config = EditorConfig::default();
        Self {
            color: config.ink_color,
            line_width: config.line_width,
            font_size: config.font_size,
        }
    }
}

/// State of a tool interaction.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum ToolState {
    /// Waiting for input.
    #[default]
    Idle,
    /// A stroke is being drawn.
    Drawing { path_id: PathId },
    /// Pointer is down after selecting a text path; no drag.
    Pressed,
    /// A selected text path follows the pointer.
    Dragging(DragState),
}

/// Manages the current mode and the in-progress gesture.
#[derive(Debug, Clone)]
pub struct ToolManager {
    pub mode: EditorMode,
    pub state: ToolState,
    pub current_style: ToolStyle,
    /// Where auto-placed text lines are centred.
    text_origin: Point,
    line_height: f64,
}

impl Default for ToolManager {
    fn default() -> Self {
        Self::from_config(&EditorConfig::default())
    }
}

impl ToolManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &EditorConfig) -> Self {
        Self {
            mode: EditorMode::default(),
            state: ToolState::Idle,
            current_style: ToolStyle {
                color: config.ink_color,
                line_width: config.line_width.clamp(LINE_WIDTH_RANGE.0, LINE_WIDTH_RANGE.1),
                font_size: config.font_size.clamp(FONT_SIZE_RANGE.0, FONT_SIZE_RANGE.1),
            },
            text_origin: config.canvas_center(),
            line_height: config.line_height,
        }
    }

    /// Switch modes. Any gesture in progress ends.
    pub fn set_mode(&mut self, mode: EditorMode) {
        self.mode = mode;
        self.state = ToolState::Idle;
    }

    pub fn set_line_width(&mut self, width: f64) {
        self.current_style.line_width = width.clamp(LINE_WIDTH_RANGE.0, LINE_WIDTH_RANGE.1);
    }

    pub fn set_font_size(&mut self, size: f64) {
        self.current_style.font_size = size.clamp(FONT_SIZE_RANGE.0, FONT_SIZE_RANGE.1);
    }

    pub fn set_color(&mut self, color: SerializableColor) {
        self.current_style.color = color;
    }

    /// Check if a gesture is in progress.
    pub fn is_active(&self) -> bool {
        !matches!(self.state, ToolState::Idle)
    }

    /// Pointer down. Returns true if the store changed.
    pub fn begin(
        &mut self,
        store: &mut PathStore,
        template: TemplateMode,
        sample: Sample,
        measure: &dyn TextMeasure,
        prompt: &mut dyn TextPrompt,
    ) -> bool {
        match self.mode {
            EditorMode::Draw => {
                let stroke =
                    Stroke::new(sample, self.current_style.color, self.current_style.line_width);
                self.state = ToolState::Drawing { path_id: stroke.id };
                store.append(Path::Stroke(stroke));
                true
            }
            EditorMode::Type => {
                self.state = ToolState::Idle;
                self.place_text(store, template, sample.point(), measure, prompt)
            }
            EditorMode::Select => self.press_select(store, sample.point()),
        }
    }

    /// Pointer move. Returns true if the store changed.
    pub fn update(
        &mut self,
        store: &mut PathStore,
        sample: Sample,
        measure: &dyn TextMeasure,
    ) -> bool {
        match &mut self.state {
            ToolState::Drawing { path_id } => store.extend_last_stroke(*path_id, sample),
            ToolState::Dragging(drag) => {
                let anchor = drag.anchor_at(sample.point());
                let path_id = drag.path_id;
                drag.moved = true;
                let moved = store.update_selected(
                    |path| path.id() == path_id,
                    |path| {
                        if let Some(text) = path.as_text_mut() {
                            text.set_anchor(anchor, measure);
                        }
                    },
                );
                moved > 0
            }
            ToolState::Idle | ToolState::Pressed => false,
        }
    }

    /// Pointer up. Always ends the gesture. Returns true if the store changed.
    pub fn end(&mut self, store: &mut PathStore) -> bool {
        let state = std::mem::take(&mut self.state);
        match state {
            // A click without movement on an already selected text deselects it.
            ToolState::Dragging(drag) if !drag.moved => store.set_selected(drag.path_id, false),
            _ => false,
        }
    }

    /// Abandon the gesture without further mutation.
    pub fn cancel(&mut self) {
        self.state = ToolState::Idle;
    }

    fn place_text(
        &mut self,
        store: &mut PathStore,
        template: TemplateMode,
        click: Point,
        measure: &dyn TextMeasure,
        prompt: &mut dyn TextPrompt,
    ) -> bool {
        let Some(content) = prompt.prompt(TEXT_PROMPT_MESSAGE) else {
            return false;
        };
        if content.trim().is_empty() {
            return false;
        }

        let font_size = self.current_style.font_size;
        let (anchor, align) = match template {
            TemplateMode::Text => (self.next_stacked_anchor(store), TextAlign::Center),
            TemplateMode::Solid | TemplateMode::Custom => (click, TextAlign::Start),
        };

        let text = Text::new(anchor, content, font_size, measure)
            .with_align(align, measure)
            .with_color(self.current_style.color);
        store.append(Path::Text(text));
        true
    }

    /// Centred anchor below every text line placed so far.
    fn next_stacked_anchor(&self, store: &PathStore) -> Point {
        let offset: f64 = store
            .paths()
            .iter()
            .filter_map(Path::as_text)
            .map(|text| text.font_size() * self.line_height)
            .sum();
        Point::new(self.text_origin.x, self.text_origin.y + offset)
    }

    fn press_select(&mut self, store: &mut PathStore, point: Point) -> bool {
        let hit = hit_test_text(store.paths(), point).map(|i| &store.paths()[i]);

        match hit.and_then(Path::as_text).map(|t| (t.id, t.selected, t.anchor())) {
            Some((id, true, anchor)) => {
                self.state = ToolState::Dragging(DragState::new(id, anchor, point));
                false
            }
            Some((id, false, _)) => {
                self.state = ToolState::Pressed;
                store.select_only(Some(id))
            }
            None => {
                self.state = ToolState::Idle;
                store.select_only(None)
            }
        }
    }
}
