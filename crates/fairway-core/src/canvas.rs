//! Path store and the editing session built around it.

use crate::config::EditorConfig;
use crate::input::{map_pointer_to_canvas, InputState, PointerEvent, PointerPhase};
use crate::shapes::{Path, PathId, Sample, TextMeasure};
use crate::tools::{EditorMode, TemplateMode, TextPrompt, ToolManager};
use kurbo::{Point, Rect, Size};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use thiserror::Error;

/// Zoom step applied by zoom in/out.
pub const ZOOM_FACTOR: f64 = 0.8;
/// Smallest allowed display scale.
pub const MIN_SCALE: f64 = 0.1;
/// Largest allowed display scale.
pub const MAX_SCALE: f64 = 10.0;

/// Errors raised by canvas operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CanvasError {
    #[error("Nothing to convert: draw something or load an image first")]
    NothingToConvert,
}

/// Ordered list of live paths with undo/redo history.
///
/// Undo removes the most recent live path; redo re-appends the most
/// recently undone one. Appending a new path discards everything that
/// could have been redone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PathStore {
    paths: Vec<Path>,
    /// Every path that has left the live list, oldest first.
    #[serde(skip)]
    undo_stack: Vec<Path>,
    /// Redo candidates, most recently undone first.
    #[serde(skip)]
    redo_stack: VecDeque<Path>,
}

impl PathStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Live paths in draw order.
    pub fn paths(&self) -> &[Path] {
        &self.paths
    }

    pub fn last(&self) -> Option<&Path> {
        self.paths.last()
    }

    pub fn get(&self, id: PathId) -> Option<&Path> {
        self.paths.iter().find(|p| p.id() == id)
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn undo_stack(&self) -> &[Path] {
        &self.undo_stack
    }

    pub fn redo_stack(&self) -> &VecDeque<Path> {
        &self.redo_stack
    }

    pub fn can_undo(&self) -> bool {
        !self.paths.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Number of live text paths.
    pub fn text_count(&self) -> usize {
        self.paths.iter().filter(|p| p.as_text().is_some()).count()
    }

    /// Add a path on top. Clears the redo history.
    pub fn append(&mut self, path: Path) {
        log::debug!("append {:?} path {}", path.kind(), path.id());
        self.paths.push(path);
        self.redo_stack.clear();
    }

    /// Remove the most recent live path.
    /// Returns true if undo was performed, false if nothing to undo.
    pub fn undo(&mut self) -> bool {
        let Some(path) = self.paths.pop() else {
            return false;
        };
        self.redo_stack.push_front(path.clone());
        self.undo_stack.push(path);
        true
    }

    /// Re-append the most recently undone path.
    /// Returns true if redo was performed, false if nothing to redo.
    pub fn redo(&mut self) -> bool {
        let Some(path) = self.redo_stack.pop_front() else {
            return false;
        };
        self.undo_stack.push(path.clone());
        self.paths.push(path);
        true
    }

    /// Remove every live path. Nothing is redoable afterwards.
    pub fn clear(&mut self) {
        self.undo_stack.append(&mut self.paths);
        self.redo_stack.clear();
    }

    /// Drop all paths and history.
    pub fn reset(&mut self) {
        self.paths.clear();
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    /// Apply `mutate` to every path matching `predicate`. Returns the count.
    pub fn update_selected<P, M>(&mut self, predicate: P, mut mutate: M) -> usize
    where
        P: Fn(&Path) -> bool,
        M: FnMut(&mut Path),
    {
        let mut count = 0;
        for path in self.paths.iter_mut().filter(|p| predicate(p)) {
            mutate(path);
            count += 1;
        }
        count
    }

    /// Remove a path by id, keeping it in the undo history.
    pub fn remove(&mut self, id: PathId) -> Option<Path> {
        let index = self.paths.iter().position(|p| p.id() == id)?;
        let path = self.paths.remove(index);
        self.undo_stack.push(path.clone());
        Some(path)
    }

    /// Append a sample to the last path if it is the stroke `id`.
    pub fn extend_last_stroke(&mut self, id: PathId, sample: Sample) -> bool {
        match self.paths.last_mut().and_then(Path::as_stroke_mut) {
            Some(stroke) if stroke.id == id => {
                stroke.push(sample);
                true
            }
            _ => false,
        }
    }

    /// Set the selection flag of one text path. Returns true if it changed.
    pub fn set_selected(&mut self, id: PathId, selected: bool) -> bool {
        let mut changed = false;
        self.update_selected(
            |p| p.id() == id,
            |p| {
                if let Some(text) = p.as_text_mut() {
                    changed |= text.selected != selected;
                    text.selected = selected;
                }
            },
        );
        changed
    }

    /// Select exactly one text path, or none. Returns true if anything changed.
    pub fn select_only(&mut self, id: Option<PathId>) -> bool {
        let mut changed = false;
        for path in &mut self.paths {
            let wanted = Some(path.id()) == id;
            if let Some(text) = path.as_text_mut() {
                if text.selected != wanted {
                    text.selected = wanted;
                    changed = true;
                }
            }
        }
        changed
    }

    /// Index of the selected text path, if any.
    pub fn selected_index(&self) -> Option<usize> {
        self.paths.iter().position(Path::is_selected)
    }

    /// Recompute every text bounding box with a new measurer.
    pub fn relayout_text(&mut self, measure: &dyn TextMeasure) {
        for path in &mut self.paths {
            if let Some(text) = path.as_text_mut() {
                text.relayout(measure);
            }
        }
    }

    /// Serialize the live paths to JSON. History is not included.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// An editing session: paths, tools, template, and view state.
#[derive(Debug, Clone)]
pub struct Canvas {
    pub store: PathStore,
    pub tools: ToolManager,
    pub input: InputState,
    template: TemplateMode,
    size: Size,
    scale: f64,
    has_base_image: bool,
    needs_redraw: bool,
}

impl Default for Canvas {
    fn default() -> Self {
        Self::new(&EditorConfig::default())
    }
}

impl Canvas {
    pub fn new(config: &EditorConfig) -> Self {
        Self {
            store: PathStore::new(),
            tools: ToolManager::from_config(config),
            input: InputState::new(),
            template: TemplateMode::default(),
            size: Size::new(config.canvas_width as f64, config.canvas_height as f64),
            scale: 1.0,
            has_base_image: false,
            needs_redraw: true,
        }
    }

    pub fn template(&self) -> TemplateMode {
        self.template
    }

    pub fn mode(&self) -> EditorMode {
        self.tools.mode
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn has_base_image(&self) -> bool {
        self.has_base_image
    }

    /// Whether the drawing has changed since the last render.
    pub fn needs_redraw(&self) -> bool {
        self.needs_redraw
    }

    /// Read and clear the redraw flag.
    pub fn take_redraw(&mut self) -> bool {
        std::mem::take(&mut self.needs_redraw)
    }

    pub fn request_redraw(&mut self) {
        self.needs_redraw = true;
    }

    /// Switch the design type. Changing it discards all paths and history.
    pub fn set_template(&mut self, template: TemplateMode) {
        if self.template == template {
            return;
        }
        log::info!("template {} -> {}", self.template, template);
        self.template = template;
        self.tools.cancel();
        self.store.reset();
        self.needs_redraw = true;
    }

    pub fn set_mode(&mut self, mode: EditorMode) {
        self.tools.set_mode(mode);
    }

    /// Register a new base image. Existing paths are discarded.
    pub fn load_base_image(&mut self) {
        self.has_base_image = true;
        self.tools.cancel();
        self.store.reset();
        self.needs_redraw = true;
    }

    pub fn remove_base_image(&mut self) {
        self.has_base_image = false;
        self.needs_redraw = true;
    }

    /// Start over: no paths, no history, no base image.
    pub fn new_design(&mut self) {
        self.tools.cancel();
        self.store.reset();
        self.has_base_image = false;
        self.needs_redraw = true;
    }

    pub fn undo(&mut self) -> bool {
        let changed = self.store.undo();
        self.needs_redraw |= changed;
        changed
    }

    pub fn redo(&mut self) -> bool {
        let changed = self.store.redo();
        self.needs_redraw |= changed;
        changed
    }

    pub fn clear(&mut self) {
        self.tools.cancel();
        self.store.clear();
        self.needs_redraw = true;
    }

    /// Delete the selected text path, if any.
    pub fn delete_selected(&mut self) -> bool {
        let Some(index) = self.store.selected_index() else {
            return false;
        };
        let id = self.store.paths()[index].id();
        self.store.remove(id);
        self.needs_redraw = true;
        true
    }

    pub fn zoom_in(&mut self) {
        self.set_scale(self.scale / ZOOM_FACTOR);
    }

    pub fn zoom_out(&mut self) {
        self.set_scale(self.scale * ZOOM_FACTOR);
    }

    pub fn set_scale(&mut self, scale: f64) {
        if scale.is_finite() && scale > 0.0 {
            self.scale = scale.clamp(MIN_SCALE, MAX_SCALE);
        }
    }

    /// Fail if there is neither ink nor a base image to send for conversion.
    pub fn check_convertible(&self) -> Result<(), CanvasError> {
        if self.store.is_empty() && !self.has_base_image {
            return Err(CanvasError::NothingToConvert);
        }
        Ok(())
    }

    /// Recompute text boxes once real font metrics are available.
    pub fn refresh_text_bounds(&mut self, measure: &dyn TextMeasure) {
        self.store.relayout_text(measure);
        self.needs_redraw = true;
    }

    /// Feed a raw pointer event whose coordinates are relative to the page.
    ///
    /// `canvas_rect` is the on-screen rectangle of the drawing surface.
    pub fn handle_event(
        &mut self,
        event: &PointerEvent,
        canvas_rect: Rect,
        measure: &dyn TextMeasure,
        prompt: &mut dyn TextPrompt,
    ) -> bool {
        let sample = map_pointer_to_canvas(event, canvas_rect, self.scale);
        match (event.phase, sample) {
            (PointerPhase::Down, Some(sample)) => self.pointer_down(sample, measure, prompt),
            (PointerPhase::Move, Some(sample)) => self.pointer_move(sample, measure),
            // Pointer-up always ends the gesture, even without coordinates.
            (PointerPhase::Up, _) => self.pointer_up(),
            (_, None) => {
                log::warn!("dropping pointer event without usable coordinates");
                false
            }
        }
    }

    /// Pointer pressed at a canvas-space sample.
    pub fn pointer_down(
        &mut self,
        sample: Sample,
        measure: &dyn TextMeasure,
        prompt: &mut dyn TextPrompt,
    ) -> bool {
        self.input.handle(PointerPhase::Down, sample.point());
        let changed = self.tools.begin(&mut self.store, self.template, sample, measure, prompt);
        self.needs_redraw |= changed;
        changed
    }

    pub fn pointer_move(&mut self, sample: Sample, measure: &dyn TextMeasure) -> bool {
        self.input.handle(PointerPhase::Move, sample.point());
        if !self.input.is_pressed {
            return false;
        }
        let changed = self.tools.update(&mut self.store, sample, measure);
        self.needs_redraw |= changed;
        changed
    }

    pub fn pointer_up(&mut self) -> bool {
        let position: Point = self.input.pointer_position;
        self.input.handle(PointerPhase::Up, position);
        let changed = self.tools.end(&mut self.store);
        self.needs_redraw |= changed;
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::{ApproximateMetrics, SerializableColor, Stroke, Text};
    use crate::tools::NoPrompt;

    fn stroke(x: f64) -> Path {
        Stroke::new(Sample::new(x, 0.0, 1.0), SerializableColor::black(), 5.0).into()
    }

    fn ids(store: &PathStore) -> Vec<PathId> {
        store.paths().iter().map(Path::id).collect()
    }

    #[test]
    fn test_store_creation() {
        let store = PathStore::new();
        assert!(store.is_empty());
        assert!(!store.can_undo());
        assert!(!store.can_redo());
    }

    #[test]
    fn test_undo_removes_last_path() {
        let mut store = PathStore::new();
        let a = stroke(1.0);
        let b = stroke(2.0);
        store.append(a.clone());
        store.append(b.clone());

        assert!(store.undo());
        assert_eq!(store.paths(), &[a]);
        assert_eq!(store.redo_stack().front(), Some(&b));
        assert_eq!(store.undo_stack().last(), Some(&b));
    }

    #[test]
    fn test_undo_on_empty_is_noop() {
        let mut store = PathStore::new();
        assert!(!store.undo());
        assert!(!store.redo());
        assert!(store.undo_stack().is_empty());
    }

    #[test]
    fn test_undo_n_times_then_redo_n_times_restores() {
        let mut store = PathStore::new();
        for i in 0..5 {
            store.append(stroke(i as f64));
        }
        let before = store.paths().to_vec();

        for n in 0..=5 {
            for _ in 0..n {
                assert!(store.undo());
            }
            assert_eq!(store.paths(), &before[..5 - n]);
            for _ in 0..n {
                assert!(store.redo());
            }
            assert_eq!(store.paths(), &before[..]);
        }
    }

    #[test]
    fn test_redo_order_is_reverse_of_undo() {
        let mut store = PathStore::new();
        let (a, b, c) = (stroke(1.0), stroke(2.0), stroke(3.0));
        store.append(a.clone());
        store.append(b.clone());
        store.append(c.clone());

        store.undo();
        store.undo();
        store.redo();
        assert_eq!(store.paths(), &[a.clone(), b.clone()]);
        store.redo();
        assert_eq!(store.paths(), &[a, b, c]);
        assert!(!store.can_redo());
    }

    #[test]
    fn test_append_clears_redo() {
        let mut store = PathStore::new();
        store.append(stroke(1.0));
        store.append(stroke(2.0));
        store.undo();
        assert!(store.can_redo());

        store.append(stroke(3.0));
        assert!(!store.can_redo());
        assert!(!store.redo());
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_clear_empties_live_and_redo() {
        let mut store = PathStore::new();
        store.append(stroke(1.0));
        store.append(stroke(2.0));
        store.undo();

        store.clear();

        assert!(store.is_empty());
        assert!(!store.can_redo());
        assert_eq!(store.undo_stack().len(), 2);
    }

    #[test]
    fn test_remove_by_id() {
        let mut store = PathStore::new();
        let a = stroke(1.0);
        let b = stroke(2.0);
        store.append(a.clone());
        store.append(b.clone());

        assert_eq!(store.remove(a.id()), Some(a));
        assert_eq!(ids(&store), vec![b.id()]);
        assert_eq!(store.remove(uuid::Uuid::new_v4()), None);
    }

    #[test]
    fn test_extend_last_stroke_checks_identity() {
        let mut store = PathStore::new();
        let first = stroke(1.0);
        let first_id = first.id();
        store.append(first);
        assert!(store.extend_last_stroke(first_id, Sample::new(5.0, 5.0, 1.0)));

        store.append(stroke(2.0));
        assert!(!store.extend_last_stroke(first_id, Sample::new(6.0, 6.0, 1.0)));
        assert_eq!(store.paths()[0].as_stroke().unwrap().len(), 2);
    }

    #[test]
    fn test_select_only_is_exclusive() {
        let mut store = PathStore::new();
        let a: Path =
            Text::new(Point::new(10.0, 50.0), "A".to_string(), 20.0, &ApproximateMetrics).into();
        let b: Path =
            Text::new(Point::new(10.0, 90.0), "B".to_string(), 20.0, &ApproximateMetrics).into();
        let (a_id, b_id) = (a.id(), b.id());
        store.append(a);
        store.append(b);

        assert!(store.select_only(Some(a_id)));
        assert_eq!(store.selected_index(), Some(0));
        assert!(store.select_only(Some(b_id)));
        assert_eq!(store.selected_index(), Some(1));
        assert!(!store.paths()[0].is_selected());
        assert!(!store.select_only(Some(b_id)));
    }

    #[test]
    fn test_store_json_roundtrip() {
        let mut store = PathStore::new();
        store.append(stroke(1.0));
        let go = Text::new(Point::new(3.0, 4.0), "GO".to_string(), 30.0, &ApproximateMetrics);
        store.append(go.into());
        store.append(stroke(2.0));
        store.undo();

        let json = store.to_json().unwrap();
        let restored = PathStore::from_json(&json).unwrap();

        assert_eq!(restored.paths(), store.paths());
        assert!(!restored.can_redo());
    }

    #[test]
    fn test_stroke_undo_redo_session() {
        let mut canvas = Canvas::default();
        let samples = [(10.0, 10.0), (20.0, 12.0), (30.0, 15.0), (40.0, 15.0)];

        let start = Sample::new(samples[0].0, samples[0].1, 1.0);
        canvas.pointer_down(start, &ApproximateMetrics, &mut NoPrompt);
        for &(x, y) in &samples[1..] {
            canvas.pointer_move(Sample::new(x, y, 1.0), &ApproximateMetrics);
        }
        canvas.pointer_up();

        assert_eq!(canvas.store.len(), 1);
        let drawn = canvas.store.paths()[0].clone();
        assert_eq!(drawn.as_stroke().unwrap().len(), 4);

        assert!(canvas.undo());
        assert!(canvas.store.is_empty());
        assert_eq!(canvas.store.redo_stack().len(), 1);

        assert!(canvas.redo());
        assert_eq!(canvas.store.paths(), &[drawn]);
    }

    #[test]
    fn test_moves_without_press_are_ignored() {
        let mut canvas = Canvas::default();
        assert!(!canvas.pointer_move(Sample::new(1.0, 1.0, 1.0), &ApproximateMetrics));
        assert!(canvas.store.is_empty());
    }

    #[test]
    fn test_stacked_text_session() {
        let mut canvas = Canvas::default();
        canvas.set_template(TemplateMode::Text);
        canvas.set_mode(EditorMode::Type);
        let mut answers = vec!["CD".to_string(), "AB".to_string()];
        let mut prompt = move |_: &str| answers.pop();

        canvas.pointer_down(Sample::new(12.0, 480.0, 1.0), &ApproximateMetrics, &mut prompt);
        canvas.pointer_up();
        canvas.pointer_down(Sample::new(400.0, 30.0, 1.0), &ApproximateMetrics, &mut prompt);
        canvas.pointer_up();

        let texts: Vec<&Text> = canvas.store.paths().iter().filter_map(Path::as_text).collect();
        assert_eq!(texts.len(), 2);
        assert_eq!(texts[0].content(), "AB");
        assert_eq!(texts[1].content(), "CD");
        let center = canvas.size().width / 2.0;
        assert!((texts[0].anchor().x - center).abs() < f64::EPSILON);
        assert!((texts[1].anchor().x - center).abs() < f64::EPSILON);
        assert!(texts[1].anchor().y - texts[0].anchor().y >= texts[0].font_size());
    }

    #[test]
    fn test_template_change_resets_store() {
        let mut canvas = Canvas::default();
        canvas.store.append(stroke(1.0));
        canvas.store.append(stroke(2.0));
        canvas.undo();

        canvas.set_template(TemplateMode::Solid);
        assert_eq!(canvas.store.len(), 1);

        canvas.set_template(TemplateMode::Custom);
        assert!(canvas.store.is_empty());
        assert!(!canvas.store.can_redo());
        assert!(canvas.store.undo_stack().is_empty());
    }

    #[test]
    fn test_loading_base_image_resets_store() {
        let mut canvas = Canvas::default();
        canvas.store.append(stroke(1.0));
        canvas.load_base_image();

        assert!(canvas.store.is_empty());
        assert!(canvas.has_base_image());
        assert!(canvas.check_convertible().is_ok());
    }

    #[test]
    fn test_check_convertible() {
        let mut canvas = Canvas::default();
        assert_eq!(canvas.check_convertible(), Err(CanvasError::NothingToConvert));

        canvas.store.append(stroke(1.0));
        assert!(canvas.check_convertible().is_ok());

        canvas.new_design();
        assert_eq!(canvas.check_convertible(), Err(CanvasError::NothingToConvert));
    }

    #[test]
    fn test_handle_event_maps_through_scale() {
        let mut canvas = Canvas::default();
        canvas.set_scale(2.0);
        let rect = Rect::new(100.0, 50.0, 1100.0, 1050.0);

        let down = PointerEvent::pointer(PointerPhase::Down, Point::new(120.0, 70.0));
        let drag = PointerEvent::pointer(PointerPhase::Move, Point::new(140.0, 90.0));
        // Touch end carries no coordinates but still ends the stroke.
        let lift = PointerEvent::touch(PointerPhase::Up, vec![]);
        for event in [&down, &drag, &lift] {
            canvas.handle_event(event, rect, &ApproximateMetrics, &mut NoPrompt);
        }

        let stroke = canvas.store.paths()[0].as_stroke().unwrap();
        assert_eq!(stroke.samples()[0].point(), Point::new(10.0, 10.0));
        assert_eq!(stroke.samples()[1].point(), Point::new(20.0, 20.0));
        assert!(!canvas.tools.is_active());
    }

    #[test]
    fn test_zoom_steps() {
        let mut canvas = Canvas::default();
        canvas.zoom_out();
        assert!((canvas.scale() - 0.8).abs() < 1e-12);
        canvas.zoom_in();
        assert!((canvas.scale() - 1.0).abs() < 1e-12);
        canvas.set_scale(-3.0);
        assert!((canvas.scale() - 1.0).abs() < 1e-12);
        canvas.set_scale(1000.0);
        assert!((canvas.scale() - MAX_SCALE).abs() < 1e-12);
    }

    #[test]
    fn test_redraw_flag() {
        let mut canvas = Canvas::default();
        assert!(canvas.take_redraw());
        assert!(!canvas.needs_redraw());

        canvas.store.append(stroke(1.0));
        canvas.undo();
        assert!(canvas.take_redraw());
        assert!(!canvas.undo());
        assert!(!canvas.needs_redraw());
    }

    #[test]
    fn test_delete_selected_text() {
        let mut canvas = Canvas::default();
        let text: Path =
            Text::new(Point::new(10.0, 50.0), "X".to_string(), 20.0, &ApproximateMetrics).into();
        let id = text.id();
        canvas.store.append(text);
        assert!(!canvas.delete_selected());

        canvas.store.select_only(Some(id));
        assert!(canvas.delete_selected());
        assert!(canvas.store.is_empty());
    }
}
