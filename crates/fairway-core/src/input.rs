//! Pointer and touch input normalization.

use crate::shapes::Sample;
use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};

/// Phase of a pointer or touch gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointerPhase {
    /// Pointer down or touch start.
    Down,
    /// Pointer move or touch move.
    Move,
    /// Pointer up or touch end.
    Up,
}

/// A raw input event in client (screen) coordinates.
///
/// Mouse and pen events carry `client`; touch events carry `touches`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointerEvent {
    pub phase: PointerPhase,
    #[serde(default)]
    pub client: Option<Point>,
    #[serde(default)]
    pub touches: Vec<Point>,
    #[serde(default)]
    pub pressure: Option<f64>,
}

impl PointerEvent {
    /// Mouse or pen event at a client position.
    pub fn pointer(phase: PointerPhase, client: Point) -> Self {
        Self {
            phase,
            client: Some(client),
            touches: Vec::new(),
            pressure: None,
        }
    }

    /// Touch event with the given active touch points.
    pub fn touch(phase: PointerPhase, touches: Vec<Point>) -> Self {
        Self {
            phase,
            client: None,
            touches,
            pressure: None,
        }
    }

    pub fn with_pressure(mut self, pressure: f64) -> Self {
        self.pressure = Some(pressure);
        self
    }
}

/// Map an input event into canvas-local coordinates.
///
/// `canvas_rect` is the canvas element's on-screen rectangle and `scale` the
/// current display scale factor. The first touch point takes precedence over
/// client coordinates. Returns `None` when the event carries no usable
/// position.
pub fn map_pointer_to_canvas(
    event: &PointerEvent,
    canvas_rect: Rect,
    scale: f64,
) -> Option<Sample> {
    if !scale.is_finite() || scale <= 0.0 {
        return None;
    }

    let client = event.touches.first().copied().or(event.client)?;
    if !client.x.is_finite() || !client.y.is_finite() {
        return None;
    }

    let x = (client.x - canvas_rect.x0) / scale;
    let y = (client.y - canvas_rect.y0) / scale;
    if !x.is_finite() || !y.is_finite() {
        return None;
    }
    let pressure = match event.pressure {
        Some(p) if p.is_finite() && p > 0.0 => p.min(1.0),
        _ => 1.0,
    };

    Some(Sample::new(x, y, pressure))
}

/// Tracks pointer state across events.
#[derive(Debug, Clone, Default)]
pub struct InputState {
    /// Current pointer position in canvas coordinates.
    pub pointer_position: Point,
    /// Previous pointer position for delta calculations.
    pub previous_pointer_position: Point,
    /// Whether the pointer is currently held down.
    pub is_pressed: bool,
    /// Start position of the current press.
    pub drag_start: Option<Point>,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a mapped sample for the given phase.
    pub fn handle(&mut self, phase: PointerPhase, position: Point) {
        self.previous_pointer_position = self.pointer_position;
        self.pointer_position = position;
        match phase {
            PointerPhase::Down => {
                self.is_pressed = true;
                self.drag_start = Some(position);
            }
            PointerPhase::Move => {}
            PointerPhase::Up => {
                self.is_pressed = false;
                self.drag_start = None;
            }
        }
    }

    /// Pointer movement since the previous event.
    pub fn pointer_delta(&self) -> Vec2 {
        self.pointer_position - self.previous_pointer_position
    }

    /// Offset from the press position, while pressed.
    pub fn drag_delta(&self) -> Option<Vec2> {
        self.drag_start.map(|start| self.pointer_position - start)
    }
}
