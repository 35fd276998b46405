//! Fairway Ink Core Library
//!
//! Platform-agnostic paths, editing tools and session state for the Fairway Ink
//! golf ball designer.

pub mod canvas;
pub mod config;
pub mod input;
pub mod outline;
pub mod selection;
pub mod session;
pub mod shapes;
pub mod storage;
pub mod tools;

pub use canvas::{Canvas, CanvasError, PathStore};
pub use config::{ConfigError, EditorConfig};
pub use input::{map_pointer_to_canvas, InputState, PointerEvent, PointerPhase};
pub use outline::{polygon_to_bez_path, polygon_to_path_syntax, stroke_to_outline, OutlineOptions};
pub use selection::{hit_test_text, DragState};
pub use session::{Session, SessionState};
pub use shapes::{
    Path, PathId, PathKind, PathTrait, Sample, SerializableColor, Stroke, Text, TextAlign,
    TextMeasure,
};
pub use tools::{EditorMode, TemplateMode, TextPrompt, ToolManager};
