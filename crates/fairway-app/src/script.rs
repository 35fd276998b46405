//! Editor scripts: a JSON list of user actions replayed against a canvas.

use fairway_core::input::PointerEvent;
use fairway_core::tools::{EditorMode, TemplateMode};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

fn full_pressure() -> f64 {
    1.0
}

/// One user action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ScriptStep {
    SetTemplate { template: TemplateMode },
    SetMode { mode: EditorMode },
    SetLineWidth { width: f64 },
    SetFontSize { size: f64 },
    /// Ink color as `#rrggbb`.
    SetColor { color: String },
    /// Raw pointer or touch event in page coordinates.
    Pointer { event: PointerEvent },
    /// Press at canvas coordinates.
    Down {
        x: f64,
        y: f64,
        #[serde(default = "full_pressure")]
        pressure: f64,
    },
    Move {
        x: f64,
        y: f64,
        #[serde(default = "full_pressure")]
        pressure: f64,
    },
    Up,
    /// Click in type mode and answer the prompt with `text`.
    Type { x: f64, y: f64, text: String },
    Undo,
    Redo,
    Clear,
    DeleteSelected,
    ZoomIn,
    ZoomOut,
    LoadImage { path: PathBuf },
    RemoveImage,
    NewDesign,
}

/// Read a script file.
pub fn load_script(path: &Path) -> anyhow::Result<Vec<ScriptStep>> {
    let json = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&json)?)
}
