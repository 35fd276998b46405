//! Editor configuration.

use crate::shapes::SerializableColor;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Smallest and largest selectable stroke widths.
pub const LINE_WIDTH_RANGE: (f64, f64) = (1.0, 20.0);
/// Smallest and largest selectable font sizes.
pub const FONT_SIZE_RANGE: (f64, f64) = (20.0, 80.0);

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Drawing surface and tool defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub canvas_width: u32,
    pub canvas_height: u32,
    pub line_width: f64,
    pub font_size: f64,
    pub ink_color: SerializableColor,
    /// Longer side of a loaded base image after fitting.
    pub base_image_dimension: f64,
    /// Vertical advance between stacked text lines, in font sizes.
    pub line_height: f64,
    pub selection_color: SerializableColor,
    pub selection_width: f64,
    /// Stencil typeface used for text paths.
    pub font_path: PathBuf,
    /// File name attached to exported drawings.
    pub export_file_name: String,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            canvas_width: 500,
            canvas_height: 500,
            line_width: 5.0,
            font_size: 40.0,
            ink_color: SerializableColor::black(),
            base_image_dimension: 425.0,
            line_height: 1.2,
            selection_color: SerializableColor::blue(),
            selection_width: 2.0,
            font_path: PathBuf::from("gunplay.otf"),
            export_file_name: "fairway_ink_drawing.png".to_string(),
        }
    }
}

impl EditorConfig {
    /// Load a JSON config file. Missing fields keep their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Center of the drawing surface in canvas coordinates.
    pub fn canvas_center(&self) -> kurbo::Point {
        kurbo::Point::new(self.canvas_width as f64 / 2.0, self.canvas_height as f64 / 2.0)
    }
}
