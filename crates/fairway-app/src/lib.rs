//! Fairway Ink Application
//!
//! Headless editor shell: replays scripted user input against the core,
//! persists the design session and produces the conversion export.

mod app;
mod script;

pub use app::App;
pub use script::{load_script, ScriptStep};
