//! Main application entry point.

use anyhow::Context;
use clap::Parser;
use fairway_app::{load_script, App};
use fairway_core::config::EditorConfig;
use fairway_core::session::DEFAULT_SESSION_KEY;
use fairway_core::storage::{FileStorage, MemoryStorage, Storage};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Path to the editor script (JSON list of actions)
    #[clap(short, long)]
    script: PathBuf,

    /// Where to write the recentered export PNG
    #[clap(short, long, default_value = "fairway_ink_drawing.png")]
    output: PathBuf,

    /// Optional editor config (JSON)
    #[clap(short, long)]
    config: Option<PathBuf>,

    /// Stencil font, overriding the config
    #[clap(short, long)]
    font: Option<PathBuf>,

    /// Also write the editor view (selection boxes included) here
    #[clap(long)]
    preview: Option<PathBuf>,

    /// Session directory, defaulting to the per-user data directory
    #[clap(long, conflicts_with = "ephemeral")]
    session_dir: Option<PathBuf>,

    /// Keep the session in memory only
    #[clap(long)]
    ephemeral: bool,

    /// Session key
    #[clap(long, default_value = DEFAULT_SESSION_KEY)]
    session: String,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();
    log::info!("Starting Fairway Ink");

    let config = match &args.config {
        Some(path) => EditorConfig::load(path)?,
        None => EditorConfig::default(),
    };

    if args.ephemeral {
        return run(&args, config, Arc::new(MemoryStorage::new()));
    }
    let storage = match &args.session_dir {
        Some(dir) => FileStorage::new(dir)?,
        None => FileStorage::default_location()?,
    };
    log::info!("Session directory: {}", storage.dir().display());
    run(&args, config, Arc::new(storage))
}

fn run<S: Storage>(args: &Args, config: EditorConfig, storage: Arc<S>) -> anyhow::Result<()> {
    let font_path = args.font.clone().unwrap_or_else(|| config.font_path.clone());
    let mut app = App::new(config, storage, &args.session)?;
    app.load_font(&font_path)?;

    let steps = load_script(&args.script)
        .with_context(|| format!("failed to load {}", args.script.display()))?;
    app.run(&steps)?;

    if let (Some(preview), Some(view)) = (&args.preview, app.view()) {
        view.to_rgba_image()?
            .save(preview)
            .with_context(|| format!("failed to write {}", preview.display()))?;
    }

    let request = app.export()?;
    std::fs::write(&args.output, &request.image_png)
        .with_context(|| format!("failed to write {}", args.output.display()))?;
    println!(
        "{}: {} paths, method={}",
        args.output.display(),
        app.canvas.store.len(),
        request.method_str()
    );
    Ok(())
}
