//! Fountain with the runtime control panel.
//!
//! Run with: `cargo run --example panel --features egui [settings.json]`

use metaballs::prelude::*;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let settings = match std::env::args().nth(1) {
        Some(path) => Settings::from_json_file(path)?,
        None => Settings::fountain(),
    };

    MetaballsApp::new(settings)
        .with_title("Metaballs - Panel")
        .with_size(1280.0, 800.0)
        .with_panel()
        .run()?;
    Ok(())
}
