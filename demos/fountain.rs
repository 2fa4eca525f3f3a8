//! Particles respawn at the pointer and fall in three colour bands.
//!
//! Run with: `cargo run --example fountain [settings.json]`
//!
//! Move the pointer to steer the fountain; left click or space toggles the
//! raw field view.

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
        .with_title("Metaballs - Fountain")
        .with_size(1024.0, 768.0)
        .run()?;
    Ok(())
}
