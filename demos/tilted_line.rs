//! Particles bouncing off a slowly rotating line.
//!
//! Run with: `cargo run --example tilted_line [settings.json]`

use metaballs::prelude::*;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let settings = match std::env::args().nth(1) {
        Some(path) => Settings::from_json_file(path)?,
        None => Settings::tilted_line(),
    };

    MetaballsApp::new(settings)
        .with_title("Metaballs - Tilted Line")
        .with_seed(7)
        .run()?;
    Ok(())
}
