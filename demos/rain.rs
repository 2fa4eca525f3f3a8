//! Large soft balls raining from the top.
//!
//! Run with: `cargo run --example rain [settings.json]`
//!
//! Left click or space toggles the raw field view.

use metaballs::prelude::*;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let settings = match std::env::args().nth(1) {
        Some(path) => Settings::from_json_file(path)?,
        None => Settings::rain(),
    };

    MetaballsApp::new(settings).with_title("Metaballs - Rain").run()?;
    Ok(())
}
