//! Particles piling onto a text label.
//!
//! Run with: `cargo run --example label [TEXT] [settings.json]`
//!
//! Uses the bundled DejaVu Sans Mono Bold. Set `METABALLS_FONT` to use
//! another font file.

use metaballs::prelude::*;
use tracing_subscriber::EnvFilter;

const BUNDLED_FONT: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/assets/fonts/DejaVuSansMono-Bold.ttf");

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut args = std::env::args().skip(1);
    let text = args.next().unwrap_or_else(|| "Metaballs".to_string());
    let settings = match args.next() {
        Some(path) => Settings::from_json_file(path)?,
        None => Settings::label(),
    };

    let font_path = std::env::var("METABALLS_FONT").unwrap_or_else(|_| BUNDLED_FONT.to_string());
    let font = LabelFont::load("DejaVu Sans Mono", 700, font_path)?;

    MetaballsApp::new(settings)
        .with_title("Metaballs - Label")
        .with_label(font, text)
        .run()?;
    Ok(())
}
