//! Text label rasterisation.
//!
//! The label is drawn once on the CPU into a single-channel coverage mask. The
//! mask's pixel size doubles as the exclusion box the particles pile onto.

use std::path::Path;

use ab_glyph::{Font, FontArc, PxScale, ScaleFont};
use glam::Vec2;
use image::GrayImage;

use crate::error::FontError;

/// Font size the text is first measured at before being fitted to the target width.
pub const REFERENCE_FONT_SIZE: f32 = 42.0;

/// A parsed font plus the typographic parameters it was requested with.
#[derive(Clone)]
pub struct LabelFont {
    family: String,
    weight: u16,
    font: FontArc,
}

impl std::fmt::Debug for LabelFont {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LabelFont")
            .field("family", &self.family)
            .field("weight", &self.weight)
            .finish_non_exhaustive()
    }
}

impl LabelFont {
    /// Parse a TrueType/OpenType font from memory.
    pub fn from_bytes(
        family: impl Into<String>,
        weight: u16,
        bytes: Vec<u8>,
    ) -> Result<Self, FontError> {
        let font = FontArc::try_from_vec(bytes)?;
        Ok(Self { family: family.into(), weight, font })
    }

    /// Read and parse a font file.
    pub fn load(
        family: impl Into<String>,
        weight: u16,
        path: impl AsRef<Path>,
    ) -> Result<Self, FontError> {
        let bytes = std::fs::read(path.as_ref())?;
        let font = Self::from_bytes(family, weight, bytes)?;
        tracing::info!(target: "label", "loaded font {} {} from {}", font.family, font.weight, path.as_ref().display());
        Ok(font)
    }

    pub fn family(&self) -> &str {
        &self.family
    }

    pub fn weight(&self) -> u16 {
        self.weight
    }

    /// Advance width of `text` at `size` pixels, kerning included.
    pub fn advance_width(&self, text: &str, size: f32) -> f32 {
        let scaled = self.font.as_scaled(PxScale::from(size));
        let mut width = 0.0;
        let mut previous = None;
        for c in text.chars() {
            let id = scaled.glyph_id(c);
            if let Some(prev) = previous {
                width += scaled.kern(prev, id);
            }
            width += scaled.h_advance(id);
            previous = Some(id);
        }
        width
    }
}

/// Coverage mask of a rendered label.
#[derive(Debug, Clone)]
pub struct LabelMask {
    text: String,
    image: GrayImage,
}

impl LabelMask {
    /// Render `text` in upper case, scaled so its advance width is `target_width`.
    ///
    /// The mask is `ascent * (1 + pad)` tall, with `pad = 0.2`, or `0.4` when the
    /// text contains a `J` so its descender fits.
    pub fn rasterize(font: &LabelFont, text: &str, target_width: f32) -> Result<Self, FontError> {
        let text = text.to_uppercase();
        let reference = font.advance_width(&text, REFERENCE_FONT_SIZE);
        if text.trim().is_empty() || reference <= 0.0 || !(1.0..f32::INFINITY).contains(&target_width) {
            return Err(FontError::EmptyText);
        }

        let size = REFERENCE_FONT_SIZE * target_width / reference;
        let scaled = font.font.as_scaled(PxScale::from(size));

        let has_j = text.contains('J');
        let pad = if has_j { 0.4 } else { 0.2 };
        let width = target_width.ceil() as u32;
        let height = (scaled.ascent() * (1.0 + pad)).ceil().max(1.0) as u32;
        let h = height as f32;

        let mut image = GrayImage::new(width, height);
        let mut caret = 0.0;
        let mut previous = None;
        for c in text.chars() {
            let id = scaled.glyph_id(c);
            if let Some(prev) = previous {
                caret += scaled.kern(prev, id);
            }

            let (char_pad, offset) = match c {
                'J' => (0.4, 0.0),
                _ if has_j => (0.2, h * 0.05),
                _ => (0.2, 0.0),
            };
            let baseline = h - h * char_pad / 2.0 + offset;

            let glyph = id.with_scale_and_position(size, ab_glyph::point(caret, baseline));
            if let Some(outlined) = font.font.outline_glyph(glyph) {
                let bounds = outlined.px_bounds();
                outlined.draw(|x, y, coverage| {
                    let px = bounds.min.x as i32 + x as i32;
                    let py = bounds.min.y as i32 + y as i32;
                    if px < 0 || py < 0 || px >= width as i32 || py >= height as i32 {
                        return;
                    }
                    let value = (coverage.clamp(0.0, 1.0) * 255.0).round() as u8;
                    let pixel = image.get_pixel_mut(px as u32, py as u32);
                    pixel.0[0] = pixel.0[0].max(value);
                });
            }

            caret += scaled.h_advance(id);
            previous = Some(id);
        }

        tracing::debug!(target: "label", "rasterized {:?} at {:.1}px into {}x{}", text, size, width, height);
        Ok(Self { text, image })
    }

    /// Build a mask from existing pixels.
    pub fn from_image(text: impl Into<String>, image: GrayImage) -> Self {
        Self { text: text.into(), image }
    }

    /// The upper-cased text the mask shows.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Pixel size, used as the exclusion box size.
    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width() as f32, self.height() as f32)
    }

    /// Row-major coverage bytes, one per pixel.
    pub fn pixels(&self) -> &[u8] {
        self.image.as_raw()
    }

    pub fn image(&self) -> &GrayImage {
        &self.image
    }

    /// Coverage at a pixel, `0` outside the mask.
    pub fn coverage(&self, x: u32, y: u32) -> u8 {
        self.image.get_pixel_checked(x, y).map_or(0, |p| p.0[0])
    }
}
