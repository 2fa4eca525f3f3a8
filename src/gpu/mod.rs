//! GPU side of the pipeline.
//!
//! [`GpuContext`] owns the device and the window surface. The [`Compositor`]
//! owns the offscreen target and the three passes:
//!
//! ```text
//! positions ──► SpritePass ──► OffscreenTarget ──► CompositePass ──► surface
//!                                                       │
//!                                    LabelPass ─────────┘ (drawn on top)
//! ```

mod composite_pass;
mod compositor;
#[cfg(feature = "egui")]
mod egui_integration;
mod label_pass;
mod resources;
mod sprite_pass;

use std::sync::Arc;

use winit::window::Window;

use crate::error::{GpuError, ShaderError};

pub use composite_pass::CompositePass;
pub use compositor::{Compositor, FrameInput};
#[cfg(feature = "egui")]
pub use egui_integration::{EguiFrameOutput, EguiIntegration};
pub use label_pass::LabelPass;
pub use resources::{InstanceBuffer, MaskTexture, OffscreenTarget, QuadBuffer, UniformBuffer};
pub use sprite_pass::SpritePass;

/// What a format can do as the offscreen target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FormatSupport {
    pub renderable: bool,
    pub blendable: bool,
    pub filterable: bool,
}

impl FormatSupport {
    /// Usable as a blended render target that is later sampled with filtering.
    pub fn usable(&self) -> bool {
        self.renderable && self.blendable && self.filterable
    }

    fn from_features(features: wgpu::TextureFormatFeatures) -> Self {
        Self {
            renderable: features.allowed_usages.contains(wgpu::TextureUsages::RENDER_ATTACHMENT),
            blendable: features.flags.contains(wgpu::TextureFormatFeatureFlags::BLENDABLE),
            filterable: features.flags.contains(wgpu::TextureFormatFeatureFlags::FILTERABLE),
        }
    }
}

/// Capability query result for the offscreen target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RenderCapabilities {
    pub float32: FormatSupport,
    pub float16: FormatSupport,
}

impl RenderCapabilities {
    /// Everything supported.
    pub fn full() -> Self {
        let all = FormatSupport { renderable: true, blendable: true, filterable: true };
        Self { float32: all, float16: all }
    }

    /// Query the adapter, honouring the features the device was created with.
    pub fn query(adapter: &wgpu::Adapter, device_features: wgpu::Features) -> Self {
        let support = |format: wgpu::TextureFormat| {
            let features = if device_features.contains(wgpu::Features::TEXTURE_ADAPTER_SPECIFIC_FORMAT_FEATURES) {
                adapter.get_texture_format_features(format)
            } else {
                format.guaranteed_format_features(device_features)
            };
            FormatSupport::from_features(features)
        };
        Self {
            float32: support(wgpu::TextureFormat::Rgba32Float),
            float16: support(wgpu::TextureFormat::Rgba16Float),
        }
    }

    /// Offscreen format: 32-bit float, then 16-bit float, then 8-bit unorm.
    pub fn target_format(&self) -> wgpu::TextureFormat {
        if self.float32.usable() {
            wgpu::TextureFormat::Rgba32Float
        } else if self.float16.usable() {
            wgpu::TextureFormat::Rgba16Float
        } else {
            wgpu::TextureFormat::Rgba8Unorm
        }
    }
}

/// Device, queue and the configured window surface.
pub struct GpuContext {
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    pub capabilities: RenderCapabilities,
}

impl GpuContext {
    /// Bring up a device that can present to `window`.
    ///
    /// `size` is the window's physical size.
    pub async fn new(window: Arc<Window>, size: (u32, u32)) -> Result<Self, GpuError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY | wgpu::Backends::GL,
            ..Default::default()
        });

        let surface = instance.create_surface(window)?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or(GpuError::NoAdapter)?;

        let optional = wgpu::Features::FLOAT32_FILTERABLE
            | wgpu::Features::TEXTURE_ADAPTER_SPECIFIC_FORMAT_FEATURES;
        let required_features = adapter.features() & optional;

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Metaballs Device"),
                    required_features,
                    required_limits: wgpu::Limits::downlevel_webgl2_defaults()
                        .using_resolution(adapter.limits()),
                    memory_hints: Default::default(),
                },
                None,
            )
            .await?;

        let capabilities = RenderCapabilities::query(&adapter, device.features());
        tracing::info!(
            target: "gpu",
            "adapter {:?}, offscreen format {:?}",
            adapter.get_info().name,
            capabilities.target_format()
        );

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| !f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .ok_or(GpuError::UnsupportedSurface)?;
        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.0.max(1),
            height: size.1.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        Ok(Self { surface, device, queue, config, capabilities })
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.config.format
    }

    /// Reconfigure the surface. No-op when the size is unchanged.
    pub fn resize_surface(&mut self, size: (u32, u32)) {
        let (width, height) = (size.0.max(1), size.1.max(1));
        if width == self.config.width && height == self.config.height {
            return;
        }
        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);
    }

    /// Reconfigure with the current size, after `Lost`/`Outdated`.
    pub fn reconfigure(&self) {
        self.surface.configure(&self.device, &self.config);
    }
}

/// Build a render pipeline inside a validation error scope.
///
/// Shader compilation and pipeline validation errors come back as a
/// [`ShaderError`] instead of reaching the device's uncaptured error handler.
pub(crate) fn build_pipeline(
    device: &wgpu::Device,
    label: &'static str,
    build: impl FnOnce() -> wgpu::RenderPipeline,
) -> Result<wgpu::RenderPipeline, ShaderError> {
    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let pipeline = build();
    match pollster::block_on(device.pop_error_scope()) {
        None => Ok(pipeline),
        Some(error) => Err(ShaderError { label, diagnostics: error.to_string() }),
    }
}

/// [`build_pipeline`], logging the error once and yielding `None` on failure.
pub(crate) fn try_build_pipeline(
    device: &wgpu::Device,
    label: &'static str,
    build: impl FnOnce() -> wgpu::RenderPipeline,
) -> Option<wgpu::RenderPipeline> {
    match build_pipeline(device, label, build) {
        Ok(pipeline) => Some(pipeline),
        Err(e) => {
            tracing::error!(target: "gpu", "{}; pass disabled", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefers_float32() {
        assert_eq!(RenderCapabilities::full().target_format(), wgpu::TextureFormat::Rgba32Float);
    }

    #[test]
    fn test_falls_back_to_float16() {
        let mut caps = RenderCapabilities::full();
        caps.float32.blendable = false;
        assert_eq!(caps.target_format(), wgpu::TextureFormat::Rgba16Float);
    }

    #[test]
    fn test_falls_back_to_8bit() {
        let mut caps = RenderCapabilities::full();
        caps.float32.filterable = false;
        caps.float16.renderable = false;
        assert_eq!(caps.target_format(), wgpu::TextureFormat::Rgba8Unorm);
        assert_eq!(RenderCapabilities::default().target_format(), wgpu::TextureFormat::Rgba8Unorm);
    }

    #[test]
    fn test_guaranteed_half_float_is_usable() {
        let features = wgpu::TextureFormat::Rgba16Float.guaranteed_format_features(wgpu::Features::empty());
        assert!(FormatSupport::from_features(features).usable());
    }
}
