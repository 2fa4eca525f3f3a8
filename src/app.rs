//! Windowed host.
//!
//! [`MetaballsApp`] opens a window, brings up the GPU and drives one
//! [`Metaballs`] context from the event loop: every redraw steps the
//! simulation and renders it, then asks for the next redraw.
//!
//! ```ignore
//! use metaballs::prelude::*;
//!
//! fn main() -> Result<(), RunError> {
//!     MetaballsApp::new(Settings::fountain())
//!         .with_title("Fountain")
//!         .run()
//! }
//! ```

use std::sync::Arc;

use glam::Vec2;
use winit::application::ApplicationHandler;
use winit::dpi::{LogicalSize, PhysicalPosition, PhysicalSize};
use winit::event::{ElementState, MouseButton, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

use crate::config::Settings;
use crate::error::RunError;
use crate::gpu::GpuContext;
use crate::label::LabelFont;
use crate::metaballs::Metaballs;
use crate::time::{FrameClock, Tick};
use crate::viewport::Viewport;

#[cfg(feature = "egui")]
use crate::gpu::EguiIntegration;
#[cfg(feature = "egui")]
use crate::panel::{ControlPanel, PanelChanges, PanelStats};

/// Builder for a windowed metaballs run.
pub struct MetaballsApp {
    settings: Settings,
    title: String,
    size: (f64, f64),
    seed: Option<u64>,
    label: Option<(LabelFont, String)>,
    #[cfg(feature = "egui")]
    panel: bool,
}

impl MetaballsApp {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            title: "Metaballs".to_string(),
            size: (800.0, 600.0),
            seed: None,
            label: None,
            #[cfg(feature = "egui")]
            panel: false,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Initial window size in logical pixels.
    pub fn with_size(mut self, width: f64, height: f64) -> Self {
        self.size = (width, height);
        self
    }

    /// Seed for spawn and respawn sampling. Random if unset.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Draw `text` in `font` and let particles pile onto it.
    pub fn with_label(mut self, font: LabelFont, text: impl Into<String>) -> Self {
        self.label = Some((font, text.into()));
        self
    }

    /// Show the runtime control panel.
    #[cfg(feature = "egui")]
    pub fn with_panel(mut self) -> Self {
        self.panel = true;
        self
    }

    /// Run until the window is closed. Blocks the calling thread.
    pub fn run(self) -> Result<(), RunError> {
        let event_loop = EventLoop::new()?;
        event_loop.set_control_flow(ControlFlow::Poll);

        let mut app = App::new(self);
        event_loop.run_app(&mut app)?;
        match app.error.take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

/// What an input event asks the host to do.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HostAction {
    Pointer(Vec2),
    ToggleDebugView,
    Exit,
}

/// Keys the host reacts to.
pub fn key_action(key: PhysicalKey) -> Option<HostAction> {
    match key {
        PhysicalKey::Code(KeyCode::Space) => Some(HostAction::ToggleDebugView),
        PhysicalKey::Code(KeyCode::Escape) => Some(HostAction::Exit),
        _ => None,
    }
}

/// Physical window coordinates to logical pixels.
pub fn to_logical(position: PhysicalPosition<f64>, scale_factor: f64) -> Vec2 {
    let logical = position.to_logical::<f32>(scale_factor);
    Vec2::new(logical.x, logical.y)
}

fn input_action(event: &WindowEvent, scale_factor: f64) -> Option<HostAction> {
    match event {
        WindowEvent::CursorMoved { position, .. } => Some(HostAction::Pointer(to_logical(*position, scale_factor))),
        WindowEvent::Touch(touch) => Some(HostAction::Pointer(to_logical(touch.location, scale_factor))),
        WindowEvent::MouseInput {
            state: ElementState::Pressed,
            button: MouseButton::Left,
            ..
        } => Some(HostAction::ToggleDebugView),
        WindowEvent::KeyboardInput { event, .. } if event.state == ElementState::Pressed && !event.repeat => {
            key_action(event.physical_key)
        }
        _ => None,
    }
}

struct App {
    title: String,
    size: (f64, f64),
    metaballs: Metaballs,
    pending_label: Option<(LabelFont, String)>,
    window: Option<Arc<Window>>,
    clock: FrameClock,
    exiting: bool,
    error: Option<RunError>,
    #[cfg(feature = "egui")]
    egui: Option<EguiIntegration>,
    #[cfg(feature = "egui")]
    panel: Option<ControlPanel>,
}

impl App {
    fn new(config: MetaballsApp) -> Self {
        let seed = config.seed.unwrap_or_else(rand::random::<u64>);
        let viewport = Viewport::new(config.size.0 as f32, config.size.1 as f32, 1.0);
        tracing::info!(target: "app", "starting {:?} with seed {}", config.title, seed);
        Self {
            title: config.title,
            size: config.size,
            metaballs: Metaballs::new(config.settings, viewport, seed),
            pending_label: config.label,
            window: None,
            clock: FrameClock::new(),
            exiting: false,
            error: None,
            #[cfg(feature = "egui")]
            egui: None,
            #[cfg(feature = "egui")]
            panel: config.panel.then(ControlPanel::default),
        }
    }

    fn resize_to(&mut self, size: PhysicalSize<u32>, scale_factor: f64) {
        let logical = size.to_logical::<f32>(scale_factor);
        self.metaballs.resize(logical.width, logical.height, scale_factor as f32);
    }

    fn apply(&mut self, action: HostAction, event_loop: &ActiveEventLoop) {
        match action {
            HostAction::Pointer(position) => self.metaballs.pointer().set(position),
            HostAction::ToggleDebugView => {
                self.metaballs.toggle_debug_view();
            }
            HostAction::Exit => self.exit(event_loop),
        }
    }

    fn exit(&mut self, event_loop: &ActiveEventLoop) {
        self.exiting = true;
        event_loop.exit();
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        if self.exiting {
            return;
        }
        let tick = self.clock.tick();
        match self.frame(tick) {
            Ok(()) => {}
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                tracing::debug!(target: "app", "surface lost, reconfiguring");
                self.metaballs.recover_surface();
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                tracing::error!(target: "app", "out of GPU memory");
                self.exit(event_loop);
                return;
            }
            Err(e) => tracing::warn!(target: "app", "frame skipped: {}", e),
        }
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }

    #[cfg(not(feature = "egui"))]
    fn frame(&mut self, tick: Tick) -> Result<(), wgpu::SurfaceError> {
        self.metaballs.frame(tick.delta_ms, tick.elapsed_ms)
    }

    #[cfg(feature = "egui")]
    fn frame(&mut self, tick: Tick) -> Result<(), wgpu::SurfaceError> {
        let (Some(egui), Some(panel), Some(window)) = (&mut self.egui, &mut self.panel, &self.window) else {
            return self.metaballs.frame(tick.delta_ms, tick.elapsed_ms);
        };

        let mut settings = self.metaballs.settings().clone();
        let mut debug_view = self.metaballs.debug_view();
        let stats = PanelStats {
            fps: self.clock.fps(),
            particles: self.metaballs.simulator().particles().len(),
            target_size: self.metaballs.target_size(),
        };
        let mut changes = PanelChanges::default();
        let output = egui.run(window, |ctx| {
            changes = panel.show(ctx, &mut settings, &mut debug_view, stats);
        });
        apply_panel_changes(&mut self.metaballs, settings, debug_view, changes);

        let size_in_pixels = self
            .metaballs
            .renderer()
            .map(|r| [r.context().config.width, r.context().config.height])
            .unwrap_or([1, 1]);
        self.metaballs
            .frame_with(tick.delta_ms, tick.elapsed_ms, |device, queue, encoder, view| {
                egui.paint(device, queue, encoder, view, size_in_pixels, &output);
            })
    }
}

/// Hand panel edits to the context. Untouched frames cost nothing.
#[cfg(feature = "egui")]
fn apply_panel_changes(metaballs: &mut Metaballs, settings: Settings, debug_view: bool, changes: PanelChanges) {
    if changes.debug_view {
        metaballs.set_debug_view(debug_view);
    }
    if changes.settings {
        metaballs.apply_settings(settings);
    }
    if let Some(text) = changes.label_text {
        // Logged inside; the box stays off until the text is usable again.
        let _ = metaballs.set_label_text(&text);
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let attrs = Window::default_attributes()
            .with_title(self.title.clone())
            .with_inner_size(LogicalSize::new(self.size.0, self.size.1));
        let window = match event_loop.create_window(attrs) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                tracing::error!(target: "app", "failed to create window: {}", e);
                self.error = Some(e.into());
                self.exit(event_loop);
                return;
            }
        };

        self.resize_to(window.inner_size(), window.scale_factor());
        if let Some((font, text)) = self.pending_label.take() {
            // Errors are logged inside; the box stays inactive.
            let _ = self.metaballs.set_label(font, &text);
        }
        #[cfg(feature = "egui")]
        if let Some(panel) = &mut self.panel {
            panel.set_label_text(self.metaballs.label_text());
        }

        let physical = self.metaballs.viewport().physical_size();
        match pollster::block_on(GpuContext::new(window.clone(), physical)) {
            Ok(ctx) => {
                #[cfg(feature = "egui")]
                if self.panel.is_some() {
                    self.egui = Some(EguiIntegration::new(&ctx.device, ctx.surface_format(), &window));
                }
                self.metaballs.attach_renderer(ctx);
            }
            Err(e) => {
                tracing::error!(target: "app", "{}; simulation keeps running without rendering", e);
            }
        }

        self.clock = FrameClock::new();
        window.request_redraw();
        self.window = Some(window);
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        let Some(window) = self.window.clone() else {
            return;
        };

        #[cfg(feature = "egui")]
        if let Some(egui) = &mut self.egui {
            let structural = matches!(
                event,
                WindowEvent::CloseRequested
                    | WindowEvent::Resized(_)
                    | WindowEvent::ScaleFactorChanged { .. }
                    | WindowEvent::RedrawRequested
            );
            if egui.on_window_event(&window, &event) && !structural {
                return;
            }
        }

        match event {
            WindowEvent::CloseRequested => self.exit(event_loop),
            WindowEvent::Resized(size) => self.resize_to(size, window.scale_factor()),
            WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                self.resize_to(window.inner_size(), scale_factor);
            }
            WindowEvent::RedrawRequested => self.redraw(event_loop),
            other => {
                if let Some(action) = input_action(&other, window.scale_factor()) {
                    self.apply(action, event_loop);
                }
            }
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        // Device resources go before the window they present to.
        self.metaballs.detach_renderer();
        #[cfg(feature = "egui")]
        {
            self.egui = None;
        }
        tracing::info!(target: "app", "exiting after {} frames", self.clock.frame());
    }
}
