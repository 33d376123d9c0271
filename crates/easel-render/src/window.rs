//! Window management with winit for the script canvas

// Format inlining not always clearer
#![allow(clippy::uninlined_format_args)]

use crate::blit::{Blitter, init_with_surface};
use crate::placement::{Placement, WindowPlacements};
use image::{Rgba, RgbaImage};
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use std::time::{Duration, Instant};
use winit::{
    application::ApplicationHandler,
    dpi::{LogicalSize, PhysicalPosition},
    event::{ElementState, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{Key, ModifiersState},
    window::{Icon, Window, WindowId},
};

/// Height of the status strip under the canvas, in pixels
pub const FOOTER_HEIGHT: u32 = 22;

const FOOTER_FILL: Rgba<u8> = Rgba([232, 232, 232, 255]);
const FOOTER_RULE: Rgba<u8> = Rgba([178, 178, 178, 255]);

/// Configuration for the canvas window
#[derive(Debug, Clone)]
pub struct WindowConfig {
    pub title: String,
    /// Canvas width before the first frame arrives
    pub width: u32,
    /// Canvas height, not counting the footer
    pub height: u32,
    pub footer: bool,
    pub icon: Option<Icon>,
    /// Key under which the window position is remembered
    pub autosave_name: Option<String>,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Easel".to_string(),
            width: easel_core::drawing::DEFAULT_CANVAS_SIZE,
            height: easel_core::drawing::DEFAULT_CANVAS_SIZE,
            footer: true,
            icon: None,
            autosave_name: None,
        }
    }
}

/// Keyboard commands the window recognizes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shortcut {
    /// Ctrl/Cmd + R
    Rerun,
    /// Ctrl/Cmd + E
    Export,
    /// Ctrl/Cmd + .
    Cancel,
}

impl Shortcut {
    fn from_key(key: &Key, modifiers: ModifiersState) -> Option<Self> {
        if !(modifiers.control_key() || modifiers.super_key()) {
            return None;
        }
        match key {
            Key::Character(c) if c.eq_ignore_ascii_case("r") => Some(Self::Rerun),
            Key::Character(c) if c.eq_ignore_ascii_case("e") => Some(Self::Export),
            Key::Character(c) if c == "." => Some(Self::Cancel),
            _ => None,
        }
    }
}

/// What the event loop should do after a tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Tick again as soon as possible
    Poll,
    /// Sleep until an event arrives or the duration passes
    Wait(Duration),
    /// Close the window and return from [`run_canvas_window`]
    Exit,
}

/// Application logic driven by the canvas window
pub trait CanvasHandler {
    /// The window exists and can be drawn to
    fn launched(&mut self, window: CanvasWindow);

    /// Called every time the event loop runs out of events
    fn tick(&mut self) -> Flow;

    fn shortcut(&mut self, _shortcut: Shortcut) {}

    /// The user closed the window
    fn closed(&mut self);
}

/// Handle to the open window, given to the handler once it launches
#[derive(Clone)]
pub struct CanvasWindow {
    window: Arc<Window>,
    frame: Rc<RefCell<Option<RgbaImage>>>,
    footer: bool,
}

impl CanvasWindow {
    /// Resize the window's content area, footer included
    pub fn set_content_size(&self, width: u32, height: u32) {
        // The platform may refuse; a Resized event follows if it doesn't
        let _ = self.window.request_inner_size(LogicalSize::new(width, height));
    }

    /// Show `image` as the canvas on the next redraw
    pub fn present(&self, image: RgbaImage) {
        let image = if self.footer {
            with_footer(&image)
        } else {
            image
        };
        *self.frame.borrow_mut() = Some(image);
        self.window.request_redraw();
    }

    pub fn focus(&self) {
        self.window.focus_window();
    }

    pub fn footer_visible(&self) -> bool {
        self.footer
    }
}

/// Append the footer strip to the bottom of a canvas bitmap
fn with_footer(canvas: &RgbaImage) -> RgbaImage {
    let (width, height) = canvas.dimensions();
    let mut framed = RgbaImage::from_pixel(width, height + FOOTER_HEIGHT, FOOTER_FILL);
    for (x, y, pixel) in canvas.enumerate_pixels() {
        framed.put_pixel(x, y, *pixel);
    }
    for x in 0..width {
        framed.put_pixel(x, height, FOOTER_RULE);
    }
    framed
}

/// GPU state tied to the open window
struct Gpu {
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    surface_config: wgpu::SurfaceConfiguration,
    device: Arc<wgpu::Device>,
    blitter: Blitter,
}

impl Gpu {
    fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.surface_config.width = new_size.width;
            self.surface_config.height = new_size.height;
            self.surface.configure(&self.device, &self.surface_config);
        }
    }

    fn render(&mut self) {
        let output = match self.surface.get_current_texture() {
            Ok(output) => output,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                // Reconfigure surface
                self.surface.configure(&self.device, &self.surface_config);
                self.window.request_redraw();
                return;
            }
            Err(e) => {
                tracing::warn!("Surface error: {:?}", e);
                return;
            }
        };

        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        self.blitter.render(&view);
        self.window.pre_present_notify();
        output.present();
    }
}

/// Event loop state for the canvas window
struct CanvasApp<H: CanvasHandler> {
    config: WindowConfig,
    handler: H,
    instance: wgpu::Instance,
    gpu: Option<Gpu>,
    frame: Rc<RefCell<Option<RgbaImage>>>,
    modifiers: ModifiersState,
    placements: WindowPlacements,
    failure: Option<anyhow::Error>,
}

impl<H: CanvasHandler> CanvasApp<H> {
    fn new(config: WindowConfig, handler: H) -> Self {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let placements = if config.autosave_name.is_some() {
            WindowPlacements::load()
        } else {
            WindowPlacements::default()
        };

        Self {
            config,
            handler,
            instance,
            gpu: None,
            frame: Rc::new(RefCell::new(None)),
            modifiers: ModifiersState::empty(),
            placements,
            failure: None,
        }
    }

    fn open(&mut self, event_loop: &ActiveEventLoop) -> anyhow::Result<Gpu> {
        let height = if self.config.footer {
            self.config.height + FOOTER_HEIGHT
        } else {
            self.config.height
        };
        let mut window_attrs = Window::default_attributes()
            .with_title(&self.config.title)
            .with_inner_size(LogicalSize::new(self.config.width, height))
            .with_window_icon(self.config.icon.clone());

        if let Some(placement) = self
            .config
            .autosave_name
            .as_deref()
            .and_then(|name| self.placements.get(name))
        {
            window_attrs = window_attrs.with_position(PhysicalPosition::new(placement.x, placement.y));
        }

        let window = Arc::new(event_loop.create_window(window_attrs)?);
        let surface = self.instance.create_surface(window.clone())?;
        let (device, queue, format) =
            pollster::block_on(init_with_surface(&self.instance, &surface))?;

        let size = window.inner_size();
        let surface_config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: wgpu::CompositeAlphaMode::Auto,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &surface_config);

        let blitter = Blitter::new(device.clone(), queue, format);

        Ok(Gpu {
            window,
            surface,
            surface_config,
            device,
            blitter,
        })
    }

    fn remember_placement(&mut self) {
        let (Some(name), Some(gpu)) = (self.config.autosave_name.as_deref(), &self.gpu) else {
            return;
        };
        let Ok(position) = gpu.window.outer_position() else {
            return;
        };
        self.placements.set(
            name,
            Placement {
                x: position.x,
                y: position.y,
            },
        );
        if let Err(e) = self.placements.save() {
            tracing::warn!("failed to save window placement: {}", e);
        }
    }

    fn close(&mut self, event_loop: &ActiveEventLoop) {
        self.remember_placement();
        event_loop.exit();
    }
}

impl<H: CanvasHandler> ApplicationHandler for CanvasApp<H> {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.gpu.is_some() {
            return;
        }

        let gpu = match self.open(event_loop) {
            Ok(gpu) => gpu,
            Err(e) => {
                self.failure = Some(e.context("Failed to open canvas window"));
                event_loop.exit();
                return;
            }
        };

        let canvas = CanvasWindow {
            window: gpu.window.clone(),
            frame: self.frame.clone(),
            footer: self.config.footer,
        };
        self.gpu = Some(gpu);
        self.handler.launched(canvas);
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                self.handler.closed();
                self.close(event_loop);
            }
            WindowEvent::Resized(new_size) => {
                if let Some(gpu) = &mut self.gpu {
                    gpu.resize(new_size);
                    gpu.window.request_redraw();
                }
            }
            WindowEvent::RedrawRequested => {
                if let Some(gpu) = &mut self.gpu {
                    if let Some(image) = self.frame.borrow_mut().take() {
                        gpu.blitter.upload(&image);
                    }
                    gpu.render();
                }
            }
            WindowEvent::ModifiersChanged(modifiers) => {
                self.modifiers = modifiers.state();
            }
            WindowEvent::KeyboardInput { event, .. } => {
                if event.state == ElementState::Pressed
                    && !event.repeat
                    && let Some(shortcut) = Shortcut::from_key(&event.logical_key, self.modifiers)
                {
                    tracing::debug!(?shortcut, "shortcut");
                    self.handler.shortcut(shortcut);
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.gpu.is_none() {
            return;
        }
        match self.handler.tick() {
            Flow::Poll => event_loop.set_control_flow(ControlFlow::Poll),
            Flow::Wait(timeout) => {
                event_loop.set_control_flow(ControlFlow::WaitUntil(Instant::now() + timeout));
            }
            Flow::Exit => self.close(event_loop),
        }
    }
}

/// Open the canvas window and drive `handler` until it exits or is closed
pub fn run_canvas_window<H: CanvasHandler>(config: WindowConfig, handler: H) -> anyhow::Result<()> {
    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Wait);

    let mut app = CanvasApp::new(config, handler);
    event_loop.run_app(&mut app)?;

    match app.failure {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

/// Canvas window controls help text
pub fn controls_help() -> &'static str {
    r"
Canvas Controls:
  Ctrl/Cmd + R  - Run the script again
  Ctrl/Cmd + E  - Save the canvas as a PNG next to the script
  Ctrl/Cmd + .  - Cancel the running export
"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_footer_is_appended() {
        let canvas = RgbaImage::from_pixel(10, 5, Rgba([1, 2, 3, 255]));
        let framed = with_footer(&canvas);
        assert_eq!(framed.dimensions(), (10, 5 + FOOTER_HEIGHT));
        assert_eq!(*framed.get_pixel(9, 4), Rgba([1, 2, 3, 255]));
        assert_eq!(*framed.get_pixel(0, 5), FOOTER_RULE);
        assert_eq!(*framed.get_pixel(0, 6 + 10), FOOTER_FILL);
    }

    #[test]
    fn test_shortcuts_need_a_command_modifier() {
        let r = Key::Character("r".into());
        assert_eq!(Shortcut::from_key(&r, ModifiersState::empty()), None);
        assert_eq!(
            Shortcut::from_key(&r, ModifiersState::CONTROL),
            Some(Shortcut::Rerun)
        );
        assert_eq!(
            Shortcut::from_key(&Key::Character("E".into()), ModifiersState::SUPER),
            Some(Shortcut::Export)
        );
        assert_eq!(
            Shortcut::from_key(&Key::Character(".".into()), ModifiersState::CONTROL),
            Some(Shortcut::Cancel)
        );
    }

    #[test]
    fn test_default_config() {
        let config = WindowConfig::default();
        assert_eq!((config.width, config.height), (500, 500));
        assert!(config.footer);
    }
}
