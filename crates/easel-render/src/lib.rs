//! Easel Render - the canvas window
//!
//! A winit window that shows the latest rendered canvas, optionally with a
//! status footer strip beneath it. All application logic lives in a
//! [`CanvasHandler`] which the window calls back on the event loop thread.
//!
//! ## Example
//!
//! ```rust,ignore
//! use easel_render::{CanvasHandler, CanvasWindow, Flow, WindowConfig, run_canvas_window};
//!
//! struct Viewer;
//!
//! impl CanvasHandler for Viewer {
//!     fn launched(&mut self, window: CanvasWindow) {
//!         window.present(image::RgbaImage::new(200, 200));
//!     }
//!     fn tick(&mut self) -> Flow {
//!         Flow::Wait(std::time::Duration::from_millis(50))
//!     }
//!     fn closed(&mut self) {}
//! }
//!
//! run_canvas_window(WindowConfig::default(), Viewer)?;
//! ```

mod blit;
pub mod icon;
pub mod placement;
pub mod window;

pub use icon::app_icon;
pub use placement::{Placement, WindowPlacements};
pub use window::{
    CanvasHandler, CanvasWindow, FOOTER_HEIGHT, Flow, Shortcut, WindowConfig, controls_help,
    run_canvas_window,
};

// Re-export so callers can pass icons without depending on winit
pub use winit::window::Icon;
