//! Easel Script - Rhai drawing scripts
//!
//! Scripts draw onto a canvas through a small immediate-mode API and may
//! define a `draw(frame)` function to animate.
//!
//! ## Example Script
//!
//! ```rhai
//! size(300, 200);
//! background(0.1, 0.1, 0.15);
//!
//! fill(1.0, 0.4, 0.2);
//! oval(100, 50, 100, 100);
//!
//! print(`canvas for ${OPTS.file}`);
//! ```
//!
//! ## Animation
//!
//! ```rhai
//! size(200, 200);
//! speed(24);
//!
//! fn draw(frame) {
//!     fill(0.2, 0.6, 1.0);
//!     rect(frame * 2, 80, 40, 40);
//! }
//! ```
//!
//! Functions cannot read top-level variables (Rhai functions are pure), so
//! anything `draw` needs must come from its `frame` argument or be
//! recomputed inside it.

pub mod canvas_api;
pub mod engine;

mod error;

pub use canvas_api::{CanvasState, begin_canvas, finish_canvas, register_canvas_api};
pub use engine::{Program, ScriptEngine};
pub use error::ScriptError;

// Re-export for convenience
pub use easel_core::drawing::{Color, Drawing};
pub use easel_core::status::OutputChunk;
