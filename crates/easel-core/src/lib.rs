//! # Easel Core
//!
//! The canvas model shared by the script engine, the sandbox and the
//! window: colors, shapes, drawings and their rasterization, plus the
//! frame sinks used to export still images and movies.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use easel_core::prelude::*;
//!
//! let mut drawing = Drawing::new(200, 100);
//! drawing.push(Shape::rect(10.0, 10.0, 50.0, 50.0).with_fill(Color::rgb(1.0, 0.0, 0.0)));
//! let image = drawing.rasterize()?;
//! image.save("out.png")?;
//! ```
//!
//! ## Conventions
//!
//! - **Coordinates**: pixels, origin at the top-left corner, Y down
//! - **Colors**: straight (non-premultiplied) components in `0.0..=1.0`

pub mod drawing;
pub mod export;
pub mod status;

mod error;

pub use error::{Error, Result};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::drawing::{Color, DEFAULT_CANVAS_SIZE, Drawing, Geometry, Shape};
    pub use crate::export::{ExportFormat, ExportKind, FrameSink, FrameSpec, open_sink};
    pub use crate::status::{OutputChunk, Status};
    pub use crate::{Error, Result};
}
