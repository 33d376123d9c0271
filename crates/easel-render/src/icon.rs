//! Application icon, drawn with the canvas model itself

use easel_core::drawing::{Color, Drawing, Shape};
use winit::window::Icon;

const ICON_SIZE: u32 = 64;

/// The window icon shown in the title bar and task switcher
pub fn app_icon() -> Option<Icon> {
    let image = icon_drawing().rasterize().ok()?;
    let (width, height) = image.dimensions();
    Icon::from_rgba(image.into_raw(), width, height).ok()
}

fn icon_drawing() -> Drawing {
    let size = ICON_SIZE as f32;
    let mut drawing = Drawing::new(ICON_SIZE, ICON_SIZE);
    drawing.background = Some(Color::rgb(0.11, 0.13, 0.2));

    // Easel legs
    let leg = Color::rgb(0.85, 0.65, 0.4);
    drawing.push(Shape::line(size * 0.3, size * 0.9, size * 0.5, size * 0.1).with_stroke(leg, 4.0));
    drawing.push(Shape::line(size * 0.7, size * 0.9, size * 0.5, size * 0.1).with_stroke(leg, 4.0));

    // Canvas board
    drawing.push(
        Shape::rect(size * 0.2, size * 0.2, size * 0.6, size * 0.45)
            .with_fill(Color::rgb(0.97, 0.96, 0.92))
            .with_stroke(leg, 2.0),
    );
    drawing.push(
        Shape::oval(size * 0.38, size * 0.3, size * 0.24, size * 0.24)
            .with_fill(Color::rgb(0.95, 0.4, 0.25)),
    );
    drawing
}
