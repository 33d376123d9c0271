//! Drawings: a canvas size, a background and an ordered list of shapes
//!
//! A `Drawing` is what one evaluation of a script produces. It is a plain
//! value, so the sandbox can hand it to the window or to a frame sink
//! without sharing any script state.

use crate::{Error, Result};
use image::{Rgba, RgbaImage};
use tiny_skia::{FillRule, Paint, Path, PathBuilder, Pixmap, Rect, Stroke, Transform};

/// Canvas edge length used when a script never calls `size()`
pub const DEFAULT_CANVAS_SIZE: u32 = 500;

/// RGBA color with straight components in `0.0..=1.0`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const WHITE: Self = Self::rgb(1.0, 1.0, 1.0);
    pub const BLACK: Self = Self::rgb(0.0, 0.0, 0.0);

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Bytes as written to an 8-bit RGBA image
    pub fn to_rgba8(self) -> [u8; 4] {
        let byte = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        [byte(self.r), byte(self.g), byte(self.b), byte(self.a)]
    }

    fn to_skia(self) -> tiny_skia::Color {
        tiny_skia::Color::from_rgba(
            self.r.clamp(0.0, 1.0),
            self.g.clamp(0.0, 1.0),
            self.b.clamp(0.0, 1.0),
            self.a.clamp(0.0, 1.0),
        )
        .unwrap_or(tiny_skia::Color::BLACK)
    }
}

/// Outline of a shape in canvas pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Geometry {
    Rect { x: f32, y: f32, width: f32, height: f32 },
    Oval { x: f32, y: f32, width: f32, height: f32 },
    Line { x1: f32, y1: f32, x2: f32, y2: f32 },
}

/// A geometry plus the paint state that was current when it was drawn
#[derive(Debug, Clone, PartialEq)]
pub struct Shape {
    pub geometry: Geometry,
    pub fill: Option<Color>,
    pub stroke: Option<Color>,
    pub stroke_width: f32,
}

impl Shape {
    pub fn new(geometry: Geometry) -> Self {
        Self {
            geometry,
            fill: None,
            stroke: None,
            stroke_width: 1.0,
        }
    }

    pub fn rect(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self::new(Geometry::Rect {
            x,
            y,
            width,
            height,
        })
    }

    pub fn oval(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self::new(Geometry::Oval {
            x,
            y,
            width,
            height,
        })
    }

    pub fn line(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self::new(Geometry::Line { x1, y1, x2, y2 })
    }

    pub fn with_fill(mut self, color: Color) -> Self {
        self.fill = Some(color);
        self
    }

    pub fn with_stroke(mut self, color: Color, width: f32) -> Self {
        self.stroke = Some(color);
        self.stroke_width = width;
        self
    }

    fn path(&self) -> Option<Path> {
        match self.geometry {
            Geometry::Rect {
                x,
                y,
                width,
                height,
            } => Rect::from_xywh(x, y, width, height).map(PathBuilder::from_rect),
            Geometry::Oval {
                x,
                y,
                width,
                height,
            } => Rect::from_xywh(x, y, width, height).and_then(PathBuilder::from_oval),
            Geometry::Line { x1, y1, x2, y2 } => {
                let mut pb = PathBuilder::new();
                pb.move_to(x1, y1);
                pb.line_to(x2, y2);
                pb.finish()
            }
        }
    }

    fn paint_onto(&self, pixmap: &mut Pixmap) {
        // Degenerate geometry (zero or negative extent) draws nothing
        let Some(path) = self.path() else {
            return;
        };

        let is_line = matches!(self.geometry, Geometry::Line { .. });
        if let Some(fill) = self.fill.filter(|_| !is_line) {
            let mut paint = Paint::default();
            paint.set_color(fill.to_skia());
            paint.anti_alias = true;
            pixmap.fill_path(&path, &paint, FillRule::Winding, Transform::identity(), None);
        }

        if let Some(stroke) = self.stroke
            && self.stroke_width > 0.0
        {
            let mut paint = Paint::default();
            paint.set_color(stroke.to_skia());
            paint.anti_alias = true;
            let style = Stroke {
                width: self.stroke_width,
                ..Stroke::default()
            };
            pixmap.stroke_path(&path, &paint, &style, Transform::identity(), None);
        }
    }
}

/// Everything one frame of a script put on the canvas
#[derive(Debug, Clone, PartialEq)]
pub struct Drawing {
    pub width: u32,
    pub height: u32,
    /// `None` leaves the canvas transparent
    pub background: Option<Color>,
    pub shapes: Vec<Shape>,
}

impl Default for Drawing {
    fn default() -> Self {
        Self::new(DEFAULT_CANVAS_SIZE, DEFAULT_CANVAS_SIZE)
    }
}

impl Drawing {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            background: Some(Color::WHITE),
            shapes: Vec::new(),
        }
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn push(&mut self, shape: Shape) {
        self.shapes.push(shape);
    }

    /// Rasterize into an 8-bit straight-alpha RGBA image
    pub fn rasterize(&self) -> Result<RgbaImage> {
        let mut pixmap = Pixmap::new(self.width, self.height).ok_or_else(|| {
            Error::InvalidParameter(format!(
                "canvas size {}x{} cannot be drawn",
                self.width, self.height
            ))
        })?;

        if let Some(background) = self.background {
            pixmap.fill(background.to_skia());
        }

        for shape in &self.shapes {
            shape.paint_onto(&mut pixmap);
        }

        let mut image = RgbaImage::new(self.width, self.height);
        for (dst, src) in image.pixels_mut().zip(pixmap.pixels()) {
            let c = src.demultiply();
            *dst = Rgba([c.red(), c.green(), c.blue(), c.alpha()]);
        }

        Ok(image)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_bytes() {
        assert_eq!(Color::WHITE.to_rgba8(), [255, 255, 255, 255]);
        assert_eq!(Color::rgba(2.0, -1.0, 0.5, 0.0).to_rgba8(), [255, 0, 128, 0]);
    }

    #[test]
    fn test_default_drawing() {
        let drawing = Drawing::default();
        assert_eq!(drawing.size(), (DEFAULT_CANVAS_SIZE, DEFAULT_CANVAS_SIZE));
        assert_eq!(drawing.background, Some(Color::WHITE));
    }

    #[test]
    fn test_rasterize_background_and_rect() {
        let mut drawing = Drawing::new(20, 10);
        drawing.background = Some(Color::BLACK);
        drawing.push(Shape::rect(0.0, 0.0, 10.0, 10.0).with_fill(Color::rgb(1.0, 0.0, 0.0)));

        let image = drawing.rasterize().unwrap();
        assert_eq!(image.dimensions(), (20, 10));
        assert_eq!(image.get_pixel(5, 5).0, [255, 0, 0, 255]);
        assert_eq!(image.get_pixel(15, 5).0, [0, 0, 0, 255]);
    }

    #[test]
    fn test_transparent_background() {
        let mut drawing = Drawing::new(4, 4);
        drawing.background = None;
        let image = drawing.rasterize().unwrap();
        assert_eq!(image.get_pixel(1, 1).0[3], 0);
    }

    #[test]
    fn test_degenerate_shape_is_skipped() {
        let mut drawing = Drawing::new(8, 8);
        drawing.push(Shape::oval(2.0, 2.0, -4.0, 0.0).with_fill(Color::BLACK));
        let image = drawing.rasterize().unwrap();
        assert_eq!(image.get_pixel(2, 2).0, [255, 255, 255, 255]);
    }

    #[test]
    fn test_zero_sized_canvas_fails() {
        let drawing = Drawing::new(0, 10);
        assert!(drawing.rasterize().is_err());
    }
}
