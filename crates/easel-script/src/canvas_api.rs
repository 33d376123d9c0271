//! Rhai API for drawing onto the canvas
//!
//! Drawing calls accumulate into a thread-local canvas, the same way the
//! paint state (fill, stroke) carries over from one call to the next.
//! `begin_canvas` resets it before an evaluation and `finish_canvas`
//! collects the result afterwards.

use easel_core::drawing::{Color, DEFAULT_CANVAS_SIZE, Drawing, Shape};
use rhai::{Dynamic, Engine, EvalAltResult};
use std::cell::RefCell;

type ApiResult<T> = Result<T, Box<EvalAltResult>>;

/// Canvas and paint state accumulated while a script runs
#[derive(Debug, Clone)]
pub struct CanvasState {
    pub drawing: Drawing,
    pub fill: Option<Color>,
    pub stroke: Option<Color>,
    pub stroke_width: f32,
    /// Set when the script called `size()`
    pub size: Option<(u32, u32)>,
    /// Set when the script called `speed()`
    pub speed: Option<f64>,
}

impl Default for CanvasState {
    fn default() -> Self {
        Self {
            drawing: Drawing::default(),
            fill: Some(Color::BLACK),
            stroke: None,
            stroke_width: 1.0,
            size: None,
            speed: None,
        }
    }
}

thread_local! {
    static CANVAS: RefCell<CanvasState> = RefCell::new(CanvasState::default());
}

/// Reset the canvas before an evaluation
///
/// `size` and `speed` carry values declared by an earlier top-level run
/// into the frames drawn by `draw()`.
pub fn begin_canvas(size: Option<(u32, u32)>, speed: Option<f64>) {
    CANVAS.with(|canvas| {
        let mut state = CanvasState {
            size,
            speed,
            ..CanvasState::default()
        };
        if let Some((width, height)) = size {
            state.drawing = Drawing::new(width, height);
        }
        *canvas.borrow_mut() = state;
    });
}

/// Take the canvas produced by the last evaluation
pub fn finish_canvas() -> CanvasState {
    CANVAS.with(|canvas| canvas.replace(CanvasState::default()))
}

fn with_canvas<T>(f: impl FnOnce(&mut CanvasState) -> T) -> T {
    CANVAS.with(|canvas| f(&mut canvas.borrow_mut()))
}

/// Read a script number; Rhai keeps integer and float literals apart
fn num(value: &Dynamic, what: &str) -> ApiResult<f32> {
    if let Ok(f) = value.as_float() {
        return Ok(f as f32);
    }
    if let Ok(i) = value.as_int() {
        return Ok(i as f32);
    }
    Err(format!("{what} must be a number, not {}", value.type_name()).into())
}

fn color(r: &Dynamic, g: &Dynamic, b: &Dynamic, a: &Dynamic) -> ApiResult<Color> {
    Ok(Color::rgba(
        num(r, "red")?,
        num(g, "green")?,
        num(b, "blue")?,
        num(a, "alpha")?,
    ))
}

fn opaque() -> Dynamic {
    Dynamic::from_float(1.0)
}

fn push_shape(mut shape: Shape) {
    with_canvas(|canvas| {
        shape.fill = canvas.fill;
        shape.stroke = canvas.stroke;
        shape.stroke_width = canvas.stroke_width;
        canvas.drawing.push(shape);
    });
}

// ============================================================================
// Canvas Settings
// ============================================================================

fn size(width: Dynamic, height: Dynamic) -> ApiResult<()> {
    let width = num(&width, "width")?;
    let height = num(&height, "height")?;
    if width < 1.0 || height < 1.0 {
        return Err(format!("size({width}, {height}): canvas must be at least 1x1").into());
    }

    let (width, height) = (width as u32, height as u32);
    with_canvas(|canvas| {
        canvas.drawing.width = width;
        canvas.drawing.height = height;
        canvas.size = Some((width, height));
    });
    Ok(())
}

fn speed(fps: Dynamic) -> ApiResult<()> {
    let fps = num(&fps, "speed")?;
    if fps <= 0.0 {
        return Err(format!("speed({fps}): frame rate must be positive").into());
    }
    with_canvas(|canvas| canvas.speed = Some(f64::from(fps)));
    Ok(())
}

fn background(c: Color) {
    with_canvas(|canvas| canvas.drawing.background = Some(c));
}

// ============================================================================
// Shapes
// ============================================================================

fn rect(x: Dynamic, y: Dynamic, w: Dynamic, h: Dynamic) -> ApiResult<()> {
    push_shape(Shape::rect(
        num(&x, "x")?,
        num(&y, "y")?,
        num(&w, "width")?,
        num(&h, "height")?,
    ));
    Ok(())
}

fn oval(x: Dynamic, y: Dynamic, w: Dynamic, h: Dynamic) -> ApiResult<()> {
    push_shape(Shape::oval(
        num(&x, "x")?,
        num(&y, "y")?,
        num(&w, "width")?,
        num(&h, "height")?,
    ));
    Ok(())
}

fn line(x1: Dynamic, y1: Dynamic, x2: Dynamic, y2: Dynamic) -> ApiResult<()> {
    push_shape(Shape::line(
        num(&x1, "x1")?,
        num(&y1, "y1")?,
        num(&x2, "x2")?,
        num(&y2, "y2")?,
    ));
    Ok(())
}

/// Register all canvas functions with a Rhai engine
pub fn register_canvas_api(engine: &mut Engine) {
    engine.register_fn("size", size);
    engine.register_fn("speed", speed);

    // background / fill / stroke take gray, rgb or rgba
    engine.register_fn("background", |g: Dynamic| -> ApiResult<()> {
        background(color(&g, &g, &g, &opaque())?);
        Ok(())
    });
    engine.register_fn(
        "background",
        |r: Dynamic, g: Dynamic, b: Dynamic| -> ApiResult<()> {
            background(color(&r, &g, &b, &opaque())?);
            Ok(())
        },
    );
    engine.register_fn(
        "background",
        |r: Dynamic, g: Dynamic, b: Dynamic, a: Dynamic| -> ApiResult<()> {
            background(color(&r, &g, &b, &a)?);
            Ok(())
        },
    );

    engine.register_fn("fill", |g: Dynamic| -> ApiResult<()> {
        let c = color(&g, &g, &g, &opaque())?;
        with_canvas(|canvas| canvas.fill = Some(c));
        Ok(())
    });
    engine.register_fn("fill", |r: Dynamic, g: Dynamic, b: Dynamic| -> ApiResult<()> {
        let c = color(&r, &g, &b, &opaque())?;
        with_canvas(|canvas| canvas.fill = Some(c));
        Ok(())
    });
    engine.register_fn(
        "fill",
        |r: Dynamic, g: Dynamic, b: Dynamic, a: Dynamic| -> ApiResult<()> {
            let c = color(&r, &g, &b, &a)?;
            with_canvas(|canvas| canvas.fill = Some(c));
            Ok(())
        },
    );
    engine.register_fn("nofill", || with_canvas(|canvas| canvas.fill = None));

    engine.register_fn("stroke", |g: Dynamic| -> ApiResult<()> {
        let c = color(&g, &g, &g, &opaque())?;
        with_canvas(|canvas| canvas.stroke = Some(c));
        Ok(())
    });
    engine.register_fn(
        "stroke",
        |r: Dynamic, g: Dynamic, b: Dynamic| -> ApiResult<()> {
            let c = color(&r, &g, &b, &opaque())?;
            with_canvas(|canvas| canvas.stroke = Some(c));
            Ok(())
        },
    );
    engine.register_fn(
        "stroke",
        |r: Dynamic, g: Dynamic, b: Dynamic, a: Dynamic| -> ApiResult<()> {
            let c = color(&r, &g, &b, &a)?;
            with_canvas(|canvas| canvas.stroke = Some(c));
            Ok(())
        },
    );
    engine.register_fn("nostroke", || with_canvas(|canvas| canvas.stroke = None));
    engine.register_fn("strokewidth", |w: Dynamic| -> ApiResult<()> {
        let w = num(&w, "stroke width")?;
        with_canvas(|canvas| canvas.stroke_width = w.max(0.0));
        Ok(())
    });

    engine.register_fn("rect", rect);
    engine.register_fn("oval", oval);
    engine.register_fn("line", line);

    // Canvas queries
    engine.register_fn("canvas_width", || {
        with_canvas(|canvas| i64::from(canvas.drawing.width))
    });
    engine.register_fn("canvas_height", || {
        with_canvas(|canvas| i64::from(canvas.drawing.height))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use easel_core::drawing::Geometry;

    fn run(script: &str) -> Result<CanvasState, Box<EvalAltResult>> {
        let mut engine = Engine::new();
        register_canvas_api(&mut engine);
        begin_canvas(None, None);
        engine.run(script)?;
        Ok(finish_canvas())
    }

    #[test]
    fn test_defaults() {
        let state = run("").unwrap();
        assert_eq!(state.drawing.size(), (DEFAULT_CANVAS_SIZE, DEFAULT_CANVAS_SIZE));
        assert!(state.size.is_none());
        assert!(state.speed.is_none());
        assert_eq!(state.fill, Some(Color::BLACK));
    }

    #[test]
    fn test_size_and_speed() {
        let state = run("size(320, 240.0); speed(12);").unwrap();
        assert_eq!(state.drawing.size(), (320, 240));
        assert_eq!(state.size, Some((320, 240)));
        assert_eq!(state.speed, Some(12.0));
    }

    #[test]
    fn test_shapes_capture_paint_state() {
        let state = run(
            r#"
            fill(1.0, 0, 0);
            rect(0, 0, 10, 10);
            nofill();
            stroke(0.5);
            strokewidth(3);
            oval(1.5, 2.5, 4, 4);
            line(0, 0, 5, 5);
            "#,
        )
        .unwrap();

        let shapes = &state.drawing.shapes;
        assert_eq!(shapes.len(), 3);
        assert_eq!(shapes[0].fill, Some(Color::rgb(1.0, 0.0, 0.0)));
        assert_eq!(shapes[0].stroke, None);
        assert_eq!(shapes[1].fill, None);
        assert_eq!(shapes[1].stroke, Some(Color::rgb(0.5, 0.5, 0.5)));
        assert_eq!(shapes[1].stroke_width, 3.0);
        assert!(matches!(
            shapes[1].geometry,
            Geometry::Oval { x, y, .. } if x == 1.5 && y == 2.5
        ));
        assert!(matches!(shapes[2].geometry, Geometry::Line { .. }));
    }

    #[test]
    fn test_background_overloads() {
        let gray = run("background(0.5);").unwrap();
        assert_eq!(gray.drawing.background, Some(Color::rgb(0.5, 0.5, 0.5)));

        let rgba = run("background(1, 0, 0, 0.25);").unwrap();
        assert_eq!(rgba.drawing.background, Some(Color::rgba(1.0, 0.0, 0.0, 0.25)));
    }

    #[test]
    fn test_rejects_bad_arguments() {
        assert!(run(r#"rect("a", 0, 1, 1);"#).is_err());
        assert!(run("size(0, 10);").is_err());
        assert!(run("speed(-1);").is_err());
    }

    #[test]
    fn test_begin_keeps_declared_size() {
        begin_canvas(Some((64, 32)), Some(5.0));
        let state = finish_canvas();
        assert_eq!(state.drawing.size(), (64, 32));
        assert_eq!(state.speed, Some(5.0));
    }
}
