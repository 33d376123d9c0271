//! Integration tests for the script to canvas pipeline

// Tests are allowed to use expect/unwrap for cleaner error messages
#![allow(clippy::expect_used)]
#![allow(clippy::unwrap_used)]

use easel_script::{ScriptEngine, ScriptError};
use serde_json::json;

#[test]
fn script_to_pixels_pipeline() {
    let script = r#"
        size(40, 20);
        background(0, 0, 0);
        fill(0, 1.0, 0);
        rect(20, 0, 20, 20);
    "#;

    let engine = ScriptEngine::new();
    let program = engine
        .load(script, &json!({}))
        .expect("Script should evaluate");

    let image = program
        .drawing()
        .rasterize()
        .expect("Drawing should rasterize");

    assert_eq!(image.dimensions(), (40, 20));
    assert_eq!(image.get_pixel(5, 10).0, [0, 0, 0, 255]);
    assert_eq!(image.get_pixel(30, 10).0, [0, 255, 0, 255]);
}

#[test]
fn animation_moves_between_frames() {
    let script = r#"
        size(10, 1);
        speed(30);
        fn draw(frame) {
            background(1.0);
            fill(0);
            rect(frame - 1, 0, 1, 1);
        }
    "#;

    let engine = ScriptEngine::new();
    let mut program = engine.load(script, &json!({})).expect("Script should load");

    let first = program.drawing().rasterize().expect("frame 1");
    assert_eq!(first.get_pixel(0, 0).0, [0, 0, 0, 255]);

    let fifth = program
        .render(&engine, 5)
        .expect("frame 5")
        .rasterize()
        .expect("rasterize frame 5");
    assert_eq!(fifth.get_pixel(0, 0).0, [255, 255, 255, 255]);
    assert_eq!(fifth.get_pixel(4, 0).0, [0, 0, 0, 255]);
}

#[test]
fn errors_in_draw_name_the_function() {
    let script = r#"
        speed(1);
        fn draw(frame) {
            if frame > 1 { throw "late failure"; }
        }
    "#;

    let engine = ScriptEngine::new();
    let mut program = engine.load(script, &json!({})).expect("frame 1 is fine");
    let err = program.render(&engine, 2).expect_err("frame 2 throws");

    match err {
        ScriptError::Runtime(message) => {
            assert!(message.contains("draw()"));
            assert!(message.contains("late failure"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn syntax_and_top_level_errors_are_told_apart() {
    let engine = ScriptEngine::new();

    let err = engine.load("rect(0, 0,", &json!({})).err().expect("unclosed call");
    assert!(matches!(err, ScriptError::Compile(_)), "got {err:?}");

    let err = engine
        .load("size(10, 10); throw \"no canvas\";", &json!({}))
        .err()
        .expect("top level throws");
    match err {
        ScriptError::Runtime(message) => assert!(message.contains("no canvas")),
        other => panic!("unexpected error: {other:?}"),
    }
}
