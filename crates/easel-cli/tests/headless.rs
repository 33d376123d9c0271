//! Headless launches against the real script engine

// Tests are allowed to use expect/unwrap for cleaner error messages
#![allow(clippy::expect_used)]
#![allow(clippy::unwrap_used)]

use easel_cli::console::CaptureBuffer;
use easel_cli::{Console, InterruptWatcher, Mode, Options};
use serde_json::json;
use std::io::Cursor;
use std::path::Path;

struct Launch {
    code: u8,
    out: CaptureBuffer,
    err: CaptureBuffer,
}

fn launch(script: &Path, source: &str, options: serde_json::Value, stdin: &'static str) -> Launch {
    std::fs::write(script, source).unwrap();

    let mut line = json!({"file": script});
    line.as_object_mut()
        .unwrap()
        .extend(options.as_object().unwrap().clone());
    let options = Options::parse_line(&line.to_string()).unwrap();
    assert_eq!(options.mode(), Mode::Headless);

    let (console, out, err) = Console::captured();
    let interrupts = InterruptWatcher::from_reader(Cursor::new(stdin));
    let code = easel_cli::launch(options, interrupts, console).expect("launch");
    Launch { code, out, err }
}

#[test]
fn png_export_finishes_and_exits_cleanly() {
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("out.png");

    let result = launch(
        &dir.path().join("a.rhai"),
        "size(40, 30); background(0, 0, 1); print(OPTS.format);",
        json!({"export": target}),
        "",
    );

    assert_eq!(result.code, 0);
    assert_eq!(result.out.contents(), "png\n");
    assert!(result.err.contents().contains("Finishing export…"));

    let image = image::open(&target).unwrap().to_rgba8();
    assert_eq!(image.dimensions(), (40, 30));
    assert_eq!(image.get_pixel(0, 0).0, [0, 0, 255, 255]);
}

#[test]
fn frames_print_in_order_with_progress() {
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("seq.png");

    let result = launch(
        &dir.path().join("a.rhai"),
        "size(8, 8); print(`frame ${FRAME}`);",
        json!({"export": target, "frames": 4}),
        "",
    );

    assert_eq!(result.code, 0);
    assert_eq!(result.out.contents(), "frame 1\nframe 2\nframe 3\nframe 4\n");
    let err = result.err.contents();
    assert!(err.contains("Generating 4 frames [#####...............]"));
    assert!(err.contains("Generating 4 frames [###############.....]"));
    assert!(dir.path().join("seq-0004.png").exists());
}

#[test]
fn gif_export_writes_a_movie() {
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("anim.gif");

    let result = launch(
        &dir.path().join("a.rhai"),
        "size(12, 12); speed(10); fn draw(frame) { rect(frame, 0, 2, 2); }",
        json!({"export": target, "frames": 3}),
        "",
    );

    assert_eq!(result.code, 0);
    assert!(target.exists());
    assert!(!dir.path().join("anim-0001.gif").exists());
}

#[test]
fn script_errors_fail_the_process() {
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("never.png");

    let result = launch(
        &dir.path().join("a.rhai"),
        "throw \"no canvas today\";",
        json!({"export": target}),
        "",
    );

    assert_eq!(result.code, 1);
    assert!(result.err.contents().contains("no canvas today"));
    assert!(!target.exists());
}

#[test]
fn cancel_line_stops_a_long_export() {
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("long.png");

    let result = launch(
        &dir.path().join("a.rhai"),
        "size(64, 64); rect(0, 0, FRAME % 64, 10);",
        json!({"export": target, "frames": 2000}),
        "CANCEL\n",
    );

    assert_eq!(result.code, 1);
    let err = result.err.contents();
    assert!(err.contains("Cancelling export…"));
    assert!(err.contains("Export cancelled"));
    assert!(!dir.path().join("long-2000.png").exists());
}

#[test]
fn missing_script_is_an_error() {
    let options =
        Options::parse_line(r#"{"file": "/nonexistent/script.rhai", "export": "out.png"}"#).unwrap();
    let (console, _, _) = Console::captured();
    let result = easel_cli::launch(options, InterruptWatcher::from_reader(Cursor::new("")), console);
    assert!(result.is_err());
}
