//! Integration tests for frame-by-frame export

// Tests are allowed to use expect/unwrap for cleaner error messages
#![allow(clippy::expect_used)]
#![allow(clippy::unwrap_used)]

use easel_engine::{ExportEvent, ExportKind, Sandbox};
use serde_json::json;

fn drain(sandbox: &mut Sandbox) -> Vec<ExportEvent> {
    let mut events = Vec::new();
    // Bounded so a stuck session fails the test instead of hanging it
    for _ in 0..1000 {
        if !sandbox.is_exporting() {
            break;
        }
        events.extend(sandbox.step_export());
    }
    assert!(!sandbox.is_exporting(), "export never finished");
    events
}

#[test]
fn single_png_export() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("still.png");

    let mut sandbox = Sandbox::new();
    sandbox.set_source("size(30, 20); fill(1, 0, 0); rect(0, 0, 30, 20);");
    sandbox
        .export(ExportKind::Image, &path, &json!({"export": path}))
        .expect("export should start");

    let events = drain(&mut sandbox);
    assert_eq!(
        events,
        vec![
            ExportEvent::Progress {
                written: 1,
                total: 1,
                cancelled: false
            },
            ExportEvent::Complete(vec![path.clone()]),
        ]
    );

    let image = image::open(&path).unwrap().to_rgba8();
    assert_eq!(image.dimensions(), (30, 20));
    assert_eq!(image.get_pixel(15, 10).0, [255, 0, 0, 255]);
}

#[test]
fn numbered_sequence_reports_progress_and_output() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("seq.png");

    let mut sandbox = Sandbox::new();
    sandbox.set_source("size(8, 8); print(`frame ${FRAME}`);");
    sandbox
        .export(ExportKind::Image, &path, &json!({"frames": 3}))
        .unwrap();

    let events = drain(&mut sandbox);

    let progress: Vec<_> = events
        .iter()
        .filter_map(|e| match e {
            ExportEvent::Progress { written, total, .. } => Some((*written, *total)),
            _ => None,
        })
        .collect();
    assert_eq!(progress, vec![(1, 3), (2, 3), (3, 3)]);

    let printed: Vec<_> = events
        .iter()
        .filter_map(|e| match e {
            ExportEvent::Status(status) => Some(status.output[0].text.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(printed, vec!["frame 1\n", "frame 2\n", "frame 3\n"]);

    match events.last() {
        Some(ExportEvent::Complete(files)) => {
            assert_eq!(files.len(), 3);
            assert!(dir.path().join("seq-0003.png").exists());
        }
        other => panic!("expected completion, got {other:?}"),
    }
}

#[test]
fn gif_movie_export() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("anim.gif");

    let mut sandbox = Sandbox::new();
    sandbox.set_source("size(16, 16); speed(10); fn draw(frame) { rect(frame, frame, 4, 4); }");
    sandbox
        .export(ExportKind::Movie, &path, &json!({"frames": 5}))
        .unwrap();

    let events = drain(&mut sandbox);
    assert!(matches!(events.last(), Some(ExportEvent::Complete(_))));
    assert!(std::fs::metadata(&path).unwrap().len() > 0);
}

#[test]
fn cancelling_ends_the_session() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("long.png");

    let mut sandbox = Sandbox::new();
    sandbox.set_source("size(4, 4);");
    sandbox
        .export(ExportKind::Image, &path, &json!({"frames": 100}))
        .unwrap();

    sandbox.step_export();
    sandbox.session().expect("session is running").cancel();

    let events = sandbox.step_export();
    assert!(!sandbox.is_exporting());
    assert_eq!(
        events[0],
        ExportEvent::Progress {
            written: 1,
            total: 100,
            cancelled: true
        }
    );
    match &events[1] {
        ExportEvent::Status(status) => assert!(!status.ok),
        other => panic!("expected a failed status, got {other:?}"),
    }
}

#[test]
fn script_error_fails_the_export() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.png");

    let mut sandbox = Sandbox::new();
    sandbox.set_source("if FRAME == 2 { throw \"bad frame\"; }");
    sandbox
        .export(ExportKind::Image, &path, &json!({"frames": 3}))
        .unwrap();

    let events = drain(&mut sandbox);
    let failure = events.iter().find_map(|e| match e {
        ExportEvent::Status(status) if !status.ok => Some(status),
        _ => None,
    });
    let failure = failure.expect("a failed status");
    assert!(failure.output.iter().any(|c| c.text.contains("bad frame")));
    assert!(!events.iter().any(|e| matches!(e, ExportEvent::Complete(_))));
}

#[test]
fn load_errors_prevent_the_session() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("never.png");

    let mut sandbox = Sandbox::new();
    sandbox.set_source("rect(");
    let status = sandbox
        .export(ExportKind::Image, &path, &json!({}))
        .expect_err("syntax error");

    assert!(!status.ok);
    assert!(!sandbox.is_exporting());
    assert!(!path.exists());
}

#[test]
fn first_frame_near_the_top_of_the_range() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("late.png");

    let mut sandbox = Sandbox::new();
    sandbox.set_source("size(4, 4); print(`frame ${FRAME}`);");
    sandbox
        .export(ExportKind::Image, &path, &json!({"first": 4_294_967_295_u64, "frames": 2}))
        .unwrap();

    let events = drain(&mut sandbox);
    let printed: Vec<_> = events
        .iter()
        .filter_map(|e| match e {
            ExportEvent::Status(status) => status.output.last().map(|c| c.text.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(printed, vec!["frame 4294967294\n", "frame 4294967295\n"]);
    assert!(matches!(events.last(), Some(ExportEvent::Complete(files)) if files.len() == 2));
}
