//! The script controller: runs, animates and exports one script
//!
//! The controller owns the engine and talks to the outside world through
//! three injected handles: a [`Console`] for text, an optional [`Display`]
//! once a window exists, and the shared [`Lifecycle`]. Everything happens
//! on the loop thread; long work is spread across calls to
//! [`ScriptController::tick`].

use crate::console::Console;
use crate::lifecycle::Lifecycle;
use crate::options::{Mode, Options};
use anyhow::Context;
use easel_core::status::{OutputChunk, Status};
use easel_engine::{ExportEvent, ExportKind, RunReport, Sandbox, SessionHandle};
use easel_render::{CanvasWindow, FOOTER_HEIGHT};
use image::RgbaImage;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// How long the loop may sleep when nothing is scheduled
pub const IDLE_POLL: Duration = Duration::from_millis(50);

/// The script runtime as the controller sees it
pub trait Engine {
    fn set_script(&mut self, path: &Path);
    fn set_source(&mut self, source: String);
    fn set_metadata(&mut self, metadata: Value);

    /// Run from the top and render the first frame
    fn run(&mut self) -> RunReport;

    /// Render one animation frame of the last successful run
    fn draw_frame(&mut self, frame: u32) -> Status;

    /// The last rendered frame as pixels
    fn frame_image(&self) -> Option<RgbaImage>;

    /// Start exporting; a failure to start comes back as its status
    fn export(&mut self, kind: ExportKind, path: &Path, options: &Value) -> Result<(), Status>;

    /// Advance the running export by one frame
    fn step_export(&mut self) -> Vec<ExportEvent>;

    /// Cancellation handle of the running export
    fn session(&self) -> Option<SessionHandle>;
}

impl Engine for Sandbox {
    fn set_script(&mut self, path: &Path) {
        Sandbox::set_script(self, path);
    }

    fn set_source(&mut self, source: String) {
        Sandbox::set_source(self, source);
    }

    fn set_metadata(&mut self, metadata: Value) {
        Sandbox::set_metadata(self, metadata);
    }

    fn run(&mut self) -> RunReport {
        Sandbox::run(self)
    }

    fn draw_frame(&mut self, frame: u32) -> Status {
        Sandbox::draw_frame(self, frame)
    }

    fn frame_image(&self) -> Option<RgbaImage> {
        Sandbox::frame_image(self)
    }

    fn export(&mut self, kind: ExportKind, path: &Path, options: &Value) -> Result<(), Status> {
        Sandbox::export(self, kind, path, options)
    }

    fn step_export(&mut self) -> Vec<ExportEvent> {
        Sandbox::step_export(self)
    }

    fn session(&self) -> Option<SessionHandle> {
        Sandbox::session(self).map(|s| s.handle().clone())
    }
}

/// Where rendered frames are shown
pub trait Display {
    /// Resize the content area, footer included
    fn set_content_size(&self, width: u32, height: u32);
    fn show(&self, frame: RgbaImage);
    fn footer_visible(&self) -> bool;
}

impl Display for CanvasWindow {
    fn set_content_size(&self, width: u32, height: u32) {
        CanvasWindow::set_content_size(self, width, height);
    }

    fn show(&self, frame: RgbaImage) {
        self.present(frame);
    }

    fn footer_visible(&self) -> bool {
        CanvasWindow::footer_visible(self)
    }
}

/// What the controller needs from the loop next
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activity {
    /// Work is pending; tick again straight away
    Busy,
    /// Nothing due for this long
    Idle(Duration),
}

#[derive(Debug)]
struct Animation {
    interval: Duration,
    next_frame: u32,
    due: Instant,
}

pub struct ScriptController<E: Engine> {
    engine: E,
    options: Options,
    mode: Mode,
    lifecycle: Lifecycle,
    console: Console,
    display: Option<Box<dyn Display>>,
    has_run: bool,
    animation: Option<Animation>,
}

impl<E: Engine> ScriptController<E> {
    /// Bind the options and load the script text into the engine
    pub fn new(
        mut engine: E,
        options: Options,
        lifecycle: Lifecycle,
        console: Console,
    ) -> anyhow::Result<Self> {
        let source = read_source(options.file())?;
        engine.set_script(options.file());
        engine.set_source(source);

        Ok(Self {
            engine,
            mode: options.mode(),
            options,
            lifecycle,
            console,
            display: None,
            has_run: false,
            animation: None,
        })
    }

    /// Show frames in `display` from now on
    pub fn attach_display(&mut self, display: Box<dyn Display>) {
        self.display = Some(display);
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// The script text, read fresh from disk
    pub fn source(&self) -> anyhow::Result<String> {
        read_source(self.options.file())
    }

    pub fn is_animating(&self) -> bool {
        self.animation.is_some()
    }

    pub fn is_exporting(&self) -> bool {
        self.engine.session().is_some()
    }

    // ========================================================================
    // Running
    // ========================================================================

    /// Re-read the script and run it
    pub fn run(&mut self) {
        self.stop_animation();

        let source = match self.source() {
            Ok(source) => source,
            Err(e) => {
                self.console.echo(&[OutputChunk::stderr(format!("{e:#}\n"))]);
                return;
            }
        };
        self.engine.set_source(source);
        self.engine.set_metadata(self.options.to_metadata());

        let report = self.engine.run();
        self.console.echo(&report.status.output);
        if !report.status.ok {
            return;
        }

        // Scripts that never call size() get a window fitted to their canvas
        if !self.has_run {
            self.has_run = true;
            if let (Some(display), Some((width, height)), false) =
                (&self.display, report.canvas, report.size_declared)
            {
                let footer = if display.footer_visible() {
                    FOOTER_HEIGHT
                } else {
                    0
                };
                display.set_content_size(width, height + footer);
            }
        }
        self.show_frame();

        if let Some(fps) = report.animation {
            self.start_animation(fps);
        }
    }

    fn show_frame(&self) {
        if let Some(display) = &self.display
            && let Some(frame) = self.engine.frame_image()
        {
            display.show(frame);
        }
    }

    fn start_animation(&mut self, fps: f64) {
        let interval = Duration::from_secs_f64(1.0 / fps.clamp(0.1, 240.0));
        tracing::debug!(fps, "animation started");
        self.animation = Some(Animation {
            interval,
            next_frame: 2,
            due: Instant::now() + interval,
        });
    }

    pub fn stop_animation(&mut self) {
        if self.animation.take().is_some() {
            tracing::debug!("animation stopped");
        }
    }

    fn advance_animation(&mut self, now: Instant) {
        let Some(animation) = self.animation.as_mut() else {
            return;
        };
        if now < animation.due {
            return;
        }
        let frame = animation.next_frame;
        animation.next_frame += 1;
        animation.due += animation.interval;
        // Don't try to catch up after a stall
        if animation.due < now {
            animation.due = now + animation.interval;
        }

        let status = self.engine.draw_frame(frame);
        if status.has_output() {
            self.console.echo(&status.output);
        }
        if status.ok {
            self.show_frame();
        } else {
            self.stop_animation();
        }
    }

    // ========================================================================
    // Export
    // ========================================================================

    /// Export to the target named in the options
    pub fn export(&mut self) {
        let Some(target) = self.options.export().map(PathBuf::from) else {
            self.export_status(&Status::error("nothing to export to"));
            return;
        };
        let format = self.options.export_format().unwrap_or_default();
        let kind = ExportKind::for_format(format);
        let metadata = self.options.export_metadata();

        tracing::info!(
            kind = %kind,
            path = %target.display(),
            frames = ?self.options.frames(),
            fps = ?self.options.fps(),
            "exporting"
        );

        self.engine.set_metadata(metadata.clone());
        if let Err(status) = self.engine.export(kind, &target, &metadata) {
            self.export_status(&status);
        }
    }

    /// Export to `path` with `overrides` merged into the options
    pub fn export_with(&mut self, path: &Path, overrides: &Map<String, Value>) {
        self.stop_animation();
        self.options = self.options.merged(overrides).with_export(path);
        self.export();
    }

    /// Report export output; a failure ends a headless process
    pub fn export_status(&mut self, status: &Status) {
        if status.ok {
            self.console.echo(&status.output);
        } else {
            self.console.carriage_return();
            self.console.echo(&status.output);
            self.lifecycle.mark_failed();
            self.lifecycle.done(false);
        }
    }

    pub fn export_progress(&mut self, written: u32, total: u32, cancelled: bool) {
        self.console.progress(written, total, cancelled);
    }

    fn export_complete(&mut self, files: &[PathBuf]) {
        tracing::info!(files = files.len(), "export complete");
        self.console.erase();
        self.lifecycle.done(false);
    }

    /// Cancel whatever is running
    ///
    /// Cancels the export if there is one. Then a running animation is
    /// stopped, or failing that a windowed process quits.
    pub fn cancel(&mut self) {
        if let Some(handle) = self.engine.session() {
            handle.cancel();
        }

        if self.animation.is_some() {
            self.stop_animation();
        } else if self.mode == Mode::Windowed {
            self.lifecycle.done(true);
        }
    }

    /// Do the next slice of work: one export frame, or a due animation frame
    pub fn tick(&mut self) -> Activity {
        if self.engine.session().is_some() {
            for event in self.engine.step_export() {
                match event {
                    ExportEvent::Progress {
                        written,
                        total,
                        cancelled,
                    } => self.export_progress(written, total, cancelled),
                    ExportEvent::Status(status) => self.export_status(&status),
                    ExportEvent::Complete(files) => self.export_complete(&files),
                }
            }
            return Activity::Busy;
        }

        let now = Instant::now();
        self.advance_animation(now);
        match &self.animation {
            Some(animation) => {
                let until_due = animation.due.saturating_duration_since(now);
                Activity::Idle(until_due.min(IDLE_POLL))
            }
            None => Activity::Idle(IDLE_POLL),
        }
    }
}

fn read_source(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read script {}", path.display()))
}
