//! Easel Engine - runs drawing scripts, animates them and exports frames
//!
//! The `Sandbox` is a thin orchestration layer over easel-script and
//! easel-core. It never blocks for longer than one frame: exports are
//! opened with [`Sandbox::export`] and then advanced with
//! [`Sandbox::step_export`] from whatever loop owns the thread.
//!
//! ## Example
//!
//! ```ignore
//! use easel_engine::{ExportKind, Sandbox};
//!
//! let mut sandbox = Sandbox::new();
//! sandbox.set_script("sketch.rhai");
//! sandbox.set_source(std::fs::read_to_string("sketch.rhai")?);
//!
//! let report = sandbox.run();
//! println!("canvas: {:?}", report.canvas);
//!
//! sandbox.export(ExportKind::Movie, "sketch.gif".as_ref(), &serde_json::json!({"frames": 30}))?;
//! while sandbox.is_exporting() {
//!     for event in sandbox.step_export() {
//!         println!("{event:?}");
//!     }
//! }
//! ```

pub mod export;
pub mod session;

use easel_core::export::{ExportFormat, open_sink};
use easel_core::status::{OutputChunk, Status};
use easel_script::{Program, ScriptEngine};
use image::RgbaImage;
use serde_json::Value;
use std::path::{Path, PathBuf};

// Re-export commonly used types from dependencies
pub use easel_core::drawing::Drawing;
pub use easel_core::export::ExportKind;

// Re-export our own types
pub use export::ExportSettings;
pub use session::{ExportEvent, ExportSession, SessionHandle};

/// What a run produced
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub status: Status,
    /// Canvas size of the rendered frame, when the run succeeded
    pub canvas: Option<(u32, u32)>,
    /// Whether the script called `size()` itself
    pub size_declared: bool,
    /// Frame rate when the script is an animation
    pub animation: Option<f64>,
}

/// The script runtime
pub struct Sandbox {
    /// The underlying Rhai script executor
    scripting: ScriptEngine,

    script: Option<PathBuf>,
    source: String,
    metadata: Value,

    /// The program from the last successful run
    program: Option<Program>,

    /// The export in progress, if any
    session: Option<ExportSession>,
}

impl Sandbox {
    pub fn new() -> Self {
        Self {
            scripting: ScriptEngine::new(),
            script: None,
            source: String::new(),
            metadata: Value::Object(serde_json::Map::new()),
            program: None,
            session: None,
        }
    }

    // ========================================================================
    // Script
    // ========================================================================

    pub fn set_script(&mut self, path: impl Into<PathBuf>) {
        self.script = Some(path.into());
    }

    pub fn script(&self) -> Option<&Path> {
        self.script.as_deref()
    }

    pub fn set_source(&mut self, source: impl Into<String>) {
        self.source = source.into();
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Options the script sees as `OPTS`
    pub fn set_metadata(&mut self, metadata: Value) {
        self.metadata = metadata;
    }

    pub fn metadata(&self) -> &Value {
        &self.metadata
    }

    // ========================================================================
    // Running
    // ========================================================================

    /// Run the current source from the top and render its first frame
    ///
    /// A failed run leaves the previous program (and its frame) in place.
    pub fn run(&mut self) -> RunReport {
        let result = self.scripting.load(&self.source, &self.metadata);
        let mut output = self.scripting.take_output();

        match result {
            Ok(program) => {
                let report = RunReport {
                    status: Status::success(output),
                    canvas: Some(program.canvas_size()),
                    size_declared: program.size_declared(),
                    animation: program.is_animated().then(|| program.speed()).flatten(),
                };
                self.program = Some(program);
                report
            }
            Err(e) => {
                output.push(OutputChunk::stderr(format!("{e}\n")));
                RunReport {
                    status: Status::failure(output),
                    canvas: None,
                    size_declared: false,
                    animation: None,
                }
            }
        }
    }

    /// Render animation frame `frame` of the current program
    pub fn draw_frame(&mut self, frame: u32) -> Status {
        let Some(program) = self.program.as_mut() else {
            return Status::error("no script has run yet");
        };

        let result = program.render(&self.scripting, frame).map(|_| ());
        let mut output = self.scripting.take_output();
        match result {
            Ok(()) => Status::success(output),
            Err(e) => {
                output.push(OutputChunk::stderr(format!("{e}\n")));
                Status::failure(output)
            }
        }
    }

    /// The most recently rendered drawing
    pub fn drawing(&self) -> Option<&Drawing> {
        self.program.as_ref().map(|p| p.drawing())
    }

    /// Rasterize the most recently rendered drawing
    pub fn frame_image(&self) -> Option<RgbaImage> {
        let drawing = self.drawing()?;
        match drawing.rasterize() {
            Ok(image) => Some(image),
            Err(e) => {
                tracing::warn!("failed to rasterize frame: {}", e);
                None
            }
        }
    }

    pub fn canvas_size(&self) -> Option<(u32, u32)> {
        self.drawing().map(|d| d.size())
    }

    // ========================================================================
    // Export
    // ========================================================================

    /// Open an export session writing `kind` output to `path`
    ///
    /// The script is loaded afresh with `options` as its metadata. Errors
    /// that stop the export from starting come back as a failed status;
    /// everything later arrives through [`Sandbox::step_export`].
    pub fn export(&mut self, kind: ExportKind, path: &Path, options: &Value) -> Result<(), Status> {
        if self.session.is_some() {
            return Err(Status::error("an export is already running"));
        }

        let format = ExportFormat::from_path(path).ok_or_else(|| {
            Status::error(format!(
                "cannot export to {}: unknown file format",
                path.display()
            ))
        })?;

        self.metadata = options.clone();
        let loaded = self.scripting.load(&self.source, options);
        let mut output = self.scripting.take_output();
        let program = match loaded {
            Ok(program) => program,
            Err(e) => {
                output.push(OutputChunk::stderr(format!("{e}\n")));
                return Err(Status::failure(output));
            }
        };

        let settings = ExportSettings::from_options(options, program.speed());
        let (width, height) = program.canvas_size();
        let sink = match open_sink(kind, format, path, settings.frame_spec(width, height)) {
            Ok(sink) => sink,
            Err(e) => {
                output.push(OutputChunk::stderr(format!("{e}\n")));
                return Err(Status::failure(output));
            }
        };

        tracing::info!(
            kind = %kind,
            path = %path.display(),
            frames = settings.frames,
            "export started"
        );

        self.session = Some(ExportSession::new(
            kind,
            path.to_path_buf(),
            program,
            sink,
            settings,
            output,
        ));
        Ok(())
    }

    /// Advance the export in progress by one frame
    pub fn step_export(&mut self) -> Vec<ExportEvent> {
        let Some(session) = self.session.as_mut() else {
            return Vec::new();
        };

        let (events, finished) = session.step(&self.scripting);
        if finished {
            self.session = None;
        }
        events
    }

    /// The export in progress, if any
    pub fn session(&self) -> Option<&ExportSession> {
        self.session.as_ref()
    }

    pub fn is_exporting(&self) -> bool {
        self.session.is_some()
    }
}

impl Default for Sandbox {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sandbox_creation() {
        let sandbox = Sandbox::new();
        assert!(sandbox.drawing().is_none());
        assert!(!sandbox.is_exporting());
        assert!(sandbox.script().is_none());
    }

    #[test]
    fn test_run_reports_canvas() {
        let mut sandbox = Sandbox::new();
        sandbox.set_source("size(64, 48); print(\"hi\");");
        let report = sandbox.run();

        assert!(report.status.ok);
        assert_eq!(report.canvas, Some((64, 48)));
        assert!(report.size_declared);
        assert_eq!(report.animation, None);
        assert_eq!(report.status.output, vec![OutputChunk::stdout("hi\n")]);
    }

    #[test]
    fn test_failed_run_keeps_previous_frame() {
        let mut sandbox = Sandbox::new();
        sandbox.set_source("size(10, 10);");
        assert!(sandbox.run().status.ok);

        sandbox.set_source("size(");
        let report = sandbox.run();
        assert!(!report.status.ok);
        assert!(report.status.output[0].is_error);
        assert_eq!(sandbox.canvas_size(), Some((10, 10)));
    }

    #[test]
    fn test_animation_report() {
        let mut sandbox = Sandbox::new();
        sandbox.set_source("speed(12); fn draw(frame) { rect(frame, 0, 1, 1); }");
        let report = sandbox.run();
        assert_eq!(report.animation, Some(12.0));

        assert!(sandbox.draw_frame(4).ok);
        assert_eq!(sandbox.drawing().map(|d| d.shapes.len()), Some(1));
    }

    #[test]
    fn test_draw_frame_without_run() {
        let mut sandbox = Sandbox::new();
        assert!(!sandbox.draw_frame(1).ok);
    }

    #[test]
    fn test_export_unknown_format() {
        let mut sandbox = Sandbox::new();
        sandbox.set_source("");
        let result = sandbox.export(ExportKind::Image, Path::new("out.xyz"), &Value::Null);
        assert!(result.is_err());
        assert!(!sandbox.is_exporting());
    }
}
