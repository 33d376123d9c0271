//! Export sessions - one in-progress export, advanced a frame at a time

use crate::export::ExportSettings;
use easel_core::export::{ExportKind, FrameSink};
use easel_core::status::{OutputChunk, Status};
use easel_script::{Program, ScriptEngine};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Cancellation flag for an export session
///
/// Cancelling is advisory: the session notices the flag before its next
/// frame and winds down from there.
#[derive(Debug, Clone, Default)]
pub struct SessionHandle {
    cancelled: Arc<AtomicBool>,
}

impl SessionHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Something that happened while advancing an export
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportEvent {
    /// Frames written so far
    Progress {
        written: u32,
        total: u32,
        cancelled: bool,
    },
    /// Script output, or the failure that ended the export
    Status(Status),
    /// Every frame was written; carries the files produced
    Complete(Vec<PathBuf>),
}

/// One export in progress
pub struct ExportSession {
    kind: ExportKind,
    path: PathBuf,
    program: Program,
    sink: Option<Box<dyn FrameSink>>,
    handle: SessionHandle,
    settings: ExportSettings,
    written: u32,
    /// Output produced while loading, reported with the first frame
    pending: Vec<OutputChunk>,
}

impl ExportSession {
    pub(crate) fn new(
        kind: ExportKind,
        path: PathBuf,
        program: Program,
        sink: Box<dyn FrameSink>,
        settings: ExportSettings,
        pending: Vec<OutputChunk>,
    ) -> Self {
        Self {
            kind,
            path,
            program,
            sink: Some(sink),
            handle: SessionHandle::new(),
            settings,
            written: 0,
            pending,
        }
    }

    pub fn kind(&self) -> ExportKind {
        self.kind
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    pub fn handle(&self) -> &SessionHandle {
        &self.handle
    }

    pub fn cancel(&self) {
        self.handle.cancel();
    }

    pub fn written(&self) -> u32 {
        self.written
    }

    pub fn total(&self) -> u32 {
        self.settings.frames
    }

    /// Advance by one frame
    ///
    /// Returns the events produced and whether the session is finished.
    pub(crate) fn step(&mut self, engine: &ScriptEngine) -> (Vec<ExportEvent>, bool) {
        let total = self.total();
        let mut events = Vec::new();

        if self.handle.is_cancelled() {
            events.push(ExportEvent::Progress {
                written: self.written,
                total,
                cancelled: true,
            });
            // Keep whatever was already encoded
            if let Some(sink) = self.sink.take()
                && let Err(e) = sink.finish()
            {
                tracing::warn!("failed to close cancelled export: {}", e);
            }
            let mut output = std::mem::take(&mut self.pending);
            output.push(OutputChunk::stderr("Export cancelled\n"));
            events.push(ExportEvent::Status(Status::failure(output)));
            return (events, true);
        }

        match self.write_next(engine) {
            Ok(output) => {
                if !output.is_empty() {
                    events.push(ExportEvent::Status(Status::success(output)));
                }
                events.push(ExportEvent::Progress {
                    written: self.written,
                    total,
                    cancelled: false,
                });
            }
            Err(output) => {
                self.sink = None;
                events.push(ExportEvent::Status(Status::failure(output)));
                return (events, true);
            }
        }

        if self.written < total {
            return (events, false);
        }

        match self.sink.take().map(|sink| sink.finish()) {
            Some(Ok(files)) => {
                tracing::info!(files = files.len(), path = %self.path.display(), "export finished");
                events.push(ExportEvent::Complete(files));
            }
            Some(Err(e)) => {
                events.push(ExportEvent::Status(Status::error(e)));
            }
            None => {
                events.push(ExportEvent::Status(Status::error("export sink already closed")));
            }
        }
        (events, true)
    }

    /// Render, rasterize and encode the next frame
    fn write_next(&mut self, engine: &ScriptEngine) -> Result<Vec<OutputChunk>, Vec<OutputChunk>> {
        let mut output = std::mem::take(&mut self.pending);
        let frame = self.settings.first.saturating_add(self.written);

        // Loading already rendered frame 1
        let rendered = if self.written == 0 && frame == 1 {
            Ok(self.program.drawing())
        } else {
            self.program.render(engine, frame)
        };
        let rendered = rendered.map(|drawing| drawing.rasterize());
        output.extend(engine.take_output());

        let image = match rendered {
            Ok(Ok(image)) => image,
            Ok(Err(e)) => {
                output.push(OutputChunk::stderr(format!("{e}\n")));
                return Err(output);
            }
            Err(e) => {
                output.push(OutputChunk::stderr(format!("{e}\n")));
                return Err(output);
            }
        };

        let Some(sink) = self.sink.as_mut() else {
            output.push(OutputChunk::stderr("export sink already closed\n"));
            return Err(output);
        };

        if let Err(e) = sink.write_frame(&image) {
            output.push(OutputChunk::stderr(format!("{e}\n")));
            return Err(output);
        }

        self.written += 1;
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handle_is_shared() {
        let handle = SessionHandle::new();
        let clone = handle.clone();
        assert!(!handle.is_cancelled());
        clone.cancel();
        assert!(handle.is_cancelled());
    }
}
