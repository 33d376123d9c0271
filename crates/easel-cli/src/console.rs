//! Console reporting: script output and the export progress line

use easel_core::status::OutputChunk;
use parking_lot::Mutex;
use std::io::{self, Write};
use std::sync::Arc;

/// Clears the current terminal line: carriage return, 80 blanks, carriage return
pub const ERASER: &str = concat!(
    "\r",
    "                                        ",
    "                                        ",
    "\r"
);

/// Number of cells in the progress bar
pub const BAR_WIDTH: u64 = 20;

/// `#` cells for the frames written, `.` for the rest
pub fn progress_bar(written: u32, total: u32) -> String {
    let filled = if total == 0 {
        BAR_WIDTH
    } else {
        (BAR_WIDTH * u64::from(written) / u64::from(total)).min(BAR_WIDTH)
    };
    let mut bar = "#".repeat(filled as usize);
    bar.push_str(&".".repeat((BAR_WIDTH - filled) as usize));
    bar
}

/// The progress line for an export update
pub fn progress_message(written: u32, total: u32, cancelled: bool) -> String {
    if cancelled {
        "Cancelling export…".to_string()
    } else if written == total {
        "Finishing export…".to_string()
    } else {
        format!("\rGenerating {total} frames [{}]", progress_bar(written, total))
    }
}

/// Where console text goes
///
/// Defaults to the process's stdout and stderr; tests swap in buffers.
/// Every write is flushed straight away.
pub struct Console {
    out: Box<dyn Write>,
    err: Box<dyn Write>,
}

impl Console {
    pub fn stdio() -> Self {
        Self::new(Box::new(io::stdout()), Box::new(io::stderr()))
    }

    pub fn new(out: Box<dyn Write>, err: Box<dyn Write>) -> Self {
        Self { out, err }
    }

    /// A console writing into two in-memory buffers
    pub fn captured() -> (Self, CaptureBuffer, CaptureBuffer) {
        let out = CaptureBuffer::default();
        let err = CaptureBuffer::default();
        let console = Self::new(Box::new(out.clone()), Box::new(err.clone()));
        (console, out, err)
    }

    /// Erase the progress line, then stream each chunk to its stream
    pub fn echo(&mut self, output: &[OutputChunk]) {
        self.write_err(ERASER);
        for chunk in output {
            if chunk.is_error {
                self.write_err(&chunk.text);
            } else {
                self.write_out(&chunk.text);
            }
        }
    }

    /// Replace the progress line
    pub fn progress(&mut self, written: u32, total: u32, cancelled: bool) {
        let message = progress_message(written, total, cancelled);
        self.write_err(&format!("{ERASER}{message}"));
    }

    /// Return the cursor to the start of the progress line
    pub fn carriage_return(&mut self) {
        self.write_err("\r");
    }

    /// Wipe the progress line
    pub fn erase(&mut self) {
        self.write_err(ERASER);
    }

    fn write_out(&mut self, text: &str) {
        if let Err(e) = self.out.write_all(text.as_bytes()).and_then(|()| self.out.flush()) {
            tracing::debug!("stdout write failed: {}", e);
        }
    }

    fn write_err(&mut self, text: &str) {
        if let Err(e) = self.err.write_all(text.as_bytes()).and_then(|()| self.err.flush()) {
            tracing::debug!("stderr write failed: {}", e);
        }
    }
}

/// Shared in-memory sink for captured console output
#[derive(Debug, Clone, Default)]
pub struct CaptureBuffer {
    bytes: Arc<Mutex<Vec<u8>>>,
}

impl CaptureBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.bytes.lock()).into_owned()
    }
}

impl Write for CaptureBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.bytes.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
