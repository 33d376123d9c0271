//! QuickTime export through a system `ffmpeg` process
//!
//! Raw RGBA frames are streamed to ffmpeg's stdin; ffmpeg does the H.264
//! encoding and muxing. ffmpeg must be on `PATH`.

use super::{FrameSink, FrameSpec};
use crate::{Error, Result};
use image::RgbaImage;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, Stdio};

pub struct MovSink {
    child: Child,
    stdin: Option<ChildStdin>,
    size: (u32, u32),
    path: PathBuf,
}

impl MovSink {
    pub fn spawn(path: &Path, spec: FrameSpec) -> Result<Self> {
        let mut child = Command::new("ffmpeg")
            .args(["-hide_banner", "-loglevel", "error", "-y"])
            .args(["-f", "rawvideo", "-pix_fmt", "rgba"])
            .arg("-s")
            .arg(format!("{}x{}", spec.width, spec.height))
            .arg("-r")
            .arg(spec.fps.max(1).to_string())
            .args(["-i", "-"])
            // yuv420p needs even dimensions
            .args(["-vf", "pad=ceil(iw/2)*2:ceil(ih/2)*2"])
            .args(["-c:v", "libx264", "-pix_fmt", "yuv420p"])
            .arg(path)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| Error::Export(format!("failed to launch ffmpeg: {e}")))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| Error::Export("ffmpeg stdin was not captured".to_string()))?;

        Ok(Self {
            child,
            stdin: Some(stdin),
            size: (spec.width, spec.height),
            path: path.to_path_buf(),
        })
    }
}

impl FrameSink for MovSink {
    fn write_frame(&mut self, frame: &RgbaImage) -> Result<()> {
        if frame.dimensions() != self.size {
            return Err(Error::InvalidParameter(format!(
                "frame is {}x{} but the movie is {}x{}",
                frame.width(),
                frame.height(),
                self.size.0,
                self.size.1
            )));
        }

        let stdin = self
            .stdin
            .as_mut()
            .ok_or_else(|| Error::Export("encoder has already been finalized".to_string()))?;
        stdin.write_all(frame.as_raw())?;
        Ok(())
    }

    fn finish(mut self: Box<Self>) -> Result<Vec<PathBuf>> {
        drop(self.stdin.take());

        let mut stderr = String::new();
        if let Some(mut pipe) = self.child.stderr.take() {
            pipe.read_to_string(&mut stderr)?;
        }

        let status = self.child.wait()?;
        if !status.success() {
            return Err(Error::Export(format!(
                "ffmpeg exited with {}: {}",
                status,
                stderr.trim()
            )));
        }

        Ok(vec![self.path.clone()])
    }
}
