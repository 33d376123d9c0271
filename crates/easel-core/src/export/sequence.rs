//! Still image export, numbered when more than one frame is written

use super::{ExportFormat, FrameSink};
use crate::Result;
use image::{DynamicImage, RgbaImage};
use std::path::{Path, PathBuf};

/// Writes each frame to its own file
///
/// A single-frame export goes to the requested path unchanged. Longer
/// exports insert a 1-based, zero-padded frame number before the
/// extension: `out.png` becomes `out-0001.png`, `out-0002.png`, ...
pub struct ImageSequence {
    path: PathBuf,
    format: ExportFormat,
    total: u32,
    written: Vec<PathBuf>,
}

impl ImageSequence {
    pub fn new(path: &Path, format: ExportFormat, total: u32) -> Self {
        Self {
            path: path.to_path_buf(),
            format,
            total,
            written: Vec::new(),
        }
    }

    /// Path of the frame at 0-based `index`
    pub fn frame_path(&self, index: usize) -> PathBuf {
        if self.total <= 1 {
            return self.path.clone();
        }

        let stem = self
            .path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let ext = self
            .path
            .extension()
            .map(|e| e.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.format.extension().to_string());

        self.path
            .with_file_name(format!("{}-{:04}.{}", stem, index + 1, ext))
    }
}

impl FrameSink for ImageSequence {
    fn write_frame(&mut self, frame: &RgbaImage) -> Result<()> {
        let target = self.frame_path(self.written.len());

        match self.format {
            // JPEG has no alpha channel
            ExportFormat::Jpeg => DynamicImage::ImageRgba8(frame.clone())
                .to_rgb8()
                .save(&target)?,
            _ => frame.save(&target)?,
        }

        self.written.push(target);
        Ok(())
    }

    fn finish(self: Box<Self>) -> Result<Vec<PathBuf>> {
        Ok(self.written)
    }
}
