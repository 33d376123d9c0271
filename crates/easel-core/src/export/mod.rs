//! Frame export: still images, numbered image sequences and movies

mod gif;
mod mov;
mod sequence;

use crate::{Error, Result};
use image::RgbaImage;
use std::path::{Path, PathBuf};

pub use gif::GifSink;
pub use mov::MovSink;
pub use sequence::ImageSequence;

/// Extensions that export as a single movie instead of one file per frame
pub const MOVIE_FORMATS: [&str; 2] = ["mov", "gif"];

/// Supported export formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Png,
    Jpeg,
    Tiff,
    Gif,
    Mov,
}

impl ExportFormat {
    /// Parse format from a file extension (case-insensitive)
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "png" => Some(Self::Png),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "tif" | "tiff" => Some(Self::Tiff),
            "gif" => Some(Self::Gif),
            "mov" => Some(Self::Mov),
            _ => None,
        }
    }

    /// Infer format from a file path
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }

    /// Get the file extension for this format
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::Tiff => "tiff",
            Self::Gif => "gif",
            Self::Mov => "mov",
        }
    }

    pub fn kind(&self) -> ExportKind {
        ExportKind::for_format(self.extension())
    }
}

/// Whether an export produces one movie file or one image per frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportKind {
    Image,
    Movie,
}

impl ExportKind {
    /// Classify a format name (a file extension without the dot)
    pub fn for_format(format: &str) -> Self {
        let format = format.to_ascii_lowercase();
        if MOVIE_FORMATS.contains(&format.as_str()) {
            Self::Movie
        } else {
            Self::Image
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Movie => "movie",
        }
    }
}

impl std::fmt::Display for ExportKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Shape of the frame stream handed to a sink
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameSpec {
    pub width: u32,
    pub height: u32,
    pub frames: u32,
    pub fps: u32,
    /// Movie repeat count; `None` loops forever
    pub loops: Option<u16>,
}

impl FrameSpec {
    pub fn still(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            frames: 1,
            fps: 30,
            loops: None,
        }
    }
}

/// Destination for rendered frames
pub trait FrameSink {
    /// Encode the next frame
    fn write_frame(&mut self, frame: &RgbaImage) -> Result<()>;

    /// Flush everything to disk and return the files that were written
    fn finish(self: Box<Self>) -> Result<Vec<PathBuf>>;
}

/// Open the sink that writes `kind` exports of `format` to `path`
pub fn open_sink(
    kind: ExportKind,
    format: ExportFormat,
    path: &Path,
    spec: FrameSpec,
) -> Result<Box<dyn FrameSink>> {
    if spec.width == 0 || spec.height == 0 {
        return Err(Error::InvalidParameter(format!(
            "cannot export a {}x{} canvas",
            spec.width, spec.height
        )));
    }

    tracing::debug!(?kind, ?format, path = %path.display(), frames = spec.frames, "opening frame sink");

    match (kind, format) {
        (ExportKind::Movie, ExportFormat::Gif) => Ok(Box::new(GifSink::create(path, spec)?)),
        (ExportKind::Movie, ExportFormat::Mov) => Ok(Box::new(MovSink::spawn(path, spec)?)),
        (ExportKind::Movie, other) => Err(Error::UnsupportedFormat(format!(
            "{} is not a movie format",
            other.extension()
        ))),
        (ExportKind::Image, ExportFormat::Mov) => Err(Error::UnsupportedFormat(
            "mov can only be written as a movie".to_string(),
        )),
        (ExportKind::Image, format) => Ok(Box::new(ImageSequence::new(path, format, spec.frames))),
    }
}
