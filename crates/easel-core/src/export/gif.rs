//! Animated GIF export

use super::{FrameSink, FrameSpec};
use crate::Result;
use image::codecs::gif::{GifEncoder, Repeat};
use image::{Delay, Frame, RgbaImage};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

/// Encodes frames into a single looping GIF
pub struct GifSink {
    encoder: GifEncoder<BufWriter<File>>,
    delay: Delay,
    path: PathBuf,
}

impl GifSink {
    pub fn create(path: &Path, spec: FrameSpec) -> Result<Self> {
        let file = File::create(path)?;
        let mut encoder = GifEncoder::new(BufWriter::new(file));
        encoder.set_repeat(match spec.loops {
            None => Repeat::Infinite,
            Some(count) => Repeat::Finite(count),
        })?;

        Ok(Self {
            encoder,
            delay: Delay::from_numer_denom_ms(1000, spec.fps.max(1)),
            path: path.to_path_buf(),
        })
    }
}

impl FrameSink for GifSink {
    fn write_frame(&mut self, frame: &RgbaImage) -> Result<()> {
        self.encoder
            .encode_frame(Frame::from_parts(frame.clone(), 0, 0, self.delay))?;
        Ok(())
    }

    fn finish(self: Box<Self>) -> Result<Vec<PathBuf>> {
        let Self { encoder, path, .. } = *self;
        // Dropping the encoder writes the trailer
        drop(encoder);
        Ok(vec![path])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn test_gif_export() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("anim.gif");
        let spec = FrameSpec {
            frames: 3,
            fps: 10,
            loops: Some(2),
            ..FrameSpec::still(6, 6)
        };

        let mut sink: Box<dyn FrameSink> = Box::new(GifSink::create(&path, spec).unwrap());
        for shade in [0u8, 120, 240] {
            let frame = RgbaImage::from_pixel(6, 6, Rgba([shade, shade, shade, 255]));
            sink.write_frame(&frame).unwrap();
        }

        let written = sink.finish().unwrap();
        assert_eq!(written, vec![path.clone()]);
        assert!(std::fs::metadata(&path).unwrap().len() > 0);
    }
}
