//! Export settings read from the options blob

use easel_core::export::FrameSpec;
use serde_json::Value;

/// Frame rate used when neither the options nor the script pick one
pub const DEFAULT_FPS: u32 = 30;

/// How many frames to export and how to time them
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportSettings {
    /// Number of frames to write
    pub frames: u32,
    /// Frame number of the first exported frame (1-based)
    pub first: u32,
    pub fps: u32,
    /// Movie repeat count; `None` loops forever
    pub loops: Option<u16>,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            frames: 1,
            first: 1,
            fps: DEFAULT_FPS,
            loops: None,
        }
    }
}

impl ExportSettings {
    /// Read `frames`, `first`, `fps` and `loop` from the options
    ///
    /// `first` is lowered when needed so that the last frame number fits
    /// in a `u32`.
    ///
    /// `script_fps` is the rate declared with `speed()` and is used when
    /// the options do not set `fps`. Missing or invalid values fall back
    /// to the defaults.
    pub fn from_options(options: &Value, script_fps: Option<f64>) -> Self {
        let defaults = Self::default();
        let positive = |key: &str| {
            options
                .get(key)
                .and_then(Value::as_u64)
                .filter(|n| *n > 0)
                .map(|n| n.min(u64::from(u32::MAX)) as u32)
        };

        let fps = positive("fps")
            .or_else(|| script_fps.map(|f| f.round().max(1.0) as u32))
            .unwrap_or(defaults.fps);

        let loops = match options.get("loop") {
            Some(Value::Bool(false)) => Some(0),
            Some(Value::Number(n)) => n
                .as_u64()
                .filter(|n| *n > 0)
                .map(|n| n.min(u64::from(u16::MAX)) as u16),
            _ => None,
        };

        // The last frame number must still fit in a u32
        let frames = positive("frames").unwrap_or(defaults.frames);
        let first = positive("first")
            .unwrap_or(defaults.first)
            .min(u32::MAX - (frames - 1));

        Self {
            frames,
            first,
            fps,
            loops,
        }
    }

    pub fn frame_spec(&self, width: u32, height: u32) -> FrameSpec {
        FrameSpec {
            width,
            height,
            frames: self.frames,
            fps: self.fps,
            loops: self.loops,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults() {
        let settings = ExportSettings::from_options(&json!({}), None);
        assert_eq!(settings, ExportSettings::default());
    }

    #[test]
    fn test_reads_options() {
        let settings = ExportSettings::from_options(
            &json!({"frames": 48, "first": 3, "fps": 12, "loop": 2}),
            Some(60.0),
        );
        assert_eq!(settings.frames, 48);
        assert_eq!(settings.first, 3);
        assert_eq!(settings.fps, 12);
        assert_eq!(settings.loops, Some(2));
    }

    #[test]
    fn test_script_speed_is_fallback_fps() {
        let settings = ExportSettings::from_options(&json!({}), Some(23.6));
        assert_eq!(settings.fps, 24);
    }

    #[test]
    fn test_loop_flags() {
        let once = ExportSettings::from_options(&json!({"loop": false}), None);
        assert_eq!(once.loops, Some(0));

        let forever = ExportSettings::from_options(&json!({"loop": true}), None);
        assert_eq!(forever.loops, None);
    }

    #[test]
    fn test_first_frame_leaves_room_for_the_rest() {
        let settings =
            ExportSettings::from_options(&json!({"first": 4_294_967_295_u64, "frames": 2}), None);
        assert_eq!(settings.first, u32::MAX - 1);
        assert!(settings.first.checked_add(settings.frames - 1).is_some());

        let huge = ExportSettings::from_options(&json!({"first": 1_u64 << 40}), None);
        assert_eq!(huge.first, u32::MAX);
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let settings = ExportSettings::from_options(&json!({"frames": 0, "fps": "fast"}), None);
        assert_eq!(settings.frames, 1);
        assert_eq!(settings.fps, DEFAULT_FPS);
    }
}
