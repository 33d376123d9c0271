//! Startup options read from the single JSON line on stdin

use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors reading the startup line
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OptionsError {
    #[error("malformed input: {0}")]
    MalformedInput(String),
}

/// How the process presents the script, fixed at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Export straight to disk without opening a window
    Headless,
    /// Show the script's output in a canvas window
    Windowed,
}

impl Mode {
    pub fn is_headless(self) -> bool {
        self == Self::Headless
    }
}

/// The options blob
///
/// Only a handful of keys mean something to the launcher; everything else
/// is handed to the script untouched as `OPTS`. Values are never changed
/// in place: [`Options::merged`] builds a new set for each export.
#[derive(Debug, Clone, PartialEq)]
pub struct Options {
    values: Map<String, Value>,
    file: PathBuf,
}

impl Options {
    /// Parse the startup line
    ///
    /// The line must be a JSON object with a string `file` and an `export`
    /// key holding a string, null or `false`.
    pub fn parse_line(line: &str) -> Result<Self, OptionsError> {
        let value: Value = serde_json::from_str(line.trim())
            .map_err(|e| OptionsError::MalformedInput(e.to_string()))?;
        let Value::Object(values) = value else {
            return Err(OptionsError::MalformedInput(
                "expected a JSON object".to_string(),
            ));
        };
        Self::from_map(values)
    }

    pub fn from_map(values: Map<String, Value>) -> Result<Self, OptionsError> {
        match values.get("export") {
            Some(Value::String(_) | Value::Null | Value::Bool(false)) => {}
            Some(other) => {
                return Err(OptionsError::MalformedInput(format!(
                    "`export` must be a string, got {other}"
                )));
            }
            None => {
                return Err(OptionsError::MalformedInput(
                    "missing `export`".to_string(),
                ));
            }
        }

        let file = values
            .get("file")
            .and_then(Value::as_str)
            .filter(|f| !f.is_empty())
            .map(PathBuf::from)
            .ok_or_else(|| OptionsError::MalformedInput("missing `file`".to_string()))?;

        Ok(Self { values, file })
    }

    /// Headless when there is somewhere to export to
    pub fn mode(&self) -> Mode {
        if self.export().is_some() {
            Mode::Headless
        } else {
            Mode::Windowed
        }
    }

    /// Path of the script to run
    pub fn file(&self) -> &Path {
        &self.file
    }

    /// Export target, if one was given
    pub fn export(&self) -> Option<&str> {
        self.values
            .get("export")
            .and_then(Value::as_str)
            .filter(|e| !e.is_empty())
    }

    /// Extension of the export target, used as its format name
    pub fn export_format(&self) -> Option<&str> {
        self.export()
            .map(Path::new)
            .and_then(Path::extension)
            .and_then(|e| e.to_str())
    }

    /// Bring the window to the front when it opens
    pub fn activate(&self) -> bool {
        self.flag("activate")
    }

    /// Show the status footer under the canvas
    pub fn footer(&self) -> bool {
        self.flag("footer")
    }

    pub fn frames(&self) -> Option<u64> {
        self.values.get("frames").and_then(Value::as_u64)
    }

    pub fn fps(&self) -> Option<f64> {
        self.values.get("fps").and_then(Value::as_f64)
    }

    /// Raw `loop` value: a repeat count or `false`
    pub fn loops(&self) -> Option<&Value> {
        self.values.get("loop")
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    fn flag(&self, key: &str) -> bool {
        self.values.get(key).and_then(Value::as_bool).unwrap_or(false)
    }

    /// A copy with `overrides` applied on top; later values win
    pub fn merged(&self, overrides: &Map<String, Value>) -> Self {
        let mut values = self.values.clone();
        for (key, value) in overrides {
            values.insert(key.clone(), value.clone());
        }
        let file = values
            .get("file")
            .and_then(Value::as_str)
            .filter(|f| !f.is_empty())
            .map_or_else(|| self.file.clone(), PathBuf::from);
        Self { values, file }
    }

    /// A copy exporting to `path` instead
    pub fn with_export(&self, path: &Path) -> Self {
        let mut overrides = Map::new();
        overrides.insert(
            "export".to_string(),
            Value::String(path.to_string_lossy().into_owned()),
        );
        self.merged(&overrides)
    }

    /// Everything, as the script sees it
    pub fn to_metadata(&self) -> Value {
        Value::Object(self.values.clone())
    }

    /// Metadata for an export, with `format` filled in from the target
    pub fn export_metadata(&self) -> Value {
        let mut values = self.values.clone();
        if let Some(format) = self.export_format() {
            values.insert("format".to_string(), Value::String(format.to_string()));
        }
        Value::Object(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: Value) -> Result<Options, OptionsError> {
        Options::parse_line(&value.to_string())
    }

    #[test]
    fn test_empty_export_is_windowed() {
        let options = parse(json!({"file": "a.py", "export": "", "activate": false})).unwrap();
        assert_eq!(options.mode(), Mode::Windowed);
        assert_eq!(options.export(), None);
        assert!(!options.activate());
    }

    #[test]
    fn test_null_export_is_windowed() {
        let options = parse(json!({"file": "a.py", "export": null})).unwrap();
        assert_eq!(options.mode(), Mode::Windowed);
    }

    #[test]
    fn test_false_export_is_windowed() {
        let options = parse(json!({"file": "a.py", "export": false})).unwrap();
        assert_eq!(options.mode(), Mode::Windowed);
        assert_eq!(options.export(), None);
    }

    #[test]
    fn test_export_is_headless() {
        let options = parse(json!({"file": "a.py", "export": "out.png"})).unwrap();
        assert_eq!(options.mode(), Mode::Headless);
        assert_eq!(options.export(), Some("out.png"));
        assert_eq!(options.export_format(), Some("png"));
        assert_eq!(options.file(), Path::new("a.py"));
    }

    #[test]
    fn test_malformed_lines() {
        for line in [
            "",
            "not json",
            "[1, 2, 3]",
            r#"{"file": "a.py"}"#,
            r#"{"export": "out.png"}"#,
            r#"{"file": "a.py", "export": 3}"#,
            r#"{"file": "a.py", "export": true}"#,
            r#"{"file": 7, "export": ""}"#,
        ] {
            assert!(
                matches!(Options::parse_line(line), Err(OptionsError::MalformedInput(_))),
                "accepted {line:?}"
            );
        }
    }

    #[test]
    fn test_trailing_newline_is_fine() {
        let options = Options::parse_line("{\"file\": \"a.py\", \"export\": \"\"}\n").unwrap();
        assert_eq!(options.mode(), Mode::Windowed);
    }

    #[test]
    fn test_merged_leaves_original_untouched() {
        let options = parse(json!({"file": "a.py", "export": "", "frames": 10})).unwrap();
        let mut overrides = Map::new();
        overrides.insert("frames".to_string(), json!(3));
        overrides.insert("title".to_string(), json!("demo"));

        let merged = options.merged(&overrides).with_export(Path::new("shot.gif"));

        assert_eq!(merged.frames(), Some(3));
        assert_eq!(merged.get("title"), Some(&json!("demo")));
        assert_eq!(merged.export(), Some("shot.gif"));
        assert_eq!(options.frames(), Some(10));
        assert_eq!(options.export(), None);
    }

    #[test]
    fn test_export_metadata_has_format() {
        let options = parse(json!({"file": "a.py", "export": "dir/out.GIF", "mood": "calm"})).unwrap();
        let metadata = options.export_metadata();
        assert_eq!(metadata["format"], json!("GIF"));
        assert_eq!(metadata["mood"], json!("calm"));
        assert!(options.to_metadata().get("format").is_none());
    }
}
