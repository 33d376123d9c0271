//! Window placement persistence - reopen each script's window where it was

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Outer position of a window on screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    pub x: i32,
    pub y: i32,
}

/// Last known placement per autosave name
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct WindowPlacements {
    #[serde(default)]
    windows: BTreeMap<String, Placement>,
    #[serde(skip)]
    path: Option<PathBuf>,
}

impl WindowPlacements {
    /// Get the placement file path
    fn store_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("easel").join("windows.json"))
    }

    /// Load placements from the user's config directory
    ///
    /// A missing or unreadable file yields an empty set.
    pub fn load() -> Self {
        match Self::store_path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    pub fn load_from(path: &Path) -> Self {
        let mut placements = std::fs::read_to_string(path)
            .ok()
            .and_then(|content| serde_json::from_str::<Self>(&content).ok())
            .unwrap_or_default();
        placements.path = Some(path.to_path_buf());
        placements
    }

    /// Save placements back to where they were loaded from
    pub fn save(&self) -> anyhow::Result<()> {
        let path = self
            .path
            .clone()
            .or_else(Self::store_path)
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;

        // Create directory if needed
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, content)?;
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<Placement> {
        self.windows.get(name).copied()
    }

    pub fn set(&mut self, name: impl Into<String>, placement: Placement) {
        self.windows.insert(name.into(), placement);
    }
}
