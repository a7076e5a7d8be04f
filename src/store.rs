use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Last-used model and scenario selection, restored on the next session
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SavedSelection {
    #[serde(default)]
    pub selected_models: Vec<String>,
    #[serde(default)]
    pub selected_scenarios: Vec<String>,
}

impl SavedSelection {
    /// Capture the current selection sets in a stable order
    pub fn from_sets(models: &HashSet<String>, scenarios: &HashSet<String>) -> Self {
        let mut selected_models: Vec<String> = models.iter().cloned().collect();
        let mut selected_scenarios: Vec<String> = scenarios.iter().cloned().collect();
        selected_models.sort();
        selected_scenarios.sort();
        Self {
            selected_models,
            selected_scenarios,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.selected_models.is_empty() && self.selected_scenarios.is_empty()
    }
}

/// File-backed store for the saved selection
#[derive(Debug, Clone)]
pub struct SelectionStore {
    path: PathBuf,
}

impl SelectionStore {
    /// Store under the platform config directory, when one exists
    pub fn default_location() -> Option<Self> {
        dirs::config_dir().map(|dir| Self {
            path: dir.join("llm-eval-console").join("selections.json"),
        })
    }

    /// Store at an explicit path
    pub fn at(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }

    /// Load the saved selection.
    ///
    /// A missing file yields an empty selection; an unreadable or corrupt
    /// file does too, with a warning, so a bad state file never blocks the
    /// session.
    pub fn load(&self) -> SavedSelection {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(_) => return SavedSelection::default(),
        };

        match serde_json::from_str(&content) {
            Ok(selection) => selection,
            Err(error) => {
                tracing::warn!(path = %self.path.display(), %error, "ignoring corrupt selection file");
                SavedSelection::default()
            }
        }
    }

    /// Persist the selection, creating parent directories as needed
    pub fn save(&self, selection: &SavedSelection) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        let content = serde_json::to_string_pretty(selection)
            .context("Failed to serialize selection to JSON")?;

        std::fs::write(&self.path, content)
            .with_context(|| format!("Failed to write selection to: {}", self.path.display()))
    }
}
