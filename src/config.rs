use std::{fs, path::Path, path::PathBuf, sync::Arc};

use directories::ProjectDirs;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::{FileMedium, NoteError, NoteRepository, Result, TagIndex, DEFAULT_TAGS};

/// Namespace key the note collection is stored under by default
pub const DEFAULT_NAMESPACE: &str = "notekeeper.notes";

/// Application configuration settings.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    /// Directory holding the persisted collection
    pub data_dir: PathBuf,

    /// Key the collection is stored under
    pub namespace: String,

    /// Tags always offered, which the user cannot remove
    pub default_tags: Vec<String>,

    /// Reject a title already used by another note (case-insensitive)
    pub reject_duplicate_titles: bool,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = ProjectDirs::from("", "", "notekeeper")
            .map(|dirs| dirs.data_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from(".notekeeper"));

        Self {
            data_dir,
            namespace: DEFAULT_NAMESPACE.to_string(),
            default_tags: DEFAULT_TAGS.iter().map(|t| t.to_string()).collect(),
            reject_duplicate_titles: false,
        }
    }
}

impl Config {
    /// Reads a JSON config file. A missing file gives the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&raw).map_err(|e| {
            warn!("Invalid config file {}: {}", path.display(), e);
            NoteError::from(e)
        })?;

        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Repository persisting to `data_dir` under `namespace`
    pub fn open_repository(&self) -> NoteRepository {
        let medium = FileMedium::new(self.data_dir.clone());
        NoteRepository::with_medium(Arc::new(medium), self.namespace.clone())
            .reject_duplicate_titles(self.reject_duplicate_titles)
    }

    pub fn tag_index(&self) -> TagIndex {
        TagIndex::new(&self.default_tags)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let config = Config::load(&dir.path().join("config.json")).unwrap();
        assert_eq!(config.namespace, DEFAULT_NAMESPACE);
        assert_eq!(config.default_tags.len(), DEFAULT_TAGS.len());
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"reject_duplicate_titles": true}"#).unwrap();

        let config = Config::load(&path).unwrap();
        assert!(config.reject_duplicate_titles);
        assert_eq!(config.namespace, DEFAULT_NAMESPACE);
    }

    #[test]
    fn save_then_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let config = Config {
            data_dir: dir.path().join("data"),
            namespace: "custom".into(),
            default_tags: vec!["Inbox".into()],
            reject_duplicate_titles: true,
        };

        config.save(&path).unwrap();
        assert_eq!(Config::load(&path).unwrap(), config);
        assert_eq!(config.tag_index().tags(), vec!["Inbox".to_string()]);
    }

    #[test]
    fn invalid_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "[").unwrap();
        assert!(matches!(Config::load(&path), Err(NoteError::Storage { .. })));
    }
}
