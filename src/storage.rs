use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("state file I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("state file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// String key-value persistence, the terminal counterpart of browser local storage.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;

    /// Stores `value` under `key` and persists immediately.
    fn set(&mut self, key: &str, value: String) -> Result<(), StorageError>;

    fn remove(&mut self, key: &str) -> Result<(), StorageError>;
}

/// Flat JSON object on disk, rewritten in full on every change.
#[derive(Debug, Default)]
pub struct StateStore {
    entries: BTreeMap<String, String>,
    file_path: Option<PathBuf>,
}

impl StateStore {
    pub fn ephemeral() -> Self {
        Self {
            entries: BTreeMap::new(),
            file_path: None,
        }
    }

    pub fn with_file(file_path: impl Into<PathBuf>) -> Self {
        Self {
            entries: BTreeMap::new(),
            file_path: Some(file_path.into()),
        }
    }

    /// Loads the state file, or starts empty. An unreadable file is moved
    /// aside to `<name>.bak` first so the next write cannot clobber it.
    pub fn load_or_ephemeral(file_path: Option<&Path>) -> Self {
        match file_path {
            Some(path) => Self::load_from_file(path).unwrap_or_else(|e| {
                log::error!("Failed to load state from {}: {}", path.display(), e);
                let backup = backup_path(path);
                match fs::rename(path, &backup) {
                    Ok(()) => log::warn!(
                        "Moved unreadable state file to {}",
                        backup.display()
                    ),
                    Err(e) => log::warn!(
                        "Could not back up {}: {}, keeping state in memory",
                        path.display(),
                        e
                    ),
                }
                if path.exists() {
                    Self::ephemeral()
                } else {
                    Self::with_file(path)
                }
            }),
            None => Self::ephemeral(),
        }
    }

    pub fn load_from_file(file_path: &Path) -> Result<Self, StorageError> {
        if file_path.exists() {
            let content = fs::read_to_string(file_path)?;
            let entries: BTreeMap<String, String> = if content.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_str(&content)?
            };
            log::debug!(
                "Loaded {} state entries from {}",
                entries.len(),
                file_path.display()
            );
            Ok(Self {
                entries,
                file_path: Some(file_path.to_path_buf()),
            })
        } else {
            Ok(Self::with_file(file_path))
        }
    }

    pub fn save(&self) -> Result<(), StorageError> {
        match &self.file_path {
            Some(path) => {
                if let Some(parent) = path.parent() {
                    if !parent.as_os_str().is_empty() && !parent.exists() {
                        fs::create_dir_all(parent)?;
                    }
                }
                let content = serde_json::to_string_pretty(&self.entries)?;
                fs::write(path, content)?;
                Ok(())
            }
            // Ephemeral state never touches disk
            None => Ok(()),
        }
    }

    pub fn file_path(&self) -> Option<&Path> {
        self.file_path.as_deref()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn backup_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".bak");
    PathBuf::from(name)
}

impl KeyValueStore for StateStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), StorageError> {
        self.entries.insert(key.to_string(), value);
        self.save()
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        if self.entries.remove(key).is_some() {
            self.save()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_ephemeral_store_keeps_values_in_memory() {
        let mut store = StateStore::ephemeral();
        store.set("theme", "dark".to_string()).unwrap();
        assert_eq!(store.get("theme").as_deref(), Some("dark"));
        assert!(store.file_path().is_none());
    }

    #[test]
    fn test_file_store_writes_through() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("state.json");

        let mut store = StateStore::load_or_ephemeral(Some(&path));
        store.set("theme", "light".to_string()).unwrap();
        assert!(path.exists());

        let reloaded = StateStore::load_from_file(&path).unwrap();
        assert_eq!(reloaded.get("theme").as_deref(), Some("light"));
    }

    #[test]
    fn test_corrupt_file_falls_back_to_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");
        fs::write(&path, "{ not json").unwrap();

        assert!(StateStore::load_from_file(&path).is_err());
        let mut store = StateStore::load_or_ephemeral(Some(&path));
        assert!(store.is_empty());
        assert_eq!(store.file_path(), Some(path.as_path()));

        let backup = dir.path().join("state.json.bak");
        assert_eq!(fs::read_to_string(&backup).unwrap(), "{ not json");

        store.set("theme", "dark".to_string()).unwrap();
        assert_eq!(fs::read_to_string(&backup).unwrap(), "{ not json");
        let reloaded = StateStore::load_from_file(&path).unwrap();
        assert_eq!(reloaded.get("theme").as_deref(), Some("dark"));
    }

    #[test]
    fn test_remove_missing_key_is_noop() {
        let mut store = StateStore::ephemeral();
        store.remove("nothing").unwrap();
        assert_eq!(store.len(), 0);
    }
}
