use crate::domain::storage::{Storage, StorageKeys};
use crate::domain::StandingsRow;
use crate::error::{LeagueError, Result};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::debug;

/// JSON-file store: one file for the standings snapshot, one for settings.
#[derive(Debug)]
pub struct FileSystemStore {
    data_dir: PathBuf,
    // Serializes read-modify-write of the settings file.
    settings_lock: Mutex<()>,
}

impl FileSystemStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            settings_lock: Mutex::new(()),
        }
    }

    fn get_path_for_key(&self, key: &str) -> PathBuf {
        self.data_dir.join(format!("{}.json", key))
    }

    fn ensure_dir(&self, dir: &Path) -> Result<()> {
        if !dir.exists() {
            fs::create_dir_all(dir)?;
        }
        Ok(())
    }

    /// Write to a sibling temp file and rename over the target, so readers see
    /// either the old or the new content and never a half-written file.
    fn write_json_file<T: serde::Serialize + ?Sized>(&self, key: &str, data: &T) -> Result<()> {
        self.ensure_dir(&self.data_dir)?;

        let path = self.get_path_for_key(key);
        let tmp_path = self.data_dir.join(format!(".{}.json.tmp", key));
        let content = serde_json::to_string_pretty(data)?;
        fs::write(&tmp_path, content)?;
        fs::rename(&tmp_path, &path)?;
        Ok(())
    }

    fn read_json_file<T: serde::de::DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let path = self.get_path_for_key(key);
        if path.exists() {
            let content = fs::read_to_string(path)?;
            Ok(Some(serde_json::from_str(&content)?))
        } else {
            Ok(None)
        }
    }

    fn load_settings(&self) -> Result<BTreeMap<String, String>> {
        Ok(self
            .read_json_file(StorageKeys::SETTINGS)?
            .unwrap_or_default())
    }
}

impl Storage for FileSystemStore {
    fn load_standings(&self) -> Result<Vec<StandingsRow>> {
        let mut rows: Vec<StandingsRow> = self
            .read_json_file(StorageKeys::STANDINGS)?
            .unwrap_or_default();
        rows.sort_by_key(|row| row.position);
        Ok(rows)
    }

    fn clear_standings(&self) -> Result<()> {
        let path = self.get_path_for_key(StorageKeys::STANDINGS);
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }

    fn insert_standings(&self, rows: &[StandingsRow]) -> Result<()> {
        let mut snapshot = self.load_standings()?;
        snapshot.extend_from_slice(rows);
        snapshot.sort_by_key(|row| row.position);
        self.write_json_file(StorageKeys::STANDINGS, &snapshot)
    }

    fn replace_standings(&self, rows: &[StandingsRow]) -> Result<()> {
        debug!("Replacing stored snapshot with {} rows", rows.len());
        self.write_json_file(StorageKeys::STANDINGS, rows)
    }

    fn load_setting(&self, key: &str) -> Result<Option<String>> {
        Ok(self.load_settings()?.remove(key))
    }

    fn save_setting(&self, key: &str, value: &str) -> Result<()> {
        let _guard = self
            .settings_lock
            .lock()
            .map_err(|_| LeagueError::Store("settings lock poisoned".to_string()))?;

        let mut settings = self.load_settings()?;
        settings.insert(key.to_string(), value.to_string());
        self.write_json_file(StorageKeys::SETTINGS, &settings)
    }
}
