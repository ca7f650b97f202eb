//! Durable JSON-file log store
//!
//! All logs live in one JSON document mapping `YYYY-MM-DD` to the entry.
//! Writes go to a sibling temp file which is then renamed over the original,
//! so a crash mid-write never leaves a truncated document behind.

use chrono::NaiveDate;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::LogStore;
use crate::error::EngineError;
use crate::types::{LogEntry, LogMap};

/// Application directory name under the platform data dir
pub const APP_DIR_NAME: &str = "cycle-intel";

/// File name of the log document inside the data directory
pub const LOG_FILE_NAME: &str = "logs.json";

/// Platform data directory for Cycle Intel (e.g. `~/.local/share/cycle-intel`)
pub fn default_data_dir() -> Result<PathBuf, EngineError> {
    dirs::data_local_dir()
        .map(|dir| dir.join(APP_DIR_NAME))
        .ok_or_else(|| EngineError::PersistenceRead("data directory not found".to_string()))
}

/// Log store persisted as a single JSON file
#[derive(Debug, Clone)]
pub struct JsonFileLogStore {
    path: PathBuf,
}

impl JsonFileLogStore {
    /// Store backed by the given file path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store backed by `logs.json` inside `dir`
    pub fn in_dir(dir: &Path) -> Self {
        Self::new(dir.join(LOG_FILE_NAME))
    }

    /// Store in the platform data directory
    pub fn default_location() -> Result<Self, EngineError> {
        Ok(Self::in_dir(&default_data_dir()?))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the backing file has been created yet
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    fn read_map(&self) -> Result<LogMap, String> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            // Nothing saved yet
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(LogMap::new()),
            Err(e) => return Err(format!("{}: {}", self.path.display(), e)),
        };
        if raw.trim().is_empty() {
            return Ok(LogMap::new());
        }
        serde_json::from_str(&raw).map_err(|e| format!("{}: {}", self.path.display(), e))
    }

    fn write_map(&self, logs: &LogMap) -> Result<(), String> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .map_err(|e| format!("{}: {}", parent.display(), e))?;
            }
        }

        let json = serde_json::to_vec_pretty(logs).map_err(|e| e.to_string())?;
        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, json).map_err(|e| format!("{}: {}", tmp_path.display(), e))?;
        fs::rename(&tmp_path, &self.path).map_err(|e| format!("{}: {}", self.path.display(), e))
    }
}

impl LogStore for JsonFileLogStore {
    fn get_all(&self) -> Result<LogMap, EngineError> {
        let logs = self.read_map().map_err(EngineError::PersistenceRead)?;
        debug!(path = %self.path.display(), entries = logs.len(), "loaded logs");
        Ok(logs)
    }

    fn upsert(&mut self, date: NaiveDate, entry: LogEntry) -> Result<(), EngineError> {
        let mut logs = self
            .read_map()
            .map_err(|e| EngineError::PersistenceWrite(format!("cannot load existing logs: {e}")))?;
        logs.insert(date, entry);
        self.write_map(&logs).map_err(EngineError::PersistenceWrite)?;
        debug!(path = %self.path.display(), %date, "saved log");
        Ok(())
    }
}
