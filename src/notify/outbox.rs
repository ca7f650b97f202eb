//! File-backed reminder outbox
//!
//! Used by the CLI: pending reminders are written to `outbox.json`, where a
//! platform agent picks them up for delivery. The same document carries the
//! user's notification permission.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::{Notifier, PendingNotification};
use crate::error::EngineError;

/// File name of the outbox inside the data directory
pub const OUTBOX_FILE_NAME: &str = "outbox.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
struct OutboxDocument {
    #[serde(default = "default_permission")]
    permission_granted: bool,
    #[serde(default)]
    pending: Vec<PendingNotification>,
}

fn default_permission() -> bool {
    true
}

impl Default for OutboxDocument {
    fn default() -> Self {
        Self {
            permission_granted: default_permission(),
            pending: Vec::new(),
        }
    }
}

/// Notifier that persists pending reminders to a JSON file
#[derive(Debug, Clone)]
pub struct FileOutbox {
    path: PathBuf,
    now_epoch_secs: i64,
}

impl FileOutbox {
    /// Outbox at `path`; triggers at or before `now_epoch_secs` are ignored
    pub fn new(path: impl Into<PathBuf>, now_epoch_secs: i64) -> Self {
        Self {
            path: path.into(),
            now_epoch_secs,
        }
    }

    /// Outbox at `outbox.json` inside `dir`
    pub fn in_dir(dir: &Path, now_epoch_secs: i64) -> Self {
        Self::new(dir.join(OUTBOX_FILE_NAME), now_epoch_secs)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reminders currently in the outbox
    pub fn pending(&self) -> Result<Vec<PendingNotification>, EngineError> {
        Ok(self.load()?.pending)
    }

    /// Record the user's permission choice
    pub fn set_permission(&mut self, granted: bool) -> Result<(), EngineError> {
        let mut doc = self.load()?;
        doc.permission_granted = granted;
        self.store(&doc)
    }

    fn load(&self) -> Result<OutboxDocument, EngineError> {
        match fs::read_to_string(&self.path) {
            Ok(raw) if raw.trim().is_empty() => Ok(OutboxDocument::default()),
            Ok(raw) => serde_json::from_str(&raw).map_err(|e| {
                EngineError::NotificationSchedule(format!("{}: {}", self.path.display(), e))
            }),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(OutboxDocument::default()),
            Err(e) => Err(EngineError::NotificationSchedule(format!(
                "{}: {}",
                self.path.display(),
                e
            ))),
        }
    }

    fn store(&self, doc: &OutboxDocument) -> Result<(), EngineError> {
        let to_err =
            |e: std::io::Error| EngineError::NotificationSchedule(format!("{}: {}", self.path.display(), e));

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(to_err)?;
            }
        }
        let json = serde_json::to_vec_pretty(doc)?;
        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, json).map_err(to_err)?;
        fs::rename(&tmp_path, &self.path).map_err(to_err)
    }
}

impl Notifier for FileOutbox {
    fn request_permission(&mut self) -> Result<bool, EngineError> {
        Ok(self.load()?.permission_granted)
    }

    fn cancel_all(&mut self) -> Result<(), EngineError> {
        let mut doc = self.load()?;
        let cancelled = doc.pending.len();
        doc.pending.clear();
        self.store(&doc)?;
        debug!(path = %self.path.display(), cancelled, "outbox cleared");
        Ok(())
    }

    fn schedule(
        &mut self,
        trigger_epoch_secs: i64,
        title: &str,
        body: &str,
    ) -> Result<(), EngineError> {
        if trigger_epoch_secs <= self.now_epoch_secs {
            debug!(trigger_epoch_secs, "outbox ignoring past-dated trigger");
            return Ok(());
        }

        let mut doc = self.load()?;
        if !doc.permission_granted {
            return Ok(());
        }
        doc.pending.push(PendingNotification {
            trigger_epoch_secs,
            title: title.to_string(),
            body: body.to_string(),
        });
        self.store(&doc)
    }
}
