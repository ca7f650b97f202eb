//! In-memory log store

use chrono::NaiveDate;

use super::LogStore;
use crate::error::EngineError;
use crate::types::{LogEntry, LogMap};

/// Volatile store backed by an ordered map
#[derive(Debug, Clone, Default)]
pub struct InMemoryLogStore {
    logs: LogMap,
}

impl InMemoryLogStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with existing logs
    pub fn with_logs(logs: LogMap) -> Self {
        Self { logs }
    }

    pub fn len(&self) -> usize {
        self.logs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.logs.is_empty()
    }
}

impl LogStore for InMemoryLogStore {
    fn get_all(&self) -> Result<LogMap, EngineError> {
        Ok(self.logs.clone())
    }

    fn upsert(&mut self, date: NaiveDate, entry: LogEntry) -> Result<(), EngineError> {
        self.logs.insert(date, entry);
        Ok(())
    }
}
