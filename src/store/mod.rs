//! Log persistence
//!
//! The engine reads and writes daily logs through the [`LogStore`] trait so
//! the durable backend can be swapped for an in-memory one in tests.

mod json_file;
mod memory;

pub use json_file::{default_data_dir, JsonFileLogStore, APP_DIR_NAME, LOG_FILE_NAME};
pub use memory::InMemoryLogStore;

use chrono::NaiveDate;

use crate::error::EngineError;
use crate::types::{LogEntry, LogMap};

/// Key-value store of daily logs
pub trait LogStore {
    /// Every stored log, keyed by date. May be empty.
    fn get_all(&self) -> Result<LogMap, EngineError>;

    /// Store `entry` for `date`, replacing any existing entry wholesale
    fn upsert(&mut self, date: NaiveDate, entry: LogEntry) -> Result<(), EngineError>;
}
