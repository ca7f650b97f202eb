//! Error types for Cycle Intel

use thiserror::Error;

/// Errors that can occur while persisting logs, analysing them, or
/// reconciling reminders
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Failed to read logs: {0}")]
    PersistenceRead(String),

    #[error("Failed to write log: {0}")]
    PersistenceWrite(String),

    #[error("Notification permission not granted")]
    NotificationPermissionDenied,

    #[error("Failed to schedule notification: {0}")]
    NotificationSchedule(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Date parse error: {0}")]
    DateParseError(String),

    #[error("Date out of range: {0}")]
    DateOutOfRange(String),
}
