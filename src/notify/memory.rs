//! In-memory notifier
//!
//! Records every call and keeps the currently pending reminders, so an
//! embedding app or a test can inspect exactly what the scheduler did.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::Notifier;
use crate::error::EngineError;

/// A reminder waiting to fire
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingNotification {
    pub trigger_epoch_secs: i64,
    pub title: String,
    pub body: String,
}

/// One call made against the notifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotifierCall {
    RequestPermission,
    CancelAll,
    Schedule { trigger_epoch_secs: i64, title: String },
}

#[derive(Debug, Clone)]
pub struct RecordingNotifier {
    permission_granted: bool,
    now_epoch_secs: Option<i64>,
    fail_cancel: bool,
    fail_schedule_after: Option<usize>,
    schedule_calls: usize,
    ignored_past: usize,
    pending: Vec<PendingNotification>,
    calls: Vec<NotifierCall>,
}

impl Default for RecordingNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingNotifier {
    /// Notifier with permission granted
    pub fn new() -> Self {
        Self {
            permission_granted: true,
            now_epoch_secs: None,
            fail_cancel: false,
            fail_schedule_after: None,
            schedule_calls: 0,
            ignored_past: 0,
            pending: Vec::new(),
            calls: Vec::new(),
        }
    }

    /// Notifier whose permission request is refused
    pub fn denied() -> Self {
        Self {
            permission_granted: false,
            ..Self::new()
        }
    }

    /// Ignore triggers at or before `now_epoch_secs`
    pub fn with_now(mut self, now_epoch_secs: i64) -> Self {
        self.now_epoch_secs = Some(now_epoch_secs);
        self
    }

    /// Make `cancel_all` fail
    pub fn failing_cancel(mut self) -> Self {
        self.fail_cancel = true;
        self
    }

    /// Let the first `n` schedule calls succeed and fail the rest
    pub fn failing_schedule_after(mut self, n: usize) -> Self {
        self.fail_schedule_after = Some(n);
        self
    }

    pub fn set_permission(&mut self, granted: bool) {
        self.permission_granted = granted;
    }

    /// Reminders currently scheduled
    pub fn pending(&self) -> &[PendingNotification] {
        &self.pending
    }

    /// Every call received, in order
    pub fn calls(&self) -> &[NotifierCall] {
        &self.calls
    }

    /// Number of past-dated triggers that were dropped
    pub fn ignored_past(&self) -> usize {
        self.ignored_past
    }
}

impl Notifier for RecordingNotifier {
    fn request_permission(&mut self) -> Result<bool, EngineError> {
        self.calls.push(NotifierCall::RequestPermission);
        Ok(self.permission_granted)
    }

    fn cancel_all(&mut self) -> Result<(), EngineError> {
        self.calls.push(NotifierCall::CancelAll);
        if self.fail_cancel {
            return Err(EngineError::NotificationSchedule(
                "cancel_all rejected".to_string(),
            ));
        }
        self.pending.clear();
        Ok(())
    }

    fn schedule(
        &mut self,
        trigger_epoch_secs: i64,
        title: &str,
        body: &str,
    ) -> Result<(), EngineError> {
        self.calls.push(NotifierCall::Schedule {
            trigger_epoch_secs,
            title: title.to_string(),
        });

        if let Some(limit) = self.fail_schedule_after {
            if self.schedule_calls >= limit {
                return Err(EngineError::NotificationSchedule(format!(
                    "schedule rejected after {limit} calls"
                )));
            }
        }
        self.schedule_calls += 1;

        if !self.permission_granted {
            return Ok(());
        }
        if matches!(self.now_epoch_secs, Some(now) if trigger_epoch_secs <= now) {
            debug!(trigger_epoch_secs, "ignoring past-dated trigger");
            self.ignored_past += 1;
            return Ok(());
        }

        self.pending.push(PendingNotification {
            trigger_epoch_secs,
            title: title.to_string(),
            body: body.to_string(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_calls() {
        let mut notifier = RecordingNotifier::new();
        assert!(notifier.request_permission().unwrap());
        notifier.schedule(100, "a", "b").unwrap();
        notifier.cancel_all().unwrap();

        assert!(notifier.pending().is_empty());
        assert_eq!(notifier.calls().len(), 3);
        assert_eq!(notifier.calls()[2], NotifierCall::CancelAll);
    }

    #[test]
    fn test_ignores_past_triggers() {
        let mut notifier = RecordingNotifier::new().with_now(1_000);
        notifier.schedule(1_000, "now", "").unwrap();
        notifier.schedule(999, "past", "").unwrap();
        notifier.schedule(1_001, "future", "").unwrap();

        assert_eq!(notifier.pending().len(), 1);
        assert_eq!(notifier.pending()[0].title, "future");
        assert_eq!(notifier.ignored_past(), 2);
    }

    #[test]
    fn test_denied_schedule_is_noop() {
        let mut notifier = RecordingNotifier::denied();
        assert!(!notifier.request_permission().unwrap());
        notifier.schedule(100, "a", "b").unwrap();
        assert!(notifier.pending().is_empty());
    }

    #[test]
    fn test_failure_injection() {
        let mut notifier = RecordingNotifier::new().failing_schedule_after(1);
        assert!(notifier.schedule(10, "first", "").is_ok());
        assert!(notifier.schedule(20, "second", "").is_err());

        let mut notifier = RecordingNotifier::new().failing_cancel();
        assert!(notifier.cancel_all().is_err());
    }
}
