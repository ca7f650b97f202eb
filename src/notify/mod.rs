//! Reminder delivery
//!
//! The engine talks to the platform notification service and the wall clock
//! through two small capability traits so both can be replaced in tests.
//! [`NotificationScheduler`] turns predictions and mined patterns into a
//! deduplicated reminder set and reconciles it against a [`Notifier`].

mod memory;
mod outbox;
mod scheduler;

pub use memory::{NotifierCall, PendingNotification, RecordingNotifier};
pub use outbox::FileOutbox;
pub use scheduler::{NotificationScheduler, ReconcileReport, ReminderPlan};

use chrono::{DateTime, FixedOffset, Local, NaiveDate, NaiveDateTime, TimeZone};

use crate::error::EngineError;

/// Platform notification service
///
/// Each call returns only once the collaborator has finished, so a
/// `cancel_all` is complete before the next `schedule` is issued.
pub trait Notifier {
    /// Ask for (or confirm) permission to post notifications
    fn request_permission(&mut self) -> Result<bool, EngineError>;

    /// Cancel every reminder previously scheduled by this app
    fn cancel_all(&mut self) -> Result<(), EngineError>;

    /// Schedule a one-shot reminder at a Unix timestamp
    fn schedule(
        &mut self,
        trigger_epoch_secs: i64,
        title: &str,
        body: &str,
    ) -> Result<(), EngineError>;
}

/// Source of "now" and of local-time resolution
pub trait Clock {
    fn now(&self) -> DateTime<FixedOffset>;

    /// Local calendar date of `now`
    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }

    /// Resolve a local wall-clock time to a Unix timestamp.
    ///
    /// Returns None when the local time does not exist (e.g. a DST gap).
    fn local_timestamp(&self, local: NaiveDateTime) -> Option<i64> {
        self.now()
            .offset()
            .from_local_datetime(&local)
            .single()
            .map(|t| t.timestamp())
    }
}

/// Host clock in the host's time zone
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        Local::now().fixed_offset()
    }

    fn local_timestamp(&self, local: NaiveDateTime) -> Option<i64> {
        // Ambiguous (fall-back) times resolve to the first occurrence.
        Local
            .from_local_datetime(&local)
            .earliest()
            .map(|t| t.timestamp())
    }
}

/// Clock pinned to a fixed instant and offset
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    now: DateTime<FixedOffset>,
}

impl FixedClock {
    pub fn new(now: DateTime<FixedOffset>) -> Self {
        Self { now }
    }

    /// Clock at `hour`:`minute` local time on `date`, in the given UTC offset
    pub fn at(
        date: NaiveDate,
        hour: u32,
        minute: u32,
        utc_offset_secs: i32,
    ) -> Result<Self, EngineError> {
        let offset = FixedOffset::east_opt(utc_offset_secs).ok_or_else(|| {
            EngineError::InvalidConfig(format!("invalid UTC offset {utc_offset_secs}s"))
        })?;
        let local = date.and_hms_opt(hour, minute, 0).ok_or_else(|| {
            EngineError::InvalidConfig(format!("invalid time {hour:02}:{minute:02}"))
        })?;
        let now = offset
            .from_local_datetime(&local)
            .single()
            .ok_or_else(|| EngineError::InvalidConfig(format!("unresolvable time {local}")))?;
        Ok(Self { now })
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<FixedOffset> {
        self.now
    }
}
