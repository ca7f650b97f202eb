//! Reminder planning and reconciliation
//!
//! Every pass replaces the whole reminder set: permission check, cancel
//! everything, then schedule the freshly planned reminders. Nothing is
//! diffed against what was scheduled before.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::{Clock, Notifier};
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::patterns::MinedPatterns;
use crate::predictor::Prediction;
use crate::types::{Factor, ReminderKey, ReminderKind, ScheduledReminder};

const PERIOD_TITLE: &str = "Heads up!";
const PERIOD_BODY: &str = "Your period is predicted to start tomorrow. Remember to pack your kit.";
const SYMPTOM_TITLE: &str = "Symptom Alert";
const LOW_ENERGY_TITLE: &str = "Workout Suggestion";

/// Reminders computed for one pass, before any notifier call
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderPlan {
    /// Future reminders, ordered by trigger time. Keys are unique.
    pub reminders: Vec<ScheduledReminder>,
    /// Candidates dropped because their trigger was not in the future, did
    /// not exist locally, or fell outside the calendar
    pub skipped_past: usize,
}

/// Result of a completed reconciliation pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileReport {
    pub pass_id: Uuid,
    pub scheduled: Vec<ScheduledReminder>,
    pub skipped_past: usize,
}

enum Draft {
    Period,
    Factors { offset: u32, factors: Vec<Factor> },
    LowEnergy { offset: u32 },
}

impl Draft {
    fn title(&self) -> &'static str {
        match self {
            Draft::Period => PERIOD_TITLE,
            Draft::Factors { .. } => SYMPTOM_TITLE,
            Draft::LowEnergy { .. } => LOW_ENERGY_TITLE,
        }
    }

    fn body(&self) -> String {
        match self {
            Draft::Period => PERIOD_BODY.to_string(),
            Draft::Factors { offset, factors } => {
                let names: Vec<&str> = factors.iter().map(|f| f.label()).collect();
                format!(
                    "Based on your logs, you might experience {} on day {} of your cycle.",
                    names.join(", "),
                    offset
                )
            }
            Draft::LowEnergy { offset } => format!(
                "Based on your logs, your energy is typically low on day {offset} of your cycle. Consider a lighter workout today."
            ),
        }
    }
}

pub struct NotificationScheduler<'a> {
    config: &'a EngineConfig,
}

impl<'a> NotificationScheduler<'a> {
    pub fn new(config: &'a EngineConfig) -> Self {
        Self { config }
    }

    /// Compute the deduplicated reminder set without touching a notifier
    pub fn plan<C: Clock + ?Sized>(
        &self,
        prediction: &Prediction,
        patterns: &MinedPatterns,
        clock: &C,
    ) -> ReminderPlan {
        let period_start = prediction.period_window.start_date;
        let mut drafts: BTreeMap<ReminderKey, Draft> = BTreeMap::new();

        let mut plan = ReminderPlan::default();

        match shift(period_start, -1) {
            Some(target) => {
                drafts.insert(key(ReminderKind::PeriodUpcoming, target), Draft::Period);
            }
            None => plan.skipped_past += 1,
        }

        for pattern in &patterns.factor_patterns {
            let Some(target) = shift(period_start, i64::from(pattern.cycle_day_offset)) else {
                plan.skipped_past += 1;
                continue;
            };
            let draft = drafts
                .entry(key(ReminderKind::SymptomPattern, target))
                .or_insert_with(|| Draft::Factors {
                    offset: pattern.cycle_day_offset,
                    factors: Vec::new(),
                });
            if let Draft::Factors { factors, .. } = draft {
                factors.push(pattern.factor);
            }
        }

        for pattern in &patterns.low_energy_patterns {
            let Some(target) = shift(period_start, i64::from(pattern.cycle_day_offset)) else {
                plan.skipped_past += 1;
                continue;
            };
            drafts
                .entry(key(ReminderKind::LowEnergy, target))
                .or_insert(Draft::LowEnergy {
                    offset: pattern.cycle_day_offset,
                });
        }

        let now = clock.now().timestamp();

        for (key, draft) in drafts {
            let trigger = key
                .target_date
                .and_hms_opt(self.config.reminder_hour, 0, 0)
                .and_then(|local| clock.local_timestamp(local).map(|ts| (local, ts)));

            match trigger {
                Some((trigger_local, ts)) if ts > now => plan.reminders.push(ScheduledReminder {
                    kind: key.kind,
                    target_date: key.target_date,
                    trigger_local,
                    trigger_epoch_secs: ts,
                    title: draft.title().to_string(),
                    body: draft.body(),
                }),
                _ => {
                    debug!(kind = key.kind.as_str(), date = %key.target_date, "skipping non-future reminder");
                    plan.skipped_past += 1;
                }
            }
        }

        plan.reminders
            .sort_by_key(|r| (r.trigger_epoch_secs, r.kind));
        plan
    }

    /// Replace every scheduled reminder with a freshly planned set.
    ///
    /// Without permission nothing is cancelled or scheduled. A failed
    /// cancel aborts before any new reminder is scheduled.
    pub fn reconcile<N: Notifier + ?Sized, C: Clock + ?Sized>(
        &self,
        notifier: &mut N,
        clock: &C,
        prediction: &Prediction,
        patterns: &MinedPatterns,
    ) -> Result<ReconcileReport, EngineError> {
        let pass_id = Uuid::new_v4();

        if !notifier.request_permission()? {
            warn!(%pass_id, "notification permission not granted; reminders left unchanged");
            return Err(EngineError::NotificationPermissionDenied);
        }

        notifier.cancel_all().map_err(|e| {
            warn!(%pass_id, error = %e, "cancel_all failed; reconciliation aborted");
            e
        })?;

        let plan = self.plan(prediction, patterns, clock);
        for reminder in &plan.reminders {
            notifier.schedule(reminder.trigger_epoch_secs, &reminder.title, &reminder.body)?;
        }

        info!(
            %pass_id,
            scheduled = plan.reminders.len(),
            skipped_past = plan.skipped_past,
            "reminders reconciled"
        );

        Ok(ReconcileReport {
            pass_id,
            scheduled: plan.reminders,
            skipped_past: plan.skipped_past,
        })
    }
}

fn key(kind: ReminderKind, target_date: NaiveDate) -> ReminderKey {
    ReminderKey { kind, target_date }
}

fn shift(date: NaiveDate, days: i64) -> Option<NaiveDate> {
    date.checked_add_signed(Duration::days(days))
}
