//! Pipeline orchestration
//!
//! This module provides the public API for Cycle Intel. A pass reads every
//! stored log and runs it through the full pipeline:
//!
//! 1. CycleAnalyzer - anchors, cycle lengths and their average
//! 2. Predictor - next period and fertile windows
//! 3. PatternMiner - recurring factors and low-energy days by cycle day
//! 4. NotificationScheduler - cancel and reschedule reminders
//!
//! Every output is recomputed from the full log map on each pass.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::cycle::{CycleAnalysis, CycleAnalyzer};
use crate::error::EngineError;
use crate::notify::{Clock, NotificationScheduler, Notifier, ReconcileReport, ReminderPlan};
use crate::patterns::{MinedPatterns, PatternMiner};
use crate::predictor::{Prediction, Predictor};
use crate::store::LogStore;
use crate::types::{LogEntry, LogMap};

/// Everything derived from one snapshot of the logs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    /// Local date the analysis was computed for
    pub today: NaiveDate,
    pub cycle: CycleAnalysis,
    pub prediction: Prediction,
    pub patterns: MinedPatterns,
}

/// Run stages 1-3 over a log snapshot.
///
/// Pure: identical inputs always give identical output. Logs dated so close
/// to the calendar limits that a window cannot be represented give
/// [`EngineError::DateOutOfRange`].
///
/// # Example
/// ```ignore
/// let analysis = analyze_logs(&logs, today, &EngineConfig::default())?;
/// println!("next period: {}", analysis.prediction.period_window.start_date);
/// ```
pub fn analyze_logs(
    logs: &LogMap,
    today: NaiveDate,
    config: &EngineConfig,
) -> Result<Analysis, EngineError> {
    // Stage 1: Cycle boundaries and average length
    let cycle = CycleAnalyzer::analyze(logs, config);
    debug!(
        anchors = cycle.anchors.len(),
        observed = cycle.observed_lengths.len(),
        excluded = cycle.excluded_samples,
        average = cycle.average_cycle_length,
        "cycle analysis complete"
    );

    // Stage 2: Windows
    let prediction =
        Predictor::predict(cycle.average_cycle_length, cycle.latest_anchor(), today)?;
    debug!(
        period_start = %prediction.period_window.start_date,
        fertile_start = %prediction.fertile_window.start_date,
        "prediction complete"
    );

    // Stage 3: Patterns
    let patterns = PatternMiner::mine(logs, &cycle.anchors, today, config);
    debug!(
        factor_patterns = patterns.factor_patterns.len(),
        low_energy_patterns = patterns.low_energy_patterns.len(),
        "pattern mining complete"
    );

    Ok(Analysis {
        today,
        cycle,
        prediction,
        patterns,
    })
}

/// What happened to the reminders during a pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ReminderStatus {
    Scheduled(ReconcileReport),
    /// Nothing was cancelled or scheduled
    PermissionDenied,
    /// The pass stopped early; the reminder set may be stale until the next pass
    Failed { message: String },
}

impl ReminderStatus {
    pub fn is_scheduled(&self) -> bool {
        matches!(self, ReminderStatus::Scheduled(_))
    }
}

/// Result of a full pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PassOutcome {
    pub analysis: Analysis,
    pub reminders: ReminderStatus,
}

/// Engine over an injected log store, notifier and clock.
///
/// Use this as the single entry point for log saves; each save triggers
/// exactly one pass.
pub struct CycleEngine<S, N, C> {
    store: S,
    notifier: N,
    clock: C,
    config: EngineConfig,
}

impl<S: LogStore, N: Notifier, C: Clock> CycleEngine<S, N, C> {
    /// Create an engine with default thresholds
    pub fn new(store: S, notifier: N, clock: C) -> Self {
        Self {
            store,
            notifier,
            clock,
            config: EngineConfig::default(),
        }
    }

    /// Replace the configuration after validating it
    pub fn with_config(mut self, config: EngineConfig) -> Result<Self, EngineError> {
        config.validate()?;
        self.config = config;
        Ok(self)
    }

    /// Persist a log and run a full pass.
    ///
    /// A write or read failure is returned before the notifier is touched.
    /// Notification failures are reported in the outcome and never undo the
    /// saved log.
    pub fn save_log(&mut self, date: NaiveDate, entry: LogEntry) -> Result<PassOutcome, EngineError> {
        self.store.upsert(date, entry)?;
        debug!(%date, "log saved");
        self.run_pass()
    }

    /// Run a full pass over the current store contents
    pub fn run_pass(&mut self) -> Result<PassOutcome, EngineError> {
        let analysis = self.recompute()?;

        let reminders = match self.reconcile(&analysis) {
            Ok(report) => ReminderStatus::Scheduled(report),
            Err(EngineError::NotificationPermissionDenied) => ReminderStatus::PermissionDenied,
            Err(e) => {
                warn!(error = %e, "reminder reconciliation failed");
                ReminderStatus::Failed {
                    message: e.to_string(),
                }
            }
        };

        info!(
            today = %analysis.today,
            average = analysis.cycle.average_cycle_length,
            next_period = %analysis.prediction.period_window.start_date,
            reminders_scheduled = reminders.is_scheduled(),
            "pass complete"
        );

        Ok(PassOutcome {
            analysis,
            reminders,
        })
    }

    /// Read the store and analyze it without touching the notifier
    pub fn recompute(&self) -> Result<Analysis, EngineError> {
        let logs = self.store.get_all()?;
        analyze_logs(&logs, self.clock.today(), &self.config)
    }

    /// Reconcile reminders for an existing analysis
    pub fn reconcile(&mut self, analysis: &Analysis) -> Result<ReconcileReport, EngineError> {
        NotificationScheduler::new(&self.config).reconcile(
            &mut self.notifier,
            &self.clock,
            &analysis.prediction,
            &analysis.patterns,
        )
    }

    /// Reminders a reconcile would schedule right now
    pub fn plan_reminders(&self, analysis: &Analysis) -> ReminderPlan {
        NotificationScheduler::new(&self.config).plan(
            &analysis.prediction,
            &analysis.patterns,
            &self.clock,
        )
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Consume the engine and hand back its collaborators
    pub fn into_parts(self) -> (S, N, C) {
        (self.store, self.notifier, self.clock)
    }
}
