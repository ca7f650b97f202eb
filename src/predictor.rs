//! Period and fertile-window prediction
//!
//! Projects the next period from the latest anchor and the average cycle
//! length. Ovulation is assumed 14 days before the next period; the fertile
//! window is the three days centred on it.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::types::{PredictionWindow, WindowKind};

/// Length of the predicted period window (days, inclusive)
pub const PERIOD_WINDOW_DAYS: i64 = 5;

/// Days between estimated ovulation and the next period start
pub const LUTEAL_PHASE_DAYS: i64 = 14;

/// Days on either side of ovulation included in the fertile window
pub const FERTILE_HALF_SPAN_DAYS: i64 = 1;

/// Output of the predictor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prediction {
    pub period_window: PredictionWindow,
    pub fertile_window: PredictionWindow,
    pub ovulation_day: NaiveDate,
    /// Date the projection was measured from
    pub anchor: NaiveDate,
    /// True when no anchor existed and "today" was used instead
    pub anchor_is_today: bool,
    /// Whole-day cycle length the projection used
    pub cycle_length_days: i64,
}

/// Predictor
pub struct Predictor;

impl Predictor {
    /// Predict the next period and fertile windows.
    ///
    /// `latest_anchor` falls back to `today` when no period has been logged.
    /// Fails with [`EngineError::DateOutOfRange`] when a window would land
    /// outside the supported calendar.
    pub fn predict(
        average_cycle_length: f64,
        latest_anchor: Option<NaiveDate>,
        today: NaiveDate,
    ) -> Result<Prediction, EngineError> {
        let anchor = latest_anchor.unwrap_or(today);
        if !average_cycle_length.is_finite() {
            return Err(EngineError::DateOutOfRange(format!(
                "cycle length {average_cycle_length} is not a number of days"
            )));
        }
        let cycle_length_days = average_cycle_length.round() as i64;

        let period_start = shift(anchor, cycle_length_days)?;
        let period_window = PredictionWindow {
            start_date: period_start,
            end_date: shift(period_start, PERIOD_WINDOW_DAYS - 1)?,
            kind: WindowKind::Period,
        };

        let ovulation_day = shift(period_start, -LUTEAL_PHASE_DAYS)?;
        let fertile_window = PredictionWindow {
            start_date: shift(ovulation_day, -FERTILE_HALF_SPAN_DAYS)?,
            end_date: shift(ovulation_day, FERTILE_HALF_SPAN_DAYS)?,
            kind: WindowKind::Fertile,
        };

        Ok(Prediction {
            period_window,
            fertile_window,
            ovulation_day,
            anchor,
            anchor_is_today: latest_anchor.is_none(),
            cycle_length_days,
        })
    }
}

fn shift(date: NaiveDate, days: i64) -> Result<NaiveDate, EngineError> {
    Duration::try_days(days)
        .and_then(|delta| date.checked_add_signed(delta))
        .ok_or_else(|| EngineError::DateOutOfRange(format!("{date} shifted by {days} days")))
}
