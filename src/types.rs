//! Core types for the Cycle Intel pipeline
//!
//! This module defines the data that flows through each stage: daily log
//! entries as the user records them, the derived cycle records, prediction
//! windows, mined patterns and the reminders produced from them.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use crate::error::EngineError;

/// Calendar date format used for log keys (YYYY-MM-DD)
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// All daily logs keyed by calendar date. Ordered so every stage iterates
/// dates ascending.
pub type LogMap = BTreeMap<NaiveDate, LogEntry>;

/// Parse a `YYYY-MM-DD` date key
pub fn parse_date(s: &str) -> Result<NaiveDate, EngineError> {
    NaiveDate::parse_from_str(s.trim(), DATE_FORMAT)
        .map_err(|e| EngineError::DateParseError(format!("{s}: {e}")))
}

/// Declares a closed set of log options with a stable snake_case key and a
/// display label.
macro_rules! log_option {
    (
        $(#[$meta:meta])*
        $name:ident { $($variant:ident => ($key:literal, $label:literal)),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            /// Every option, in declaration order
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Stable snake_case key (matches the serialized form)
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $key),+
                }
            }

            /// Human-readable label
            pub fn label(&self) -> &'static str {
                match self {
                    $($name::$variant => $label),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        }

        impl FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let wanted = s.trim().to_ascii_lowercase().replace([' ', '-'], "_");
                $name::ALL
                    .iter()
                    .copied()
                    .find(|v| v.as_str() == wanted)
                    .ok_or_else(|| {
                        let keys: Vec<&str> = $name::ALL.iter().map(|v| v.as_str()).collect();
                        format!("unknown {} '{}' (expected one of: {})", stringify!($name), s, keys.join(", "))
                    })
            }
        }
    };
}

log_option! {
    /// Menstrual flow intensity recorded for a day
    FlowIntensity {
        None => ("none", "None"),
        Spotting => ("spotting", "Spotting"),
        Light => ("light", "Light"),
        Medium => ("medium", "Medium"),
        Heavy => ("heavy", "Heavy"),
        Flooding => ("flooding", "Flooding"),
    }
}

impl FlowIntensity {
    /// Whether this intensity marks the day as a cycle anchor
    pub fn is_active_period(&self) -> bool {
        matches!(
            self,
            FlowIntensity::Medium | FlowIntensity::Heavy | FlowIntensity::Flooding
        )
    }
}

impl Default for FlowIntensity {
    fn default() -> Self {
        FlowIntensity::None
    }
}

log_option! {
    /// Physical symptoms
    PhysicalSymptom {
        Cramps => ("cramps", "Cramps"),
        Headaches => ("headaches", "Headaches"),
        Bloating => ("bloating", "Bloating"),
        Acne => ("acne", "Acne"),
        BreastTenderness => ("breast_tenderness", "Breast Tenderness"),
        Fatigue => ("fatigue", "Fatigue"),
    }
}

log_option! {
    Mood {
        Happy => ("happy", "Happy"),
        Calm => ("calm", "Calm"),
        Sad => ("sad", "Sad"),
        Anxious => ("anxious", "Anxious"),
        Angry => ("angry", "Angry"),
        Irritable => ("irritable", "Irritable"),
    }
}

log_option! {
    EnergyLevel {
        Low => ("low", "Low"),
        Medium => ("medium", "Medium"),
        High => ("high", "High"),
    }
}

log_option! {
    SleepQuality {
        Poor => ("poor", "Poor"),
        Fair => ("fair", "Fair"),
        Good => ("good", "Good"),
    }
}

log_option! {
    FocusLevel {
        Poor => ("poor", "Poor"),
        Fair => ("fair", "Fair"),
        Good => ("good", "Good"),
    }
}

log_option! {
    /// Lifestyle factors that may correlate with the cycle
    LifestyleFactor {
        Exercise => ("exercise", "Exercise"),
        SexualActivityProtected => ("sexual_activity_protected", "Sexual Activity (Protected)"),
        SexualActivityUnprotected => ("sexual_activity_unprotected", "Sexual Activity (Unprotected)"),
        Medication => ("medication", "Medication"),
        Stress => ("stress", "Stress"),
        Travel => ("travel", "Travel"),
    }
}

/// One day's log. Saving a day always replaces the whole entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogEntry {
    pub flow: FlowIntensity,
    pub physical_symptoms: BTreeSet<PhysicalSymptom>,
    pub moods: BTreeSet<Mood>,
    pub energy: Option<EnergyLevel>,
    pub sleep: Option<SleepQuality>,
    pub focus: Option<FocusLevel>,
    pub lifestyle: BTreeSet<LifestyleFactor>,
    pub notes: String,
}

impl LogEntry {
    /// Entry with only a flow intensity set
    pub fn with_flow(flow: FlowIntensity) -> Self {
        Self {
            flow,
            ..Default::default()
        }
    }

    /// All pattern-mining factors present on this day
    pub fn factors(&self) -> impl Iterator<Item = Factor> + '_ {
        self.physical_symptoms
            .iter()
            .map(|s| Factor::Symptom(*s))
            .chain(self.moods.iter().map(|m| Factor::Mood(*m)))
            .chain(self.lifestyle.iter().map(|l| Factor::Lifestyle(*l)))
    }

    /// True when nothing beyond "no flow" was recorded
    pub fn is_empty(&self) -> bool {
        self.flow == FlowIntensity::None
            && self.physical_symptoms.is_empty()
            && self.moods.is_empty()
            && self.energy.is_none()
            && self.sleep.is_none()
            && self.focus.is_none()
            && self.lifestyle.is_empty()
            && self.notes.trim().is_empty()
    }
}

/// A loggable factor that pattern mining correlates with cycle day
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "category", content = "value", rename_all = "snake_case")]
pub enum Factor {
    Symptom(PhysicalSymptom),
    Mood(Mood),
    Lifestyle(LifestyleFactor),
}

impl Factor {
    pub fn label(&self) -> &'static str {
        match self {
            Factor::Symptom(s) => s.label(),
            Factor::Mood(m) => m.label(),
            Factor::Lifestyle(l) => l.label(),
        }
    }
}

impl fmt::Display for Factor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A cycle anchor and the interval to the next anchor, once observed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleRecord {
    /// Qualifying period day this record starts from
    pub anchor: NaiveDate,
    /// Days until the next anchor (None for the latest anchor)
    pub interval_days: Option<i64>,
    /// Whether the interval was accepted into the rolling average
    pub counted: bool,
}

/// Which kind of window a prediction describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowKind {
    Period,
    Fertile,
}

/// Inclusive date span produced by the predictor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictionWindow {
    pub start_date: NaiveDate,
    /// Inclusive
    pub end_date: NaiveDate,
    pub kind: WindowKind,
}

impl PredictionWindow {
    /// Number of calendar days covered, counting both ends
    pub fn len_days(&self) -> i64 {
        (self.end_date - self.start_date).num_days() + 1
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start_date && date <= self.end_date
    }
}

/// A factor that recurred on the same cycle day in several cycles
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymptomPattern {
    pub factor: Factor,
    /// Days since the cycle anchor (0 = anchor day)
    pub cycle_day_offset: u32,
    /// Number of distinct cycles the pair was seen in
    pub occurrence_count: u32,
}

/// Low energy that recurred on the same cycle day in several cycles
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnergyPattern {
    pub cycle_day_offset: u32,
    pub occurrence_count: u32,
}

/// Reminder categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReminderKind {
    PeriodUpcoming,
    SymptomPattern,
    LowEnergy,
}

impl ReminderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReminderKind::PeriodUpcoming => "period_upcoming",
            ReminderKind::SymptomPattern => "symptom_pattern",
            ReminderKind::LowEnergy => "low_energy",
        }
    }
}

/// Idempotency key: at most one reminder per kind per local calendar date
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ReminderKey {
    pub kind: ReminderKind,
    pub target_date: NaiveDate,
}

/// A concrete reminder handed to the notification collaborator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledReminder {
    pub kind: ReminderKind,
    /// Local calendar date the reminder fires on
    pub target_date: NaiveDate,
    /// Local wall-clock trigger time
    pub trigger_local: NaiveDateTime,
    /// Trigger time as Unix epoch seconds
    pub trigger_epoch_secs: i64,
    pub title: String,
    pub body: String,
}

impl ScheduledReminder {
    pub fn idempotency_key(&self) -> ReminderKey {
        ReminderKey {
            kind: self.kind,
            target_date: self.target_date,
        }
    }
}
