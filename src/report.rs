//! Report and export
//!
//! Renders a read-only snapshot of the logs plus the derived analysis, either
//! as a plain-text report or as a JSON document.

use serde::Serialize;

use crate::error::EngineError;
use crate::pipeline::Analysis;
use crate::types::{FlowIntensity, LogEntry, LogMap, DATE_FORMAT};

pub const REPORT_TITLE: &str = "Cycle & Symptom Report";

const NO_DATA: &str = "No data logged for this day.";
const NO_INSIGHTS: &str = "Not enough data to identify patterns yet.";

/// Render the plain-text report.
///
/// Dates are listed in ascending order with every field that was logged,
/// followed by the prediction summary and pattern insights.
pub fn render_text(logs: &LogMap, analysis: &Analysis) -> String {
    let mut lines = vec![
        REPORT_TITLE.to_string(),
        format!("Generated for {}", analysis.today.format(DATE_FORMAT)),
        String::new(),
    ];

    if logs.is_empty() {
        lines.push("No logs recorded.".to_string());
    }
    for (date, entry) in logs {
        lines.push(date.format(DATE_FORMAT).to_string());
        let fields = entry_fields(entry);
        if fields.is_empty() {
            lines.push(format!("  {NO_DATA}"));
        } else {
            lines.extend(fields.into_iter().map(|(name, value)| format!("  {name}: {value}")));
        }
    }

    let cycle = &analysis.cycle;
    let prediction = &analysis.prediction;
    lines.push(String::new());
    lines.push("Prediction".to_string());
    lines.push(format!(
        "  Average cycle length: {:.1} days ({} cycles observed)",
        cycle.average_cycle_length, cycle.stats.cycles_observed
    ));
    if prediction.anchor_is_today {
        lines.push("  No period logged yet; projected from today.".to_string());
    } else {
        lines.push(format!("  Last period day: {}", prediction.anchor.format(DATE_FORMAT)));
    }
    lines.push(format!(
        "  Next period: {} to {}",
        prediction.period_window.start_date.format(DATE_FORMAT),
        prediction.period_window.end_date.format(DATE_FORMAT)
    ));
    lines.push(format!(
        "  Fertile window: {} to {}",
        prediction.fertile_window.start_date.format(DATE_FORMAT),
        prediction.fertile_window.end_date.format(DATE_FORMAT)
    ));
    lines.push(format!(
        "  Estimated ovulation: {}",
        prediction.ovulation_day.format(DATE_FORMAT)
    ));

    lines.push(String::new());
    lines.push("Insights".to_string());
    let insights = analysis.patterns.insights();
    if insights.is_empty() {
        lines.push(format!("  {NO_INSIGHTS}"));
    } else {
        lines.extend(insights.into_iter().map(|line| format!("  - {line}")));
    }

    let mut text = lines.join("\n");
    text.push('\n');
    text
}

#[derive(Serialize)]
struct Snapshot<'a> {
    report: &'static str,
    engine_version: &'static str,
    logs: &'a LogMap,
    analysis: &'a Analysis,
}

/// Export logs and analysis as pretty JSON
pub fn export_json(logs: &LogMap, analysis: &Analysis) -> Result<String, EngineError> {
    let snapshot = Snapshot {
        report: REPORT_TITLE,
        engine_version: crate::ENGINE_VERSION,
        logs,
        analysis,
    };
    Ok(serde_json::to_string_pretty(&snapshot)?)
}

fn joined<T: std::fmt::Display>(items: impl IntoIterator<Item = T>) -> String {
    items
        .into_iter()
        .map(|item| item.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

fn entry_fields(entry: &LogEntry) -> Vec<(&'static str, String)> {
    let mut fields = Vec::new();
    if entry.flow != FlowIntensity::None {
        fields.push(("Flow", entry.flow.to_string()));
    }
    if !entry.physical_symptoms.is_empty() {
        fields.push(("Symptoms", joined(&entry.physical_symptoms)));
    }
    if !entry.moods.is_empty() {
        fields.push(("Moods", joined(&entry.moods)));
    }
    if let Some(energy) = entry.energy {
        fields.push(("Energy", energy.to_string()));
    }
    if let Some(sleep) = entry.sleep {
        fields.push(("Sleep", sleep.to_string()));
    }
    if let Some(focus) = entry.focus {
        fields.push(("Focus", focus.to_string()));
    }
    if !entry.lifestyle.is_empty() {
        fields.push(("Lifestyle", joined(&entry.lifestyle)));
    }
    let notes = entry.notes.trim();
    if !notes.is_empty() {
        fields.push(("Notes", notes.to_string()));
    }
    fields
}
