//! Engine passes against the JSON file store and the file outbox

use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use std::fs;
use tempfile::tempdir;

use cycle_intel::notify::{Clock, FileOutbox, FixedClock};
use cycle_intel::pipeline::{CycleEngine, ReminderStatus};
use cycle_intel::store::{JsonFileLogStore, LogStore, LOG_FILE_NAME};
use cycle_intel::types::{FlowIntensity, LogEntry, PhysicalSymptom};
use cycle_intel::EngineError;

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn engine_in(
    dir: &std::path::Path,
    today: &str,
) -> CycleEngine<JsonFileLogStore, FileOutbox, FixedClock> {
    let clock = FixedClock::at(date(today), 12, 0, 0).unwrap();
    let outbox = FileOutbox::in_dir(dir, clock.now().timestamp());
    CycleEngine::new(JsonFileLogStore::in_dir(dir), outbox, clock)
}

#[test]
fn logs_and_reminders_survive_restart() {
    let dir = tempdir().unwrap();

    let mut engine = engine_in(dir.path(), "2024-03-01");
    for d in ["2024-01-01", "2024-01-29", "2024-02-26"] {
        engine
            .save_log(date(d), LogEntry::with_flow(FlowIntensity::Heavy))
            .unwrap();
    }
    drop(engine);

    let engine = engine_in(dir.path(), "2024-03-02");
    let analysis = engine.recompute().unwrap();
    assert_eq!(analysis.cycle.observed_lengths, vec![28, 28]);

    let pending = engine.notifier().pending().unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].title, "Heads up!");
}

#[test]
fn save_replaces_whole_entry() {
    let dir = tempdir().unwrap();
    let mut engine = engine_in(dir.path(), "2024-03-01");

    let mut first = LogEntry::with_flow(FlowIntensity::Heavy);
    first.physical_symptoms.insert(PhysicalSymptom::Cramps);
    engine.save_log(date("2024-02-29"), first).unwrap();

    let second = LogEntry::with_flow(FlowIntensity::Light);
    engine.save_log(date("2024-02-29"), second.clone()).unwrap();

    let logs = engine.store().get_all().unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[&date("2024-02-29")], second);
}

#[test]
fn corrupt_log_file_aborts_before_reminders() {
    let dir = tempdir().unwrap();
    let mut engine = engine_in(dir.path(), "2024-03-01");
    engine
        .save_log(date("2024-02-26"), LogEntry::with_flow(FlowIntensity::Heavy))
        .unwrap();
    let pending_before = engine.notifier().pending().unwrap();

    fs::write(dir.path().join(LOG_FILE_NAME), "{ not json").unwrap();

    let result = engine.run_pass();
    assert!(matches!(result, Err(EngineError::PersistenceRead(_))));
    assert_eq!(engine.notifier().pending().unwrap(), pending_before);
}

#[test]
fn revoked_outbox_permission_is_reported() {
    let dir = tempdir().unwrap();
    let mut engine = engine_in(dir.path(), "2024-03-01");
    FileOutbox::in_dir(dir.path(), 0).set_permission(false).unwrap();

    let outcome = engine
        .save_log(date("2024-02-26"), LogEntry::with_flow(FlowIntensity::Heavy))
        .unwrap();

    assert_eq!(outcome.reminders, ReminderStatus::PermissionDenied);
    assert_eq!(engine.store().get_all().unwrap().len(), 1);
    assert!(engine.notifier().pending().unwrap().is_empty());
}
