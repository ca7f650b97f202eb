//! Property tests over randomly generated log histories

use chrono::{Duration, NaiveDate};
use proptest::prelude::*;
use std::collections::HashSet;

use cycle_intel::config::EngineConfig;
use cycle_intel::cycle::CycleAnalyzer;
use cycle_intel::notify::{FixedClock, NotificationScheduler};
use cycle_intel::pipeline::analyze_logs;
use cycle_intel::predictor::Predictor;
use cycle_intel::types::{
    EnergyLevel, FlowIntensity, LifestyleFactor, LogEntry, LogMap, Mood, PhysicalSymptom,
};

fn base_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2023, 1, 1).unwrap()
}

fn arb_flow() -> impl Strategy<Value = FlowIntensity> {
    prop::sample::select(FlowIntensity::ALL.to_vec())
}

fn arb_entry() -> impl Strategy<Value = LogEntry> {
    (
        arb_flow(),
        prop::collection::btree_set(prop::sample::select(PhysicalSymptom::ALL.to_vec()), 0..3),
        prop::collection::btree_set(prop::sample::select(Mood::ALL.to_vec()), 0..2),
        prop::option::of(prop::sample::select(EnergyLevel::ALL.to_vec())),
        prop::collection::btree_set(prop::sample::select(LifestyleFactor::ALL.to_vec()), 0..2),
    )
        .prop_map(|(flow, physical_symptoms, moods, energy, lifestyle)| LogEntry {
            flow,
            physical_symptoms,
            moods,
            energy,
            lifestyle,
            ..Default::default()
        })
}

/// Up to 120 logged days spread over roughly a year
fn arb_logs() -> impl Strategy<Value = LogMap> {
    prop::collection::btree_map(0i64..365, arb_entry(), 0..120).prop_map(|days| {
        days.into_iter()
            .map(|(offset, entry)| (base_date() + Duration::days(offset), entry))
            .collect()
    })
}

fn today() -> NaiveDate {
    base_date() + Duration::days(380)
}

proptest! {
    #[test]
    fn average_defaults_without_two_anchors(logs in arb_logs()) {
        let analysis = CycleAnalyzer::analyze(&logs, &EngineConfig::default());
        if analysis.anchors.len() < 2 {
            prop_assert_eq!(analysis.average_cycle_length, 28.0);
        }
    }

    #[test]
    fn accepted_lengths_stay_in_range(logs in arb_logs()) {
        let config = EngineConfig::default();
        let analysis = CycleAnalyzer::analyze(&logs, &config);

        for length in &analysis.observed_lengths {
            prop_assert!((20..=40).contains(length));
        }
        // Every consecutive pair is either counted or excluded
        prop_assert_eq!(
            analysis.observed_lengths.len() + analysis.excluded_samples,
            analysis.anchors.len().saturating_sub(1)
        );
    }

    #[test]
    fn anchor_advances_past_any_gap(gap in 1i64..90) {
        let first = base_date();
        let second = first + Duration::days(gap);
        let third = second + Duration::days(28);
        let logs: LogMap = [first, second, third]
            .into_iter()
            .map(|d| (d, LogEntry::with_flow(FlowIntensity::Heavy)))
            .collect();

        let analysis = CycleAnalyzer::analyze(&logs, &EngineConfig::default());

        // The 28-day interval is always measured from the second anchor
        prop_assert_eq!(analysis.observed_lengths.last(), Some(&28));
        if (20..=40).contains(&gap) {
            prop_assert_eq!(analysis.observed_lengths.clone(), vec![gap, 28]);
        } else {
            prop_assert_eq!(analysis.observed_lengths.clone(), vec![28]);
            prop_assert_eq!(analysis.excluded_samples, 1);
        }
    }

    #[test]
    fn window_spans_are_fixed(average in 1.0f64..60.0, anchor_offset in 0i64..365) {
        let anchor = base_date() + Duration::days(anchor_offset);
        let prediction = Predictor::predict(average, Some(anchor), today()).unwrap();

        prop_assert_eq!(prediction.period_window.len_days(), 5);
        prop_assert_eq!(prediction.fertile_window.len_days(), 3);
        prop_assert_eq!(
            prediction.period_window.start_date - prediction.ovulation_day,
            Duration::days(14)
        );
        prop_assert!(prediction.fertile_window.contains(prediction.ovulation_day));
    }

    #[test]
    fn patterns_always_recur(logs in arb_logs()) {
        let analysis = analyze_logs(&logs, today(), &EngineConfig::default()).unwrap();

        for pattern in &analysis.patterns.factor_patterns {
            prop_assert!(pattern.occurrence_count > 1);
        }
        for pattern in &analysis.patterns.low_energy_patterns {
            prop_assert!(pattern.occurrence_count > 1);
        }
    }

    #[test]
    fn reminder_keys_unique(logs in arb_logs(), hour in 0u32..24) {
        let config = EngineConfig::default();
        let analysis = analyze_logs(&logs, today(), &config).unwrap();
        let clock = FixedClock::at(analysis.prediction.anchor, hour, 0, 0).unwrap();
        let plan = NotificationScheduler::new(&config).plan(
            &analysis.prediction,
            &analysis.patterns,
            &clock,
        );

        let keys: HashSet<_> = plan.reminders.iter().map(|r| r.idempotency_key()).collect();
        prop_assert_eq!(keys.len(), plan.reminders.len());
    }

    #[test]
    fn analysis_is_deterministic(logs in arb_logs()) {
        let config = EngineConfig::default();
        let first = analyze_logs(&logs, today(), &config).unwrap();
        let second = analyze_logs(&logs.clone(), today(), &config).unwrap();
        prop_assert_eq!(first, second);
    }
}
