//! Pattern mining
//!
//! Finds factors (symptoms, moods, lifestyle) and low-energy days that recur
//! on the same cycle day across several cycles.
//!
//! Each anchor opens a span that runs up to (not including) the next anchor;
//! the latest anchor's span runs through today. A logged day's cycle-day
//! offset is its distance from the start of the span it falls in. Because a
//! span contains each offset at most once, an occurrence count of N means the
//! pair was seen in N distinct spans.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::config::EngineConfig;
use crate::types::{EnergyLevel, EnergyPattern, Factor, LogMap, SymptomPattern};

/// Output of the pattern miner
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MinedPatterns {
    /// Sorted by (factor, offset)
    pub factor_patterns: Vec<SymptomPattern>,
    /// Sorted by offset
    pub low_energy_patterns: Vec<EnergyPattern>,
    /// Number of cycle spans the logs were bucketed into
    pub spans_examined: usize,
}

impl MinedPatterns {
    pub fn is_empty(&self) -> bool {
        self.factor_patterns.is_empty() && self.low_energy_patterns.is_empty()
    }

    /// Patterns as user-facing sentences
    pub fn insights(&self) -> Vec<String> {
        let factor_lines = self.factor_patterns.iter().map(|p| {
            let verb = match p.factor {
                Factor::Symptom(_) => "get",
                Factor::Mood(_) => "feel",
                Factor::Lifestyle(_) => "log",
            };
            format!(
                "You tend to {} {} on day {} of your cycle.",
                verb, p.factor, p.cycle_day_offset
            )
        });
        let energy_lines = self.low_energy_patterns.iter().map(|p| {
            format!(
                "Your energy is typically low on day {} of your cycle.",
                p.cycle_day_offset
            )
        });
        factor_lines.chain(energy_lines).collect()
    }
}

/// Pattern miner
pub struct PatternMiner;

impl PatternMiner {
    /// Mine recurring (factor, cycle day) pairs.
    ///
    /// `anchors` must be ascending (as produced by the cycle analyzer). The
    /// walk visits each logged day once.
    pub fn mine(
        logs: &LogMap,
        anchors: &[NaiveDate],
        today: NaiveDate,
        config: &EngineConfig,
    ) -> MinedPatterns {
        let Some(&first_anchor) = anchors.first() else {
            return MinedPatterns::default();
        };

        let mut factor_counts: BTreeMap<(Factor, u32), u32> = BTreeMap::new();
        let mut low_energy_counts: BTreeMap<u32, u32> = BTreeMap::new();
        let mut span = 0usize;

        // Days logged before the first anchor belong to no cycle.
        for (date, entry) in logs.range(first_anchor..) {
            while span + 1 < anchors.len() && *date >= anchors[span + 1] {
                span += 1;
            }
            let in_open_span = span + 1 == anchors.len();
            if in_open_span && *date > today {
                break;
            }

            let offset = (*date - anchors[span]).num_days() as u32;

            for factor in entry.factors() {
                *factor_counts.entry((factor, offset)).or_insert(0) += 1;
            }
            if entry.energy == Some(EnergyLevel::Low) {
                *low_energy_counts.entry(offset).or_insert(0) += 1;
            }
        }

        let threshold = config.min_pattern_occurrences;

        let factor_patterns = factor_counts
            .into_iter()
            .filter(|(_, count)| *count >= threshold)
            .map(|((factor, offset), count)| SymptomPattern {
                factor,
                cycle_day_offset: offset,
                occurrence_count: count,
            })
            .collect();

        let low_energy_patterns = low_energy_counts
            .into_iter()
            .filter(|(_, count)| *count >= threshold)
            .map(|(offset, count)| EnergyPattern {
                cycle_day_offset: offset,
                occurrence_count: count,
            })
            .collect();

        MinedPatterns {
            factor_patterns,
            low_energy_patterns,
            spans_examined: anchors.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FlowIntensity, LifestyleFactor, LogEntry, Mood, PhysicalSymptom};
    use chrono::Duration;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn symptom_entry(symptom: PhysicalSymptom) -> LogEntry {
        let mut entry = LogEntry::default();
        entry.physical_symptoms.insert(symptom);
        entry
    }

    fn low_energy_entry() -> LogEntry {
        LogEntry {
            energy: Some(EnergyLevel::Low),
            ..Default::default()
        }
    }

    #[test]
    fn test_no_anchors_no_patterns() {
        let mut logs = LogMap::new();
        logs.insert(date("2024-01-05"), symptom_entry(PhysicalSymptom::Cramps));
        logs.insert(date("2024-02-05"), symptom_entry(PhysicalSymptom::Cramps));

        let patterns = PatternMiner::mine(&logs, &[], date("2024-03-01"), &EngineConfig::default());
        assert!(patterns.is_empty());
        assert_eq!(patterns.spans_examined, 0);
    }

    #[test]
    fn test_recurrence_across_cycles() {
        let anchors = [date("2024-01-01"), date("2024-01-29"), date("2024-02-26")];
        let mut logs = LogMap::new();
        for anchor in anchors {
            logs.insert(anchor, LogEntry::with_flow(FlowIntensity::Heavy));
        }
        // Day 2 bloating in the first two cycles, day 5 once only
        logs.insert(date("2024-01-03"), symptom_entry(PhysicalSymptom::Bloating));
        logs.insert(date("2024-01-31"), symptom_entry(PhysicalSymptom::Bloating));
        logs.insert(date("2024-03-02"), symptom_entry(PhysicalSymptom::Bloating));

        let patterns = PatternMiner::mine(&logs, &anchors, date("2024-03-10"), &EngineConfig::default());

        assert_eq!(
            patterns.factor_patterns,
            vec![SymptomPattern {
                factor: Factor::Symptom(PhysicalSymptom::Bloating),
                cycle_day_offset: 2,
                occurrence_count: 2,
            }]
        );
        assert_eq!(patterns.spans_examined, 3);
    }

    #[test]
    fn test_open_span_counts_until_today() {
        let anchors = [date("2024-01-01"), date("2024-01-29")];
        let mut logs = LogMap::new();
        logs.insert(date("2024-01-04"), low_energy_entry());
        logs.insert(date("2024-02-01"), low_energy_entry());

        let before = PatternMiner::mine(&logs, &anchors, date("2024-01-31"), &EngineConfig::default());
        assert!(before.low_energy_patterns.is_empty());

        let after = PatternMiner::mine(&logs, &anchors, date("2024-02-01"), &EngineConfig::default());
        assert_eq!(
            after.low_energy_patterns,
            vec![EnergyPattern {
                cycle_day_offset: 3,
                occurrence_count: 2
            }]
        );
    }

    #[test]
    fn test_days_before_first_anchor_ignored() {
        let anchors = [date("2024-02-01"), date("2024-03-01")];
        let mut logs = LogMap::new();
        logs.insert(date("2024-01-20"), symptom_entry(PhysicalSymptom::Acne));
        logs.insert(date("2024-02-05"), symptom_entry(PhysicalSymptom::Acne));

        let patterns = PatternMiner::mine(&logs, &anchors, date("2024-03-10"), &EngineConfig::default());
        assert!(patterns.factor_patterns.is_empty());
    }

    #[test]
    fn test_moods_and_lifestyle_are_factors() {
        let anchors = [date("2024-01-01"), date("2024-01-29")];
        let mut logs = LogMap::new();
        for offset in [0, 28] {
            let mut entry = LogEntry::with_flow(FlowIntensity::Medium);
            entry.moods.insert(Mood::Irritable);
            entry.lifestyle.insert(LifestyleFactor::Exercise);
            logs.insert(date("2024-01-01") + Duration::days(offset), entry);
        }

        let patterns = PatternMiner::mine(&logs, &anchors, date("2024-02-10"), &EngineConfig::default());
        let factors: Vec<Factor> = patterns.factor_patterns.iter().map(|p| p.factor).collect();
        assert_eq!(
            factors,
            vec![
                Factor::Mood(Mood::Irritable),
                Factor::Lifestyle(LifestyleFactor::Exercise)
            ]
        );
        assert!(patterns.factor_patterns.iter().all(|p| p.cycle_day_offset == 0));
    }

    #[test]
    fn test_insight_sentences() {
        let patterns = MinedPatterns {
            factor_patterns: vec![SymptomPattern {
                factor: Factor::Symptom(PhysicalSymptom::Cramps),
                cycle_day_offset: 26,
                occurrence_count: 2,
            }],
            low_energy_patterns: vec![EnergyPattern {
                cycle_day_offset: 1,
                occurrence_count: 3,
            }],
            spans_examined: 3,
        };
        assert_eq!(
            patterns.insights(),
            vec![
                "You tend to get Cramps on day 26 of your cycle.".to_string(),
                "Your energy is typically low on day 1 of your cycle.".to_string(),
            ]
        );
    }

    #[test]
    fn test_higher_threshold() {
        let anchors = [date("2024-01-01"), date("2024-01-29")];
        let mut logs = LogMap::new();
        logs.insert(date("2024-01-02"), low_energy_entry());
        logs.insert(date("2024-01-30"), low_energy_entry());

        let config = EngineConfig {
            min_pattern_occurrences: 3,
            ..Default::default()
        };
        let patterns = PatternMiner::mine(&logs, &anchors, date("2024-02-10"), &config);
        assert!(patterns.low_energy_patterns.is_empty());
    }
}
