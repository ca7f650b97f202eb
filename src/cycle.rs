//! Cycle analysis
//!
//! Derives cycle anchors from the daily logs and computes the observed cycle
//! lengths and their average.
//!
//! Every day with an active-period flow (medium or heavier) is an anchor.
//! Consecutive anchors are compared pairwise; the gap is kept as a cycle
//! length only when it falls inside the configured range, but the comparison
//! baseline always rolls forward to the newer anchor. Consecutive bleeding
//! days therefore produce short gaps that are dropped rather than being
//! clustered into a single period start.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::types::{CycleRecord, LogMap};

/// Summary statistics for display
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleStats {
    /// Number of logged days with active-period flow
    pub tracked_period_days: usize,
    /// Number of accepted cycle lengths
    pub cycles_observed: usize,
    pub shortest_cycle: Option<i64>,
    pub longest_cycle: Option<i64>,
    pub last_anchor: Option<NaiveDate>,
}

/// Output of the cycle analyzer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleAnalysis {
    /// Qualifying dates, ascending
    pub anchors: Vec<NaiveDate>,
    /// One record per anchor
    pub cycles: Vec<CycleRecord>,
    /// Accepted cycle lengths in days, oldest first
    pub observed_lengths: Vec<i64>,
    /// Mean of `observed_lengths`, or the configured default when empty
    pub average_cycle_length: f64,
    /// Intervals rejected for falling outside the accepted range
    pub excluded_samples: usize,
    pub stats: CycleStats,
}

impl CycleAnalysis {
    /// Most recent anchor, if any
    pub fn latest_anchor(&self) -> Option<NaiveDate> {
        self.anchors.last().copied()
    }

    /// True when the average comes from observed data rather than the default
    pub fn has_observed_cycles(&self) -> bool {
        !self.observed_lengths.is_empty()
    }
}

/// Cycle analyzer
pub struct CycleAnalyzer;

impl CycleAnalyzer {
    /// Analyze the full log map
    pub fn analyze(logs: &LogMap, config: &EngineConfig) -> CycleAnalysis {
        // LogMap iterates in date order, so anchors come out sorted.
        let anchors: Vec<NaiveDate> = logs
            .iter()
            .filter(|(_, entry)| entry.flow.is_active_period())
            .map(|(date, _)| *date)
            .collect();

        let mut cycles = Vec::with_capacity(anchors.len());
        let mut observed_lengths = Vec::new();
        let mut excluded_samples = 0;

        for (i, anchor) in anchors.iter().enumerate() {
            let interval_days = anchors.get(i + 1).map(|next| (*next - *anchor).num_days());
            let counted = match interval_days {
                Some(days) if config.accepts_cycle_length(days) => {
                    observed_lengths.push(days);
                    true
                }
                Some(_) => {
                    excluded_samples += 1;
                    false
                }
                None => false,
            };

            cycles.push(CycleRecord {
                anchor: *anchor,
                interval_days,
                counted,
            });
        }

        let average_cycle_length =
            mean(&observed_lengths).unwrap_or(config.default_cycle_length_days);

        let stats = CycleStats {
            tracked_period_days: anchors.len(),
            cycles_observed: observed_lengths.len(),
            shortest_cycle: observed_lengths.iter().copied().min(),
            longest_cycle: observed_lengths.iter().copied().max(),
            last_anchor: anchors.last().copied(),
        };

        CycleAnalysis {
            anchors,
            cycles,
            observed_lengths,
            average_cycle_length,
            excluded_samples,
            stats,
        }
    }
}

fn mean(values: &[i64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<i64>() as f64 / values.len() as f64)
}
