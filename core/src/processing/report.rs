use crate::dataset::{DetectionOutcome, DetectionResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

fn format_time(time: &DateTime<Utc>) -> String {
    time.format(TIME_FORMAT).to_string()
}

/// Ordered detection results for one dataset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventReport {
    pub dataset: String,
    results: Vec<DetectionResult>,
}

impl EventReport {
    /// Orders results by window start, then by the position of their altitude
    /// in `altitudes_km`, then by beam row.
    pub fn assemble(
        dataset: impl Into<String>,
        mut results: Vec<DetectionResult>,
        altitudes_km: &[f64],
    ) -> Self {
        let altitude_rank = |altitude: f64| {
            altitudes_km
                .iter()
                .position(|&candidate| candidate == altitude)
                .unwrap_or(usize::MAX)
        };
        results.sort_by_key(|result| {
            (
                result.window.start,
                altitude_rank(result.location.target_altitude_km),
                result.location.beam_index,
            )
        });
        Self {
            dataset: dataset.into(),
            results,
        }
    }

    pub fn results(&self) -> &[DetectionResult] {
        &self.results
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn events(&self) -> impl Iterator<Item = &DetectionResult> + '_ {
        self.results.iter().filter(|result| result.is_event())
    }

    pub fn event_count(&self) -> usize {
        self.events().count()
    }

    pub fn for_altitude(&self, altitude_km: f64) -> impl Iterator<Item = &DetectionResult> + '_ {
        self.results
            .iter()
            .filter(move |result| result.location.target_altitude_km == altitude_km)
    }

    /// One human-readable line per result.
    pub fn summary_lines(&self) -> Vec<String> {
        self.results.iter().map(summary_line).collect()
    }
}

fn summary_line(result: &DetectionResult) -> String {
    let start = format_time(&result.window.start);
    let end = format_time(&result.window.end);
    let altitude = result.location.target_altitude_km;
    match &result.outcome {
        DetectionOutcome::NoEvent => format!(
            "There are no events between: {} and {} at {} km.",
            start, end, altitude
        ),
        DetectionOutcome::Event {
            thresholds,
            flagged,
        } => format!(
            "Event between: {} and {} at {} km (beam {}, gate {} at {:.1} km): Ti >= {}%, Ne <= {}%, {} timestamps flagged.",
            start,
            end,
            altitude,
            result.location.beam_id,
            result.location.gate_index,
            result.location.gate_altitude_km,
            thresholds.ti,
            thresholds.ne,
            flagged.len()
        ),
    }
}
