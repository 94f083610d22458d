use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Time interval covered by one aggregation window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowBounds {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl WindowBounds {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }
}

/// Ion-temperature / density threshold percentages for one relaxation round.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdPair {
    pub ti: f64,
    pub ne: f64,
}

/// Window-level signature ratios, in percent.
///
/// `ti` is `(mean + std) / mean` of the ion temperature, `ne` is
/// `(mean - std) / mean` of the density.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RatioPair {
    pub ti: f64,
    pub ne: f64,
}

/// Which beam row and range gate a series was taken from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesLocation {
    pub beam_id: i64,
    pub beam_index: usize,
    pub target_altitude_km: f64,
    pub gate_index: usize,
    pub gate_altitude_km: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DetectionOutcome {
    Event {
        thresholds: ThresholdPair,
        flagged: Vec<DateTime<Utc>>,
    },
    NoEvent,
}

/// Detector verdict for one (beam, altitude, window) triple.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionResult {
    pub location: SeriesLocation,
    pub window: WindowBounds,
    /// `None` when the window statistics were undefined.
    pub ratios: Option<RatioPair>,
    /// Relaxation rounds evaluated before the verdict.
    pub rounds: usize,
    pub outcome: DetectionOutcome,
}

impl DetectionResult {
    pub fn is_event(&self) -> bool {
        matches!(self.outcome, DetectionOutcome::Event { .. })
    }

    pub fn thresholds(&self) -> Option<ThresholdPair> {
        match &self.outcome {
            DetectionOutcome::Event { thresholds, .. } => Some(*thresholds),
            DetectionOutcome::NoEvent => None,
        }
    }

    pub fn flagged(&self) -> &[DateTime<Utc>] {
        match &self.outcome {
            DetectionOutcome::Event { flagged, .. } => flagged,
            DetectionOutcome::NoEvent => &[],
        }
    }
}
