use crate::dataset::Dataset;
use chrono::Duration;
use serde::{Deserialize, Serialize};

/// Beam code of the field-aligned beam in the standard PFISR experiments.
pub const FIELD_ALIGNED_BEAM_ID: i64 = 64157;

/// Options recognised by the event-detection pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    pub target_beam_id: i64,
    pub target_altitudes_km: Vec<f64>,
    pub window_duration_secs: i64,
    pub initial_ti_threshold: f64,
    pub initial_ne_threshold: f64,
    pub min_ti_threshold: f64,
    pub min_ne_threshold: f64,
    pub threshold_step: f64,
    /// Fitted ion species used for the temperature and velocity channels (0 = O+).
    pub ion_species_index: usize,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            target_beam_id: FIELD_ALIGNED_BEAM_ID,
            target_altitudes_km: vec![275.0, 305.0],
            window_duration_secs: 3 * 3600,
            initial_ti_threshold: 140.0,
            initial_ne_threshold: 65.0,
            min_ti_threshold: 100.0,
            min_ne_threshold: 25.0,
            threshold_step: 20.0,
            ion_species_index: 0,
        }
    }
}

impl DetectionConfig {
    /// Longest window we accept; keeps the duration representable in milliseconds.
    const MAX_WINDOW_SECS: i64 = i64::MAX / 1_000;

    pub fn validate(&self) -> PipelineResult<()> {
        if self.window_duration_secs <= 0 || self.window_duration_secs > Self::MAX_WINDOW_SECS {
            return Err(PipelineError::InvalidConfig(format!(
                "window duration must be positive, got {}s",
                self.window_duration_secs
            )));
        }
        if !(self.threshold_step.is_finite() && self.threshold_step > 0.0) {
            return Err(PipelineError::InvalidConfig(format!(
                "threshold step must be positive, got {}",
                self.threshold_step
            )));
        }
        let thresholds = [
            self.initial_ti_threshold,
            self.initial_ne_threshold,
            self.min_ti_threshold,
            self.min_ne_threshold,
        ];
        if thresholds.iter().any(|value| !value.is_finite()) {
            return Err(PipelineError::InvalidConfig(
                "thresholds must be finite".into(),
            ));
        }
        if self.target_altitudes_km.is_empty() {
            return Err(PipelineError::InvalidConfig(
                "at least one target altitude is required".into(),
            ));
        }
        if self.target_altitudes_km.iter().any(|alt| !alt.is_finite()) {
            return Err(PipelineError::InvalidConfig(
                "target altitudes must be finite".into(),
            ));
        }
        Ok(())
    }

    pub fn window_duration(&self) -> Duration {
        Duration::seconds(self.window_duration_secs)
    }
}

/// Common error type for the detection pipeline.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum PipelineError {
    #[error("beam {beam_id} not present in dataset")]
    MissingBeam { beam_id: i64 },
    #[error("shape mismatch for {field}: expected {expected:?}, found {found:?}")]
    ShapeMismatch {
        field: &'static str,
        expected: Vec<usize>,
        found: Vec<usize>,
    },
    #[error("invalid time axis: {0}")]
    InvalidTimeAxis(String),
    #[error("beam row {beam_index} has no valid range-gate altitude")]
    NoValidRangeGate { beam_index: usize },
    #[error("ion species index {index} out of range ({available} fitted species)")]
    InvalidSpecies { index: usize, available: usize },
    #[error("dataset is missing {0}")]
    MissingField(&'static str),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("dataset source failed: {0}")]
    Source(String),
}

pub type PipelineResult<T> = Result<T, PipelineError>;

/// Boundary to the collaborator that produces in-memory datasets.
pub trait DatasetSource {
    /// Human-readable label used in logs and reports.
    fn name(&self) -> String;
    fn load(&self, ion_species_index: usize) -> PipelineResult<Dataset>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_matches_documented_thresholds() {
        let config = DetectionConfig::default();
        assert_eq!(config.initial_ti_threshold, 140.0);
        assert_eq!(config.initial_ne_threshold, 65.0);
        assert_eq!(config.window_duration(), Duration::hours(3));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_step_is_rejected() {
        let config = DetectionConfig {
            threshold_step: 0.0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(PipelineError::InvalidConfig(_))
        ));
    }

    #[test]
    fn empty_altitude_list_is_rejected() {
        let config = DetectionConfig {
            target_altitudes_km: Vec::new(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_config_fills_defaults() {
        let config: DetectionConfig =
            serde_json::from_str(r#"{"target_altitudes_km": [250.0]}"#).unwrap();
        assert_eq!(config.target_altitudes_km, vec![250.0]);
        assert_eq!(config.target_beam_id, FIELD_ALIGNED_BEAM_ID);
    }
}
