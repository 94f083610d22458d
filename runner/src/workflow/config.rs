use crate::generator::profile::GeneratorConfig;
use anyhow::Context;
use isrcore::DetectionConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    pub detection: DetectionConfig,
    /// Snapshot files (JSON) processed in order.
    pub datasets: Vec<PathBuf>,
    /// Generate a synthetic snapshot in addition to the listed datasets.
    pub synthetic: Option<GeneratorConfig>,
    pub report_path: Option<PathBuf>,
    pub log_path: Option<PathBuf>,
}

impl WorkflowConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading workflow config {}", path_ref.display()))?;
        let config: WorkflowConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing workflow config {}", path_ref.display()))?;
        Ok(config)
    }

    pub fn from_args(
        beam_id: i64,
        altitudes_km: Vec<f64>,
        window_hours: f64,
        datasets: Vec<PathBuf>,
    ) -> Self {
        let mut detection = DetectionConfig {
            target_beam_id: beam_id,
            window_duration_secs: (window_hours * 3600.0).round() as i64,
            ..Default::default()
        };
        if !altitudes_km.is_empty() {
            detection.target_altitudes_km = altitudes_km;
        }
        Self {
            detection,
            datasets,
            ..Default::default()
        }
    }
}
