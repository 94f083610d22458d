use crate::generator::profile::{build_snapshot, GeneratorConfig};
use isrcore::{Dataset, DatasetSource, FittedSnapshot, PipelineError, PipelineResult};
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

/// Fitted snapshot stored as JSON on disk.
pub struct SnapshotFile {
    path: PathBuf,
}

impl SnapshotFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn read(&self) -> PipelineResult<FittedSnapshot> {
        let file = File::open(&self.path).map_err(|err| {
            PipelineError::Source(format!("opening {}: {}", self.path.display(), err))
        })?;
        FittedSnapshot::from_json_reader(BufReader::new(file)).map_err(|err| {
            PipelineError::Source(format!("parsing {}: {}", self.path.display(), err))
        })
    }
}

impl DatasetSource for SnapshotFile {
    fn name(&self) -> String {
        self.path.display().to_string()
    }

    fn load(&self, ion_species_index: usize) -> PipelineResult<Dataset> {
        self.read()?.to_dataset(ion_species_index)
    }
}

pub struct SyntheticSource {
    config: GeneratorConfig,
}

impl SyntheticSource {
    pub fn new(config: GeneratorConfig) -> Self {
        Self { config }
    }
}

impl DatasetSource for SyntheticSource {
    fn name(&self) -> String {
        format!("synthetic (seed {})", self.config.seed)
    }

    fn load(&self, ion_species_index: usize) -> PipelineResult<Dataset> {
        build_snapshot(&self.config)
            .map_err(|err| PipelineError::Source(format!("{:#}", err)))?
            .to_dataset(ion_species_index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn snapshot_file_loads_written_snapshot() {
        let config = GeneratorConfig {
            records: 6,
            gates: 4,
            ..Default::default()
        };
        let temp = NamedTempFile::new().unwrap();
        build_snapshot(&config)
            .unwrap()
            .to_json_writer(temp.as_file())
            .unwrap();

        let dataset = SnapshotFile::new(temp.path()).load(0).unwrap();
        assert_eq!(dataset.time().len(), 6);
        assert_eq!(dataset.range_count(), 4);
    }

    #[test]
    fn missing_file_is_a_source_error() {
        let err = SnapshotFile::new("/nonexistent/snapshot.json")
            .load(0)
            .unwrap_err();
        assert!(matches!(err, PipelineError::Source(_)));
    }

    #[test]
    fn malformed_file_is_a_source_error() {
        let temp = NamedTempFile::new().unwrap();
        std::fs::write(temp.path(), b"{\"beam_codes\": 3}").unwrap();
        let err = SnapshotFile::new(temp.path()).load(0).unwrap_err();
        assert!(matches!(err, PipelineError::Source(_)));
    }

    #[test]
    fn synthetic_source_rejects_unknown_species() {
        let err = SyntheticSource::new(GeneratorConfig::default())
            .load(5)
            .unwrap_err();
        assert!(matches!(err, PipelineError::InvalidSpecies { .. }));
    }
}
