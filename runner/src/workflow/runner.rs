use crate::workflow::config::WorkflowConfig;
use crate::workflow::source::{SnapshotFile, SyntheticSource};
use anyhow::Context;
use isrcore::{DatasetSource, EventPipeline, EventReport, PipelineError};

/// Dataset that could not be processed, with the reason.
#[derive(Debug)]
pub struct DatasetFailure {
    pub dataset: String,
    pub error: PipelineError,
}

#[derive(Debug, Default)]
pub struct WorkflowResult {
    pub reports: Vec<EventReport>,
    pub failures: Vec<DatasetFailure>,
}

impl WorkflowResult {
    pub fn event_count(&self) -> usize {
        self.reports.iter().map(EventReport::event_count).sum()
    }

    pub fn window_count(&self) -> usize {
        self.reports.iter().map(EventReport::len).sum()
    }
}

pub struct Runner {
    config: WorkflowConfig,
    pipeline: EventPipeline,
}

impl Runner {
    pub fn new(config: WorkflowConfig) -> anyhow::Result<Self> {
        let pipeline = EventPipeline::new(config.detection.clone())
            .context("building detection pipeline")?;
        Ok(Self { config, pipeline })
    }

    pub fn config(&self) -> &WorkflowConfig {
        &self.config
    }

    pub fn execute(&self, source: &dyn DatasetSource) -> anyhow::Result<EventReport> {
        let report = self
            .pipeline
            .run_source(source)
            .with_context(|| format!("processing dataset {}", source.name()))?;
        Ok(report)
    }

    /// Sources named by the workflow: files first, then the synthetic snapshot.
    pub fn sources(&self) -> Vec<Box<dyn DatasetSource>> {
        let mut sources: Vec<Box<dyn DatasetSource>> = self
            .config
            .datasets
            .iter()
            .map(|path| Box::new(SnapshotFile::new(path)) as Box<dyn DatasetSource>)
            .collect();
        if let Some(generator) = &self.config.synthetic {
            sources.push(Box::new(SyntheticSource::new(generator.clone())));
        }
        sources
    }

    /// Processes every source in turn. A failing dataset is logged and
    /// recorded; the remaining datasets still run.
    pub fn execute_all(&self, sources: &[Box<dyn DatasetSource>]) -> WorkflowResult {
        let mut result = WorkflowResult::default();
        for source in sources {
            let name = source.name();
            log::info!("loading dataset {}", name);
            match self.pipeline.run_source(source.as_ref()) {
                Ok(report) => {
                    log::info!(
                        "{}: {} events in {} windows",
                        name,
                        report.event_count(),
                        report.len()
                    );
                    result.reports.push(report);
                }
                Err(error) => {
                    log::error!("{}: {}", name, error);
                    result.failures.push(DatasetFailure {
                        dataset: name,
                        error,
                    });
                }
            }
        }
        result
    }
}
