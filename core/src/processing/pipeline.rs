use crate::dataset::{Dataset, DetectionResult};
use crate::prelude::{DatasetSource, DetectionConfig, PipelineResult};
use crate::processing::detector::AdaptiveThresholdDetector;
use crate::processing::quality::QualityFilter;
use crate::processing::report::EventReport;
use crate::processing::selector::{BeamSeries, BeamSelector};
use crate::processing::window::WindowAggregator;
use crate::telemetry::log::LogManager;

/// Quality filter -> selector -> window aggregator -> detector -> report.
pub struct EventPipeline {
    config: DetectionConfig,
    quality: QualityFilter,
    selector: BeamSelector,
    aggregator: WindowAggregator,
    detector: AdaptiveThresholdDetector,
    logger: LogManager,
}

impl EventPipeline {
    pub fn new(config: DetectionConfig) -> PipelineResult<Self> {
        config.validate()?;
        let aggregator = WindowAggregator::new(config.window_duration())?;
        let detector = AdaptiveThresholdDetector::new(&config);
        Ok(Self {
            config,
            quality: QualityFilter::new(),
            selector: BeamSelector::new(),
            aggregator,
            detector,
            logger: LogManager::new("pipeline"),
        })
    }

    pub fn config(&self) -> &DetectionConfig {
        &self.config
    }

    /// Runs every configured altitude over one dataset.
    ///
    /// A missing beam or malformed dataset aborts this dataset only; windows
    /// with undefined statistics come back as "no event".
    pub fn run(&self, label: &str, dataset: &Dataset) -> PipelineResult<EventReport> {
        let cleaned = self.quality.apply(dataset)?;

        let mut results = Vec::new();
        for &altitude in &self.config.target_altitudes_km {
            self.logger
                .record(&format!("{}: processing altitude {} km", label, altitude));
            let beams = self
                .selector
                .select(&cleaned, self.config.target_beam_id, altitude)?;
            for beam in &beams {
                results.extend(self.detect_series(beam));
            }
        }

        let report = EventReport::assemble(label, results, &self.config.target_altitudes_km);
        self.logger.record(&format!(
            "{}: {} windows, {} events",
            label,
            report.len(),
            report.event_count()
        ));
        Ok(report)
    }

    /// Loads a dataset, runs it and drops the arrays before returning.
    pub fn run_source(&self, source: &dyn DatasetSource) -> PipelineResult<EventReport> {
        let label = source.name();
        let dataset = source.load(self.config.ion_species_index)?;
        let report = self.run(&label, &dataset)?;
        drop(dataset);
        Ok(report)
    }

    /// Window-by-window verdicts for one beam/altitude series, in time order.
    pub fn detect_series(&self, beam: &BeamSeries) -> Vec<DetectionResult> {
        let times = beam.ion_temperature.times();
        self.aggregator
            .windows(times)
            .iter()
            .map(|window| {
                let ion_temperature = window.aggregate(&beam.ion_temperature);
                let density = window.aggregate(&beam.density);
                let result = self.detector.classify(
                    beam.location,
                    window.bounds,
                    window.timestamps(times),
                    &ion_temperature,
                    &density,
                );
                if !result.is_event() {
                    self.logger.record(&format!(
                        "There are no events between: {} and {} at {} km.",
                        window.bounds.start, window.bounds.end, beam.location.target_altitude_km
                    ));
                }
                result
            })
            .collect()
    }
}
