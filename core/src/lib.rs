//! Event-detection core for incoherent-scatter radar plasma parameters.
//!
//! Fitted ion/electron temperatures and plasma density are quality-filtered,
//! reduced to time series at a target beam and altitude, aggregated over
//! fixed windows, and screened with a relaxing dual threshold for heating
//! signatures (ion temperature rise with density depletion).

pub mod dataset;
pub mod math;
pub mod prelude;
pub mod processing;
pub mod telemetry;

pub use dataset::{Dataset, DetectionResult, FittedSnapshot};
pub use prelude::{DatasetSource, DetectionConfig, PipelineError, PipelineResult};
pub use processing::{EventPipeline, EventReport};
