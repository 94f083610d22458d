pub mod detection;
pub mod model;
pub mod serde_nan;
pub mod series;
pub mod snapshot;

pub use detection::{
    DetectionOutcome, DetectionResult, RatioPair, SeriesLocation, ThresholdPair, WindowBounds,
};
pub use model::{Dataset, DatasetBuilder, Measurement, Quantity};
pub use series::TimeSeries;
pub use snapshot::FittedSnapshot;
