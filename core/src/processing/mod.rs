pub mod detector;
pub mod pipeline;
pub mod quality;
pub mod report;
pub mod selector;
pub mod window;

pub use detector::AdaptiveThresholdDetector;
pub use pipeline::EventPipeline;
pub use quality::QualityFilter;
pub use report::EventReport;
pub use selector::{BeamSelector, BeamSeries};
pub use window::{Window, WindowAggregator, WindowStats};
