pub mod overlay;
pub mod report;
pub mod sink;
pub mod text;

pub use report::AnalysisReport;
pub use sink::{DisplayFrame, DisplaySink};
