pub mod board_pipeline;
pub mod service;

pub use board_pipeline::{BoardAnalyzer, BoardPipeline};
pub use service::{into_app_error, AnalyzerServiceBuilder, BoxedAnalyzerService};
