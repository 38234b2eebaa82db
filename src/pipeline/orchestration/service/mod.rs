pub mod analyzer_service;

pub use analyzer_service::{
    into_app_error, AnalyzerServiceBuilder, BoardAnalyzerService, BoxedAnalyzerService,
};
