use crate::error::AppError;
use crate::pipeline::context::{AnalyzedState, FrameContext, IngestedState};
use crate::pipeline::orchestration::board_pipeline::BoardAnalyzer;
use futures::task::{Context, Poll};
use futures::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tower::timeout::error::Elapsed;
use tower::timeout::TimeoutLayer;
use tower::util::BoxService;
use tower::{BoxError, Service, ServiceBuilder};

pub type BoxedAnalyzerService =
    BoxService<FrameContext<IngestedState>, FrameContext<AnalyzedState>, BoxError>;

/// Runs a [`BoardAnalyzer`] on the blocking pool so the runtime stays responsive.
#[derive(Clone)]
pub struct BoardAnalyzerService {
    inner: Arc<dyn BoardAnalyzer>,
}

impl BoardAnalyzerService {
    pub fn new(inner: Box<dyn BoardAnalyzer>) -> Self {
        Self {
            inner: Arc::from(inner),
        }
    }
}

impl Service<FrameContext<IngestedState>> for BoardAnalyzerService {
    type Response = FrameContext<AnalyzedState>;
    type Error = BoxError;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: FrameContext<IngestedState>) -> Self::Future {
        let inner = Arc::clone(&self.inner);

        Box::pin(async move {
            tracing::debug!("Analyzing frame {} with {}", req.frame().frame_id(), inner.name());
            let analyzed = tokio::task::spawn_blocking(move || inner.analyze(req))
                .await
                .map_err(|e| AppError::Task(e.to_string()))?
                .map_err(AppError::from)?;
            Ok::<_, BoxError>(analyzed)
        })
    }
}

pub struct AnalyzerServiceBuilder {
    analyzer: Box<dyn BoardAnalyzer>,
    analyzer_timeout: Option<Duration>,
}

impl AnalyzerServiceBuilder {
    pub fn new(analyzer: Box<dyn BoardAnalyzer>) -> Self {
        Self {
            analyzer,
            analyzer_timeout: None,
        }
    }

    pub fn analyzer_timeout(mut self, analyzer_timeout: Option<Duration>) -> Self {
        self.analyzer_timeout = analyzer_timeout;
        self
    }

    pub fn build(self) -> BoxedAnalyzerService {
        let service = ServiceBuilder::new()
            .option_layer(self.analyzer_timeout.map(TimeoutLayer::new))
            .service(BoardAnalyzerService::new(self.analyzer));
        BoxService::new(service)
    }
}

/// Recovers the typed error from whatever the service stack produced.
pub fn into_app_error(error: BoxError) -> AppError {
    if error.is::<Elapsed>() {
        return AppError::Timeout;
    }
    match error.downcast::<AppError>() {
        Ok(app_error) => *app_error,
        Err(other) => AppError::Task(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Frame;
    use crate::error::PipelineError;
    use crate::pipeline::orchestration::board_pipeline::tests::synthetic_board;
    use crate::pipeline::orchestration::board_pipeline::BoardPipeline;
    use chrono::Utc;
    use image::{ImageBuffer, Rgb};
    use tower::ServiceExt;

    struct SlowAnalyzer;

    impl BoardAnalyzer for SlowAnalyzer {
        fn analyze(
            &self,
            _context: FrameContext<IngestedState>,
        ) -> Result<FrameContext<AnalyzedState>, PipelineError> {
            std::thread::sleep(Duration::from_millis(300));
            Err(PipelineError::EmptyFrame)
        }

        fn name(&self) -> &'static str {
            "slow"
        }
    }

    struct PanickingAnalyzer;

    impl BoardAnalyzer for PanickingAnalyzer {
        fn analyze(
            &self,
            _context: FrameContext<IngestedState>,
        ) -> Result<FrameContext<AnalyzedState>, PipelineError> {
            panic!("analysis blew up");
        }

        fn name(&self) -> &'static str {
            "panicking"
        }
    }

    fn frame_context() -> FrameContext<IngestedState> {
        FrameContext::new(Frame::new(synthetic_board(), Utc::now()))
    }

    #[tokio::test]
    async fn analyzes_a_frame_through_the_service_stack() {
        let service = AnalyzerServiceBuilder::new(Box::new(BoardPipeline::default()))
            .analyzer_timeout(Some(Duration::from_secs(60)))
            .build();
        let analyzed = service.oneshot(frame_context()).await.unwrap();
        assert_eq!(analyzed.analysis().assembly().empty, 0);
    }

    #[tokio::test]
    async fn pipeline_errors_come_back_typed() {
        let service = AnalyzerServiceBuilder::new(Box::new(BoardPipeline::default())).build();
        let tiny = FrameContext::new(Frame::new(
            ImageBuffer::from_pixel(3, 3, Rgb([0, 0, 0])),
            Utc::now(),
        ));
        let error = service.oneshot(tiny).await.err().unwrap();
        assert!(matches!(
            into_app_error(error),
            AppError::Pipeline(PipelineError::FrameTooSmall { .. })
        ));
    }

    #[tokio::test]
    async fn slow_analysis_times_out() {
        let service = AnalyzerServiceBuilder::new(Box::new(SlowAnalyzer))
            .analyzer_timeout(Some(Duration::from_millis(20)))
            .build();
        let error = service.oneshot(frame_context()).await.err().unwrap();
        assert!(matches!(into_app_error(error), AppError::Timeout));
    }

    #[tokio::test]
    async fn panics_are_contained_at_the_cycle_boundary() {
        let service = AnalyzerServiceBuilder::new(Box::new(PanickingAnalyzer)).build();
        let error = service.oneshot(frame_context()).await.err().unwrap();
        assert!(matches!(into_app_error(error), AppError::Task(_)));
    }
}
