use crate::{
    app::DisplaySink,
    config::{Configuration, RetryConfig},
    error::AppError,
    intake::{FrameSource, ScreenshotFileSource},
    pipeline::{
        context::FrameContext,
        domain::BoardAnalysis,
        orchestration::{into_app_error, AnalyzerServiceBuilder, BoardPipeline, BoxedAnalyzerService},
        services::moves::MoveEngine,
    },
};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tower::{Service, ServiceExt};

/// Capture, analyze, report, wait; until cancelled.
pub struct Coordinator {
    source: Box<dyn FrameSource>,
    analyzer: BoxedAnalyzerService,
    display: Option<DisplaySink>,
    display_task: Option<JoinHandle<()>>,
    retry: RetryConfig,
    top_moves: usize,
    cancel_token: CancellationToken,
}

impl Coordinator {
    pub async fn run(mut self) -> Result<(), AppError> {
        tracing::info!("Watching board via {}", self.source.name());

        while !self.cancel_token.is_cancelled() {
            let delay = match self.run_cycle().await {
                Ok(_) => self.retry.success_delay(),
                Err(e) => {
                    tracing::error!("Analysis cycle failed: {}", e);
                    self.retry.failure_delay()
                }
            };

            tokio::select! {
                _ = self.cancel_token.cancelled() => break,
                _ = tokio::time::sleep(delay) => {}
            }
        }

        tracing::info!("Coordinator stopped");
        self.stop().await;
        Ok(())
    }

    /// One capture + analysis. Failures are returned, never retried here.
    pub async fn run_cycle(&mut self) -> Result<BoardAnalysis, AppError> {
        let frame = self.source.capture().await?;
        let context = FrameContext::new(frame);

        let analyzed = self
            .analyzer
            .ready()
            .await
            .map_err(into_app_error)?
            .call(context)
            .await
            .map_err(into_app_error)?;

        let (frame, analysis, metrics) = analyzed.into_parts();
        self.log_summary(&analysis, metrics.total());

        if let Some(display) = &self.display {
            // detached; the next cycle does not wait for rendering
            let _ = display.publish(frame, analysis.clone(), metrics);
        }
        Ok(analysis)
    }

    fn log_summary(&self, analysis: &BoardAnalysis, elapsed: Duration) {
        let detection = analysis.detection();
        tracing::info!(
            "Analyzed board in {:?} via {:?}: {} valid moves",
            elapsed,
            detection.strategy,
            analysis.moves().len()
        );
        if analysis.moves().is_empty() {
            tracing::warn!("No valid moves found");
        }
        for line in MoveEngine::summarize(analysis.moves(), self.top_moves) {
            tracing::info!("{}", line);
        }
    }

    async fn stop(&mut self) {
        self.cancel_token.cancel();
        if let Some(task) = self.display_task.take() {
            if let Err(e) = task.await {
                tracing::error!("Display writer ended abnormally: {}", e);
            }
        }
    }
}

pub struct CoordinatorBuilder {
    configuration: Configuration,
    source: Option<Box<dyn FrameSource>>,
    cancel_token: Option<CancellationToken>,
}

impl CoordinatorBuilder {
    pub fn new(configuration: Configuration) -> Self {
        Self {
            configuration,
            source: None,
            cancel_token: None,
        }
    }

    // Replaces the screenshot file source built from the configuration.
    pub fn frame_source(mut self, source: Box<dyn FrameSource>) -> Self {
        self.source = Some(source);
        self
    }

    // Overrides the configured delay after a successful cycle.
    pub fn success_delay(mut self, delay: Duration) -> Self {
        self.configuration.retry.success_delay_ms = delay.as_millis() as u64;
        self
    }

    // Overrides the configured delay after a failed cycle.
    pub fn failure_delay(mut self, delay: Duration) -> Self {
        self.configuration.retry.failure_delay_ms = delay.as_millis() as u64;
        self
    }

    // Enables or disables the diagnostic output, this will override the configuration.
    pub fn display(mut self, enabled: bool) -> Self {
        self.configuration.display.enabled = enabled;
        self
    }

    pub fn cancel_token(mut self, cancel_token: CancellationToken) -> Self {
        self.cancel_token = Some(cancel_token);
        self
    }

    /// Spawns the display writer when enabled, so call this inside a runtime.
    pub fn build(self) -> Result<Coordinator, AppError> {
        self.configuration.validate()?;
        let configuration = self.configuration;
        let cancel_token = self.cancel_token.unwrap_or_default();

        let source = self
            .source
            .unwrap_or_else(|| Box::new(ScreenshotFileSource::from_config(&configuration.capture)));

        let analyzer = AnalyzerServiceBuilder::new(Box::new(BoardPipeline::from_config(&configuration)))
            .analyzer_timeout(configuration.retry.analysis_timeout())
            .build();

        let (display, display_task) = if configuration.display.enabled {
            let (sink, task) = DisplaySink::spawn(&configuration.display, cancel_token.clone());
            (Some(sink), Some(task))
        } else {
            (None, None)
        };

        Ok(Coordinator {
            source,
            analyzer,
            display,
            display_task,
            retry: configuration.retry,
            top_moves: configuration.display.top_moves,
            cancel_token,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Frame;
    use crate::error::CaptureError;
    use crate::pipeline::orchestration::board_pipeline::tests::{painted_category, synthetic_board};
    use crate::pipeline::domain::Position;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct SyntheticSource;

    #[async_trait]
    impl FrameSource for SyntheticSource {
        async fn capture(&self) -> Result<Frame, CaptureError> {
            Ok(Frame::new(synthetic_board(), Utc::now()))
        }

        fn name(&self) -> &'static str {
            "synthetic"
        }
    }

    struct FailingSource {
        attempts: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl FrameSource for FailingSource {
        async fn capture(&self) -> Result<Frame, CaptureError> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            Err(CaptureError::RegionOutOfBounds {
                region: (0, 0, 10, 10),
                width: 5,
                height: 5,
            })
        }

        fn name(&self) -> &'static str {
            "failing"
        }
    }

    #[tokio::test]
    async fn a_cycle_produces_a_classified_board() {
        let mut coordinator = CoordinatorBuilder::new(Configuration::default())
            .frame_source(Box::new(SyntheticSource))
            .display(false)
            .build()
            .expect("Failed to build coordinator");

        let analysis = coordinator.run_cycle().await.unwrap();
        for position in Position::all() {
            assert_eq!(analysis.grid().category_at(position), Some(painted_category(position)));
        }
    }

    #[tokio::test]
    async fn capture_failures_fail_the_cycle() {
        let mut coordinator = CoordinatorBuilder::new(Configuration::default())
            .frame_source(Box::new(FailingSource {
                attempts: Arc::new(AtomicUsize::new(0)),
            }))
            .display(false)
            .build()
            .unwrap();
        assert!(matches!(coordinator.run_cycle().await, Err(AppError::Capture(_))));
    }

    #[tokio::test]
    async fn failed_cycles_back_off_until_cancelled() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let cancel_token = CancellationToken::new();
        let coordinator = CoordinatorBuilder::new(Configuration::default())
            .frame_source(Box::new(FailingSource {
                attempts: Arc::clone(&attempts),
            }))
            .failure_delay(Duration::from_millis(10))
            .display(false)
            .cancel_token(cancel_token.clone())
            .build()
            .unwrap();

        let handle = tokio::spawn(coordinator.run());
        tokio::time::sleep(Duration::from_millis(200)).await;
        cancel_token.cancel();

        let result = tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("coordinator should stop after cancellation")
            .unwrap();
        assert!(result.is_ok());
        assert!(attempts.load(Ordering::SeqCst) >= 2);
    }

    #[tokio::test]
    async fn a_cancelled_coordinator_does_not_capture() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let cancel_token = CancellationToken::new();
        cancel_token.cancel();
        let coordinator = CoordinatorBuilder::new(Configuration::default())
            .frame_source(Box::new(FailingSource {
                attempts: Arc::clone(&attempts),
            }))
            .cancel_token(cancel_token)
            .display(false)
            .build()
            .unwrap();

        coordinator.run().await.unwrap();
        assert_eq!(attempts.load(Ordering::SeqCst), 0);
    }
}
