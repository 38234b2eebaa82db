use crate::common::Frame;
use crate::error::CaptureError;
use async_trait::async_trait;

/// Supplies one board image per analysis cycle.
#[async_trait]
pub trait FrameSource: Send + Sync {
    async fn capture(&self) -> Result<Frame, CaptureError>;
    fn name(&self) -> &'static str;
}
