use crate::common::Frame;
use crate::config::{BoardRegion, CaptureConfig};
use crate::error::CaptureError;
use crate::intake::source::FrameSource;
use async_trait::async_trait;
use chrono::Utc;
use image::{imageops, RgbImage};
use std::path::PathBuf;

/// Re-reads a screenshot from disk every cycle and crops the board out of it.
pub struct ScreenshotFileSource {
    path: PathBuf,
    region: Option<BoardRegion>,
}

impl ScreenshotFileSource {
    pub fn new(path: impl Into<PathBuf>, region: Option<BoardRegion>) -> Self {
        Self {
            path: path.into(),
            region,
        }
    }

    pub fn from_config(config: &CaptureConfig) -> Self {
        Self::new(config.screenshot_path.clone(), config.board_region)
    }

    fn crop(&self, image: RgbImage) -> Result<RgbImage, CaptureError> {
        let Some(region) = self.region else {
            return Ok(image);
        };

        let (width, height) = image.dimensions();
        let fits = region
            .x
            .checked_add(region.width)
            .is_some_and(|right| right <= width)
            && region
                .y
                .checked_add(region.height)
                .is_some_and(|bottom| bottom <= height);
        if !fits {
            return Err(CaptureError::RegionOutOfBounds {
                region: (region.x, region.y, region.width, region.height),
                width,
                height,
            });
        }

        Ok(imageops::crop_imm(&image, region.x, region.y, region.width, region.height).to_image())
    }
}

#[async_trait]
impl FrameSource for ScreenshotFileSource {
    async fn capture(&self) -> Result<Frame, CaptureError> {
        let bytes = tokio::fs::read(&self.path)
            .await
            .map_err(|source| CaptureError::Read {
                path: self.path.clone(),
                source,
            })?;
        let image = image::load_from_memory(&bytes)?.to_rgb8();
        tracing::debug!(
            "Read {}x{} screenshot from {}",
            image.width(),
            image.height(),
            self.path.display()
        );

        Ok(Frame::new(self.crop(image)?, Utc::now()))
    }

    fn name(&self) -> &'static str {
        "screenshot_file"
    }
}
