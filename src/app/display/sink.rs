use super::overlay::{render_contours, render_overlay};
use super::report::AnalysisReport;
use crate::common::Frame;
use crate::config::DisplayConfig;
use crate::error::DisplayError;
use crate::pipeline::context::FrameMetrics;
use crate::pipeline::domain::BoardAnalysis;
use chrono::{DateTime, Utc};
use image::{GrayImage, ImageFormat, RgbImage};
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};
use uuid::Uuid;

pub const OVERLAY_FILE: &str = "possible_moves.png";
pub const REPORT_FILE: &str = "analysis.json";
pub const CONTOURS_FILE: &str = "contours.png";
pub const THRESHOLD_MASK_FILE: &str = "binary_mask.png";
pub const COLOR_MASK_FILE: &str = "color_mask.png";
pub const EDGE_MASK_FILE: &str = "edge_mask.png";
pub const COMBINED_MASK_FILE: &str = "combined_mask.png";

/// Rendered diagnostics for one analyzed frame.
#[derive(Debug)]
pub struct DisplayFrame {
    pub frame_id: Uuid,
    pub captured_at: DateTime<Utc>,
    pub overlay: RgbImage,
    pub contours: RgbImage,
    /// Segmentation masks keyed by the file they are saved to.
    pub masks: Vec<(&'static str, GrayImage)>,
    pub report: AnalysisReport,
}

impl DisplayFrame {
    pub fn render(
        frame: &Frame,
        analysis: &BoardAnalysis,
        metrics: &FrameMetrics,
        max_moves: usize,
    ) -> Self {
        let diagnostics = analysis.diagnostics();
        let masks = [
            (THRESHOLD_MASK_FILE, &diagnostics.masks.threshold),
            (COLOR_MASK_FILE, &diagnostics.masks.color),
            (EDGE_MASK_FILE, &diagnostics.masks.edges),
            (COMBINED_MASK_FILE, &diagnostics.masks.combined),
        ]
        .into_iter()
        .map(|(file, mask)| (file, mask.to_image()))
        .collect();

        Self {
            frame_id: frame.frame_id(),
            captured_at: frame.captured_at(),
            overlay: render_overlay(frame.image(), analysis, max_moves),
            contours: render_contours(frame.image(), &diagnostics.contours),
            masks,
            report: AnalysisReport::new(frame, analysis, metrics),
        }
    }
}

type SharedFrame = Arc<Mutex<Option<Arc<DisplayFrame>>>>;

/// Fire-and-forget receiver of analysis results. Publishing never blocks the
/// caller; a background writer persists the newest frame.
#[derive(Clone)]
pub struct DisplaySink {
    current: SharedFrame,
    update_tx: mpsc::Sender<Uuid>,
    max_moves: usize,
}

impl DisplaySink {
    pub fn spawn(config: &DisplayConfig, cancel_token: CancellationToken) -> (Self, JoinHandle<()>) {
        let current: SharedFrame = Arc::new(Mutex::new(None));
        let (update_tx, update_rx) = mpsc::channel(4);

        let writer = tokio::spawn(run_writer(
            config.output_dir.clone(),
            Arc::clone(&current),
            update_rx,
            cancel_token,
        ));

        let sink = Self {
            current,
            update_tx,
            max_moves: config.top_moves,
        };
        (sink, writer)
    }

    /// Renders the overlay off the runtime and swaps it in as the current frame,
    /// unless a frame captured later is already there.
    pub fn publish(&self, frame: Frame, analysis: BoardAnalysis, metrics: FrameMetrics) -> JoinHandle<()> {
        let current = Arc::clone(&self.current);
        let update_tx = self.update_tx.clone();
        let max_moves = self.max_moves;

        tokio::spawn(async move {
            let rendered = tokio::task::spawn_blocking(move || {
                DisplayFrame::render(&frame, &analysis, &metrics, max_moves)
            })
            .await;
            let display_frame = match rendered {
                Ok(display_frame) => Arc::new(display_frame),
                Err(e) => {
                    error!("Overlay rendering failed: {}", e);
                    return;
                }
            };

            let frame_id = display_frame.frame_id;
            {
                let mut current = current.lock().unwrap_or_else(PoisonError::into_inner);
                if let Some(shown) = current.as_ref() {
                    if shown.captured_at > display_frame.captured_at {
                        debug!("Frame {} finished after newer frame {}, dropping it", frame_id, shown.frame_id);
                        return;
                    }
                }
                *current = Some(display_frame);
            }
            if update_tx.try_send(frame_id).is_err() {
                debug!("Display writer busy, frame {} will be written with the next update", frame_id);
            }
        })
    }

    pub fn latest(&self) -> Option<Arc<DisplayFrame>> {
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

async fn run_writer(
    output_dir: PathBuf,
    current: SharedFrame,
    mut update_rx: mpsc::Receiver<Uuid>,
    cancel_token: CancellationToken,
) {
    let mut last_written: Option<Uuid> = None;
    loop {
        tokio::select! {
            _ = cancel_token.cancelled() => {
                debug!("Display writer shutting down");
                break;
            }
            update = update_rx.recv() => {
                if update.is_none() {
                    break;
                }
                let latest = current.lock().unwrap_or_else(PoisonError::into_inner).clone();
                let Some(frame) = latest else {
                    continue;
                };
                if last_written == Some(frame.frame_id) {
                    continue;
                }
                match write_frame(&output_dir, &frame).await {
                    Ok(()) => {
                        info!("Saved diagnostics for frame {} to {}", frame.frame_id, output_dir.display());
                        last_written = Some(frame.frame_id);
                    }
                    Err(e) => error!("Failed to save diagnostics: {}", e),
                }
            }
        }
    }
}

async fn write_frame(output_dir: &Path, frame: &DisplayFrame) -> Result<(), DisplayError> {
    tokio::fs::create_dir_all(output_dir).await?;

    for (file, mask) in &frame.masks {
        tokio::fs::write(output_dir.join(file), encode_gray(mask)?).await?;
    }
    tokio::fs::write(output_dir.join(CONTOURS_FILE), encode_rgb(&frame.contours)?).await?;
    tokio::fs::write(output_dir.join(OVERLAY_FILE), encode_rgb(&frame.overlay)?).await?;

    let json = serde_json::to_vec_pretty(&frame.report)?;
    tokio::fs::write(output_dir.join(REPORT_FILE), json).await?;
    Ok(())
}

fn encode_rgb(image: &RgbImage) -> Result<Vec<u8>, DisplayError> {
    let mut png = Vec::new();
    image.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;
    Ok(png)
}

fn encode_gray(image: &GrayImage) -> Result<Vec<u8>, DisplayError> {
    let mut png = Vec::new();
    image.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;
    Ok(png)
}
