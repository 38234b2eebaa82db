use std::path::PathBuf;
use thiserror::Error;

// Main Application Error Type

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration Error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Capture Error: {0}")]
    Capture(#[from] CaptureError),
    #[error("Pipeline Error: {0}")]
    Pipeline(#[from] PipelineError),
    #[error("Analysis task failed: {0}")]
    Task(String),
    #[error("Analysis did not finish within the configured timeout")]
    Timeout,
    #[error("Display Error: {0}")]
    Display(#[from] DisplayError),
}

// Stage failures inside one analysis cycle
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PipelineError {
    #[error("Frame is empty")]
    EmptyFrame,
    #[error("Frame of {width}x{height} is smaller than the 8x8 grid")]
    FrameTooSmall { width: u32, height: u32 },
    #[error("Mask of {actual:?} does not match {expected:?}")]
    MaskMismatch {
        expected: (usize, usize),
        actual: (usize, usize),
    },
}

#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("Failed to read screenshot {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to decode screenshot: {0}")]
    Decode(#[from] image::ImageError),
    #[error("Board region {region:?} lies outside the {width}x{height} screenshot")]
    RegionOutOfBounds {
        region: (u32, u32, u32, u32),
        width: u32,
        height: u32,
    },
}

#[derive(Error, Debug)]
pub enum DisplayError {
    #[error("Failed to write diagnostics: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to encode overlay: {0}")]
    Encode(#[from] image::ImageError),
    #[error("Failed to serialize analysis: {0}")]
    Serialize(#[from] serde_json::Error),
}
