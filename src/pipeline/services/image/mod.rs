pub mod assembler;
pub mod classifier;
pub mod config;
pub mod sampling;
pub mod segmentation;

pub use assembler::{AssemblySummary, GridAssembler};
pub use classifier::ColorClassifier;
pub use config::{default_palette, AssemblyConfig, CategoryRange, HsvRange, SegmentationConfig};
pub use segmentation::{BoardSegmenter, Segmentation, SegmentationDiagnostics};
