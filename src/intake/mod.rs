pub mod source;

pub use source::{FrameSource, ScreenshotFileSource};
