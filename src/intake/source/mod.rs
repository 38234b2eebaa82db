pub mod frame_source;
pub mod screenshot_file_source;

pub use frame_source::FrameSource;
pub use screenshot_file_source::ScreenshotFileSource;
