use crate::error::AppError;
use crate::pipeline::services::image::{
    default_palette, AssemblyConfig, CategoryRange, SegmentationConfig,
};
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File};
use serde::Deserialize;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::Level;

const CONFIG_FILE: &str = "jewelbot";
const ENV_PREFIX: &str = "JEWELBOT";

/// Runtime settings: built-in defaults, then `jewelbot.toml` if present, then
/// `JEWELBOT__SECTION__KEY` environment variables.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Configuration {
    pub capture: CaptureConfig,
    pub retry: RetryConfig,
    pub segmentation: SegmentationConfig,
    pub assembly: AssemblyConfig,
    pub palette: Vec<CategoryRange>,
    pub display: DisplayConfig,
    pub logging: LoggingConfig,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            capture: CaptureConfig::default(),
            retry: RetryConfig::default(),
            segmentation: SegmentationConfig::default(),
            assembly: AssemblyConfig::default(),
            palette: default_palette(),
            display: DisplayConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct BoardRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    pub screenshot_path: PathBuf,
    /// Crop applied to the screenshot; the whole image is the board when unset.
    pub board_region: Option<BoardRegion>,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            screenshot_path: PathBuf::from("board.png"),
            board_region: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub success_delay_ms: u64,
    pub failure_delay_ms: u64,
    pub analysis_timeout_ms: Option<u64>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            success_delay_ms: 1000,
            failure_delay_ms: 5000,
            analysis_timeout_ms: None,
        }
    }
}

impl RetryConfig {
    pub fn success_delay(&self) -> Duration {
        Duration::from_millis(self.success_delay_ms)
    }

    pub fn failure_delay(&self) -> Duration {
        Duration::from_millis(self.failure_delay_ms)
    }

    pub fn analysis_timeout(&self) -> Option<Duration> {
        self.analysis_timeout_ms.map(Duration::from_millis)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub enabled: bool,
    pub output_dir: PathBuf,
    pub top_moves: usize,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            output_dir: PathBuf::from("diagnostics"),
            top_moves: 5,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl LoggingConfig {
    pub fn max_level(&self) -> Result<Level, AppError> {
        Level::from_str(&self.level)
            .map_err(|_| AppError::InvalidConfig(format!("Unknown log level '{}'", self.level)))
    }
}

impl Configuration {
    pub fn load() -> Result<Self, AppError> {
        Self::from_builder(
            Config::builder()
                .add_source(File::with_name(CONFIG_FILE).required(false))
                .add_source(
                    Environment::with_prefix(ENV_PREFIX)
                        .separator("__")
                        .try_parsing(true),
                ),
        )
    }

    pub fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self, AppError> {
        let configuration: Configuration = builder.build()?.try_deserialize()?;
        configuration.validate()?;
        Ok(configuration)
    }

    pub fn validate(&self) -> Result<(), AppError> {
        self.segmentation.validate().map_err(AppError::InvalidConfig)?;
        self.logging.max_level()?;

        if let Some(region) = self.capture.board_region {
            if region.width == 0 || region.height == 0 {
                return Err(AppError::InvalidConfig(
                    "Board region must have a non-zero size".to_string(),
                ));
            }
        }

        for range in &self.palette {
            if (0..3).any(|i| range.lower[i] > range.upper[i]) {
                return Err(AppError::InvalidConfig(format!(
                    "Palette range for {} has lower bound above upper bound",
                    range.category
                )));
            }
        }

        if self.assembly.gap_fill_radius <= 0 || self.assembly.correction_radius <= 0 {
            return Err(AppError::InvalidConfig(
                "Sampling radii must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::domain::Category;
    use config::FileFormat;

    fn from_toml(source: &str) -> Result<Configuration, AppError> {
        Configuration::from_builder(
            Config::builder().add_source(File::from_str(source, FileFormat::Toml)),
        )
    }

    #[test]
    fn defaults_are_valid() {
        let configuration = Configuration::default();
        assert!(configuration.validate().is_ok());
        assert_eq!(configuration.retry.success_delay(), Duration::from_secs(1));
        assert_eq!(configuration.retry.failure_delay(), Duration::from_secs(5));
        assert_eq!(configuration.palette.len(), 5);
        assert_eq!(configuration.logging.max_level().unwrap(), Level::INFO);
    }

    #[test]
    fn file_values_override_defaults_section_by_section() {
        let configuration = from_toml(
            r#"
            [capture]
            screenshot_path = "shots/latest.png"
            board_region = { x = 10, y = 20, width = 640, height = 640 }

            [retry]
            failure_delay_ms = 250
            analysis_timeout_ms = 2000

            [segmentation]
            min_contours = 48

            [[palette]]
            category = "green"
            lower = [0, 100, 0]
            upper = [120, 255, 120]
            "#,
        )
        .unwrap();

        assert_eq!(configuration.capture.screenshot_path, PathBuf::from("shots/latest.png"));
        assert_eq!(
            configuration.capture.board_region,
            Some(BoardRegion { x: 10, y: 20, width: 640, height: 640 })
        );
        assert_eq!(configuration.retry.success_delay_ms, 1000);
        assert_eq!(configuration.retry.failure_delay(), Duration::from_millis(250));
        assert_eq!(configuration.retry.analysis_timeout(), Some(Duration::from_secs(2)));
        assert_eq!(configuration.segmentation.min_contours, 48);
        assert_eq!(configuration.segmentation.sample_radius, 15);
        assert_eq!(configuration.palette.len(), 1);
        assert_eq!(configuration.palette[0].category, Category::Green);
        assert_eq!(configuration.display.top_moves, 5);
    }

    #[test]
    fn nonsensical_values_are_rejected() {
        assert!(matches!(
            from_toml("[logging]\nlevel = \"chatty\""),
            Err(AppError::InvalidConfig(_))
        ));
        assert!(matches!(
            from_toml("[capture]\nboard_region = { x = 0, y = 0, width = 0, height = 10 }"),
            Err(AppError::InvalidConfig(_))
        ));
        assert!(matches!(
            from_toml("[[palette]]\ncategory = \"red\"\nlower = [200, 0, 0]\nupper = [100, 50, 50]"),
            Err(AppError::InvalidConfig(_))
        ));
        assert!(matches!(
            from_toml("[[palette]]\ncategory = \"teal\"\nlower = [0, 0, 0]\nupper = [1, 1, 1]"),
            Err(AppError::Config(_))
        ));
    }
}
