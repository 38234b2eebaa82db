use crate::pipeline::domain::Category;
use serde::Deserialize;

/// Inclusive RGB box for one tile category
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CategoryRange {
    pub category: Category,
    pub lower: [u8; 3],
    pub upper: [u8; 3],
    /// Defaults to the box midpoint
    #[serde(default)]
    pub centroid: Option<[f32; 3]>,
}

impl CategoryRange {
    pub fn new(category: Category, lower: [u8; 3], upper: [u8; 3]) -> Self {
        Self {
            category,
            lower,
            upper,
            centroid: None,
        }
    }

    pub fn contains(&self, color: [u8; 3]) -> bool {
        (0..3).all(|i| color[i] >= self.lower[i] && color[i] <= self.upper[i])
    }

    pub fn centroid(&self) -> [f32; 3] {
        self.centroid.unwrap_or_else(|| {
            std::array::from_fn(|i| (self.lower[i] as f32 + self.upper[i] as f32) / 2.0)
        })
    }
}

/// Calibrated ranges for the jewel palette (RGB order).
pub fn default_palette() -> Vec<CategoryRange> {
    vec![
        CategoryRange::new(Category::Red, [130, 0, 0], [255, 120, 120]),
        CategoryRange::new(Category::Blue, [0, 40, 120], [120, 180, 255]),
        CategoryRange::new(Category::Green, [40, 130, 40], [180, 255, 180]),
        CategoryRange::new(Category::Yellow, [130, 130, 0], [255, 255, 120]),
        CategoryRange::new(Category::Purple, [120, 0, 120], [255, 120, 255]),
    ]
}

/// HSV range on the OpenCV scale (H 0-180, S and V 0-255)
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HsvRange {
    pub name: String,
    pub lower: [u8; 3],
    pub upper: [u8; 3],
}

impl HsvRange {
    fn new(name: &str, lower: [u8; 3], upper: [u8; 3]) -> Self {
        Self {
            name: name.to_string(),
            lower,
            upper,
        }
    }

    pub fn contains(&self, hsv: [u8; 3]) -> bool {
        (0..3).all(|i| hsv[i] >= self.lower[i] && hsv[i] <= self.upper[i])
    }
}

/// Tunables for turning a raw board image into candidates
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SegmentationConfig {
    pub contrast_gain: f32,
    pub brightness_bias: f32,
    pub clahe_clip_limit: f32,
    pub clahe_tiles: u32,
    pub threshold_sigma: f32,
    pub threshold_offset: f32,
    pub edge_low: f32,
    pub edge_high: f32,
    pub fill_factor: f32,
    pub min_area_ratio: f32,
    pub max_area_ratio: f32,
    pub min_contours: usize,
    pub synthetic_radius_ratio: f32,
    pub sample_radius: i32,
    pub darkness_floor: u32,
    /// Wider than the classifier palette; tuned for recall.
    pub hsv_ranges: Vec<HsvRange>,
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        Self {
            contrast_gain: 1.3,
            brightness_bias: 15.0,
            clahe_clip_limit: 3.0,
            clahe_tiles: 8,
            threshold_sigma: 2.0,
            threshold_offset: 2.0,
            edge_low: 50.0,
            edge_high: 150.0,
            fill_factor: 0.5,
            min_area_ratio: 0.1,
            max_area_ratio: 2.0,
            min_contours: 40, // 60% of the board
            synthetic_radius_ratio: 0.4,
            sample_radius: 15,
            darkness_floor: 120,
            hsv_ranges: vec![
                HsvRange::new("blue", [85, 40, 40], [135, 255, 255]),
                HsvRange::new("purple", [135, 30, 30], [180, 255, 255]),
                HsvRange::new("red_low", [0, 40, 40], [10, 255, 255]),
                HsvRange::new("red_high", [170, 40, 40], [180, 255, 255]),
                HsvRange::new("green", [35, 40, 40], [85, 255, 255]),
                HsvRange::new("yellow", [15, 40, 40], [35, 255, 255]),
            ],
        }
    }
}

/// Tunables for gap filling and the first-column pass
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AssemblyConfig {
    pub gap_fill_radius: i32,
    pub gap_fill_floor: u32,
    pub correction_radius: i32,
    pub correction_x_fraction: f32,
    pub correction_floor: u32,
}

impl Default for AssemblyConfig {
    fn default() -> Self {
        Self {
            gap_fill_radius: 25,
            gap_fill_floor: 100,
            correction_radius: 30,
            correction_x_fraction: 0.5,
            correction_floor: 100,
        }
    }
}

impl SegmentationConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.clahe_tiles == 0 {
            return Err("CLAHE tile count must be greater than 0".to_string());
        }

        if self.min_area_ratio < 0.0 || self.min_area_ratio > self.max_area_ratio {
            return Err("Area ratios must satisfy 0 <= min <= max".to_string());
        }

        if self.sample_radius <= 0 {
            return Err("Sample radius must be greater than 0".to_string());
        }

        if self.edge_low > self.edge_high {
            return Err("Weak edge threshold must not exceed the strong one".to_string());
        }

        Ok(())
    }
}
