use serde::{Deserialize, Serialize};
use std::fmt;

/// Tile types distinguished by color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Red,
    Blue,
    Green,
    Yellow,
    Purple,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Red,
        Category::Blue,
        Category::Green,
        Category::Yellow,
        Category::Purple,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Category::Red => "red",
            Category::Blue => "blue",
            Category::Green => "green",
            Category::Yellow => "yellow",
            Category::Purple => "purple",
        }
    }

    /// Single letter used in the textual grid dump.
    pub fn symbol(&self) -> char {
        match self {
            Category::Red => 'R',
            Category::Blue => 'B',
            Category::Green => 'G',
            Category::Yellow => 'Y',
            Category::Purple => 'P',
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
