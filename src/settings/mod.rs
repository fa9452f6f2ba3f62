use serde::{Deserialize, Serialize};

pub mod store;

pub const SCHEMA_VERSION: u32 = 1;
pub const MIN_FONT_SIZE: f32 = 12.0;
pub const MAX_FONT_SIZE: f32 = 24.0;
pub const DEFAULT_FONT_SIZE: f32 = 14.0;
const FONT_STEP: f32 = 1.0;

/// Display preferences. The conversation itself is never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preferences {
    pub schema_version: u32,
    #[serde(default = "default_font_size")]
    pub font_size: f32,
    #[serde(default)]
    pub calm_mode: bool,
    #[serde(default = "default_sidebar_open")]
    pub sidebar_open: bool,
}

fn default_font_size() -> f32 {
    DEFAULT_FONT_SIZE
}

fn default_sidebar_open() -> bool {
    true
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            font_size: DEFAULT_FONT_SIZE,
            calm_mode: false,
            sidebar_open: true,
        }
    }
}

impl Preferences {
    pub fn increase_font(&mut self) -> bool {
        self.set_font_size(self.font_size + FONT_STEP)
    }

    pub fn decrease_font(&mut self) -> bool {
        self.set_font_size(self.font_size - FONT_STEP)
    }

    /// Clamps to the supported range; returns whether the size changed.
    pub fn set_font_size(&mut self, size: f32) -> bool {
        let clamped = size.clamp(MIN_FONT_SIZE, MAX_FONT_SIZE);
        let changed = (clamped - self.font_size).abs() > f32::EPSILON;
        self.font_size = clamped;
        changed
    }

    /// Ratio applied to every text style.
    pub fn font_scale(&self) -> f32 {
        self.font_size / DEFAULT_FONT_SIZE
    }
}
