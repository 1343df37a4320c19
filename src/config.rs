//! Run settings, loadable from a JSON file.

use crate::charts::{parse_hex_color, Palette, PlotStyle};
use crate::data::DATA_SOURCE_URL;
use crate::stats::DEFAULT_BINS;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Largest figure side, in pixels.
pub const MAX_FIGURE_PIXELS: f64 = 10_000.0;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid setting: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub source_url: String,
    /// Local `.zip` or `.csv` used instead of downloading.
    pub input: Option<PathBuf>,
    pub timeout_secs: u64,
    /// Significance level of the confidence band.
    pub alpha: f64,
    pub hist_bins: usize,
    pub overlay_max_bins: usize,
    pub output_dir: PathBuf,
    pub style: PlotStyle,
    pub palette: Palette,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            source_url: DATA_SOURCE_URL.to_string(),
            input: None,
            timeout_secs: 60,
            alpha: 0.05,
            hist_bins: DEFAULT_BINS,
            overlay_max_bins: DEFAULT_BINS,
            output_dir: PathBuf::from("plots"),
            style: PlotStyle::default(),
            palette: Palette::default(),
        }
    }
}

impl Settings {
    /// Read settings from a JSON file; absent fields keep their defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&text)?)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.alpha > 0.0 && self.alpha < 1.0) {
            return Err(ConfigError::Invalid(format!(
                "alpha must be in (0, 1), got {}",
                self.alpha
            )));
        }
        if self.hist_bins == 0 || self.overlay_max_bins == 0 {
            return Err(ConfigError::Invalid("bin counts must be at least 1".into()));
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::Invalid("timeout must be at least 1 second".into()));
        }
        // Checked in floating point, before pixel_size rounds and casts.
        let dpi = self.style.dpi as f64;
        for (side, inches) in [("width", self.style.width_in), ("height", self.style.height_in)] {
            let px = (inches * dpi).round();
            if !(1.0..=MAX_FIGURE_PIXELS).contains(&px) {
                return Err(ConfigError::Invalid(format!(
                    "figure {side} of {inches} in at {} dpi must give 1 to {MAX_FIGURE_PIXELS} px",
                    self.style.dpi
                )));
            }
        }
        if self.style.font_size == 0 {
            return Err(ConfigError::Invalid("font size must be at least 1".into()));
        }
        for color in [&self.palette.primary, &self.palette.secondary] {
            parse_hex_color(color).map_err(|e| ConfigError::Invalid(e.to_string()))?;
        }
        Ok(())
    }
}
