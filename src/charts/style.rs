//! Chart Style Module
//! Figure size, fonts and colours applied to every chart.

use crate::charts::ChartError;
use plotters::style::RGBColor;
use serde::{Deserialize, Serialize};

/// Figure-wide settings. Defaults: a 14" x 7" figure at 100 DPI, 14 pt text,
/// no grid lines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlotStyle {
    pub width_in: f64,
    pub height_in: f64,
    pub dpi: u32,
    pub font_size: u32,
    pub font_family: String,
    pub show_grid: bool,
}

impl Default for PlotStyle {
    fn default() -> Self {
        Self {
            width_in: 14.0,
            height_in: 7.0,
            dpi: 100,
            font_size: 14,
            font_family: "sans-serif".to_string(),
            show_grid: false,
        }
    }
}

impl PlotStyle {
    /// Figure size in pixels.
    pub fn pixel_size(&self) -> (u32, u32) {
        let dpi = self.dpi as f64;
        (
            (self.width_in * dpi).round() as u32,
            (self.height_in * dpi).round() as u32,
        )
    }

    pub fn title_size(&self) -> u32 {
        self.font_size + self.font_size / 4
    }
}

/// Series colours as `#rrggbb`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Palette {
    pub primary: String,
    pub secondary: String,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            primary: "#539caf".to_string(),
            secondary: "#7663b0".to_string(),
        }
    }
}

impl Palette {
    pub fn primary_rgb(&self) -> Result<RGBColor, ChartError> {
        parse_hex_color(&self.primary)
    }

    pub fn secondary_rgb(&self) -> Result<RGBColor, ChartError> {
        parse_hex_color(&self.secondary)
    }
}

/// Parse `#rrggbb` (the leading `#` is optional).
pub fn parse_hex_color(hex: &str) -> Result<RGBColor, ChartError> {
    let digits = hex.strip_prefix('#').unwrap_or(hex);
    if digits.len() != 6 || !digits.is_ascii() {
        return Err(ChartError::InvalidColor(hex.to_string()));
    }
    let channel = |i: usize| {
        u8::from_str_radix(&digits[i..i + 2], 16)
            .map_err(|_| ChartError::InvalidColor(hex.to_string()))
    };
    Ok(RGBColor(channel(0)?, channel(2)?, channel(4)?))
}
