//! Heatmap parameters.
//!
//! [`HeatmapOptions`] are the fixed visual parameters handed to the heatmap
//! renderer. Backends validate them before building a heat layer.

use serde::{Deserialize, Serialize};

use crate::error::RenderError;

/// Visual parameters of the heatmap layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeatmapOptions {
    /// Radius of each point in pixels (default: 25)
    pub radius: f64,
    /// Blur added around each point in pixels (default: 15)
    pub blur: f64,
    /// Zoom at which points reach full intensity (default: 18)
    pub max_zoom: u8,
    /// Intensity ceiling; cells at or above it are fully opaque (default: 1.0)
    pub max: f64,
    /// Opacity floor for any non-empty cell (default: 0.2)
    pub min_opacity: f64,
}

impl Default for HeatmapOptions {
    fn default() -> Self {
        Self {
            radius: 25.0,
            blur: 15.0,
            max_zoom: 18,
            max: 1.0,
            min_opacity: 0.2,
        }
    }
}

impl HeatmapOptions {
    /// Reject parameters the renderer cannot draw with.
    pub fn validate(&self) -> Result<(), RenderError> {
        if !(self.radius.is_finite() && self.radius > 0.0) {
            return Err(RenderError::InvalidHeatmapOptions(format!(
                "radius must be positive, got {}",
                self.radius
            )));
        }
        if !(self.blur.is_finite() && self.blur >= 0.0) {
            return Err(RenderError::InvalidHeatmapOptions(format!(
                "blur must be non-negative, got {}",
                self.blur
            )));
        }
        if !(self.max.is_finite() && self.max > 0.0) {
            return Err(RenderError::InvalidHeatmapOptions(format!(
                "max must be positive, got {}",
                self.max
            )));
        }
        if !(0.0..=1.0).contains(&self.min_opacity) {
            return Err(RenderError::InvalidHeatmapOptions(format!(
                "min_opacity must be within 0..=1, got {}",
                self.min_opacity
            )));
        }
        Ok(())
    }
}
