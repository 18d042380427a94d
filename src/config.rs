//! Widget configuration.
//!
//! Every field has a default matching the page template this widget ships
//! with, so a page only needs to provide `data_url`:
//!
//! ```rust
//! use sales_map::MapConfig;
//!
//! let config = MapConfig::from_json(r#"{"data_url": "/control/event/demo/sales-map/data/"}"#).unwrap();
//! assert_eq!(config.container_id, "sales-map-container");
//! assert_eq!(config.initial_zoom, 5);
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, LoadError};
use crate::heatmap::HeatmapOptions;
use crate::{Coordinate, ViewMode};

/// Base imagery layer settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TileLayerConfig {
    /// Slippy-map URL template with `{s}`, `{z}`, `{x}`, `{y}` placeholders.
    pub url_template: String,
    /// Attribution markup required by the tile provider's licence.
    pub attribution: String,
    /// Deepest zoom level the provider serves.
    /// Default: 19
    pub max_zoom: u8,
}

impl Default for TileLayerConfig {
    fn default() -> Self {
        Self {
            url_template: "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png".to_string(),
            attribution: "&copy; <a href=\"https://www.openstreetmap.org/copyright\">OpenStreetMap</a> contributors"
                .to_string(),
            max_zoom: 19,
        }
    }
}

/// Configuration for one widget instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    /// Id of the element the map renders into.
    /// Default: "sales-map-container"
    pub container_id: String,

    /// Id of the optional view toggle button.
    /// Default: "view-toggle-btn"
    pub toggle_id: String,

    /// Endpoint serving `{"coordinates": [[lat, lon], ...]}`. Required at load time.
    pub data_url: Option<String>,

    /// Viewport center before data arrives.
    /// Default: [48.85, 2.35]
    pub center: Coordinate,

    /// Zoom level before data arrives.
    /// Default: 5
    pub initial_zoom: u8,

    /// View shown once layers are built.
    /// Default: pins
    pub default_view: ViewMode,

    pub tiles: TileLayerConfig,

    pub heatmap: HeatmapOptions,

    /// Padding in pixels kept around the points when fitting the viewport.
    /// Default: 50
    pub fit_padding: u32,

    /// Zoom used when the points have no area to fit (a single location).
    /// Default: 13
    pub single_point_zoom: u8,

    /// Directory the marker icon images are served from.
    /// Default: "/static/leaflet/images/"
    pub marker_image_path: Option<String>,

    /// Shown while the request is in flight. `None` shows nothing.
    pub loading_message: Option<String>,

    /// Shown when the endpoint returns no coordinates.
    pub empty_message: String,

    /// Delay before the surface recomputes its size after data loads.
    /// Default: 100
    pub invalidate_delay_ms: u32,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            container_id: "sales-map-container".to_string(),
            toggle_id: "view-toggle-btn".to_string(),
            data_url: None,
            center: Coordinate::new(48.85, 2.35),
            initial_zoom: 5,
            default_view: ViewMode::Pins,
            tiles: TileLayerConfig::default(),
            heatmap: HeatmapOptions::default(),
            fit_padding: 50,
            single_point_zoom: 13,
            marker_image_path: Some("/static/leaflet/images/".to_string()),
            loading_message: Some("Loading ticket locations...".to_string()),
            empty_message: "No geocoded ticket locations found for this event.".to_string(),
            invalidate_delay_ms: 100,
        }
    }
}

impl MapConfig {
    /// Parse a page-provided JSON object. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn with_data_url(mut self, url: impl Into<String>) -> Self {
        self.data_url = Some(url.into());
        self
    }

    /// The endpoint to fetch, or a configuration error if none was given.
    pub fn data_url(&self) -> Result<&str, LoadError> {
        match self.data_url.as_deref().map(str::trim) {
            Some(url) if !url.is_empty() => Ok(url),
            _ => Err(LoadError::MissingDataUrl),
        }
    }
}
