//! # Sales Map
//!
//! Ticket sales location map: fetches geocoded order coordinates once per page
//! view and renders them as clustered pins or as a heatmap, with a button that
//! flips between the two.
//!
//! This library provides:
//! - Typed, validated coordinate payloads ([`CoordinateSet`])
//! - A per-container widget controller ([`SalesMap`]) driving any rendering
//!   backend that implements [`MapSurface`] and [`PageElements`]
//! - An in-memory backend ([`headless`]) for tests and server-side use
//!
//! ## Features
//!
//! - **`http`** - Enable the reqwest-backed [`fetch::HttpFetcher`]
//! - **`web`** - Enable the Leaflet/DOM backend and the `mountSalesMap` JS entry point
//! - **`full`** - Enable all features
//!
//! ## Quick Start
//!
//! ```rust
//! use sales_map::{MapConfig, SalesMap, ViewMode};
//! use sales_map::headless::{HeadlessMap, HeadlessPage};
//!
//! let config = MapConfig::default().with_data_url("/sales-map/data/");
//! let page = HeadlessPage::new(true, true);
//! let mut widget = SalesMap::mount(config, page, |cfg| Ok(HeadlessMap::new(cfg.center, cfg.initial_zoom)))
//!     .expect("container exists");
//!
//! // The caller performs the request for the returned URL
//! let url = widget.begin_load().expect("data URL configured");
//! assert_eq!(url, "/sales-map/data/");
//!
//! let body = br#"{"coordinates": [[48.85, 2.35], [45.76, 4.83]]}"#;
//! widget.finish_load(Ok(sales_map::HttpReply::ok(body.to_vec())));
//!
//! assert_eq!(widget.view_mode(), ViewMode::Pins);
//! assert_eq!(widget.on_toggle(), ViewMode::Heatmap);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub mod backend;
pub mod bounds;
pub mod cluster;
pub mod config;
pub mod coordinates;
pub mod error;
pub mod fetch;
pub mod headless;
pub mod heatmap;
pub mod render;
pub mod widget;

// Leaflet/DOM backend
#[cfg(feature = "web")]
pub mod web;

pub use backend::{MapSurface, MessageKind, PageElements, PageMessage};
pub use bounds::Bounds;
pub use config::{MapConfig, TileLayerConfig};
pub use coordinates::{CoordinateSet, RawCoordinate, SalesMapResponse};
pub use error::{ConfigError, ErrorKind, LoadError, MountError, RenderError};
pub use fetch::{CoordinateFetcher, HttpReply};
pub use heatmap::HeatmapOptions;
pub use render::ViewRenderer;
pub use widget::{LoadStatus, SalesMap};

#[cfg(feature = "http")]
pub use fetch::HttpFetcher;

// ============================================================================
// Core Types
// ============================================================================

/// A geocoded sale location.
///
/// Serialized as a `[lat, lon]` pair, the same shape the data endpoint uses.
///
/// # Example
/// ```
/// use sales_map::Coordinate;
/// let paris = Coordinate::new(48.85, 2.35);
/// assert!(paris.is_finite());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    /// Create a new coordinate.
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// Both components are finite numbers.
    pub fn is_finite(&self) -> bool {
        self.latitude.is_finite() && self.longitude.is_finite()
    }
}

impl From<[f64; 2]> for Coordinate {
    fn from(pair: [f64; 2]) -> Self {
        Self::new(pair[0], pair[1])
    }
}

impl From<Coordinate> for [f64; 2] {
    fn from(c: Coordinate) -> Self {
        [c.latitude, c.longitude]
    }
}

/// Which rendering of the point set is visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    #[default]
    Pins,
    Heatmap,
}

impl ViewMode {
    /// The other mode. Toggling always flips.
    pub fn toggled(self) -> Self {
        match self {
            ViewMode::Pins => ViewMode::Heatmap,
            ViewMode::Heatmap => ViewMode::Pins,
        }
    }

    /// Toggle button label while this mode is showing: names the mode the
    /// next click switches to.
    pub fn toggle_label(self) -> &'static str {
        match self {
            ViewMode::Pins => "Switch to Heatmap View",
            ViewMode::Heatmap => "Switch to Pin View",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ViewMode::Pins => "pins",
            ViewMode::Heatmap => "heatmap",
        }
    }
}

impl fmt::Display for ViewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ViewMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pins" => Ok(ViewMode::Pins),
            "heatmap" => Ok(ViewMode::Heatmap),
            other => Err(ConfigError::UnknownViewMode(other.to_string())),
        }
    }
}

// ============================================================================
// Logging
// ============================================================================

/// Route `log` output to the browser console and install the panic hook.
///
/// Safe to call more than once; only the first call installs anything.
#[cfg(feature = "web")]
pub fn init_logging() {
    web::init_console_logging();
}

/// No-op outside the browser; native consumers pick their own logger.
#[cfg(not(feature = "web"))]
pub fn init_logging() {}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coordinate_finite() {
        assert!(Coordinate::new(48.85, 2.35).is_finite());
        assert!(!Coordinate::new(f64::NAN, 2.35).is_finite());
        assert!(!Coordinate::new(48.85, f64::INFINITY).is_finite());
    }

    #[test]
    fn test_coordinate_serializes_as_pair() {
        let json = serde_json::to_string(&Coordinate::new(48.85, 2.35)).unwrap();
        assert_eq!(json, "[48.85,2.35]");
        let back: Coordinate = serde_json::from_str("[51.5, -0.12]").unwrap();
        assert_eq!(back, Coordinate::new(51.5, -0.12));
    }

    #[test]
    fn test_view_mode_toggle_round_trip() {
        assert_eq!(ViewMode::Pins.toggled(), ViewMode::Heatmap);
        assert_eq!(ViewMode::Pins.toggled().toggled(), ViewMode::Pins);
    }

    #[test]
    fn test_view_mode_labels_name_next_action() {
        assert_eq!(ViewMode::Pins.toggle_label(), "Switch to Heatmap View");
        assert_eq!(ViewMode::Heatmap.toggle_label(), "Switch to Pin View");
    }

    #[test]
    fn test_view_mode_parse() {
        assert_eq!("pins".parse::<ViewMode>().unwrap(), ViewMode::Pins);
        assert_eq!(" Heatmap ".parse::<ViewMode>().unwrap(), ViewMode::Heatmap);
        assert!("satellite".parse::<ViewMode>().is_err());
        let mode: ViewMode = serde_json::from_str("\"heatmap\"").unwrap();
        assert_eq!(mode, ViewMode::Heatmap);
    }
}
