//! # Bounds
//!
//! Bounding regions and Web-Mercator helpers used to fit the viewport around
//! the sale locations.
//!
//! ## Overview
//!
//! | Function | Description |
//! |----------|-------------|
//! | [`compute_bounds`] | Smallest box enclosing a set of coordinates |
//! | [`project`] | Coordinate to Web-Mercator pixel space at a zoom level |
//! | [`bounds_zoom`] | Largest zoom at which a box fits a padded viewport |
//!
//! ## Example
//!
//! ```rust
//! use sales_map::{Coordinate, bounds};
//!
//! let points = vec![
//!     Coordinate::new(48.85, 2.35),  // Paris
//!     Coordinate::new(45.76, 4.83),  // Lyon
//! ];
//!
//! let b = bounds::compute_bounds(&points).expect("non-empty");
//! assert!(b.is_valid());
//! assert!(!b.is_degenerate());
//! ```
//!
//! ## Coordinate System
//!
//! All functions expect WGS84 latitude/longitude in degrees. Pixel space is the
//! 256-pixel-tile Web-Mercator plane used by slippy-map tile providers.

use geo::{BoundingRect, MultiPoint, Point};
use std::f64::consts::PI;

use crate::Coordinate;

/// Size in pixels of one map tile at zoom 0.
pub const TILE_SIZE: f64 = 256.0;

/// Web-Mercator is undefined at the poles; latitudes are clamped to this.
pub const MAX_MERCATOR_LATITUDE: f64 = 85.051_128_779_806_6;

/// Rectangular geographic region.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}

impl Bounds {
    /// All edges are finite and ordered.
    pub fn is_valid(&self) -> bool {
        self.min_lat.is_finite()
            && self.max_lat.is_finite()
            && self.min_lng.is_finite()
            && self.max_lng.is_finite()
            && self.min_lat <= self.max_lat
            && self.min_lng <= self.max_lng
    }

    /// The box has no area, e.g. it was built from a single location.
    /// Fitting a viewport to it would zoom in without limit.
    pub fn is_degenerate(&self) -> bool {
        self.min_lat == self.max_lat || self.min_lng == self.max_lng
    }

    pub fn center(&self) -> Coordinate {
        Coordinate::new(
            (self.min_lat + self.max_lat) / 2.0,
            (self.min_lng + self.max_lng) / 2.0,
        )
    }
}

/// Compute the smallest box enclosing every finite coordinate.
///
/// Non-finite coordinates are ignored. Returns `None` when nothing finite is
/// left.
///
/// # Example
///
/// ```rust
/// use sales_map::{Coordinate, bounds};
///
/// let points = vec![
///     Coordinate::new(51.50, -0.13),
///     Coordinate::new(51.51, -0.12),
///     Coordinate::new(f64::NAN, 0.0),
/// ];
///
/// let b = bounds::compute_bounds(&points).unwrap();
/// assert_eq!(b.min_lat, 51.50);
/// assert_eq!(b.max_lng, -0.12);
/// ```
pub fn compute_bounds(points: &[Coordinate]) -> Option<Bounds> {
    let multi: MultiPoint<f64> = points
        .iter()
        .filter(|c| c.is_finite())
        .map(|c| Point::new(c.longitude, c.latitude))
        .collect();

    let rect = multi.bounding_rect()?;
    Some(Bounds {
        min_lat: rect.min().y,
        max_lat: rect.max().y,
        min_lng: rect.min().x,
        max_lng: rect.max().x,
    })
}

// =============================================================================
// Projection
// =============================================================================

/// Project a coordinate to Web-Mercator pixel space at `zoom`.
///
/// Returns `(x, y)` with the origin at the north-west corner of the world.
pub fn project(c: Coordinate, zoom: f64) -> (f64, f64) {
    let scale = TILE_SIZE * 2f64.powf(zoom);
    let lat = c
        .latitude
        .clamp(-MAX_MERCATOR_LATITUDE, MAX_MERCATOR_LATITUDE)
        .to_radians();

    let x = (c.longitude + 180.0) / 360.0 * scale;
    let y = (1.0 - (lat.tan() + 1.0 / lat.cos()).ln() / PI) / 2.0 * scale;
    (x, y)
}

/// Largest integer zoom at which `bounds` fits a `width` x `height` viewport
/// after `padding` pixels on every side, capped at `max_zoom`.
///
/// Degenerate bounds always fit, so they yield `max_zoom`.
pub fn bounds_zoom(bounds: &Bounds, width: f64, height: f64, padding: f64, max_zoom: u8) -> u8 {
    let (x0, y0) = project(Coordinate::new(bounds.max_lat, bounds.min_lng), 0.0);
    let (x1, y1) = project(Coordinate::new(bounds.min_lat, bounds.max_lng), 0.0);
    let span_x = (x1 - x0).abs();
    let span_y = (y1 - y0).abs();

    let avail_x = (width - 2.0 * padding).max(1.0);
    let avail_y = (height - 2.0 * padding).max(1.0);

    let scale = match (span_x > 0.0, span_y > 0.0) {
        (false, false) => return max_zoom,
        (true, false) => avail_x / span_x,
        (false, true) => avail_y / span_y,
        (true, true) => (avail_x / span_x).min(avail_y / span_y),
    };

    let zoom = scale.log2().floor();
    if zoom <= 0.0 {
        0
    } else {
        (zoom as u8).min(max_zoom)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
