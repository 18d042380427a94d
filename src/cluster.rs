//! Marker store backing the headless pin layer.
//!
//! Clustering itself is left to the map library; the headless backend only
//! needs to know which markers a pin layer holds and where they lie.

use crate::bounds::{compute_bounds, Bounds};
use crate::Coordinate;

/// All markers of one pin layer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClusterGroup {
    markers: Vec<Coordinate>,
}

impl ClusterGroup {
    /// Build a group from already validated coordinates. Non-finite
    /// positions are skipped.
    pub fn from_markers(markers: &[Coordinate]) -> Self {
        Self {
            markers: markers.iter().copied().filter(Coordinate::is_finite).collect(),
        }
    }

    pub fn markers(&self) -> &[Coordinate] {
        &self.markers
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    /// Bounds of every marker in the group.
    pub fn bounds(&self) -> Option<Bounds> {
        compute_bounds(&self.markers)
    }
}
