//! View renderer: builds the pin and heat layers once and keeps exactly one
//! of them attached according to the current [`ViewMode`].

use log::{debug, info, warn};

use crate::backend::MapSurface;
use crate::coordinates::CoordinateSet;
use crate::heatmap::HeatmapOptions;
use crate::ViewMode;

/// Cached overlays plus the two-state view toggle.
///
/// `show_current_view` is the only code path that attaches or detaches
/// overlays.
#[derive(Debug)]
pub struct ViewRenderer<L> {
    mode: ViewMode,
    pins: Option<L>,
    heatmap: Option<L>,
    marker_count: usize,
    built: bool,
}

impl<L> ViewRenderer<L> {
    pub fn new(mode: ViewMode) -> Self {
        Self {
            mode,
            pins: None,
            heatmap: None,
            marker_count: 0,
            built: false,
        }
    }

    pub fn mode(&self) -> ViewMode {
        self.mode
    }

    pub fn pin_layer(&self) -> Option<&L> {
        self.pins.as_ref()
    }

    pub fn heat_layer(&self) -> Option<&L> {
        self.heatmap.as_ref()
    }

    /// Markers placed in the pin layer by the last build.
    pub fn marker_count(&self) -> usize {
        self.marker_count
    }

    /// Build both layers from `set`. Attaches nothing.
    ///
    /// The pin layer gets one marker per entry whose latitude and longitude
    /// both parse; other entries are skipped. The heat layer receives the set
    /// unfiltered. A layer that fails to build stays unset. Returns the
    /// number of markers placed.
    pub fn build_layers<S>(&mut self, surface: &mut S, set: &CoordinateSet, options: &HeatmapOptions) -> usize
    where
        S: MapSurface<Layer = L>,
    {
        if self.built {
            warn!("[ViewRenderer] Layers already built, keeping cached instances");
            return self.marker_count;
        }
        self.built = true;

        let markers = set.valid_points();
        let skipped = set.len() - markers.len();
        if skipped > 0 {
            debug!("[ViewRenderer] Skipped {} coordinates that did not parse", skipped);
        }

        match surface.pin_layer(&markers) {
            Ok(layer) => {
                self.pins = Some(layer);
                self.marker_count = markers.len();
                debug!("[ViewRenderer] Pin layer created with {} markers", markers.len());
            }
            Err(e) => warn!("[ViewRenderer] Error creating pin layer: {}", e),
        }

        match surface.heat_layer(set, options) {
            Ok(layer) => {
                self.heatmap = Some(layer);
                debug!("[ViewRenderer] Heatmap layer created from {} points", set.len());
            }
            Err(e) => warn!("[ViewRenderer] Error creating heatmap layer: {}", e),
        }

        self.marker_count
    }

    /// Detach whatever is attached, then attach the layer for the current mode.
    ///
    /// Idempotent. A mode whose layer was never built attaches nothing.
    pub fn show_current_view<S>(&self, surface: &mut S)
    where
        S: MapSurface<Layer = L>,
    {
        debug!("[ViewRenderer] Showing view: {}", self.mode);

        for layer in [self.pins.as_ref(), self.heatmap.as_ref()].into_iter().flatten() {
            if surface.is_attached(layer) {
                surface.detach(layer);
            }
        }

        let target = match self.mode {
            ViewMode::Pins => self.pins.as_ref(),
            ViewMode::Heatmap => self.heatmap.as_ref(),
        };

        match target {
            Some(layer) => {
                if let Err(e) = surface.attach(layer) {
                    warn!("[ViewRenderer] Error adding {} layer: {}", self.mode, e);
                }
            }
            None => warn!(
                "[ViewRenderer] Cannot add layer for view \"{}\": layer not built",
                self.mode
            ),
        }
    }

    /// Flip the view mode and re-render. Returns the new mode.
    pub fn toggle<S>(&mut self, surface: &mut S) -> ViewMode
    where
        S: MapSurface<Layer = L>,
    {
        self.mode = self.mode.toggled();
        info!("[ViewRenderer] Switched to {} view", self.mode);
        self.show_current_view(surface);
        self.mode
    }
}
