//! Rendering and page seams.
//!
//! The widget never talks to a map library or the DOM directly. A backend
//! provides a [`MapSurface`] (the map, its overlays and viewport) and a
//! [`PageElements`] (the container and the toggle button). The browser
//! backend lives in `web`, the in-memory one in [`crate::headless`].

use crate::bounds::Bounds;
use crate::config::TileLayerConfig;
use crate::coordinates::CoordinateSet;
use crate::error::RenderError;
use crate::heatmap::HeatmapOptions;
use crate::Coordinate;

/// The map and the overlays it can host.
pub trait MapSurface {
    /// Handle to a built overlay. Cheap to hold; the surface owns the real thing.
    type Layer;

    /// Center the viewport on `center` at `zoom`.
    fn set_view(&mut self, center: Coordinate, zoom: u8) -> Result<(), RenderError>;

    /// Attach the background tiles.
    fn add_base_layer(&mut self, tiles: &TileLayerConfig) -> Result<(), RenderError>;

    /// Build a clustered marker layer, one marker per coordinate. Not attached.
    fn pin_layer(&mut self, markers: &[Coordinate]) -> Result<Self::Layer, RenderError>;

    /// Build a heat layer from the unfiltered set. Not attached.
    fn heat_layer(
        &mut self,
        points: &CoordinateSet,
        options: &HeatmapOptions,
    ) -> Result<Self::Layer, RenderError>;

    fn attach(&mut self, layer: &Self::Layer) -> Result<(), RenderError>;

    /// Remove `layer` from the map. Must tolerate layers that are not attached.
    fn detach(&mut self, layer: &Self::Layer);

    fn is_attached(&self, layer: &Self::Layer) -> bool;

    /// Bounds of the points in `layer`, if the layer can compute them.
    fn layer_bounds(&self, layer: &Self::Layer) -> Option<Bounds>;

    /// Fit the viewport to `bounds`, keeping `padding` pixels clear on each side.
    fn fit_bounds(&mut self, bounds: &Bounds, padding: u32) -> Result<(), RenderError>;

    /// Recompute the surface size after the container was laid out.
    fn invalidate_size(&mut self) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    /// Request in flight
    Loading,
    /// Informational, e.g. no data
    Info,
    /// Load failed; replaces the map content
    Error,
}

/// Text shown inside the map container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageMessage {
    pub kind: MessageKind,
    pub text: String,
}

impl PageMessage {
    pub fn loading(text: impl Into<String>) -> Self {
        Self { kind: MessageKind::Loading, text: text.into() }
    }

    pub fn info(text: impl Into<String>) -> Self {
        Self { kind: MessageKind::Info, text: text.into() }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self { kind: MessageKind::Error, text: text.into() }
    }
}

/// The page elements the widget is bound to.
pub trait PageElements {
    fn has_container(&self) -> bool;

    fn has_toggle(&self) -> bool;

    /// Show `message` in the container. Errors replace the map content.
    fn show_message(&mut self, message: &PageMessage);

    /// Remove a loading or info message, if one is shown.
    fn clear_message(&mut self);

    fn set_toggle_label(&mut self, label: &str);

    fn set_toggle_disabled(&mut self, disabled: bool);
}
