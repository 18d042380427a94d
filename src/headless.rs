//! In-memory backend.
//!
//! [`HeadlessMap`] and [`HeadlessPage`] implement the rendering and page seams
//! without a browser. They keep the state a real page would show (viewport,
//! attached overlays, container message, toggle button) so it can be
//! inspected after driving a [`crate::SalesMap`].

use log::debug;

use crate::backend::{MapSurface, MessageKind, PageElements, PageMessage};
use crate::bounds::{bounds_zoom, Bounds};
use crate::cluster::ClusterGroup;
use crate::config::TileLayerConfig;
use crate::coordinates::CoordinateSet;
use crate::error::RenderError;
use crate::heatmap::HeatmapOptions;
use crate::Coordinate;

/// Viewport size in pixels used when fitting bounds.
pub const DEFAULT_VIEWPORT: (f64, f64) = (800.0, 600.0);

/// Deepest zoom before a tile layer says otherwise.
const DEFAULT_MAX_ZOOM: u8 = 18;

/// Handle to a layer owned by a [`HeadlessMap`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LayerId(usize);

#[derive(Debug, Clone)]
pub enum HeadlessLayer {
    Pins(ClusterGroup),
    Heat {
        points: Vec<Coordinate>,
        options: HeatmapOptions,
    },
}

/// Map surface that records everything done to it.
#[derive(Debug, Clone)]
pub struct HeadlessMap {
    center: Coordinate,
    zoom: u8,
    max_zoom: u8,
    viewport: (f64, f64),
    base_layer: Option<TileLayerConfig>,
    layers: Vec<HeadlessLayer>,
    attached: Vec<LayerId>,
    size_invalidations: u32,
}

impl HeadlessMap {
    pub fn new(center: Coordinate, zoom: u8) -> Self {
        Self {
            center,
            zoom,
            max_zoom: DEFAULT_MAX_ZOOM,
            viewport: DEFAULT_VIEWPORT,
            base_layer: None,
            layers: Vec::new(),
            attached: Vec::new(),
            size_invalidations: 0,
        }
    }

    pub fn center(&self) -> Coordinate {
        self.center
    }

    pub fn zoom(&self) -> u8 {
        self.zoom
    }

    pub fn base_layer(&self) -> Option<&TileLayerConfig> {
        self.base_layer.as_ref()
    }

    /// Attached overlays, in attach order.
    pub fn attached_layers(&self) -> &[LayerId] {
        &self.attached
    }

    pub fn layer(&self, id: &LayerId) -> Option<&HeadlessLayer> {
        self.layers.get(id.0)
    }

    pub fn cluster_group(&self, id: &LayerId) -> Option<&ClusterGroup> {
        match self.layer(id)? {
            HeadlessLayer::Pins(group) => Some(group),
            HeadlessLayer::Heat { .. } => None,
        }
    }

    pub fn size_invalidations(&self) -> u32 {
        self.size_invalidations
    }

    fn push_layer(&mut self, layer: HeadlessLayer) -> LayerId {
        self.layers.push(layer);
        LayerId(self.layers.len() - 1)
    }
}

impl MapSurface for HeadlessMap {
    type Layer = LayerId;

    fn set_view(&mut self, center: Coordinate, zoom: u8) -> Result<(), RenderError> {
        if !center.is_finite() {
            return Err(RenderError::Backend(format!("invalid center {:?}", center)));
        }
        self.center = center;
        self.zoom = zoom.min(self.max_zoom);
        Ok(())
    }

    fn add_base_layer(&mut self, tiles: &TileLayerConfig) -> Result<(), RenderError> {
        self.max_zoom = tiles.max_zoom;
        self.base_layer = Some(tiles.clone());
        Ok(())
    }

    fn pin_layer(&mut self, markers: &[Coordinate]) -> Result<LayerId, RenderError> {
        Ok(self.push_layer(HeadlessLayer::Pins(ClusterGroup::from_markers(markers))))
    }

    fn heat_layer(&mut self, points: &CoordinateSet, options: &HeatmapOptions) -> Result<LayerId, RenderError> {
        options.validate()?;
        Ok(self.push_layer(HeadlessLayer::Heat {
            points: points.valid_points(),
            options: options.clone(),
        }))
    }

    fn attach(&mut self, layer: &LayerId) -> Result<(), RenderError> {
        if self.layer(layer).is_none() {
            return Err(RenderError::Backend(format!("unknown layer {:?}", layer)));
        }
        if !self.attached.contains(layer) {
            self.attached.push(*layer);
        }
        Ok(())
    }

    fn detach(&mut self, layer: &LayerId) {
        self.attached.retain(|id| id != layer);
    }

    fn is_attached(&self, layer: &LayerId) -> bool {
        self.attached.contains(layer)
    }

    fn layer_bounds(&self, layer: &LayerId) -> Option<Bounds> {
        self.cluster_group(layer)?.bounds()
    }

    fn fit_bounds(&mut self, bounds: &Bounds, padding: u32) -> Result<(), RenderError> {
        if !bounds.is_valid() {
            return Err(RenderError::Backend(format!("invalid bounds {:?}", bounds)));
        }
        let (width, height) = self.viewport;
        self.zoom = bounds_zoom(bounds, width, height, padding as f64, self.max_zoom);
        self.center = bounds.center();
        debug!("[HeadlessMap] Fitted bounds at zoom {}", self.zoom);
        Ok(())
    }

    fn invalidate_size(&mut self) {
        self.size_invalidations += 1;
    }
}

/// Page with an optional container and toggle button.
#[derive(Debug, Clone, Default)]
pub struct HeadlessPage {
    container: bool,
    toggle: bool,
    message: Option<PageMessage>,
    content_replaced: bool,
    toggle_label: Option<String>,
    toggle_disabled: bool,
}

impl HeadlessPage {
    pub fn new(container: bool, toggle: bool) -> Self {
        Self {
            container,
            toggle,
            ..Default::default()
        }
    }

    /// Message currently shown in the container.
    pub fn message(&self) -> Option<&PageMessage> {
        self.message.as_ref()
    }

    /// An error message replaced the map content.
    pub fn content_replaced(&self) -> bool {
        self.content_replaced
    }

    pub fn toggle_label(&self) -> Option<&str> {
        self.toggle_label.as_deref()
    }

    pub fn toggle_disabled(&self) -> bool {
        self.toggle_disabled
    }
}

impl PageElements for HeadlessPage {
    fn has_container(&self) -> bool {
        self.container
    }

    fn has_toggle(&self) -> bool {
        self.toggle
    }

    fn show_message(&mut self, message: &PageMessage) {
        if message.kind == MessageKind::Error {
            self.content_replaced = true;
        }
        self.message = Some(message.clone());
    }

    fn clear_message(&mut self) {
        if self.message.as_ref().map(|m| m.kind) != Some(MessageKind::Error) {
            self.message = None;
        }
    }

    fn set_toggle_label(&mut self, label: &str) {
        if self.toggle {
            self.toggle_label = Some(label.to_string());
        }
    }

    fn set_toggle_disabled(&mut self, disabled: bool) {
        if self.toggle {
            self.toggle_disabled = disabled;
        }
    }
}
