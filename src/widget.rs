//! The sales map widget controller.
//!
//! One [`SalesMap`] per map container. It owns the rendering surface, the page
//! elements, the fetched coordinates and the view state; nothing is shared
//! between instances.
//!
//! Lifecycle:
//! 1. [`SalesMap::mount`] checks the page, creates the surface, centers it and
//!    attaches the base tiles.
//! 2. [`SalesMap::load`] (or `begin_load` + `finish_load` when the caller owns
//!    the request) fetches the coordinates exactly once.
//! 3. On data, both layers are built, the default view is attached and the
//!    viewport is fitted.
//! 4. [`SalesMap::on_toggle`] flips between pins and heatmap.

use log::{debug, error, info, warn};

use crate::backend::{MapSurface, PageElements, PageMessage};
use crate::bounds::compute_bounds;
use crate::config::MapConfig;
use crate::coordinates::{CoordinateSet, SalesMapResponse};
use crate::error::{LoadError, MountError, RenderError};
use crate::fetch::{CoordinateFetcher, HttpReply};
use crate::render::ViewRenderer;
use crate::ViewMode;

/// Where the single data load stands.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadStatus {
    NotStarted,
    /// Request sent, reply pending
    Loading,
    /// Layers built; `markers` of `entries` coordinates were renderable
    Loaded { entries: usize, markers: usize },
    /// The endpoint had no coordinates
    Empty,
    Failed(LoadError),
}

/// Map widget bound to one container.
pub struct SalesMap<S: MapSurface, P: PageElements> {
    config: MapConfig,
    surface: S,
    page: P,
    toggle_enabled: bool,
    coordinates: Option<CoordinateSet>,
    renderer: ViewRenderer<S::Layer>,
    status: LoadStatus,
}

impl<S: MapSurface, P: PageElements> SalesMap<S, P> {
    /// Bootstrap the widget on `page`.
    ///
    /// A missing container aborts before anything else happens. A missing
    /// toggle button only disables view switching. `create_surface` builds the
    /// map inside the container; if it or the initial setup fails the error is
    /// shown in the container.
    pub fn mount<F>(config: MapConfig, mut page: P, create_surface: F) -> Result<Self, MountError>
    where
        F: FnOnce(&MapConfig) -> Result<S, RenderError>,
    {
        if !page.has_container() {
            error!("[SalesMap] Map container element #{} not found", config.container_id);
            return Err(MountError::MissingContainer(config.container_id.clone()));
        }

        let toggle_enabled = page.has_toggle();
        if !toggle_enabled {
            warn!(
                "[SalesMap] Toggle button #{} not found, view stays on {}",
                config.toggle_id, config.default_view
            );
        }

        info!("[SalesMap] Initializing map in #{}", config.container_id);
        let surface = match Self::init_surface(&config, create_surface) {
            Ok(surface) => surface,
            Err(e) => {
                error!("[SalesMap] Error during map initialization: {}", e);
                page.show_message(&PageMessage::error(format!("Map initialization failed: {}", e)));
                return Err(MountError::MapInit(e));
            }
        };

        if toggle_enabled {
            page.set_toggle_label(config.default_view.toggle_label());
        }

        Ok(Self {
            renderer: ViewRenderer::new(config.default_view),
            config,
            surface,
            page,
            toggle_enabled,
            coordinates: None,
            status: LoadStatus::NotStarted,
        })
    }

    fn init_surface<F>(config: &MapConfig, create_surface: F) -> Result<S, RenderError>
    where
        F: FnOnce(&MapConfig) -> Result<S, RenderError>,
    {
        let mut surface = create_surface(config)?;
        surface.set_view(config.center, config.initial_zoom)?;
        surface.add_base_layer(&config.tiles)?;
        debug!("[SalesMap] Base layer added");
        Ok(surface)
    }

    /// Mount, then immediately load the data.
    pub async fn start<F, C>(config: MapConfig, page: P, create_surface: F, fetcher: &C) -> Result<Self, MountError>
    where
        F: FnOnce(&MapConfig) -> Result<S, RenderError>,
        C: CoordinateFetcher + ?Sized,
    {
        let mut widget = Self::mount(config, page, create_surface)?;
        widget.load(fetcher).await;
        Ok(widget)
    }

    /// Fetch the coordinates and render them. Only the first call does anything.
    pub async fn load<C>(&mut self, fetcher: &C) -> LoadStatus
    where
        C: CoordinateFetcher + ?Sized,
    {
        let Some(url) = self.begin_load() else {
            return self.status.clone();
        };
        let reply = fetcher.fetch(&url).await;
        self.finish_load(reply)
    }

    /// Start the single load: returns the URL to request, or `None` if the
    /// load already started or the URL is not configured (the error is then
    /// shown in the container).
    ///
    /// Callers that cannot hold the widget across the request use this with
    /// [`SalesMap::finish_load`] instead of [`SalesMap::load`].
    pub fn begin_load(&mut self) -> Option<String> {
        if self.status != LoadStatus::NotStarted {
            warn!("[SalesMap] Coordinate data already requested, not fetching again");
            return None;
        }

        let url = match self.config.data_url() {
            Ok(url) => url.to_string(),
            Err(e) => {
                self.fail(e);
                return None;
            }
        };

        if let Some(text) = &self.config.loading_message {
            self.page.show_message(&PageMessage::loading(text.clone()));
        }
        self.status = LoadStatus::Loading;
        Some(url)
    }

    /// Complete the load with the request outcome.
    pub fn finish_load(&mut self, reply: Result<HttpReply, LoadError>) -> LoadStatus {
        if self.status != LoadStatus::Loading {
            warn!("[SalesMap] Ignoring reply, no request in flight");
            return self.status.clone();
        }

        match Self::classify(reply) {
            Ok(set) if set.is_empty() => self.show_empty(),
            Ok(set) => self.show_coordinates(set),
            Err(e) => self.fail(e),
        }
        self.status.clone()
    }

    fn classify(reply: Result<HttpReply, LoadError>) -> Result<CoordinateSet, LoadError> {
        let reply = reply?;
        if !reply.is_success() {
            let detail = SalesMapResponse::from_slice(&reply.body)
                .ok()
                .and_then(|r| r.error_message());
            return Err(LoadError::Status { status: reply.status, detail });
        }
        SalesMapResponse::from_slice(&reply.body)?.into_coordinate_set()
    }

    fn fail(&mut self, e: LoadError) {
        error!("[SalesMap] Error fetching or processing coordinate data: {}", e);
        self.page.show_message(&PageMessage::error(format!(
            "Error loading map data: {}. Please check logs or try again later.",
            e
        )));
        self.status = LoadStatus::Failed(e);
    }

    fn show_empty(&mut self) {
        info!("[SalesMap] No coordinate data received");
        self.page.show_message(&PageMessage::info(self.config.empty_message.clone()));
        if self.toggle_enabled {
            self.page.set_toggle_disabled(true);
        }
        self.status = LoadStatus::Empty;
    }

    fn show_coordinates(&mut self, set: CoordinateSet) {
        info!("[SalesMap] Received {} coordinates", set.len());
        self.page.clear_message();

        let markers = self
            .renderer
            .build_layers(&mut self.surface, &set, &self.config.heatmap);
        self.renderer.show_current_view(&mut self.surface);

        self.status = LoadStatus::Loaded { entries: set.len(), markers };
        self.coordinates = Some(set);
        self.fit_bounds();
    }

    /// Fit the viewport around the loaded points.
    ///
    /// Prefers the pin layer's own bounds and falls back to the raw
    /// coordinates. A region without area (one location) centers on it at
    /// `single_point_zoom` instead. Failures keep the current viewport.
    pub fn fit_bounds(&mut self) {
        let points = match &self.coordinates {
            Some(set) if !set.is_empty() => set.valid_points(),
            _ => return,
        };

        let bounds = self
            .renderer
            .pin_layer()
            .and_then(|layer| self.surface.layer_bounds(layer))
            .or_else(|| {
                debug!("[BoundsFitter] Pin layer has no bounds, using raw coordinates");
                compute_bounds(&points)
            });

        let zoom = self.config.single_point_zoom;
        let result = match bounds {
            Some(b) if b.is_valid() && !b.is_degenerate() => {
                debug!("[BoundsFitter] Fitting bounds {:?}", b);
                self.surface.fit_bounds(&b, self.config.fit_padding)
            }
            Some(b) if b.is_valid() => {
                debug!("[BoundsFitter] Bounds have no area, centering at zoom {}", zoom);
                self.surface.set_view(b.center(), zoom)
            }
            _ => {
                warn!("[BoundsFitter] Could not get valid bounds");
                match points.first() {
                    Some(p) => self.surface.set_view(*p, zoom),
                    None => Ok(()),
                }
            }
        };

        if let Err(e) = result {
            warn!("[BoundsFitter] Error fitting bounds: {}", e);
            if let [only] = points.as_slice() {
                if let Err(e) = self.surface.set_view(*only, zoom) {
                    warn!("[BoundsFitter] Fallback view failed, keeping viewport: {}", e);
                }
            }
        }
    }

    /// Handle a toggle click: flip the view and relabel the button.
    pub fn on_toggle(&mut self) -> ViewMode {
        if !self.toggle_enabled {
            warn!("[SalesMap] No toggle control, view stays on {}", self.renderer.mode());
            return self.renderer.mode();
        }
        let mode = self.renderer.toggle(&mut self.surface);
        self.page.set_toggle_label(mode.toggle_label());
        mode
    }

    /// Let the surface recompute its size once the container has settled.
    pub fn invalidate_size(&mut self) {
        self.surface.invalidate_size();
    }

    pub fn view_mode(&self) -> ViewMode {
        self.renderer.mode()
    }

    pub fn status(&self) -> &LoadStatus {
        &self.status
    }

    pub fn has_toggle(&self) -> bool {
        self.toggle_enabled
    }

    pub fn coordinates(&self) -> Option<&CoordinateSet> {
        self.coordinates.as_ref()
    }

    pub fn renderer(&self) -> &ViewRenderer<S::Layer> {
        &self.renderer
    }

    pub fn config(&self) -> &MapConfig {
        &self.config
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn page(&self) -> &P {
        &self.page
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MessageKind;
    use crate::bounds::Bounds;
    use crate::config::TileLayerConfig;
    use crate::headless::{HeadlessMap, HeadlessPage, LayerId};
    use crate::heatmap::HeatmapOptions;
    use crate::Coordinate;
    use futures::future::{self, FutureExt, LocalBoxFuture};
    use std::cell::Cell;

    struct FakeFetcher {
        reply: Result<HttpReply, LoadError>,
        calls: Cell<usize>,
    }

    impl FakeFetcher {
        fn json(status: u16, body: &str) -> Self {
            Self {
                reply: Ok(HttpReply::new(status, body.as_bytes().to_vec())),
                calls: Cell::new(0),
            }
        }

        fn failing(e: LoadError) -> Self {
            Self { reply: Err(e), calls: Cell::new(0) }
        }

        fn calls(&self) -> usize {
            self.calls.get()
        }
    }

    impl CoordinateFetcher for FakeFetcher {
        fn fetch<'a>(&'a self, _url: &'a str) -> LocalBoxFuture<'a, Result<HttpReply, LoadError>> {
            self.calls.set(self.calls.get() + 1);
            future::ready(self.reply.clone()).boxed_local()
        }
    }

    type Widget = SalesMap<HeadlessMap, HeadlessPage>;

    /// Headless map whose bounds and viewport calls can be made to fail.
    struct FlakyMap {
        inner: HeadlessMap,
        hide_layer_bounds: bool,
        fail_fit: bool,
        /// 1-based `set_view` call that errors
        fail_view_call: Option<u32>,
        view_calls: u32,
    }

    impl FlakyMap {
        fn new(cfg: &MapConfig) -> Self {
            Self {
                inner: HeadlessMap::new(cfg.center, cfg.initial_zoom),
                hide_layer_bounds: false,
                fail_fit: false,
                fail_view_call: None,
                view_calls: 0,
            }
        }
    }

    impl MapSurface for FlakyMap {
        type Layer = LayerId;

        fn set_view(&mut self, center: Coordinate, zoom: u8) -> Result<(), RenderError> {
            self.view_calls += 1;
            if self.fail_view_call == Some(self.view_calls) {
                return Err(RenderError::Backend("setView failed".into()));
            }
            self.inner.set_view(center, zoom)
        }

        fn add_base_layer(&mut self, tiles: &TileLayerConfig) -> Result<(), RenderError> {
            self.inner.add_base_layer(tiles)
        }

        fn pin_layer(&mut self, markers: &[Coordinate]) -> Result<LayerId, RenderError> {
            self.inner.pin_layer(markers)
        }

        fn heat_layer(&mut self, points: &CoordinateSet, options: &HeatmapOptions) -> Result<LayerId, RenderError> {
            self.inner.heat_layer(points, options)
        }

        fn attach(&mut self, layer: &LayerId) -> Result<(), RenderError> {
            self.inner.attach(layer)
        }

        fn detach(&mut self, layer: &LayerId) {
            self.inner.detach(layer)
        }

        fn is_attached(&self, layer: &LayerId) -> bool {
            self.inner.is_attached(layer)
        }

        fn layer_bounds(&self, layer: &LayerId) -> Option<Bounds> {
            if self.hide_layer_bounds {
                return None;
            }
            self.inner.layer_bounds(layer)
        }

        fn fit_bounds(&mut self, bounds: &Bounds, padding: u32) -> Result<(), RenderError> {
            if self.fail_fit {
                return Err(RenderError::Backend("fitBounds failed".into()));
            }
            self.inner.fit_bounds(bounds, padding)
        }
    }

    async fn load_flaky(body: &str, setup: impl FnOnce(&mut FlakyMap)) -> SalesMap<FlakyMap, HeadlessPage> {
        let fetcher = FakeFetcher::json(200, body);
        SalesMap::start(
            config(),
            HeadlessPage::new(true, true),
            |cfg| {
                let mut map = FlakyMap::new(cfg);
                setup(&mut map);
                Ok(map)
            },
            &fetcher,
        )
        .await
        .unwrap()
    }

    fn config() -> MapConfig {
        MapConfig::default().with_data_url("/control/event/demo/sales-map/data/")
    }

    fn headless(_cfg: &MapConfig) -> Result<HeadlessMap, RenderError> {
        Ok(HeadlessMap::new(Coordinate::new(0.0, 0.0), 0))
    }

    fn mount(cfg: MapConfig, page: HeadlessPage) -> Widget {
        SalesMap::mount(cfg, page, headless).unwrap()
    }

    async fn loaded(body: &str) -> Widget {
        let _ = env_logger::builder().is_test(true).try_init();
        let fetcher = FakeFetcher::json(200, body);
        SalesMap::start(config(), HeadlessPage::new(true, true), headless, &fetcher)
            .await
            .unwrap()
    }

    fn error_text(widget: &Widget) -> String {
        let message = widget.page().message().unwrap();
        assert_eq!(message.kind, MessageKind::Error);
        message.text.clone()
    }

    #[test]
    fn test_mount_sets_initial_view() {
        let widget = mount(config(), HeadlessPage::new(true, true));
        assert_eq!(widget.surface().center(), Coordinate::new(48.85, 2.35));
        assert_eq!(widget.surface().zoom(), 5);
        assert!(widget.surface().base_layer().is_some());
        assert_eq!(widget.page().toggle_label(), Some("Switch to Heatmap View"));
        assert_eq!(widget.status(), &LoadStatus::NotStarted);
    }

    #[tokio::test]
    async fn test_missing_container_aborts_before_fetch() {
        let fetcher = FakeFetcher::json(200, r#"{"coordinates": [[1.0, 2.0]]}"#);
        let result = Widget::start(config(), HeadlessPage::new(false, true), headless, &fetcher).await;

        assert!(matches!(result, Err(MountError::MissingContainer(ref id)) if id == "sales-map-container"));
        assert_eq!(fetcher.calls(), 0);
    }

    #[tokio::test]
    async fn test_map_init_failure_shown_inline() {
        let fetcher = FakeFetcher::json(200, "{}");
        let result = Widget::start(
            config(),
            HeadlessPage::new(true, true),
            |_| Err(RenderError::Backend("L is not defined".into())),
            &fetcher,
        )
        .await;

        assert!(matches!(result, Err(MountError::MapInit(_))));
        assert_eq!(fetcher.calls(), 0);
    }

    #[tokio::test]
    async fn test_missing_data_url_is_configuration_error() {
        let fetcher = FakeFetcher::json(200, "{}");
        let widget = Widget::start(MapConfig::default(), HeadlessPage::new(true, true), headless, &fetcher)
            .await
            .unwrap();

        assert_eq!(fetcher.calls(), 0);
        assert_eq!(widget.status(), &LoadStatus::Failed(LoadError::MissingDataUrl));
        assert!(error_text(&widget).contains("not configured"));
    }

    #[tokio::test]
    async fn test_upstream_error_shown_once() {
        let fetcher = FakeFetcher::json(200, r#"{"error": "geocoding failed"}"#);
        let mut widget = Widget::start(config(), HeadlessPage::new(true, true), headless, &fetcher)
            .await
            .unwrap();

        assert!(error_text(&widget).contains("geocoding failed"));
        assert!(widget.page().content_replaced());
        assert_eq!(fetcher.calls(), 1);

        widget.load(&fetcher).await;
        assert_eq!(fetcher.calls(), 1);
        assert!(widget.surface().attached_layers().is_empty());
    }

    #[tokio::test]
    async fn test_failed_status_is_transport_error() {
        let fetcher = FakeFetcher::json(500, r#"{"error": "Could not retrieve coordinate data."}"#);
        let widget = Widget::start(config(), HeadlessPage::new(true, true), headless, &fetcher)
            .await
            .unwrap();

        match widget.status() {
            LoadStatus::Failed(e) => assert_eq!(e.kind(), crate::ErrorKind::Transport),
            other => panic!("unexpected status {:?}", other),
        }
        let text = error_text(&widget);
        assert!(text.contains("HTTP 500"));
        assert!(text.contains("Could not retrieve coordinate data."));
    }

    #[tokio::test]
    async fn test_network_failure() {
        let fetcher = FakeFetcher::failing(LoadError::Request("connection refused".into()));
        let widget = Widget::start(config(), HeadlessPage::new(true, true), headless, &fetcher)
            .await
            .unwrap();

        assert!(error_text(&widget).contains("connection refused"));
        assert_eq!(fetcher.calls(), 1);
    }

    #[tokio::test]
    async fn test_empty_result_disables_toggle() {
        let widget = loaded(r#"{"coordinates": []}"#).await;

        assert_eq!(widget.status(), &LoadStatus::Empty);
        assert!(widget.page().toggle_disabled());
        assert!(widget.surface().attached_layers().is_empty());
        assert!(widget.renderer().pin_layer().is_none());

        let message = widget.page().message().unwrap();
        assert_eq!(message.kind, MessageKind::Info);
        assert!(!widget.page().content_replaced());
    }

    #[tokio::test]
    async fn test_loaded_shows_pins() {
        let widget = loaded(r#"{"coordinates": [[48.8566, 2.3522], ["45.76", "4.83"], ["x", 1.0]]}"#).await;

        assert_eq!(widget.status(), &LoadStatus::Loaded { entries: 3, markers: 2 });
        assert!(widget.page().message().is_none());

        let pins = widget.renderer().pin_layer().unwrap();
        assert_eq!(widget.surface().attached_layers(), &[*pins]);
        assert_eq!(widget.surface().cluster_group(pins).unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_single_point_centers_at_fallback_zoom() {
        let widget = loaded(r#"{"coordinates": [[45.764, 4.8357]]}"#).await;

        assert_eq!(widget.surface().center(), Coordinate::new(45.764, 4.8357));
        assert_eq!(widget.surface().zoom(), 13);
    }

    #[tokio::test]
    async fn test_bounds_fitted_around_points() {
        let widget = loaded(r#"{"coordinates": [[50.6, -1.5], [43.3, 7.7], [47.0, 2.0]]}"#).await;

        let center = widget.surface().center();
        assert_eq!(widget.surface().zoom(), 6);
        assert!((center.latitude - 46.95).abs() < 1e-9);
        assert!((center.longitude - 3.1).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_toggle_round_trip() {
        let mut widget = loaded(r#"{"coordinates": [[48.85, 2.35], [45.76, 4.83]]}"#).await;
        let initial = widget.surface().attached_layers().to_vec();

        assert_eq!(widget.on_toggle(), ViewMode::Heatmap);
        assert_eq!(widget.page().toggle_label(), Some("Switch to Pin View"));
        let heat = widget.renderer().heat_layer().unwrap();
        assert_eq!(widget.surface().attached_layers(), &[*heat]);

        assert_eq!(widget.on_toggle(), ViewMode::Pins);
        assert_eq!(widget.page().toggle_label(), Some("Switch to Heatmap View"));
        assert_eq!(widget.surface().attached_layers(), initial.as_slice());
    }

    #[test]
    fn test_missing_toggle_keeps_view_fixed() {
        let mut widget = mount(config(), HeadlessPage::new(true, false));
        assert!(!widget.has_toggle());
        assert_eq!(widget.on_toggle(), ViewMode::Pins);
        assert_eq!(widget.view_mode(), ViewMode::Pins);
    }

    #[test]
    fn test_toggle_while_loading_is_harmless() {
        let mut widget = mount(config(), HeadlessPage::new(true, true));
        let url = widget.begin_load().unwrap();
        assert_eq!(url, "/control/event/demo/sales-map/data/");
        assert_eq!(widget.page().message().unwrap().kind, MessageKind::Loading);

        assert_eq!(widget.on_toggle(), ViewMode::Heatmap);
        assert!(widget.surface().attached_layers().is_empty());

        let body = br#"{"coordinates": [[48.85, 2.35], [45.76, 4.83]]}"#;
        widget.finish_load(Ok(HttpReply::ok(body.to_vec())));

        let heat = widget.renderer().heat_layer().unwrap();
        assert_eq!(widget.surface().attached_layers(), &[*heat]);
    }

    #[test]
    fn test_finish_without_begin_is_ignored() {
        let mut widget = mount(config(), HeadlessPage::new(true, true));
        let status = widget.finish_load(Ok(HttpReply::ok(b"{}".to_vec())));
        assert_eq!(status, LoadStatus::NotStarted);
    }

    #[tokio::test]
    async fn test_heatmap_failure_degrades_to_pins() {
        let _ = env_logger::builder().is_test(true).try_init();
        let mut cfg = config();
        cfg.heatmap = HeatmapOptions { radius: -1.0, ..Default::default() };
        let fetcher = FakeFetcher::json(200, r#"{"coordinates": [[48.85, 2.35], [45.76, 4.83]]}"#);
        let mut widget = Widget::start(cfg, HeadlessPage::new(true, true), headless, &fetcher)
            .await
            .unwrap();

        assert!(widget.renderer().heat_layer().is_none());
        assert_eq!(widget.surface().attached_layers().len(), 1);

        widget.on_toggle();
        assert!(widget.surface().attached_layers().is_empty());
        widget.on_toggle();
        assert_eq!(widget.surface().attached_layers().len(), 1);
    }

    #[tokio::test]
    async fn test_default_heatmap_view() {
        let mut cfg = config();
        cfg.default_view = ViewMode::Heatmap;
        let fetcher = FakeFetcher::json(200, r#"{"coordinates": [[48.85, 2.35], [45.76, 4.83]]}"#);
        let widget = Widget::start(cfg, HeadlessPage::new(true, true), headless, &fetcher)
            .await
            .unwrap();

        assert_eq!(widget.page().toggle_label(), Some("Switch to Pin View"));
        let heat = widget.renderer().heat_layer().unwrap();
        assert_eq!(widget.surface().attached_layers(), &[*heat]);
    }

    #[tokio::test]
    async fn test_instances_are_independent() {
        let mut first = loaded(r#"{"coordinates": [[48.85, 2.35], [45.76, 4.83]]}"#).await;
        let second = loaded(r#"{"coordinates": [[51.5, -0.12]]}"#).await;

        first.on_toggle();
        assert_eq!(first.view_mode(), ViewMode::Heatmap);
        assert_eq!(second.view_mode(), ViewMode::Pins);
        assert_eq!(second.coordinates().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_bounds_fall_back_to_raw_coordinates() {
        let widget = load_flaky(r#"{"coordinates": [[50.6, -1.5], [43.3, 7.7], [47.0, 2.0]]}"#, |m| {
            m.hide_layer_bounds = true
        })
        .await;

        let center = widget.surface().inner.center();
        assert_eq!(widget.surface().inner.zoom(), 6);
        assert!((center.latitude - 46.95).abs() < 1e-9);
        assert!((center.longitude - 3.1).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_failed_fit_keeps_prior_viewport() {
        let widget = load_flaky(r#"{"coordinates": [[50.6, -1.5], [43.3, 7.7]]}"#, |m| m.fail_fit = true).await;

        assert!(matches!(widget.status(), LoadStatus::Loaded { markers: 2, .. }));
        assert_eq!(widget.surface().inner.center(), Coordinate::new(48.85, 2.35));
        assert_eq!(widget.surface().inner.zoom(), 5);
    }

    #[tokio::test]
    async fn test_single_point_retries_centering_after_error() {
        // Call 1 is the initial view at mount, call 2 the first centering
        let widget = load_flaky(r#"{"coordinates": [[45.764, 4.8357]]}"#, |m| m.fail_view_call = Some(2)).await;

        assert_eq!(widget.surface().view_calls, 3);
        assert_eq!(widget.surface().inner.center(), Coordinate::new(45.764, 4.8357));
        assert_eq!(widget.surface().inner.zoom(), 13);
    }

    #[tokio::test]
    async fn test_overflowing_value_drops_only_that_point() {
        let widget = loaded(r#"{"coordinates": [[1e400, 2.0], [48.85, 2.35]]}"#).await;

        assert_eq!(widget.status(), &LoadStatus::Loaded { entries: 2, markers: 1 });
        assert!(widget.page().message().is_none());
    }

    #[tokio::test]
    async fn test_invalidate_size_reaches_surface() {
        let mut widget = loaded(r#"{"coordinates": [[48.85, 2.35], [45.76, 4.83]]}"#).await;
        assert_eq!(widget.surface().size_invalidations(), 0);

        widget.invalidate_size();
        assert_eq!(widget.surface().size_invalidations(), 1);
    }
}
