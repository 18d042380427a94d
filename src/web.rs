//! Leaflet/DOM backend and the JavaScript entry point.
//!
//! The page loads Leaflet, `leaflet.markercluster` and `leaflet.heat` before
//! the wasm bundle, then calls `mountSalesMap()` (optionally with a JSON
//! [`MapConfig`]). Each call binds an independent widget to the configured
//! container.

use std::cell::RefCell;
use std::rc::Rc;

use js_sys::{Array, Object, Reflect};
use log::{debug, error, warn, Level, LevelFilter, Log, Metadata, Record};
use serde_json::Value;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;
use web_sys::{console, Document, Element, HtmlButtonElement, HtmlElement};

use crate::backend::{MapSurface, MessageKind, PageElements, PageMessage};
use crate::bounds::Bounds;
use crate::config::{MapConfig, TileLayerConfig};
use crate::coordinates::CoordinateSet;
use crate::error::{LoadError, RenderError};
use crate::fetch::{CoordinateFetcher, HttpFetcher};
use crate::heatmap::HeatmapOptions;
use crate::widget::{LoadStatus, SalesMap};
use crate::Coordinate;

// ============================================================================
// Leaflet Bindings
// ============================================================================

#[wasm_bindgen]
extern "C" {
    /// `L.Map`
    #[derive(Debug, Clone)]
    pub type LeafletMap;

    /// Any `L.Layer`: tiles, markers, cluster groups, heat layers.
    #[derive(Debug, Clone)]
    pub type LeafletLayer;

    /// `L.LatLngBounds`
    #[derive(Debug, Clone)]
    pub type LatLngBounds;

    #[wasm_bindgen(catch, js_namespace = L, js_name = map)]
    fn leaflet_map(container_id: &str) -> Result<LeafletMap, JsValue>;

    #[wasm_bindgen(catch, method, js_name = setView)]
    fn set_view(this: &LeafletMap, center: &Array, zoom: f64) -> Result<LeafletMap, JsValue>;

    #[wasm_bindgen(catch, method, js_name = addLayer)]
    fn add_layer(this: &LeafletMap, layer: &LeafletLayer) -> Result<LeafletMap, JsValue>;

    #[wasm_bindgen(method, js_name = removeLayer)]
    fn remove_layer(this: &LeafletMap, layer: &LeafletLayer) -> LeafletMap;

    #[wasm_bindgen(method, js_name = hasLayer)]
    fn has_layer(this: &LeafletMap, layer: &LeafletLayer) -> bool;

    #[wasm_bindgen(catch, method, js_name = fitBounds)]
    fn fit_bounds(this: &LeafletMap, bounds: &Array, options: &Object) -> Result<LeafletMap, JsValue>;

    #[wasm_bindgen(method, js_name = invalidateSize)]
    fn invalidate_size(this: &LeafletMap) -> LeafletMap;

    #[wasm_bindgen(catch, js_namespace = L, js_name = tileLayer)]
    fn tile_layer(url_template: &str, options: &Object) -> Result<LeafletLayer, JsValue>;

    #[wasm_bindgen(catch, js_namespace = L, js_name = markerClusterGroup)]
    fn marker_cluster_group() -> Result<LeafletLayer, JsValue>;

    #[wasm_bindgen(catch, js_namespace = L, js_name = marker)]
    fn marker(lat_lng: &Array) -> Result<LeafletLayer, JsValue>;

    #[wasm_bindgen(catch, js_namespace = L, js_name = heatLayer)]
    fn heat_layer(points: &Array, options: &Object) -> Result<LeafletLayer, JsValue>;

    #[wasm_bindgen(method, js_name = addLayer)]
    fn add_child(this: &LeafletLayer, child: &LeafletLayer) -> LeafletLayer;

    #[wasm_bindgen(catch, method, js_name = getBounds)]
    fn get_bounds(this: &LeafletLayer) -> Result<LatLngBounds, JsValue>;

    #[wasm_bindgen(method, js_name = isValid)]
    fn is_valid(this: &LatLngBounds) -> bool;

    #[wasm_bindgen(method, js_name = getSouth)]
    fn south(this: &LatLngBounds) -> f64;

    #[wasm_bindgen(method, js_name = getNorth)]
    fn north(this: &LatLngBounds) -> f64;

    #[wasm_bindgen(method, js_name = getWest)]
    fn west(this: &LatLngBounds) -> f64;

    #[wasm_bindgen(method, js_name = getEast)]
    fn east(this: &LatLngBounds) -> f64;
}

fn js_error(value: JsValue) -> RenderError {
    let message = value
        .as_string()
        .or_else(|| Reflect::get(&value, &"message".into()).ok().and_then(|m| m.as_string()))
        .unwrap_or_else(|| format!("{:?}", value));
    RenderError::Backend(message)
}

fn lat_lng(c: Coordinate) -> Array {
    Array::of2(&c.latitude.into(), &c.longitude.into())
}

/// Pass a payload value through unchanged: numbers and strings as-is,
/// everything else as `null`.
fn json_to_js(value: &Value) -> JsValue {
    match value {
        Value::Number(n) => n.as_f64().map(JsValue::from).unwrap_or(JsValue::NULL),
        Value::String(s) => JsValue::from_str(s),
        _ => JsValue::NULL,
    }
}

fn set_prop(target: &Object, key: &str, value: JsValue) -> Result<(), RenderError> {
    Reflect::set(target, &key.into(), &value).map(|_| ()).map_err(js_error)
}

/// `L.Icon.Default.imagePath = path`
fn set_marker_image_path(path: &str) -> Result<(), RenderError> {
    let mut target: JsValue = js_sys::global().into();
    for key in ["L", "Icon", "Default"] {
        target = Reflect::get(&target, &key.into()).map_err(js_error)?;
        if target.is_undefined() || target.is_null() {
            return Err(RenderError::Backend(format!("Leaflet object {} is missing", key)));
        }
    }
    Reflect::set(&target, &"imagePath".into(), &path.into()).map_err(js_error)?;
    Ok(())
}

// ============================================================================
// Map Surface
// ============================================================================

/// Leaflet map living in the widget's container.
pub struct WebMap {
    map: LeafletMap,
}

impl WebMap {
    /// Create the Leaflet map in `config.container_id`.
    pub fn create(config: &MapConfig) -> Result<Self, RenderError> {
        if let Some(path) = &config.marker_image_path {
            if let Err(e) = set_marker_image_path(path) {
                warn!("[Leaflet] Could not set marker image path: {}", e);
            }
        }
        let map = leaflet_map(&config.container_id).map_err(js_error)?;
        Ok(Self { map })
    }
}

impl MapSurface for WebMap {
    type Layer = LeafletLayer;

    fn set_view(&mut self, center: Coordinate, zoom: u8) -> Result<(), RenderError> {
        self.map
            .set_view(&lat_lng(center), zoom as f64)
            .map(|_| ())
            .map_err(js_error)
    }

    fn add_base_layer(&mut self, tiles: &TileLayerConfig) -> Result<(), RenderError> {
        let options = Object::new();
        set_prop(&options, "attribution", tiles.attribution.as_str().into())?;
        set_prop(&options, "maxZoom", (tiles.max_zoom as f64).into())?;
        let layer = tile_layer(&tiles.url_template, &options).map_err(js_error)?;
        self.map.add_layer(&layer).map(|_| ()).map_err(js_error)
    }

    fn pin_layer(&mut self, markers: &[Coordinate]) -> Result<LeafletLayer, RenderError> {
        let group = marker_cluster_group().map_err(js_error)?;
        for m in markers {
            match marker(&lat_lng(*m)) {
                Ok(pin) => {
                    group.add_child(&pin);
                }
                Err(e) => debug!("[Leaflet] Skipping marker {:?}: {}", m, js_error(e)),
            }
        }
        Ok(group)
    }

    fn heat_layer(&mut self, points: &CoordinateSet, options: &HeatmapOptions) -> Result<LeafletLayer, RenderError> {
        options.validate()?;

        let data: Array = points
            .entries()
            .iter()
            .map(|raw| Array::of2(&json_to_js(&raw.latitude), &json_to_js(&raw.longitude)))
            .collect();

        let js_options = Object::new();
        set_prop(&js_options, "radius", options.radius.into())?;
        set_prop(&js_options, "blur", options.blur.into())?;
        set_prop(&js_options, "maxZoom", (options.max_zoom as f64).into())?;
        set_prop(&js_options, "max", options.max.into())?;
        set_prop(&js_options, "minOpacity", options.min_opacity.into())?;

        heat_layer(&data, &js_options).map_err(js_error)
    }

    fn attach(&mut self, layer: &LeafletLayer) -> Result<(), RenderError> {
        self.map.add_layer(layer).map(|_| ()).map_err(js_error)
    }

    fn detach(&mut self, layer: &LeafletLayer) {
        self.map.remove_layer(layer);
    }

    fn is_attached(&self, layer: &LeafletLayer) -> bool {
        self.map.has_layer(layer)
    }

    fn layer_bounds(&self, layer: &LeafletLayer) -> Option<Bounds> {
        // Heat layers have no getBounds
        if !Reflect::has(layer, &"getBounds".into()).unwrap_or(false) {
            return None;
        }
        let b = layer.get_bounds().ok()?;
        if !b.is_valid() {
            return None;
        }
        Some(Bounds {
            min_lat: b.south(),
            max_lat: b.north(),
            min_lng: b.west(),
            max_lng: b.east(),
        })
    }

    fn fit_bounds(&mut self, bounds: &Bounds, padding: u32) -> Result<(), RenderError> {
        let corners = Array::of2(
            &lat_lng(Coordinate::new(bounds.min_lat, bounds.min_lng)),
            &lat_lng(Coordinate::new(bounds.max_lat, bounds.max_lng)),
        );
        let options = Object::new();
        let pad = padding as f64;
        set_prop(&options, "padding", Array::of2(&pad.into(), &pad.into()).into())?;
        self.map.fit_bounds(&corners, &options).map(|_| ()).map_err(js_error)
    }

    fn invalidate_size(&mut self) {
        self.map.invalidate_size();
    }
}

// ============================================================================
// Page Elements
// ============================================================================

/// The container and toggle button found in the document.
pub struct DomPage {
    document: Document,
    container: Option<HtmlElement>,
    toggle: Option<HtmlButtonElement>,
    status: Option<Element>,
}

impl DomPage {
    pub fn find(document: &Document, config: &MapConfig) -> Self {
        let container = document
            .get_element_by_id(&config.container_id)
            .and_then(|e| e.dyn_into::<HtmlElement>().ok());
        let toggle = document
            .get_element_by_id(&config.toggle_id)
            .and_then(|e| e.dyn_into::<HtmlButtonElement>().ok());
        Self {
            document: document.clone(),
            container,
            toggle,
            status: None,
        }
    }

    pub fn toggle_button(&self) -> Option<&HtmlButtonElement> {
        self.toggle.as_ref()
    }

    fn paragraph(&self, class: &str, text: &str) -> Option<Element> {
        let p = match self.document.create_element("p") {
            Ok(p) => p,
            Err(e) => {
                warn!("[SalesMap] Could not create message element: {:?}", e);
                return None;
            }
        };
        p.set_class_name(class);
        p.set_text_content(Some(text));
        Some(p)
    }
}

impl PageElements for DomPage {
    fn has_container(&self) -> bool {
        self.container.is_some()
    }

    fn has_toggle(&self) -> bool {
        self.toggle.is_some()
    }

    fn show_message(&mut self, message: &PageMessage) {
        let Some(container) = self.container.clone() else {
            return;
        };

        let class = match message.kind {
            MessageKind::Error => {
                container.set_inner_html("");
                self.status = None;
                "text-danger"
            }
            MessageKind::Loading | MessageKind::Info => {
                self.clear_message();
                "text-muted"
            }
        };

        if let Some(p) = self.paragraph(class, &message.text) {
            if let Err(e) = container.append_child(&p) {
                warn!("[SalesMap] Could not show message: {:?}", e);
                return;
            }
            if message.kind != MessageKind::Error {
                self.status = Some(p);
            }
        }
    }

    fn clear_message(&mut self) {
        if let Some(p) = self.status.take() {
            p.remove();
        }
    }

    fn set_toggle_label(&mut self, label: &str) {
        if let Some(button) = &self.toggle {
            button.set_text_content(Some(label));
        }
    }

    fn set_toggle_disabled(&mut self, disabled: bool) {
        if let Some(button) = &self.toggle {
            button.set_disabled(disabled);
        }
    }
}

// ============================================================================
// Console Logging
// ============================================================================

struct ConsoleLogger;

impl Log for ConsoleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = JsValue::from_str(&record.args().to_string());
        match record.level() {
            Level::Error => console::error_1(&line),
            Level::Warn => console::warn_1(&line),
            Level::Info => console::info_1(&line),
            Level::Debug | Level::Trace => console::debug_1(&line),
        }
    }

    fn flush(&self) {}
}

static LOGGER: ConsoleLogger = ConsoleLogger;

pub(crate) fn init_console_logging() {
    console_error_panic_hook::set_once();
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(LevelFilter::Debug);
    }
}

// ============================================================================
// Entry Point
// ============================================================================

type WebWidget = SalesMap<WebMap, DomPage>;

/// Mount a sales map widget.
///
/// `config_json` is an optional JSON [`MapConfig`]; missing fields take their
/// defaults. Without a `data_url` the global `salesMapDataUrl` is used. While
/// the document is still loading, mounting waits for `DOMContentLoaded`.
#[wasm_bindgen(js_name = mountSalesMap)]
pub fn mount_sales_map(config_json: Option<String>) -> Result<(), JsValue> {
    init_console_logging();

    let mut config = match config_json {
        Some(json) => MapConfig::from_json(&json).map_err(|e| JsValue::from_str(&e.to_string()))?,
        None => MapConfig::default(),
    };
    if config.data_url.is_none() {
        config.data_url = global_data_url();
    }

    let document = document()?;
    if document.ready_state() == "loading" {
        debug!("[SalesMap] Document still loading, waiting for DOMContentLoaded");
        let deferred = Closure::once_into_js(move || {
            if let Err(e) = mount_now(config) {
                error!("[SalesMap] Mount failed: {:?}", e);
            }
        });
        document.add_event_listener_with_callback("DOMContentLoaded", deferred.unchecked_ref())?;
        return Ok(());
    }

    mount_now(config)
}

fn document() -> Result<Document, JsValue> {
    web_sys::window()
        .and_then(|w| w.document())
        .ok_or_else(|| JsValue::from_str("no document available"))
}

fn global_data_url() -> Option<String> {
    Reflect::get(&js_sys::global(), &"salesMapDataUrl".into())
        .ok()
        .and_then(|v| v.as_string())
}

fn mount_now(config: MapConfig) -> Result<(), JsValue> {
    let document = document()?;
    let page = DomPage::find(&document, &config);
    let widget = WebWidget::mount(config, page, WebMap::create).map_err(|e| JsValue::from_str(&e.to_string()))?;
    let widget = Rc::new(RefCell::new(widget));

    install_toggle_handler(&widget)?;
    spawn_local(load(widget));
    Ok(())
}

fn install_toggle_handler(widget: &Rc<RefCell<WebWidget>>) -> Result<(), JsValue> {
    let Some(button) = widget.borrow().page().toggle_button().cloned() else {
        return Ok(());
    };

    let target = Rc::clone(widget);
    let handler = Closure::<dyn FnMut()>::new(move || match target.try_borrow_mut() {
        Ok(mut w) => {
            w.on_toggle();
        }
        Err(_) => warn!("[SalesMap] Widget busy, ignoring toggle"),
    });
    button.add_event_listener_with_callback("click", handler.as_ref().unchecked_ref())?;
    // The button lives as long as the page
    handler.forget();
    Ok(())
}

async fn load(widget: Rc<RefCell<WebWidget>>) {
    let Some(url) = widget.borrow_mut().begin_load() else {
        return;
    };

    let reply = match resolve_url(&url) {
        Ok(absolute) => match HttpFetcher::new() {
            Ok(fetcher) => fetcher.fetch(&absolute).await,
            Err(e) => Err(e),
        },
        Err(e) => Err(e),
    };

    let status = widget.borrow_mut().finish_load(reply);
    if matches!(status, LoadStatus::Loaded { .. }) {
        let delay = widget.borrow().config().invalidate_delay_ms;
        schedule_invalidate(widget, delay);
    }
}

/// Resolve a page-relative data URL against the document location.
fn resolve_url(raw: &str) -> Result<String, LoadError> {
    let base = web_sys::window()
        .and_then(|w| w.location().href().ok())
        .ok_or_else(|| LoadError::Request("page location unavailable".to_string()))?;
    let base = url::Url::parse(&base).map_err(|e| LoadError::Request(format!("invalid page URL: {}", e)))?;
    let resolved = base
        .join(raw)
        .map_err(|e| LoadError::Request(format!("invalid data URL {}: {}", raw, e)))?;
    Ok(resolved.into())
}

fn schedule_invalidate(widget: Rc<RefCell<WebWidget>>, delay_ms: u32) {
    let Some(window) = web_sys::window() else {
        return;
    };
    let callback = Closure::once_into_js(move || {
        if let Ok(mut w) = widget.try_borrow_mut() {
            w.invalidate_size();
        }
    });
    if let Err(e) =
        window.set_timeout_with_callback_and_timeout_and_arguments_0(callback.unchecked_ref(), delay_ms as i32)
    {
        warn!("[Leaflet] Could not schedule size refresh: {:?}", e);
    }
}
