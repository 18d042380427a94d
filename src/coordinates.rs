//! Coordinate payloads from the sales map data endpoint.
//!
//! The endpoint answers `{"coordinates": [[lat, lon], ...]}` on success or
//! `{"error": "<message>"}` when it could not produce data. Values may arrive
//! as JSON numbers or as numeric strings (decimal columns are serialized as
//! strings). Entries are kept as received; [`RawCoordinate::parse`] decides
//! whether one can be rendered.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::LoadError;
use crate::Coordinate;

/// One `[lat, lon]` entry exactly as the endpoint sent it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RawCoordinate {
    pub latitude: Value,
    pub longitude: Value,
}

impl RawCoordinate {
    pub fn new(latitude: impl Into<Value>, longitude: impl Into<Value>) -> Self {
        Self {
            latitude: latitude.into(),
            longitude: longitude.into(),
        }
    }

    /// Parse both components. `None` unless both are finite numbers.
    pub fn parse(&self) -> Option<Coordinate> {
        let c = Coordinate::new(parse_component(&self.latitude)?, parse_component(&self.longitude)?);
        c.is_finite().then_some(c)
    }
}

fn parse_component(value: &Value) -> Option<f64> {
    match value {
        // Literal text, so an overflowing value becomes inf instead of failing
        Value::Number(n) => n.to_string().parse::<f64>().ok(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

impl<'de> Deserialize<'de> for RawCoordinate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // Anything that is not a two-element array still deserializes; it just
        // never parses.
        let value = Value::deserialize(deserializer)?;
        let (latitude, longitude) = match value {
            Value::Array(mut items) if items.len() == 2 => {
                let lon = items.swap_remove(1);
                let lat = items.swap_remove(0);
                (lat, lon)
            }
            _ => (Value::Null, Value::Null),
        };
        Ok(Self { latitude, longitude })
    }
}

impl From<Coordinate> for RawCoordinate {
    fn from(c: Coordinate) -> Self {
        Self::new(c.latitude, c.longitude)
    }
}

/// The ordered coordinate entries fetched for one page view.
///
/// Immutable once built. Empty is a valid state meaning no tickets were
/// geocoded.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CoordinateSet {
    entries: Vec<RawCoordinate>,
}

impl CoordinateSet {
    pub fn new(entries: Vec<RawCoordinate>) -> Self {
        Self { entries }
    }

    pub fn from_coordinates(coords: &[Coordinate]) -> Self {
        Self::new(coords.iter().copied().map(RawCoordinate::from).collect())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries as received, including ones that do not parse.
    pub fn entries(&self) -> &[RawCoordinate] {
        &self.entries
    }

    /// Entries whose latitude and longitude are both finite, in order.
    pub fn valid(&self) -> impl Iterator<Item = Coordinate> + '_ {
        self.entries.iter().filter_map(RawCoordinate::parse)
    }

    pub fn valid_points(&self) -> Vec<Coordinate> {
        self.valid().collect()
    }
}

/// Body of the data endpoint response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SalesMapResponse {
    #[serde(default)]
    pub coordinates: Option<Vec<RawCoordinate>>,
    #[serde(default)]
    pub error: Option<Value>,
}

impl SalesMapResponse {
    pub fn from_slice(body: &[u8]) -> Result<Self, LoadError> {
        Ok(serde_json::from_slice(body)?)
    }

    /// The error message the backend reported, if any.
    ///
    /// Empty strings, `false`, `0` and `null` do not count as errors.
    pub fn error_message(&self) -> Option<String> {
        match self.error.as_ref()? {
            Value::Null | Value::Bool(false) => None,
            Value::String(s) if s.is_empty() => None,
            Value::String(s) => Some(s.clone()),
            Value::Number(n) if n.as_f64() == Some(0.0) => None,
            other => Some(other.to_string()),
        }
    }

    /// Classify the payload: upstream error, or the (possibly empty) set.
    pub fn into_coordinate_set(self) -> Result<CoordinateSet, LoadError> {
        if let Some(message) = self.error_message() {
            return Err(LoadError::Upstream(message));
        }
        Ok(CoordinateSet::new(self.coordinates.unwrap_or_default()))
    }
}
