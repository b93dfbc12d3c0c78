use std::sync::Arc;

use geo::Polygon;
use geojson::JsonObject;
use serde_json::Value;

/// Property holding the ISO3 country code.
pub const CODE_KEY: &str = "ADM0_A3";
/// Property holding the current-period mention count.
pub const CURRENT_KEY: &str = "current";
/// Property holding the population estimate.
pub const POPULATION_KEY: &str = "POP_EST";
/// Property written with the stable index when a collection is exported.
pub const INDEX_KEY: &str = "_globalIndex";

/// The observing country; excluded from every statistic.
pub const OBSERVER_CODE: &str = "FRA";
/// Northern Cyprus placeholder code, excluded from totals.
pub const UNRECOGNIZED_CODE: &str = "NOM";

/// Read-only view over one country's GeoJSON properties.
///
/// Shared between every polygon split out of the same MultiPolygon.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CountryProperties {
    raw: JsonObject,
    code: String,
}

impl CountryProperties {
    pub fn new(raw: JsonObject) -> Self {
        let code = raw
            .get(CODE_KEY)
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_string();
        Self { raw, code }
    }

    /// ISO3 code, empty when missing.
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Localized display name.
    pub fn name(&self) -> Option<&str> {
        ["NAME_FR", "NAMEfr"]
            .iter()
            .filter_map(|k| self.raw.get(*k).and_then(Value::as_str))
            .find(|s| !s.is_empty())
    }

    /// Mentions in the current period; missing counts as zero.
    pub fn current(&self) -> f64 {
        self.number(CURRENT_KEY).unwrap_or(0.0)
    }

    pub fn population(&self) -> Option<f64> {
        self.number(POPULATION_KEY)
    }

    /// Numeric property, accepting numbers and numeric strings.
    pub fn number(&self, key: &str) -> Option<f64> {
        match self.raw.get(key)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
        .filter(|v: &f64| v.is_finite())
    }

    pub fn raw(&self) -> &JsonObject {
        &self.raw
    }
}

/// One Polygon-only feature produced by [`crate::normalize`].
#[derive(Clone, Debug)]
pub struct NormalizedFeature {
    pub polygon: Polygon<f64>,
    pub properties: Arc<CountryProperties>,
    pub stable_index: usize,
}

impl NormalizedFeature {
    pub fn code(&self) -> &str {
        self.properties.code()
    }

    /// Back to a GeoJSON feature, tagged with its own stable index.
    pub fn to_geojson(&self) -> geojson::Feature {
        let mut properties = self.properties.raw().clone();
        properties.insert(INDEX_KEY.to_string(), Value::from(self.stable_index));
        geojson::Feature {
            bbox: None,
            geometry: Some(geojson::Geometry::new(geojson::Value::from(&self.polygon))),
            id: None,
            properties: Some(properties),
            foreign_members: None,
        }
    }
}

#[cfg(test)]
pub(crate) fn props(value: serde_json::Value) -> CountryProperties {
    match value {
        Value::Object(map) => CountryProperties::new(map),
        _ => CountryProperties::default(),
    }
}
