//! Flattens a GeoJSON FeatureCollection into Polygon-only features with a
//! deterministic stable index.

use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use geo::{Coord, LineString, Polygon};
use geojson::{FeatureCollection, GeoJson, PolygonType, Value};

use crate::error::CartoError;
use crate::feature::{CountryProperties, NormalizedFeature};

/// Codes dropped before indexing.
pub const EXCLUDED_CODES: &[&str] = &["ATA"];

/// Normalizes a collection.
///
/// Features are stably sorted by ISO3 code (missing code sorts first), the
/// excluded codes are dropped, and every MultiPolygon is split into one
/// feature per polygon. All polygons of a country share one
/// [`CountryProperties`]; `stable_index` is the position in the output.
pub fn normalize(collection: &FeatureCollection) -> Vec<NormalizedFeature> {
    let mut entries: Vec<(Arc<CountryProperties>, &Value)> =
        Vec::with_capacity(collection.features.len());

    for feature in &collection.features {
        let properties = CountryProperties::new(feature.properties.clone().unwrap_or_default());
        let Some(geometry) = &feature.geometry else {
            log::warn!("Skipping feature {:?} without geometry", properties.code());
            continue;
        };
        entries.push((Arc::new(properties), &geometry.value));
    }

    entries.sort_by(|(a, _), (b, _)| a.code().cmp(b.code()));

    let mut out = Vec::new();
    for (properties, value) in entries {
        if EXCLUDED_CODES.contains(&properties.code()) {
            continue;
        }
        match value {
            Value::Polygon(rings) => out.push(polygon_from(rings, &properties)),
            Value::MultiPolygon(polygons) => {
                out.extend(polygons.iter().map(|rings| polygon_from(rings, &properties)));
            }
            other => log::warn!(
                "Skipping {} geometry for {:?}",
                geometry_kind(other),
                properties.code()
            ),
        }
    }

    for (index, feature) in out.iter_mut().enumerate() {
        feature.stable_index = index;
    }
    out
}

/// Parses and normalizes a GeoJSON FeatureCollection document.
pub fn normalize_str(text: &str, source: &Path) -> Result<Vec<NormalizedFeature>, CartoError> {
    match GeoJson::from_str(text)? {
        GeoJson::FeatureCollection(fc) => Ok(normalize(&fc)),
        _ => Err(CartoError::NotFeatureCollection { path: source.to_path_buf() }),
    }
}

fn geometry_kind(value: &Value) -> &'static str {
    match value {
        Value::Point(_) => "Point",
        Value::MultiPoint(_) => "MultiPoint",
        Value::LineString(_) => "LineString",
        Value::MultiLineString(_) => "MultiLineString",
        Value::Polygon(_) => "Polygon",
        Value::MultiPolygon(_) => "MultiPolygon",
        Value::GeometryCollection(_) => "GeometryCollection",
    }
}

fn polygon_from(rings: &PolygonType, properties: &Arc<CountryProperties>) -> NormalizedFeature {
    let mut rings = rings.iter().map(|ring| {
        LineString::new(
            ring.iter()
                .filter(|pos| pos.len() >= 2)
                .map(|pos| Coord { x: pos[0], y: pos[1] })
                .collect(),
        )
    });
    let exterior = rings.next().unwrap_or_else(|| LineString::new(Vec::new()));
    NormalizedFeature {
        polygon: Polygon::new(exterior, rings.collect()),
        properties: Arc::clone(properties),
        stable_index: 0,
    }
}
