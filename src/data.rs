use std::fs;
use std::path::{Path, PathBuf};

use crate::config::MapSource;
use crate::error::CartoError;
use crate::feature::NormalizedFeature;
use crate::normalize::normalize_str;

/// One loaded base map.
#[derive(Clone, Debug)]
pub struct BaseMap {
    pub label: String,
    pub features: Vec<NormalizedFeature>,
}

impl BaseMap {
    /// Country code of every feature, in feature order.
    pub fn codes(&self) -> Vec<&str> {
        self.features.iter().map(NormalizedFeature::code).collect()
    }
}

/// Loads base maps from a data directory.
pub struct DataCache {
    base: PathBuf,
}

impl DataCache {
    pub fn new<P: AsRef<Path>>(base: P) -> Self {
        Self { base: base.as_ref().to_path_buf() }
    }

    /// Reads and normalizes one map file, relative to the data directory.
    pub fn load_map(&self, file: &Path) -> Result<Vec<NormalizedFeature>, CartoError> {
        let path = self.base.join(file);
        let text = fs::read_to_string(&path)?;
        let features = normalize_str(&text, &path)?;
        log::info!("Loaded {} – {} polygons", path.display(), features.len());
        Ok(features)
    }

    /// Loads every source; any failure fails the whole set.
    pub fn load_all(&self, sources: &[MapSource]) -> Result<Vec<BaseMap>, CartoError> {
        sources
            .iter()
            .map(|source| {
                Ok(BaseMap {
                    label: source.label.clone(),
                    features: self.load_map(&source.file)?,
                })
            })
            .collect()
    }

    /// Like [`Self::load_all`], but a failure is logged and yields no maps.
    pub fn load_or_empty(&self, sources: &[MapSource]) -> Vec<BaseMap> {
        match self.load_all(sources) {
            Ok(maps) => maps,
            Err(e) => {
                log::error!("Could not load maps from {}: {e}", self.base.display());
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const WORLD: &str = r#"{"type":"FeatureCollection","features":[
        {"type":"Feature","properties":{"ADM0_A3":"USA"},
         "geometry":{"type":"Polygon","coordinates":[[[0,0],[1,0],[1,1],[0,0]]]}},
        {"type":"Feature","properties":{"ADM0_A3":"ATA"},
         "geometry":{"type":"Polygon","coordinates":[[[0,0],[1,0],[1,1],[0,0]]]}}
    ]}"#;

    fn sources() -> Vec<MapSource> {
        vec![MapSource::new("a.geojson", "A"), MapSource::new("b.geojson", "B")]
    }

    #[test]
    fn loads_every_map() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.geojson"), WORLD).unwrap();
        fs::write(dir.path().join("b.geojson"), WORLD).unwrap();

        let maps = DataCache::new(dir.path()).load_or_empty(&sources());
        assert_eq!(maps.len(), 2);
        assert_eq!(maps[1].label, "B");
        assert_eq!(maps[0].codes(), vec!["USA"]);
    }

    #[test]
    fn one_failure_loads_nothing() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.geojson"), WORLD).unwrap();

        let cache = DataCache::new(dir.path());
        assert!(matches!(cache.load_all(&sources()), Err(CartoError::Io(_))));
        assert!(cache.load_or_empty(&sources()).is_empty());
    }

    #[test]
    fn non_collection_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.geojson"), r#"{"type":"Point","coordinates":[0,0]}"#).unwrap();

        let err = DataCache::new(dir.path()).load_map(Path::new("a.geojson")).unwrap_err();
        assert!(matches!(err, CartoError::NotFeatureCollection { .. }));
    }
}
