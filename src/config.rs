//! Configuration of the viewer.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::CartoError;
use crate::interpolate::{DEFAULT_MAX_SEGMENT_LENGTH, Pairing};
use crate::projection::ProjectionKind;
use crate::style::ColorScale;

/// Name of the configuration file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "cartomorph.toml";

//------------ Config --------------------------------------------------------

/// The viewer configuration. Every field has a default.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Directory the map files are read from.
    pub data_dir: PathBuf,

    /// Base maps, in toggle order.
    pub maps: Vec<MapSource>,

    pub projection: ProjectionKind,

    /// Fraction of the viewport kept free on every side.
    pub inset: f64,

    /// How the viewer moves between maps.
    pub transition: Transition,

    /// How outlines are paired in a morph.
    pub pairing: Pairing,

    pub morph_duration_ms: u64,
    pub wipe_duration_ms: u64,

    /// Edges longer than this are bisected before morphing, in pixels.
    pub max_segment_length: f64,

    /// Minimum and maximum zoom factor.
    pub zoom_extent: [f64; 2],

    pub scale: ColorScale,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            maps: vec![
                MapSource::new("world_def.geojson", "Voir le planisphère"),
                MapSource::new("Cartogram_m.geojson", "Voir le monde selon la presse française"),
            ],
            projection: ProjectionKind::default(),
            inset: 0.05,
            transition: Transition::default(),
            pairing: Pairing::default(),
            morph_duration_ms: 1000,
            wipe_duration_ms: 1200,
            max_segment_length: DEFAULT_MAX_SEGMENT_LENGTH,
            zoom_extent: [1.0, 12.0],
            scale: ColorScale::default(),
        }
    }
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CartoError> {
        let data = fs::read_to_string(path.as_ref())?;
        let mut config: Self = toml::from_str(&data)?;
        if let Some(base_dir) = path.as_ref().parent() {
            config.prepare(base_dir);
        }
        Ok(config)
    }

    /// Loads `path` if given, else the default file if present, else defaults.
    pub fn discover(path: Option<&Path>) -> Result<Self, CartoError> {
        match path {
            Some(path) => Self::load(path),
            None if Path::new(DEFAULT_CONFIG_FILE).is_file() => Self::load(DEFAULT_CONFIG_FILE),
            None => Ok(Self::default()),
        }
    }

    /// Resolves relative paths against the config file's directory and
    /// replaces unusable values with defaults.
    pub fn prepare(&mut self, base_dir: &Path) {
        if self.data_dir.is_relative() {
            self.data_dir = base_dir.join(&self.data_dir);
        }
        let defaults = Self::default();
        if !(self.inset.is_finite() && (0.0..0.5).contains(&self.inset)) {
            log::warn!("Ignoring inset {}, using {}", self.inset, defaults.inset);
            self.inset = defaults.inset;
        }
        if !(self.max_segment_length.is_finite() && self.max_segment_length > 0.0) {
            log::warn!("Ignoring max_segment_length {}", self.max_segment_length);
            self.max_segment_length = defaults.max_segment_length;
        }
        let [lo, hi] = self.zoom_extent;
        if !(lo.is_finite() && hi.is_finite() && 0.0 < lo && lo <= hi) {
            log::warn!("Ignoring zoom_extent {:?}", self.zoom_extent);
            self.zoom_extent = defaults.zoom_extent;
        }
        if !self.scale.is_valid() {
            log::warn!("Ignoring color scale: needs ascending thresholds and one more color than thresholds");
            self.scale = defaults.scale;
        }
    }
}

//------------ MapSource -----------------------------------------------------

/// One base map: a GeoJSON file and the label of the toggle leading to it.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct MapSource {
    pub file: PathBuf,
    pub label: String,
}

impl MapSource {
    pub fn new(file: impl Into<PathBuf>, label: impl Into<String>) -> Self {
        Self { file: file.into(), label: label.into() }
    }
}

//------------ Transition ----------------------------------------------------

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Transition {
    /// A divider sweeps across, revealing the other map.
    #[default]
    Wipe,
    /// Outlines deform into the other map's outlines.
    Morph,
}
