use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading, transforming or exporting map data.
#[derive(Debug, Error)]
pub enum CartoError {
    /// Reading or writing a file failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A JSON document could not be (de)serialized.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A GeoJSON document was malformed.
    #[error("GeoJSON error: {0}")]
    GeoJson(#[from] geojson::Error),

    /// The configuration file was not valid TOML for [`crate::config::Config`].
    #[error("config error: {0}")]
    Config(#[from] toml::de::Error),

    /// CSV export failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A path-string could not be parsed.
    #[error("path parse error: {0}")]
    Path(#[from] kurbo::SvgParseError),

    /// The document was valid GeoJSON but not a FeatureCollection.
    #[error("{path}: expected a FeatureCollection")]
    NotFeatureCollection {
        /// Source of the offending document.
        path: PathBuf,
    },
}
