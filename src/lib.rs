//! Cartogram viewer: normalizes country outlines, projects them into a
//! terminal viewport and morphs between base maps.

pub mod animation;
pub mod config;
pub mod data;
pub mod error;
pub mod export;
pub mod feature;
pub mod groups;
pub mod interpolate;
pub mod map_draw;
pub mod normalize;
pub mod path;
pub mod projection;
pub mod state;
pub mod stats;
pub mod style;
pub mod ui;

pub use error::CartoError;
