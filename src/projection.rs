//! Map projections fitted to a pixel viewport, and the feature-to-outline
//! path builder.

use std::f64::consts::FRAC_PI_2;
use std::fmt;

use geo::{Coord, MapCoords, Polygon};
use serde::{Deserialize, Serialize};

use crate::feature::NormalizedFeature;
use crate::path;

const MERCATOR_MAX_LAT: f64 = 85.0;

/// Projection families available for base maps.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ProjectionKind {
    #[default]
    Larrivee,
    Equirectangular,
    Mercator,
}

impl ProjectionKind {
    /// Raw projection of (λ, φ) in radians; y grows northwards.
    fn raw(self, lambda: f64, phi: f64) -> (f64, f64) {
        match self {
            Self::Larrivee => (
                lambda * (1.0 + phi.cos().max(0.0).sqrt()) / 2.0,
                phi / ((phi / 2.0).cos() * (lambda / 6.0).cos()),
            ),
            Self::Equirectangular => (lambda, phi),
            Self::Mercator => {
                let limit = MERCATOR_MAX_LAT.to_radians();
                let phi = phi.clamp(-limit, limit);
                (lambda, ((FRAC_PI_2 + phi) / 2.0).tan().ln())
            }
        }
    }
}

impl fmt::Display for ProjectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Larrivee => "larrivee",
            Self::Equirectangular => "equirectangular",
            Self::Mercator => "mercator",
        })
    }
}

/// Pixel viewport.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// The rectangle `[inset, 1 - inset]` of the viewport, as (min, max).
    pub fn inset_rect(&self, inset: f64) -> (Coord, Coord) {
        let inset = inset.clamp(0.0, 0.5);
        let (w, h) = (f64::from(self.width), f64::from(self.height));
        (
            Coord { x: w * inset, y: h * inset },
            Coord { x: w * (1.0 - inset), y: h * (1.0 - inset) },
        )
    }
}

/// A concrete projection: raw family, then uniform scale and translation
/// into screen space (y grows downwards).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Projection {
    kind: ProjectionKind,
    scale: f64,
    translate: Coord,
}

impl Projection {
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Projects a longitude/latitude pair in degrees to screen pixels.
    pub fn project(&self, lon: f64, lat: f64) -> Coord {
        let (x, y) = self.kind.raw(lon.to_radians(), lat.to_radians());
        Coord {
            x: self.translate.x + self.scale * x,
            y: self.translate.y - self.scale * y,
        }
    }

    /// Fits the projection so every vertex of `features` lands in the
    /// viewport's inset rectangle, centred on both axes.
    ///
    /// Input without any extent keeps unit scale and centres on the inset.
    pub fn fit_extent(kind: ProjectionKind, features: &[NormalizedFeature], viewport: Viewport, inset: f64) -> Self {
        let (min, max) = viewport.inset_rect(inset);
        let (w, h) = (max.x - min.x, max.y - min.y);

        let unit = Self { kind, scale: 1.0, translate: Coord { x: 0.0, y: 0.0 } };
        let bounds = features
            .iter()
            .flat_map(|f| polygon_coords(&f.polygon))
            .map(|c| unit.project(c.x, c.y))
            .filter(|c| c.x.is_finite() && c.y.is_finite())
            .fold(None, |acc: Option<(Coord, Coord)>, c| {
                Some(match acc {
                    None => (c, c),
                    Some((lo, hi)) => (
                        Coord { x: lo.x.min(c.x), y: lo.y.min(c.y) },
                        Coord { x: hi.x.max(c.x), y: hi.y.max(c.y) },
                    ),
                })
            });

        let Some((lo, hi)) = bounds else {
            return Self { kind, scale: 1.0, translate: Coord { x: min.x + w / 2.0, y: min.y + h / 2.0 } };
        };

        let (dx, dy) = (hi.x - lo.x, hi.y - lo.y);
        let scale = match (dx > 0.0, dy > 0.0) {
            (true, true) => (w / dx).min(h / dy),
            (true, false) => w / dx,
            (false, true) => h / dy,
            (false, false) => 1.0,
        };
        Self {
            kind,
            scale,
            translate: Coord {
                x: min.x + (w - scale * (hi.x + lo.x)) / 2.0,
                y: min.y + (h - scale * (hi.y + lo.y)) / 2.0,
            },
        }
    }
}

fn polygon_coords(polygon: &Polygon<f64>) -> impl Iterator<Item = Coord> + '_ {
    polygon
        .exterior()
        .0
        .iter()
        .chain(polygon.interiors().iter().flat_map(|r| r.0.iter()))
        .copied()
}

/// Builds rendered outlines for one normalized collection under one viewport.
#[derive(Clone, Debug)]
pub struct PathBuilder {
    projection: Projection,
}

impl PathBuilder {
    pub fn fit(kind: ProjectionKind, features: &[NormalizedFeature], viewport: Viewport, inset: f64) -> Self {
        Self { projection: Projection::fit_extent(kind, features, viewport, inset) }
    }

    pub fn projection(&self) -> &Projection {
        &self.projection
    }

    /// The feature's polygon in screen coordinates.
    pub fn outline(&self, feature: &NormalizedFeature) -> Polygon<f64> {
        let projection = &self.projection;
        feature.polygon.map_coords(|c| projection.project(c.x, c.y))
    }

    /// The feature's outline serialized as a path-string; empty for a
    /// polygon without vertices.
    pub fn path_string(&self, feature: &NormalizedFeature) -> String {
        path::polygon_to_path(&self.outline(feature))
    }

    /// Zero-footprint outline anchored at the projection of (0, 0).
    pub fn placeholder(&self) -> String {
        path::placeholder_outline(self.projection.project(0.0, 0.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::normalize_str;
    use std::path::Path;

    fn world() -> Vec<NormalizedFeature> {
        let text = r#"{"type":"FeatureCollection","features":[
            {"type":"Feature","properties":{"ADM0_A3":"AAA"},
             "geometry":{"type":"Polygon","coordinates":[[[-170,-50],[-120,-50],[-120,10],[-170,10],[-170,-50]]]}},
            {"type":"Feature","properties":{"ADM0_A3":"BBB"},
             "geometry":{"type":"MultiPolygon","coordinates":[
                [[[10,40],[60,40],[60,75],[10,75],[10,40]]],
                [[[100,-30],[150,-30],[150,-10],[100,-10],[100,-30]]]]}}
        ]}"#;
        normalize_str(text, Path::new("world.geojson")).unwrap()
    }

    fn assert_inside(polygon: &Polygon<f64>, viewport: Viewport, inset: f64) {
        let (min, max) = viewport.inset_rect(inset);
        let eps = 1e-6;
        for c in polygon_coords(polygon) {
            assert!(c.x >= min.x - eps && c.x <= max.x + eps, "x {} outside [{}, {}]", c.x, min.x, max.x);
            assert!(c.y >= min.y - eps && c.y <= max.y + eps, "y {} outside [{}, {}]", c.y, min.y, max.y);
        }
    }

    #[test]
    fn fits_every_family_into_the_inset() {
        let features = world();
        for kind in [ProjectionKind::Larrivee, ProjectionKind::Equirectangular, ProjectionKind::Mercator] {
            for viewport in [Viewport::new(200, 100), Viewport::new(37, 91), Viewport::new(1, 1)] {
                let builder = PathBuilder::fit(kind, &features, viewport, 0.05);
                for feature in &features {
                    assert!(!builder.path_string(feature).is_empty());
                    assert_inside(&builder.outline(feature), viewport, 0.05);
                }
            }
        }
    }

    #[test]
    fn fit_touches_the_inset_on_the_limiting_axis() {
        let features = world();
        let viewport = Viewport::new(400, 400);
        let builder = PathBuilder::fit(ProjectionKind::Equirectangular, &features, viewport, 0.05);
        let xs: Vec<f64> = features
            .iter()
            .flat_map(|f| polygon_coords(&builder.outline(f)).map(|c| c.x).collect::<Vec<_>>())
            .collect();
        let lo = xs.iter().copied().fold(f64::INFINITY, f64::min);
        let hi = xs.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        assert!((lo - 20.0).abs() < 1e-9);
        assert!((hi - 380.0).abs() < 1e-9);
    }

    #[test]
    fn refit_is_idempotent() {
        let features = world();
        let small = Viewport::new(120, 60);
        let large = Viewport::new(640, 320);

        let direct = PathBuilder::fit(ProjectionKind::Larrivee, &features, large, 0.05);
        let _ = PathBuilder::fit(ProjectionKind::Larrivee, &features, small, 0.05);
        let again = PathBuilder::fit(ProjectionKind::Larrivee, &features, large, 0.05);

        for f in &features {
            assert_eq!(direct.path_string(f), again.path_string(f));
        }
    }

    #[test]
    fn degenerate_input_fits_without_panicking() {
        let text = r#"{"type":"FeatureCollection","features":[
            {"type":"Feature","properties":{"ADM0_A3":"PNT"},
             "geometry":{"type":"Polygon","coordinates":[[[5,5],[5,5],[5,5],[5,5]]]}}]}"#;
        let features = normalize_str(text, Path::new("p.geojson")).unwrap();
        let viewport = Viewport::new(100, 50);
        let builder = PathBuilder::fit(ProjectionKind::Larrivee, &features, viewport, 0.05);
        assert!(builder.projection().scale().is_finite());
        let outline = builder.outline(&features[0]);
        for c in polygon_coords(&outline) {
            assert!((c.x - 50.0).abs() < 1e-9 && (c.y - 25.0).abs() < 1e-9);
        }

        let empty = PathBuilder::fit(ProjectionKind::Mercator, &[], viewport, 0.05);
        assert_eq!(empty.projection().project(0.0, 0.0), Coord { x: 50.0, y: 25.0 });
    }

    #[test]
    fn north_is_up() {
        let features = world();
        let builder = PathBuilder::fit(ProjectionKind::Larrivee, &features, Viewport::new(300, 150), 0.05);
        let p = builder.projection();
        assert!(p.project(0.0, 60.0).y < p.project(0.0, -60.0).y);
        assert!(p.project(-90.0, 0.0).x < p.project(90.0, 0.0).x);
    }
}
