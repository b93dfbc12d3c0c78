//! Path-string serialization and parsing.
//!
//! Outlines are written as absolute `M`/`L`/`Z` commands, one subpath per
//! ring. Parsing accepts any SVG path data and flattens curves into rings.

use geo::{Coord, LineString, Polygon};
use kurbo::{BezPath, PathEl, Point};

use crate::error::CartoError;

/// Flattening tolerance for curved segments, in pixels.
const FLATTEN_TOLERANCE: f64 = 0.25;

/// A closed ring of screen points, without the repeated closing vertex.
pub type Ring = Vec<Point>;

/// Serializes every ring of a polygon; empty rings are skipped.
pub fn polygon_to_path(polygon: &Polygon<f64>) -> String {
    let rings: Vec<Ring> = std::iter::once(polygon.exterior())
        .chain(polygon.interiors())
        .map(ring_from_line_string)
        .filter(|r| !r.is_empty())
        .collect();
    rings_to_path(&rings)
}

/// Serializes rings as closed subpaths.
pub fn rings_to_path(rings: &[Ring]) -> String {
    let mut path = BezPath::new();
    for ring in rings {
        let Some((first, rest)) = ring.split_first() else {
            continue;
        };
        path.move_to(*first);
        for p in rest {
            path.line_to(*p);
        }
        path.close_path();
    }
    path.to_svg()
}

/// A closed outline of four identical vertices at `anchor`.
pub fn placeholder_outline(anchor: Coord) -> String {
    let p = Point::new(anchor.x, anchor.y);
    rings_to_path(&[vec![p; 4]])
}

/// Parses path data into rings, flattening curves.
///
/// Each `M` starts a new ring; an open subpath is treated as closed.
pub fn parse_rings(data: &str) -> Result<Vec<Ring>, CartoError> {
    let path = BezPath::from_svg(data)?;
    let mut rings = Vec::new();
    let mut current: Ring = Vec::new();

    kurbo::flatten(path.iter(), FLATTEN_TOLERANCE, |el| match el {
        PathEl::MoveTo(p) => {
            push_ring(&mut rings, std::mem::take(&mut current));
            current.push(p);
        }
        PathEl::LineTo(p) => current.push(p),
        PathEl::ClosePath => push_ring(&mut rings, std::mem::take(&mut current)),
        // flatten only emits lines
        PathEl::QuadTo(_, p) | PathEl::CurveTo(_, _, p) => current.push(p),
    });
    push_ring(&mut rings, current);
    Ok(rings)
}

fn push_ring(rings: &mut Vec<Ring>, mut ring: Ring) {
    if ring.len() > 1 && ring.first() == ring.last() {
        ring.pop();
    }
    if ring.iter().all(|p| p.x.is_finite() && p.y.is_finite()) && !ring.is_empty() {
        rings.push(ring);
    }
}

fn ring_from_line_string(line: &LineString<f64>) -> Ring {
    let mut ring: Ring = line.0.iter().map(|c| Point::new(c.x, c.y)).collect();
    if ring.len() > 1 && ring.first() == ring.last() {
        ring.pop();
    }
    ring
}

/// Signed area of a ring (shoelace); positive for clockwise on screen.
pub fn signed_area(ring: &[Point]) -> f64 {
    if ring.len() < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for (i, a) in ring.iter().enumerate() {
        let b = ring[(i + 1) % ring.len()];
        sum += a.x * b.y - b.x * a.y;
    }
    sum * 0.5
}

/// Mean of the ring's vertices.
pub fn vertex_centroid(ring: &[Point]) -> Option<Point> {
    if ring.is_empty() {
        return None;
    }
    let n = ring.len() as f64;
    let (sx, sy) = ring.iter().fold((0.0, 0.0), |(x, y), p| (x + p.x, y + p.y));
    Some(Point::new(sx / n, sy / n))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn polygon_round_trips_through_rings() {
        let poly = Polygon::new(
            LineString::from(vec![(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)]),
            vec![LineString::from(vec![(2.0, 2.0), (4.0, 2.0), (4.0, 4.0)])],
        );
        let data = polygon_to_path(&poly);
        let rings = parse_rings(&data).unwrap();
        assert_eq!(rings.len(), 2);
        assert_eq!(rings[0].len(), 4);
        assert_eq!(rings[1], vec![Point::new(2.0, 2.0), Point::new(4.0, 2.0), Point::new(4.0, 4.0)]);
    }

    #[test]
    fn empty_polygon_is_empty_path() {
        let poly: Polygon<f64> = Polygon::new(LineString::new(vec![]), vec![]);
        assert_eq!(polygon_to_path(&poly), "");
        assert!(parse_rings("").unwrap().is_empty());
    }

    #[test]
    fn parses_relative_and_curved_commands() {
        let rings = parse_rings("m 0 0 h 10 v 10 q -5 5 -10 0 z M 20 20 L 30 20 L 30 30").unwrap();
        assert_eq!(rings.len(), 2);
        assert!(rings[0].len() > 4, "curve should be flattened into several vertices");
        assert_eq!(rings[1].len(), 3);
    }

    #[test]
    fn malformed_path_is_an_error() {
        assert!(parse_rings("M 0 0 L banana").is_err());
    }

    #[test]
    fn placeholder_has_zero_footprint() {
        let rings = parse_rings(&placeholder_outline(Coord { x: 3.0, y: 4.0 })).unwrap();
        assert_eq!(rings.len(), 1);
        assert!(rings[0].iter().all(|p| *p == Point::new(3.0, 4.0)));
        assert_eq!(signed_area(&rings[0]), 0.0);
    }
}
