//! Shape interpolation between path-strings.
//!
//! Each ring pair is resampled to a common vertex count: long edges are
//! bisected, the sparser ring gets extra vertices on its longest edges, and
//! the destination is rotated to the start offset with the smallest summed
//! squared distance. Frames are then a per-vertex linear blend.

use std::collections::HashMap;
use std::rc::Rc;

use geo::Coord;
use kurbo::Point;
use serde::{Deserialize, Serialize};

use crate::path::{self, Ring};
use crate::projection::Viewport;

/// Default maximum edge length before bisection, in pixels.
pub const DEFAULT_MAX_SEGMENT_LENGTH: f64 = 10.0;

/// Interpolates one outline into another.
///
/// Never panics: unparsable input degrades to a static frame.
#[derive(Clone, Debug)]
pub struct ShapeInterpolator {
    from: String,
    to: String,
    body: Body,
}

#[derive(Clone, Debug)]
enum Body {
    Rings(Vec<(Ring, Ring)>),
    Static(String),
}

impl ShapeInterpolator {
    pub fn new(from: &str, to: &str, max_segment_length: f64) -> Self {
        let parsed = |data: &str| match path::parse_rings(data) {
            Ok(rings) if !rings.is_empty() => Some(rings),
            Ok(_) => None,
            Err(e) => {
                log::trace!("Unusable outline {data:?}: {e}");
                None
            }
        };

        let body = match (parsed(from), parsed(to)) {
            (Some(a), Some(b)) => Body::Rings(match_ring_sets(a, b, max_segment_length)),
            (Some(_), None) => Body::Static(from.to_string()),
            (None, Some(_)) => Body::Static(to.to_string()),
            (None, None) => Body::Static(String::new()),
        };
        Self { from: from.to_string(), to: to.to_string(), body }
    }

    /// Path-string at `t`; the endpoints are returned verbatim.
    pub fn at(&self, t: f64) -> String {
        let t = clamp_t(t);
        if t <= 0.0 {
            return self.from.clone();
        }
        if t >= 1.0 {
            return self.to.clone();
        }
        match &self.body {
            Body::Static(data) => data.clone(),
            Body::Rings(_) => path::rings_to_path(&self.rings_at(t)),
        }
    }

    /// Ring geometry at `t`, for callers drawing directly.
    pub fn rings_at(&self, t: f64) -> Vec<Ring> {
        let t = clamp_t(t);
        match &self.body {
            Body::Rings(pairs) => pairs
                .iter()
                .map(|(a, b)| a.iter().zip(b).map(|(p, q)| p.lerp(*q, t)).collect())
                .collect(),
            Body::Static(data) => {
                let data = if t <= 0.0 {
                    &self.from
                } else if t >= 1.0 {
                    &self.to
                } else {
                    data
                };
                path::parse_rings(data).unwrap_or_default()
            }
        }
    }
}

fn clamp_t(t: f64) -> f64 {
    if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) }
}

/// Pairs rings by position. Missing rings on either side become
/// zero-footprint rings at the centroid of that side's exterior.
fn match_ring_sets(mut a: Vec<Ring>, mut b: Vec<Ring>, max_segment_length: f64) -> Vec<(Ring, Ring)> {
    let n = a.len().max(b.len());
    pad_rings(&mut a, &b, n);
    pad_rings(&mut b, &a, n);
    a.into_iter()
        .zip(b)
        .map(|(ra, rb)| match_rings(ra, rb, max_segment_length))
        .collect()
}

fn pad_rings(rings: &mut Vec<Ring>, other: &[Ring], n: usize) {
    let own = rings.first().and_then(|r| path::vertex_centroid(r));
    while rings.len() < n {
        let anchor = own
            .or_else(|| path::vertex_centroid(&other[rings.len()]))
            .unwrap_or(Point::ORIGIN);
        rings.push(vec![anchor]);
    }
}

/// Resamples two rings to the same length and alignment.
fn match_rings(mut a: Ring, mut b: Ring, max_segment_length: f64) -> (Ring, Ring) {
    orient(&mut a);
    orient(&mut b);

    if max_segment_length.is_finite() && max_segment_length > 0.0 {
        bisect(&mut a, max_segment_length);
        bisect(&mut b, max_segment_length);
    }

    let n = a.len().max(b.len());
    add_points(&mut a, n);
    add_points(&mut b, n);

    rotate_to_match(&a, &mut b);
    (a, b)
}

/// Gives every ring with area the same winding.
fn orient(ring: &mut Ring) {
    if path::signed_area(ring) < 0.0 {
        ring.reverse();
    }
}

/// Splits edges (including the closing edge) longer than `max`.
fn bisect(ring: &mut Ring, max: f64) {
    if ring.len() < 2 {
        return;
    }
    let mut out = Vec::with_capacity(ring.len());
    for i in 0..ring.len() {
        let a = ring[i];
        let b = ring[(i + 1) % ring.len()];
        out.push(a);
        let pieces = (a.distance(b) / max).ceil();
        // guard against absurd counts from huge edges
        let pieces = pieces.min(4096.0) as usize;
        for k in 1..pieces {
            out.push(a.lerp(b, k as f64 / pieces as f64));
        }
    }
    *ring = out;
}

/// Grows the ring to `n` vertices by repeatedly splitting the longest edge.
fn add_points(ring: &mut Ring, n: usize) {
    if ring.is_empty() || ring.len() >= n {
        return;
    }
    if ring.len() == 1 {
        ring.resize(n, ring[0]);
        return;
    }

    let len = ring.len();
    let lengths: Vec<f64> = (0..len).map(|i| ring[i].distance(ring[(i + 1) % len])).collect();
    // pieces[i]: how many parts edge i is cut into
    let mut pieces = vec![1usize; len];
    for _ in 0..(n - len) {
        let (longest, _) = lengths
            .iter()
            .zip(&pieces)
            .map(|(l, p)| l / *p as f64)
            .enumerate()
            .fold((0, f64::NEG_INFINITY), |best, (i, l)| if l > best.1 { (i, l) } else { best });
        pieces[longest] += 1;
    }

    let mut out = Vec::with_capacity(n);
    for i in 0..len {
        let a = ring[i];
        let b = ring[(i + 1) % len];
        out.push(a);
        for k in 1..pieces[i] {
            out.push(a.lerp(b, k as f64 / pieces[i] as f64));
        }
    }
    *ring = out;
}

/// Rotates `b` so that its vertices line up with `a` as closely as possible.
fn rotate_to_match(a: &[Point], b: &mut Ring) {
    let n = a.len();
    if n == 0 || b.len() != n {
        return;
    }
    let mut best = (0, f64::INFINITY);
    for offset in 0..n {
        let mut sum = 0.0;
        for (i, p) in a.iter().enumerate() {
            sum += (*p - b[(offset + i) % n]).hypot2();
            if sum >= best.1 {
                break;
            }
        }
        if sum < best.1 {
            best = (offset, sum);
        }
    }
    b.rotate_left(best.0);
}

/// Pads `outlines` with `placeholder` up to `len` entries.
pub fn pad_outlines(outlines: &[String], len: usize, placeholder: &str) -> Vec<String> {
    let mut padded = outlines.to_vec();
    padded.resize(len.max(outlines.len()), placeholder.to_string());
    padded
}

/// How outlines of two maps are paired for a morph.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Pairing {
    /// By position in the two sequences.
    #[default]
    Position,
    /// By country code, rings in order within each country.
    Country,
}

/// One side of a morph: its outlines, their country codes, and the anchor
/// used for zero-footprint placeholders.
#[derive(Clone, Copy, Debug)]
pub struct MorphSide<'a> {
    pub outlines: &'a [String],
    pub codes: &'a [&'a str],
    pub anchor: Coord,
}

/// Interpolators morphing one full map state into another.
#[derive(Clone, Debug)]
pub struct MapMorph {
    /// Source feature index for each slot, `None` for a placeholder.
    pub from_slots: Vec<Option<usize>>,
    /// Destination feature index for each slot, `None` for a placeholder.
    pub to_slots: Vec<Option<usize>>,
    interpolators: Vec<ShapeInterpolator>,
}

impl MapMorph {
    pub fn new(from: MorphSide<'_>, to: MorphSide<'_>, pairing: Pairing, max_segment_length: f64) -> Self {
        let (from_slots, to_slots) = match pairing {
            Pairing::Position => position_slots(from.outlines.len(), to.outlines.len()),
            Pairing::Country => country_slots(from.codes, to.codes),
        };
        let from_placeholder = path::placeholder_outline(from.anchor);
        let to_placeholder = path::placeholder_outline(to.anchor);

        let interpolators = from_slots
            .iter()
            .zip(&to_slots)
            .map(|(a, b)| {
                let a = a.map_or(from_placeholder.as_str(), |i| from.outlines[i].as_str());
                let b = b.map_or(to_placeholder.as_str(), |i| to.outlines[i].as_str());
                ShapeInterpolator::new(a, b, max_segment_length)
            })
            .collect();

        Self { from_slots, to_slots, interpolators }
    }

    /// Morph from arbitrary path-strings (e.g. a frame captured mid-flight)
    /// into `to`, paired by position.
    pub fn from_frame(frame: &[String], to: MorphSide<'_>, max_segment_length: f64) -> Self {
        let len = frame.len().max(to.outlines.len());
        let placeholder = path::placeholder_outline(to.anchor);
        let padded_from = pad_outlines(frame, len, &placeholder);
        let padded_to = pad_outlines(to.outlines, len, &placeholder);
        let (from_slots, to_slots) = position_slots(frame.len(), to.outlines.len());
        let interpolators = padded_from
            .iter()
            .zip(&padded_to)
            .map(|(a, b)| ShapeInterpolator::new(a, b, max_segment_length))
            .collect();
        Self { from_slots, to_slots, interpolators }
    }

    pub fn len(&self) -> usize {
        self.interpolators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.interpolators.is_empty()
    }

    pub fn interpolators(&self) -> &[ShapeInterpolator] {
        &self.interpolators
    }

    /// Every outline at `t`.
    pub fn frame(&self, t: f64) -> Vec<String> {
        self.interpolators.iter().map(|i| i.at(t)).collect()
    }
}

fn position_slots(a: usize, b: usize) -> (Vec<Option<usize>>, Vec<Option<usize>>) {
    let n = a.max(b);
    (
        (0..n).map(|i| (i < a).then_some(i)).collect(),
        (0..n).map(|i| (i < b).then_some(i)).collect(),
    )
}

/// Pairs the k-th ring of a country with the k-th ring of the same country.
/// Both code sequences must be sorted, as the normalizer produces them.
fn country_slots(a: &[&str], b: &[&str]) -> (Vec<Option<usize>>, Vec<Option<usize>>) {
    let (mut from, mut to) = (Vec::new(), Vec::new());
    let (mut i, mut j) = (0, 0);
    while i < a.len() || j < b.len() {
        let next = match (a.get(i), b.get(j)) {
            (Some(x), Some(y)) => x.min(y),
            (Some(x), None) => x,
            (None, Some(y)) => y,
            (None, None) => break,
        };
        let run_a = a[i..].iter().take_while(|c| *c == next).count();
        let run_b = b[j..].iter().take_while(|c| *c == next).count();
        for k in 0..run_a.max(run_b) {
            from.push((k < run_a).then_some(i + k));
            to.push((k < run_b).then_some(j + k));
        }
        i += run_a;
        j += run_b;
    }
    (from, to)
}

/// Key of a cached morph.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MorphKey {
    pub from: usize,
    pub to: usize,
    pub viewport: Viewport,
}

/// Morphs computed once per (from, to, viewport); forward and reverse are
/// separate entries.
#[derive(Debug, Default)]
pub struct MorphCache {
    entries: HashMap<MorphKey, Rc<MapMorph>>,
}

impl MorphCache {
    pub fn get_or_insert_with(&mut self, key: MorphKey, build: impl FnOnce() -> MapMorph) -> Rc<MapMorph> {
        // Entries for another viewport are stale.
        self.entries.retain(|k, _| k.viewport == key.viewport);
        Rc::clone(self.entries.entry(key).or_insert_with(|| Rc::new(build())))
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
