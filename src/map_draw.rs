use std::borrow::Cow;

use geo::{BoundingRect, Contains, Coord, Polygon, Rect};
use kurbo::Point;
use ratatui::layout::Rect as TuiRect;
use ratatui::style::Color;
use ratatui::symbols::Marker;
use ratatui::widgets::canvas::{Canvas, Context, Line};
use ratatui::widgets::{Block, Borders};
use ratatui::Frame;

use crate::feature::NormalizedFeature;
use crate::path::{self, Ring};
use crate::projection::{PathBuilder, ProjectionKind, Viewport};
use crate::state::ZoomTransform;
use crate::style::FeatureStyle;

/// Virtual pixels per terminal cell with braille markers.
pub const CELL_WIDTH_PX: u16 = 2;
pub const CELL_HEIGHT_PX: u16 = 4;

/// Pixel viewport of a terminal area drawn with braille markers.
pub fn viewport_of(area: TuiRect) -> Viewport {
    Viewport::new(
        u32::from(area.width) * u32::from(CELL_WIDTH_PX),
        u32::from(area.height) * u32::from(CELL_HEIGHT_PX),
    )
}

/// Centre of a terminal cell in virtual pixels, `None` outside `area`.
pub fn cell_to_pixel(area: TuiRect, column: u16, row: u16) -> Option<Coord> {
    if column < area.x || row < area.y || column >= area.right() || row >= area.bottom() {
        return None;
    }
    Some(Coord {
        x: (f64::from(column - area.x) + 0.5) * f64::from(CELL_WIDTH_PX),
        y: (f64::from(row - area.y) + 0.5) * f64::from(CELL_HEIGHT_PX),
    })
}

/// One base map projected into a viewport: outlines for morphing, rings
/// for drawing, polygons for hit-testing.
#[derive(Clone, Debug)]
pub struct MapView {
    builder: PathBuilder,
    outlines: Vec<String>,
    rings: Vec<Vec<Ring>>,
    shapes: Vec<(Polygon<f64>, Option<Rect<f64>>)>,
}

impl MapView {
    pub fn new(features: &[NormalizedFeature], kind: ProjectionKind, viewport: Viewport, inset: f64) -> Self {
        let builder = PathBuilder::fit(kind, features, viewport, inset);
        let mut outlines = Vec::with_capacity(features.len());
        let mut rings = Vec::with_capacity(features.len());
        let mut shapes = Vec::with_capacity(features.len());
        for feature in features {
            let shape = builder.outline(feature);
            let data = path::polygon_to_path(&shape);
            rings.push(path::parse_rings(&data).unwrap_or_default());
            outlines.push(data);
            let bounds = shape.bounding_rect();
            shapes.push((shape, bounds));
        }
        Self { builder, outlines, rings, shapes }
    }

    /// Number of polygons.
    pub fn feature_count(&self) -> usize {
        self.outlines.len()
    }

    pub fn outlines(&self) -> &[String] {
        &self.outlines
    }

    pub fn rings(&self, index: usize) -> &[Ring] {
        self.rings.get(index).map_or(&[], Vec::as_slice)
    }

    /// Projection of (0, 0), where placeholder outlines sit.
    pub fn anchor(&self) -> Coord {
        self.builder.projection().project(0.0, 0.0)
    }

    /// Feature under a map-space point.
    pub fn hit(&self, p: Coord) -> Option<usize> {
        let point = geo::Point::from(p);
        self.shapes.iter().position(|(shape, bounds)| {
            bounds.is_some_and(|b| b.min().x <= p.x && p.x <= b.max().x && b.min().y <= p.y && p.y <= b.max().y)
                && shape.contains(&point)
        })
    }
}

/// Horizontal range of the viewport a layer may paint, in screen pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Clip {
    All,
    LeftOf(f64),
    RightOf(f64),
}

impl Clip {
    fn range(self, width: f64) -> (f64, f64) {
        match self {
            Self::All => (0.0, width),
            Self::LeftOf(x) => (0.0, x.min(width)),
            Self::RightOf(x) => (x.max(0.0), width),
        }
    }
}

/// One shape to draw, in map space.
#[derive(Clone, Debug)]
pub struct DrawItem<'a> {
    pub rings: Cow<'a, [Ring]>,
    pub style: FeatureStyle,
    pub hovered: bool,
}

#[derive(Clone, Debug)]
pub struct Layer<'a> {
    pub items: Vec<DrawItem<'a>>,
    pub clip: Clip,
}

/// Paints layers onto a bordered canvas. Strokes are drawn after fills;
/// glowing and hovered outlines last.
pub fn render(f: &mut Frame, area: TuiRect, title: &str, layers: &[Layer<'_>], zoom: ZoomTransform, divider: Option<f64>) {
    let block = Block::default().title(title.to_string()).borders(Borders::ALL);
    let inner = block.inner(area);
    let viewport = viewport_of(inner);
    let (w, h) = (f64::from(viewport.width), f64::from(viewport.height));

    let canvas = Canvas::default()
        .block(block)
        .marker(Marker::Braille)
        .x_bounds([0.0, w])
        .y_bounds([0.0, h])
        .paint(|ctx| {
            let painter = Painter { zoom, height: h };
            for layer in layers {
                let range = layer.clip.range(w);
                let screen: Vec<Vec<Ring>> = layer.items.iter().map(|item| painter.to_screen(&item.rings)).collect();

                for (item, rings) in layer.items.iter().zip(&screen) {
                    painter.fill(ctx, rings, item.style.fill.into(), range);
                }
                ctx.layer();

                let mut order: Vec<usize> = (0..layer.items.len()).collect();
                order.sort_by_key(|i| (layer.items[*i].hovered, layer.items[*i].style.glow));
                for i in order {
                    let item = &layer.items[i];
                    let px = item.style.stroke_width * zoom.k;
                    painter.stroke(ctx, &screen[i], item.style.stroke.into(), px, range);
                }
            }
            if let Some(x) = divider {
                ctx.draw(&Line { x1: x, y1: 0.0, x2: x, y2: h, color: Color::White });
            }
        });
    f.render_widget(canvas, area);
}

struct Painter {
    zoom: ZoomTransform,
    height: f64,
}

impl Painter {
    fn to_screen(&self, rings: &[Ring]) -> Vec<Ring> {
        rings
            .iter()
            .map(|ring| {
                ring.iter()
                    .map(|p| {
                        let c = self.zoom.apply(Coord { x: p.x, y: p.y });
                        Point::new(c.x, c.y)
                    })
                    .collect()
            })
            .collect()
    }

    /// Even-odd scanline fill, one pixel row at a time.
    fn fill(&self, ctx: &mut Context<'_>, rings: &[Ring], color: Color, (lo, hi): (f64, f64)) {
        let (min_y, max_y) = rings
            .iter()
            .flatten()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(a, b), p| (a.min(p.y), b.max(p.y)));
        if min_y > max_y || lo >= hi {
            return;
        }
        let first = min_y.max(0.0).floor() as i64;
        let last = max_y.min(self.height).ceil() as i64;
        for row in first..last {
            let y = row as f64 + 0.5;
            for (x0, x1) in scanline_spans(rings, y) {
                let (x0, x1) = (x0.max(lo), x1.min(hi));
                if x0 < x1 {
                    ctx.draw(&Line { x1: x0, y1: self.height - y, x2: x1, y2: self.height - y, color });
                }
            }
        }
    }

    fn stroke(&self, ctx: &mut Context<'_>, rings: &[Ring], color: Color, px: f64, range: (f64, f64)) {
        let offsets: &[(f64, f64)] = if px >= 2.0 { &[(0.0, 0.0), (1.0, 0.0), (0.0, 1.0)] } else { &[(0.0, 0.0)] };
        for ring in rings {
            for (i, a) in ring.iter().enumerate() {
                let b = ring[(i + 1) % ring.len()];
                let Some((a, b)) = clip_segment_x(*a, b, range) else {
                    continue;
                };
                for (dx, dy) in offsets {
                    ctx.draw(&Line {
                        x1: a.x + dx,
                        y1: self.height - a.y - dy,
                        x2: b.x + dx,
                        y2: self.height - b.y - dy,
                        color,
                    });
                }
            }
        }
    }
}

/// Filled spans of the rings on the horizontal line `y` (even-odd rule).
pub fn scanline_spans(rings: &[Ring], y: f64) -> Vec<(f64, f64)> {
    let mut xs = Vec::new();
    for ring in rings {
        for (i, a) in ring.iter().enumerate() {
            let b = ring[(i + 1) % ring.len()];
            if (a.y <= y) != (b.y <= y) {
                xs.push(a.x + (y - a.y) / (b.y - a.y) * (b.x - a.x));
            }
        }
    }
    xs.sort_by(f64::total_cmp);
    xs.chunks_exact(2).map(|pair| (pair[0], pair[1])).collect()
}

/// Clips a segment to `lo <= x <= hi`.
fn clip_segment_x(a: Point, b: Point, (lo, hi): (f64, f64)) -> Option<(Point, Point)> {
    let (a, b) = if a.x <= b.x { (a, b) } else { (b, a) };
    if b.x < lo || a.x > hi {
        return None;
    }
    let at = |x: f64| {
        if (b.x - a.x).abs() < f64::EPSILON {
            a
        } else {
            a.lerp(b, (x - a.x) / (b.x - a.x))
        }
    };
    let start = if a.x < lo { at(lo) } else { a };
    let end = if b.x > hi { at(hi) } else { b };
    Some((start, end))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::normalize_str;
    use pretty_assertions::assert_eq;
    use std::path::Path;

    fn square(x0: f64, y0: f64, size: f64) -> Ring {
        vec![
            Point::new(x0, y0),
            Point::new(x0 + size, y0),
            Point::new(x0 + size, y0 + size),
            Point::new(x0, y0 + size),
        ]
    }

    #[test]
    fn spans_respect_holes() {
        let rings = vec![square(0.0, 0.0, 10.0), square(4.0, 4.0, 2.0)];
        assert_eq!(scanline_spans(&rings, 1.0), vec![(0.0, 10.0)]);
        assert_eq!(scanline_spans(&rings, 5.0), vec![(0.0, 4.0), (6.0, 10.0)]);
        assert!(scanline_spans(&rings, 11.0).is_empty());
    }

    #[test]
    fn segments_clip_to_range() {
        let (a, b) = clip_segment_x(Point::new(0.0, 0.0), Point::new(10.0, 10.0), (5.0, 20.0)).unwrap();
        assert_eq!((a, b), (Point::new(5.0, 5.0), Point::new(10.0, 10.0)));
        assert!(clip_segment_x(Point::new(0.0, 0.0), Point::new(4.0, 0.0), (5.0, 20.0)).is_none());
    }

    #[test]
    fn cells_map_to_pixel_centres() {
        let area = TuiRect::new(10, 5, 20, 10);
        assert_eq!(cell_to_pixel(area, 10, 5), Some(Coord { x: 1.0, y: 2.0 }));
        assert_eq!(cell_to_pixel(area, 9, 5), None);
        assert_eq!(cell_to_pixel(area, 30, 5), None);
        assert_eq!(viewport_of(area), Viewport::new(40, 40));
    }

    #[test]
    fn hit_test_finds_feature() {
        let text = r#"{"type":"FeatureCollection","features":[
            {"type":"Feature","properties":{"ADM0_A3":"AAA"},
             "geometry":{"type":"Polygon","coordinates":[[[-10,-10],[0,-10],[0,10],[-10,10],[-10,-10]]]}},
            {"type":"Feature","properties":{"ADM0_A3":"BBB"},
             "geometry":{"type":"Polygon","coordinates":[[[0,-10],[10,-10],[10,10],[0,10],[0,-10]]]}}
        ]}"#;
        let features = normalize_str(text, Path::new("t")).unwrap();
        let view = MapView::new(&features, ProjectionKind::Equirectangular, Viewport::new(200, 200), 0.25);
        assert_eq!(view.feature_count(), 2);
        assert_eq!(view.hit(Coord { x: 75.0, y: 100.0 }), Some(0));
        assert_eq!(view.hit(Coord { x: 125.0, y: 100.0 }), Some(1));
        assert_eq!(view.hit(Coord { x: 10.0, y: 10.0 }), None);
        assert_eq!(view.anchor(), Coord { x: 100.0, y: 100.0 });
    }
}
