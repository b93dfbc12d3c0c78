use std::borrow::Cow;
use std::rc::Rc;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossterm::event::{KeyCode, MouseButton, MouseEvent, MouseEventKind};
use geo::Coord;
use ratatui::layout::Rect;

use crate::animation::{Animation, Motion};
use crate::config::{Config, Transition};
use crate::data::BaseMap;
use crate::feature::CountryProperties;
use crate::groups::HighlightMode;
use crate::interpolate::{MapMorph, MorphCache, MorphKey, MorphSide};
use crate::map_draw::{self, Clip, DrawItem, Layer, MapView};
use crate::projection::Viewport;
use crate::stats::{self, Ranking, Tooltip};
use crate::style::{self, HOVER_STROKE_WIDTH};

pub const ZOOM_IN_FACTOR: f64 = 1.5;
pub const ZOOM_OUT_FACTOR: f64 = 0.67;
/// Arrow-key pan step, as a fraction of the viewport.
pub const PAN_STEP: f64 = 0.1;
/// Mouse presses this close to the wipe divider start a drag, in cells.
pub const DRAG_HANDLE_CELLS: u16 = 2;
/// Rows in each half of the ranking popup.
pub const RANKING_SIZE: usize = 5;

/// Pan and zoom applied on top of the fitted projection:
/// `screen = k * map + (x, y)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ZoomTransform {
    pub k: f64,
    pub x: f64,
    pub y: f64,
}

impl Default for ZoomTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl ZoomTransform {
    pub const IDENTITY: Self = Self { k: 1.0, x: 0.0, y: 0.0 };

    pub fn apply(&self, p: Coord) -> Coord {
        Coord { x: p.x * self.k + self.x, y: p.y * self.k + self.y }
    }

    pub fn invert(&self, p: Coord) -> Coord {
        Coord { x: (p.x - self.x) / self.k, y: (p.y - self.y) / self.k }
    }

    /// Scales by `factor` keeping the screen point `center` fixed.
    pub fn scale_about(self, factor: f64, center: Coord, [min_k, max_k]: [f64; 2], viewport: Viewport) -> Self {
        let k = (self.k * factor).clamp(min_k, max_k);
        let ratio = k / self.k;
        Self {
            k,
            x: center.x - (center.x - self.x) * ratio,
            y: center.y - (center.y - self.y) * ratio,
        }
        .constrain(viewport)
    }

    pub fn translate_by(self, dx: f64, dy: f64, viewport: Viewport) -> Self {
        Self { x: self.x + dx, y: self.y + dy, ..self }.constrain(viewport)
    }

    /// Keeps the viewport covered by the zoomed map frame.
    pub fn constrain(self, viewport: Viewport) -> Self {
        let limit = |t: f64, size: f64| {
            let edge = size - size * self.k;
            t.clamp(edge.min(0.0), edge.max(0.0))
        };
        Self {
            k: self.k,
            x: limit(self.x, f64::from(viewport.width)),
            y: limit(self.y, f64::from(viewport.height)),
        }
    }
}

/// A feature of a base map.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pick {
    pub map: usize,
    pub feature: usize,
}

/// Everything the user can change.
#[derive(Clone, Debug, PartialEq)]
pub struct ViewState {
    /// Map shown when idle.
    pub map_index: usize,
    pub highlight: HighlightMode,
    /// Wipe divider position: 0 shows map 0 only, 1 shows map 1 only.
    pub wipe: f64,
    pub dragging: bool,
    pub zoom: ZoomTransform,
    pub hovered: Option<Pick>,
    pub selected: Option<Pick>,
    pub show_ranking: bool,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            map_index: 0,
            highlight: HighlightMode::default(),
            wipe: 0.0,
            dragging: false,
            zoom: ZoomTransform::IDENTITY,
            hovered: None,
            selected: None,
            show_ranking: false,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Action {
    Quit,
    ToggleMap,
    ShowMap(usize),
    Highlight(HighlightMode),
    ZoomIn,
    ZoomOut,
    /// Scroll zoom about a screen pixel.
    ZoomAt { factor: f64, at: Coord },
    ZoomReset,
    /// Pan by a fraction of the viewport.
    Pan { dx: f64, dy: f64 },
    /// Pointer moved to a screen pixel, or left the map.
    Hover(Option<Coord>),
    Select(Coord),
    ClearSelection,
    ToggleRanking,
    BeginDrag(f64),
    Drag(f64),
    EndDrag,
    Resize(Rect),
    Tick,
}

/// The application: loaded maps, their projected views, the morph cache and
/// the running transition.
pub struct App {
    pub config: Config,
    pub maps: Vec<BaseMap>,
    pub view: ViewState,
    pub animation: Animation,
    views: Vec<MapView>,
    viewport: Option<Viewport>,
    map_area: Rect,
    morphs: MorphCache,
    /// Properties styling each slot of the running morph.
    morph_props: Vec<Option<Arc<CountryProperties>>>,
    totals: Vec<f64>,
}

impl App {
    const HELP_TEXT: &'static str = "\
Tab / m : changer de carte
0-4 : mise en évidence
+ / - / r : zoom
flèches : déplacer
t : classement
Échap : désélectionner
q : quitter";

    pub fn new(config: Config, maps: Vec<BaseMap>) -> Self {
        let totals = maps.iter().map(|m| stats::total_mentions(&m.features)).collect();
        Self {
            config,
            maps,
            view: ViewState::default(),
            animation: Animation::Idle,
            views: Vec::new(),
            viewport: None,
            map_area: Rect::default(),
            morphs: MorphCache::default(),
            morph_props: Vec::new(),
            totals,
        }
    }

    pub fn help_text(&self) -> &'static str {
        Self::HELP_TEXT
    }

    pub fn viewport(&self) -> Option<Viewport> {
        self.viewport
    }

    pub fn map_area(&self) -> Rect {
        self.map_area
    }

    pub fn morph_cache(&self) -> &MorphCache {
        &self.morphs
    }

    /// Applies one action. Returns true when the application should exit.
    pub fn update(&mut self, action: Action, now: Instant) -> bool {
        use Action::*;
        match action {
            Quit => return true,
            ToggleMap => {
                if !self.maps.is_empty() {
                    let current = self.animation.target().unwrap_or(self.view.map_index);
                    self.show_map((current + 1) % self.maps.len(), now);
                }
            }
            ShowMap(target) => self.show_map(target, now),
            Highlight(mode) => self.view.highlight = mode,
            ZoomIn | ZoomOut => {
                let factor = if action == ZoomIn { ZOOM_IN_FACTOR } else { ZOOM_OUT_FACTOR };
                if let Some(vp) = self.viewport {
                    let center = Coord { x: f64::from(vp.width) / 2.0, y: f64::from(vp.height) / 2.0 };
                    self.view.zoom = self.view.zoom.scale_about(factor, center, self.config.zoom_extent, vp);
                }
            }
            ZoomAt { factor, at } => {
                if let Some(vp) = self.viewport {
                    self.view.zoom = self.view.zoom.scale_about(factor, at, self.config.zoom_extent, vp);
                }
            }
            ZoomReset => self.view.zoom = ZoomTransform::IDENTITY,
            Pan { dx, dy } => {
                if let Some(vp) = self.viewport {
                    let (w, h) = (f64::from(vp.width), f64::from(vp.height));
                    self.view.zoom = self.view.zoom.translate_by(dx * w, dy * h, vp);
                }
            }
            Hover(at) => self.view.hovered = at.and_then(|p| self.pick(p, now)),
            Select(at) => self.view.selected = self.pick(at, now),
            ClearSelection => self.view.selected = None,
            ToggleRanking => self.view.show_ranking = !self.view.show_ranking,
            BeginDrag(position) => {
                if self.wipe_enabled() && !self.animation.is_morphing() {
                    self.animation = Animation::Idle;
                    self.view.dragging = true;
                    self.view.wipe = position.clamp(0.0, 1.0);
                }
            }
            Drag(position) => {
                if self.view.dragging {
                    self.view.wipe = position.clamp(0.0, 1.0);
                }
            }
            EndDrag => {
                if self.view.dragging {
                    self.view.dragging = false;
                    let target = usize::from(self.view.wipe > 0.5);
                    self.start_wipe(target, now);
                }
            }
            Resize(area) => self.resize(area),
            Tick => {
                if let Some(target) = self.animation.tick(now) {
                    self.finish(target);
                }
            }
        }
        false
    }

    /// Maps a key to an action and applies it. Returns true to exit.
    pub fn handle_input(&mut self, key: KeyCode, now: Instant) -> bool {
        let action = match key {
            KeyCode::Char('q') => Action::Quit,
            KeyCode::Tab | KeyCode::Char('m') => Action::ToggleMap,
            KeyCode::Char(c @ '0'..='4') => {
                let i = c as usize - '0' as usize;
                Action::Highlight(HighlightMode::ALL[i])
            }
            KeyCode::Char('+') | KeyCode::Char('=') => Action::ZoomIn,
            KeyCode::Char('-') => Action::ZoomOut,
            KeyCode::Char('r') => Action::ZoomReset,
            KeyCode::Left => Action::Pan { dx: PAN_STEP, dy: 0.0 },
            KeyCode::Right => Action::Pan { dx: -PAN_STEP, dy: 0.0 },
            KeyCode::Up => Action::Pan { dx: 0.0, dy: PAN_STEP },
            KeyCode::Down => Action::Pan { dx: 0.0, dy: -PAN_STEP },
            KeyCode::Char('t') => Action::ToggleRanking,
            KeyCode::Esc => Action::ClearSelection,
            _ => return false,
        };
        self.update(action, now)
    }

    /// Maps a mouse event to an action and applies it.
    pub fn handle_mouse(&mut self, event: MouseEvent, now: Instant) {
        let area = self.map_area;
        let pixel = map_draw::cell_to_pixel(area, event.column, event.row);
        let position = |column: u16| {
            if area.width == 0 {
                0.0
            } else {
                (f64::from(column.saturating_sub(area.x)) + 0.5) / f64::from(area.width)
            }
        };

        let action = match event.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                let divider = area.x + (self.wipe_position(now) * f64::from(area.width)).round() as u16;
                if pixel.is_some() && self.wipe_enabled() && event.column.abs_diff(divider) <= DRAG_HANDLE_CELLS {
                    Action::BeginDrag(position(event.column))
                } else if let Some(p) = pixel {
                    Action::Select(p)
                } else {
                    return;
                }
            }
            MouseEventKind::Drag(MouseButton::Left) => Action::Drag(position(event.column)),
            MouseEventKind::Up(MouseButton::Left) => Action::EndDrag,
            MouseEventKind::Moved => Action::Hover(pixel),
            MouseEventKind::ScrollUp => match pixel {
                Some(at) => Action::ZoomAt { factor: ZOOM_IN_FACTOR, at },
                None => return,
            },
            MouseEventKind::ScrollDown => match pixel {
                Some(at) => Action::ZoomAt { factor: ZOOM_OUT_FACTOR, at },
                None => return,
            },
            _ => return,
        };
        self.update(action, now);
    }

    /// Wipe divides maps 0 and 1; other maps always morph.
    fn wipe_enabled(&self) -> bool {
        self.config.transition == Transition::Wipe && self.maps.len() >= 2 && self.view.map_index < 2
    }

    /// Live divider position.
    pub fn wipe_position(&self, now: Instant) -> f64 {
        self.animation.wipe_position(now).unwrap_or(self.view.wipe)
    }

    fn show_map(&mut self, target: usize, now: Instant) {
        if target >= self.maps.len() || self.view.dragging {
            return;
        }
        if self.animation.target().unwrap_or(self.view.map_index) == target {
            return;
        }
        self.view.hovered = None;
        self.view.selected = None;
        if self.wipe_enabled() && target < 2 && !self.animation.is_morphing() {
            self.start_wipe(target, now);
        } else {
            self.start_morph(target, now);
        }
    }

    fn start_wipe(&mut self, target: usize, now: Instant) {
        let from = self.wipe_position(now);
        let duration = Duration::from_millis(self.config.wipe_duration_ms);
        self.animation = Animation::start(Motion::Wipe { from, to: target as f64 }, target, duration, now);
    }

    fn start_morph(&mut self, target: usize, now: Instant) {
        let (Some(viewport), Some(to_view)) = (self.viewport, self.views.get(target)) else {
            // Nothing drawn yet.
            self.finish(target);
            return;
        };
        let to_map = &self.maps[target];
        let to_codes = to_map.codes();
        let to_side = MorphSide { outlines: to_view.outlines(), codes: &to_codes, anchor: to_view.anchor() };
        let to_props = |slot: &Option<usize>| slot.map(|i| Arc::clone(&to_map.features[i].properties));
        let max_segment_length = self.config.max_segment_length;

        let (morph, props): (Rc<MapMorph>, Vec<_>) = match self.animation.morph(now) {
            Some((running, t)) => {
                let frame = running.frame(t);
                let morph = MapMorph::from_frame(&frame, to_side, max_segment_length);
                let props = morph
                    .to_slots
                    .iter()
                    .zip(&morph.from_slots)
                    .map(|(to, from)| to_props(to).or_else(|| from.and_then(|i| self.morph_props.get(i).cloned().flatten())))
                    .collect();
                (Rc::new(morph), props)
            }
            None => {
                let from = self.view.map_index;
                let from_map = &self.maps[from];
                let from_view = &self.views[from];
                let from_codes = from_map.codes();
                let from_side = MorphSide { outlines: from_view.outlines(), codes: &from_codes, anchor: from_view.anchor() };
                let pairing = self.config.pairing;
                let morph = self.morphs.get_or_insert_with(MorphKey { from, to: target, viewport }, || {
                    log::trace!("Building morph {from} → {target}");
                    MapMorph::new(from_side, to_side, pairing, max_segment_length)
                });
                let props = morph
                    .to_slots
                    .iter()
                    .zip(&morph.from_slots)
                    .map(|(to, from)| to_props(to).or_else(|| from.map(|i| Arc::clone(&from_map.features[i].properties))))
                    .collect();
                (morph, props)
            }
        };

        self.morph_props = props;
        let duration = Duration::from_millis(self.config.morph_duration_ms);
        self.animation = Animation::start(Motion::Morph(morph), target, duration, now);
    }

    fn finish(&mut self, target: usize) {
        self.animation = Animation::Idle;
        self.view.map_index = target;
        self.view.wipe = if target == 1 { 1.0 } else { 0.0 };
        self.morph_props.clear();
    }

    /// Reprojects every map when the drawing area changes size.
    fn resize(&mut self, area: Rect) {
        self.map_area = area;
        let viewport = map_draw::viewport_of(area);
        if self.viewport == Some(viewport) {
            return;
        }
        self.viewport = Some(viewport);
        self.views = self
            .maps
            .iter()
            .map(|m| MapView::new(&m.features, self.config.projection, viewport, self.config.inset))
            .collect();
        self.morphs.clear();
        // Running morph geometry belongs to the old viewport.
        if let Animation::Animating { motion: Motion::Morph(_), target, .. } = self.animation {
            self.finish(target);
        }
        self.view.zoom = self.view.zoom.constrain(viewport);
        log::trace!("Viewport {}x{}", viewport.width, viewport.height);
    }

    /// Feature under a screen pixel, on whichever map is visible there.
    fn pick(&self, screen: Coord, now: Instant) -> Option<Pick> {
        if self.animation.is_morphing() {
            return None;
        }
        let map = self.visible_map_at(screen.x, now);
        let index = self.views.get(map)?.hit(self.view.zoom.invert(screen))?;
        Some(Pick { map, feature: index })
    }

    fn visible_map_at(&self, x: f64, now: Instant) -> usize {
        match self.viewport {
            Some(vp) if self.wipe_enabled() => {
                let divider = self.wipe_position(now) * f64::from(vp.width);
                if x < divider { 1 } else { 0 }
            }
            _ => self.view.map_index,
        }
    }

    pub fn properties(&self, pick: Pick) -> Option<&CountryProperties> {
        self.maps.get(pick.map)?.features.get(pick.feature).map(|f| f.properties.as_ref())
    }

    pub fn tooltip(&self) -> Option<Tooltip> {
        let pick = self.view.hovered?;
        let total = self.totals.get(pick.map).copied().unwrap_or(0.0);
        Some(Tooltip::new(self.properties(pick)?, total))
    }

    pub fn ranking(&self) -> Ranking {
        self.maps
            .get(self.view.map_index)
            .map(|m| stats::ranking(&m.features, RANKING_SIZE))
            .unwrap_or_default()
    }

    pub fn group_share(&self) -> Option<u32> {
        stats::group_share(&self.maps.get(self.view.map_index)?.features, self.view.highlight)
    }

    pub fn title(&self) -> &str {
        self.maps.get(self.view.map_index).map_or("Carte", |m| m.label.as_str())
    }

    /// Layers to paint at `now`, with the wipe divider if any.
    pub fn layers(&self, now: Instant) -> (Vec<Layer<'_>>, Option<f64>) {
        let scale = &self.config.scale;
        let zoom = self.view.zoom.k;
        let mode = self.view.highlight;

        if let Some((morph, t)) = self.animation.morph(now) {
            let items = morph
                .interpolators()
                .iter()
                .zip(&self.morph_props)
                .map(|(interpolator, props)| DrawItem {
                    rings: Cow::Owned(interpolator.rings_at(t)),
                    style: match props {
                        Some(p) => style::resolve_style(p, mode, zoom, scale),
                        None => style::resolve_style(&CountryProperties::default(), mode, zoom, scale),
                    },
                    hovered: false,
                })
                .collect();
            return (vec![Layer { items, clip: Clip::All }], None);
        }

        let layer = |map: usize, clip: Clip| {
            let features = self.maps.get(map).map_or(&[][..], |m| m.features.as_slice());
            // Every polygon of the hovered country lights up.
            let hovered_code = self
                .view
                .hovered
                .filter(|pick| pick.map == map)
                .and_then(|pick| features.get(pick.feature))
                .map(|f| f.code());
            let items = features
                .iter()
                .enumerate()
                .map(|(i, f)| {
                    let hovered = hovered_code == Some(f.code());
                    let mut style = style::resolve_style(&f.properties, mode, zoom, scale);
                    if hovered {
                        style.stroke_width = style::screen_width(HOVER_STROKE_WIDTH, zoom);
                    }
                    DrawItem { rings: Cow::Borrowed(self.views.get(map).map_or(&[][..], |v| v.rings(i))), style, hovered }
                })
                .collect();
            Layer { items, clip }
        };

        match self.viewport {
            Some(vp) if self.wipe_enabled() => {
                let divider = self.wipe_position(now) * f64::from(vp.width);
                (vec![layer(0, Clip::RightOf(divider)), layer(1, Clip::LeftOf(divider))], Some(divider))
            }
            _ => (vec![layer(self.view.map_index, Clip::All)], None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::normalize_str;
    use pretty_assertions::assert_eq;
    use std::path::Path;

    const MS: Duration = Duration::from_millis(1);

    fn base_map(label: &str, size: f64) -> BaseMap {
        let text = format!(
            r#"{{"type":"FeatureCollection","features":[
                {{"type":"Feature","properties":{{"ADM0_A3":"NGA","current":40,"POP_EST":2e8}},
                 "geometry":{{"type":"Polygon","coordinates":[[[-{size},-{size}],[0,-{size}],[0,{size}],[-{size},{size}],[-{size},-{size}]]]}}}},
                {{"type":"Feature","properties":{{"ADM0_A3":"USA","current":60,"POP_EST":3e8}},
                 "geometry":{{"type":"Polygon","coordinates":[[[0,-{size}],[{size},-{size}],[{size},{size}],[0,{size}],[0,-{size}]]]}}}}
            ]}}"#
        );
        BaseMap { label: label.to_string(), features: normalize_str(&text, Path::new("t")).unwrap() }
    }

    fn app(transition: Transition) -> App {
        let config = Config { transition, ..Config::default() };
        let mut app = App::new(config, vec![base_map("monde", 40.0), base_map("presse", 20.0)]);
        app.update(Action::Resize(Rect::new(0, 0, 50, 25)), Instant::now());
        app
    }

    #[test]
    fn wipe_toggle_completes_on_map_one() {
        let mut app = app(Transition::Wipe);
        let t0 = Instant::now();
        app.update(Action::ToggleMap, t0);
        assert!(app.animation.is_animating());
        assert_eq!(app.wipe_position(t0 + 600 * MS), 0.5);

        app.update(Action::Tick, t0 + 1200 * MS);
        assert!(!app.animation.is_animating());
        assert_eq!(app.view.map_index, 1);
        assert_eq!(app.view.wipe, 1.0);
    }

    #[test]
    fn retoggle_restarts_from_live_position() {
        let mut app = app(Transition::Wipe);
        let t0 = Instant::now();
        app.update(Action::ToggleMap, t0);
        app.update(Action::ToggleMap, t0 + 600 * MS);
        assert_eq!(app.animation.target(), Some(0));
        assert_eq!(app.wipe_position(t0 + 600 * MS), 0.5);
        app.update(Action::Tick, t0 + 1800 * MS);
        assert_eq!(app.view.map_index, 0);
    }

    #[test]
    fn drag_release_snaps_to_nearer_map() {
        let mut app = app(Transition::Wipe);
        let t0 = Instant::now();
        app.update(Action::BeginDrag(0.2), t0);
        app.update(Action::Drag(0.7), t0);
        assert_eq!(app.view.wipe, 0.7);
        app.update(Action::EndDrag, t0);
        assert_eq!(app.animation.target(), Some(1));
        app.update(Action::Tick, t0 + 1200 * MS);
        assert_eq!(app.view.map_index, 1);

        app.update(Action::BeginDrag(0.9), t0);
        app.update(Action::Drag(0.4), t0);
        app.update(Action::EndDrag, t0);
        assert_eq!(app.animation.target(), Some(0));
    }

    #[test]
    fn morph_reuses_cached_interpolators() {
        let mut app = app(Transition::Morph);
        let t0 = Instant::now();
        app.update(Action::ToggleMap, t0);
        let (morph, _) = app.animation.morph(t0).unwrap();
        assert_eq!(morph.len(), 2);
        app.update(Action::Tick, t0 + 1000 * MS);
        assert_eq!(app.view.map_index, 1);

        app.update(Action::ToggleMap, t0 + 2000 * MS);
        app.update(Action::Tick, t0 + 3000 * MS);
        app.update(Action::ToggleMap, t0 + 4000 * MS);
        assert_eq!(app.morph_cache().len(), 2);
    }

    #[test]
    fn morph_interrupted_midway_heads_back() {
        let mut app = app(Transition::Morph);
        let t0 = Instant::now();
        app.update(Action::ToggleMap, t0);
        app.update(Action::ToggleMap, t0 + 500 * MS);
        assert_eq!(app.animation.target(), Some(0));
        let (layers, divider) = app.layers(t0 + 500 * MS);
        assert_eq!(divider, None);
        assert_eq!(layers[0].items.len(), 2);
        assert_eq!(app.morph_cache().len(), 1);
    }

    #[test]
    fn resize_invalidates_morphs() {
        let mut app = app(Transition::Morph);
        let t0 = Instant::now();
        app.update(Action::ToggleMap, t0);
        app.update(Action::Tick, t0 + 1000 * MS);
        assert_eq!(app.morph_cache().len(), 1);

        app.update(Action::Resize(Rect::new(0, 0, 50, 25)), t0);
        assert_eq!(app.morph_cache().len(), 1);
        app.update(Action::Resize(Rect::new(0, 0, 80, 30)), t0);
        assert!(app.morph_cache().is_empty());
        assert_eq!(app.viewport(), Some(Viewport::new(160, 120)));
    }

    #[test]
    fn keys_map_to_actions() {
        let mut app = app(Transition::Wipe);
        let now = Instant::now();
        assert!(!app.handle_input(KeyCode::Char('2'), now));
        assert_eq!(app.view.highlight, HighlightMode::Africa);
        app.handle_input(KeyCode::Char('t'), now);
        assert!(app.view.show_ranking);
        app.handle_input(KeyCode::Char('+'), now);
        assert_eq!(app.view.zoom.k, 1.5);
        app.handle_input(KeyCode::Char('r'), now);
        assert_eq!(app.view.zoom, ZoomTransform::IDENTITY);
        assert!(app.handle_input(KeyCode::Char('q'), now));
    }

    #[test]
    fn zoom_is_clamped_and_covers_viewport() {
        let vp = Viewport::new(100, 100);
        let center = Coord { x: 50.0, y: 50.0 };
        let mut zoom = ZoomTransform::IDENTITY;
        for _ in 0..20 {
            zoom = zoom.scale_about(ZOOM_IN_FACTOR, center, [1.0, 12.0], vp);
        }
        assert_eq!(zoom.k, 12.0);
        assert!((zoom.x - (50.0 - 50.0 * 12.0)).abs() < 1e-9);

        let panned = zoom.translate_by(1e6, -1e6, vp);
        assert_eq!((panned.x, panned.y), (0.0, 100.0 - 1200.0));
        assert_eq!(ZoomTransform::IDENTITY.scale_about(ZOOM_OUT_FACTOR, center, [1.0, 12.0], vp), ZoomTransform::IDENTITY);

        let p = Coord { x: 12.0, y: 34.0 };
        let back = zoom.invert(zoom.apply(p));
        assert!((back.x - p.x).abs() < 1e-9 && (back.y - p.y).abs() < 1e-9);
    }

    #[test]
    fn hover_picks_feature_under_pointer() {
        let mut app = app(Transition::Morph);
        let now = Instant::now();
        // Map area is 100x100 px; NGA fills the left half, USA the right.
        app.update(Action::Hover(Some(Coord { x: 30.0, y: 50.0 })), now);
        assert_eq!(app.view.hovered, Some(Pick { map: 0, feature: 0 }));
        let tip = app.tooltip().unwrap();
        assert_eq!(tip.share, "40.00%");

        app.update(Action::Select(Coord { x: 70.0, y: 50.0 }), now);
        assert_eq!(app.view.selected, Some(Pick { map: 0, feature: 1 }));
        app.update(Action::ClearSelection, now);
        assert_eq!(app.view.selected, None);
        app.update(Action::Hover(None), now);
        assert_eq!(app.tooltip(), None);
    }

    #[test]
    fn hover_outlines_every_polygon_of_the_country() {
        let text = r#"{"type":"FeatureCollection","features":[
            {"type":"Feature","properties":{"ADM0_A3":"NGA","current":40,"POP_EST":2e8},
             "geometry":{"type":"Polygon","coordinates":[[[-10,-10],[0,-10],[0,10],[-10,10],[-10,-10]]]}},
            {"type":"Feature","properties":{"ADM0_A3":"IDN","current":60,"POP_EST":2.7e8},
             "geometry":{"type":"MultiPolygon","coordinates":[
                [[[10,-10],[20,-10],[20,0],[10,0],[10,-10]]],
                [[[25,0],[35,0],[35,10],[25,10],[25,0]]]]}}
        ]}"#;
        let map = BaseMap { label: "monde".to_string(), features: normalize_str(text, Path::new("t")).unwrap() };
        let config = Config { transition: Transition::Morph, ..Config::default() };
        let mut app = App::new(config, vec![map]);
        let now = Instant::now();
        app.update(Action::Resize(Rect::new(0, 0, 50, 25)), now);

        // IDN, IDN, NGA
        app.view.hovered = Some(Pick { map: 0, feature: 0 });
        let (layers, _) = app.layers(now);
        let flags: Vec<bool> = layers[0].items.iter().map(|item| item.hovered).collect();
        assert_eq!(flags, vec![true, true, false]);
        assert_eq!(layers[0].items[0].style.stroke_width, layers[0].items[1].style.stroke_width);

        app.view.hovered = Some(Pick { map: 0, feature: 2 });
        let (layers, _) = app.layers(now);
        let flags: Vec<bool> = layers[0].items.iter().map(|item| item.hovered).collect();
        assert_eq!(flags, vec![false, false, true]);
    }

    #[test]
    fn wipe_layers_split_at_divider() {
        let app = app(Transition::Wipe);
        let (layers, divider) = app.layers(Instant::now());
        assert_eq!(divider, Some(0.0));
        assert_eq!(layers.len(), 2);
        assert_eq!(layers[0].clip, Clip::RightOf(0.0));
        assert_eq!(layers[1].clip, Clip::LeftOf(0.0));
    }

    #[test]
    fn empty_app_is_inert() {
        let mut app = App::new(Config::default(), Vec::new());
        let now = Instant::now();
        app.update(Action::Resize(Rect::new(0, 0, 10, 10)), now);
        app.update(Action::ToggleMap, now);
        assert!(!app.animation.is_animating());
        assert_eq!(app.group_share(), None);
        assert!(app.layers(now).0[0].items.is_empty());
    }
}
