//! Fill, stroke and glow for a feature: a threshold color scale over
//! mentions per million inhabitants, plus highlight-group outlines.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::feature::{CountryProperties, OBSERVER_CODE};
use crate::groups::HighlightMode;

pub const NEUTRAL_FILL: Rgb = Rgb::new(0xe0, 0xe0, 0xe0);
pub const OBSERVER_FILL: Rgb = Rgb::new(0xde, 0xde, 0xde);
pub const DEFAULT_STROKE: Rgb = Rgb::new(0xff, 0xff, 0xff);

pub const DEFAULT_STROKE_WIDTH: f64 = 1.0;
pub const HIGHLIGHT_STROKE_WIDTH: f64 = 1.0;
pub const HOVER_STROKE_WIDTH: f64 = 3.0;

/// An sRGB color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl FromStr for Rgb {
    type Err = String;

    /// Parses `#rrggbb`, ignoring a trailing alpha byte (`#rrggbbaa`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s.trim().trim_start_matches('#');
        if !(hex.len() == 6 || hex.len() == 8) || !hex.is_ascii() {
            return Err(format!("invalid color {s:?}"));
        }
        let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| format!("invalid color {s:?}"));
        Ok(Self::new(byte(0)?, byte(2)?, byte(4)?))
    }
}

impl TryFrom<String> for Rgb {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Rgb> for String {
    fn from(c: Rgb) -> Self {
        c.to_string()
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl From<Rgb> for ratatui::style::Color {
    fn from(c: Rgb) -> Self {
        Self::Rgb(c.r, c.g, c.b)
    }
}

/// Threshold scale: `colors[i]` covers `[thresholds[i-1], thresholds[i])`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorScale {
    pub thresholds: Vec<f64>,
    pub colors: Vec<Rgb>,
}

impl Default for ColorScale {
    fn default() -> Self {
        Self {
            thresholds: vec![20.0, 50.0, 80.0, 300.0],
            colors: vec![
                Rgb::new(0xef, 0xf3, 0xff),
                Rgb::new(0xbd, 0xd7, 0xe7),
                Rgb::new(0x6b, 0xae, 0xd6),
                Rgb::new(0x31, 0x82, 0xbd),
                Rgb::new(0x08, 0x51, 0x9c),
            ],
        }
    }
}

impl ColorScale {
    /// A usable scale: one more color than thresholds, thresholds ascending.
    pub fn is_valid(&self) -> bool {
        self.colors.len() == self.thresholds.len() + 1
            && self.thresholds.windows(2).all(|w| w[0] < w[1])
            && self.thresholds.iter().all(|t| t.is_finite())
    }

    pub fn bucket(&self, value: f64) -> usize {
        self.thresholds.partition_point(|t| *t <= value)
    }

    pub fn color(&self, value: f64) -> Rgb {
        if value.is_nan() {
            return NEUTRAL_FILL;
        }
        self.colors.get(self.bucket(value)).copied().unwrap_or(NEUTRAL_FILL)
    }

    /// Legend rows: label and color per bucket.
    pub fn legend(&self) -> Vec<(String, Rgb)> {
        let mut bounds = vec![0.0];
        bounds.extend(self.thresholds.iter().copied());
        bounds
            .iter()
            .enumerate()
            .map(|(i, lo)| {
                let label = match bounds.get(i + 1) {
                    Some(hi) => format!("{lo}–{hi}"),
                    None => format!(">{lo}"),
                };
                (label, self.colors.get(i).copied().unwrap_or(NEUTRAL_FILL))
            })
            .collect()
    }
}

/// Resolved drawing attributes of one feature.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FeatureStyle {
    pub fill: Rgb,
    pub stroke: Rgb,
    pub stroke_width: f64,
    pub glow: bool,
}

/// Mentions per million inhabitants; `None` without a positive population.
pub fn per_million(props: &CountryProperties) -> Option<f64> {
    let population = props.population().filter(|p| *p > 0.0)?;
    Some(props.current() / population * 1e6)
}

pub fn stroke_color(mode: HighlightMode) -> Rgb {
    match mode {
        HighlightMode::None => DEFAULT_STROKE,
        HighlightMode::LeastDeveloped => Rgb::new(0xe0, 0x5a, 0x55),
        HighlightMode::Africa => Rgb::new(0x5e, 0x92, 0x56),
        HighlightMode::India => Rgb::new(0xba, 0x58, 0x87),
        HighlightMode::Europe => Rgb::new(0xfd, 0xc5, 0x4a),
    }
}

/// Stroke width held constant on screen under zoom factor `k`.
pub fn screen_width(nominal: f64, k: f64) -> f64 {
    if k.is_finite() && k > 0.0 { nominal / k } else { nominal }
}

/// Resolves the style of one feature. Total and side-effect free.
pub fn resolve_style(props: &CountryProperties, mode: HighlightMode, zoom: f64, scale: &ColorScale) -> FeatureStyle {
    let fill = if props.code() == OBSERVER_CODE {
        OBSERVER_FILL
    } else {
        per_million(props).map_or(NEUTRAL_FILL, |v| scale.color(v))
    };

    if mode.contains(props.code()) {
        FeatureStyle {
            fill,
            stroke: stroke_color(mode),
            stroke_width: screen_width(HIGHLIGHT_STROKE_WIDTH, zoom),
            glow: true,
        }
    } else {
        FeatureStyle {
            fill,
            stroke: DEFAULT_STROKE,
            stroke_width: screen_width(DEFAULT_STROKE_WIDTH, zoom),
            glow: false,
        }
    }
}
