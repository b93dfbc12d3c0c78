//! Aggregates over a normalized map: group shares, rankings, tooltip text and
//! the monthly series shown in the drill-down chart.

use std::collections::BTreeMap;

use crate::feature::{CountryProperties, NormalizedFeature, OBSERVER_CODE, UNRECOGNIZED_CODE};
use crate::groups::HighlightMode;
use crate::style::per_million;

/// Monthly mention fields, in display order.
pub const MONTHS: [&str; 9] = [
    "janv-25", "févr-25", "mars-25", "avr-25", "mai-25", "juin-25", "juil-25", "août-25", "sept-25",
];

const NOT_AVAILABLE: &str = "Non renseigné";
const UNKNOWN_NAME: &str = "Inconnu";

/// One entry per country code (first polygon wins), in code order.
pub fn unique_countries(features: &[NormalizedFeature]) -> Vec<&CountryProperties> {
    let mut seen = BTreeMap::new();
    for f in features {
        seen.entry(f.code()).or_insert(&*f.properties);
    }
    seen.into_values().collect()
}

/// Share of a group's mentions among all countries but the observer,
/// as a rounded percentage.
pub fn group_share(features: &[NormalizedFeature], mode: HighlightMode) -> Option<u32> {
    if mode == HighlightMode::None {
        return None;
    }
    let countries: Vec<_> = unique_countries(features)
        .into_iter()
        .filter(|p| p.code() != OBSERVER_CODE)
        .collect();
    let total: f64 = countries.iter().map(|p| p.current()).sum();
    if total <= 0.0 {
        return None;
    }
    let group: f64 = countries.iter().filter(|p| mode.contains(p.code())).map(|p| p.current()).sum();
    Some((group / total * 100.0).round() as u32)
}

/// Total mentions across countries, excluding the observer and unrecognized codes.
pub fn total_mentions(features: &[NormalizedFeature]) -> f64 {
    unique_countries(features)
        .into_iter()
        .filter(|p| p.code() != OBSERVER_CODE && p.code() != UNRECOGNIZED_CODE)
        .map(|p| p.current())
        .sum()
}

/// One row of the ranking panel.
#[derive(Clone, Debug, PartialEq)]
pub struct RankedCountry {
    pub code: String,
    pub name: String,
    pub mentions: f64,
    pub per_million: f64,
}

/// Most and least mentioned countries among those with at least one mention
/// and more than a million inhabitants.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Ranking {
    pub top: Vec<RankedCountry>,
    pub bottom: Vec<RankedCountry>,
}

pub fn ranking(features: &[NormalizedFeature], n: usize) -> Ranking {
    let mut rows: Vec<RankedCountry> = unique_countries(features)
        .into_iter()
        .filter(|p| p.code() != OBSERVER_CODE && p.code() != UNRECOGNIZED_CODE)
        .filter(|p| p.current() > 0.0 && p.population().unwrap_or(0.0) > 1_000_000.0)
        .map(|p| RankedCountry {
            code: p.code().to_string(),
            name: p.name().unwrap_or(UNKNOWN_NAME).to_string(),
            mentions: p.current(),
            per_million: per_million(p).unwrap_or(0.0).round(),
        })
        .collect();

    rows.sort_by(|a, b| b.mentions.total_cmp(&a.mentions));
    let top = rows.iter().take(n).cloned().collect();
    let bottom = rows.iter().rev().take(n).cloned().collect();
    Ranking { top, bottom }
}

/// Hover tooltip content.
#[derive(Clone, Debug, PartialEq)]
pub struct Tooltip {
    pub name: String,
    pub mentions: String,
    pub per_million: String,
    pub share: String,
}

impl Tooltip {
    pub fn new(props: &CountryProperties, total: f64) -> Self {
        if props.code() == OBSERVER_CODE {
            return Self {
                name: "France".to_string(),
                mentions: NOT_AVAILABLE.to_string(),
                per_million: NOT_AVAILABLE.to_string(),
                share: NOT_AVAILABLE.to_string(),
            };
        }
        let current = props.current();
        let ratio = per_million(props).unwrap_or(0.0);
        let share = if total > 0.0 { current / total * 100.0 } else { 0.0 };
        Self {
            name: props.name().unwrap_or(UNKNOWN_NAME).to_string(),
            mentions: group_thousands(current.round() as i64),
            per_million: format!("{}", ratio.round()),
            share: format!("{share:.2}%"),
        }
    }

    pub fn lines(&self) -> Vec<String> {
        vec![
            self.name.clone(),
            format!("Mentions : {}", self.mentions),
            format!("Mentions / 1M hab. : {}", self.per_million),
            format!("Part du total : {}", self.share),
        ]
    }
}

/// `1234567` → `1 234 567`.
fn group_thousands(n: i64) -> String {
    let digits = n.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(' ');
        }
        out.push(ch);
    }
    if n < 0 { format!("-{out}") } else { out }
}

/// Monthly mentions for the drill-down chart; missing months are zero.
pub fn monthly_series(props: &CountryProperties) -> Vec<(&'static str, u64)> {
    let normalized: BTreeMap<String, &str> = props.raw().keys().map(|k| (normalize_key(k), k.as_str())).collect();
    MONTHS
        .iter()
        .map(|month| {
            let value = normalized
                .get(&normalize_key(month))
                .and_then(|key| props.number(key))
                .unwrap_or(0.0);
            (*month, value.max(0.0).round() as u64)
        })
        .collect()
}

/// Removes whitespace, lowercases and folds French diacritics.
fn normalize_key(key: &str) -> String {
    key.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .map(|c| match c {
            'à' | 'â' | 'ä' => 'a',
            'é' | 'è' | 'ê' | 'ë' => 'e',
            'î' | 'ï' => 'i',
            'ô' | 'ö' => 'o',
            'ù' | 'û' | 'ü' => 'u',
            'ç' => 'c',
            other => other,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::normalize_str;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::path::Path;

    fn map(features: &[serde_json::Value]) -> Vec<NormalizedFeature> {
        let text = json!({ "type": "FeatureCollection", "features": features }).to_string();
        normalize_str(&text, Path::new("t.geojson")).unwrap()
    }

    fn country(code: &str, current: f64, pop: f64, parts: usize) -> serde_json::Value {
        let ring = json!([[[0, 0], [1, 0], [1, 1], [0, 0]]]);
        json!({
            "type": "Feature",
            "properties": { "ADM0_A3": code, "NAME_FR": code.to_lowercase(), "current": current, "POP_EST": pop },
            "geometry": { "type": "MultiPolygon", "coordinates": vec![ring; parts] }
        })
    }

    #[test]
    fn shares_count_each_country_once() {
        let features = map(&[
            country("NGA", 30.0, 2e8, 3),
            country("FRA", 1000.0, 6.8e7, 2),
            country("DEU", 70.0, 8e7, 1),
        ]);
        assert_eq!(group_share(&features, HighlightMode::Africa), Some(30));
        assert_eq!(group_share(&features, HighlightMode::Europe), Some(70));
        assert_eq!(group_share(&features, HighlightMode::None), None);
        assert_eq!(total_mentions(&features), 100.0);
    }

    #[test]
    fn share_without_mentions_is_none() {
        let features = map(&[country("NGA", 0.0, 2e8, 1)]);
        assert_eq!(group_share(&features, HighlightMode::Africa), None);
    }

    #[test]
    fn ranking_filters_small_and_silent_countries() {
        let features = map(&[
            country("USA", 500.0, 3.3e8, 2),
            country("IND", 300.0, 1.4e9, 1),
            country("VAT", 900.0, 800.0, 1),
            country("CHN", 0.0, 1.4e9, 1),
            country("FRA", 10_000.0, 6.8e7, 1),
            country("BRA", 50.0, 2e8, 1),
        ]);
        let r = ranking(&features, 2);
        let codes = |rows: &[RankedCountry]| rows.iter().map(|c| c.code.clone()).collect::<Vec<_>>();
        assert_eq!(codes(&r.top), vec!["USA", "IND"]);
        assert_eq!(codes(&r.bottom), vec!["BRA", "IND"]);
    }

    #[test]
    fn tooltip_formats_figures() {
        let features = map(&[country("USA", 1234.0, 3.3e8, 1)]);
        let tip = Tooltip::new(&features[0].properties, 10_000.0);
        assert_eq!(tip.name, "usa");
        assert_eq!(tip.mentions, "1 234");
        assert_eq!(tip.per_million, "4");
        assert_eq!(tip.share, "12.34%");
    }

    #[test]
    fn observer_tooltip_is_blank() {
        let features = map(&[country("FRA", 1234.0, 6.8e7, 1)]);
        let tip = Tooltip::new(&features[0].properties, 10_000.0);
        assert_eq!(tip.mentions, NOT_AVAILABLE);
        assert_eq!(tip.share, NOT_AVAILABLE);
    }

    #[test]
    fn monthly_series_matches_loose_keys() {
        let mut feature = country("USA", 1.0, 1.0, 1);
        feature["properties"]["Févr-25"] = json!(12);
        feature["properties"]["aout-25"] = json!("7");
        feature["properties"]["janv - 25"] = json!(3.6);
        let features = map(&[feature]);
        let series = monthly_series(&features[0].properties);
        assert_eq!(series.len(), 9);
        assert_eq!(series[0], ("janv-25", 4));
        assert_eq!(series[1], ("févr-25", 12));
        assert_eq!(series[2], ("mars-25", 0));
        assert_eq!(series[7], ("août-25", 7));
    }

    #[test]
    fn thousands_grouping() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(999), "999");
        assert_eq!(group_thousands(1000), "1 000");
        assert_eq!(group_thousands(-1234567), "-1 234 567");
    }
}
