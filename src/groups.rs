use serde::{Deserialize, Serialize};

/// UN least-developed countries.
pub const LEAST_DEVELOPED: &[&str] = &[
    "AFG", "AGO", "BGD", "BEN", "BFA", "BDI", "KHM", "CAF", "TCD", "COM",
    "COD", "DJI", "ERI", "ETH", "GMB", "GIN", "GNB", "HTI", "KIR", "LAO",
    "LSO", "LBR", "MDG", "MWI", "MLI", "MRT", "MOZ", "MMR", "NPL", "NER",
    "RWA", "SEN", "SLE", "SLB", "SOM", "SSD", "SDN", "TLS", "TGO", "TUV",
    "UGA", "TZA", "YEM", "ZMB",
];

pub const AFRICA: &[&str] = &[
    "DZA", "AGO", "BEN", "BWA", "BFA", "BDI", "CPV", "CMR", "CAF", "TCD",
    "COM", "COD", "COG", "CIV", "DJI", "EGY", "GNQ", "ERI", "SWZ", "ETH",
    "GAB", "GMB", "GHA", "GIN", "GNB", "KEN", "LSO", "LBR", "LBY", "MDG",
    "MWI", "MLI", "MRT", "MUS", "MAR", "MOZ", "NAM", "NER", "NGA", "RWA",
    "STP", "SEN", "SYC", "SLE", "SOM", "ZAF", "SSD", "SDN", "TZA", "TGO",
    "TUN", "UGA", "ZMB", "ZWE", "ESH",
];

pub const INDIA: &[&str] = &["IND"];

/// European countries other than the observing country.
pub const EUROPE: &[&str] = &[
    "ALB", "AND", "AUT", "BLR", "BEL", "BIH", "BGR", "HRV", "CYP", "CZE",
    "DNK", "EST", "FIN", "DEU", "GRC", "HUN", "ISL", "IRL", "ITA", "LVA",
    "LTU", "LUX", "MLT", "MDA", "MNE", "NLD", "MKD", "NOR", "POL", "PRT",
    "ROU", "SMR", "SRB", "SVK", "SVN", "ESP", "SWE", "CHE", "GBR", "UKR",
    "VAT", "MCO",
];

/// Thematic group whose members are outlined.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HighlightMode {
    None,
    #[default]
    LeastDeveloped,
    Africa,
    India,
    Europe,
}

impl HighlightMode {
    pub const ALL: [Self; 5] = [Self::None, Self::LeastDeveloped, Self::Africa, Self::India, Self::Europe];

    pub fn codes(self) -> &'static [&'static str] {
        match self {
            Self::None => &[],
            Self::LeastDeveloped => LEAST_DEVELOPED,
            Self::Africa => AFRICA,
            Self::India => INDIA,
            Self::Europe => EUROPE,
        }
    }

    pub fn contains(self, code: &str) -> bool {
        self.codes().contains(&code)
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::None => "Aucun",
            Self::LeastDeveloped => "Pays les moins avancés",
            Self::Africa => "Afrique",
            Self::India => "Inde",
            Self::Europe => "Europe",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn membership() {
        assert!(HighlightMode::Africa.contains("NGA"));
        assert!(HighlightMode::India.contains("IND"));
        assert!(!HighlightMode::Europe.contains("FRA"));
        assert!(!HighlightMode::None.contains(""));
        assert!(HighlightMode::LeastDeveloped.contains("HTI"));
    }

    #[test]
    fn codes_are_unique_within_a_group() {
        for mode in HighlightMode::ALL {
            let mut codes = mode.codes().to_vec();
            codes.sort_unstable();
            codes.dedup();
            assert_eq!(codes.len(), mode.codes().len(), "{mode:?}");
        }
    }
}
