use serde::{Deserialize, Serialize};

/// Identifier assigned to a winery by the API
pub type WineryId = u64;

/// Wine-growing region
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Region {
    Galilee,
    #[serde(rename = "Golan Heights")]
    GolanHeights,
    #[serde(rename = "Upper Galilee")]
    UpperGalilee,
    #[serde(rename = "Lower Galilee")]
    LowerGalilee,
    #[serde(rename = "Judean Hills")]
    JudeanHills,
    Samson,
    Negev,
    Sharon,
    Shomron,
    Carmel,
    Shimshon,
    #[serde(rename = "Judean Foothills")]
    JudeanFoothills,
    #[serde(rename = "Jerusalem Mountains")]
    JerusalemMountains,
    /// Anything the API sends that is not in the list above
    #[serde(other)]
    Unknown,
}

impl Region {
    /// Filterable regions, in display order
    pub const ALL: [Region; 13] = [
        Region::Galilee,
        Region::GolanHeights,
        Region::UpperGalilee,
        Region::LowerGalilee,
        Region::JudeanHills,
        Region::Samson,
        Region::Negev,
        Region::Sharon,
        Region::Shomron,
        Region::Carmel,
        Region::Shimshon,
        Region::JudeanFoothills,
        Region::JerusalemMountains,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Region::Galilee => "Galilee",
            Region::GolanHeights => "Golan Heights",
            Region::UpperGalilee => "Upper Galilee",
            Region::LowerGalilee => "Lower Galilee",
            Region::JudeanHills => "Judean Hills",
            Region::Samson => "Samson",
            Region::Negev => "Negev",
            Region::Sharon => "Sharon",
            Region::Shomron => "Shomron",
            Region::Carmel => "Carmel",
            Region::Shimshon => "Shimshon",
            Region::JudeanFoothills => "Judean Foothills",
            Region::JerusalemMountains => "Jerusalem Mountains",
            Region::Unknown => "Unknown",
        }
    }
}

/// A winery as returned by the API
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Winery {
    pub id: WineryId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub region: Option<Region>,
    #[serde(default)]
    pub average_rating: f64,
}

impl Winery {
    pub fn region_label(&self) -> &'static str {
        self.region.unwrap_or(Region::Unknown).as_str()
    }

    /// Marker glyph: first letter of the name
    pub fn initial(&self) -> char {
        self.name
            .chars()
            .next()
            .map(|c| c.to_ascii_uppercase())
            .unwrap_or('?')
    }
}

/// Payload for creating a winery
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct NewWinery {
    pub name: String,
    pub description: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// Login payload
#[derive(Clone, Debug, Serialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// Registration payload
#[derive(Clone, Debug, Serialize)]
pub struct Registration {
    pub username: String,
    pub password: String,
    pub is_admin: bool,
}

/// Criteria forwarded to the search endpoint
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SearchQuery {
    pub name: String,
    pub min_rating: f64,
    pub regions: Vec<Region>,
}

impl SearchQuery {
    /// True when the query matches the whole collection
    pub fn is_unfiltered(&self) -> bool {
        self.name.trim().is_empty() && self.min_rating <= 0.0 && self.regions.is_empty()
    }

    /// Query string pairs in the order the API expects
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let regions = self
            .regions
            .iter()
            .map(|r| r.as_str())
            .collect::<Vec<_>>()
            .join(",");
        vec![
            ("name", self.name.clone()),
            ("min_rating", self.min_rating.to_string()),
            ("regions", regions),
        ]
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct LoginResponse {
    pub access_token: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RegisterResponse {
    #[serde(default)]
    pub is_admin: bool,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RatingResponse {
    pub average_rating: f64,
}
