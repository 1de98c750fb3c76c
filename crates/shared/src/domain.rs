use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Centre of the overview viewport, roughly the middle of the Highlands.
pub const DEFAULT_CENTER: LatLng = LatLng {
    lat: 56.8169,
    lng: -4.1826,
};
pub const OVERVIEW_ZOOM: u8 = 7;
pub const FOCUSED_ZOOM: u8 = 13;

/// Web Mercator cannot represent the poles; tiles stop at this latitude.
pub const MAX_MERCATOR_LAT: f64 = 85.051_128_779_806_59;

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub u64);
    };
}

id_newtype!(MarkerId);

impl MarkerId {
    /// Derives a stable id from every field of the record so that marker
    /// identity survives reordering or filtering of the collection. Only
    /// records identical in all fields share an id.
    pub fn for_record(name: &str, height: f64, meaning: &str, position: LatLng) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(name.as_bytes());
        hasher.update([0u8]);
        hasher.update(meaning.as_bytes());
        hasher.update([0u8]);
        hasher.update(height.to_bits().to_be_bytes());
        hasher.update(position.lat.to_bits().to_be_bytes());
        hasher.update(position.lng.to_bits().to_be_bytes());
        let digest = hasher.finalize();
        let mut prefix = [0u8; 8];
        prefix.copy_from_slice(&digest[..8]);
        Self(u64::from_be_bytes(prefix))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// True for finite coordinates inside the WGS-84 range.
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }

    pub fn clamped_to_mercator(self) -> Self {
        Self {
            lat: self.lat.clamp(-MAX_MERCATOR_LAT, MAX_MERCATOR_LAT),
            lng: wrap_longitude(self.lng),
        }
    }
}

pub fn wrap_longitude(lng: f64) -> f64 {
    if (-180.0..=180.0).contains(&lng) {
        return lng;
    }
    (lng + 180.0).rem_euclid(360.0) - 180.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointRecord {
    pub id: MarkerId,
    pub name: String,
    pub height: f64,
    pub meaning: String,
    pub position: LatLng,
}

impl PointRecord {
    pub fn new(
        name: impl Into<String>,
        height: f64,
        meaning: impl Into<String>,
        position: LatLng,
    ) -> Self {
        let name = name.into();
        let meaning: String = meaning.into();
        Self {
            id: MarkerId::for_record(&name, height, &meaning, position),
            name,
            height,
            meaning,
            position,
        }
    }

    /// Height as shown in the popup. Whole metres print without a fraction;
    /// other values keep every digit the provider sent.
    pub fn height_label(&self) -> String {
        self.height.to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewportState {
    pub center: LatLng,
    pub zoom: u8,
}

impl ViewportState {
    pub const fn overview() -> Self {
        Self {
            center: DEFAULT_CENTER,
            zoom: OVERVIEW_ZOOM,
        }
    }

    pub fn focused_on(record: &PointRecord) -> Self {
        Self {
            center: record.position,
            zoom: FOCUSED_ZOOM,
        }
    }
}

impl Default for ViewportState {
    fn default() -> Self {
        Self::overview()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MapVariant {
    /// Markers and popups only; clicks never move the map.
    Static,
    /// Clicking a marker flies the map to it.
    #[default]
    Interactive,
}

impl MapVariant {
    pub fn label(self) -> &'static str {
        match self {
            Self::Static => "static",
            Self::Interactive => "interactive",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "static" | "start" => Some(Self::Static),
            "interactive" | "end" => Some(Self::Interactive),
            _ => None,
        }
    }
}
