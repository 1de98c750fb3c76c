use serde::{Deserialize, Serialize};

use crate::{
    domain::{LatLng, PointRecord},
    error::RecordRejection,
};

/// One element of the provider's `/munros` array. Extra fields the provider
/// sends (region, grid reference, ...) are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MunroPayload {
    pub name: String,
    pub height: f64,
    pub meaning: String,
    pub latlng_lat: f64,
    pub latlng_lng: f64,
}

impl MunroPayload {
    pub fn position(&self) -> LatLng {
        LatLng::new(self.latlng_lat, self.latlng_lng)
    }

    /// Validates the payload found at `index` of the response array.
    pub fn into_record(self, index: usize) -> Result<PointRecord, RecordRejection> {
        let position = self.position();
        if !position.is_valid() {
            return Err(RecordRejection::InvalidCoordinate {
                index,
                name: self.name,
                lat: self.latlng_lat,
                lng: self.latlng_lng,
            });
        }
        if !self.height.is_finite() {
            return Err(RecordRejection::InvalidHeight {
                index,
                name: self.name,
            });
        }
        Ok(PointRecord::new(self.name, self.height, self.meaning, position))
    }
}
