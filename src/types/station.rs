//! Defines the record representing one weather station's reading for one month,
//! as found in the pre-baked dataset file.

use crate::types::coord::CoordKey;
use serde::{Deserialize, Serialize};

// --- Data Structures ---

/// A single station reading for a single month.
///
/// Records are immutable once loaded. The dataset hands them out as
/// `Arc<StationRecord>` so aggregates and features reference them rather than
/// copying them.
///
/// Station names are not guaranteed to be unique across provinces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationRecord {
    /// Human readable station name.
    pub name: String,
    /// Latitude in WGS84 decimal degrees.
    pub lat: f64,
    /// Longitude in WGS84 decimal degrees.
    pub lng: f64,
    /// Monthly mean temperature in °C, if reported.
    #[serde(default)]
    pub temperature: Option<f64>,
    /// Monthly precipitation in mm (non-negative), if reported.
    #[serde(default)]
    pub precipitation: Option<f64>,
    /// Source station identifier, present when the preprocessing step emitted it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub station_id: Option<String>,
}

impl StationRecord {
    /// Creates a record without a source station identifier.
    pub fn new(
        name: impl Into<String>,
        lat: f64,
        lng: f64,
        temperature: Option<f64>,
        precipitation: Option<f64>,
    ) -> Self {
        Self {
            name: name.into(),
            lat,
            lng,
            temperature,
            precipitation,
            station_id: None,
        }
    }

    /// The station position as a GeoJSON-ordered `[lng, lat]` pair.
    pub fn coordinates(&self) -> [f64; 2] {
        [self.lng, self.lat]
    }

    /// The quantized coordinate key used for caching and matching stations.
    pub fn coord_key(&self) -> CoordKey {
        CoordKey::new(self.lat, self.lng)
    }
}
