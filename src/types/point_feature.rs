use crate::types::coord::CoordKey;
use crate::types::metric::Metric;
use crate::types::station::StationRecord;
use serde::Serialize;

/// One station drawn as a point on the map.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PointFeature {
    /// `[lng, lat]`.
    pub coordinates: [f64; 2],
    /// The selected metric's value.
    pub value: f64,
    pub station_name: String,
    pub temperature: Option<f64>,
    pub precipitation: Option<f64>,
}

impl PointFeature {
    /// Returns `None` when the record has no value for `metric`.
    pub fn from_record(record: &StationRecord, metric: Metric) -> Option<Self> {
        let value = metric.value_of(record)?;
        Some(Self {
            coordinates: record.coordinates(),
            value,
            station_name: record.name.clone(),
            temperature: record.temperature,
            precipitation: record.precipitation,
        })
    }

    /// Identity of the station behind this feature across months.
    pub fn key(&self) -> (&str, CoordKey) {
        (
            self.station_name.as_str(),
            CoordKey::new(self.coordinates[1], self.coordinates[0]),
        )
    }
}
