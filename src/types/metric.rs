//! Defines the weather variable selected for display and aggregation.

use crate::types::station::StationRecord;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The weather variable currently being visualized.
///
/// The selected metric decides which records take part in an aggregation pass:
/// a record whose value for the selected metric is missing is skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    /// Monthly mean temperature in °C.
    #[default]
    Temperature,
    /// Monthly precipitation in mm.
    Precipitation,
}

impl Metric {
    /// Reads this metric's value from a record.
    pub fn value_of(self, record: &StationRecord) -> Option<f64> {
        match self {
            Metric::Temperature => record.temperature,
            Metric::Precipitation => record.precipitation,
        }
    }

    pub fn unit(self) -> &'static str {
        match self {
            Metric::Temperature => "°C",
            Metric::Precipitation => "mm",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Metric::Temperature => "temperature",
            Metric::Precipitation => "precipitation",
        };
        write!(f, "{}", s)
    }
}
