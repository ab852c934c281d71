//! Per-province aggregation results and their transition-blended counterparts.

use crate::types::station::StationRecord;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Province assigned to a coordinate that lies outside every known boundary,
/// or to every coordinate while no boundary data is available.
pub const UNKNOWN_PROVINCE: &str = "未知";

/// Aggregated statistics keyed by short-form province name.
pub type ProvinceAggregate = BTreeMap<String, ProvinceStats>;

/// Transition-blended statistics keyed by short-form province name.
pub type BlendedAggregate = BTreeMap<String, BlendedProvince>;

/// Summary of one province for one month and one metric.
///
/// Temperature fields are derived only from contributing stations with a valid
/// temperature, and precipitation fields only from stations with a valid
/// precipitation. A station missing one value still counts towards the other.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProvinceStats {
    pub avg_temperature: Option<f64>,
    pub max_temperature: Option<f64>,
    pub min_temperature: Option<f64>,
    pub avg_precipitation: Option<f64>,
    pub max_precipitation: Option<f64>,
    pub min_precipitation: Option<f64>,
    /// Equal to `stations.len()` for aggregation results.
    pub station_count: usize,
    pub stations: Vec<Arc<StationRecord>>,
    /// `[lng, lat]` pairs parallel to `stations`.
    pub coordinates: Vec<[f64; 2]>,
}

impl ProvinceStats {
    /// Applies `f` to every numeric statistic, keeping the station membership.
    pub fn map_values(&self, f: impl Fn(Option<f64>) -> Option<f64>) -> ProvinceStats {
        ProvinceStats {
            avg_temperature: f(self.avg_temperature),
            max_temperature: f(self.max_temperature),
            min_temperature: f(self.min_temperature),
            avg_precipitation: f(self.avg_precipitation),
            max_precipitation: f(self.max_precipitation),
            min_precipitation: f(self.min_precipitation),
            station_count: self.station_count,
            stations: self.stations.clone(),
            coordinates: self.coordinates.clone(),
        }
    }
}

/// How a province takes part in a month-to-month transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TransitionDirection {
    /// Present in both the source and the target month.
    Stable,
    /// Present only in the target month.
    Appearing,
    /// Present only in the source month.
    Disappearing,
}

/// Province statistics as handed to the renderer, possibly mid-transition.
///
/// Serializes flat, with `isTransitioningIn`/`isTransitioningOut` flags next to
/// `direction`.
#[derive(Debug, Clone, PartialEq)]
pub struct BlendedProvince {
    pub stats: ProvinceStats,
    pub direction: TransitionDirection,
    /// Set for appearing and disappearing provinces so the renderer can fade them.
    pub transition_progress: Option<f64>,
}

impl BlendedProvince {
    /// Wraps exact statistics outside of any transition.
    pub fn settled(stats: ProvinceStats) -> Self {
        Self {
            stats,
            direction: TransitionDirection::Stable,
            transition_progress: None,
        }
    }

    pub fn is_transitioning_in(&self) -> bool {
        self.direction == TransitionDirection::Appearing
    }

    pub fn is_transitioning_out(&self) -> bool {
        self.direction == TransitionDirection::Disappearing
    }
}

impl Serialize for BlendedProvince {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct Wire<'a> {
            #[serde(flatten)]
            stats: &'a ProvinceStats,
            direction: TransitionDirection,
            is_transitioning_in: bool,
            is_transitioning_out: bool,
            #[serde(skip_serializing_if = "Option::is_none")]
            transition_progress: Option<f64>,
        }

        Wire {
            stats: &self.stats,
            direction: self.direction,
            is_transitioning_in: self.is_transitioning_in(),
            is_transitioning_out: self.is_transitioning_out(),
            transition_progress: self.transition_progress,
        }
        .serialize(serializer)
    }
}
