//! Blends two aggregates (or two sets of point features) at a given progress.
//!
//! Three policies apply depending on where a province is present:
//! - in both: numeric values are interpolated linearly, membership steps at [`STEP_POINT`];
//! - only in the source: values are held until [`DISAPPEAR_THRESHOLD`], then dropped;
//! - only in the target: values are hidden until [`APPEAR_THRESHOLD`], then shown.
//!
//! The dead zones keep regions from flickering while the renderer's own
//! opacity fade is still close to zero.

use crate::types::coord::CoordKey;
use crate::types::point_feature::PointFeature;
use crate::types::province_stats::{
    BlendedAggregate, BlendedProvince, ProvinceAggregate, ProvinceStats, TransitionDirection,
};
use std::collections::{BTreeSet, HashMap};

/// Progress at which stepped values switch from the source to the target.
pub const STEP_POINT: f64 = 0.5;
/// Appearing values stay hidden while progress is below this.
pub const APPEAR_THRESHOLD: f64 = 0.2;
/// Disappearing values stay visible while progress is at or below this.
pub const DISAPPEAR_THRESHOLD: f64 = 0.8;

/// Clamps into `[0, 1]`, mapping NaN to 0.
pub fn clamp_progress(progress: f64) -> f64 {
    if progress.is_nan() {
        0.0
    } else {
        progress.clamp(0.0, 1.0)
    }
}

/// Written as `a * (1 - t) + b * t` so that `t = 0` gives `a` and `t = 1` gives `b` exactly.
pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a * (1.0 - t) + b * t
}

fn blend_value(from: Option<f64>, to: Option<f64>, t: f64) -> Option<f64> {
    match (from, to) {
        (Some(a), Some(b)) => Some(lerp(a, b, t)),
        _ if t < STEP_POINT => from,
        _ => to,
    }
}

fn fade_out(value: Option<f64>, t: f64) -> Option<f64> {
    value.filter(|_| t <= DISAPPEAR_THRESHOLD)
}

fn fade_in(value: Option<f64>, t: f64) -> Option<f64> {
    value.filter(|_| t >= APPEAR_THRESHOLD)
}

fn blend_stable(from: &ProvinceStats, to: &ProvinceStats, t: f64) -> ProvinceStats {
    let members = if t < STEP_POINT { from } else { to };
    ProvinceStats {
        avg_temperature: blend_value(from.avg_temperature, to.avg_temperature, t),
        max_temperature: blend_value(from.max_temperature, to.max_temperature, t),
        min_temperature: blend_value(from.min_temperature, to.min_temperature, t),
        avg_precipitation: blend_value(from.avg_precipitation, to.avg_precipitation, t),
        max_precipitation: blend_value(from.max_precipitation, to.max_precipitation, t),
        min_precipitation: blend_value(from.min_precipitation, to.min_precipitation, t),
        station_count: members.station_count,
        stations: members.stations.clone(),
        coordinates: members.coordinates.clone(),
    }
}

fn scaled_count(count: usize, factor: f64) -> usize {
    (count as f64 * factor).floor() as usize
}

/// Blends `from` into `to` at `progress` over the union of their provinces.
///
/// Station counts of appearing and disappearing provinces are scaled with
/// progress, so they no longer equal the length of `stations`.
pub fn interpolate(
    from: &ProvinceAggregate,
    to: &ProvinceAggregate,
    progress: f64,
) -> BlendedAggregate {
    let t = clamp_progress(progress);
    let provinces: BTreeSet<&String> = from.keys().chain(to.keys()).collect();

    provinces
        .into_iter()
        .filter_map(|province| {
            let blended = match (from.get(province), to.get(province)) {
                (Some(a), Some(b)) => BlendedProvince::settled(blend_stable(a, b, t)),
                (Some(a), None) => {
                    let mut stats = a.map_values(|v| fade_out(v, t));
                    stats.station_count = scaled_count(a.station_count, 1.0 - t);
                    BlendedProvince {
                        stats,
                        direction: TransitionDirection::Disappearing,
                        transition_progress: Some(t),
                    }
                }
                (None, Some(b)) => {
                    let mut stats = b.map_values(|v| fade_in(v, t));
                    stats.station_count = scaled_count(b.station_count, t);
                    BlendedProvince {
                        stats,
                        direction: TransitionDirection::Appearing,
                        transition_progress: Some(t),
                    }
                }
                (None, None) => return None,
            };
            Some((province.clone(), blended))
        })
        .collect()
}

/// Blends point features, matching stations by name and quantized coordinate.
///
/// Features present in both sets are interpolated, the others follow the same
/// dead zones as provinces. A feature whose blended value is missing is left out.
/// Source order is kept, followed by appearing features in target order.
pub fn interpolate_points(
    from: &[PointFeature],
    to: &[PointFeature],
    progress: f64,
) -> Vec<PointFeature> {
    let t = clamp_progress(progress);
    let mut targets: HashMap<(&str, CoordKey), &PointFeature> = HashMap::new();
    for feature in to {
        targets.entry(feature.key()).or_insert(feature);
    }

    let mut matched = BTreeSet::new();
    let mut blended = Vec::with_capacity(from.len().max(to.len()));
    for source in from {
        let key = source.key();
        match targets.get(&key) {
            Some(target) => {
                matched.insert(key);
                blended.push(PointFeature {
                    coordinates: target.coordinates,
                    value: lerp(source.value, target.value, t),
                    station_name: target.station_name.clone(),
                    temperature: blend_value(source.temperature, target.temperature, t),
                    precipitation: blend_value(source.precipitation, target.precipitation, t),
                });
            }
            None if t <= DISAPPEAR_THRESHOLD => blended.push(source.clone()),
            None => {}
        }
    }

    if t >= APPEAR_THRESHOLD {
        blended.extend(
            to.iter()
                .filter(|target| !matched.contains(&target.key()))
                .cloned(),
        );
    }
    blended
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::station::StationRecord;
    use std::sync::Arc;

    fn stats(temperature: f64, count: usize) -> ProvinceStats {
        let stations: Vec<Arc<StationRecord>> = (0..count)
            .map(|i| {
                Arc::new(StationRecord::new(
                    format!("s{i}"),
                    i as f64,
                    i as f64,
                    Some(temperature),
                    None,
                ))
            })
            .collect();
        ProvinceStats {
            avg_temperature: Some(temperature),
            max_temperature: Some(temperature + 1.0),
            min_temperature: Some(temperature - 1.0),
            avg_precipitation: None,
            max_precipitation: None,
            min_precipitation: None,
            station_count: count,
            coordinates: stations.iter().map(|s| s.coordinates()).collect(),
            stations,
        }
    }

    fn aggregate(entries: &[(&str, ProvinceStats)]) -> ProvinceAggregate {
        entries
            .iter()
            .map(|(name, stats)| (name.to_string(), stats.clone()))
            .collect()
    }

    #[test]
    fn test_endpoints_reproduce_stable_values_exactly() {
        let from = aggregate(&[("广东", stats(0.1, 3))]);
        let to = aggregate(&[("广东", stats(0.7, 5))]);

        let start = interpolate(&from, &to, 0.0);
        assert_eq!(start["广东"].stats, from["广东"]);
        assert_eq!(start["广东"].direction, TransitionDirection::Stable);

        let end = interpolate(&from, &to, 1.0);
        assert_eq!(end["广东"].stats, to["广东"]);
    }

    #[test]
    fn test_stable_values_are_interpolated_and_members_step() {
        let from = aggregate(&[("广东", stats(10.0, 2))]);
        let to = aggregate(&[("广东", stats(20.0, 4))]);

        let quarter = interpolate(&from, &to, 0.25);
        assert_eq!(quarter["广东"].stats.avg_temperature, Some(12.5));
        assert_eq!(quarter["广东"].stats.station_count, 2);
        assert_eq!(quarter["广东"].transition_progress, None);

        let half = interpolate(&from, &to, 0.5);
        assert_eq!(half["广东"].stats.station_count, 4);
        assert_eq!(half["广东"].stats.stations.len(), 4);
    }

    #[test]
    fn test_stable_value_missing_on_one_side_steps() {
        let mut a = stats(10.0, 1);
        a.avg_precipitation = Some(3.0);
        let b = stats(20.0, 1);
        let from = aggregate(&[("广东", a)]);
        let to = aggregate(&[("广东", b)]);

        assert_eq!(interpolate(&from, &to, 0.49)["广东"].stats.avg_precipitation, Some(3.0));
        assert_eq!(interpolate(&from, &to, 0.5)["广东"].stats.avg_precipitation, None);
    }

    #[test]
    fn test_disappearing_dead_zone() {
        let from = aggregate(&[("西藏", stats(20.0, 4))]);
        let to = ProvinceAggregate::new();

        let half = interpolate(&from, &to, 0.5);
        let tibet = &half["西藏"];
        assert_eq!(tibet.stats.avg_temperature, Some(20.0));
        assert_eq!(tibet.stats.station_count, 2);
        assert!(tibet.is_transitioning_out());
        assert_eq!(tibet.transition_progress, Some(0.5));

        assert_eq!(interpolate(&from, &to, 0.8)["西藏"].stats.avg_temperature, Some(20.0));
        let late = interpolate(&from, &to, 0.81);
        assert_eq!(late["西藏"].stats.avg_temperature, None);
        assert_eq!(late["西藏"].stats.min_temperature, None);
    }

    #[test]
    fn test_appearing_dead_zone() {
        let from = ProvinceAggregate::new();
        let to = aggregate(&[("青海", stats(10.0, 4))]);

        let early = interpolate(&from, &to, 0.19);
        assert_eq!(early["青海"].stats.avg_temperature, None);
        assert!(early["青海"].is_transitioning_in());

        let later = interpolate(&from, &to, 0.21);
        assert_eq!(later["青海"].stats.avg_temperature, Some(10.0));

        assert_eq!(interpolate(&from, &to, 0.5)["青海"].stats.station_count, 2);
    }

    #[test]
    fn test_progress_is_clamped() {
        let from = aggregate(&[("广东", stats(10.0, 1))]);
        let to = aggregate(&[("广东", stats(20.0, 1))]);
        assert_eq!(interpolate(&from, &to, -1.0)["广东"].stats, from["广东"]);
        assert_eq!(interpolate(&from, &to, 2.0)["广东"].stats, to["广东"]);
        assert_eq!(interpolate(&from, &to, f64::NAN)["广东"].stats, from["广东"]);
    }

    fn point(name: &str, at: f64, value: f64) -> PointFeature {
        PointFeature {
            coordinates: [at, at],
            value,
            station_name: name.to_string(),
            temperature: Some(value),
            precipitation: None,
        }
    }

    #[test]
    fn test_points_match_by_name_and_coordinate() {
        let from = vec![point("a", 1.0, 10.0), point("gone", 2.0, 5.0)];
        let to = vec![point("new", 3.0, 7.0), point("a", 1.0, 20.0)];

        let half = interpolate_points(&from, &to, 0.5);
        let names: Vec<&str> = half.iter().map(|p| p.station_name.as_str()).collect();
        assert_eq!(names, ["a", "gone", "new"]);
        assert_eq!(half[0].value, 15.0);

        let early: Vec<String> = interpolate_points(&from, &to, 0.1)
            .into_iter()
            .map(|p| p.station_name)
            .collect();
        assert_eq!(early, ["a", "gone"]);

        let late: Vec<String> = interpolate_points(&from, &to, 0.9)
            .into_iter()
            .map(|p| p.station_name)
            .collect();
        assert_eq!(late, ["a", "new"]);
    }

    #[test]
    fn test_same_name_elsewhere_is_a_different_station() {
        let from = vec![point("a", 1.0, 10.0)];
        let to = vec![point("a", 9.0, 20.0)];
        let done = interpolate_points(&from, &to, 1.0);
        assert_eq!(done, vec![point("a", 9.0, 20.0)]);
    }
}
