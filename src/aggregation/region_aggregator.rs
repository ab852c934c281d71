//! Groups one month of station records into per-province statistics, and turns
//! records into point features for the map.

use crate::aggregation::statistics::summarize;
use crate::provinces::resolver::ProvinceResolver;
use crate::types::metric::Metric;
use crate::types::point_feature::PointFeature;
use crate::types::province_stats::{ProvinceAggregate, ProvinceStats};
use crate::types::station::StationRecord;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Aggregates `records` by province for the selected `metric`.
///
/// Records without a value for `metric` are skipped entirely, so they neither
/// count as stations nor contribute their other value. Each remaining record
/// is attributed to a province by `resolver` (which caches the answer).
///
/// Provinces are only present when at least one record contributed. An empty
/// slice yields an empty aggregate.
pub fn aggregate(
    records: &[Arc<StationRecord>],
    metric: Metric,
    resolver: &mut ProvinceResolver,
) -> ProvinceAggregate {
    let mut buckets: BTreeMap<String, Vec<Arc<StationRecord>>> = BTreeMap::new();
    for record in records {
        if metric.value_of(record).is_none() {
            continue;
        }
        let province = resolver.resolve(record.lat, record.lng);
        buckets.entry(province).or_default().push(Arc::clone(record));
    }

    buckets
        .into_iter()
        .map(|(province, stations)| (province, province_stats(stations)))
        .collect()
}

fn province_stats(stations: Vec<Arc<StationRecord>>) -> ProvinceStats {
    let temperature = summarize(stations.iter().map(|s| s.temperature));
    let precipitation = summarize(stations.iter().map(|s| s.precipitation));
    let coordinates = stations.iter().map(|s| s.coordinates()).collect();

    ProvinceStats {
        avg_temperature: temperature.map(|s| s.avg),
        max_temperature: temperature.map(|s| s.max),
        min_temperature: temperature.map(|s| s.min),
        avg_precipitation: precipitation.map(|s| s.avg),
        max_precipitation: precipitation.map(|s| s.max),
        min_precipitation: precipitation.map(|s| s.min),
        station_count: stations.len(),
        stations,
        coordinates,
    }
}

/// Point features for every record with a value for `metric`, in record order.
pub fn point_features(records: &[Arc<StationRecord>], metric: Metric) -> Vec<PointFeature> {
    records
        .iter()
        .filter_map(|record| PointFeature::from_record(record, metric))
        .collect()
}
