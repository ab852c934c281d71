//! The in-memory weather dataset: station records indexed by month, with
//! month/year listings and a few whole-dataset summaries.

use crate::dataset::error::DatasetError;
use crate::types::month_key::MonthKey;
use crate::types::station::StationRecord;
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

/// Summary block written by the preprocessing step. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DatasetMetadata {
    #[serde(default)]
    pub total_months: Option<usize>,
    #[serde(default)]
    pub date_range: Option<MetadataDateRange>,
    #[serde(default)]
    pub total_records: Option<usize>,
    #[serde(default)]
    pub unique_stations: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetadataDateRange {
    pub start: Option<String>,
    pub end: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ValueRange {
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MonthRange {
    pub start: MonthKey,
    pub end: MonthKey,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct YearRange {
    pub min: i32,
    pub max: i32,
}

/// Whole-dataset summary, used for legends and colour scales.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetStats {
    pub total_records: usize,
    pub total_months: usize,
    pub month_range: MonthRange,
    pub year_range: YearRange,
    /// `None` when no record has a valid temperature.
    pub temperature_range: Option<ValueRange>,
    /// `None` when no record has a valid precipitation.
    pub precipitation_range: Option<ValueRange>,
}

/// Twelve monthly readings of one station for one year, as shown in the
/// station detail charts. Index 0 is January.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StationYearSeries {
    pub name: String,
    pub year: i32,
    pub temperature: [Option<f64>; 12],
    pub precipitation: [Option<f64>; 12],
}

#[derive(Deserialize)]
struct DatasetFile {
    #[serde(default)]
    metadata: Option<DatasetMetadata>,
    data: BTreeMap<String, Vec<StationRecord>>,
}

/// Station records grouped by month, loaded once and never mutated.
#[derive(Debug, Clone, Default)]
pub struct WeatherDataset {
    metadata: DatasetMetadata,
    months: Vec<MonthKey>,
    records: BTreeMap<MonthKey, Vec<Arc<StationRecord>>>,
}

impl WeatherDataset {
    /// Parses a dataset body `{ "metadata": {...}, "data": { "YYYY-MM": [...] } }`.
    ///
    /// A malformed body or month key fails the whole load; there is no partial dataset.
    pub fn from_json(bytes: &[u8]) -> Result<Self, DatasetError> {
        let file: DatasetFile = serde_json::from_slice(bytes)?;
        let mut records = BTreeMap::new();
        for (raw_key, month_records) in file.data {
            let key: MonthKey = raw_key.parse()?;
            records.insert(key, month_records.into_iter().map(Arc::new).collect());
        }
        Ok(Self::from_parts(file.metadata.unwrap_or_default(), records))
    }

    /// Builds a dataset from in-memory records. Repeated months are concatenated.
    pub fn from_records(data: impl IntoIterator<Item = (MonthKey, Vec<StationRecord>)>) -> Self {
        let mut records: BTreeMap<MonthKey, Vec<Arc<StationRecord>>> = BTreeMap::new();
        for (key, month_records) in data {
            records
                .entry(key)
                .or_default()
                .extend(month_records.into_iter().map(Arc::new));
        }
        Self::from_parts(DatasetMetadata::default(), records)
    }

    fn from_parts(
        metadata: DatasetMetadata,
        records: BTreeMap<MonthKey, Vec<Arc<StationRecord>>>,
    ) -> Self {
        let months = records.keys().copied().collect();
        Self {
            metadata,
            months,
            records,
        }
    }

    pub fn metadata(&self) -> &DatasetMetadata {
        &self.metadata
    }

    pub fn is_empty(&self) -> bool {
        self.months.is_empty()
    }

    /// Available months in ascending order.
    pub fn months(&self) -> &[MonthKey] {
        &self.months
    }

    /// Available years in ascending order, without duplicates.
    pub fn years(&self) -> Vec<i32> {
        self.months
            .iter()
            .map(|m| m.year())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn month_at(&self, index: usize) -> Option<MonthKey> {
        self.months.get(index).copied()
    }

    pub fn index_of(&self, month: MonthKey) -> Option<usize> {
        self.months.binary_search(&month).ok()
    }

    /// Index of the earliest available month in `year`.
    pub fn first_month_of_year(&self, year: i32) -> Option<usize> {
        let index = self.months.partition_point(|m| m.year() < year);
        self.months
            .get(index)
            .filter(|m| m.year() == year)
            .map(|_| index)
    }

    /// Records of one month in source order. Unknown months yield an empty slice.
    pub fn records(&self, month: MonthKey) -> &[Arc<StationRecord>] {
        self.records
            .get(&month)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// All records of every month in `year`, month by month.
    pub fn records_for_year(&self, year: i32) -> Vec<Arc<StationRecord>> {
        self.records
            .iter()
            .filter(|(month, _)| month.year() == year)
            .flat_map(|(_, records)| records.iter().cloned())
            .collect()
    }

    /// The first record named `name` in each month of `year`.
    pub fn station_year_series(&self, name: &str, year: i32) -> StationYearSeries {
        let mut series = StationYearSeries {
            name: name.to_string(),
            year,
            temperature: [None; 12],
            precipitation: [None; 12],
        };
        for (slot, month) in (1..=12u32).enumerate() {
            let Some(key) = MonthKey::new(year, month) else {
                continue;
            };
            if let Some(record) = self.records(key).iter().find(|r| r.name == name) {
                series.temperature[slot] = record.temperature;
                series.precipitation[slot] = record.precipitation;
            }
        }
        series
    }

    /// `None` for an empty dataset.
    pub fn stats(&self) -> Option<DatasetStats> {
        let (&first, &last) = (self.months.first()?, self.months.last()?);
        let counted: usize = self.records.values().map(Vec::len).sum();
        let all_records = || self.records.values().flatten();

        Some(DatasetStats {
            total_records: self.metadata.total_records.unwrap_or(counted),
            total_months: self.months.len(),
            month_range: MonthRange {
                start: first,
                end: last,
            },
            year_range: YearRange {
                min: first.year(),
                max: last.year(),
            },
            temperature_range: value_range(all_records().filter_map(|r| r.temperature)),
            precipitation_range: value_range(all_records().filter_map(|r| r.precipitation)),
        })
    }
}

fn value_range(values: impl Iterator<Item = f64>) -> Option<ValueRange> {
    let (min, max) = values
        .filter(|v| !v.is_nan())
        .map(OrderedFloat)
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })?;
    Some(ValueRange {
        min: min.into_inner(),
        max: max.into_inner(),
    })
}
