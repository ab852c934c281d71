pub mod coord;
pub mod metric;
pub mod month_key;
pub mod point_feature;
pub mod province_stats;
pub mod station;
