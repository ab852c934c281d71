pub mod region_aggregator;
pub mod statistics;
