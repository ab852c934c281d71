mod aggregation;
mod atlas;
mod dataset;
mod error;
mod geometry;
mod playback;
mod provinces;
mod source;
mod transition;
mod types;

pub use atlas::*;
pub use error::AtlasError;

pub use geometry::point_in_polygon::*;

pub use provinces::boundary::{
    BoundarySet, ProvinceBoundary, ProvinceLocator, DEFAULT_NAME_PROPERTY,
};
pub use provinces::names::{to_long_name, to_short_name, PROVINCE_NAMES};
pub use provinces::resolver::ProvinceResolver;

pub use dataset::weather_dataset::*;

pub use aggregation::region_aggregator::{aggregate, point_features};
pub use aggregation::statistics::{summarize, Summary};

pub use transition::easing::Easing;
pub use transition::interpolator::{
    clamp_progress, interpolate, interpolate_points, lerp, APPEAR_THRESHOLD, DISAPPEAR_THRESHOLD,
    STEP_POINT,
};
pub use transition::task::{spawn_transition, TransitionEvent, TransitionHandle, TransitionId};

pub use playback::config::PlaybackConfig;
pub use playback::controller::*;
pub use playback::runner::{spawn_playback, PlaybackCommand, PlaybackHandle};

pub use source::fetcher::{DataSource, SourceFetcher};
pub use source::progress::{LoadProgress, ProgressSender};

pub use types::coord::CoordKey;
pub use types::metric::Metric;
pub use types::month_key::{MonthKey, ParseMonthKeyError};
pub use types::point_feature::PointFeature;
pub use types::province_stats::*;
pub use types::station::StationRecord;

pub use dataset::error::DatasetError;
pub use playback::error::PlaybackStopped;
pub use provinces::error::BoundaryError;
pub use source::error::SourceError;
