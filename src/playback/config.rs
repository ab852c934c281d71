use crate::transition::easing::Easing;
use crate::types::metric::Metric;
use bon::Builder;
use std::time::Duration;

/// Timing and display settings for a playback session.
///
/// ```rust
/// # use province_weather::{Easing, Metric, PlaybackConfig};
/// # use std::time::Duration;
/// let config = PlaybackConfig::builder()
///     .tick_period(Duration::from_millis(1500))
///     .metric(Metric::Precipitation)
///     .build();
/// assert_eq!(config.transition_duration, Duration::from_millis(600));
/// assert_eq!(config.easing, Easing::QuadraticInOut);
/// ```
#[derive(Debug, Clone, PartialEq, Builder)]
pub struct PlaybackConfig {
    /// Time between two months while playing.
    #[builder(default = Duration::from_secs(1))]
    pub tick_period: Duration,
    /// Length of one month-to-month transition.
    #[builder(default = Duration::from_millis(600))]
    pub transition_duration: Duration,
    /// Minimum time between two transition frames.
    #[builder(default = Duration::from_millis(16))]
    pub frame_interval: Duration,
    #[builder(default)]
    pub easing: Easing,
    /// Metric shown when the session starts.
    #[builder(default)]
    pub metric: Metric,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}
