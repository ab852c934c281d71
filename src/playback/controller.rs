//! The playback state machine: which month is shown, whether playback is
//! running, and the month-to-month transition in flight.
//!
//! The controller never looks at a clock. Ticks, transition progress and
//! completion are fed in from outside (see [`crate::playback::runner`]), which
//! keeps every state change synchronous and easy to test.

use crate::aggregation::region_aggregator::{aggregate, point_features};
use crate::dataset::weather_dataset::WeatherDataset;
use crate::provinces::boundary::ProvinceLocator;
use crate::provinces::resolver::ProvinceResolver;
use crate::transition::interpolator::{clamp_progress, interpolate, interpolate_points};
use crate::transition::task::TransitionId;
use crate::types::metric::Metric;
use crate::types::month_key::MonthKey;
use crate::types::point_feature::PointFeature;
use crate::types::province_stats::{BlendedAggregate, BlendedProvince, ProvinceAggregate};
use crate::types::station::StationRecord;
use log::{debug, info};
use serde::Serialize;
use std::sync::Arc;

/// Observable playback state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackState {
    /// Nothing has been played yet.
    Idle,
    Playing,
    Paused,
    /// A transition is running. Playback may or may not continue afterwards.
    Transitioning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Idle,
    Playing,
    Paused,
}

/// What an accepted tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The next month was precomputed; a transition towards it started.
    TransitionStarted(TransitionId),
    /// The next month was not ready; it is now shown without a transition.
    Snapped(usize),
}

#[derive(Debug)]
struct MonthView {
    index: usize,
    aggregate: ProvinceAggregate,
    points: Vec<PointFeature>,
}

#[derive(Debug)]
struct ActiveTransition {
    id: TransitionId,
    from: ProvinceAggregate,
    from_points: Vec<PointFeature>,
    to: MonthView,
    progress: f64,
    provinces: BlendedAggregate,
    points: Vec<PointFeature>,
}

/// Everything the renderer needs to draw one frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackFrame {
    /// The committed month. During a transition this is still the source month.
    pub month: MonthKey,
    pub month_index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_month: Option<MonthKey>,
    pub metric: Metric,
    pub state: PlaybackState,
    /// Eased transition progress, absent outside of a transition.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<f64>,
    pub provinces: BlendedAggregate,
    pub points: Vec<PointFeature>,
}

/// Owns a dataset session: the resolver cache, the live aggregate, the
/// precomputed next month and the active transition.
#[derive(Debug)]
pub struct PlaybackController {
    dataset: Arc<WeatherDataset>,
    resolver: ProvinceResolver,
    metric: Metric,
    mode: Mode,
    current: MonthView,
    scheduled: Option<usize>,
    precomputed: Option<MonthView>,
    transition: Option<ActiveTransition>,
    next_transition_id: u64,
}

impl PlaybackController {
    /// Starts idle on the first available month.
    pub fn new(dataset: Arc<WeatherDataset>, resolver: ProvinceResolver, metric: Metric) -> Self {
        let mut controller = Self {
            dataset,
            resolver,
            metric,
            mode: Mode::Idle,
            current: MonthView {
                index: 0,
                aggregate: ProvinceAggregate::new(),
                points: Vec::new(),
            },
            scheduled: None,
            precomputed: None,
            transition: None,
            next_transition_id: 0,
        };
        controller.current = controller.compute(0);
        controller
    }

    pub fn state(&self) -> PlaybackState {
        if self.transition.is_some() {
            return PlaybackState::Transitioning;
        }
        match self.mode {
            Mode::Idle => PlaybackState::Idle,
            Mode::Playing => PlaybackState::Playing,
            Mode::Paused => PlaybackState::Paused,
        }
    }

    /// Whether the ticker should be running, including while a transition plays.
    pub fn is_playing(&self) -> bool {
        self.mode == Mode::Playing
    }

    pub fn dataset(&self) -> &Arc<WeatherDataset> {
        &self.dataset
    }

    pub fn resolver(&self) -> &ProvinceResolver {
        &self.resolver
    }

    pub fn metric(&self) -> Metric {
        self.metric
    }

    pub fn current_index(&self) -> usize {
        self.current.index
    }

    /// `None` for an empty dataset.
    pub fn current_month(&self) -> Option<MonthKey> {
        self.dataset.month_at(self.current.index)
    }

    /// Exact aggregate of the committed month.
    pub fn live_aggregate(&self) -> &ProvinceAggregate {
        &self.current.aggregate
    }

    pub fn active_transition(&self) -> Option<TransitionId> {
        self.transition.as_ref().map(|t| t.id)
    }

    pub fn transition_progress(&self) -> Option<f64> {
        self.transition.as_ref().map(|t| t.progress)
    }

    /// Blended provinces of the active transition.
    pub fn blended(&self) -> Option<&BlendedAggregate> {
        self.transition.as_ref().map(|t| &t.provinces)
    }

    /// Index of the month waiting to be precomputed.
    pub fn scheduled_precompute(&self) -> Option<usize> {
        self.scheduled
    }

    /// Index of the month whose aggregate is ready for the next tick.
    pub fn precomputed_index(&self) -> Option<usize> {
        self.precomputed.as_ref().map(|p| p.index)
    }

    /// Starts playback. Ignored for an empty dataset or when already playing.
    pub fn play(&mut self) -> bool {
        if self.dataset.is_empty() {
            debug!("Ignoring play request: no months available");
            return false;
        }
        if self.mode == Mode::Playing {
            return false;
        }
        self.mode = Mode::Playing;
        // A running seek transition schedules its successor on completion.
        if self.transition.is_none() && self.precomputed_index() != Some(self.next_index()) {
            self.scheduled = Some(self.next_index());
        }
        info!("Playback started at index {}", self.current.index);
        true
    }

    /// Advances to the next month, wrapping after the last one.
    ///
    /// Ignored unless playing with no transition in flight. Returns `None` when ignored.
    pub fn tick(&mut self) -> Option<TickOutcome> {
        if self.mode != Mode::Playing || self.transition.is_some() || self.dataset.is_empty() {
            return None;
        }
        let next = self.next_index();
        match self.precomputed.take() {
            Some(view) if view.index == next => Some(TickOutcome::TransitionStarted(
                self.start_transition(view),
            )),
            stale => {
                if let Some(view) = stale {
                    debug!("Discarding precomputed index {}, expected {}", view.index, next);
                }
                debug!("Index {} was not precomputed in time, snapping to it", next);
                self.current = self.compute(next);
                self.scheduled = Some(self.next_index());
                Some(TickOutcome::Snapped(next))
            }
        }
    }

    /// Blends the active transition at `progress`. Stale ids are ignored.
    pub fn apply_progress(&mut self, id: TransitionId, progress: f64) -> bool {
        let Some(transition) = self.transition.as_mut().filter(|t| t.id == id) else {
            return false;
        };
        let t = clamp_progress(progress);
        transition.progress = t;
        transition.provinces = interpolate(&transition.from, &transition.to.aggregate, t);
        transition.points = interpolate_points(&transition.from_points, &transition.to.points, t);
        true
    }

    /// Commits the target month of transition `id` with its exact aggregate and
    /// schedules the month after it. Stale ids are ignored.
    pub fn complete_transition(&mut self, id: TransitionId) -> bool {
        if self.active_transition() != Some(id) {
            return false;
        }
        let Some(transition) = self.transition.take() else {
            return false;
        };
        self.current = transition.to;
        self.scheduled = Some(self.next_index());
        if let Some(month) = self.current_month() {
            info!("Showing {} ({} provinces)", month, self.current.aggregate.len());
        }
        true
    }

    /// Drops the active transition without committing its target.
    pub fn cancel_transition(&mut self) -> bool {
        match self.transition.take() {
            Some(transition) => {
                debug!("Cancelled transition {} at {:.2}", transition.id, transition.progress);
                true
            }
            None => false,
        }
    }

    /// Stops playback and cancels any transition immediately.
    pub fn pause(&mut self) -> bool {
        if self.mode != Mode::Playing && self.transition.is_none() {
            return false;
        }
        self.mode = Mode::Paused;
        self.cancel_transition();
        info!("Playback paused at index {}", self.current.index);
        true
    }

    /// Transitions to the month at `index`.
    ///
    /// Ignored while playing or transitioning, for an unknown index, and for
    /// the month already shown.
    pub fn seek_month(&mut self, index: usize) -> Option<TransitionId> {
        if self.mode == Mode::Playing || self.transition.is_some() {
            debug!("Ignoring seek to index {}: pause playback first", index);
            return None;
        }
        if index >= self.dataset.months().len() || index == self.current.index {
            debug!("Ignoring seek to index {}", index);
            return None;
        }
        let target = self.compute(index);
        Some(self.start_transition(target))
    }

    /// Transitions to the first available month of `year`.
    pub fn seek_year(&mut self, year: i32) -> Option<TransitionId> {
        match self.dataset.first_month_of_year(year) {
            Some(index) => self.seek_month(index),
            None => {
                debug!("Ignoring seek to year {}: no data", year);
                None
            }
        }
    }

    /// Switches the displayed metric, re-aggregating the current month.
    pub fn set_metric(&mut self, metric: Metric) -> bool {
        if metric == self.metric {
            return false;
        }
        self.metric = metric;
        self.refresh();
        info!("Metric switched to {}", metric);
        true
    }

    /// Attaches province boundaries and re-aggregates the current month.
    ///
    /// Coordinates already resolved keep their cached province.
    pub fn attach_boundaries(&mut self, locator: impl ProvinceLocator + Send + 'static) {
        self.resolver.set_locator(locator);
        self.refresh();
    }

    /// Runs the scheduled precomputation, if any.
    pub fn run_scheduled_precompute(&mut self) -> bool {
        let Some(index) = self.scheduled.take() else {
            return false;
        };
        let view = self.compute(index);
        debug!(
            "Precomputed index {} ({} provinces)",
            index,
            view.aggregate.len()
        );
        self.precomputed = Some(view);
        true
    }

    /// `None` for an empty dataset.
    pub fn frame(&self) -> Option<PlaybackFrame> {
        let month = self.current_month()?;
        let (provinces, points, progress, target_month) = match &self.transition {
            Some(t) => (
                t.provinces.clone(),
                t.points.clone(),
                Some(t.progress),
                self.dataset.month_at(t.to.index),
            ),
            None => (
                self.current
                    .aggregate
                    .iter()
                    .map(|(name, stats)| (name.clone(), BlendedProvince::settled(stats.clone())))
                    .collect(),
                self.current.points.clone(),
                None,
                None,
            ),
        };
        Some(PlaybackFrame {
            month,
            month_index: self.current.index,
            target_month,
            metric: self.metric,
            state: self.state(),
            progress,
            provinces,
            points,
        })
    }

    fn refresh(&mut self) {
        self.cancel_transition();
        self.current = self.compute(self.current.index);
        self.precomputed = None;
        self.scheduled = (self.mode == Mode::Playing).then(|| self.next_index());
    }

    fn next_index(&self) -> usize {
        match self.dataset.months().len() {
            0 => 0,
            len => (self.current.index + 1) % len,
        }
    }

    fn start_transition(&mut self, target: MonthView) -> TransitionId {
        self.cancel_transition();
        self.next_transition_id += 1;
        let id = TransitionId(self.next_transition_id);
        let from = self.current.aggregate.clone();
        let from_points = self.current.points.clone();
        let provinces = interpolate(&from, &target.aggregate, 0.0);
        let points = interpolate_points(&from_points, &target.points, 0.0);
        debug!(
            "Transition {} from index {} to {}",
            id, self.current.index, target.index
        );
        self.scheduled = None;
        self.transition = Some(ActiveTransition {
            id,
            from,
            from_points,
            to: target,
            progress: 0.0,
            provinces,
            points,
        });
        id
    }

    fn compute(&mut self, index: usize) -> MonthView {
        let records: &[Arc<StationRecord>] = match self.dataset.month_at(index) {
            Some(month) => self.dataset.records(month),
            None => &[],
        };
        MonthView {
            index,
            aggregate: aggregate(records, self.metric, &mut self.resolver),
            points: point_features(records, self.metric),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::point_in_polygon::BoundaryGeometry;
    use crate::provinces::boundary::{BoundarySet, ProvinceBoundary};

    fn square(name: &str, min: f64, max: f64) -> ProvinceBoundary {
        ProvinceBoundary {
            name: name.to_string(),
            geometry: BoundaryGeometry::Polygon(vec![vec![
                [min, min],
                [min, max],
                [max, max],
                [max, min],
            ]]),
        }
    }

    fn boundaries() -> BoundarySet {
        BoundarySet::new(vec![square("广东省", 0.0, 10.0), square("北京市", 20.0, 30.0)])
    }

    fn month(raw: &str) -> MonthKey {
        raw.parse().unwrap()
    }

    fn dataset() -> Arc<WeatherDataset> {
        Arc::new(WeatherDataset::from_records([
            (
                month("2020-01"),
                vec![
                    StationRecord::new("a", 1.0, 1.0, Some(10.0), Some(1.0)),
                    StationRecord::new("b", 25.0, 25.0, Some(0.0), None),
                ],
            ),
            (
                month("2020-02"),
                vec![StationRecord::new("a", 1.0, 1.0, Some(14.0), Some(3.0))],
            ),
            (
                month("2021-07"),
                vec![StationRecord::new("a", 1.0, 1.0, Some(30.0), Some(200.0))],
            ),
        ]))
    }

    fn controller() -> PlaybackController {
        PlaybackController::new(
            dataset(),
            ProvinceResolver::with_locator(boundaries()),
            Metric::Temperature,
        )
    }

    #[test]
    fn test_starts_idle_on_first_month() {
        let controller = controller();
        assert_eq!(controller.state(), PlaybackState::Idle);
        assert_eq!(controller.current_month(), Some(month("2020-01")));
        assert_eq!(controller.live_aggregate().len(), 2);
        let frame = controller.frame().unwrap();
        assert_eq!(frame.progress, None);
        assert_eq!(frame.points.len(), 2);
        assert!(frame.provinces.values().all(|p| p.transition_progress.is_none()));
    }

    #[test]
    fn test_play_on_empty_dataset_is_ignored() {
        let mut controller = PlaybackController::new(
            Arc::new(WeatherDataset::default()),
            ProvinceResolver::new(),
            Metric::Temperature,
        );
        assert!(!controller.play());
        assert_eq!(controller.state(), PlaybackState::Idle);
        assert_eq!(controller.tick(), None);
        assert!(controller.frame().is_none());
    }

    #[test]
    fn test_tick_with_precomputed_month_starts_transition() {
        let mut controller = controller();
        assert!(controller.play());
        assert!(!controller.play());
        assert_eq!(controller.scheduled_precompute(), Some(1));
        assert!(controller.run_scheduled_precompute());
        assert_eq!(controller.precomputed_index(), Some(1));

        let Some(TickOutcome::TransitionStarted(id)) = controller.tick() else {
            panic!("expected a transition");
        };
        assert_eq!(controller.state(), PlaybackState::Transitioning);
        // Ticks are ignored while transitioning.
        assert_eq!(controller.tick(), None);

        assert!(controller.apply_progress(id, 0.5));
        let frame = controller.frame().unwrap();
        assert_eq!(frame.month, month("2020-01"));
        assert_eq!(frame.target_month, Some(month("2020-02")));
        assert_eq!(frame.provinces["广东"].stats.avg_temperature, Some(12.0));

        assert!(controller.complete_transition(id));
        assert_eq!(controller.state(), PlaybackState::Playing);
        assert_eq!(controller.current_index(), 1);
        assert_eq!(controller.live_aggregate()["广东"].avg_temperature, Some(14.0));
        assert!(!controller.live_aggregate().contains_key("北京"));
        assert_eq!(controller.scheduled_precompute(), Some(2));
    }

    #[test]
    fn test_tick_without_precompute_snaps() {
        let mut controller = controller();
        controller.play();
        assert_eq!(controller.tick(), Some(TickOutcome::Snapped(1)));
        assert_eq!(controller.state(), PlaybackState::Playing);
        assert_eq!(controller.current_index(), 1);
        assert_eq!(controller.scheduled_precompute(), Some(2));
    }

    #[test]
    fn test_tick_discards_precompute_for_another_month() {
        let mut controller = controller();
        let id = controller.seek_month(1).unwrap();
        controller.complete_transition(id);
        assert!(controller.run_scheduled_precompute());
        assert_eq!(controller.precomputed_index(), Some(2));

        let id = controller.seek_month(2).unwrap();
        controller.complete_transition(id);
        assert!(controller.play());
        // Index 2 is ready, but the month after the current one is index 0.
        assert_eq!(controller.tick(), Some(TickOutcome::Snapped(0)));
        assert_eq!(controller.current_index(), 0);
        assert_eq!(controller.precomputed_index(), None);
        assert_eq!(controller.live_aggregate().len(), 2);
    }

    #[test]
    fn test_playback_wraps_around() {
        let mut controller = controller();
        controller.play();
        controller.tick();
        controller.tick();
        assert_eq!(controller.current_index(), 2);
        assert_eq!(controller.tick(), Some(TickOutcome::Snapped(0)));
    }

    #[test]
    fn test_stale_transition_events_are_ignored() {
        let mut controller = controller();
        let first = controller.seek_month(1).unwrap();
        assert!(controller.pause());
        let second = controller.seek_month(2).unwrap();
        assert_ne!(first, second);
        assert!(!controller.apply_progress(first, 0.3));
        assert!(!controller.complete_transition(first));
        assert!(controller.complete_transition(second));
        assert_eq!(controller.current_index(), 2);
    }

    #[test]
    fn test_pause_cancels_transition_and_keeps_month() {
        let mut controller = controller();
        controller.play();
        controller.run_scheduled_precompute();
        let Some(TickOutcome::TransitionStarted(id)) = controller.tick() else {
            panic!("expected a transition");
        };
        controller.apply_progress(id, 0.7);
        assert!(controller.pause());
        assert_eq!(controller.state(), PlaybackState::Paused);
        assert_eq!(controller.active_transition(), None);
        assert_eq!(controller.current_index(), 0);
        assert!(!controller.pause());
    }

    #[test]
    fn test_seek_rules() {
        let mut controller = controller();
        assert_eq!(controller.seek_month(0), None);
        assert_eq!(controller.seek_month(9), None);
        assert_eq!(controller.seek_year(1999), None);

        controller.play();
        assert_eq!(controller.seek_month(1), None);
        controller.pause();

        let id = controller.seek_year(2021).unwrap();
        assert_eq!(controller.seek_month(1), None);
        controller.complete_transition(id);
        assert_eq!(controller.current_month(), Some(month("2021-07")));
        assert_eq!(controller.state(), PlaybackState::Paused);
    }

    #[test]
    fn test_play_during_seek_transition_continues_from_target() {
        let mut controller = controller();
        let id = controller.seek_month(1).unwrap();
        assert!(controller.play());
        assert_eq!(controller.scheduled_precompute(), None);
        controller.complete_transition(id);
        assert_eq!(controller.state(), PlaybackState::Playing);
        assert_eq!(controller.scheduled_precompute(), Some(2));
    }

    #[test]
    fn test_set_metric_reaggregates_and_reschedules() {
        let mut controller = controller();
        controller.play();
        controller.run_scheduled_precompute();
        let Some(TickOutcome::TransitionStarted(_)) = controller.tick() else {
            panic!("expected a transition");
        };
        assert!(controller.set_metric(Metric::Precipitation));
        assert!(!controller.set_metric(Metric::Precipitation));
        assert_eq!(controller.active_transition(), None);
        assert_eq!(controller.precomputed_index(), None);
        assert_eq!(controller.scheduled_precompute(), Some(1));
        // Station "b" has no precipitation.
        assert_eq!(controller.live_aggregate().len(), 1);
        assert_eq!(controller.frame().unwrap().metric, Metric::Precipitation);
    }

    #[test]
    fn test_boundaries_attached_later() {
        let mut controller =
            PlaybackController::new(dataset(), ProvinceResolver::new(), Metric::Temperature);
        assert_eq!(controller.live_aggregate().len(), 1);
        assert_eq!(controller.live_aggregate()["未知"].station_count, 2);

        controller.attach_boundaries(boundaries());
        assert!(controller.resolver().has_boundaries());
        assert_eq!(controller.live_aggregate().len(), 2);
        assert!(controller.live_aggregate().contains_key("广东"));
    }
}
