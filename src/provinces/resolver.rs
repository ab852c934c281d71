use crate::provinces::boundary::ProvinceLocator;
use crate::provinces::names::to_short_name;
use crate::types::coord::CoordKey;
use crate::types::province_stats::UNKNOWN_PROVINCE;
use log::debug;
use std::collections::HashMap;
use std::fmt;

/// Resolves station coordinates to short-form province names.
///
/// Each quantized coordinate is resolved at most once for the lifetime of the
/// resolver: the first answer, including [`UNKNOWN_PROVINCE`], is cached and
/// never re-evaluated, even if boundaries are replaced later.
///
/// While no boundaries are attached every lookup answers [`UNKNOWN_PROVINCE`]
/// without caching, so points can still resolve once boundaries arrive.
pub struct ProvinceResolver {
    locator: Option<Box<dyn ProvinceLocator + Send>>,
    cache: HashMap<CoordKey, String>,
}

impl ProvinceResolver {
    /// A resolver without boundaries.
    pub fn new() -> Self {
        Self {
            locator: None,
            cache: HashMap::new(),
        }
    }

    pub fn with_locator(locator: impl ProvinceLocator + Send + 'static) -> Self {
        let mut resolver = Self::new();
        resolver.set_locator(locator);
        resolver
    }

    /// Attaches (or replaces) the boundary data. Cached entries are kept.
    pub fn set_locator(&mut self, locator: impl ProvinceLocator + Send + 'static) {
        if !self.cache.is_empty() {
            debug!(
                "Attaching boundaries with {} coordinates already resolved; those stay cached",
                self.cache.len()
            );
        }
        self.locator = Some(Box::new(locator));
    }

    pub fn has_boundaries(&self) -> bool {
        self.locator.is_some()
    }

    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    pub fn resolve(&mut self, lat: f64, lng: f64) -> String {
        let key = CoordKey::new(lat, lng);
        if let Some(province) = self.cache.get(&key) {
            return province.clone();
        }
        let Some(locator) = &self.locator else {
            return UNKNOWN_PROVINCE.to_string();
        };
        let province = locator
            .locate([lng, lat])
            .map_or(UNKNOWN_PROVINCE, to_short_name)
            .to_string();
        self.cache.insert(key, province.clone());
        province
    }
}

impl Default for ProvinceResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ProvinceResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProvinceResolver")
            .field("has_boundaries", &self.has_boundaries())
            .field("cached", &self.cache.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::point_in_polygon::{BoundaryGeometry, Position};
    use crate::provinces::boundary::{BoundarySet, ProvinceBoundary};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn square_boundary(name: &str, min: f64, max: f64) -> ProvinceBoundary {
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

    struct CountingLocator {
        inner: BoundarySet,
        calls: Arc<AtomicUsize>,
    }

    impl ProvinceLocator for CountingLocator {
        fn locate(&self, point: Position) -> Option<&str> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.locate(point)
        }
    }

    fn counting_resolver() -> (ProvinceResolver, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let locator = CountingLocator {
            inner: BoundarySet::new(vec![
                square_boundary("广东省", 0.0, 10.0),
                square_boundary("Elsewhere", 20.0, 30.0),
            ]),
            calls: calls.clone(),
        };
        (ProvinceResolver::with_locator(locator), calls)
    }

    #[test]
    fn test_resolves_and_normalizes_names() {
        let (mut resolver, _) = counting_resolver();
        assert_eq!(resolver.resolve(5.0, 5.0), "广东");
        // Unmapped names pass through unchanged.
        assert_eq!(resolver.resolve(25.0, 25.0), "Elsewhere");
        assert_eq!(resolver.resolve(50.0, 50.0), UNKNOWN_PROVINCE);
    }

    #[test]
    fn test_cache_is_idempotent_and_scans_once() {
        let (mut resolver, calls) = counting_resolver();
        let first = resolver.resolve(5.123456, 6.654321);
        let second = resolver.resolve(5.123456, 6.654321);
        assert_eq!(first, second);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        // Differs only beyond the sixth decimal: same cache entry.
        resolver.resolve(5.1234561, 6.6543209);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(resolver.cache_len(), 1);
    }

    #[test]
    fn test_misses_are_cached_as_unknown() {
        let (mut resolver, calls) = counting_resolver();
        assert_eq!(resolver.resolve(-40.0, -40.0), UNKNOWN_PROVINCE);
        assert_eq!(resolver.resolve(-40.0, -40.0), UNKNOWN_PROVINCE);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_unresolved_without_boundaries_is_not_cached() {
        let mut resolver = ProvinceResolver::new();
        assert_eq!(resolver.resolve(5.0, 5.0), UNKNOWN_PROVINCE);
        assert_eq!(resolver.cache_len(), 0);

        resolver.set_locator(BoundarySet::new(vec![square_boundary("广东省", 0.0, 10.0)]));
        assert_eq!(resolver.resolve(5.0, 5.0), "广东");
    }

    #[test]
    fn test_cached_answers_survive_boundary_replacement() {
        let (mut resolver, _) = counting_resolver();
        assert_eq!(resolver.resolve(5.0, 5.0), "广东");
        assert_eq!(resolver.resolve(-5.0, -5.0), UNKNOWN_PROVINCE);

        resolver.set_locator(BoundarySet::new(vec![square_boundary("海南省", -10.0, 10.0)]));
        assert_eq!(resolver.resolve(5.0, 5.0), "广东");
        assert_eq!(resolver.resolve(-5.0, -5.0), UNKNOWN_PROVINCE);
        assert_eq!(resolver.resolve(-6.0, -6.0), "海南");
    }
}
