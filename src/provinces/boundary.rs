//! Province boundary polygons loaded from a GeoJSON FeatureCollection, indexed
//! with an R-tree of bounding boxes so a lookup only ray-casts against the few
//! provinces whose bounds contain the point.

use crate::geometry::point_in_polygon::{point_in_geometry, BoundaryGeometry, Position, Ring};
use crate::provinces::error::BoundaryError;
use crate::source::fetcher::{DataSource, SourceFetcher};
use crate::source::progress::{report, LoadProgress, ProgressSender};
use log::{debug, info, warn};
use rstar::primitives::{GeomWithData, Rectangle};
use rstar::{RTree, AABB};
use geojson::{Feature, GeoJson, PolygonType, Position as GeoPosition, Value as GeoValue};
use serde_json::Value as JsonValue;
use tokio::task;

/// Feature property holding the province name in the usual China GeoJSON exports.
pub const DEFAULT_NAME_PROPERTY: &str = "name";

/// Finds which province boundary contains a point.
///
/// This is the expensive geometric step behind [`crate::ProvinceResolver`].
pub trait ProvinceLocator {
    /// Returns the long-form name of the first boundary, in source order, that
    /// contains `point` (`[lng, lat]`).
    fn locate(&self, point: Position) -> Option<&str>;
}

/// A named province boundary as it appears in the source data.
#[derive(Debug, Clone, PartialEq)]
pub struct ProvinceBoundary {
    /// Official long-form name, e.g. "广东省".
    pub name: String,
    pub geometry: BoundaryGeometry,
}

type BoundsEntry = GeomWithData<Rectangle<[f64; 2]>, usize>;

/// Immutable set of province boundaries in source order.
#[derive(Debug, Clone)]
pub struct BoundarySet {
    boundaries: Vec<ProvinceBoundary>,
    index: RTree<BoundsEntry>,
}

impl BoundarySet {
    pub fn new(boundaries: Vec<ProvinceBoundary>) -> Self {
        let entries: Vec<BoundsEntry> = boundaries
            .iter()
            .enumerate()
            .filter_map(|(i, boundary)| {
                let bounds = boundary.geometry.bounding_box()?;
                Some(GeomWithData::new(
                    Rectangle::from_corners(bounds.min, bounds.max),
                    i,
                ))
            })
            .collect();
        BoundarySet {
            boundaries,
            index: RTree::bulk_load(entries),
        }
    }

    /// Parses a GeoJSON FeatureCollection.
    ///
    /// Features without a string `name_property` or without Polygon/MultiPolygon
    /// geometry are skipped.
    pub fn from_geojson(bytes: &[u8], name_property: &str) -> Result<Self, BoundaryError> {
        let raw: JsonValue = serde_json::from_slice(bytes)?;
        let kind = raw
            .get("type")
            .and_then(JsonValue::as_str)
            .unwrap_or_default()
            .to_string();
        if kind != "FeatureCollection" {
            return Err(BoundaryError::NotAFeatureCollection(kind));
        }
        let GeoJson::FeatureCollection(collection) = GeoJson::from_json_value(raw)? else {
            return Err(BoundaryError::NotAFeatureCollection(kind));
        };

        let total = collection.features.len();
        let boundaries: Vec<ProvinceBoundary> = collection
            .features
            .into_iter()
            .enumerate()
            .filter_map(|(i, feature)| {
                let boundary = to_boundary(feature, name_property);
                if boundary.is_none() {
                    debug!("Skipping boundary feature #{}: no usable name or polygon geometry", i);
                }
                boundary
            })
            .collect();
        if boundaries.len() < total {
            warn!(
                "Kept {} of {} boundary features (name property '{}')",
                boundaries.len(),
                total,
                name_property
            );
        }
        Ok(Self::new(boundaries))
    }

    /// Fetches and parses a boundary source, reporting progress on `progress`.
    pub async fn load(
        fetcher: &SourceFetcher,
        source: &DataSource,
        name_property: &str,
        progress: Option<&ProgressSender>,
    ) -> Result<Self, BoundaryError> {
        let label = source.to_string();
        report(progress, LoadProgress::Started { source: label.clone() });

        let result = Self::fetch_and_parse(fetcher, source, name_property, progress).await;
        match &result {
            Ok(set) => {
                info!("Loaded {} province boundaries from {}", set.len(), label);
                report(
                    progress,
                    LoadProgress::Completed {
                        source: label,
                        items: set.len(),
                    },
                );
            }
            Err(e) => report(
                progress,
                LoadProgress::Failed {
                    source: label,
                    message: e.to_string(),
                },
            ),
        }
        result
    }

    async fn fetch_and_parse(
        fetcher: &SourceFetcher,
        source: &DataSource,
        name_property: &str,
        progress: Option<&ProgressSender>,
    ) -> Result<Self, BoundaryError> {
        let bytes = fetcher.fetch(source).await?;
        report(
            progress,
            LoadProgress::Parsing {
                source: source.to_string(),
                bytes: bytes.len(),
            },
        );
        let name_property = name_property.to_string();
        task::spawn_blocking(move || Self::from_geojson(&bytes, &name_property)).await?
    }

    pub fn len(&self) -> usize {
        self.boundaries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boundaries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ProvinceBoundary> {
        self.boundaries.iter()
    }
}

impl ProvinceLocator for BoundarySet {
    fn locate(&self, point: Position) -> Option<&str> {
        let mut candidates: Vec<usize> = self
            .index
            .locate_in_envelope_intersecting(&AABB::from_point(point))
            .map(|entry| entry.data)
            .collect();
        // The R-tree yields candidates in arbitrary order; source order decides ties.
        candidates.sort_unstable();
        candidates
            .into_iter()
            .map(|i| &self.boundaries[i])
            .find(|boundary| point_in_geometry(point, &boundary.geometry))
            .map(|boundary| boundary.name.as_str())
    }
}

fn to_boundary(feature: Feature, name_property: &str) -> Option<ProvinceBoundary> {
    let name = feature
        .properties
        .as_ref()?
        .get(name_property)?
        .as_str()?
        .to_string();
    let geometry = match feature.geometry?.value {
        GeoValue::Polygon(rings) => BoundaryGeometry::Polygon(to_polygon(rings)?),
        GeoValue::MultiPolygon(polygons) => BoundaryGeometry::MultiPolygon(
            polygons
                .into_iter()
                .map(to_polygon)
                .collect::<Option<Vec<_>>>()?,
        ),
        _ => return None,
    };
    Some(ProvinceBoundary { name, geometry })
}

fn to_polygon(rings: PolygonType) -> Option<Vec<Ring>> {
    rings.into_iter().map(to_ring).collect()
}

// Positions may carry an altitude; only x and y are kept.
fn to_ring(positions: Vec<GeoPosition>) -> Option<Ring> {
    positions
        .into_iter()
        .map(|p| match p.as_slice() {
            [x, y, ..] => Some([*x, *y]),
            _ => None,
        })
        .collect()
}
