//! Ray-casting point-in-polygon tests over GeoJSON-style rings.
//!
//! Positions are `[x, y]`, which for geographic data means `[lng, lat]`.
//! Results for points lying exactly on an edge or vertex are implementation-defined.

use geo::{BoundingRect, MultiPoint, Point};

pub type Position = [f64; 2];
pub type Ring = Vec<Position>;

/// A polygon (outer ring followed by hole rings) or a collection of polygons.
#[derive(Debug, Clone, PartialEq)]
pub enum BoundaryGeometry {
    Polygon(Vec<Ring>),
    MultiPolygon(Vec<Vec<Ring>>),
}

/// Axis-aligned bounds of a geometry's outer rings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min: Position,
    pub max: Position,
}

/// Parity test: the point is inside when a ray cast along +x crosses the ring an odd number of times.
/// The ring may or may not repeat its first position at the end.
pub fn point_in_ring(point: Position, ring: &[Position]) -> bool {
    let [x, y] = point;
    let Some(&last) = ring.last() else {
        return false;
    };
    let mut inside = false;
    let [mut xj, mut yj] = last;
    for &[xi, yi] in ring {
        if (yi > y) != (yj > y) && x < (xj - xi) * (y - yi) / (yj - yi) + xi {
            inside = !inside;
        }
        xj = xi;
        yj = yi;
    }
    inside
}

/// Ring 0 is the outer boundary, the remaining rings are holes.
pub fn point_in_polygon(point: Position, rings: &[Ring]) -> bool {
    let Some((outer, holes)) = rings.split_first() else {
        return false;
    };
    point_in_ring(point, outer) && !holes.iter().any(|hole| point_in_ring(point, hole))
}

pub fn point_in_geometry(point: Position, geometry: &BoundaryGeometry) -> bool {
    match geometry {
        BoundaryGeometry::Polygon(rings) => point_in_polygon(point, rings),
        BoundaryGeometry::MultiPolygon(polygons) => polygons
            .iter()
            .any(|rings| point_in_polygon(point, rings)),
    }
}

impl BoundaryGeometry {
    /// `None` when the geometry has no positions at all.
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        let outer_rings: Vec<&Ring> = match self {
            BoundaryGeometry::Polygon(rings) => rings.first().into_iter().collect(),
            BoundaryGeometry::MultiPolygon(polygons) => {
                polygons.iter().filter_map(|rings| rings.first()).collect()
            }
        };
        let points: MultiPoint<f64> = outer_rings
            .into_iter()
            .flatten()
            .map(|&position| Point::from(position))
            .collect();
        points.bounding_rect().map(|rect| BoundingBox {
            min: [rect.min().x, rect.min().y],
            max: [rect.max().x, rect.max().y],
        })
    }
}
