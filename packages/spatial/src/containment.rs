//! Point-in-polygon filtering.
//!
//! Points are loaded into an R-tree once. A query first collects the points
//! inside the polygon's bounding box, then applies the exact predicate for
//! the chosen [`BoundaryRule`]. Geographic coordinates are treated as
//! Cartesian, which is fine at city scale.

use std::collections::BTreeSet;

use geo::{BoundingRect as _, Contains as _, Intersects as _, MultiPolygon, Point};
use rstar::{AABB, RTree, RTreeObject};

use crate::BoundaryRule;

/// A point stored in the R-tree with its position in the caller's slice.
struct IndexedPoint {
    index: usize,
    point: Point<f64>,
}

impl RTreeObject for IndexedPoint {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point([self.point.x(), self.point.y()])
    }
}

/// Pre-built R-tree over a point collection.
///
/// Built once per collection and reusable across polygons, e.g. when
/// comparing several buffer distances.
pub struct PointIndex {
    tree: RTree<IndexedPoint>,
}

impl PointIndex {
    /// Bulk-loads the points. Indices in query results refer to positions
    /// in `points`.
    #[must_use]
    pub fn new(points: &[Point<f64>]) -> Self {
        let entries = points
            .iter()
            .enumerate()
            .map(|(index, point)| IndexedPoint {
                index,
                point: *point,
            })
            .collect();

        let tree = RTree::bulk_load(entries);
        log::debug!("Indexed {} points", tree.size());

        Self { tree }
    }

    /// Number of indexed points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tree.size()
    }

    /// Returns `true` if no points are indexed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }

    /// Indices of the points inside `polygon`.
    #[must_use]
    pub fn contained(&self, polygon: &MultiPolygon<f64>, rule: BoundaryRule) -> BTreeSet<usize> {
        let Some(rect) = polygon.bounding_rect() else {
            return BTreeSet::new();
        };
        let envelope = AABB::from_corners(
            [rect.min().x, rect.min().y],
            [rect.max().x, rect.max().y],
        );

        let mut candidates = 0_usize;
        let hits: BTreeSet<usize> = self
            .tree
            .locate_in_envelope(&envelope)
            .inspect(|_| candidates += 1)
            .filter(|entry| match rule {
                BoundaryRule::Exclusive => polygon.contains(&entry.point),
                BoundaryRule::Inclusive => polygon.intersects(&entry.point),
            })
            .map(|entry| entry.index)
            .collect();

        log::debug!(
            "{} of {candidates} bounding-box candidates inside polygon ({rule})",
            hits.len()
        );

        hits
    }
}

/// Indices of `points` that lie inside `polygon`.
///
/// Convenience for one-off queries; build a [`PointIndex`] to query the
/// same points repeatedly.
#[must_use]
pub fn contained_indices(
    polygon: &MultiPolygon<f64>,
    points: &[Point<f64>],
    rule: BoundaryRule,
) -> BTreeSet<usize> {
    PointIndex::new(points).contained(polygon, rule)
}
