//! The immutable reference set aligned against.

use geo::{CoordsIter, MultiPolygon, Point};
use log::warn;
use std::collections::HashMap;

use crate::feature::Feature;
use crate::geometry;

/// One reference record with its precomputed derived values.
#[derive(Clone, Debug)]
pub struct ReferenceRecord {
    /// The reference feature (parcel geometry plus attributes).
    pub feature: Feature,
    /// Cached centroid of the geometry.
    pub centroid: Point<f64>,
    /// Cached unsigned area of the geometry.
    pub area: f64,
}

/// An ordered, deduplicated, immutable collection of reference features.
///
/// Each record gets a stable integer id (its position), used for
/// deterministic tie-breaking in the alignment engine. Built once per run
/// and never mutated afterwards, so it can be shared read-only across
/// worker threads.
///
/// Duplicate geometries (exact coordinate equality) keep only their first
/// occurrence; references with empty or degenerate geometry are dropped with
/// a warning, since nothing can align to them.
#[derive(Clone, Debug, Default)]
pub struct ReferenceSet {
    records: Vec<ReferenceRecord>,
}

impl ReferenceSet {
    /// Build the set from reference features.
    pub fn build(features: Vec<Feature>) -> Self {
        let mut records = Vec::with_capacity(features.len());
        let mut seen: HashMap<Vec<(u64, u64)>, usize> = HashMap::new();
        let mut dropped_invalid = 0usize;
        let mut dropped_dupes = 0usize;

        for feature in features {
            if !geometry::is_valid(&feature.geometry) {
                dropped_invalid += 1;
                continue;
            }
            let key = coord_key(&feature.geometry);
            if seen.contains_key(&key) {
                dropped_dupes += 1;
                continue;
            }
            // is_valid guarantees a non-empty geometry, so the centroid exists.
            let Some(centroid) = geometry::centroid(&feature.geometry) else {
                dropped_invalid += 1;
                continue;
            };
            let area = geometry::area(&feature.geometry);
            seen.insert(key, records.len());
            records.push(ReferenceRecord {
                feature,
                centroid,
                area,
            });
        }

        if dropped_invalid > 0 {
            warn!("dropped {dropped_invalid} reference(s) with invalid geometry");
        }
        if dropped_dupes > 0 {
            warn!("dropped {dropped_dupes} duplicate reference geometries");
        }

        Self { records }
    }

    /// Number of references.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if the set is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Look up a record by id.
    pub fn get(&self, id: usize) -> Option<&ReferenceRecord> {
        self.records.get(id)
    }

    /// Iterate `(id, record)` pairs in id order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &ReferenceRecord)> {
        self.records.iter().enumerate()
    }
}

/// Exact coordinate-sequence key for deduplication.
fn coord_key(g: &MultiPolygon<f64>) -> Vec<(u64, u64)> {
    g.coords_iter()
        .map(|c| (c.x.to_bits(), c.y.to_bits()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::polygon;

    fn square(minx: f64, miny: f64, side: f64) -> Feature {
        Feature::new(MultiPolygon(vec![polygon![
            (x: minx, y: miny),
            (x: minx + side, y: miny),
            (x: minx + side, y: miny + side),
            (x: minx, y: miny + side),
            (x: minx, y: miny),
        ]]))
    }

    #[test]
    fn test_build_assigns_ids_in_input_order() {
        let set = ReferenceSet::build(vec![square(0.0, 0.0, 1.0), square(5.0, 0.0, 2.0)]);
        assert_eq!(set.len(), 2);
        assert!((set.get(0).unwrap().area - 1.0).abs() < 1e-9);
        assert!((set.get(1).unwrap().area - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_build_dedupes_exact_geometry() {
        let set = ReferenceSet::build(vec![
            square(0.0, 0.0, 1.0),
            square(0.0, 0.0, 1.0),
            square(3.0, 3.0, 1.0),
        ]);
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_build_drops_empty_geometry() {
        let set = ReferenceSet::build(vec![
            Feature::new(MultiPolygon(vec![])),
            square(0.0, 0.0, 1.0),
        ]);
        assert_eq!(set.len(), 1);
    }
}
