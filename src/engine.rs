//! Per-target classification against the reference set.
//!
//! The engine is a pure function of `(target, references, thresholds)`:
//! no internal state, no interior mutability, safe to call from any number
//! of worker threads against the same shared reference set and index.

use geo::MultiPolygon;
use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::geometry;
use crate::index::CandidateIndex;
use crate::reference::ReferenceSet;

/// Terminal classification of one target.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlignmentStatus {
    /// The target overlaps a reference well enough to be trusted in place.
    Aligned,
    /// The target was rigidly translated onto a nearby reference.
    Adjusted,
    /// No usable reference; the target is untouched.
    NotAligned,
}

impl AlignmentStatus {
    /// Attribute-value spelling of the status.
    pub fn as_str(self) -> &'static str {
        match self {
            AlignmentStatus::Aligned => "aligned",
            AlignmentStatus::Adjusted => "adjusted",
            AlignmentStatus::NotAligned => "not_aligned",
        }
    }
}

/// Outcome of classifying one target.
#[derive(Clone, Debug)]
pub struct MatchResult {
    /// Terminal status.
    pub status: AlignmentStatus,
    /// Output geometry: the input unchanged for `Aligned` and `NotAligned`,
    /// a rigid translation of the input for `Adjusted`.
    pub geometry: MultiPolygon<f64>,
    /// Area of the matched reference (0 when `NotAligned`).
    pub matched_reference_area: f64,
    /// Best overlap ratio found, in [0, 1] (0 when not `Aligned`).
    pub overlap_ratio: f64,
    /// Centroid distance to the matched reference (`Adjusted` only).
    pub distance_to_reference: Option<f64>,
}

/// Classifies targets against a frozen reference set.
///
/// Decision rule, per target:
///
/// 1. Among bbox candidates that actually intersect the target, find the
///    maximum overlap ratio (intersection area / target area); containment
///    is the ratio-1.0 special case. Ties break to the lowest reference id.
///    If the best ratio clears `min_overlap_ratio` the target is `Aligned`
///    in place.
/// 2. Otherwise scan the whole reference set for the nearest centroid (the
///    nearest reference may share no bbox overlap at all). Within
///    `max_distance`, the target is `Adjusted`: translated rigidly so its
///    centroid lands on the nearest point of that reference.
/// 3. Otherwise `NotAligned`, geometry untouched.
pub struct AlignmentEngine<'a> {
    references: &'a ReferenceSet,
    index: &'a CandidateIndex,
    config: EngineConfig,
}

impl<'a> AlignmentEngine<'a> {
    /// Create an engine over a frozen reference set and its index.
    pub fn new(
        references: &'a ReferenceSet,
        index: &'a CandidateIndex,
        config: EngineConfig,
    ) -> Self {
        Self {
            references,
            index,
            config,
        }
    }

    /// Classify one target geometry.
    ///
    /// The caller must have screened out invalid geometry
    /// ([`geometry::is_valid`]); degenerate input here would divide by a
    /// zero area.
    pub fn classify(&self, target: &MultiPolygon<f64>) -> MatchResult {
        let target_area = geometry::area(target);

        if let Some((best_id, best_ratio)) = self.best_overlap(target, target_area) {
            if best_ratio >= self.config.min_overlap_ratio {
                let record = self.references.get(best_id).expect("candidate id in set");
                return MatchResult {
                    status: AlignmentStatus::Aligned,
                    geometry: target.clone(),
                    matched_reference_area: record.area,
                    overlap_ratio: best_ratio,
                    distance_to_reference: None,
                };
            }
        }

        if let Some((nearest_id, distance)) = self.nearest_reference(target) {
            if distance <= self.config.max_distance {
                let record = self.references.get(nearest_id).expect("id in set");
                let target_centroid =
                    geometry::centroid(target).expect("valid target has a centroid");
                let anchor =
                    geometry::nearest_point_on(&record.feature.geometry, target_centroid);
                let adjusted = geometry::translate(
                    target,
                    anchor.x() - target_centroid.x(),
                    anchor.y() - target_centroid.y(),
                );
                return MatchResult {
                    status: AlignmentStatus::Adjusted,
                    geometry: adjusted,
                    matched_reference_area: record.area,
                    overlap_ratio: 0.0,
                    distance_to_reference: Some(distance),
                };
            }
        }

        MatchResult {
            status: AlignmentStatus::NotAligned,
            geometry: target.clone(),
            matched_reference_area: 0.0,
            overlap_ratio: 0.0,
            distance_to_reference: None,
        }
    }

    /// Best-overlapping candidate: `(reference id, overlap ratio)`.
    ///
    /// Candidates come back from the index in ascending id order and only a
    /// strictly greater ratio displaces the incumbent, so ties resolve to
    /// the lowest id regardless of chunking.
    fn best_overlap(&self, target: &MultiPolygon<f64>, target_area: f64) -> Option<(usize, f64)> {
        let bbox = geometry::bounding_box(target)?;
        let mut best: Option<(usize, f64)> = None;

        for id in self.index.query(bbox) {
            let record = self.references.get(id).expect("indexed id in set");
            if !geometry::intersects(target, &record.feature.geometry) {
                continue;
            }
            let ratio = if geometry::within(target, &record.feature.geometry) {
                1.0
            } else {
                (geometry::intersection_area(target, &record.feature.geometry) / target_area)
                    .min(1.0)
            };
            if best.map_or(true, |(_, r)| ratio > r) {
                best = Some((id, ratio));
            }
        }
        best
    }

    /// Reference with the centroid nearest the target's: `(id, distance)`.
    ///
    /// Scans the whole set, not just bbox candidates. Iteration is in id
    /// order with strictly-less comparison, so ties resolve to the lowest
    /// id.
    fn nearest_reference(&self, target: &MultiPolygon<f64>) -> Option<(usize, f64)> {
        let target_centroid = geometry::centroid(target)?;
        let mut nearest: Option<(usize, f64)> = None;

        for (id, record) in self.references.iter() {
            let d = geometry::point_distance(target_centroid, record.centroid);
            if nearest.map_or(true, |(_, best)| d < best) {
                nearest = Some((id, d));
            }
        }
        nearest
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature::Feature;
    use geo::{polygon, MultiPolygon};

    fn square(minx: f64, miny: f64, side: f64) -> MultiPolygon<f64> {
        MultiPolygon(vec![polygon![
            (x: minx, y: miny),
            (x: minx + side, y: miny),
            (x: minx + side, y: miny + side),
            (x: minx, y: miny + side),
            (x: minx, y: miny),
        ]])
    }

    fn setup(geoms: Vec<MultiPolygon<f64>>) -> (ReferenceSet, CandidateIndex) {
        let refs = ReferenceSet::build(geoms.into_iter().map(Feature::new).collect());
        let index = CandidateIndex::build(&refs);
        (refs, index)
    }

    fn engine_config(min_overlap_ratio: f64, max_distance: f64) -> EngineConfig {
        EngineConfig {
            min_overlap_ratio,
            max_distance,
        }
    }

    #[test]
    fn test_contained_target_aligns_with_full_ratio() {
        // Scenario A: 10x10 target inside a 20x20 reference.
        let (refs, index) = setup(vec![square(-5.0, -5.0, 20.0)]);
        let engine = AlignmentEngine::new(&refs, &index, engine_config(0.5, 25.0));

        let target = square(0.0, 0.0, 10.0);
        let result = engine.classify(&target);

        assert_eq!(result.status, AlignmentStatus::Aligned);
        assert!((result.overlap_ratio - 1.0).abs() < 1e-9);
        assert!((result.matched_reference_area - 400.0).abs() < 1e-6);
        assert_eq!(result.geometry, target);
        assert_eq!(result.distance_to_reference, None);
    }

    #[test]
    fn test_partial_overlap_below_threshold_not_aligned() {
        // 30% overlap, threshold 50%, reference centroid far enough that no
        // adjustment applies either.
        let (refs, index) = setup(vec![square(7.0, 0.0, 100.0)]);
        let engine = AlignmentEngine::new(&refs, &index, engine_config(0.5, 10.0));

        let target = square(0.0, 0.0, 10.0);
        let result = engine.classify(&target);

        assert_eq!(result.status, AlignmentStatus::NotAligned);
        assert_eq!(result.geometry, target);
    }

    #[test]
    fn test_max_ratio_wins_over_first_intersecting() {
        // Reference 0 overlaps 20%, reference 1 overlaps 80%.
        let (refs, index) = setup(vec![square(-8.0, 0.0, 10.0), square(2.0, 0.0, 10.0)]);
        let engine = AlignmentEngine::new(&refs, &index, engine_config(0.5, 25.0));

        let result = engine.classify(&square(0.0, 0.0, 10.0));

        assert_eq!(result.status, AlignmentStatus::Aligned);
        assert!((result.overlap_ratio - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_overlap_tie_breaks_to_lowest_id() {
        // Two references overlap the target by exactly half each; the
        // second is larger so the reported area reveals the winner.
        let (refs, index) = setup(vec![square(-5.0, 0.0, 10.0), square(5.0, -5.0, 20.0)]);
        let engine = AlignmentEngine::new(&refs, &index, engine_config(0.4, 25.0));

        let result = engine.classify(&square(0.0, 0.0, 10.0));

        assert_eq!(result.status, AlignmentStatus::Aligned);
        // Both give ratio 0.5; id 0's area (100, not 400) must be reported.
        assert!((result.matched_reference_area - 100.0).abs() < 1e-6);
        assert!((result.overlap_ratio - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_adjustment_translates_onto_nearest_reference() {
        // Scenario B: no overlap, nearest reference centroid 20m away,
        // max_distance 25.
        let (refs, index) = setup(vec![square(15.0, 0.0, 10.0)]);
        let engine = AlignmentEngine::new(&refs, &index, engine_config(0.5, 25.0));

        let target = square(-5.0, 0.0, 10.0); // centroid (0, 5); ref centroid (20, 5)
        let result = engine.classify(&target);

        assert_eq!(result.status, AlignmentStatus::Adjusted);
        assert!((result.distance_to_reference.unwrap() - 20.0).abs() < 1e-9);
        // Centroid moves to the nearest point on the reference: (15, 5).
        let moved = geometry::centroid(&result.geometry).unwrap();
        assert!((moved.x() - 15.0).abs() < 1e-9);
        assert!((moved.y() - 5.0).abs() < 1e-9);
        // Rigid translation: area unchanged.
        assert!((geometry::area(&result.geometry) - 100.0).abs() < 1e-9);
        assert!((result.matched_reference_area - 100.0).abs() < 1e-6);
    }

    #[test]
    fn test_far_target_not_aligned() {
        // Scenario C: nearest reference 1000m away, max_distance 25.
        let (refs, index) = setup(vec![square(1000.0, 0.0, 10.0)]);
        let engine = AlignmentEngine::new(&refs, &index, engine_config(0.5, 25.0));

        let target = square(0.0, 0.0, 10.0);
        let result = engine.classify(&target);

        assert_eq!(result.status, AlignmentStatus::NotAligned);
        assert_eq!(result.matched_reference_area, 0.0);
        assert_eq!(result.overlap_ratio, 0.0);
        assert_eq!(result.distance_to_reference, None);
        assert_eq!(result.geometry, target);
    }

    #[test]
    fn test_empty_reference_set_not_aligned() {
        let (refs, index) = setup(vec![]);
        let engine = AlignmentEngine::new(&refs, &index, engine_config(0.5, 25.0));

        let target = square(0.0, 0.0, 10.0);
        let result = engine.classify(&target);

        assert_eq!(result.status, AlignmentStatus::NotAligned);
        assert_eq!(result.geometry, target);
    }

    #[test]
    fn test_nearest_reference_found_outside_bbox_candidates() {
        // The only reference shares no bbox overlap with the target but its
        // centroid is within range; adjustment must still find it.
        let (refs, index) = setup(vec![square(12.0, 12.0, 4.0)]); // centroid (14, 14)
        let engine = AlignmentEngine::new(&refs, &index, engine_config(0.5, 25.0));

        let target = square(0.0, 0.0, 2.0); // centroid (1, 1)
        let result = engine.classify(&target);

        assert_eq!(result.status, AlignmentStatus::Adjusted);
    }

    #[test]
    fn test_containment_only_semantics() {
        // min_overlap_ratio = 1.0: partial overlap no longer aligns.
        let (refs, index) = setup(vec![square(2.0, 0.0, 10.0)]);
        let engine = AlignmentEngine::new(&refs, &index, engine_config(1.0, 0.0));

        let result = engine.classify(&square(0.0, 0.0, 10.0));
        assert_ne!(result.status, AlignmentStatus::Aligned);

        let contained = engine.classify(&square(3.0, 1.0, 5.0));
        assert_eq!(contained.status, AlignmentStatus::Aligned);
    }

    #[test]
    fn test_aligned_is_idempotent() {
        let (refs, index) = setup(vec![square(-5.0, -5.0, 20.0)]);
        let engine = AlignmentEngine::new(&refs, &index, engine_config(0.5, 25.0));

        let first = engine.classify(&square(0.0, 0.0, 10.0));
        assert_eq!(first.status, AlignmentStatus::Aligned);
        let second = engine.classify(&first.geometry);
        assert_eq!(second.status, AlignmentStatus::Aligned);
        assert_eq!(second.geometry, first.geometry);
    }
}
