//! Top-level alignment pipeline.
//!
//! One pure pass: `(targets, references, config) -> AlignReport`. No state
//! survives the call; loaders and writers live upstream and downstream.

use log::info;
use serde::{Deserialize, Serialize};

use crate::config::AlignConfig;
use crate::coordinator::{ChunkFailure, ParallelCoordinator, TargetOutcome};
use crate::engine::AlignmentStatus;
use crate::error::{Error, Result};
use crate::feature::{AttrValue, Feature, FeatureCollection};
use crate::index::CandidateIndex;
use crate::reference::ReferenceSet;
use crate::simplify;

/// Attribute keys the pipeline appends to each output target.
pub mod attrs {
    /// Terminal status ("aligned" / "adjusted" / "not_aligned").
    pub const STATUS: &str = "status";
    /// Area of the matched reference.
    pub const MATCHED_REFERENCE_AREA: &str = "matched_reference_area";
    /// Best overlap ratio found.
    pub const OVERLAP_RATIO: &str = "overlap_ratio";
    /// Centroid distance to the matched reference (null unless adjusted).
    pub const DISTANCE_TO_REFERENCE: &str = "distance_to_reference";
}

/// Aggregate counts for one run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Targets aligned in place.
    pub aligned: usize,
    /// Targets rigidly translated onto a reference.
    pub adjusted: usize,
    /// Targets with no usable reference.
    pub not_aligned: usize,
    /// Targets excluded for invalid geometry.
    pub invalid_geometry: usize,
    /// Targets left unresolved by failed chunks.
    pub unresolved: usize,
    /// Chunks that completed.
    pub successful_chunks: usize,
    /// Chunks that failed or timed out.
    pub failed_chunks: usize,
}

/// Everything one alignment run produces.
///
/// Every input target lands in exactly one place: `features` (classified),
/// `invalid_geometry` (excluded, by id), or a failed chunk's target range
/// (unresolved, retryable).
#[derive(Debug)]
pub struct AlignReport {
    /// Classified output features, sorted by target id. Each carries the
    /// input target's attributes extended with the [`attrs`] fields.
    pub features: Vec<Feature>,
    /// Ids of targets excluded for empty or degenerate geometry.
    pub invalid_geometry: Vec<usize>,
    /// Failed chunks with their unresolved target-id ranges.
    pub failed_chunks: Vec<ChunkFailure>,
    /// Aggregate counts.
    pub summary: RunSummary,
}

/// Align a target collection against a reference collection.
///
/// Steps: validate config, fail fast on CRS disagreement, simplify the
/// references, freeze them into a [`ReferenceSet`] with a
/// [`CandidateIndex`], classify every target concurrently, and assemble the
/// report.
pub fn align(
    targets: &FeatureCollection,
    references: &FeatureCollection,
    config: &AlignConfig,
) -> Result<AlignReport> {
    config.validate()?;
    check_crs(targets, references)?;

    info!(
        "aligning {} targets against {} references",
        targets.len(),
        references.len()
    );

    let simplified = simplify::simplify_references(references.features.clone(), &config.simplify);
    let reference_set = ReferenceSet::build(simplified);
    let index = CandidateIndex::build(&reference_set);

    let coordinator = ParallelCoordinator::new(config.coordinator.clone());
    let output = coordinator.run(&targets.features, &reference_set, &index, config.engine);

    let mut classified: Vec<(usize, Feature)> = Vec::with_capacity(output.outcomes.len());
    let mut invalid_geometry = Vec::new();
    let (mut aligned, mut adjusted, mut not_aligned) = (0usize, 0usize, 0usize);

    for (target_id, outcome) in output.outcomes {
        match outcome {
            TargetOutcome::InvalidGeometry => invalid_geometry.push(target_id),
            TargetOutcome::Classified(result) => {
                match result.status {
                    AlignmentStatus::Aligned => aligned += 1,
                    AlignmentStatus::Adjusted => adjusted += 1,
                    AlignmentStatus::NotAligned => not_aligned += 1,
                }
                let mut attributes = targets.features[target_id].attributes.clone();
                attributes.set(attrs::STATUS, result.status.as_str());
                attributes.set(attrs::MATCHED_REFERENCE_AREA, result.matched_reference_area);
                attributes.set(attrs::OVERLAP_RATIO, result.overlap_ratio);
                attributes.set(
                    attrs::DISTANCE_TO_REFERENCE,
                    result
                        .distance_to_reference
                        .map_or(AttrValue::Null, AttrValue::Float),
                );
                classified.push((
                    target_id,
                    Feature::with_attributes(result.geometry, attributes),
                ));
            }
        }
    }

    // Chunk arrival order is nondeterministic; sort so identical inputs
    // produce identical outputs whatever the worker count.
    classified.sort_by_key(|(id, _)| *id);
    invalid_geometry.sort_unstable();

    let summary = RunSummary {
        aligned,
        adjusted,
        not_aligned,
        invalid_geometry: invalid_geometry.len(),
        unresolved: output
            .failed_chunks
            .iter()
            .map(|f| f.target_ids.len())
            .sum(),
        successful_chunks: output.chunk_count - output.failed_chunks.len(),
        failed_chunks: output.failed_chunks.len(),
    };

    info!(
        "alignment done: {} aligned, {} adjusted, {} not aligned, {} invalid, {} unresolved",
        summary.aligned,
        summary.adjusted,
        summary.not_aligned,
        summary.invalid_geometry,
        summary.unresolved
    );

    Ok(AlignReport {
        features: classified.into_iter().map(|(_, f)| f).collect(),
        invalid_geometry,
        failed_chunks: output.failed_chunks,
        summary,
    })
}

/// Fatal precondition: both collections tagged with different CRS.
///
/// Untagged collections are trusted; the core does not verify coordinates
/// beyond treating them as dimensionless pairs.
fn check_crs(targets: &FeatureCollection, references: &FeatureCollection) -> Result<()> {
    if let (Some(t), Some(r)) = (&targets.crs, &references.crs) {
        if t != r {
            return Err(Error::CrsMismatch {
                target: t.clone(),
                reference: r.clone(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{polygon, MultiPolygon};

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
    fn test_crs_mismatch_is_fatal() {
        let targets = FeatureCollection::with_crs(vec![square(0.0, 0.0, 1.0)], "EPSG:2154");
        let references = FeatureCollection::with_crs(vec![square(0.0, 0.0, 1.0)], "EPSG:4326");

        let err = align(&targets, &references, &AlignConfig::default()).unwrap_err();
        assert!(matches!(err, Error::CrsMismatch { .. }));
    }

    #[test]
    fn test_untagged_collections_are_trusted() {
        let targets = FeatureCollection::new(vec![square(0.0, 0.0, 1.0)]);
        let references = FeatureCollection::with_crs(vec![square(0.0, 0.0, 1.0)], "EPSG:2154");
        assert!(align(&targets, &references, &AlignConfig::default()).is_ok());
    }

    #[test]
    fn test_invalid_config_is_fatal() {
        let targets = FeatureCollection::new(vec![]);
        let references = FeatureCollection::new(vec![]);
        let config = AlignConfig::default().with_min_overlap_ratio(2.0);
        assert!(align(&targets, &references, &config).is_err());
    }

    #[test]
    fn test_output_attributes_extend_input() {
        let mut target = square(0.0, 0.0, 10.0);
        target.attributes.set("nom", "bâtiment-7");
        let targets = FeatureCollection::new(vec![target]);
        let references = FeatureCollection::new(vec![square(-5.0, -5.0, 20.0)]);

        let config = AlignConfig::default().with_min_area_threshold(None);
        let report = align(&targets, &references, &config).unwrap();

        assert_eq!(report.features.len(), 1);
        let out = &report.features[0];
        assert_eq!(out.attributes.get("nom"), Some(&AttrValue::Str("bâtiment-7".into())));
        assert_eq!(
            out.attributes.get(attrs::STATUS),
            Some(&AttrValue::Str("aligned".into()))
        );
        assert_eq!(
            out.attributes.get(attrs::DISTANCE_TO_REFERENCE),
            Some(&AttrValue::Null)
        );
        assert_eq!(report.summary.aligned, 1);
    }

    #[test]
    fn test_every_target_lands_somewhere() {
        let targets = FeatureCollection::new(vec![
            square(0.0, 0.0, 10.0),
            Feature::new(MultiPolygon(vec![])),
            square(1000.0, 1000.0, 10.0),
        ]);
        let references = FeatureCollection::new(vec![square(0.0, 0.0, 10.0)]);

        let report = align(&targets, &references, &AlignConfig::default()).unwrap();

        let classified = report.features.len();
        let invalid = report.invalid_geometry.len();
        let unresolved: usize = report
            .failed_chunks
            .iter()
            .map(|f| f.target_ids.len())
            .sum();
        assert_eq!(classified + invalid + unresolved, 3);
        assert_eq!(report.invalid_geometry, vec![1]);
    }
}
