//! Reference-set preprocessing.
//!
//! Raw cadastral data is noisy: parcels are over-divided, sliver polygons
//! abound, and adjacent parcels that form one logical lot arrive as many
//! records. Matching targets against the raw set inflates candidate counts
//! and fragments overlap ratios, so the pipeline cleans the reference set
//! first.
//!
//! Two composable passes, both optional:
//!
//! 1. **Merge-small** ([`merge_small::merge_small_polygons`]): union all
//!    undersized polygons, decompose the result. Only polygons that actually
//!    touch fuse.
//! 2. **Strategy pass**: either deterministic adjacency clustering
//!    ([`cluster::cluster_references`]) or the lossier buffer-dissolve
//!    ([`dissolve::dissolve_references`]). The latter alters boundary
//!    geometry and is never chosen implicitly.
//!
//! An optional vertex-simplification step (Douglas-Peucker) runs last.

pub mod cluster;
pub mod dissolve;
pub mod merge_small;

use log::info;

use crate::config::{SimplifyConfig, SimplifyStrategy};
use crate::feature::Feature;
use crate::geometry;

/// Run the configured simplification passes over the raw references.
pub fn simplify_references(references: Vec<Feature>, config: &SimplifyConfig) -> Vec<Feature> {
    let initial = references.len();

    let mut features = match config.min_area_threshold {
        Some(min_area) => merge_small::merge_small_polygons(references, min_area),
        None => references,
    };

    features = match config.strategy {
        SimplifyStrategy::None => features,
        SimplifyStrategy::Cluster { max_merge_distance } => {
            cluster::cluster_references(features, max_merge_distance)
        }
        SimplifyStrategy::DissolveBuffer { buffer_distance } => {
            dissolve::dissolve_references(features, buffer_distance)
        }
    };

    if let Some(tolerance) = config.simplify_tolerance {
        for feature in &mut features {
            feature.geometry = geometry::simplify(&feature.geometry, tolerance);
        }
    }

    info!(
        "simplified reference set: {} -> {} polygons",
        initial,
        features.len()
    );
    features
}
