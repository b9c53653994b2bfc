//! Deterministic greedy clustering of adjacent references.

use geo::Point;
use log::debug;

use crate::feature::Feature;
use crate::geometry;

/// Merge references that are both centroid-proximate and boundary-adjacent.
///
/// Deterministic greedy sweep over the working set in input (reference id)
/// order: the lowest-id remaining polygon seeds a cluster; every remaining
/// polygon whose centroid lies within `max_merge_distance` of the seed's
/// centroid *and* that touches the seed is unioned with it; the consumed
/// polygons leave the working set; repeat until empty. The result never
/// depends on iteration order, so runs are reproducible.
///
/// The merged output keeps the seed's attributes (the cluster has no better
/// owner); unmerged polygons pass through untouched.
pub fn cluster_references(references: Vec<Feature>, max_merge_distance: f64) -> Vec<Feature> {
    struct Entry {
        feature: Feature,
        centroid: Option<Point<f64>>,
    }

    let mut working: Vec<Option<Entry>> = references
        .into_iter()
        .map(|feature| {
            let centroid = geometry::centroid(&feature.geometry);
            Some(Entry { feature, centroid })
        })
        .collect();

    let mut output = Vec::with_capacity(working.len());
    let mut merged_clusters = 0usize;

    for seed_idx in 0..working.len() {
        let Some(seed) = working[seed_idx].take() else {
            continue;
        };
        // Degenerate geometry cannot anchor a cluster; pass it through.
        let Some(seed_centroid) = seed.centroid else {
            output.push(seed.feature);
            continue;
        };

        let mut member_indices = Vec::new();
        for (idx, slot) in working.iter().enumerate().skip(seed_idx + 1) {
            let Some(entry) = slot else { continue };
            let Some(c) = entry.centroid else { continue };
            if geometry::point_distance(seed_centroid, c) <= max_merge_distance
                && geometry::touches(&seed.feature.geometry, &entry.feature.geometry)
            {
                member_indices.push(idx);
            }
        }

        if member_indices.is_empty() {
            output.push(seed.feature);
            continue;
        }

        let mut geoms = vec![seed.feature.geometry.clone()];
        for idx in &member_indices {
            let entry = working[*idx].take().expect("member still in working set");
            geoms.push(entry.feature.geometry);
        }
        merged_clusters += 1;
        output.push(Feature::with_attributes(
            geometry::union_all(&geoms),
            seed.feature.attributes,
        ));
    }

    if merged_clusters > 0 {
        debug!("clustering merged {merged_clusters} cluster(s)");
    }
    output
}
