//! Merge-small pass: union undersized reference polygons.

use log::debug;

use crate::feature::Feature;
use crate::geometry;

/// Union all references smaller than `min_area` and decompose the result.
///
/// Large polygons pass through untouched, attributes intact. The small side
/// is combined with a geometric union, which only fuses polygons that touch
/// or overlap; disjoint small polygons come back out as separate parts.
///
/// Merged parts have no single owner record, so they carry empty attribute
/// maps. Callers needing attribute provenance must treat merged outputs as
/// geometry-only.
pub fn merge_small_polygons(references: Vec<Feature>, min_area: f64) -> Vec<Feature> {
    let (small, large): (Vec<Feature>, Vec<Feature>) = references
        .into_iter()
        .partition(|f| geometry::area(&f.geometry) < min_area);

    if small.is_empty() {
        return large;
    }
    debug!(
        "merge-small: {} polygons under {} m², {} kept as-is",
        small.len(),
        min_area,
        large.len()
    );

    let small_geoms: Vec<_> = small.into_iter().map(|f| f.geometry).collect();
    let merged = geometry::union_all(&small_geoms);

    let mut result = large;
    result.extend(geometry::decompose(&merged).into_iter().map(Feature::new));
    result
}
