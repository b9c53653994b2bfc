//! Buffer-then-dissolve simplification.

use log::debug;

use crate::feature::Feature;
use crate::geometry;

/// Expand every reference outward by `buffer_distance`, union everything,
/// decompose the result back into single polygons.
///
/// Closes micro-gaps that the clustering pass cannot (parcels separated by
/// survey slivers), at the cost of altering boundary geometry: output
/// polygons are everywhere `buffer_distance` larger than their inputs. This
/// is the lossy alternative; callers opt in via
/// [`SimplifyStrategy::DissolveBuffer`](crate::config::SimplifyStrategy).
///
/// Output features carry empty attribute maps, as with any merged geometry.
pub fn dissolve_references(references: Vec<Feature>, buffer_distance: f64) -> Vec<Feature> {
    if references.is_empty() {
        return references;
    }
    let initial = references.len();

    let buffered: Vec<_> = references
        .into_iter()
        .map(|f| geometry::buffer(&f.geometry, buffer_distance))
        .collect();
    let dissolved = geometry::union_all(&buffered);
    let out: Vec<Feature> = geometry::decompose(&dissolved)
        .into_iter()
        .map(Feature::new)
        .collect();

    debug!("dissolve: {} -> {} polygons", initial, out.len());
    out
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
    fn test_micro_gap_closes() {
        // 0.1m gap; a 0.1m buffer bridges it.
        let refs = vec![square(0.0, 0.0, 10.0), square(10.1, 0.0, 10.0)];
        let out = dissolve_references(refs, 0.1);
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn test_wide_gap_stays_open() {
        let refs = vec![square(0.0, 0.0, 10.0), square(20.0, 0.0, 10.0)];
        let out = dissolve_references(refs, 0.1);
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn test_output_grows_by_buffer() {
        let refs = vec![square(0.0, 0.0, 10.0)];
        let out = dissolve_references(refs, 1.0);
        assert_eq!(out.len(), 1);
        // 12x12 core plus corner geometry; strictly larger than the input.
        assert!(geometry::area(&out[0].geometry) > 100.0);
    }

    #[test]
    fn test_empty_input() {
        assert!(dissolve_references(vec![], 0.1).is_empty());
    }
}
