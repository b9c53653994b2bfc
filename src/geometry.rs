//! Geometry operations used by the alignment core.
//!
//! Thin wrappers over the `geo` algorithm traits (plus `geo-buffer` for
//! outward offsetting, which `geo` itself does not provide). Everything
//! operates on [`MultiPolygon<f64>`] so single- and multi-part geometries
//! flow through the same code paths.
//!
//! The core consumes these predicates; it does not implement them. Keeping
//! the call sites funneled through this module keeps the rest of the crate
//! free of algorithm-trait imports.

use geo::{
    Area, BoundingRect, BooleanOps, Centroid, Closest, ClosestPoint, CoordsIter,
    EuclideanDistance, Intersects, MultiPolygon, Point, Rect, Relate, Simplify, Translate,
};

/// Unsigned planar area.
pub fn area(g: &MultiPolygon<f64>) -> f64 {
    g.unsigned_area()
}

/// Centroid, if the geometry has one (empty geometries do not).
pub fn centroid(g: &MultiPolygon<f64>) -> Option<Point<f64>> {
    g.centroid()
}

/// Do the two geometries share any point?
pub fn intersects(a: &MultiPolygon<f64>, b: &MultiPolygon<f64>) -> bool {
    a.intersects(b)
}

/// Is `a` entirely inside `b`?
pub fn within(a: &MultiPolygon<f64>, b: &MultiPolygon<f64>) -> bool {
    a.relate(b).is_within()
}

/// Do the boundaries meet without the interiors overlapping?
pub fn touches(a: &MultiPolygon<f64>, b: &MultiPolygon<f64>) -> bool {
    a.relate(b).is_touches()
}

/// Area of the intersection of two geometries.
pub fn intersection_area(a: &MultiPolygon<f64>, b: &MultiPolygon<f64>) -> f64 {
    a.intersection(b).unsigned_area()
}

/// Euclidean distance between two points.
pub fn point_distance(a: Point<f64>, b: Point<f64>) -> f64 {
    a.euclidean_distance(&b)
}

/// The point on (or in) `g` closest to `p`.
///
/// If `p` lies inside `g` the answer is `p` itself, so translating a target
/// toward an already-covering reference is a no-op.
pub fn nearest_point_on(g: &MultiPolygon<f64>, p: Point<f64>) -> Point<f64> {
    match g.closest_point(&p) {
        Closest::Intersection(q) | Closest::SinglePoint(q) => q,
        // Only empty geometries are indeterminate; fall back to no movement.
        Closest::Indeterminate => p,
    }
}

/// Rigid translation. Shape and orientation are preserved.
pub fn translate(g: &MultiPolygon<f64>, dx: f64, dy: f64) -> MultiPolygon<f64> {
    g.translate(dx, dy)
}

/// Outward buffer by `distance`.
pub fn buffer(g: &MultiPolygon<f64>, distance: f64) -> MultiPolygon<f64> {
    geo_buffer::buffer_multi_polygon(g, distance)
}

/// Douglas-Peucker simplification with the given tolerance.
pub fn simplify(g: &MultiPolygon<f64>, tolerance: f64) -> MultiPolygon<f64> {
    g.simplify(&tolerance)
}

/// Axis-aligned bounding box, if the geometry is non-empty.
pub fn bounding_box(g: &MultiPolygon<f64>) -> Option<Rect<f64>> {
    g.bounding_rect()
}

/// Union a list of geometries into one (possibly multi-part) geometry.
///
/// Pairwise divide-and-conquer: unioning balanced halves keeps intermediate
/// results small instead of accreting one giant accumulator.
pub fn union_all(parts: &[MultiPolygon<f64>]) -> MultiPolygon<f64> {
    match parts.len() {
        0 => MultiPolygon(vec![]),
        1 => parts[0].clone(),
        n => {
            let (left, right) = parts.split_at(n / 2);
            union_all(left).union(&union_all(right))
        }
    }
}

/// Split a multi-part geometry into its single-part components.
///
/// A single-part input yields a one-element vector.
pub fn decompose(g: &MultiPolygon<f64>) -> Vec<MultiPolygon<f64>> {
    g.0.iter()
        .map(|poly| MultiPolygon(vec![poly.clone()]))
        .collect()
}

/// Is the geometry usable for alignment?
///
/// Rejects empty geometries, non-finite coordinates, and degenerate
/// (zero-area) polygons. Targets failing this check are diverted to the
/// invalid-geometry report rather than classified.
pub fn is_valid(g: &MultiPolygon<f64>) -> bool {
    if g.0.is_empty() {
        return false;
    }
    if !g.coords_iter().all(|c| c.x.is_finite() && c.y.is_finite()) {
        return false;
    }
    g.unsigned_area() > 0.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{polygon, Coord};

    fn square(minx: f64, miny: f64, maxx: f64, maxy: f64) -> MultiPolygon<f64> {
        MultiPolygon(vec![polygon![
            (x: minx, y: miny),
            (x: maxx, y: miny),
            (x: maxx, y: maxy),
            (x: minx, y: maxy),
            (x: minx, y: miny),
        ]])
    }

    #[test]
    fn test_area_of_unit_square() {
        assert!((area(&square(0.0, 0.0, 1.0, 1.0)) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_intersection_area_half_overlap() {
        let a = square(0.0, 0.0, 2.0, 2.0);
        let b = square(1.0, 0.0, 3.0, 2.0);
        assert!((intersection_area(&a, &b) - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_within() {
        let inner = square(1.0, 1.0, 2.0, 2.0);
        let outer = square(0.0, 0.0, 3.0, 3.0);
        assert!(within(&inner, &outer));
        assert!(!within(&outer, &inner));
    }

    #[test]
    fn test_touches_shared_edge() {
        let a = square(0.0, 0.0, 1.0, 1.0);
        let b = square(1.0, 0.0, 2.0, 1.0);
        assert!(touches(&a, &b));

        let c = square(5.0, 5.0, 6.0, 6.0);
        assert!(!touches(&a, &c));
    }

    #[test]
    fn test_nearest_point_outside() {
        let g = square(0.0, 0.0, 1.0, 1.0);
        let p = nearest_point_on(&g, Point::new(2.0, 0.5));
        assert!((p.x() - 1.0).abs() < 1e-9);
        assert!((p.y() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_nearest_point_inside_is_identity() {
        let g = square(0.0, 0.0, 1.0, 1.0);
        let p = nearest_point_on(&g, Point::new(0.5, 0.5));
        assert!((p.x() - 0.5).abs() < 1e-9);
        assert!((p.y() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_translate_preserves_area() {
        let g = square(0.0, 0.0, 3.0, 2.0);
        let moved = translate(&g, 10.0, -4.0);
        assert!((area(&moved) - area(&g)).abs() < 1e-9);
        let c = centroid(&moved).unwrap();
        assert!((c.x() - 11.5).abs() < 1e-9);
        assert!((c.y() - (-3.0)).abs() < 1e-9);
    }

    #[test]
    fn test_union_all_disjoint_stays_multi_part() {
        let parts = vec![square(0.0, 0.0, 1.0, 1.0), square(5.0, 5.0, 6.0, 6.0)];
        let unioned = union_all(&parts);
        assert_eq!(decompose(&unioned).len(), 2);
    }

    #[test]
    fn test_union_all_overlapping_fuses() {
        let parts = vec![square(0.0, 0.0, 2.0, 2.0), square(1.0, 0.0, 3.0, 2.0)];
        let unioned = union_all(&parts);
        assert_eq!(decompose(&unioned).len(), 1);
        assert!((area(&unioned) - 6.0).abs() < 1e-6);
    }

    #[test]
    fn test_union_all_empty() {
        assert!(union_all(&[]).0.is_empty());
    }

    #[test]
    fn test_is_valid_rejects_empty_and_nan() {
        assert!(!is_valid(&MultiPolygon(vec![])));
        assert!(is_valid(&square(0.0, 0.0, 1.0, 1.0)));

        let mut bad = square(0.0, 0.0, 1.0, 1.0);
        bad.0[0].exterior_mut(|ls| {
            ls.0[0] = Coord {
                x: f64::NAN,
                y: 0.0,
            };
        });
        assert!(!is_valid(&bad));
    }
}
