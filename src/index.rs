//! Bounding-box index over the reference set.
//!
//! Uses an R-tree so each target retrieves its overlap candidates in
//! O(log n) instead of scanning every reference. The index only narrows the
//! search: it returns every reference whose bounding box intersects the
//! query box (no false negatives), and the caller filters the false
//! positives with exact predicates.

use geo::Rect;
use rstar::{RTree, RTreeObject, AABB};

use crate::geometry;
use crate::reference::ReferenceSet;

/// A reference bounding box stored in the R-tree, tagged with its id.
#[derive(Clone, Debug)]
struct IndexedBox {
    envelope: AABB<[f64; 2]>,
    id: usize,
}

impl RTreeObject for IndexedBox {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// Read-only spatial index over a [`ReferenceSet`].
///
/// Built once after the reference set is frozen; rebuilt from scratch if the
/// set ever changes (never patched in place).
#[derive(Clone, Debug)]
pub struct CandidateIndex {
    tree: RTree<IndexedBox>,
}

impl CandidateIndex {
    /// Build the index from a reference set.
    pub fn build(references: &ReferenceSet) -> Self {
        let boxes: Vec<IndexedBox> = references
            .iter()
            .filter_map(|(id, record)| {
                let rect = geometry::bounding_box(&record.feature.geometry)?;
                Some(IndexedBox {
                    envelope: AABB::from_corners(
                        [rect.min().x, rect.min().y],
                        [rect.max().x, rect.max().y],
                    ),
                    id,
                })
            })
            .collect();

        Self {
            tree: RTree::bulk_load(boxes),
        }
    }

    /// Number of indexed references.
    pub fn len(&self) -> usize {
        self.tree.size()
    }

    /// Check if the index is empty.
    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }

    /// Ids of all references whose bounding box intersects `bbox`.
    ///
    /// Sorted ascending so downstream iteration order never depends on tree
    /// internals.
    pub fn query(&self, bbox: Rect<f64>) -> Vec<usize> {
        let envelope =
            AABB::from_corners([bbox.min().x, bbox.min().y], [bbox.max().x, bbox.max().y]);
        let mut ids: Vec<usize> = self
            .tree
            .locate_in_envelope_intersecting(&envelope)
            .map(|b| b.id)
            .collect();
        ids.sort_unstable();
        ids
    }
}
