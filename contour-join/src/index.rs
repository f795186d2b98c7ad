//! Rectangle-overlap index over the members of one cluster

use contour_core::Rect;
use rstar::{Envelope, RTree, RTreeObject, SelectionFunction, AABB};

/// Containing rectangle of a cluster member with its contour index
#[derive(Clone, Copy, Debug, PartialEq)]
struct IndexedRect {
    envelope: AABB<[i64; 2]>,
    index: usize,
}

fn envelope_of(rect: &Rect) -> AABB<[i64; 2]> {
    AABB::from_corners(
        [rect.min_x as i64, rect.min_y as i64],
        [rect.max_x as i64, rect.max_y as i64],
    )
}

impl RTreeObject for IndexedRect {
    // i64 keeps rstar's internal area arithmetic clear of overflow
    type Envelope = AABB<[i64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// Selects every rectangle sharing at least one pixel with the query
struct Intersecting(AABB<[i64; 2]>);

impl SelectionFunction<IndexedRect> for Intersecting {
    fn should_unpack_parent(&self, envelope: &AABB<[i64; 2]>) -> bool {
        self.0.intersects(envelope)
    }

    fn should_unpack_leaf(&self, leaf: &IndexedRect) -> bool {
        self.0.intersects(&leaf.envelope)
    }
}

/// R-tree of cluster member rectangles
pub(crate) struct RectIndex {
    tree: RTree<IndexedRect>,
}

impl RectIndex {
    pub fn build(members: &[usize], rects: &[Rect]) -> Self {
        let items = members
            .iter()
            .map(|&index| IndexedRect {
                envelope: envelope_of(&rects[index]),
                index,
            })
            .collect();
        Self {
            tree: RTree::bulk_load(items),
        }
    }

    /// Appends to `result` the indexes of all members whose rectangle overlaps `rect`
    pub fn find_intersecting(&self, rect: &Rect, result: &mut Vec<usize>) {
        result.extend(
            self.tree
                .locate_with_selection_function(Intersecting(envelope_of(rect)))
                .map(|item| item.index),
        );
    }
}
