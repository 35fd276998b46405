//! Text hit-testing and drag state for select mode.

use crate::shapes::{Path, PathId};
use kurbo::Point;

/// Index of the topmost text path whose bounding box contains `point`.
///
/// Later paths draw on top of earlier ones, so the search runs back to front.
pub fn hit_test_text(paths: &[Path], point: Point) -> Option<usize> {
    paths
        .iter()
        .enumerate()
        .rev()
        .find(|(_, path)| {
            path.as_text()
                .is_some_and(|text| text.bounding_box().contains(point))
        })
        .map(|(index, _)| index)
}

/// An in-progress drag of a selected text path.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragState {
    pub path_id: PathId,
    /// Anchor of the path when the drag began.
    pub origin_anchor: Point,
    /// Pointer position when the drag began.
    pub start: Point,
    /// Whether the pointer has moved since the press.
    pub moved: bool,
}

impl DragState {
    pub fn new(path_id: PathId, origin_anchor: Point, start: Point) -> Self {
        Self {
            path_id,
            origin_anchor,
            start,
            moved: false,
        }
    }

    /// Anchor position for the current pointer location.
    pub fn anchor_at(&self, pointer: Point) -> Point {
        self.origin_anchor + (pointer - self.start)
    }
}
