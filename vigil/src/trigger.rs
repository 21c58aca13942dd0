//! # Trigger filter

use crate::contour::Contour;
use crate::frame::Rect;

/// Decide whether a frame is interesting.
///
/// A frame qualifies if any single contour both meets the minimum area and
/// has a bounding box strictly overlapping the region of interest. Area is
/// never aggregated across contours, and evaluation stops at the first
/// qualifying one.
pub fn should_emit(contours: &[Contour], roi: &Rect, min_area: f64) -> bool {
    contours
        .iter()
        .any(|c| c.area >= min_area && c.bounding_box.overlaps(roi))
}
