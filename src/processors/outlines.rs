//! Object boundary extraction.

use crate::domain::LabelMask;
use ndarray::Array2;

/// Marks the boundary pixels of every object in `mask`.
///
/// A labelled pixel is on the boundary when one of its four neighbours holds a
/// different value. Pixels on the image edge count as boundary, so objects cut
/// by the border still get closed outlines.
pub fn masks_to_outlines(mask: &LabelMask) -> Array2<bool> {
    let labels = mask.view();
    let (height, width) = labels.dim();

    Array2::from_shape_fn((height, width), |(y, x)| {
        let label = labels[[y, x]];
        if label == 0 {
            return false;
        }
        if y == 0 || x == 0 || y + 1 == height || x + 1 == width {
            return true;
        }
        labels[[y - 1, x]] != label
            || labels[[y + 1, x]] != label
            || labels[[y, x - 1]] != label
            || labels[[y, x + 1]] != label
    })
}
