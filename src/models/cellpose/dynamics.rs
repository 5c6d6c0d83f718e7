//! Mask reconstruction from predicted flow fields.
//!
//! Every foreground pixel is advected along the predicted flows until it
//! settles near the centre of its object. Pixels that settle in the same
//! neighbourhood form one mask.

use super::preprocess::NetworkOutput;
use ndarray::{Array2, ArrayView2, Zip, s};
use rayon::prelude::*;
use std::collections::VecDeque;
use tracing::debug;

/// Padding added around the image when histogramming converged positions.
const HISTOGRAM_PADDING: usize = 20;

/// Half width of the max filter used to find seeds (5×5 window).
const SEED_WINDOW_RADIUS: usize = 2;

/// Bins need more than this many hits to become a seed.
const SEED_MIN_COUNT: f32 = 10.0;

/// Bins need more than this many hits to join a growing seed.
const EXPAND_MIN_COUNT: f32 = 2.0;

/// Growth iterations applied to every seed.
const EXPAND_ITERATIONS: usize = 5;

/// Flows are divided by this before integration.
const FLOW_SCALE: f32 = 5.0;

/// Parameters of the mask decoding.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DynamicsParams {
    /// Cell probability logit above which a pixel is foreground.
    pub cellprob_threshold: f32,
    /// Number of Euler steps.
    pub niter: usize,
    /// Minimum mask size in pixels.
    pub min_size: usize,
    /// Largest allowed mask as a fraction of the image.
    pub max_mask_fraction: f32,
}

/// Decodes network output into a label mask of the same size.
///
/// Labels are consecutive, starting at 1, in raster order of the seeds'
/// processing. Pixels that converge nowhere stay background.
pub fn compute_masks(output: &NetworkOutput, params: &DynamicsParams) -> Array2<u32> {
    let shape = output.cellprob.dim();
    let foreground = output.cellprob.mapv(|p| p > params.cellprob_threshold);

    let pixels: Vec<(usize, usize)> = foreground
        .indexed_iter()
        .filter_map(|(index, &is_cell)| is_cell.then_some(index))
        .collect();
    if pixels.is_empty() {
        debug!("no foreground pixels above threshold");
        return Array2::zeros(shape);
    }

    let mask_scale = foreground.mapv(|is_cell| if is_cell { 1.0 / FLOW_SCALE } else { 0.0 });
    let dy = &output.dy * &mask_scale;
    let dx = &output.dx * &mask_scale;

    let positions = follow_flows(dy.view(), dx.view(), &pixels, params.niter);
    let mut masks = cluster_positions(&pixels, &positions, shape);
    debug!(
        "{} foreground pixels clustered into {} raw masks",
        pixels.len(),
        masks.iter().copied().max().unwrap_or(0)
    );

    remove_large_masks(&mut masks, params.max_mask_fraction);
    fill_holes_and_remove_small_masks(&mut masks, params.min_size);
    masks
}

/// Integrates each pixel along the flow field for `niter` steps.
///
/// Flows are sampled with bilinear interpolation and positions are clamped to
/// the image. Returns the final `(y, x)` position of every start pixel.
pub fn follow_flows(
    dy: ArrayView2<'_, f32>,
    dx: ArrayView2<'_, f32>,
    pixels: &[(usize, usize)],
    niter: usize,
) -> Vec<(f32, f32)> {
    let (height, width) = dy.dim();
    let max_y = height.saturating_sub(1) as f32;
    let max_x = width.saturating_sub(1) as f32;

    pixels
        .par_iter()
        .map(|&(y, x)| {
            let (mut py, mut px) = (y as f32, x as f32);
            for _ in 0..niter {
                let step_y = bilinear(dy, py, px);
                let step_x = bilinear(dx, py, px);
                py = (py + step_y).clamp(0.0, max_y);
                px = (px + step_x).clamp(0.0, max_x);
            }
            (py, px)
        })
        .collect()
}

fn bilinear(plane: ArrayView2<'_, f32>, y: f32, x: f32) -> f32 {
    let (height, width) = plane.dim();
    let y0 = y.floor().max(0.0) as usize;
    let x0 = x.floor().max(0.0) as usize;
    let y0 = y0.min(height - 1);
    let x0 = x0.min(width - 1);
    let y1 = (y0 + 1).min(height - 1);
    let x1 = (x0 + 1).min(width - 1);
    let wy = y - y0 as f32;
    let wx = x - x0 as f32;

    let top = plane[[y0, x0]] * (1.0 - wx) + plane[[y0, x1]] * wx;
    let bottom = plane[[y1, x0]] * (1.0 - wx) + plane[[y1, x1]] * wx;
    top * (1.0 - wy) + bottom * wy
}

/// Groups converged positions into masks.
///
/// Positions are binned on a grid padded by [`HISTOGRAM_PADDING`]. Local
/// maxima of a 5×5 max filter with more than [`SEED_MIN_COUNT`] hits become
/// seeds, processed by decreasing count. Each seed grows into 3×3 neighbours
/// with more than [`EXPAND_MIN_COUNT`] hits; later seeds win contested bins.
pub fn cluster_positions(
    pixels: &[(usize, usize)],
    positions: &[(f32, f32)],
    shape: (usize, usize),
) -> Array2<u32> {
    let pad = HISTOGRAM_PADDING;
    let hist_shape = (shape.0 + 2 * pad, shape.1 + 2 * pad);
    let bin = |(py, px): (f32, f32)| (py.max(0.0) as usize + pad, px.max(0.0) as usize + pad);

    let mut histogram = Array2::<f32>::zeros(hist_shape);
    for &position in positions {
        histogram[bin(position)] += 1.0;
    }

    let local_max = max_filter(histogram.view(), SEED_WINDOW_RADIUS);
    let mut seeds: Vec<(f32, usize, usize)> = Zip::indexed(&histogram)
        .and(&local_max)
        .fold(Vec::new(), |mut acc, (y, x), &count, &max| {
            if count > SEED_MIN_COUNT && count - max > -1e-6 {
                acc.push((count, y, x));
            }
            acc
        });
    seeds.sort_by(|a, b| b.0.total_cmp(&a.0));

    let mut bin_labels = Array2::<u32>::zeros(hist_shape);
    for (index, &(_, sy, sx)) in seeds.iter().enumerate() {
        let region = grow_seed(&histogram, (sy, sx));
        let label = index as u32 + 1;
        for point in region {
            bin_labels[point] = label;
        }
    }

    let mut masks = Array2::<u32>::zeros(shape);
    for (&pixel, &position) in pixels.iter().zip(positions) {
        masks[pixel] = bin_labels[bin(position)];
    }
    masks
}

fn grow_seed(histogram: &Array2<f32>, seed: (usize, usize)) -> Vec<(usize, usize)> {
    let (height, width) = histogram.dim();
    let mut region = vec![seed];
    for _ in 0..EXPAND_ITERATIONS {
        let mut grown = Vec::with_capacity(region.len() * 9);
        for &(y, x) in &region {
            for ny in y.saturating_sub(1)..=(y + 1).min(height - 1) {
                for nx in x.saturating_sub(1)..=(x + 1).min(width - 1) {
                    if histogram[[ny, nx]] > EXPAND_MIN_COUNT {
                        grown.push((ny, nx));
                    }
                }
            }
        }
        grown.sort_unstable();
        grown.dedup();
        region = grown;
    }
    region
}

/// Square max filter of half width `radius`; the window is clipped at borders.
pub fn max_filter(values: ArrayView2<'_, f32>, radius: usize) -> Array2<f32> {
    let (height, width) = values.dim();
    let mut rows = Array2::<f32>::zeros((height, width));
    for y in 0..height {
        for x in 0..width {
            let lo = x.saturating_sub(radius);
            let hi = (x + radius).min(width - 1);
            rows[[y, x]] = values
                .slice(s![y, lo..=hi])
                .fold(f32::NEG_INFINITY, |m, &v| m.max(v));
        }
    }

    let mut filtered = Array2::<f32>::zeros((height, width));
    for y in 0..height {
        let lo = y.saturating_sub(radius);
        let hi = (y + radius).min(height - 1);
        for x in 0..width {
            filtered[[y, x]] = rows
                .slice(s![lo..=hi, x])
                .fold(f32::NEG_INFINITY, |m, &v| m.max(v));
        }
    }
    filtered
}

/// Clears masks larger than `max_fraction` of the image.
pub fn remove_large_masks(masks: &mut Array2<u32>, max_fraction: f32) {
    let limit = masks.len() as f64 * max_fraction as f64;
    let counts = label_counts(masks);
    let oversized: Vec<u32> = counts
        .iter()
        .enumerate()
        .skip(1)
        .filter(|&(_, &count)| count as f64 > limit)
        .map(|(label, _)| label as u32)
        .collect();

    if !oversized.is_empty() {
        debug!("removing {} oversized masks", oversized.len());
        masks.mapv_inplace(|label| if oversized.contains(&label) { 0 } else { label });
    }
}

fn label_counts(masks: &Array2<u32>) -> Vec<usize> {
    let max_label = masks.iter().copied().max().unwrap_or(0) as usize;
    let mut counts = vec![0usize; max_label + 1];
    for &label in masks {
        counts[label as usize] += 1;
    }
    counts
}

/// Drops masks under `min_size` pixels, fills holes in the rest and renumbers
/// the survivors 1..N in ascending order of their previous label.
pub fn fill_holes_and_remove_small_masks(masks: &mut Array2<u32>, min_size: usize) {
    let boxes = bounding_boxes(masks);
    let mut next_label = 0u32;

    for (index, bbox) in boxes.iter().enumerate() {
        let Some((y0, y1, x0, x1)) = *bbox else {
            continue;
        };
        let label = index as u32 + 1;
        let mut window = masks.slice_mut(s![y0..=y1, x0..=x1]);
        let member = window.mapv(|v| v == label);
        let pixel_count = member.iter().filter(|&&m| m).count();

        if min_size > 0 && pixel_count < min_size {
            Zip::from(&mut window).and(&member).for_each(|v, &m| {
                if m {
                    *v = 0;
                }
            });
        } else if pixel_count > 0 {
            next_label += 1;
            let filled = fill_holes(&member);
            Zip::from(&mut window).and(&filled).for_each(|v, &m| {
                if m {
                    *v = next_label;
                }
            });
        }
    }
}

/// Inclusive `(y0, y1, x0, x1)` box per label, indexed by `label - 1`.
fn bounding_boxes(masks: &Array2<u32>) -> Vec<Option<(usize, usize, usize, usize)>> {
    let max_label = masks.iter().copied().max().unwrap_or(0) as usize;
    let mut boxes: Vec<Option<(usize, usize, usize, usize)>> = vec![None; max_label];
    for ((y, x), &label) in masks.indexed_iter() {
        if label == 0 {
            continue;
        }
        let entry = &mut boxes[label as usize - 1];
        *entry = Some(match *entry {
            None => (y, y, x, x),
            Some((y0, y1, x0, x1)) => (y0.min(y), y1.max(y), x0.min(x), x1.max(x)),
        });
    }
    boxes
}

/// Marks background pixels not 4-connected to the window border as part of the mask.
pub fn fill_holes(member: &Array2<bool>) -> Array2<bool> {
    let (height, width) = member.dim();
    let mut outside = Array2::<bool>::from_elem((height, width), false);
    let mut queue = VecDeque::new();

    for y in 0..height {
        for x in 0..width {
            let on_border = y == 0 || x == 0 || y == height - 1 || x == width - 1;
            if on_border && !member[[y, x]] {
                outside[[y, x]] = true;
                queue.push_back((y, x));
            }
        }
    }

    while let Some((y, x)) = queue.pop_front() {
        let neighbours = [
            (y.wrapping_sub(1), x),
            (y + 1, x),
            (y, x.wrapping_sub(1)),
            (y, x + 1),
        ];
        for (ny, nx) in neighbours {
            if ny < height && nx < width && !member[[ny, nx]] && !outside[[ny, nx]] {
                outside[[ny, nx]] = true;
                queue.push_back((ny, nx));
            }
        }
    }

    outside.mapv(|is_outside| !is_outside)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn params() -> DynamicsParams {
        DynamicsParams {
            cellprob_threshold: 0.0,
            niter: 200,
            min_size: 15,
            max_mask_fraction: 0.4,
        }
    }

    /// Discs with unit flows pointing at their centres, as a trained network
    /// would predict for round cells.
    fn synthetic_output(size: usize, discs: &[(f32, f32, f32)]) -> NetworkOutput {
        let mut dy = Array2::<f32>::zeros((size, size));
        let mut dx = Array2::<f32>::zeros((size, size));
        let mut cellprob = Array2::<f32>::from_elem((size, size), -5.0);

        for y in 0..size {
            for x in 0..size {
                for &(cy, cx, radius) in discs {
                    let (vy, vx) = (cy - y as f32, cx - x as f32);
                    let distance = (vy * vy + vx * vx).sqrt();
                    if distance <= radius {
                        dy[[y, x]] = vy / distance;
                        dx[[y, x]] = vx / distance;
                        cellprob[[y, x]] = 5.0;
                    }
                }
            }
        }
        NetworkOutput { dy, dx, cellprob }
    }

    #[test]
    fn test_two_discs_become_two_masks() {
        let output = synthetic_output(48, &[(12.5, 12.5, 6.0), (32.5, 30.5, 6.0)]);
        let masks = compute_masks(&output, &params());

        let first = masks[[12, 12]];
        let second = masks[[32, 30]];
        assert_ne!(first, 0);
        assert_ne!(second, 0);
        assert_ne!(first, second);
        assert_eq!(masks.iter().copied().max(), Some(2));
        assert_eq!(masks[[0, 0]], 0);
        assert_eq!(masks[[12, 16]], first);
    }

    #[test]
    fn test_small_objects_are_dropped() {
        let output = synthetic_output(40, &[(12.5, 12.5, 6.0), (30.5, 30.5, 1.5)]);
        let masks = compute_masks(&output, &params());
        assert_eq!(masks.iter().copied().max(), Some(1));
        assert_eq!(masks[[30, 30]], 0);
    }

    #[test]
    fn test_empty_probability_gives_background() {
        let output = NetworkOutput {
            dy: Array2::zeros((8, 8)),
            dx: Array2::zeros((8, 8)),
            cellprob: Array2::from_elem((8, 8), -1.0),
        };
        let masks = compute_masks(&output, &params());
        assert!(masks.iter().all(|&v| v == 0));
    }

    #[test]
    fn test_follow_flows_converges_and_clamps() {
        let dy = Array2::from_elem((5, 5), 1.0f32);
        let dx = Array2::from_elem((5, 5), -1.0f32);
        let positions = follow_flows(dy.view(), dx.view(), &[(0, 4), (2, 2)], 10);
        assert_eq!(positions, vec![(4.0, 0.0), (4.0, 0.0)]);
    }

    #[test]
    fn test_max_filter_window() {
        let values = array![
            [0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
            [0.0, 9.0, 0.0, 0.0, 0.0, 0.0],
            [0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
            [0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
        ];
        let filtered = max_filter(values.view(), 2);
        assert_eq!(filtered[[3, 3]], 9.0);
        assert_eq!(filtered[[0, 4]], 0.0);
    }

    #[test]
    fn test_remove_large_masks() {
        let mut masks = array![[1, 1, 1], [1, 1, 2], [0, 0, 0]];
        remove_large_masks(&mut masks, 0.4);
        assert_eq!(masks, array![[0, 0, 0], [0, 0, 2], [0, 0, 0]]);
    }

    #[test]
    fn test_fill_holes() {
        let ring = array![
            [true, true, true],
            [true, false, true],
            [true, true, true],
        ];
        assert!(fill_holes(&ring).iter().all(|&v| v));

        let open = array![[true, false, true], [true, false, true]];
        assert_eq!(fill_holes(&open), open);
    }

    #[test]
    fn test_fill_holes_and_remove_small_masks_renumbers() {
        let mut masks = array![
            [0, 0, 0, 0, 0, 0],
            [5, 5, 5, 0, 9, 0],
            [5, 0, 5, 0, 0, 0],
            [5, 5, 5, 0, 7, 7],
        ];
        fill_holes_and_remove_small_masks(&mut masks, 2);
        assert_eq!(
            masks,
            array![
                [0, 0, 0, 0, 0, 0],
                [1, 1, 1, 0, 0, 0],
                [1, 1, 1, 0, 0, 0],
                [1, 1, 1, 0, 2, 2],
            ]
        );
    }
}
