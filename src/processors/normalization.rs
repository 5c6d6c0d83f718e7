//! Intensity normalization for model input and for display.
//!
//! Two conversions live here:
//! - [`normalize_percentile`] rescales raw intensities so the 1st percentile
//!   maps to 0 and the 99th to 1, the input convention of the cytoplasm model;
//! - [`to_display_u8`] turns an image into 8-bit samples for rendering, passing
//!   8-bit sources through untouched and min-max scaling everything else.

use crate::core::constants::{
    DEFAULT_PARALLEL_THRESHOLD, NORMALIZE_LOWER_PERCENTILE, NORMALIZE_UPPER_PERCENTILE,
};
use crate::domain::{MicroscopyImage, SampleFormat};
use image::RgbImage;
use ndarray::{Array2, Array3, ArrayView2, Axis};
use rayon::prelude::*;

/// Returns the `q`-th percentile (0..=100) of `values` with linear interpolation.
///
/// Returns 0 for an empty slice.
pub fn percentile(values: &[f32], q: f32) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let rank = (q.clamp(0.0, 100.0) / 100.0) * (sorted.len() - 1) as f32;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let weight = rank - lower as f32;
    sorted[lower] + (sorted[upper] - sorted[lower]) * weight
}

/// Rescales intensities so the 1st percentile becomes 0 and the 99th becomes 1.
///
/// Values outside the percentile window are not clipped. A flat image (equal
/// percentiles) normalizes to zeros.
pub fn normalize_percentile(channel: ArrayView2<'_, f32>) -> Array2<f32> {
    let values: Vec<f32> = channel.iter().copied().collect();
    let low = percentile(&values, NORMALIZE_LOWER_PERCENTILE);
    let high = percentile(&values, NORMALIZE_UPPER_PERCENTILE);
    let range = high - low;

    if range <= f32::EPSILON {
        return Array2::zeros(channel.raw_dim());
    }

    let mut normalized = channel.to_owned();
    let scale = |row: ndarray::ArrayViewMut1<'_, f32>| {
        let mut row = row;
        row.mapv_inplace(|v| (v - low) / range);
    };
    if normalized.nrows() > DEFAULT_PARALLEL_THRESHOLD {
        normalized
            .axis_iter_mut(Axis(0))
            .into_par_iter()
            .for_each(scale);
    } else {
        normalized.axis_iter_mut(Axis(0)).for_each(scale);
    }
    normalized
}

/// Converts an image to RGB8 for display.
///
/// 8-bit images are used as-is. Other formats are min-max scaled over all
/// colour samples to 0..=255; a flat image becomes black. Grey and grey+alpha
/// images are replicated to three channels, alpha is dropped.
pub fn to_display_u8(image: &MicroscopyImage) -> RgbImage {
    let view = image.view();
    let (height, width, channels) = view.dim();
    let color_channels = if channels >= 3 { 3 } else { 1 };

    let (offset, scale) = match image.format() {
        SampleFormat::U8 => (0.0, 1.0),
        SampleFormat::U16 | SampleFormat::F32 => {
            let (min, max) = (0..color_channels)
                .flat_map(|c| image.channel(c).iter().copied().collect::<Vec<_>>())
                .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), v| {
                    (lo.min(v), hi.max(v))
                });
            if max <= min {
                (min, 0.0)
            } else {
                (min, 255.0 / (max - min))
            }
        }
    };

    let to_u8 = |v: f32| ((v - offset) * scale).round().clamp(0.0, 255.0) as u8;

    let mut rgb = Array3::<u8>::zeros((height, width, 3));
    let fill_row = |(y, mut row): (usize, ndarray::ArrayViewMut2<'_, u8>)| {
        for x in 0..width {
            for c in 0..3 {
                let source = if color_channels == 3 { c } else { 0 };
                row[[x, c]] = to_u8(view[[y, x, source]]);
            }
        }
    };
    if height > DEFAULT_PARALLEL_THRESHOLD {
        rgb.axis_iter_mut(Axis(0))
            .into_par_iter()
            .enumerate()
            .for_each(fill_row);
    } else {
        rgb.axis_iter_mut(Axis(0)).enumerate().for_each(fill_row);
    }

    let (raw, _) = rgb.into_raw_vec_and_offset();
    RgbImage::from_raw(width as u32, height as u32, raw)
        .unwrap_or_else(|| RgbImage::new(width as u32, height as u32))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_percentile_interpolates() {
        let values = [0.0, 10.0, 20.0, 30.0, 40.0];
        assert_eq!(percentile(&values, 0.0), 0.0);
        assert_eq!(percentile(&values, 100.0), 40.0);
        assert_eq!(percentile(&values, 50.0), 20.0);
        assert!((percentile(&values, 12.5) - 5.0).abs() < 1e-5);
        assert_eq!(percentile(&[], 50.0), 0.0);
    }

    #[test]
    fn test_normalize_percentile_maps_window_to_unit_range() {
        let channel = Array2::from_shape_fn((10, 10), |(y, x)| (y * 10 + x) as f32);
        let normalized = normalize_percentile(channel.view());

        let low = percentile(&channel.iter().copied().collect::<Vec<_>>(), 1.0);
        let high = percentile(&channel.iter().copied().collect::<Vec<_>>(), 99.0);
        let expected_first = (0.0 - low) / (high - low);
        assert!((normalized[[0, 0]] - expected_first).abs() < 1e-5);
        assert!(normalized[[0, 0]] < 0.0);
        assert!(normalized[[9, 9]] > 1.0);
    }

    #[test]
    fn test_normalize_flat_image_is_zero() {
        let channel = Array2::from_elem((4, 4), 7.0f32);
        let normalized = normalize_percentile(channel.view());
        assert!(normalized.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_display_u8_passthrough() {
        let image =
            MicroscopyImage::from_gray(array![[0.0, 128.0], [255.0, 3.0]], SampleFormat::U8)
                .unwrap();
        let rgb = to_display_u8(&image);
        assert_eq!(rgb.get_pixel(1, 0).0, [128, 128, 128]);
        assert_eq!(rgb.get_pixel(1, 1).0, [3, 3, 3]);
    }

    #[test]
    fn test_display_u16_min_max_scaled() {
        let image = MicroscopyImage::from_gray(
            array![[1000.0, 2000.0], [3000.0, 1000.0]],
            SampleFormat::U16,
        )
        .unwrap();
        let rgb = to_display_u8(&image);
        assert_eq!(rgb.get_pixel(0, 0).0, [0, 0, 0]);
        assert_eq!(rgb.get_pixel(0, 1).0, [255, 255, 255]);
        assert_eq!(rgb.get_pixel(1, 0).0, [128, 128, 128]);
    }

    #[test]
    fn test_display_flat_float_is_black() {
        let image =
            MicroscopyImage::from_gray(Array2::from_elem((3, 3), 0.7), SampleFormat::F32)
                .unwrap();
        let rgb = to_display_u8(&image);
        assert!(rgb.pixels().all(|p| p.0 == [0, 0, 0]));
    }

    #[test]
    fn test_display_rgba_drops_alpha() {
        let data = Array3::from_shape_vec((1, 1, 4), vec![10.0, 20.0, 30.0, 0.0]).unwrap();
        let image = MicroscopyImage::new(data, SampleFormat::U8).unwrap();
        let rgb = to_display_u8(&image);
        assert_eq!(rgb.get_pixel(0, 0).0, [10, 20, 30]);
    }

    #[test]
    fn test_tall_images_match_row_by_row_result() {
        let rows = DEFAULT_PARALLEL_THRESHOLD + 44;
        let channel = Array2::from_shape_fn((rows, 3), |(y, x)| (y * 3 + x) as f32);
        let normalized = normalize_percentile(channel.view());

        let values: Vec<f32> = channel.iter().copied().collect();
        let low = percentile(&values, 1.0);
        let high = percentile(&values, 99.0);
        for (&raw, &scaled) in channel.iter().zip(normalized.iter()) {
            assert!((scaled - (raw - low) / (high - low)).abs() < 1e-5);
        }

        let image = MicroscopyImage::from_gray(
            Array2::from_shape_fn((rows, 2), |(y, _)| (y % 256) as f32),
            SampleFormat::U8,
        )
        .unwrap();
        let rgb = to_display_u8(&image);
        assert_eq!(rgb.dimensions(), (2, rows as u32));
        assert_eq!(rgb.get_pixel(1, 299).0, [43, 43, 43]);
    }
}
