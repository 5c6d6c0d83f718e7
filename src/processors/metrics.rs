//! Cell count and area statistics derived from a label mask.

use crate::domain::{LabelMask, PixelSize};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Summary statistics for one segmented image.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricsResult {
    /// Number of distinct nonzero labels.
    pub cell_count: usize,
    /// Mean object area in pixels; 0 when there are no objects.
    pub mean_area_pixels: f64,
    /// Mean object area in µm², present only when a pixel size was given.
    pub mean_area_microns: Option<f64>,
}

/// Area of a single labelled object.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerLabelArea {
    /// Object label.
    pub label: u32,
    /// Pixel count.
    pub area_pixels: usize,
    /// Area in µm², present only when a pixel size was given.
    pub area_microns: Option<f64>,
}

impl MetricsResult {
    /// One-line human readable summary, e.g.
    /// `Cells: 2    Mean area: 1.5 px^2 (0.38 µm^2)`.
    pub fn summary_line(&self) -> String {
        let mut line = format!(
            "Cells: {}    Mean area: {:.1} px^2",
            self.cell_count, self.mean_area_pixels
        );
        if let Some(microns) = self.mean_area_microns {
            line.push_str(&format!(" ({:.2} µm^2)", microns));
        }
        line
    }
}

impl fmt::Display for MetricsResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.summary_line())
    }
}

fn label_areas(mask: &LabelMask) -> BTreeMap<u32, usize> {
    let mut areas = BTreeMap::new();
    for &label in mask.view().iter().filter(|&&label| label != 0) {
        *areas.entry(label).or_insert(0usize) += 1;
    }
    areas
}

/// Counts objects in `mask` and averages their areas.
///
/// With a pixel size `p` the physical mean is exactly `mean_area_pixels * p²`.
/// An all-background mask yields zero cells and zero areas.
pub fn compute_metrics(mask: &LabelMask, pixel_size: Option<PixelSize>) -> MetricsResult {
    let areas = label_areas(mask);
    let cell_count = areas.len();
    let total: usize = areas.values().sum();
    let mean_area_pixels = if cell_count == 0 {
        0.0
    } else {
        total as f64 / cell_count as f64
    };

    MetricsResult {
        cell_count,
        mean_area_pixels,
        mean_area_microns: pixel_size.map(|p| mean_area_pixels * p.pixel_area()),
    }
}

/// Area of every object, in ascending label order.
pub fn per_label_areas(mask: &LabelMask, pixel_size: Option<PixelSize>) -> Vec<PerLabelArea> {
    label_areas(mask)
        .into_iter()
        .map(|(label, area_pixels)| PerLabelArea {
            label,
            area_pixels,
            area_microns: pixel_size.map(|p| area_pixels as f64 * p.pixel_area()),
        })
        .collect()
}
