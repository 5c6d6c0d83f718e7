//! Integer label masks produced by segmentation.

use crate::core::CellError;
use image::{ImageBuffer, Luma};
use imageproc::region_labelling::{Connectivity, connected_components};
use ndarray::{Array2, ArrayView2};
use std::collections::BTreeMap;

/// 16-bit greyscale image holding mask labels, as written to disk.
pub type Gray16Image = ImageBuffer<Luma<u16>, Vec<u16>>;

/// A label mask: 0 is background, every positive value names one object.
///
/// Labels need not be contiguous. Masks produced by the segmentation models in
/// this crate are passed through [`LabelMask::relabel_connected`], so each
/// connected object carries its own label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelMask {
    labels: Array2<u32>,
}

impl LabelMask {
    /// Wraps an `H × W` label array.
    ///
    /// # Errors
    ///
    /// Returns [`CellError::InvalidInput`] for an empty array.
    pub fn new(labels: Array2<u32>) -> Result<Self, CellError> {
        let (height, width) = labels.dim();
        if height == 0 || width == 0 {
            return Err(CellError::invalid_input(format!(
                "label mask must be non-empty, got {}x{}",
                width, height
            )));
        }
        Ok(Self { labels })
    }

    /// Builds a mask from row slices, mainly for tests and small fixtures.
    pub fn from_rows(rows: &[Vec<u32>]) -> Result<Self, CellError> {
        let height = rows.len();
        let width = rows.first().map_or(0, Vec::len);
        if rows.iter().any(|row| row.len() != width) {
            return Err(CellError::invalid_input("label mask rows differ in length"));
        }
        let flat: Vec<u32> = rows.iter().flatten().copied().collect();
        Self::new(Array2::from_shape_vec((height, width), flat)?)
    }

    /// An all-background mask.
    pub fn background(width: u32, height: u32) -> Result<Self, CellError> {
        Self::new(Array2::zeros((height as usize, width as usize)))
    }

    /// Mask width in pixels.
    pub fn width(&self) -> u32 {
        self.labels.dim().1 as u32
    }

    /// Mask height in pixels.
    pub fn height(&self) -> u32 {
        self.labels.dim().0 as u32
    }

    /// `(width, height)` in pixels.
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width(), self.height())
    }

    /// Read-only view of the label array, indexed `[row, column]`.
    pub fn view(&self) -> ArrayView2<'_, u32> {
        self.labels.view()
    }

    /// Label at pixel `(x, y)`, `None` outside the mask.
    pub fn get(&self, x: u32, y: u32) -> Option<u32> {
        self.labels.get((y as usize, x as usize)).copied()
    }

    /// Largest label in the mask (0 for an all-background mask).
    pub fn max_label(&self) -> u32 {
        self.labels.iter().copied().max().unwrap_or(0)
    }

    /// Consumes the mask and returns the label array.
    pub fn into_inner(self) -> Array2<u32> {
        self.labels
    }

    /// Gives every 8-connected piece of every label its own label.
    ///
    /// Pixels touching only at a corner stay in the same piece. Labels are
    /// renumbered 1..N in raster order of each piece's first pixel.
    pub fn relabel_connected(&self) -> LabelMask {
        let (width, height) = self.dimensions();
        let source: ImageBuffer<Luma<u32>, Vec<u32>> =
            ImageBuffer::from_fn(width, height, |x, y| {
                Luma([self.labels[[y as usize, x as usize]]])
            });
        let components = connected_components(&source, Connectivity::Eight, Luma([0u32]));

        let labels = Array2::from_shape_fn((height as usize, width as usize), |(y, x)| {
            components.get_pixel(x as u32, y as u32)[0]
        });
        LabelMask { labels }
    }

    /// Clears objects covering fewer than `min_size` pixels and renumbers the
    /// rest 1..N in their original order.
    pub fn remove_small_objects(&self, min_size: usize) -> LabelMask {
        let counts = self.label_areas();
        let labels = self.labels.mapv(|label| match counts.get(&label) {
            Some(&area) if area < min_size => 0,
            _ => label,
        });
        LabelMask { labels }.relabel_sequential()
    }

    /// Pixel count of every nonzero label.
    fn label_areas(&self) -> BTreeMap<u32, usize> {
        let mut counts = BTreeMap::new();
        for &label in self.labels.iter().filter(|&&label| label != 0) {
            *counts.entry(label).or_insert(0) += 1;
        }
        counts
    }

    /// Renumbers labels to 1..N keeping their relative order.
    pub fn relabel_sequential(&self) -> LabelMask {
        let mut mapping: BTreeMap<u32, u32> = self
            .labels
            .iter()
            .filter(|&&label| label != 0)
            .map(|&label| (label, 0))
            .collect();
        for (next, value) in mapping.values_mut().enumerate() {
            *value = next as u32 + 1;
        }

        let labels = self
            .labels
            .mapv(|label| if label == 0 { 0 } else { mapping[&label] });
        LabelMask { labels }
    }

    /// Encodes the mask as a 16-bit greyscale image.
    ///
    /// # Errors
    ///
    /// Returns [`CellError::InvalidInput`] when a label does not fit in 16 bits.
    pub fn to_gray16(&self) -> Result<Gray16Image, CellError> {
        let max_label = self.max_label();
        if max_label > u16::MAX as u32 {
            return Err(CellError::invalid_input(format!(
                "label {} does not fit in a 16-bit mask image",
                max_label
            )));
        }
        let (width, height) = self.dimensions();
        Ok(ImageBuffer::from_fn(width, height, |x, y| {
            Luma([self.labels[[y as usize, x as usize]] as u16])
        }))
    }

    /// Decodes a mask previously written by [`LabelMask::to_gray16`].
    pub fn from_gray16(image: &Gray16Image) -> Result<Self, CellError> {
        let (width, height) = image.dimensions();
        Self::new(Array2::from_shape_fn(
            (height as usize, width as usize),
            |(y, x)| image.get_pixel(x as u32, y as u32)[0] as u32,
        ))
    }
}
