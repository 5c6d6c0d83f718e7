//! Rendering of segmentation results on top of the original image.

use super::normalization::to_display_u8;
use super::outlines::masks_to_outlines;
use crate::core::{CellError, validate_range};
use crate::domain::{LabelMask, MicroscopyImage};
use image::{Rgb, RgbImage};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// RGB8 image combining the display-normalized original with object markers.
pub type OverlayImage = RgbImage;

/// Default label colours. The first entry is used for label 1.
pub const DEFAULT_PALETTE: [[u8; 3]; 8] = [
    [255, 0, 0],
    [0, 255, 0],
    [0, 128, 255],
    [255, 255, 0],
    [255, 0, 255],
    [0, 255, 255],
    [255, 128, 0],
    [160, 96, 255],
];

/// How objects are marked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverlayStyle {
    /// Boundary pixels painted in the label colour.
    #[default]
    Outline,
    /// Every object pixel tinted with the label colour.
    Fill,
    /// Tinted interior and solid boundary.
    FillAndOutline,
}

/// Overlay appearance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    /// Marker style.
    pub style: OverlayStyle,
    /// Colours cycled through by label.
    pub palette: Vec<[u8; 3]>,
    /// Tint opacity in `[0, 1]` for the fill styles.
    pub fill_alpha: f32,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            style: OverlayStyle::Outline,
            palette: DEFAULT_PALETTE.to_vec(),
            fill_alpha: 0.4,
        }
    }
}

impl OverlayConfig {
    /// Checks the palette and opacity.
    pub fn validate(&self) -> Result<(), CellError> {
        if self.palette.is_empty() {
            return Err(CellError::config_error("overlay palette must not be empty"));
        }
        validate_range(self.fill_alpha, 0.0, 1.0, "fill_alpha")
    }

    /// Colour assigned to a nonzero `label`.
    pub fn color_for(&self, label: u32) -> Rgb<u8> {
        if self.palette.is_empty() {
            return Rgb(DEFAULT_PALETTE[0]);
        }
        let index = (label.saturating_sub(1) as usize) % self.palette.len();
        Rgb(self.palette[index])
    }
}

/// Draws `mask` over `image`.
///
/// The result is a pure function of the inputs: rendering the same image and
/// mask twice yields identical pixels.
///
/// # Errors
///
/// [`CellError::DimensionMismatch`] when the two disagree in size, and
/// [`CellError::ConfigError`] for an empty palette.
pub fn render_overlay(
    image: &MicroscopyImage,
    mask: &LabelMask,
    config: &OverlayConfig,
) -> Result<OverlayImage, CellError> {
    if image.dimensions() != mask.dimensions() {
        return Err(CellError::DimensionMismatch {
            image: image.dimensions(),
            mask: mask.dimensions(),
        });
    }
    config.validate()?;

    let mut canvas = to_display_u8(image);
    let labels = mask.view();

    if matches!(
        config.style,
        OverlayStyle::Fill | OverlayStyle::FillAndOutline
    ) {
        let alpha = config.fill_alpha;
        for ((y, x), &label) in labels.indexed_iter() {
            if label == 0 {
                continue;
            }
            let tint = config.color_for(label);
            let pixel = canvas.get_pixel_mut(x as u32, y as u32);
            for c in 0..3 {
                let blended = pixel[c] as f32 * (1.0 - alpha) + tint[c] as f32 * alpha;
                pixel[c] = blended.round().clamp(0.0, 255.0) as u8;
            }
        }
    }

    if matches!(
        config.style,
        OverlayStyle::Outline | OverlayStyle::FillAndOutline
    ) {
        let outlines = masks_to_outlines(mask);
        for ((y, x), _) in outlines.indexed_iter().filter(|(_, on)| **on) {
            canvas.put_pixel(x as u32, y as u32, config.color_for(labels[[y, x]]));
        }
    }

    debug!(
        "rendered {:?} overlay for {} labels",
        config.style,
        mask.max_label()
    );
    Ok(canvas)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SampleFormat;
    use ndarray::Array2;

    fn gray_image(width: usize, height: usize, value: f32) -> MicroscopyImage {
        MicroscopyImage::from_gray(Array2::from_elem((height, width), value), SampleFormat::U8)
            .unwrap()
    }

    fn square_mask() -> LabelMask {
        LabelMask::from_rows(&[
            vec![0, 0, 0, 0, 0],
            vec![0, 1, 1, 1, 0],
            vec![0, 1, 1, 1, 0],
            vec![0, 1, 1, 1, 0],
            vec![0, 0, 0, 0, 2],
        ])
        .unwrap()
    }

    #[test]
    fn test_outline_marks_boundary_only() {
        let image = gray_image(5, 5, 100.0);
        let overlay = render_overlay(&image, &square_mask(), &OverlayConfig::default()).unwrap();

        assert_eq!(overlay.dimensions(), (5, 5));
        assert_eq!(overlay.get_pixel(1, 1).0, [255, 0, 0]);
        assert_eq!(overlay.get_pixel(2, 2).0, [100, 100, 100]);
        assert_eq!(overlay.get_pixel(0, 0).0, [100, 100, 100]);
        assert_eq!(overlay.get_pixel(4, 4).0, [0, 255, 0]);
    }

    #[test]
    fn test_fill_blends_interior() {
        let image = gray_image(5, 5, 0.0);
        let config = OverlayConfig {
            style: OverlayStyle::Fill,
            fill_alpha: 0.5,
            ..OverlayConfig::default()
        };
        let overlay = render_overlay(&image, &square_mask(), &config).unwrap();
        assert_eq!(overlay.get_pixel(2, 2).0, [128, 0, 0]);
        assert_eq!(overlay.get_pixel(0, 0).0, [0, 0, 0]);
    }

    #[test]
    fn test_fill_and_outline() {
        let image = gray_image(5, 5, 0.0);
        let config = OverlayConfig {
            style: OverlayStyle::FillAndOutline,
            fill_alpha: 0.5,
            ..OverlayConfig::default()
        };
        let overlay = render_overlay(&image, &square_mask(), &config).unwrap();
        assert_eq!(overlay.get_pixel(2, 2).0, [128, 0, 0]);
        assert_eq!(overlay.get_pixel(1, 2).0, [255, 0, 0]);
    }

    #[test]
    fn test_rendering_is_idempotent() {
        let image = MicroscopyImage::from_gray(
            Array2::from_shape_fn((5, 5), |(y, x)| (y * 300 + x * 7) as f32),
            SampleFormat::U16,
        )
        .unwrap();
        let mask = square_mask();
        let config = OverlayConfig::default();
        let first = render_overlay(&image, &mask, &config).unwrap();
        let second = render_overlay(&image, &mask, &config).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_dimension_mismatch() {
        let image = gray_image(4, 3, 10.0);
        let mask = LabelMask::background(3, 4).unwrap();
        let result = render_overlay(&image, &mask, &OverlayConfig::default());
        assert!(matches!(
            result,
            Err(CellError::DimensionMismatch {
                image: (4, 3),
                mask: (3, 4)
            })
        ));
    }

    #[test]
    fn test_palette_cycles() {
        let config = OverlayConfig {
            palette: vec![[1, 1, 1], [2, 2, 2]],
            ..OverlayConfig::default()
        };
        assert_eq!(config.color_for(1), Rgb([1, 1, 1]));
        assert_eq!(config.color_for(2), Rgb([2, 2, 2]));
        assert_eq!(config.color_for(3), Rgb([1, 1, 1]));
    }

    #[test]
    fn test_empty_palette_rejected() {
        let config = OverlayConfig {
            palette: Vec::new(),
            ..OverlayConfig::default()
        };
        let result = render_overlay(&gray_image(2, 2, 0.0), &LabelMask::background(2, 2).unwrap(), &config);
        assert!(matches!(result, Err(CellError::ConfigError { .. })));
    }
}
