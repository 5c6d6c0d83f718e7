//! Side-by-side rendering of an image and its overlay.
//!
//! The panel shows the display-normalized original on the left and the overlay
//! on the right. When a font is available, a caption strip (typically the
//! metrics summary line) is added underneath.
//!
//! # Examples
//!
//! ```rust,no_run
//! use cell_count::utils::visualization::{VisualizationConfig, create_side_by_side};
//! // let config = VisualizationConfig::with_system_font();
//! // let panel = create_side_by_side(&image, &overlay, Some(&metrics.summary_line()), &config)?;
//! ```

use crate::core::CellError;
use crate::domain::MicroscopyImage;
use crate::processors::{OverlayImage, to_display_u8};

use ab_glyph::FontVec;
use image::{Rgb, RgbImage, imageops};
use imageproc::drawing::{draw_filled_rect_mut, draw_text_mut};
use imageproc::rect::Rect;
use std::path::Path;
use tracing::{debug, info};

const TEXT_COLOR: Rgb<u8> = Rgb([0, 0, 0]);

const BACKGROUND_COLOR: Rgb<u8> = Rgb([255, 255, 255]);

/// Padding around the caption text, in pixels.
const CAPTION_PADDING: u32 = 6;

/// Configuration for side-by-side panels.
pub struct VisualizationConfig {
    /// The font to use for the caption. If None, the caption is skipped.
    pub font: Option<FontVec>,

    /// The scale factor for the font. Defaults to 16.0.
    pub font_scale: f32,
}

impl Default for VisualizationConfig {
    fn default() -> Self {
        Self {
            font: None,
            font_scale: 16.0,
        }
    }
}

impl std::fmt::Debug for VisualizationConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VisualizationConfig")
            .field("font", &self.font.as_ref().map(|_| "<font>"))
            .field("font_scale", &self.font_scale)
            .finish()
    }
}

impl VisualizationConfig {
    /// Creates a configuration with a font loaded from `font_path`.
    pub fn with_font_path(font_path: &Path) -> Result<Self, CellError> {
        let font_data = std::fs::read(font_path)?;
        let font = FontVec::try_from_vec(font_data).map_err(|_| {
            CellError::config_error(format!(
                "failed to parse font file: {}",
                font_path.display()
            ))
        })?;

        Ok(Self {
            font: Some(font),
            ..Self::default()
        })
    }

    /// Creates a configuration using a font from common system locations.
    ///
    /// Falls back to the default (no caption) when none is found.
    pub fn with_system_font() -> Self {
        let font_paths = [
            "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
            "/System/Library/Fonts/Arial.ttf",
            "C:\\Windows\\Fonts\\arial.ttf",
        ];

        for path in &font_paths {
            if let Ok(font_data) = std::fs::read(path)
                && let Ok(font) = FontVec::try_from_vec(font_data)
            {
                info!("Loaded system font: {}", path);
                return Self {
                    font: Some(font),
                    ..Self::default()
                };
            }
        }

        debug!("No system font found, captions will be skipped");
        Self::default()
    }
}

/// Places the original (left) and the overlay (right) next to each other.
///
/// A caption strip is appended below the images when both `caption` and a font
/// are present.
///
/// # Errors
///
/// [`CellError::DimensionMismatch`] when the overlay is not the image's size.
pub fn create_side_by_side(
    image: &MicroscopyImage,
    overlay: &OverlayImage,
    caption: Option<&str>,
    config: &VisualizationConfig,
) -> Result<RgbImage, CellError> {
    let (width, height) = image.dimensions();
    if overlay.dimensions() != (width, height) {
        return Err(CellError::DimensionMismatch {
            image: (width, height),
            mask: overlay.dimensions(),
        });
    }

    let caption = caption.zip(config.font.as_ref());
    let strip_height = if caption.is_some() {
        config.font_scale.ceil() as u32 + 2 * CAPTION_PADDING
    } else {
        0
    };

    let mut panel = RgbImage::from_pixel(width * 2, height + strip_height, BACKGROUND_COLOR);
    imageops::overlay(&mut panel, &to_display_u8(image), 0, 0);
    imageops::overlay(&mut panel, overlay, width as i64, 0);

    if let Some((text, font)) = caption {
        let strip = Rect::at(0, height as i32).of_size(width * 2, strip_height);
        draw_filled_rect_mut(&mut panel, strip, BACKGROUND_COLOR);
        draw_text_mut(
            &mut panel,
            TEXT_COLOR,
            CAPTION_PADDING as i32,
            (height + CAPTION_PADDING) as i32,
            config.font_scale,
            font,
            text,
        );
    }

    Ok(panel)
}
