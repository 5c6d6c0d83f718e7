//! The microscopy image fed into the pipeline.
//!
//! Images are stored as `height × width × channels` arrays of `f32`
//! intensities together with the sample format they were decoded from, which
//! decides later whether the overlay can show the raw values directly.

use crate::core::{CellError, validate_image_dimensions};
use image::DynamicImage;
use ndarray::{Array2, Array3, ArrayView2, ArrayView3, Axis, s};
use serde::{Deserialize, Serialize};

/// Maximum number of channels accepted (grey, grey+alpha, RGB, RGBA).
pub const MAX_CHANNELS: usize = 4;

/// Numeric format of the samples an image was decoded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SampleFormat {
    /// 8-bit unsigned samples, already display-ready.
    U8,
    /// 16-bit unsigned samples (typical for microscopy TIFFs).
    U16,
    /// 32-bit floating point samples.
    F32,
}

/// A 2D, optionally multi-channel, microscopy image.
///
/// The value is immutable once constructed; every pipeline step reads it
/// through shared references.
#[derive(Debug, Clone, PartialEq)]
pub struct MicroscopyImage {
    data: Array3<f32>,
    format: SampleFormat,
}

impl MicroscopyImage {
    /// Creates an image from an `H × W × C` array.
    ///
    /// # Errors
    ///
    /// Returns [`CellError::InvalidInput`] when the array is empty, has more than
    /// [`MAX_CHANNELS`] channels, or contains non-finite values.
    pub fn new(data: Array3<f32>, format: SampleFormat) -> Result<Self, CellError> {
        let (height, width, channels) = data.dim();
        validate_image_dimensions(width as u32, height as u32, "MicroscopyImage")?;

        if channels == 0 || channels > MAX_CHANNELS {
            return Err(CellError::invalid_input(format!(
                "unsupported channel count {}, expected 1 to {}",
                channels, MAX_CHANNELS
            )));
        }

        if data.iter().any(|v| !v.is_finite()) {
            return Err(CellError::invalid_input(
                "image contains NaN or infinite intensities",
            ));
        }

        Ok(Self { data, format })
    }

    /// Creates a single-channel image from an `H × W` array.
    pub fn from_gray(data: Array2<f32>, format: SampleFormat) -> Result<Self, CellError> {
        Self::new(data.insert_axis(Axis(2)), format)
    }

    /// Converts a decoded image into a `MicroscopyImage`.
    ///
    /// 8- and 16-bit grey, grey+alpha, RGB and RGBA layouts keep their channel
    /// count; 32-bit float RGB(A) is accepted as well.
    pub fn from_dynamic(img: &DynamicImage) -> Result<Self, CellError> {
        let (width, height) = (img.width() as usize, img.height() as usize);
        match img {
            DynamicImage::ImageLuma8(buf) => {
                from_samples(height, width, 1, buf.as_raw(), SampleFormat::U8)
            }
            DynamicImage::ImageLumaA8(buf) => {
                from_samples(height, width, 2, buf.as_raw(), SampleFormat::U8)
            }
            DynamicImage::ImageRgb8(buf) => {
                from_samples(height, width, 3, buf.as_raw(), SampleFormat::U8)
            }
            DynamicImage::ImageRgba8(buf) => {
                from_samples(height, width, 4, buf.as_raw(), SampleFormat::U8)
            }
            DynamicImage::ImageLuma16(buf) => {
                from_samples(height, width, 1, buf.as_raw(), SampleFormat::U16)
            }
            DynamicImage::ImageLumaA16(buf) => {
                from_samples(height, width, 2, buf.as_raw(), SampleFormat::U16)
            }
            DynamicImage::ImageRgb16(buf) => {
                from_samples(height, width, 3, buf.as_raw(), SampleFormat::U16)
            }
            DynamicImage::ImageRgba16(buf) => {
                from_samples(height, width, 4, buf.as_raw(), SampleFormat::U16)
            }
            DynamicImage::ImageRgb32F(buf) => {
                from_samples(height, width, 3, buf.as_raw(), SampleFormat::F32)
            }
            DynamicImage::ImageRgba32F(buf) => {
                from_samples(height, width, 4, buf.as_raw(), SampleFormat::F32)
            }
            other => Err(CellError::invalid_input(format!(
                "unsupported pixel layout {:?}",
                other.color()
            ))),
        }
    }

    /// Image width in pixels.
    pub fn width(&self) -> u32 {
        self.data.dim().1 as u32
    }

    /// Image height in pixels.
    pub fn height(&self) -> u32 {
        self.data.dim().0 as u32
    }

    /// `(width, height)` in pixels.
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width(), self.height())
    }

    /// Number of channels (1 to 4).
    pub fn channels(&self) -> usize {
        self.data.dim().2
    }

    /// Sample format the image was decoded from.
    pub fn format(&self) -> SampleFormat {
        self.format
    }

    /// Read-only view of the `H × W × C` intensities.
    pub fn view(&self) -> ArrayView3<'_, f32> {
        self.data.view()
    }

    /// Read-only view of a single channel.
    ///
    /// # Panics
    ///
    /// Panics if `channel >= self.channels()`.
    pub fn channel(&self, channel: usize) -> ArrayView2<'_, f32> {
        self.data.index_axis(Axis(2), channel)
    }

    /// Collapses the image to one intensity channel.
    ///
    /// Colour channels are averaged. Alpha is ignored: a grey+alpha image yields
    /// its grey channel and an RGBA image the mean of R, G and B.
    pub fn to_grayscale(&self) -> Array2<f32> {
        let color_channels = match self.channels() {
            1 | 2 => 1,
            3 | 4 => 3,
            _ => self.channels(),
        };
        self.data
            .slice(s![.., .., ..color_channels])
            .mean_axis(Axis(2))
            .unwrap_or_else(|| self.channel(0).to_owned())
    }
}

fn from_samples<T>(
    height: usize,
    width: usize,
    channels: usize,
    samples: &[T],
    format: SampleFormat,
) -> Result<MicroscopyImage, CellError>
where
    T: Copy + Into<f32>,
{
    let values: Vec<f32> = samples.iter().map(|&v| v.into()).collect();
    let data = Array3::from_shape_vec((height, width, channels), values)?;
    MicroscopyImage::new(data, format)
}
