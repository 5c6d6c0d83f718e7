//! Input tensor preparation and output unpacking for the Cellpose network.

use crate::core::{CellError, MAX_TENSOR_SIZE, NETWORK_SIZE_DIVISOR, validate_tensor_shape};
use crate::domain::MicroscopyImage;
use crate::processors::normalization::normalize_percentile;
use image::imageops::{self, FilterType};
use image::{ImageBuffer, Luma};
use ndarray::{Array2, Array4, ArrayView2, s};

/// Channels of the network input: cytoplasm and (empty) nucleus.
const INPUT_CHANNELS: usize = 2;

/// Channels of the network output: dY, dX, cell probability.
const OUTPUT_CHANNELS: usize = 3;

/// Spatial bookkeeping needed to map network output back onto the image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputGeometry {
    /// Original image `(height, width)`.
    pub original: (usize, usize),
    /// Size after rescaling, before padding.
    pub scaled: (usize, usize),
    /// Size of the tensor handed to the network.
    pub padded: (usize, usize),
}

impl InputGeometry {
    /// Whether the image was resized before inference.
    pub fn is_rescaled(&self) -> bool {
        self.original != self.scaled
    }
}

/// Per-pixel network predictions at the original image resolution.
#[derive(Debug, Clone)]
pub struct NetworkOutput {
    /// Vertical flow component.
    pub dy: Array2<f32>,
    /// Horizontal flow component.
    pub dx: Array2<f32>,
    /// Cell probability logits.
    pub cellprob: Array2<f32>,
}

/// Rounds `value` up to the next multiple of [`NETWORK_SIZE_DIVISOR`].
pub fn padded_len(value: usize) -> usize {
    value.div_ceil(NETWORK_SIZE_DIVISOR) * NETWORK_SIZE_DIVISOR
}

/// Resizes a single plane with bilinear filtering.
pub fn resize_plane(plane: ArrayView2<'_, f32>, height: usize, width: usize) -> Array2<f32> {
    let (src_h, src_w) = plane.dim();
    if (src_h, src_w) == (height, width) {
        return plane.to_owned();
    }
    let buffer: ImageBuffer<Luma<f32>, Vec<f32>> =
        ImageBuffer::from_fn(src_w as u32, src_h as u32, |x, y| {
            Luma([plane[[y as usize, x as usize]]])
        });
    let resized = imageops::resize(&buffer, width as u32, height as u32, FilterType::Triangle);
    Array2::from_shape_fn((height, width), |(y, x)| {
        resized.get_pixel(x as u32, y as u32)[0]
    })
}

/// Builds the `[1, 2, H, W]` network input for `image`.
///
/// The image is collapsed to grey, percentile-normalized, optionally rescaled by
/// `rescale`, and zero-padded at the bottom and right to multiples of
/// [`NETWORK_SIZE_DIVISOR`]. The second channel stays zero.
///
/// # Errors
///
/// Returns [`CellError::InvalidInput`] when `rescale` is not a positive finite
/// factor or the resulting tensor would exceed [`MAX_TENSOR_SIZE`] elements.
pub fn prepare_input(
    image: &MicroscopyImage,
    rescale: f32,
) -> Result<(Array4<f32>, InputGeometry), CellError> {
    if !rescale.is_finite() || rescale <= 0.0 {
        return Err(CellError::invalid_input(format!(
            "rescale factor must be positive, got {}",
            rescale
        )));
    }

    let gray = image.to_grayscale();
    let normalized = normalize_percentile(gray.view());
    let original = normalized.dim();

    let scaled = (
        ((original.0 as f32 * rescale).round() as usize).max(1),
        ((original.1 as f32 * rescale).round() as usize).max(1),
    );
    let padded = (padded_len(scaled.0), padded_len(scaled.1));

    let elements = INPUT_CHANNELS * padded.0 * padded.1;
    if elements > MAX_TENSOR_SIZE {
        return Err(CellError::invalid_input(format!(
            "network input of {}x{} exceeds the tensor size limit",
            padded.1, padded.0
        )));
    }

    let plane = resize_plane(normalized.view(), scaled.0, scaled.1);
    let mut tensor = Array4::<f32>::zeros((1, INPUT_CHANNELS, padded.0, padded.1));
    tensor
        .slice_mut(s![0, 0, ..scaled.0, ..scaled.1])
        .assign(&plane);

    Ok((
        tensor,
        InputGeometry {
            original,
            scaled,
            padded,
        },
    ))
}

/// Crops and resizes the raw `[1, 3, H, W]` prediction back to image size.
///
/// # Errors
///
/// Returns [`CellError::Segmentation`] when the output does not have three
/// channels or is smaller than the padded input.
pub fn unpack_output(
    output: &Array4<f32>,
    geometry: &InputGeometry,
) -> Result<NetworkOutput, CellError> {
    validate_tensor_shape(output.shape(), 4, "cellpose_output")?;
    let (batch, channels, height, width) = output.dim();
    if batch < 1 || channels < OUTPUT_CHANNELS {
        return Err(CellError::segmentation_msg(format!(
            "expected output with {} channels, got shape {:?}",
            OUTPUT_CHANNELS,
            output.shape()
        )));
    }
    let (scaled_h, scaled_w) = geometry.scaled;
    if height < scaled_h || width < scaled_w {
        return Err(CellError::segmentation_msg(format!(
            "output {}x{} is smaller than the {}x{} input",
            width, height, scaled_w, scaled_h
        )));
    }

    let (orig_h, orig_w) = geometry.original;
    let plane = |channel: usize| {
        let cropped = output.slice(s![0, channel, ..scaled_h, ..scaled_w]);
        resize_plane(cropped, orig_h, orig_w)
    };

    Ok(NetworkOutput {
        dy: plane(0),
        dx: plane(1),
        cellprob: plane(2),
    })
}
