//! Image file input and output.
//!
//! Loading keeps the native bit depth of the file so that 16-bit microscopy
//! data reaches segmentation unchanged. Saving wraps encoder failures in
//! [`CellError::ImageSave`] with the destination path.

use crate::core::CellError;
use crate::domain::{Gray16Image, MicroscopyImage};
use image::{DynamicImage, ImageError, ImageReader, RgbImage};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::{debug, warn};

/// Loads an image file into a [`MicroscopyImage`].
///
/// PNG, JPEG and TIFF are supported. When the decoder picked from the file
/// extension fails, decoding is retried with the format sniffed from the file
/// contents.
///
/// # Errors
///
/// [`CellError::ImageLoad`] when the file cannot be read or decoded, and
/// [`CellError::InvalidInput`] for unsupported pixel layouts.
pub fn load_image(path: &Path) -> Result<MicroscopyImage, CellError> {
    let img = load_dynamic_image(path).map_err(CellError::ImageLoad)?;
    debug!(
        "loaded {} ({}x{}, {:?})",
        path.display(),
        img.width(),
        img.height(),
        img.color()
    );
    MicroscopyImage::from_dynamic(&img)
}

fn load_dynamic_image(path: &Path) -> Result<DynamicImage, ImageError> {
    match image::open(path) {
        Ok(img) => Ok(img),
        Err(err) if should_retry(&err) => {
            warn!(
                "Standard decode failed for {} ({err}). Retrying with format sniffing.",
                path.display()
            );
            decode_with_guessed_format(path)
        }
        Err(err) => Err(err),
    }
}

fn should_retry(err: &ImageError) -> bool {
    matches!(err, ImageError::Decoding(_) | ImageError::Unsupported(_))
}

fn decode_with_guessed_format(path: &Path) -> Result<DynamicImage, ImageError> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let reader = ImageReader::new(reader).with_guessed_format()?;
    reader.decode()
}

/// Writes an RGB image, choosing the encoder from the extension.
pub fn save_rgb(image: &RgbImage, path: &Path) -> Result<(), CellError> {
    image.save(path).map_err(|source| CellError::ImageSave {
        path: path.display().to_string(),
        source,
    })
}

/// Writes a 16-bit greyscale image, choosing the encoder from the extension.
pub fn save_gray16(image: &Gray16Image, path: &Path) -> Result<(), CellError> {
    image.save(path).map_err(|source| CellError::ImageSave {
        path: path.display().to_string(),
        source,
    })
}
