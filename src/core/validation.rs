//! Input Validation Utilities
//!
//! Small checks shared by configuration types and pipeline steps so that bad
//! parameters surface as errors instead of panics deep inside a run.

use crate::core::CellError;

/// Largest accepted image side. Larger inputs are rejected up front.
pub const MAX_IMAGE_DIMENSION: u32 = 32768;

/// Validates that a float value is finite (not NaN or infinite).
#[inline]
pub fn validate_finite(value: f32, param_name: &str) -> Result<(), CellError> {
    if !value.is_finite() {
        return Err(CellError::InvalidInput {
            message: format!("Parameter '{}' must be finite, got: {}", param_name, value),
        });
    }
    Ok(())
}

/// Validates that a value is within a specified range (inclusive).
#[inline]
pub fn validate_range<T: PartialOrd + std::fmt::Display>(
    value: T,
    min: T,
    max: T,
    param_name: &str,
) -> Result<(), CellError> {
    if value < min || value > max {
        return Err(CellError::InvalidInput {
            message: format!(
                "Parameter '{}' must be in range [{}, {}], got: {}",
                param_name, min, max, value
            ),
        });
    }
    Ok(())
}

/// Validates that a value is positive (> 0).
#[inline]
pub fn validate_positive<T: PartialOrd + std::fmt::Display + Default>(
    value: T,
    param_name: &str,
) -> Result<(), CellError> {
    if value <= T::default() {
        return Err(CellError::InvalidInput {
            message: format!(
                "Parameter '{}' must be positive, got: {}",
                param_name, value
            ),
        });
    }
    Ok(())
}

/// Validates image dimensions.
pub fn validate_image_dimensions(width: u32, height: u32, context: &str) -> Result<(), CellError> {
    if height == 0 || width == 0 {
        return Err(CellError::InvalidInput {
            message: format!(
                "{}: image dimensions must be positive, got {}x{}",
                context, width, height
            ),
        });
    }

    if height > MAX_IMAGE_DIMENSION || width > MAX_IMAGE_DIMENSION {
        return Err(CellError::InvalidInput {
            message: format!(
                "{}: image dimensions exceed maximum of {}x{}, got {}x{}",
                context, MAX_IMAGE_DIMENSION, MAX_IMAGE_DIMENSION, width, height
            ),
        });
    }

    Ok(())
}

/// Validates tensor shape dimensions.
pub fn validate_tensor_shape(
    shape: &[usize],
    expected_dims: usize,
    tensor_name: &str,
) -> Result<(), CellError> {
    if shape.len() != expected_dims {
        return Err(CellError::InvalidInput {
            message: format!(
                "Tensor '{}' expected {}D shape, got {}D: {:?}",
                tensor_name,
                expected_dims,
                shape.len(),
                shape
            ),
        });
    }
    Ok(())
}
