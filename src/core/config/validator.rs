//! Configuration validation trait and JSON loading helpers.

use crate::core::CellError;
use serde::de::DeserializeOwned;
use std::path::Path;

/// A trait for validating configuration parameters.
///
/// Implementors check their own invariants; loading helpers call
/// [`ConfigValidator::validate`] after deserialization so an invalid file
/// never reaches the pipeline.
pub trait ConfigValidator {
    /// Validates the configuration.
    ///
    /// # Returns
    ///
    /// `Ok(())` or a `CellError::ConfigError` describing the first problem found.
    fn validate(&self) -> Result<(), CellError>;

}

/// Parses a configuration from a JSON string and validates it.
pub fn config_from_json_str<T>(json: &str) -> Result<T, CellError>
where
    T: DeserializeOwned + ConfigValidator,
{
    let config: T = serde_json::from_str(json)?;
    config.validate()?;
    Ok(config)
}

/// Reads a configuration from a JSON file and validates it.
pub fn config_from_json_file<T>(path: impl AsRef<Path>) -> Result<T, CellError>
where
    T: DeserializeOwned + ConfigValidator,
{
    let contents = std::fs::read_to_string(path.as_ref())?;
    config_from_json_str(&contents)
}
