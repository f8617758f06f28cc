//! Error types for palette extraction and banner color derivation.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias used throughout the crate.
pub type Result<T> = std::result::Result<T, PaletteError>;

/// Everything that can go wrong at the crate boundary.
///
/// An empty palette is never an error: a valid image whose pixels are all
/// filtered out yields `Ok(vec![])`.
#[derive(Error, Debug)]
pub enum PaletteError {
    /// An option value violated its documented range.
    #[error("Invalid configuration: {parameter} = {value}")]
    Configuration { parameter: String, value: String },

    /// The image source could not be read or decoded.
    #[error("Failed to load image: {message}")]
    ImageLoad {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The pixel buffer does not match the declared dimensions.
    #[error("Pixel buffer has {actual} bytes, expected {expected} (width * height * 4)")]
    InvalidBuffer { expected: usize, actual: usize },

    /// A color string was not `#rrggbb`.
    #[error("Invalid hex color: {value:?}")]
    InvalidColor { value: String },

    /// The background worker is gone.
    #[error("Palette worker is not running")]
    WorkerUnavailable,

    /// A JSON configuration file could not be read or parsed.
    #[error("Failed to read config {path}: {source}")]
    ConfigFile {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl PaletteError {
    /// Create a configuration error for `parameter`.
    pub fn configuration(parameter: impl Into<String>, value: impl ToString) -> Self {
        Self::Configuration {
            parameter: parameter.into(),
            value: value.to_string(),
        }
    }

    /// Create an image load error with its underlying cause.
    pub fn image_load<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::ImageLoad {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// True for errors caused by the caller's options rather than the input.
    pub fn is_configuration(&self) -> bool {
        matches!(self, PaletteError::Configuration { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configuration_error_message_names_parameter() {
        let err = PaletteError::configuration("color_count", 0);
        assert!(err.is_configuration());
        assert_eq!(err.to_string(), "Invalid configuration: color_count = 0");
    }

    #[test]
    fn image_load_keeps_source() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err = PaletteError::image_load("cannot open photo.png", io);
        assert!(!err.is_configuration());
        assert!(std::error::Error::source(&err).is_some());
    }
}
