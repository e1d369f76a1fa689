use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Output formats the post-processing engine can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Jpeg,
    Png,
    Webp,
}

impl OutputFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Jpeg => "jpeg",
            Self::Png => "png",
            Self::Webp => "webp",
        }
    }

    /// File extension used on disk. Note jpeg writes as `jpg`.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
            Self::Webp => "webp",
        }
    }

    /// Uppercase name used in user-facing outcome messages.
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Jpeg => "JPEG",
            Self::Png => "PNG",
            Self::Webp => "WEBP",
        }
    }
}

/// Quality and level knobs for the primary and secondary compression passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompressionParams {
    /// Lossy jpeg quality, 0..=100.
    pub jpeg_quality: u8,
    /// Lossy webp quality, 0..=100.
    pub webp_quality: u8,
    /// Primary png compression level, 0..=9.
    pub png_level: u8,
    /// Secondary png structural-optimizer level, 0..=7.
    pub optimize_level: u8,
}

impl Default for CompressionParams {
    fn default() -> Self {
        Self {
            jpeg_quality: 70,
            webp_quality: 75,
            png_level: 9,
            optimize_level: 2,
        }
    }
}

/// A validated-at-the-boundary image generation request. Immutable once
/// received; every field lives only for the duration of one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub prompt: String,
    pub output_directory: PathBuf,
    /// Base file name without extension; the allocator appends " (N)" on
    /// collision and the engine picks the extension.
    pub file_name: String,
    pub reference_image_paths: Vec<PathBuf>,
    pub use_enhanced_prompt: bool,
    pub skip_post_processing: bool,
    pub target_max_dimension: u32,
    pub force_format: Option<OutputFormat>,
    pub compression: CompressionParams,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RequestValidationError {
    #[error("prompt must not be empty")]
    EmptyPrompt,
    #[error("file name must not be empty")]
    EmptyFileName,
    #[error("target max dimension must be greater than zero")]
    ZeroTargetDimension,
    #[error("field '{field}' is out of range: {value}. Expected {min}..={max}.")]
    OutOfRange {
        field: &'static str,
        value: u8,
        min: u8,
        max: u8,
    },
}

impl GenerationRequest {
    /// Range-checks every caller-supplied knob. Out-of-range values are
    /// rejected here rather than clamped downstream.
    pub fn validate(&self) -> Result<(), RequestValidationError> {
        if self.prompt.trim().is_empty() {
            return Err(RequestValidationError::EmptyPrompt);
        }
        if self.file_name.trim().is_empty() {
            return Err(RequestValidationError::EmptyFileName);
        }
        if self.target_max_dimension == 0 {
            return Err(RequestValidationError::ZeroTargetDimension);
        }
        let ranges = [
            ("jpeg_quality", self.compression.jpeg_quality, 100),
            ("webp_quality", self.compression.webp_quality, 100),
            ("png_level", self.compression.png_level, 9),
            ("optimize_level", self.compression.optimize_level, 7),
        ];
        for (field, value, max) in ranges {
            if value > max {
                return Err(RequestValidationError::OutOfRange {
                    field,
                    value,
                    min: 0,
                    max,
                });
            }
        }
        Ok(())
    }
}
