use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType as PngFilterType, PngEncoder};
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, ImageEncoder, ImageFormat};
use thiserror::Error;
use tracing::{debug, warn};

use crate::pipeline::request::{GenerationRequest, OutputFormat};

/// Result of one post-processing run, persisted immediately and discarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessingOutcome {
    pub final_bytes: Vec<u8>,
    /// On-disk extension for the target format (`jpg`, `png` or `webp`).
    pub extension: &'static str,
    pub original_size_bytes: usize,
    pub final_size_bytes: usize,
    /// User-facing description of what happened to the image. The exact
    /// wording is part of the tool's surface and covered by tests.
    pub transform_description: String,
}

#[derive(Debug, Error)]
pub enum PostprocessError {
    #[error("failed to decode generated image: {0}")]
    Decode(#[source] image::ImageError),
    #[error("jpeg encode failed: {0}")]
    JpegEncode(#[source] image::ImageError),
    #[error("progressive jpeg re-encode failed: {0}")]
    JpegOptimize(String),
    #[error("image dimensions {width}x{height} exceed the progressive jpeg encoder limit")]
    JpegDimensions { width: u32, height: u32 },
    #[error("png encode failed: {0}")]
    PngEncode(#[source] image::ImageError),
    #[error("png optimize pass failed at level {level}: {message}")]
    PngOptimize { level: u8, message: String },
    #[error("webp re-encode pass failed: {0}")]
    WebpOptimize(String),
}

/// Applies the format decision table, the fit-inside resize and the
/// two-pass encode to a raw generated image.
///
/// Target selection, in order: skip-post-processing passes the bytes
/// through untouched under the detected format's extension; an explicit
/// forced format wins; a detected jpeg stays jpeg; everything else becomes
/// png. The source format comes from content sniffing, never from the
/// provider's declared MIME type.
pub fn process_image(
    raw: &[u8],
    request: &GenerationRequest,
) -> Result<ProcessingOutcome, PostprocessError> {
    let detected = image::guess_format(raw).ok();

    if request.skip_post_processing {
        let extension = match detected {
            Some(ImageFormat::Png) => "png",
            Some(ImageFormat::Jpeg) => "jpg",
            Some(ImageFormat::WebP) => "webp",
            other => {
                warn!(
                    detected = ?other,
                    "generated image format not recognized, defaulting to jpg extension"
                );
                "jpg"
            }
        };
        return Ok(ProcessingOutcome {
            final_bytes: raw.to_vec(),
            extension,
            original_size_bytes: raw.len(),
            final_size_bytes: raw.len(),
            transform_description: String::from("generated (uncompressed)"),
        });
    }

    let target = match (request.force_format, detected) {
        (Some(format), _) => format,
        (None, Some(ImageFormat::Jpeg)) => OutputFormat::Jpeg,
        (None, _) => OutputFormat::Png,
    };

    let decoded = image::load_from_memory(raw).map_err(PostprocessError::Decode)?;
    let resized = fit_inside(decoded, request.target_max_dimension);
    debug!(
        target = target.as_str(),
        width = resized.width(),
        height = resized.height(),
        "encoding post-processed image"
    );

    let final_bytes = match target {
        OutputFormat::Jpeg => encode_jpeg(&resized, request.compression.jpeg_quality)?,
        OutputFormat::Png => encode_png(
            &resized,
            request.compression.png_level,
            request.compression.optimize_level,
        )?,
        OutputFormat::Webp => encode_webp(&resized, request.compression.webp_quality)?,
    };

    Ok(ProcessingOutcome {
        extension: target.extension(),
        original_size_bytes: raw.len(),
        final_size_bytes: final_bytes.len(),
        final_bytes,
        transform_description: transform_description(detected, request.force_format),
    })
}

/// Scales the image down, preserving aspect ratio, so neither dimension
/// exceeds `max_dimension`. Never upscales.
fn fit_inside(image: DynamicImage, max_dimension: u32) -> DynamicImage {
    let (width, height) = image.dimensions();
    if width <= max_dimension && height <= max_dimension {
        return image;
    }
    image.resize(max_dimension, max_dimension, FilterType::Lanczos3)
}

fn transform_description(detected: Option<ImageFormat>, forced: Option<OutputFormat>) -> String {
    let detected_output = detected.and_then(output_format_for);
    match forced {
        Some(format) if detected_output != Some(format) => {
            format!("converted to {} and compressed", format.display_name())
        }
        _ => String::from("generated and compressed"),
    }
}

fn output_format_for(format: ImageFormat) -> Option<OutputFormat> {
    match format {
        ImageFormat::Jpeg => Some(OutputFormat::Jpeg),
        ImageFormat::Png => Some(OutputFormat::Png),
        ImageFormat::WebP => Some(OutputFormat::Webp),
        _ => None,
    }
}

/// Primary lossy encode followed by a progressive re-encode of the primary
/// output at the same quality. The progressive pass is advertised behavior,
/// so its failure is fatal rather than silently skipped.
fn encode_jpeg(image: &DynamicImage, quality: u8) -> Result<Vec<u8>, PostprocessError> {
    let rgb = image.to_rgb8();
    let (width, height) = rgb.dimensions();

    let mut primary = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut primary, quality);
    encoder
        .encode(rgb.as_raw(), width, height, image::ExtendedColorType::Rgb8)
        .map_err(PostprocessError::JpegEncode)?;

    let baseline = image::load_from_memory(primary.as_slice())
        .map_err(PostprocessError::Decode)?
        .to_rgb8();
    let narrow_width = u16::try_from(width)
        .map_err(|_| PostprocessError::JpegDimensions { width, height })?;
    let narrow_height = u16::try_from(height)
        .map_err(|_| PostprocessError::JpegDimensions { width, height })?;

    let mut optimized = Vec::new();
    let mut progressive = jpeg_encoder::Encoder::new(&mut optimized, quality);
    progressive.set_progressive(true);
    progressive
        .encode(
            baseline.as_raw(),
            narrow_width,
            narrow_height,
            jpeg_encoder::ColorType::Rgb,
        )
        .map_err(|error| PostprocessError::JpegOptimize(error.to_string()))?;
    Ok(optimized)
}

/// Maps the caller's 0..=9 compression level onto the png encoder's
/// compression tiers.
fn png_compression_for_level(level: u8) -> CompressionType {
    match level {
        0..=3 => CompressionType::Fast,
        4..=6 => CompressionType::Default,
        _ => CompressionType::Best,
    }
}

/// Primary png encode followed by the lossless structural optimizer at the
/// configured level. Level 7 maps to the optimizer's maximum preset.
fn encode_png(
    image: &DynamicImage,
    level: u8,
    optimize_level: u8,
) -> Result<Vec<u8>, PostprocessError> {
    let rgba = image.to_rgba8();
    let (width, height) = rgba.dimensions();

    let mut primary = Vec::new();
    let encoder = PngEncoder::new_with_quality(
        &mut primary,
        png_compression_for_level(level),
        PngFilterType::Adaptive,
    );
    encoder
        .write_image(rgba.as_raw(), width, height, image::ExtendedColorType::Rgba8)
        .map_err(PostprocessError::PngEncode)?;

    let options = if optimize_level >= 7 {
        oxipng::Options::max_compression()
    } else {
        oxipng::Options::from_preset(optimize_level)
    };
    oxipng::optimize_from_memory(primary.as_slice(), &options).map_err(|error| {
        PostprocessError::PngOptimize {
            level: optimize_level,
            message: error.to_string(),
        }
    })
}

/// Primary lossy webp encode followed by a dedicated re-encode of the
/// primary output at the same quality.
fn encode_webp(image: &DynamicImage, quality: u8) -> Result<Vec<u8>, PostprocessError> {
    let rgba = image.to_rgba8();
    let primary = webp::Encoder::from_rgba(rgba.as_raw(), rgba.width(), rgba.height())
        .encode(f32::from(quality));

    let decoded = webp::Decoder::new(&primary)
        .decode()
        .ok_or_else(|| {
            PostprocessError::WebpOptimize(String::from(
                "re-decode of primary webp output failed",
            ))
        })?
        .to_image();
    let rgba = decoded.to_rgba8();
    let optimized = webp::Encoder::from_rgba(rgba.as_raw(), rgba.width(), rgba.height())
        .encode(f32::from(quality));
    Ok(optimized.to_vec())
}
