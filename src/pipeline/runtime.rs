use std::path::PathBuf;

use thiserror::Error;
use tracing::{debug, info};

use crate::pipeline::assembly::assemble_request;
use crate::pipeline::extraction::{extract_inline_image, ExtractionError};
use crate::pipeline::pathing::allocate_unique_path;
use crate::pipeline::postprocess::{process_image, PostprocessError};
use crate::pipeline::prompting::compose_prompt;
use crate::pipeline::provider::{GeneratorError, ImageGenerator};
use crate::pipeline::references::{load_reference_parts, ReferenceImageError};
use crate::pipeline::request::{GenerationRequest, RequestValidationError};
use crate::pipeline::PipelineStage;

/// Everything that can end a request early. Each variant maps to the stage
/// it aborts, and the orchestrator folds it into a single failure message;
/// nothing propagates past `GenerationPipeline::run` as an error.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Validation(#[from] RequestValidationError),
    #[error(transparent)]
    ReferenceImages(#[from] ReferenceImageError),
    #[error(transparent)]
    Generator(#[from] GeneratorError),
    #[error(transparent)]
    Extraction(#[from] ExtractionError),
    #[error(transparent)]
    Postprocess(#[from] PostprocessError),
    #[error("failed to create output directory '{path}': {source}")]
    EnsureOutputDirectory {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to allocate output path in '{path}': {source}")]
    AllocateOutputPath {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write image to '{path}': {source}")]
    WriteImage {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl PipelineError {
    /// Stage at which the request died. Validation failures happen before
    /// the pipeline starts and carry no stage.
    pub fn stage(&self) -> Option<PipelineStage> {
        match self {
            Self::Validation(_) => None,
            Self::ReferenceImages(_) => Some(PipelineStage::LoadingReferences),
            Self::Generator(_) => Some(PipelineStage::Generating),
            Self::Extraction(_) => Some(PipelineStage::Extracting),
            Self::Postprocess(_) => Some(PipelineStage::PostProcessing),
            Self::EnsureOutputDirectory { .. } | Self::AllocateOutputPath { .. } => {
                Some(PipelineStage::Allocating)
            }
            Self::WriteImage { .. } => Some(PipelineStage::Writing),
        }
    }
}

/// Successful end state of one request: the persisted file plus the size
/// accounting and transform description for the result message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineSuccess {
    pub output_path: PathBuf,
    pub original_size_bytes: usize,
    pub final_size_bytes: usize,
    pub transform_description: String,
}

impl PipelineSuccess {
    pub fn message(&self) -> String {
        format!(
            "Image {}: {} (original size: {} KB, final size: {} KB)",
            self.transform_description,
            self.output_path.display(),
            format_kb(self.original_size_bytes),
            format_kb(self.final_size_bytes),
        )
    }
}

fn format_kb(bytes: usize) -> String {
    format!("{:.2}", bytes as f64 / 1024.0)
}

/// Sequences one request end to end: references are loaded and the prompt
/// composed, the assembled request goes to the opaque generator, and the
/// extracted image is post-processed and written under a collision-free
/// path. One shot; failures are terminal and the caller re-invokes the
/// whole pipeline if it wants a retry.
pub struct GenerationPipeline<G> {
    generator: G,
}

impl<G> GenerationPipeline<G>
where
    G: ImageGenerator,
{
    pub fn new(generator: G) -> Self {
        Self { generator }
    }

    /// Runs the request and always yields a human-readable result string,
    /// success or failure. This is the whole outward surface of the core:
    /// no raw error ever reaches the embedding tool wiring.
    pub async fn run(&self, request: &GenerationRequest) -> String {
        match self.execute(request).await {
            Ok(success) => success.message(),
            Err(error) => match error.stage() {
                Some(stage) => {
                    format!(
                        "Image generation failed during {}: {error}",
                        stage.as_str()
                    )
                }
                None => format!("Image generation failed: {error}"),
            },
        }
    }

    /// The staged pipeline behind `run`, with errors still typed. Exposed
    /// for callers that need to branch on the failure class.
    pub async fn execute(
        &self,
        request: &GenerationRequest,
    ) -> Result<PipelineSuccess, PipelineError> {
        request.validate()?;
        info!(
            references = request.reference_image_paths.len(),
            enhanced = request.use_enhanced_prompt,
            "image generation request accepted"
        );

        debug!(stage = PipelineStage::LoadingReferences.as_str(), "pipeline stage");
        let image_parts = load_reference_parts(request.reference_image_paths.as_slice()).await?;

        debug!(stage = PipelineStage::Composing.as_str(), "pipeline stage");
        let composed_prompt = compose_prompt(
            request.prompt.as_str(),
            !request.reference_image_paths.is_empty(),
            request.use_enhanced_prompt,
        );

        debug!(stage = PipelineStage::Assembling.as_str(), "pipeline stage");
        let composed = assemble_request(composed_prompt, image_parts);

        debug!(stage = PipelineStage::Generating.as_str(), "pipeline stage");
        let response = self.generator.generate(&composed)?;

        debug!(stage = PipelineStage::Extracting.as_str(), "pipeline stage");
        let inline = extract_inline_image(&response)?;

        debug!(stage = PipelineStage::PostProcessing.as_str(), "pipeline stage");
        let outcome = process_image(inline.bytes.as_slice(), request)?;

        debug!(stage = PipelineStage::Allocating.as_str(), "pipeline stage");
        tokio::fs::create_dir_all(request.output_directory.as_path())
            .await
            .map_err(|source| PipelineError::EnsureOutputDirectory {
                path: request.output_directory.display().to_string(),
                source,
            })?;
        let output_path = allocate_unique_path(
            request.output_directory.as_path(),
            request.file_name.as_str(),
            outcome.extension,
        )
        .map_err(|source| PipelineError::AllocateOutputPath {
            path: request.output_directory.display().to_string(),
            source,
        })?;

        debug!(stage = PipelineStage::Writing.as_str(), "pipeline stage");
        tokio::fs::write(output_path.as_path(), outcome.final_bytes.as_slice())
            .await
            .map_err(|source| PipelineError::WriteImage {
                path: output_path.display().to_string(),
                source,
            })?;

        info!(
            path = %output_path.display(),
            original_size_bytes = outcome.original_size_bytes,
            final_size_bytes = outcome.final_size_bytes,
            "generated image persisted"
        );
        Ok(PipelineSuccess {
            output_path,
            original_size_bytes: outcome.original_size_bytes,
            final_size_bytes: outcome.final_size_bytes,
            transform_description: outcome.transform_description,
        })
    }
}
