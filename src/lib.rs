pub mod pipeline;

pub use pipeline::provider::{ImageGenerator, SharedImageGenerator};
pub use pipeline::request::GenerationRequest;
pub use pipeline::runtime::GenerationPipeline;
