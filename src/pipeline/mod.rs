pub mod assembly;
pub mod extraction;
pub mod pathing;
pub mod postprocess;
pub mod prompting;
pub mod provider;
pub mod references;
pub mod request;
pub mod runtime;

/// Processing steps of a single generation request, in execution order.
///
/// Every request walks the full sequence; there is no retry loop, and any
/// failure aborts the remaining steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PipelineStage {
    LoadingReferences,
    Composing,
    Assembling,
    Generating,
    Extracting,
    PostProcessing,
    Allocating,
    Writing,
}

impl PipelineStage {
    pub const EXECUTION_ORDER: [Self; 8] = [
        Self::LoadingReferences,
        Self::Composing,
        Self::Assembling,
        Self::Generating,
        Self::Extracting,
        Self::PostProcessing,
        Self::Allocating,
        Self::Writing,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::LoadingReferences => "loading_references",
            Self::Composing => "composing",
            Self::Assembling => "assembling",
            Self::Generating => "generating",
            Self::Extracting => "extracting",
            Self::PostProcessing => "post_processing",
            Self::Allocating => "allocating",
            Self::Writing => "writing",
        }
    }
}
