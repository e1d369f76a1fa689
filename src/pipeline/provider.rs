use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A base64 image payload tagged with its MIME type, as carried on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    pub mime_type: String,
    pub data: String,
}

/// One unit of multi-part request or response content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ContentPart {
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
    Text {
        text: String,
    },
}

/// The assembled multi-part generation request: exactly one text part first,
/// then reference image parts in caller order. The ordering is a contract
/// with the provider (instruction-then-reference semantics).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComposedRequest {
    pub parts: Vec<ContentPart>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SafetyRating {
    pub category: String,
    pub probability: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub safety_ratings: Vec<SafetyRating>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<ContentPart>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<CandidateContent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub safety_ratings: Vec<SafetyRating>,
}

/// Provider response shape. Candidates may be absent or carry no content at
/// all when the generation was filtered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_feedback: Option<PromptFeedback>,
}

impl GenerateContentResponse {
    /// Decodes a raw provider JSON body. Convenience for `ImageGenerator`
    /// implementations sitting on an HTTP transport.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}

#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error("generation provider call failed: {0}")]
    Provider(String),
}

/// The opaque generation capability. Transport, authentication and model
/// selection live behind this seam; the pipeline only sees request in,
/// response or failure out. The call blocks and is never retried here.
pub trait ImageGenerator: Send + Sync + 'static {
    fn generate(&self, request: &ComposedRequest) -> Result<GenerateContentResponse, GeneratorError>;
}

pub type SharedImageGenerator = Arc<dyn ImageGenerator>;

impl ImageGenerator for SharedImageGenerator {
    fn generate(&self, request: &ComposedRequest) -> Result<GenerateContentResponse, GeneratorError> {
        self.as_ref().generate(request)
    }
}
