use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use thiserror::Error;

use crate::pipeline::provider::{ContentPart, GenerateContentResponse, SafetyRating};

/// Decoded image payload pulled out of a generation response, consumed
/// immediately by the post-processing engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineImage {
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Error)]
pub enum ExtractionError {
    /// The response carries no candidate content at all. The detail string
    /// surfaces prompt feedback and finish-reason metadata so that
    /// safety-filtered generations are diagnosable from the message alone.
    #[error("generation response contained no candidates with content{detail}")]
    NoCandidates { detail: String },
    /// Candidate parts exist but none is a non-empty inline image.
    #[error("generation response contained no inline image part. Received parts: {received}.")]
    NoImagePart { received: String },
    #[error("inline image payload is not valid base64: {0}")]
    InvalidPayload(#[source] base64::DecodeError),
}

/// Scans the first candidate's parts in order and returns the first part
/// whose MIME type starts with `image/` and whose payload is non-empty.
/// Later (possibly larger) image parts are deliberately ignored.
pub fn extract_inline_image(
    response: &GenerateContentResponse,
) -> Result<InlineImage, ExtractionError> {
    let parts = response
        .candidates
        .first()
        .and_then(|candidate| candidate.content.as_ref())
        .map(|content| content.parts.as_slice())
        .unwrap_or_default();

    if parts.is_empty() {
        return Err(ExtractionError::NoCandidates {
            detail: no_candidates_detail(response),
        });
    }

    for part in parts {
        if let ContentPart::InlineData { inline_data } = part {
            if inline_data.mime_type.starts_with("image/") && !inline_data.data.is_empty() {
                let bytes = BASE64
                    .decode(inline_data.data.as_bytes())
                    .map_err(ExtractionError::InvalidPayload)?;
                return Ok(InlineImage {
                    mime_type: inline_data.mime_type.clone(),
                    bytes,
                });
            }
        }
    }

    Err(ExtractionError::NoImagePart {
        received: describe_parts(parts),
    })
}

fn no_candidates_detail(response: &GenerateContentResponse) -> String {
    let mut notes = Vec::new();
    if let Some(feedback) = response.prompt_feedback.as_ref() {
        if let Some(reason) = feedback.block_reason.as_deref() {
            notes.push(format!("prompt block reason: {reason}"));
        }
        if !feedback.safety_ratings.is_empty() {
            notes.push(format!(
                "prompt safety ratings: {}",
                format_safety_ratings(feedback.safety_ratings.as_slice())
            ));
        }
    }
    if let Some(candidate) = response.candidates.first() {
        if let Some(reason) = candidate.finish_reason.as_deref() {
            notes.push(format!("finish reason: {reason}"));
        }
        if !candidate.safety_ratings.is_empty() {
            notes.push(format!(
                "safety ratings: {}",
                format_safety_ratings(candidate.safety_ratings.as_slice())
            ));
        }
    }
    if notes.is_empty() {
        String::new()
    } else {
        format!(" ({})", notes.join("; "))
    }
}

fn format_safety_ratings(ratings: &[SafetyRating]) -> String {
    ratings
        .iter()
        .map(|rating| format!("{}={}", rating.category, rating.probability))
        .collect::<Vec<_>>()
        .join(", ")
}

const TEXT_SNIPPET_MAX_CHARS: usize = 48;

fn describe_parts(parts: &[ContentPart]) -> String {
    parts
        .iter()
        .map(|part| match part {
            ContentPart::Text { text } => {
                let snippet = text.chars().take(TEXT_SNIPPET_MAX_CHARS).collect::<String>();
                if snippet.len() < text.len() {
                    format!("text \"{snippet}…\"")
                } else {
                    format!("text \"{snippet}\"")
                }
            }
            ContentPart::InlineData { inline_data } if inline_data.data.is_empty() => {
                format!("{} (empty payload)", inline_data.mime_type)
            }
            ContentPart::InlineData { inline_data } => inline_data.mime_type.clone(),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::provider::{
        Candidate, CandidateContent, InlineData, PromptFeedback, SafetyRating,
    };

    fn image_part(mime_type: &str, data: &str) -> ContentPart {
        ContentPart::InlineData {
            inline_data: InlineData {
                mime_type: String::from(mime_type),
                data: String::from(data),
            },
        }
    }

    fn response_with_parts(parts: Vec<ContentPart>) -> GenerateContentResponse {
        GenerateContentResponse {
            candidates: vec![Candidate {
                content: Some(CandidateContent { parts }),
                finish_reason: None,
                safety_ratings: Vec::new(),
            }],
            prompt_feedback: None,
        }
    }

    #[test]
    fn returns_first_non_empty_image_part() {
        let response = response_with_parts(vec![
            ContentPart::Text {
                text: String::from("here is your image"),
            },
            image_part("image/png", ""),
            image_part("image/png", "Zmlyc3Q="),
            image_part("image/jpeg", "c2Vjb25k"),
        ]);

        let image = extract_inline_image(&response).expect("image should be extracted");
        assert_eq!(image.mime_type, "image/png");
        assert_eq!(image.bytes, b"first");
    }

    #[test]
    fn empty_response_is_no_candidates() {
        let error = extract_inline_image(&GenerateContentResponse::default())
            .expect_err("empty response should fail");
        assert!(matches!(error, ExtractionError::NoCandidates { .. }));
    }

    #[test]
    fn candidate_with_empty_parts_is_no_candidates() {
        let error = extract_inline_image(&response_with_parts(Vec::new()))
            .expect_err("empty parts should fail");
        assert!(matches!(error, ExtractionError::NoCandidates { .. }));
    }

    #[test]
    fn safety_blocked_candidate_reports_finish_reason_and_ratings() {
        let response = GenerateContentResponse {
            candidates: vec![Candidate {
                content: None,
                finish_reason: Some(String::from("SAFETY")),
                safety_ratings: vec![SafetyRating {
                    category: String::from("HARM_CATEGORY_DANGEROUS_CONTENT"),
                    probability: String::from("HIGH"),
                }],
            }],
            prompt_feedback: Some(PromptFeedback {
                block_reason: Some(String::from("SAFETY")),
                safety_ratings: Vec::new(),
            }),
        };

        let error =
            extract_inline_image(&response).expect_err("safety-blocked response should fail");
        let message = error.to_string();
        assert!(matches!(error, ExtractionError::NoCandidates { .. }));
        assert!(message.contains("finish reason: SAFETY"));
        assert!(message.contains("prompt block reason: SAFETY"));
        assert!(message.contains("HARM_CATEGORY_DANGEROUS_CONTENT=HIGH"));
    }

    #[test]
    fn text_only_parts_are_no_image_part_with_snippet() {
        let response = response_with_parts(vec![ContentPart::Text {
            text: String::from("sorry, I can only describe this scene in words"),
        }]);

        let error = extract_inline_image(&response).expect_err("text-only response should fail");
        assert!(matches!(error, ExtractionError::NoImagePart { .. }));
        assert!(error
            .to_string()
            .contains("text \"sorry, I can only describe this scene in words\""));
    }

    #[test]
    fn long_text_part_is_truncated_in_diagnostics() {
        let response = response_with_parts(vec![ContentPart::Text {
            text: "x".repeat(200),
        }]);

        let error = extract_inline_image(&response).expect_err("text-only response should fail");
        let message = error.to_string();
        assert!(message.contains('…'));
        assert!(message.len() < 200);
    }

    #[test]
    fn empty_image_payloads_are_enumerated_not_returned() {
        let response = response_with_parts(vec![image_part("image/png", "")]);

        let error = extract_inline_image(&response).expect_err("empty payload should fail");
        assert!(matches!(error, ExtractionError::NoImagePart { .. }));
        assert!(error.to_string().contains("image/png (empty payload)"));
    }

    #[test]
    fn non_image_mime_types_are_skipped() {
        let response = response_with_parts(vec![
            image_part("application/octet-stream", "AAAA"),
            image_part("image/webp", "AAAA"),
        ]);

        let image = extract_inline_image(&response).expect("webp part should be extracted");
        assert_eq!(image.mime_type, "image/webp");
    }

    #[test]
    fn invalid_base64_payload_is_a_distinct_error() {
        let response = response_with_parts(vec![image_part("image/png", "not base64!!")]);

        let error = extract_inline_image(&response).expect_err("bad base64 should fail");
        assert!(matches!(error, ExtractionError::InvalidPayload(_)));
    }
}
