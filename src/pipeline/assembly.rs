use crate::pipeline::provider::{ComposedRequest, ContentPart};

/// Builds the final multi-part request: the composed prompt text first, then
/// the reference image parts in the order they were loaded. Pure data
/// transform with no failure modes.
pub fn assemble_request(composed_prompt: String, image_parts: Vec<ContentPart>) -> ComposedRequest {
    let mut parts = Vec::with_capacity(1 + image_parts.len());
    parts.push(ContentPart::Text {
        text: composed_prompt,
    });
    parts.extend(image_parts);
    ComposedRequest { parts }
}
