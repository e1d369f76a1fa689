use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use futures::future::try_join_all;
use thiserror::Error;

use crate::pipeline::provider::{ContentPart, InlineData};

#[derive(Debug, Error)]
pub enum ReferenceImageError {
    #[error("failed to read reference image '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// MIME type inferred from the lowercase file extension. By contract this is
/// extension-based, not content-sniffed; unknown extensions fall back to the
/// generic octet-stream type.
pub fn mime_for_reference_path(path: &Path) -> String {
    let ext = path
        .extension()
        .and_then(|v| v.to_str())
        .map(|v| v.trim().to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => String::from("image/png"),
        "jpg" | "jpeg" => String::from("image/jpeg"),
        "webp" => String::from("image/webp"),
        _ => String::from("application/octet-stream"),
    }
}

/// Reads every reference image concurrently and returns one inline part per
/// input path, in input order. The first read failure aborts the whole load
/// and names the offending path; partial results are discarded.
pub async fn load_reference_parts(
    paths: &[PathBuf],
) -> Result<Vec<ContentPart>, ReferenceImageError> {
    try_join_all(paths.iter().map(|path| async move {
        let bytes =
            tokio::fs::read(path)
                .await
                .map_err(|source| ReferenceImageError::Read {
                    path: path.display().to_string(),
                    source,
                })?;
        Ok(ContentPart::InlineData {
            inline_data: InlineData {
                mime_type: mime_for_reference_path(path),
                data: BASE64.encode(bytes),
            },
        })
    }))
    .await
}
