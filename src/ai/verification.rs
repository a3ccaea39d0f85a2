//! Identity document selection, transport encoding and verdicts.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use super::AiResult;
use crate::error::FlowError;

/// An image the user picked but that has not been read yet.
///
/// Reading happens at submission time so a read failure belongs to that
/// verification attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentSelection {
    pub path: PathBuf,
    pub media_type: &'static str,
}

impl DocumentSelection {
    /// Accept a single image file, inferring its media type from the
    /// extension.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, FlowError> {
        let path = path.as_ref();
        let media_type = media_type_for(path)
            .ok_or_else(|| FlowError::UnsupportedDocument(path.display().to_string()))?;
        Ok(Self {
            path: path.to_path_buf(),
            media_type,
        })
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }

    /// Read the file and encode it for transport.
    pub async fn encode(&self) -> AiResult<EncodedDocument> {
        let bytes = tokio::fs::read(&self.path).await?;
        debug!(
            file = %self.path.display(),
            bytes = bytes.len(),
            "Read identity document"
        );
        Ok(EncodedDocument::from_bytes(
            self.file_name(),
            self.media_type,
            &bytes,
        ))
    }
}

fn media_type_for(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "webp" => Some("image/webp"),
        "heic" => Some("image/heic"),
        "heif" => Some("image/heif"),
        "gif" => Some("image/gif"),
        _ => None,
    }
}

/// Base64 payload plus its declared media type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedDocument {
    pub file_name: String,
    pub media_type: String,
    pub data: String,
}

impl EncodedDocument {
    pub fn from_bytes(file_name: impl Into<String>, media_type: &str, bytes: &[u8]) -> Self {
        Self {
            file_name: file_name.into(),
            media_type: media_type.to_string(),
            data: STANDARD.encode(bytes),
        }
    }
}

/// Outcome of a verification call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Verdict {
    pub is_valid: bool,
    pub reason: String,
}
