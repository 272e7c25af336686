//! Provider abstractions for remote metadata collaborators.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod http;
pub mod noop;

/// Multipart field name shared by every file part of an upload.
pub const UPLOAD_FIELD: &str = "files";

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("not implemented")]
    NotImplemented,
    #[error("request failed: {0}")]
    RequestFailed(String),
    #[error("remote returned status {0}")]
    Status(u16),
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    #[error("failed to build HTTP client: {0}")]
    Client(String),
}

/// Filesystem-level metadata as computed by a remote collaborator.
///
/// This is the wire record of `POST /upload`; the server serializes it and
/// the HTTP provider deserializes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub size: u64,
    #[serde(rename = "type", default)]
    pub content_type: String,
    #[serde(default)]
    pub created: Option<DateTime<Utc>>,
    #[serde(default)]
    pub modified: Option<DateTime<Utc>>,
    pub hash: String,
}

/// One file part of an upload. Owns its bytes so they can be handed to the
/// request body without another copy.
#[derive(Debug)]
pub struct UploadFile {
    pub name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

#[async_trait::async_trait]
pub trait MetadataProvider: Send + Sync {
    /// Describes every file in a single round trip. Records come back in
    /// submission order.
    async fn describe(&self, files: Vec<UploadFile>) -> Result<Vec<RemoteMetadata>, ProviderError>;
}
