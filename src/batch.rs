//! LFS Batch API types.
//!
//! The Batch API is used to request download URLs for LFS objects.
//! See: https://github.com/git-lfs/git-lfs/blob/main/docs/api/batch.md

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The only transfer adapter this crate speaks.
pub const BASIC_TRANSFER: &str = "basic";

/// Operation type for batch requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    /// Download objects from the server.
    Download,
}

/// A batch request to the LFS server.
#[derive(Debug, Clone, Serialize)]
pub struct BatchRequest {
    /// The operation to perform.
    pub operation: Operation,
    /// The transfer adapters the client supports.
    pub transfers: Vec<String>,
    /// Reference information (branch, etc).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub r#ref: Option<RefInfo>,
    /// The objects to operate on.
    pub objects: Vec<BatchRequestObject>,
}

/// Reference information for a batch request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefInfo {
    /// The reference name (e.g., "refs/heads/main").
    pub name: String,
}

/// An object in a batch request.
#[derive(Debug, Clone, Serialize)]
pub struct BatchRequestObject {
    /// The SHA256 OID of the object.
    pub oid: String,
    /// The size of the object in bytes.
    pub size: u64,
}

/// A batch response from the LFS server.
#[derive(Debug, Clone, Deserialize)]
pub struct BatchResponse {
    /// The transfer adapter to use (usually "basic").
    #[serde(default = "default_transfer")]
    pub transfer: String,
    /// The objects with their actions.
    #[serde(default)]
    pub objects: Vec<BatchObject>,
}

fn default_transfer() -> String {
    BASIC_TRANSFER.to_string()
}

/// An object in a batch response.
#[derive(Debug, Clone, Deserialize)]
pub struct BatchObject {
    /// The SHA256 OID of the object.
    pub oid: String,
    /// The size of the object in bytes.
    #[serde(default)]
    pub size: u64,
    /// Whether the object was authenticated.
    #[serde(default)]
    pub authenticated: Option<bool>,
    /// Actions available for this object.
    #[serde(default)]
    pub actions: Option<HashMap<String, Action>>,
    /// Error information if the object failed.
    #[serde(default)]
    pub error: Option<BatchError>,
}

/// An action (download URL) for an object.
#[derive(Debug, Clone, Deserialize)]
pub struct Action {
    /// The URL for the action.
    pub href: String,
    /// HTTP headers to include in the request.
    #[serde(default)]
    pub header: HashMap<String, String>,
    /// Seconds until the action expires.
    #[serde(default)]
    pub expires_in: Option<u64>,
    /// Absolute expiration time (ISO 8601).
    #[serde(default)]
    pub expires_at: Option<String>,
}

/// Error information for a batch object.
#[derive(Debug, Clone, Deserialize)]
pub struct BatchError {
    /// HTTP status code.
    pub code: u16,
    /// Error message.
    #[serde(default)]
    pub message: String,
}

impl BatchRequest {
    /// Create a new batch request for downloading objects.
    pub fn download(objects: Vec<BatchRequestObject>) -> Self {
        BatchRequest {
            operation: Operation::Download,
            transfers: vec![BASIC_TRANSFER.to_string()],
            r#ref: None,
            objects,
        }
    }

    /// Set the reference for this request.
    pub fn with_ref(mut self, name: &str) -> Self {
        self.r#ref = Some(RefInfo {
            name: name.to_string(),
        });
        self
    }
}

impl BatchRequestObject {
    /// Create a new batch request object.
    pub fn new(oid: &str, size: u64) -> Self {
        BatchRequestObject {
            oid: oid.to_string(),
            size,
        }
    }
}

impl BatchObject {
    /// Get the download action if available.
    pub fn download_action(&self) -> Option<&Action> {
        self.actions.as_ref()?.get("download")
    }

    /// Check if this object has an error.
    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }
}
