//! LFS HTTP client that turns pointers into download URLs.

use std::sync::Arc;
use url::Url;

use crate::batch::{BatchRequest, BatchRequestObject, BatchResponse};
use crate::{Error, Oid, Pointer, Result};

/// Media type of every Batch API request and response.
pub const LFS_MEDIA_TYPE: &str = "application/vnd.git-lfs+json";

/// Path of the batch endpoint relative to the LFS base URL.
const BATCH_PATH: &str = "objects/batch";

pub(crate) const USER_AGENT: &str = concat!("lfs-blob-resolver/", env!("CARGO_PKG_VERSION"));

/// LFS client for communicating with an LFS server.
///
/// This type is cheaply cloneable - multiple clones share the same underlying
/// HTTP agent and configuration.
#[derive(Clone)]
pub struct LfsClient {
    inner: Arc<LfsClientInner>,
}

struct LfsClientInner {
    /// The LFS API endpoint URL.
    lfs_url: Url,
    /// HTTP agent for making requests.
    agent: ureq::Agent,
    /// Optional ref name for batch requests (e.g., "refs/heads/main").
    ref_name: Option<String>,
}

impl LfsClient {
    /// Create a new LFS client for a repository URL.
    ///
    /// The URL should be the Git remote URL (e.g., `https://github.com/owner/repo.git`).
    /// The LFS endpoint is derived by appending `/info/lfs` to the base URL.
    pub fn new(repo_url: &str) -> Result<Self> {
        let lfs_url = derive_lfs_url(repo_url)?;
        Ok(Self::with_url(lfs_url))
    }

    /// Create a new LFS client with a specific LFS endpoint URL.
    pub fn with_url(lfs_url: Url) -> Self {
        LfsClient {
            inner: Arc::new(LfsClientInner {
                lfs_url,
                agent: ureq::Agent::new(),
                ref_name: None,
            }),
        }
    }

    /// Use an existing HTTP agent (shares its connection pool and timeouts).
    pub fn with_agent(self, agent: ureq::Agent) -> Self {
        LfsClient {
            inner: Arc::new(LfsClientInner {
                lfs_url: self.inner.lfs_url.clone(),
                agent,
                ref_name: self.inner.ref_name.clone(),
            }),
        }
    }

    /// Set the ref name for batch requests.
    ///
    /// The ref name is sent with batch requests to help servers with
    /// access control decisions (e.g., "refs/heads/main").
    pub fn with_ref(self, ref_name: &str) -> Self {
        LfsClient {
            inner: Arc::new(LfsClientInner {
                lfs_url: self.inner.lfs_url.clone(),
                agent: self.inner.agent.clone(),
                ref_name: Some(ref_name.to_string()),
            }),
        }
    }

    /// Get the LFS endpoint URL.
    pub fn lfs_url(&self) -> &Url {
        &self.inner.lfs_url
    }

    /// Get the ref name sent with batch requests, if any.
    pub fn ref_name(&self) -> Option<&str> {
        self.inner.ref_name.as_deref()
    }

    /// URL the batch request is POSTed to.
    pub fn batch_url(&self) -> Result<Url> {
        Ok(self.inner.lfs_url.join(BATCH_PATH)?)
    }

    /// Send a batch request to the LFS server.
    ///
    /// Transport failures and non-success statuses come back as
    /// [`Error::Fetch`]; a body that is not a batch response is an
    /// [`Error::LfsProtocol`].
    pub fn batch(&self, request: &BatchRequest) -> Result<BatchResponse> {
        let url = self.batch_url()?;

        let response = self
            .inner
            .agent
            .post(url.as_str())
            .set("Accept", LFS_MEDIA_TYPE)
            .set("Content-Type", LFS_MEDIA_TYPE)
            .set("User-Agent", USER_AGENT)
            .send_json(request)?;

        let body = response
            .into_string()
            .map_err(|e| Error::read_body(url.as_str(), e))?;

        serde_json::from_str(&body).map_err(|e| Error::LfsProtocol {
            oid: request_oids(request),
            code: None,
            message: format!("invalid batch response: {}", e),
        })
    }

    /// Ask the LFS server for a download URL for the pointer's object.
    ///
    /// Exactly one batch request is sent. The `href` of the first object's
    /// download action is returned as-is; it is usually signed and
    /// short-lived.
    pub fn download_url(&self, pointer: &Pointer) -> Result<String> {
        let oid = pointer.oid().as_str();

        let mut batch_req =
            BatchRequest::download(vec![BatchRequestObject::new(oid, pointer.size())]);
        if let Some(ref_name) = &self.inner.ref_name {
            batch_req = batch_req.with_ref(ref_name);
        }

        tracing::debug!(
            oid,
            size = pointer.size(),
            lfs_url = %self.inner.lfs_url,
            ref_name = ?self.inner.ref_name,
            "requesting LFS download action"
        );

        let batch_resp = self.batch(&batch_req)?;

        let protocol_error = |code: Option<u16>, message: String| Error::LfsProtocol {
            oid: oid.to_string(),
            code,
            message,
        };

        let obj = batch_resp
            .objects
            .first()
            .ok_or_else(|| protocol_error(None, "no objects in batch response".into()))?;

        // Check for errors
        if let Some(err) = &obj.error {
            return Err(protocol_error(Some(err.code), err.message.clone()));
        }

        let action = obj
            .download_action()
            .ok_or_else(|| protocol_error(None, "no download action in batch response".into()))?;

        if action.href.is_empty() {
            return Err(protocol_error(None, "download action has an empty href".into()));
        }

        tracing::debug!(oid, expires_in = ?action.expires_in, "resolved LFS download action");

        Ok(action.href.clone())
    }
}

/// Resolve a download URL straight from a batch endpoint, oid and size.
///
/// `endpoint` is the full batch URL, e.g.
/// `https://github.com/owner/repo.git/info/lfs/objects/batch`.
pub fn get_download_url(endpoint: &str, oid: &str, size: u64) -> Result<String> {
    let base = endpoint.trim().strip_suffix(BATCH_PATH).ok_or_else(|| {
        Error::InvalidUrl(format!("{} is not an LFS batch endpoint", endpoint))
    })?;
    let client = LfsClient::with_url(Url::parse(base)?);
    client.download_url(&Pointer::new(Oid::from_hex(oid)?, size))
}

fn request_oids(request: &BatchRequest) -> String {
    request
        .objects
        .iter()
        .map(|o| o.oid.as_str())
        .collect::<Vec<_>>()
        .join(",")
}

/// Derive the LFS endpoint URL from a Git remote URL.
pub(crate) fn derive_lfs_url(repo_url: &str) -> Result<Url> {
    let repo_url = repo_url.trim();

    // Handle SSH URLs (git@github.com:owner/repo.git)
    if let Some(rest) = repo_url.strip_prefix("git@") {
        if let Some((host, path)) = rest.split_once(':') {
            // Keep .git if present, add it if not - GitHub requires it
            let path = if path.ends_with(".git") {
                path.to_string()
            } else {
                format!("{}.git", path)
            };
            // Trailing slash needed for correct URL joining
            let url_str = format!("https://{}/{}/info/lfs/", host, path);
            return Url::parse(&url_str).map_err(|e| Error::InvalidUrl(e.to_string()));
        }
    }

    // Handle HTTPS URLs
    let mut url = Url::parse(repo_url).map_err(|e| Error::InvalidUrl(e.to_string()))?;

    // Keep .git if present, add it if not - GitHub requires it in the LFS path
    let path = url.path().trim_end_matches('/');
    let path = if path.ends_with(".git") {
        path.to_string()
    } else {
        format!("{}.git", path)
    };
    let new_path = format!("{}/info/lfs/", path);
    url.set_path(&new_path);

    Ok(url)
}
