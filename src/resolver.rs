//! Raw-content fetch and pointer sniffing.
//!
//! Resolution is a two-step pipeline: fetch a bounded prefix of the file's
//! raw content, then either hand back the raw URL or, if the prefix is an
//! LFS pointer, ask the repository's LFS server for a download URL.

use std::io::Read;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

use crate::client::USER_AGENT;
use crate::pointer::MAX_POINTER_SIZE;
use crate::{Error, LfsClient, Pointer, RepositoryFileRef, ResolvedBlobUrl, Result};

/// Host serving raw file content.
pub const DEFAULT_RAW_BASE: &str = "https://raw.githubusercontent.com/";

/// Host serving git remotes and their LFS endpoints.
pub const DEFAULT_LFS_BASE: &str = "https://github.com/";

/// Resolves repository files to byte-fetchable URLs.
///
/// This type is cheaply cloneable and holds no per-resolution state, so
/// clones can resolve different files from different threads at once.
#[derive(Clone)]
pub struct BlobResolver {
    inner: Arc<BlobResolverInner>,
}

struct BlobResolverInner {
    raw_base: Url,
    lfs_base: Url,
    agent: ureq::Agent,
}

impl Default for BlobResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl BlobResolver {
    /// Create a resolver against the public GitHub hosts.
    pub fn new() -> Self {
        BlobResolver {
            inner: Arc::new(BlobResolverInner {
                raw_base: Url::parse(DEFAULT_RAW_BASE).expect("default raw base is a valid URL"),
                lfs_base: Url::parse(DEFAULT_LFS_BASE).expect("default LFS base is a valid URL"),
                agent: ureq::Agent::new(),
            }),
        }
    }

    /// Serve raw content from a different host (e.g. a mirror).
    pub fn with_raw_base(self, raw_base: &str) -> Result<Self> {
        let raw_base = parse_base(raw_base)?;
        Ok(self.rebuild(|inner| inner.raw_base = raw_base))
    }

    /// Look for git remotes and LFS endpoints on a different host.
    pub fn with_lfs_base(self, lfs_base: &str) -> Result<Self> {
        let lfs_base = parse_base(lfs_base)?;
        Ok(self.rebuild(|inner| inner.lfs_base = lfs_base))
    }

    /// Bound every request (connect, send and read) by `timeout`.
    pub fn with_timeout(self, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        self.with_agent(agent)
    }

    /// Use an existing HTTP agent.
    pub fn with_agent(self, agent: ureq::Agent) -> Self {
        self.rebuild(|inner| inner.agent = agent)
    }

    fn rebuild(self, f: impl FnOnce(&mut BlobResolverInner)) -> Self {
        let mut inner = BlobResolverInner {
            raw_base: self.inner.raw_base.clone(),
            lfs_base: self.inner.lfs_base.clone(),
            agent: self.inner.agent.clone(),
        };
        f(&mut inner);
        BlobResolver {
            inner: Arc::new(inner),
        }
    }

    /// Base URL raw-content URLs are built under.
    pub fn raw_base(&self) -> &Url {
        &self.inner.raw_base
    }

    /// Base URL git remotes are built under.
    pub fn lfs_base(&self) -> &Url {
        &self.inner.lfs_base
    }

    /// Canonical raw-content URL for a file.
    pub fn raw_url(&self, file: &RepositoryFileRef) -> String {
        file.raw_url(self.inner.raw_base.as_str())
    }

    /// LFS client for the file's repository, carrying the file's ref.
    pub fn lfs_client(&self, file: &RepositoryFileRef) -> Result<LfsClient> {
        let client = LfsClient::new(&file.remote_url(self.inner.lfs_base.as_str()))?
            .with_agent(self.inner.agent.clone());
        Ok(match file.lfs_ref_name() {
            Some(ref_name) => client.with_ref(&ref_name),
            None => client,
        })
    }

    /// Resolve `owner/name@ref:path` to a download URL.
    pub fn resolve_blob(
        &self,
        owner: &str,
        name: &str,
        r#ref: &str,
        path: &str,
    ) -> Result<ResolvedBlobUrl> {
        self.resolve(&RepositoryFileRef::new(owner, name, r#ref, path))
    }

    /// Resolve a file to a download URL.
    ///
    /// Plain files resolve to their raw-content URL after one request. LFS
    /// pointers cost a second request, to the batch endpoint, and resolve to
    /// the href it returns. Failures are never papered over with the raw URL.
    pub fn resolve(&self, file: &RepositoryFileRef) -> Result<ResolvedBlobUrl> {
        let raw_url = self.raw_url(file);
        tracing::debug!(%file, raw_url = %raw_url, "fetching raw content prefix");

        let prefix = self.fetch_prefix(&raw_url)?;

        if !Pointer::sniff(&prefix) {
            tracing::debug!(%file, "not an LFS pointer, using raw URL");
            return Ok(ResolvedBlobUrl::Raw(raw_url));
        }

        let pointer = Pointer::parse(&prefix)?;
        tracing::debug!(%file, oid = %pointer.oid(), size = pointer.size(), "found LFS pointer");

        let href = self.lfs_client(file)?.download_url(&pointer)?;
        Ok(ResolvedBlobUrl::Lfs(href))
    }

    /// Read at most [`MAX_POINTER_SIZE`] bytes of the body at `url`.
    fn fetch_prefix(&self, url: &str) -> Result<Vec<u8>> {
        let response = self
            .inner
            .agent
            .get(url)
            .set("User-Agent", USER_AGENT)
            .call()?;

        let mut prefix = Vec::with_capacity(MAX_POINTER_SIZE);
        response
            .into_reader()
            .take(MAX_POINTER_SIZE as u64)
            .read_to_end(&mut prefix)
            .map_err(|e| Error::read_body(url, e))?;

        Ok(prefix)
    }
}

/// Resolve a file on the public GitHub hosts.
pub fn resolve_blob(owner: &str, name: &str, r#ref: &str, path: &str) -> Result<ResolvedBlobUrl> {
    BlobResolver::new().resolve_blob(owner, name, r#ref, path)
}

/// Parse a base URL and make sure it ends in `/` so joining appends to it.
pub(crate) fn parse_base(base: &str) -> Result<Url> {
    let base = base.trim();
    let base = if base.ends_with('/') {
        base.to_string()
    } else {
        format!("{}/", base)
    };
    let url = Url::parse(&base).map_err(|e| Error::InvalidUrl(format!("{}: {}", base, e)))?;
    if url.cannot_be_a_base() {
        return Err(Error::InvalidUrl(format!("{} cannot be a base URL", base)));
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let resolver = BlobResolver::new();
        assert_eq!(resolver.raw_base().as_str(), DEFAULT_RAW_BASE);
        assert_eq!(resolver.lfs_base().as_str(), DEFAULT_LFS_BASE);
    }

    #[test]
    fn test_raw_url_uses_configured_base() {
        let resolver = BlobResolver::new()
            .with_raw_base("http://127.0.0.1:8080/raw")
            .unwrap();
        let file = RepositoryFileRef::new("owner", "repo", "main", "data.csv");
        assert_eq!(
            resolver.raw_url(&file),
            "http://127.0.0.1:8080/raw/owner/repo/main/data.csv"
        );
    }

    #[test]
    fn test_invalid_base() {
        assert!(matches!(
            BlobResolver::new().with_raw_base("not a url"),
            Err(Error::InvalidUrl(_))
        ));
        assert!(matches!(
            BlobResolver::new().with_lfs_base("mailto:someone@example.com"),
            Err(Error::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_lfs_client_endpoint_and_ref() {
        let resolver = BlobResolver::new();
        let file = RepositoryFileRef::new("owner", "repo", "dev", "big.bin");
        let client = resolver.lfs_client(&file).unwrap();
        assert_eq!(
            client.batch_url().unwrap().as_str(),
            "https://github.com/owner/repo.git/info/lfs/objects/batch"
        );
        assert_eq!(client.ref_name(), Some("refs/heads/dev"));
    }

    #[test]
    fn test_builder_keeps_other_settings() {
        let resolver = BlobResolver::new()
            .with_lfs_base("http://lfs.local")
            .unwrap()
            .with_timeout(Duration::from_secs(5));
        assert_eq!(resolver.lfs_base().as_str(), "http://lfs.local/");
        assert_eq!(resolver.raw_base().as_str(), DEFAULT_RAW_BASE);
    }
}
