//! Repository file coordinates and resolved blob URLs.

use std::fmt;

/// A file at a specific revision of a specific repository.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepositoryFileRef {
    pub owner: String,
    pub name: String,
    pub r#ref: String,
    pub path: String,
}

impl RepositoryFileRef {
    pub fn new(owner: &str, name: &str, r#ref: &str, path: &str) -> Self {
        RepositoryFileRef {
            owner: owner.to_string(),
            name: name.to_string(),
            r#ref: r#ref.to_string(),
            path: path.to_string(),
        }
    }

    /// Raw-content URL under `base`, which must end in `/`.
    ///
    /// Plain concatenation: the path is used exactly as the caller gave it.
    pub fn raw_url(&self, base: &str) -> String {
        format!(
            "{}{}/{}/{}/{}",
            base,
            self.owner,
            self.name,
            self.r#ref,
            self.path.trim_start_matches('/')
        )
    }

    /// Git remote URL of the repository under `base`, which must end in `/`.
    pub fn remote_url(&self, base: &str) -> String {
        format!("{}{}/{}.git", base, self.owner, self.name)
    }

    /// Ref name sent with the batch request for this file's revision.
    ///
    /// Fully qualified refs pass through, bare commit ids have no ref name,
    /// and anything else is taken to be a branch.
    pub fn lfs_ref_name(&self) -> Option<String> {
        let r = self.r#ref.as_str();
        if r.starts_with("refs/") {
            Some(r.to_string())
        } else if is_commit_id(r) {
            None
        } else {
            Some(format!("refs/heads/{}", r))
        }
    }
}

impl fmt::Display for RepositoryFileRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}@{}:{}", self.owner, self.name, self.r#ref, self.path)
    }
}

fn is_commit_id(r: &str) -> bool {
    (r.len() == 40 || r.len() == 64) && r.bytes().all(|b| b.is_ascii_hexdigit())
}

/// The final download URL for a file.
///
/// Exactly one of the two variants is produced per resolution, decided by
/// whether the raw content was an LFS pointer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedBlobUrl {
    /// The file is stored directly in git; the raw-content URL serves it.
    Raw(String),
    /// The file is an LFS object; this is the (usually signed, short-lived)
    /// download href from the batch response.
    Lfs(String),
}

impl ResolvedBlobUrl {
    pub fn as_str(&self) -> &str {
        match self {
            ResolvedBlobUrl::Raw(url) | ResolvedBlobUrl::Lfs(url) => url,
        }
    }

    pub fn into_string(self) -> String {
        match self {
            ResolvedBlobUrl::Raw(url) | ResolvedBlobUrl::Lfs(url) => url,
        }
    }

    pub fn is_lfs(&self) -> bool {
        matches!(self, ResolvedBlobUrl::Lfs(_))
    }
}

impl fmt::Display for ResolvedBlobUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
