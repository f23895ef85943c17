//! LFS pointer file format.
//!
//! LFS pointer files are small text files that replace large files in the Git repository.
//! They contain metadata about the actual file stored in LFS.

use crate::{Error, Oid, Result};

/// LFS specification version.
pub const LFS_SPEC_V1: &str = "https://git-lfs.github.com/spec/v1";

/// Maximum size of an LFS pointer file (1KB).
pub const MAX_POINTER_SIZE: usize = 1024;

/// Number of leading bytes inspected when classifying content.
pub const SNIFF_LEN: usize = 30;

/// Marker that every git-lfs pointer carries in its version line.
const LFS_MARKER: &str = "git-lfs";

/// Version line written by pre-1.0 clients.
const LEGACY_VERSION: &str = "version https://hawser.github.com/spec/v1";

/// An LFS pointer representing a file stored in LFS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pointer {
    /// The SHA256 hash of the file content.
    oid: Oid,
    /// The size of the file in bytes.
    size: u64,
}

impl Pointer {
    /// Create a new pointer with the given OID and size.
    pub fn new(oid: Oid, size: u64) -> Self {
        Pointer { oid, size }
    }

    /// Check whether the leading bytes of some content carry the LFS
    /// pointer signature.
    ///
    /// Only the first [`SNIFF_LEN`] bytes are looked at, so callers may pass
    /// a truncated prefix of an arbitrarily large file.
    pub fn sniff(prefix: &[u8]) -> bool {
        let head = &prefix[..prefix.len().min(SNIFF_LEN)];
        if head
            .windows(LFS_MARKER.len())
            .any(|w| w == LFS_MARKER.as_bytes())
        {
            return true;
        }
        head.len() == SNIFF_LEN && LEGACY_VERSION.as_bytes().starts_with(head)
    }

    /// Parse a pointer from the body of a file that was sniffed as a pointer.
    ///
    /// The oid is the first run of 64 hex characters anywhere in the body and
    /// the size is the integer following the `size ` key. Either one missing
    /// is a [`Error::MalformedPointer`].
    pub fn parse(content: &[u8]) -> Result<Self> {
        let text = String::from_utf8_lossy(content);

        let oid = Oid::find_in(&text)
            .ok_or_else(|| Error::MalformedPointer("missing oid".into()))?;

        let size_line = text
            .lines()
            .find(|line| line.contains("size "))
            .ok_or_else(|| Error::MalformedPointer("missing size".into()))?;
        let size = parse_size(size_line)?;

        Ok(Pointer { oid, size })
    }

    /// Get the OID of this pointer.
    pub fn oid(&self) -> &Oid {
        &self.oid
    }

    /// Get the size of the file.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Encode the pointer to its text representation.
    pub fn encode(&self) -> String {
        format!(
            "version {}\noid sha256:{}\nsize {}\n",
            LFS_SPEC_V1, self.oid, self.size
        )
    }
}

impl std::fmt::Display for Pointer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.encode())
    }
}

/// Take the numeric suffix of the line holding the `size ` key.
fn parse_size(line: &str) -> Result<u64> {
    let line = line.trim_end();
    let digits_start = line
        .rfind(|c: char| !c.is_ascii_digit())
        .map(|i| i + 1)
        .unwrap_or(0);
    let digits = &line[digits_start..];

    if digits.is_empty() {
        return Err(Error::MalformedPointer(format!(
            "invalid size line: {:?}",
            line
        )));
    }

    digits
        .parse()
        .map_err(|_| Error::MalformedPointer(format!("size out of range: {}", digits)))
}
