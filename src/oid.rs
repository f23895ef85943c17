//! LFS Object ID (OID) - SHA256 content hash.

use std::fmt;

use crate::{Error, Result};

/// Number of hex characters in a SHA256 OID.
pub const OID_HEX_LEN: usize = 64;

/// LFS Object ID - the hex SHA256 of the file content.
///
/// The hex text is kept exactly as it appeared in the pointer file so the
/// batch request echoes the server's own spelling back to it.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Oid {
    hex: String,
}

impl Oid {
    /// Parse an OID from a hex string.
    pub fn from_hex(hex: &str) -> Result<Self> {
        let hex = hex.trim();
        if hex.len() != OID_HEX_LEN {
            return Err(Error::InvalidOid(format!(
                "expected {} hex chars, got {}",
                OID_HEX_LEN,
                hex.len()
            )));
        }

        hex::decode(hex).map_err(|e| Error::InvalidOid(e.to_string()))?;

        Ok(Oid {
            hex: hex.to_string(),
        })
    }

    /// Find the first run of 64 hex characters anywhere in `text`.
    pub fn find_in(text: &str) -> Option<Self> {
        let bytes = text.as_bytes();
        let mut run_start = 0;
        for (i, b) in bytes.iter().enumerate() {
            if !b.is_ascii_hexdigit() {
                run_start = i + 1;
                continue;
            }
            if i + 1 - run_start == OID_HEX_LEN {
                return Some(Oid {
                    hex: text[run_start..=i].to_string(),
                });
            }
        }
        None
    }

    /// Get the OID as a hex string.
    pub fn as_str(&self) -> &str {
        &self.hex
    }
}

impl fmt::Display for Oid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.hex)
    }
}

impl fmt::Debug for Oid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Oid({})", self.hex)
    }
}

impl std::str::FromStr for Oid {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Oid::from_hex(s)
    }
}
