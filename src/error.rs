//! Error types for blob resolution and catalog operations.

use thiserror::Error;

/// Result type for lfs-blob-resolver operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while resolving blobs or talking to the catalog.
#[derive(Error, Debug)]
pub enum Error {
    /// The raw-content host, LFS endpoint or catalog did not return a
    /// usable response (transport error or non-success status).
    #[error("fetch failed for {url}: {message}")]
    Fetch {
        url: String,
        status: Option<u16>,
        message: String,
    },

    /// Pointer signature was found but oid or size could not be extracted.
    #[error("malformed LFS pointer: {0}")]
    MalformedPointer(String),

    /// The batch response had no usable download action for the object.
    #[error("LFS batch failed for {oid}: {message}")]
    LfsProtocol {
        oid: String,
        code: Option<u16>,
        message: String,
    },

    /// OID parsing error
    #[error("invalid OID: {0}")]
    InvalidOid(String),

    /// Invalid URL
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// URL parsing error
    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Catalog API answered with an unsuccessful envelope.
    #[error("catalog error: {0}")]
    Catalog(String),
}

impl Error {
    /// True for transport failures and non-success statuses.
    pub fn is_fetch_failure(&self) -> bool {
        matches!(self, Error::Fetch { .. })
    }

    /// True when the object or file is reported as missing, either by an
    /// HTTP 404 or by a per-object 404 in a batch response.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Error::Fetch {
                status: Some(404),
                ..
            } | Error::LfsProtocol {
                code: Some(404),
                ..
            }
        )
    }

    pub(crate) fn read_body(url: &str, err: std::io::Error) -> Self {
        Error::Fetch {
            url: url.to_string(),
            status: None,
            message: format!("failed to read response body: {}", err),
        }
    }
}

impl From<ureq::Error> for Error {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::Status(code, response) => {
                let url = response.get_url().to_string();
                let message = response
                    .into_string()
                    .ok()
                    .filter(|body| !body.trim().is_empty())
                    .unwrap_or_else(|| format!("HTTP status {}", code));
                Error::Fetch {
                    url,
                    status: Some(code),
                    message,
                }
            }
            ureq::Error::Transport(transport) => Error::Fetch {
                url: transport
                    .url()
                    .map(|u| u.to_string())
                    .unwrap_or_default(),
                status: None,
                message: transport.to_string(),
            },
        }
    }
}
