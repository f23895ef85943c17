//! # lfs-blob-resolver
//!
//! Turn a file in a hosted git repository into a URL its bytes can be
//! fetched from, whether the file is stored in git directly or through
//! Git LFS.
//!
//! This crate provides:
//! - LFS pointer sniffing and parsing from a bounded prefix of raw content
//! - An LFS Batch API client that trades a pointer for a download href
//! - A CKAN catalog client that answers in data package vocabulary
//!
//! ## Example
//!
//! ```no_run
//! use lfs_blob_resolver::{BlobResolver, ResolvedBlobUrl};
//!
//! let resolver = BlobResolver::new();
//! match resolver.resolve_blob("datasets", "gdp", "master", "data/gdp.csv").unwrap() {
//!     ResolvedBlobUrl::Raw(url) => println!("stored in git: {}", url),
//!     ResolvedBlobUrl::Lfs(url) => println!("stored in LFS: {}", url),
//! }
//! ```

mod error;
mod oid;
mod pointer;
mod batch;
mod blob;
mod client;
mod resolver;

pub mod catalog;

pub use error::{Error, Result};
pub use oid::Oid;
pub use pointer::{Pointer, MAX_POINTER_SIZE, SNIFF_LEN};
pub use batch::{Action, BatchError, BatchObject, BatchRequest, BatchRequestObject, BatchResponse, Operation, RefInfo};
pub use blob::{RepositoryFileRef, ResolvedBlobUrl};
pub use client::{get_download_url, LfsClient, LFS_MEDIA_TYPE};
pub use resolver::{resolve_blob, BlobResolver, DEFAULT_LFS_BASE, DEFAULT_RAW_BASE};
pub use catalog::CatalogClient;
