//! HTTP client infrastructure for the form catalog API.
//!
//! This crate provides:
//! - an error taxonomy every request failure is classified into
//! - a fetch-and-validate executor with timeout, retry and cancellation
//! - the wire types of the listing and detail endpoints
//! - an in-memory mock client for tests (feature `tests`)
//!
//! ## Usage
//!
//! ```ignore
//! use dex_catalog::{ClientTrait, DexClient, DexClientConfig};
//!
//! let client = DexClient::new(DexClientConfig::default())?;
//! let entries = client.fetch_catalog().await?;
//! let detail = client.fetch_detail(&entries[0].url, None).await?;
//! ```

mod client;
mod config;
mod error;
pub mod retry;
pub mod types;

#[cfg(any(test, feature = "tests"))]
pub mod testing;

pub use client::{ClientTrait, DexClient, decode_and_validate};
pub use config::{
    DEFAULT_BASE_URL,
    DEFAULT_CATALOG_LIMIT,
    DEFAULT_REQUEST_TIMEOUT,
    DEFAULT_RESOURCE,
    DexClientConfig,
};
pub use error::{ClientBuildError, DexError, ErrorKind};
pub use reqwest::StatusCode;
pub use retry::{RetryPolicy, is_retryable};
pub use tokio_util::sync::CancellationToken;
