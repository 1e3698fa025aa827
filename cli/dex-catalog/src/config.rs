//! Configuration types for catalog client construction.

use std::collections::BTreeMap;
use std::time::Duration;

use crate::retry::RetryPolicy;

pub const DEFAULT_BASE_URL: &str = "https://pokeapi.co/api/v2";
pub const DEFAULT_RESOURCE: &str = "pokemon";
pub const DEFAULT_CATALOG_LIMIT: u32 = 1500;
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Configuration for catalog client construction.
#[derive(Debug, Clone)]
pub struct DexClientConfig {
    /// Base URL of the catalog API, without a trailing slash.
    pub base_url: String,
    /// The listing is served at `{base_url}/{resource}-form`.
    pub resource: String,
    /// Number of entries requested from the listing endpoint.
    pub catalog_limit: u32,
    /// Upper bound for a single attempt, independent of caller cancellation.
    pub request_timeout: Duration,
    pub retry: RetryPolicy,
    pub user_agent: Option<String>,
    /// Additional headers to include in requests.
    pub extra_headers: BTreeMap<String, String>,
}

impl Default for DexClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            resource: DEFAULT_RESOURCE.to_string(),
            catalog_limit: DEFAULT_CATALOG_LIMIT,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            retry: RetryPolicy::default(),
            user_agent: None,
            extra_headers: BTreeMap::new(),
        }
    }
}
