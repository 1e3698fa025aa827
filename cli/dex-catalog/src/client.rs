//! HTTP client for the catalog API.

use std::fmt::Debug;
use std::future::Future;
use std::str::FromStr;
use std::time::Duration;

use reqwest::header::{self, HeaderMap};
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::config::DexClientConfig;
use crate::error::{ClientBuildError, DexError};
use crate::retry::{abortable, sleep_with_cancel};
use crate::types::{CatalogEntry, CatalogListResponse, EntityDetail, Validate};

/// The catalog API interface.
///
/// This trait enables alternate implementations:
/// - **HTTP**: requests against the remote API via [`DexClient`]
/// - **Mock** (tests): canned, delayable responses without HTTP
pub trait ClientTrait: Send + Sync {
    /// Fetch the complete catalog listing.
    ///
    /// Takes no cancellation token, the listing is shared between callers.
    fn fetch_catalog(&self) -> impl Future<Output = Result<Vec<CatalogEntry>, DexError>> + Send;

    /// Fetch the detail record found at `url`.
    fn fetch_detail(
        &self,
        url: &Url,
        cancel: Option<&CancellationToken>,
    ) -> impl Future<Output = Result<EntityDetail, DexError>> + Send;
}

/// A client for the catalog API.
///
/// Handles:
/// - HTTP client configuration with timeouts and headers
/// - retrying failed requests according to the configured [crate::RetryPolicy]
/// - classifying every failure into a [DexError]
pub struct DexClient {
    http: reqwest::Client,
    config: DexClientConfig,
    /// Validated base URL without a trailing slash.
    base_url: String,
}

impl Debug for DexClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DexClient")
            .field("base_url", &self.base_url)
            .field("resource", &self.config.resource)
            .finish_non_exhaustive()
    }
}

impl DexClient {
    /// Create a new catalog client from configuration.
    pub fn new(config: DexClientConfig) -> Result<Self, ClientBuildError> {
        let base_url = config.base_url.trim_end_matches('/').to_string();
        Url::parse(&base_url).map_err(|source| ClientBuildError::InvalidBaseUrl {
            url: config.base_url.clone(),
            source,
        })?;

        let http = build_http_client(&config)?;

        Ok(Self {
            http,
            config,
            base_url,
        })
    }

    /// `{base}/{resource}-form?limit={catalog_limit}`
    pub fn catalog_url(&self) -> Result<Url, DexError> {
        let mut url = Url::parse(&format!(
            "{}/{}-form",
            self.base_url, self.config.resource
        ))
        .map_err(|e| DexError::unknown(format!("invalid catalog url: {e}")))?;
        url.query_pairs_mut()
            .append_pair("limit", &self.config.catalog_limit.to_string());
        Ok(url)
    }

    /// GET `url`, then parse and validate the body as `T`.
    ///
    /// Retryable failures are retried with linear backoff. A fired `cancel`
    /// token aborts immediately, whether the request is in flight or waiting
    /// for the next attempt.
    #[instrument(skip_all, fields(url = %url))]
    pub async fn fetch_and_validate<T>(
        &self,
        url: &Url,
        cancel: Option<&CancellationToken>,
    ) -> Result<T, DexError>
    where
        T: DeserializeOwned + Validate,
    {
        if cancel.is_some_and(CancellationToken::is_cancelled) {
            debug!("request cancelled before it was sent");
            return Err(DexError::Aborted);
        }

        let policy = self.config.retry;

        let mut retries = 0;
        loop {
            debug!(attempt = retries + 1, "sending request");
            match abortable(cancel, self.attempt(url)).await {
                Ok(value) => return Ok(value),
                Err(err) if policy.should_retry(&err, retries) => {
                    retries += 1;
                    let delay = policy.delay_for(retries);
                    warn!(%err, retries, ?delay, "request failed, retrying");
                    sleep_with_cancel(delay, cancel).await?;
                },
                Err(err) => {
                    debug!(%err, attempts = retries + 1, "request failed");
                    return Err(err);
                },
            }
        }
    }

    /// A single request, bounded by the configured timeout.
    async fn attempt<T>(&self, url: &Url) -> Result<T, DexError>
    where
        T: DeserializeOwned + Validate,
    {
        let response = self
            .http
            .get(url.clone())
            .timeout(self.config.request_timeout)
            .send()
            .await
            .map_err(DexError::from_transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(DexError::api(status));
        }

        let body = response.bytes().await.map_err(DexError::from_transport)?;
        decode_and_validate(&body)
    }
}

impl ClientTrait for DexClient {
    #[instrument(skip_all)]
    async fn fetch_catalog(&self) -> Result<Vec<CatalogEntry>, DexError> {
        let url = self.catalog_url()?;
        let listing: CatalogListResponse = self.fetch_and_validate(&url, None).await?;
        debug!(n_entries = listing.results.len(), "received catalog");
        Ok(listing.results)
    }

    async fn fetch_detail(
        &self,
        url: &Url,
        cancel: Option<&CancellationToken>,
    ) -> Result<EntityDetail, DexError> {
        self.fetch_and_validate(url, cancel).await
    }
}

/// Parse `body` as JSON and check it against the shape of `T`.
///
/// A body that is not JSON at all is not a schema violation and is reported
/// as [DexError::Unknown].
pub fn decode_and_validate<T>(body: &[u8]) -> Result<T, DexError>
where
    T: DeserializeOwned + Validate,
{
    let json: serde_json::Value = serde_json::from_slice(body)
        .map_err(|e| DexError::unknown(format!("response is not valid JSON: {e}")))?;
    let value: T = serde_json::from_value(json).map_err(DexError::validation)?;
    value.validate().map_err(DexError::validation)?;
    Ok(value)
}

// ---------------------------------------------------------------------------
// HTTP client builder
// ---------------------------------------------------------------------------

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

fn build_http_client(config: &DexClientConfig) -> Result<reqwest::Client, ClientBuildError> {
    let mut headers = HeaderMap::new();

    for (key, value) in &config.extra_headers {
        headers.insert(
            header::HeaderName::from_str(key)
                .map_err(|_| ClientBuildError::InvalidHeader(key.clone()))?,
            header::HeaderValue::from_str(value)
                .map_err(|_| ClientBuildError::InvalidHeader(key.clone()))?,
        );
    }

    debug!(
        base_url = %config.base_url,
        extra_headers = config.extra_headers.len(),
        "building catalog HTTP client"
    );

    let client_builder = reqwest::Client::builder()
        .default_headers(headers)
        .connect_timeout(CONNECT_TIMEOUT.min(config.request_timeout));

    let client_builder = if let Some(ref user_agent) = config.user_agent {
        client_builder.user_agent(user_agent)
    } else {
        client_builder
    };

    client_builder.build().map_err(ClientBuildError::Http)
}
