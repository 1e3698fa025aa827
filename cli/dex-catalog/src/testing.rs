//! An in-memory [ClientTrait] implementation for tests.
//!
//! Responses are queued per endpoint. The last queued response of an
//! endpoint is repeated for every further request, so a single push is
//! enough for endpoints that should always answer the same way.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use url::Url;

use crate::client::ClientTrait;
use crate::error::DexError;
use crate::retry::{abortable, sleep_with_cancel};
use crate::types::{CatalogEntry, EntityDetail, Sprites};

// Arc allows you to push things into the client from outside the client if necessary
// Mutex allows you to share across threads (necessary because of tokio)
type MockField<T> = Arc<Mutex<T>>;

pub const MOCK_BASE_URL: &str = "https://pokeapi.co/api/v2";

/// A canned response, optionally delivered after a delay.
#[derive(Debug, Clone)]
pub struct MockResponse<T> {
    pub result: Result<T, DexError>,
    pub delay: Duration,
    /// Complete even if the caller's token fires during the delay, like a
    /// request that is already on the wire.
    pub ignore_cancel: bool,
}

impl<T> MockResponse<T> {
    pub fn ok(value: T) -> Self {
        Self {
            result: Ok(value),
            delay: Duration::ZERO,
            ignore_cancel: false,
        }
    }

    pub fn err(error: DexError) -> Self {
        Self {
            result: Err(error),
            delay: Duration::ZERO,
            ignore_cancel: false,
        }
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn ignoring_cancel(mut self) -> Self {
        self.ignore_cancel = true;
        self
    }
}

/// A request received by a [MockClient].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockRequest {
    Catalog,
    Detail(Url),
}

#[derive(Debug, Clone, Default)]
pub struct MockClient {
    catalog_responses: MockField<VecDeque<MockResponse<Vec<CatalogEntry>>>>,
    detail_responses: MockField<HashMap<Url, VecDeque<MockResponse<EntityDetail>>>>,
    requests: MockField<Vec<MockRequest>>,
}

impl MockClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// A client serving `names` as the catalog, each with a detail record.
    pub fn with_catalog(names: &[&str]) -> Self {
        let client = Self::new();
        client.push_catalog_response(MockResponse::ok(
            names.iter().map(|name| mock_entry(name)).collect(),
        ));
        for (n, name) in names.iter().enumerate() {
            client.push_detail_response(
                &mock_entry(name).url,
                MockResponse::ok(mock_detail(n as u32 + 1, name)),
            );
        }
        client
    }

    pub fn push_catalog_response(&self, response: MockResponse<Vec<CatalogEntry>>) {
        self.catalog_responses
            .lock()
            .unwrap()
            .push_back(response);
    }

    pub fn push_detail_response(&self, url: &Url, response: MockResponse<EntityDetail>) {
        self.detail_responses
            .lock()
            .unwrap()
            .entry(url.clone())
            .or_default()
            .push_back(response);
    }

    /// Replace all queued detail responses for `url`.
    pub fn set_detail_response(&self, url: &Url, response: MockResponse<EntityDetail>) {
        self.detail_responses
            .lock()
            .unwrap()
            .insert(url.clone(), VecDeque::from([response]));
    }

    pub fn requests(&self) -> Vec<MockRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn catalog_requests(&self) -> usize {
        self.requests()
            .iter()
            .filter(|request| **request == MockRequest::Catalog)
            .count()
    }

    pub fn detail_requests(&self) -> Vec<Url> {
        self.requests()
            .into_iter()
            .filter_map(|request| match request {
                MockRequest::Detail(url) => Some(url),
                MockRequest::Catalog => None,
            })
            .collect()
    }

    fn record(&self, request: MockRequest) {
        self.requests.lock().unwrap().push(request);
    }
}

fn next_response<T: Clone>(queue: Option<&mut VecDeque<MockResponse<T>>>) -> MockResponse<T> {
    let Some(queue) = queue else {
        return MockResponse::err(DexError::unknown("no mock response queued"));
    };
    if queue.len() > 1 {
        return queue.pop_front().expect("queue is not empty");
    }
    queue
        .front()
        .cloned()
        .unwrap_or_else(|| MockResponse::err(DexError::unknown("no mock response queued")))
}

impl ClientTrait for MockClient {
    async fn fetch_catalog(&self) -> Result<Vec<CatalogEntry>, DexError> {
        self.record(MockRequest::Catalog);
        let response = next_response(Some(&mut *self.catalog_responses.lock().unwrap()));
        tokio::time::sleep(response.delay).await;
        response.result
    }

    async fn fetch_detail(
        &self,
        url: &Url,
        cancel: Option<&CancellationToken>,
    ) -> Result<EntityDetail, DexError> {
        if cancel.is_some_and(CancellationToken::is_cancelled) {
            return Err(DexError::Aborted);
        }
        self.record(MockRequest::Detail(url.clone()));
        let response = next_response(self.detail_responses.lock().unwrap().get_mut(url));

        if response.ignore_cancel {
            tokio::time::sleep(response.delay).await;
            return response.result;
        }
        sleep_with_cancel(response.delay, cancel).await?;
        abortable(cancel, async { response.result }).await
    }
}

/// Catalog entry `name` pointing at a detail URL below [MOCK_BASE_URL].
pub fn mock_entry(name: &str) -> CatalogEntry {
    CatalogEntry {
        name: name.to_string(),
        url: Url::parse(&format!("{MOCK_BASE_URL}/pokemon-form/{name}/"))
            .expect("mock entry url is valid"),
    }
}

pub fn mock_detail(id: u32, name: &str) -> EntityDetail {
    EntityDetail {
        id: id.try_into().expect("mock id must be positive"),
        name: name.to_string(),
        sprites: Sprites {
            front_default: Url::parse(&format!("https://img.example/{id}.png")).ok(),
            other: None,
        },
        types: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[tokio::test]
    async fn last_response_repeats() {
        let client = MockClient::new();
        client.push_catalog_response(MockResponse::err(DexError::network()));
        client.push_catalog_response(MockResponse::ok(vec![mock_entry("eevee")]));

        assert_eq!(client.fetch_catalog().await, Err(DexError::network()));
        assert_eq!(client.fetch_catalog().await, Ok(vec![mock_entry("eevee")]));
        assert_eq!(client.fetch_catalog().await, Ok(vec![mock_entry("eevee")]));
        assert_eq!(client.catalog_requests(), 3);
    }

    #[tokio::test]
    async fn unknown_detail_url_is_an_error() {
        let client = MockClient::with_catalog(&["eevee"]);
        let result = client.fetch_detail(&mock_entry("vaporeon").url, None).await;
        assert!(matches!(result, Err(DexError::Unknown { .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn delayed_detail_observes_cancellation() {
        let client = MockClient::new();
        let url = mock_entry("eevee").url;
        client.push_detail_response(
            &url,
            MockResponse::ok(mock_detail(133, "eevee")).delayed(Duration::from_secs(1)),
        );

        let token = CancellationToken::new();
        let trigger = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            trigger.cancel();
        });

        assert_eq!(
            client.fetch_detail(&url, Some(&token)).await,
            Err(DexError::Aborted)
        );
        assert_eq!(client.detail_requests(), vec![url]);
    }
}
