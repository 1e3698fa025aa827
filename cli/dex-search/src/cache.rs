//! Single-flight cache of the complete catalog listing.

use std::sync::{Arc, Mutex};

use dex_catalog::types::CatalogEntry;
use dex_catalog::{ClientTrait, DexError};
use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use tracing::{debug, instrument};

/// The cached catalog, immutable for all consumers.
pub type Catalog = Arc<[CatalogEntry]>;

type SharedFetch = Shared<BoxFuture<'static, Result<Catalog, DexError>>>;

#[derive(Default)]
struct Slot {
    /// Bumped whenever a new fetch is started, so that a failing fetch only
    /// clears the slot it was started for.
    generation: u64,
    fetch: Option<SharedFetch>,
}

/// Caches the catalog listing across all searches.
///
/// Concurrent callers share one underlying request. The request runs on its
/// own task, so a caller that stops waiting never cancels it for the others.
/// A failed request is not cached: the slot is cleared before the error is
/// handed out, and the next call starts over.
pub struct CatalogCache<C> {
    client: Arc<C>,
    slot: Arc<Mutex<Slot>>,
}

impl<C> std::fmt::Debug for CatalogCache<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let slot = self.slot.lock().expect("catalog cache mutex poisoned");
        f.debug_struct("CatalogCache")
            .field("generation", &slot.generation)
            .field("populated", &slot.fetch.is_some())
            .finish_non_exhaustive()
    }
}

impl<C> CatalogCache<C>
where
    C: ClientTrait + 'static,
{
    pub fn new(client: Arc<C>) -> Self {
        Self {
            client,
            slot: Arc::new(Mutex::new(Slot::default())),
        }
    }

    pub fn client(&self) -> &Arc<C> {
        &self.client
    }

    /// The catalog, fetched at most once per cache generation.
    pub async fn fetch_all(&self) -> Result<Catalog, DexError> {
        let fetch = {
            let mut slot = self.slot.lock().expect("catalog cache mutex poisoned");
            match slot.fetch {
                Some(ref fetch) => fetch.clone(),
                None => {
                    slot.generation += 1;
                    let fetch = self.start_fetch(slot.generation);
                    slot.fetch = Some(fetch.clone());
                    fetch
                },
            }
        };
        fetch.await
    }

    /// Forget the cached catalog; the next [Self::fetch_all] issues a new
    /// request.
    pub fn clear(&self) {
        let mut slot = self.slot.lock().expect("catalog cache mutex poisoned");
        debug!(generation = slot.generation, "clearing catalog cache");
        slot.fetch = None;
    }

    #[instrument(skip(self))]
    fn start_fetch(&self, generation: u64) -> SharedFetch {
        debug!("fetching catalog");
        let client = Arc::clone(&self.client);
        let slot = Arc::clone(&self.slot);

        let task = tokio::spawn(async move {
            let result = client.fetch_catalog().await.map(Catalog::from);
            match result {
                Ok(ref catalog) => debug!(generation, n_entries = catalog.len(), "catalog cached"),
                Err(ref err) => {
                    debug!(generation, %err, "catalog fetch failed, clearing cache");
                    let mut slot = slot.lock().expect("catalog cache mutex poisoned");
                    if slot.generation == generation {
                        slot.fetch = None;
                    }
                },
            }
            result
        });

        async move {
            task.await.unwrap_or_else(|join_error| {
                Err(DexError::unknown(format!(
                    "catalog fetch did not complete: {join_error}"
                )))
            })
        }
        .boxed()
        .shared()
    }
}
