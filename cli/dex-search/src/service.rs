//! Name search composed of the cached catalog, prefix filtering and
//! concurrent detail fetches.

use std::sync::Arc;

use dex_catalog::retry::abortable;
use dex_catalog::types::EntityDetail;
use dex_catalog::{CancellationToken, ClientTrait, DexError};
use futures::future::join_all;
use tracing::{debug, instrument};

use crate::cache::CatalogCache;
use crate::filter::filter_by_prefix;

pub const DEFAULT_MAX_RESULTS: usize = 5;

#[derive(Debug)]
pub struct SearchService<C> {
    cache: Arc<CatalogCache<C>>,
    max_results: usize,
}

impl<C> SearchService<C>
where
    C: ClientTrait + 'static,
{
    pub fn new(cache: Arc<CatalogCache<C>>, max_results: usize) -> Self {
        Self { cache, max_results }
    }

    /// Details of the catalog entries whose name starts with `query`.
    ///
    /// Entries whose details cannot be fetched are left out rather than
    /// failing the search. Cancellation of any part fails the whole search
    /// with [DexError::Aborted], as does a fired `cancel` token while the
    /// catalog is being fetched. The shared catalog fetch itself is left
    /// running for other callers.
    #[instrument(skip(self, cancel))]
    pub async fn search_by_name(
        &self,
        query: &str,
        cancel: Option<&CancellationToken>,
    ) -> Result<Vec<EntityDetail>, DexError> {
        let catalog = abortable(cancel, self.cache.fetch_all()).await?;

        let matched = filter_by_prefix(&catalog, query, self.max_results);
        if matched.is_empty() {
            debug!("no catalog entries match");
            return Ok(Vec::new());
        }
        debug!(n_matches = matched.len(), "fetching details");

        let client = self.cache.client();
        let settled = join_all(
            matched
                .iter()
                .map(|entry| client.fetch_detail(&entry.url, cancel)),
        )
        .await;

        let mut results = Vec::with_capacity(settled.len());
        for (entry, result) in matched.iter().zip(settled) {
            match result {
                Ok(detail) => results.push(detail),
                Err(DexError::Aborted) => return Err(DexError::Aborted),
                Err(err) => {
                    debug!(name = %entry.name, %err, "skipping entry without details");
                },
            }
        }

        Ok(results)
    }
}
