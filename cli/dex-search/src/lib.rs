//! Prefix search over the form catalog.
//!
//! The pieces compose bottom-up: a [CatalogCache] holds the listing fetched
//! through any [dex_catalog::ClientTrait], a [SearchService] filters it and
//! fetches details for the matches, and a [SearchOrchestrator] turns a
//! stream of query edits into a latest-wins [SearchState].
//!
//! ```ignore
//! let settings = SearchSettings::load()?;
//! let search = dex_search::spawn_search(&settings)?;
//! search.set_query("pika");
//! let state = search.subscribe().wait_for(|s| !s.is_loading).await?;
//! ```

use std::sync::Arc;

use dex_catalog::{ClientBuildError, DexClient};

pub mod cache;
pub mod display;
pub mod filter;
pub mod logging;
pub mod orchestrator;
pub mod service;
pub mod settings;

pub use cache::{Catalog, CatalogCache};
pub use display::{DEFAULT_FALLBACK_IMAGE, EntityDisplay};
pub use filter::{Named, filter_by_prefix};
pub use logging::{Verbosity, init_logger};
pub use orchestrator::{DEFAULT_DEBOUNCE, SearchOrchestrator, SearchPhase, SearchState};
pub use service::{DEFAULT_MAX_RESULTS, SearchService};
pub use settings::{SearchSettings, SettingsError};

/// Build the HTTP client and search pipeline described by `settings` and
/// start an orchestrator for it.
///
/// Must be called from within a tokio runtime.
pub fn spawn_search(settings: &SearchSettings) -> Result<SearchOrchestrator, ClientBuildError> {
    let client = DexClient::new(settings.client_config())?;
    let cache = Arc::new(CatalogCache::new(Arc::new(client)));
    let service = Arc::new(SearchService::new(cache, settings.max_results));
    Ok(SearchOrchestrator::spawn(service, settings.debounce()))
}
