//! Turns a stream of query edits into a consistent, latest-wins search state.
//!
//! A [SearchOrchestrator] is a handle to a task that owns the [SearchState].
//! Query edits are debounced; every search that is started gets a new
//! generation number and its own cancellation token. Only a completion
//! carrying the current generation may change the state, so the order in
//! which requests complete does not matter.

use std::sync::Arc;
use std::time::Duration;

use dex_catalog::types::EntityDetail;
use dex_catalog::{CancellationToken, ClientTrait, DexError, ErrorKind, is_retryable};
use tokio::sync::{mpsc, watch};
use tokio::time::{Instant, sleep_until};
use tracing::{Instrument, debug, debug_span, trace};

use crate::service::SearchService;

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

/// Everything a rendering layer needs to show the search.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchState {
    /// The query as typed, updated on every edit.
    pub query: String,
    /// The trimmed query the current results belong to.
    pub debounced_query: String,
    pub is_loading: bool,
    pub results: Vec<EntityDetail>,
    /// User facing message of the last failure.
    pub error: Option<String>,
    pub error_kind: Option<ErrorKind>,
    /// Whether offering [SearchOrchestrator::retry] makes sense.
    pub is_retryable: bool,
    /// Incremented for every search started or cleared.
    pub request_generation: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchPhase {
    Idle,
    Loading,
    Success,
    Failed,
}

impl SearchState {
    pub fn phase(&self) -> SearchPhase {
        if self.is_loading {
            SearchPhase::Loading
        } else if self.error.is_some() {
            SearchPhase::Failed
        } else if self.debounced_query.is_empty() {
            SearchPhase::Idle
        } else {
            SearchPhase::Success
        }
    }
}

#[derive(Debug)]
enum Command {
    SetQuery(String),
    Retry,
    Shutdown,
}

#[derive(Debug)]
struct Completion {
    generation: u64,
    result: Result<Vec<EntityDetail>, DexError>,
}

/// Handle to a running search.
///
/// Handles are cheap to clone. The search stops, cancelling any request in
/// flight, on [Self::shutdown] or once every handle is dropped.
#[derive(Debug, Clone)]
pub struct SearchOrchestrator {
    commands: mpsc::UnboundedSender<Command>,
    state: watch::Receiver<SearchState>,
}

impl SearchOrchestrator {
    /// Start the search task on the current tokio runtime.
    pub fn spawn<C>(service: Arc<SearchService<C>>, debounce: Duration) -> Self
    where
        C: ClientTrait + 'static,
    {
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(SearchState::default());

        let driver = Driver {
            service,
            debounce,
            state: state_tx,
            completions: completions_tx,
            root_token: CancellationToken::new(),
            in_flight: None,
        };
        tokio::spawn(driver.run(commands_rx, completions_rx));

        Self {
            commands: commands_tx,
            state: state_rx,
        }
    }

    /// Record an edit of the query; a search starts once edits pause for
    /// the debounce interval.
    pub fn set_query(&self, text: impl Into<String>) {
        self.send(Command::SetQuery(text.into()));
    }

    /// Run the current query again, if the last failure is retryable.
    pub fn retry(&self) {
        self.send(Command::Retry);
    }

    pub fn shutdown(&self) {
        self.send(Command::Shutdown);
    }

    /// A snapshot of the current state.
    pub fn state(&self) -> SearchState {
        self.state.borrow().clone()
    }

    /// Receive every state change.
    pub fn subscribe(&self) -> watch::Receiver<SearchState> {
        self.state.clone()
    }

    fn send(&self, command: Command) {
        if let Err(err) = self.commands.send(command) {
            trace!(command = ?err.0, "search orchestrator has stopped");
        }
    }
}

/// The task owning the state.
struct Driver<C> {
    service: Arc<SearchService<C>>,
    debounce: Duration,
    state: watch::Sender<SearchState>,
    completions: mpsc::UnboundedSender<Completion>,
    /// Parent of every generation's token.
    root_token: CancellationToken,
    in_flight: Option<CancellationToken>,
}

impl<C> Driver<C>
where
    C: ClientTrait + 'static,
{
    async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<Command>,
        mut completions: mpsc::UnboundedReceiver<Completion>,
    ) {
        let mut deadline: Option<Instant> = None;

        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(Command::SetQuery(text)) => {
                        self.state.send_modify(|state| state.query = text);
                        deadline = Some(Instant::now() + self.debounce);
                    },
                    Some(Command::Retry) => self.retry(),
                    Some(Command::Shutdown) | None => break,
                },
                _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    deadline = None;
                    self.debounce_elapsed();
                },
                Some(completion) = completions.recv() => self.complete(completion),
            }
        }

        self.root_token.cancel();
        debug!("search orchestrator stopped");
    }

    fn debounce_elapsed(&mut self) {
        let (query, unchanged) = {
            let state = self.state.borrow();
            let query = state.query.trim().to_string();
            let unchanged = query == state.debounced_query;
            (query, unchanged)
        };
        if unchanged {
            trace!(%query, "debounced query unchanged");
            return;
        }
        self.start_generation(query);
    }

    fn retry(&mut self) {
        let (retryable, query) = {
            let state = self.state.borrow();
            (state.is_retryable, state.debounced_query.clone())
        };
        if !retryable {
            debug!("ignoring retry, last search did not fail retryably");
            return;
        }
        debug!(%query, "retrying search");
        self.start_generation(query);
    }

    /// Supersede whatever is running and search for `query`.
    fn start_generation(&mut self, query: String) {
        if let Some(token) = self.in_flight.take() {
            token.cancel();
        }

        let mut generation = 0;
        self.state.send_modify(|state| {
            state.request_generation += 1;
            generation = state.request_generation;
            state.debounced_query = query.clone();
            state.error = None;
            state.error_kind = None;
            state.is_retryable = false;
            if query.is_empty() {
                state.is_loading = false;
                state.results.clear();
            } else {
                state.is_loading = true;
            }
        });

        if query.is_empty() {
            debug!(generation, "query cleared");
            return;
        }

        let token = self.root_token.child_token();
        self.in_flight = Some(token.clone());
        let service = Arc::clone(&self.service);
        let completions = self.completions.clone();

        debug!(generation, %query, "starting search");
        tokio::spawn(
            async move {
                let result = service.search_by_name(&query, Some(&token)).await;
                // The driver may be gone already, then nobody needs the result.
                let _ = completions.send(Completion { generation, result });
            }
            .instrument(debug_span!("search", generation)),
        );
    }

    fn complete(&mut self, Completion { generation, result }: Completion) {
        let current = self.state.borrow().request_generation;
        if generation != current {
            debug!(generation, current, "discarding result of superseded search");
            return;
        }
        self.in_flight = None;

        match result {
            Ok(results) => {
                debug!(generation, n_results = results.len(), "search succeeded");
                self.state.send_modify(|state| {
                    state.is_loading = false;
                    state.results = results;
                    state.error = None;
                    state.error_kind = None;
                    state.is_retryable = false;
                });
            },
            Err(DexError::Aborted) => {
                trace!(generation, "search aborted");
            },
            Err(err) => {
                debug!(generation, %err, "search failed");
                self.state.send_modify(|state| {
                    state.is_loading = false;
                    state.results.clear();
                    state.error = Some(err.to_string());
                    state.error_kind = Some(err.kind());
                    state.is_retryable = is_retryable(&err);
                });
            },
        }
    }
}
