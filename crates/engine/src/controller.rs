//! Remote list controller.
//!
//! [`ListController`] owns the [`Query`] of one list screen, issues a fetch for
//! every change and exposes the latest settled [`Page`] together with a
//! [`LoadStatus`].
//!
//! Every issued request is stamped with a generation number. A response is
//! applied only when its generation is still the latest one, so a slow answer
//! for an old query can never overwrite the answer for a newer one,
//! whatever order the responses arrive in.
//!
//! A failed fetch flips the status to [`LoadStatus::Failed`] but keeps the last
//! successful page available through [`ListController::result`]. Nothing is
//! retried automatically.
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::{
    sync::watch,
    task::{AbortHandle, JoinHandle},
};

use crate::{
    error::{ListError, RemoteError},
    page::Page,
    query::{FilterValue, Query},
    status::LoadStatus,
};

/// Backend answering list queries for rows of type `T`.
#[async_trait]
pub trait ListSource<T>: Send + Sync {
    async fn fetch(&self, query: &Query) -> Result<Page<T>, RemoteError>;
}

#[derive(Debug)]
struct State<T> {
    query: Query,
    generation: u64,
    status: LoadStatus<T>,
    latest: Option<Arc<Page<T>>>,
    in_flight: Vec<AbortHandle>,
    closed: bool,
}

struct Shared<T> {
    state: Mutex<State<T>>,
    changes: watch::Sender<u64>,
}

impl<T> Shared<T> {
    fn notify(&self) {
        self.changes.send_modify(|revision| *revision = revision.wrapping_add(1));
    }

    fn settle(&self, generation: u64, result: Result<Page<T>, RemoteError>) {
        {
            let mut state = self.state.lock();
            if state.closed {
                return;
            }
            if generation != state.generation {
                tracing::debug!(
                    generation,
                    current = state.generation,
                    "discarding stale list response"
                );
                return;
            }

            match result {
                Ok(page) => {
                    let page = Arc::new(page);
                    state.latest = Some(Arc::clone(&page));
                    state.status = LoadStatus::Succeeded(page);
                }
                Err(err) => {
                    tracing::warn!(generation, "list fetch failed: {err}");
                    state.status = LoadStatus::Failed(err.user_message());
                }
            }
        }
        self.notify();
    }
}

/// Fetch/paginate/filter controller shared by every list screen.
///
/// Cloning is cheap and every clone drives the same state.
pub struct ListController<T> {
    source: Arc<dyn ListSource<T>>,
    default_page_size: u32,
    shared: Arc<Shared<T>>,
}

impl<T> Clone for ListController<T> {
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
            default_page_size: self.default_page_size,
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T: Send + Sync + 'static> ListController<T> {
    /// Creates an idle controller. Nothing is fetched until the first intent.
    pub fn new(source: Arc<dyn ListSource<T>>, page_size: u32) -> Self {
        let query = Query::new(page_size);
        let (changes, _) = watch::channel(0);
        Self {
            source,
            default_page_size: query.page_size(),
            shared: Arc::new(Shared {
                state: Mutex::new(State {
                    query,
                    generation: 0,
                    status: LoadStatus::Idle,
                    latest: None,
                    in_flight: Vec::new(),
                    closed: false,
                }),
                changes,
            }),
        }
    }

    /// Sets (or with `None`/blank text removes) a filter, resets to page 1
    /// and refetches.
    pub fn set_filter(
        &self,
        key: impl Into<String>,
        value: Option<FilterValue>,
    ) -> Result<JoinHandle<()>, ListError> {
        let key = key.into();
        self.issue(move |query| query.set_filter(key, value))
    }

    /// Moves to page `page_number` keeping the filters.
    ///
    /// Bounded by the total pages of the last settled result; before the
    /// first result any page from 1 is accepted.
    pub fn set_page(&self, page_number: u32) -> Result<JoinHandle<()>, ListError> {
        let total_pages = self
            .shared
            .state
            .lock()
            .latest
            .as_ref()
            .map(|page| page.total_pages.max(1));

        let out_of_range = page_number == 0 || total_pages.is_some_and(|max| page_number > max);
        if out_of_range {
            return Err(ListError::PageOutOfRange {
                requested: page_number,
                total_pages: total_pages.unwrap_or(0),
            });
        }
        self.issue(move |query| query.set_page(page_number))
    }

    /// Changes the page size, resets to page 1 and refetches.
    pub fn set_page_size(&self, page_size: u32) -> Result<JoinHandle<()>, ListError> {
        if page_size == 0 {
            return Err(ListError::InvalidPageSize);
        }
        self.issue(move |query| query.set_page_size(page_size))
    }

    /// Reissues the current query unchanged.
    pub fn refresh(&self) -> Result<JoinHandle<()>, ListError> {
        self.issue(|_| {})
    }

    /// Drops every filter, goes back to page 1 with the default page size.
    pub fn reset(&self) -> Result<JoinHandle<()>, ListError> {
        let default_page_size = self.default_page_size;
        self.issue(move |query| *query = Query::new(default_page_size))
    }

    /// Next page when the last result says there is one.
    pub fn next_page(&self) -> Option<Result<JoinHandle<()>, ListError>> {
        let current = self.result()?;
        current
            .has_next
            .then(|| self.set_page(self.query().page_number() + 1))
    }

    pub fn previous_page(&self) -> Option<Result<JoinHandle<()>, ListError>> {
        let page_number = self.query().page_number();
        (page_number > 1).then(|| self.set_page(page_number - 1))
    }

    /// Stops applying results and aborts in-flight fetches.
    pub fn close(&self) {
        {
            let mut state = self.shared.state.lock();
            state.closed = true;
            for handle in state.in_flight.drain(..) {
                handle.abort();
            }
        }
        self.shared.notify();
    }

    pub fn is_closed(&self) -> bool {
        self.shared.state.lock().closed
    }

    pub fn query(&self) -> Query {
        self.shared.state.lock().query.clone()
    }

    pub fn status(&self) -> LoadStatus<T> {
        self.shared.state.lock().status.clone()
    }

    /// Last successfully fetched page, kept while reloading and after errors.
    pub fn result(&self) -> Option<Arc<Page<T>>> {
        self.shared.state.lock().latest.clone()
    }

    pub fn error(&self) -> Option<String> {
        self.shared.state.lock().status.error().map(str::to_string)
    }

    pub fn generation(&self) -> u64 {
        self.shared.state.lock().generation
    }

    /// Watch channel bumped on every state change.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.shared.changes.subscribe()
    }

    fn issue(&self, update: impl FnOnce(&mut Query)) -> Result<JoinHandle<()>, ListError> {
        let (generation, query) = {
            let mut state = self.shared.state.lock();
            if state.closed {
                return Err(ListError::Closed);
            }
            update(&mut state.query);
            state.generation += 1;
            state.status = LoadStatus::Loading;
            (state.generation, state.query.clone())
        };
        self.shared.notify();

        tracing::debug!(
            generation,
            page = query.page_number(),
            page_size = query.page_size(),
            filters = query.filters().len(),
            "issuing list fetch"
        );

        let source = Arc::clone(&self.source);
        let shared = Arc::clone(&self.shared);
        let handle = tokio::spawn(async move {
            let result = source.fetch(&query).await;
            shared.settle(generation, result);
        });

        let mut state = self.shared.state.lock();
        state.in_flight.retain(|handle| !handle.is_finished());
        state.in_flight.push(handle.abort_handle());

        Ok(handle)
    }
}
