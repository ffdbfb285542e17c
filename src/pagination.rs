//! Page-number pagination.
//!
//! [`paginate_all`] turns a page-fetching function into a lazy [`Stream`]
//! of items. Pages are fetched strictly one after another, only when the
//! consumer has drained the previous one. Iteration stops when any of these
//! holds:
//!
//! - `max_pages` pages have been fetched
//! - a page comes back empty and `stop_on_empty` is set (the default)
//! - `meta.last_page` says the next page is past the end
//! - `meta.total` is reached, counting `pages_fetched * page_size` items
//!
//! The stream is not restartable; call [`paginate_all`] again to start over
//! from page 1.
//!
//! # Example
//!
//! ```rust,no_run
//! use futures::StreamExt;
//! use sellauth::pagination::{paginate_all, PageParams, PaginationOptions};
//! use sellauth::{SellAuthClient, SellAuthError};
//! use serde_json::Value;
//!
//! # async fn run(client: SellAuthClient) -> Result<(), SellAuthError> {
//! let invoices = client.invoices(42);
//! let stream = paginate_all(
//!     |params: PageParams| invoices.list_page(params),
//!     PaginationOptions::new().page_size(100),
//! );
//! let mut stream = std::pin::pin!(stream);
//! while let Some(invoice) = stream.next().await {
//!     let invoice: Value = invoice?;
//!     println!("{invoice}");
//! }
//! # Ok(())
//! # }
//! ```

use std::collections::VecDeque;
use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};

use futures::future::{join_all, ready, Ready};
use futures::stream::{self, Stream, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Default number of items requested per page.
pub const DEFAULT_PAGE_SIZE: u32 = 50;

/// Largest page size the API accepts.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Query parameters for one page request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct PageParams {
    /// 1-based page number.
    pub page: u32,
    /// Items per page.
    #[serde(rename = "perPage")]
    pub per_page: u32,
}

/// Pagination metadata returned alongside a page.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PageMeta {
    /// The page that was returned.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    /// Items per page.
    #[serde(default, alias = "perPage", skip_serializing_if = "Option::is_none")]
    pub per_page: Option<u32>,
    /// Total number of items across all pages.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
    /// The last page number.
    #[serde(default, alias = "lastPage", skip_serializing_if = "Option::is_none")]
    pub last_page: Option<u32>,
    /// Any other metadata keys.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A page of items with optional metadata.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PaginatedResponse<T> {
    /// The items on this page.
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
    /// Pagination metadata, when the endpoint provides it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<PageMeta>,
}

impl<T> PaginatedResponse<T> {
    /// Wraps items without metadata.
    #[must_use]
    pub const fn new(data: Vec<T>) -> Self {
        Self { data, meta: None }
    }

    /// Attaches metadata.
    #[must_use]
    pub fn with_meta(mut self, meta: PageMeta) -> Self {
        self.meta = Some(meta);
        self
    }
}

/// Observer invoked with each page's number and raw items.
pub type PageObserver<T> = Box<dyn FnMut(u32, &[T]) + Send>;

/// Options for [`paginate_all`].
///
/// # Defaults
///
/// - `page_size`: 50 (clamped to `1..=100`)
/// - `max_pages`: unbounded
/// - `concurrency`: 1 (transforms run one at a time)
/// - `stop_on_empty`: true
pub struct PaginationOptions<T> {
    page_size: u32,
    max_pages: Option<u32>,
    concurrency: usize,
    stop_on_empty: bool,
    on_page: Option<PageObserver<T>>,
}

impl<T> PaginationOptions<T> {
    /// Creates options with default values.
    #[must_use]
    pub fn new() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            max_pages: None,
            concurrency: 1,
            stop_on_empty: true,
            on_page: None,
        }
    }

    /// Sets the page size, clamped to `1..=100`.
    #[must_use]
    pub fn page_size(mut self, size: u32) -> Self {
        self.page_size = size.clamp(1, MAX_PAGE_SIZE);
        self
    }

    /// Stops after this many pages.
    #[must_use]
    pub const fn max_pages(mut self, pages: u32) -> Self {
        self.max_pages = Some(pages);
        self
    }

    /// Sets how many transforms of one page may run at once (minimum 1).
    #[must_use]
    pub fn concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Whether an empty page ends iteration.
    #[must_use]
    pub const fn stop_on_empty(mut self, stop: bool) -> Self {
        self.stop_on_empty = stop;
        self
    }

    /// Observes every fetched page, including a final empty one, before any
    /// transform runs.
    #[must_use]
    pub fn on_page(mut self, observer: impl FnMut(u32, &[T]) + Send + 'static) -> Self {
        self.on_page = Some(Box::new(observer));
        self
    }

    /// Returns the effective page size.
    #[must_use]
    pub const fn effective_page_size(&self) -> u32 {
        self.page_size
    }
}

impl<T> Default for PaginationOptions<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for PaginationOptions<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PaginationOptions")
            .field("page_size", &self.page_size)
            .field("max_pages", &self.max_pages)
            .field("concurrency", &self.concurrency)
            .field("stop_on_empty", &self.stop_on_empty)
            .field("on_page", &self.on_page.is_some())
            .finish()
    }
}

struct State<T, R, E, F, G> {
    fetch: F,
    transform: G,
    page_size: u32,
    max_pages: Option<u32>,
    concurrency: usize,
    stop_on_empty: bool,
    on_page: Option<PageObserver<T>>,
    page: u32,
    pages_fetched: u32,
    pending: VecDeque<(usize, T)>,
    ready: VecDeque<Result<R, E>>,
    last_page_seen: bool,
    done: bool,
}

impl<T, R, E, F, G> State<T, R, E, F, G> {
    fn out_of_pages(&self) -> bool {
        self.last_page_seen || self.max_pages.is_some_and(|max| self.pages_fetched >= max)
    }

    /// Applies metadata after a page has been counted.
    fn inspect_meta(&mut self, meta: Option<&PageMeta>) {
        let Some(meta) = meta else { return };
        if meta.last_page.is_some_and(|last| self.page > last) {
            self.last_page_seen = true;
        }
        let items_seen = u64::from(self.pages_fetched) * u64::from(self.page_size);
        if meta.total.is_some_and(|total| items_seen >= total) {
            self.last_page_seen = true;
        }
    }
}

/// Streams every item, untransformed.
///
/// See [`paginate_all_with`] for the termination rules.
pub fn paginate_all<T, E, F, Fut>(
    fetch: F,
    options: PaginationOptions<T>,
) -> impl Stream<Item = Result<T, E>>
where
    F: FnMut(PageParams) -> Fut,
    Fut: Future<Output = Result<PaginatedResponse<T>, E>>,
{
    paginate_all_with(fetch, options, |item: T, _index: usize| -> Ready<Result<T, E>> {
        ready(Ok(item))
    })
}

/// Streams every item through an async `transform`.
///
/// `transform` receives the item and its global index,
/// `(page - 1) * page_size + position`. Items are yielded in page order and
/// in their original order within a page, whatever the concurrency. A fetch
/// or transform error is yielded once and ends the stream.
pub fn paginate_all_with<T, R, E, F, Fut, G, TFut>(
    fetch: F,
    options: PaginationOptions<T>,
    transform: G,
) -> impl Stream<Item = Result<R, E>>
where
    F: FnMut(PageParams) -> Fut,
    Fut: Future<Output = Result<PaginatedResponse<T>, E>>,
    G: Fn(T, usize) -> TFut,
    TFut: Future<Output = Result<R, E>>,
{
    let state = State {
        fetch,
        transform,
        page_size: options.page_size.clamp(1, MAX_PAGE_SIZE),
        max_pages: options.max_pages,
        concurrency: options.concurrency.max(1),
        stop_on_empty: options.stop_on_empty,
        on_page: options.on_page,
        page: 1,
        pages_fetched: 0,
        pending: VecDeque::new(),
        ready: VecDeque::new(),
        last_page_seen: false,
        done: false,
    };

    stream::unfold(state, |mut st| async move {
        loop {
            if let Some(item) = st.ready.pop_front() {
                if item.is_err() {
                    st.done = true;
                    st.ready.clear();
                    st.pending.clear();
                }
                return Some((item, st));
            }
            if st.done {
                return None;
            }

            if !st.pending.is_empty() {
                let take = st.concurrency.min(st.pending.len());
                let batch: Vec<(usize, T)> = st.pending.drain(..take).collect();
                let transform = &st.transform;
                let results =
                    join_all(batch.into_iter().map(|(index, item)| transform(item, index))).await;
                st.ready.extend(results);
                continue;
            }

            if st.out_of_pages() {
                return None;
            }

            let params = PageParams {
                page: st.page,
                per_page: st.page_size,
            };
            let response = match (st.fetch)(params).await {
                Ok(response) => response,
                Err(error) => {
                    st.done = true;
                    return Some((Err(error), st));
                }
            };

            if let Some(observer) = st.on_page.as_mut() {
                observer(st.page, &response.data);
            }
            if response.data.is_empty() && st.stop_on_empty {
                return None;
            }

            let base = (st.page as usize - 1) * st.page_size as usize;
            st.pending.extend(
                response
                    .data
                    .into_iter()
                    .enumerate()
                    .map(|(offset, item)| (base + offset, item)),
            );
            st.pages_fetched += 1;
            st.page += 1;
            st.inspect_meta(response.meta.as_ref());
        }
    })
}

/// Drains every page into one ordered list.
///
/// # Errors
///
/// Returns the first fetch error.
pub async fn fetch_all_pages<T, E, F, Fut>(
    fetch: F,
    options: PaginationOptions<T>,
) -> Result<Vec<T>, E>
where
    F: FnMut(PageParams) -> Fut,
    Fut: Future<Output = Result<PaginatedResponse<T>, E>>,
{
    let stream = paginate_all(fetch, options);
    let mut stream = std::pin::pin!(stream);
    let mut items = Vec::new();
    while let Some(item) = stream.next().await {
        items.push(item?);
    }
    Ok(items)
}

/// Drains every page, keeping each page's raw items as a separate list.
///
/// A final empty page is included. A configured observer still runs.
///
/// # Errors
///
/// Returns the first fetch error.
pub async fn fetch_pages<T, E, F, Fut>(
    fetch: F,
    mut options: PaginationOptions<T>,
) -> Result<Vec<Vec<T>>, E>
where
    T: Clone + Send + 'static,
    F: FnMut(PageParams) -> Fut,
    Fut: Future<Output = Result<PaginatedResponse<T>, E>>,
{
    let pages: Arc<Mutex<Vec<Vec<T>>>> = Arc::new(Mutex::new(Vec::new()));
    let collector = Arc::clone(&pages);
    let mut user_observer = options.on_page.take();
    options.on_page = Some(Box::new(move |page: u32, items: &[T]| {
        if let Some(observer) = user_observer.as_mut() {
            observer(page, items);
        }
        collector
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(items.to_vec());
    }));

    let stream = paginate_all(fetch, options);
    let mut stream = std::pin::pin!(stream);
    while let Some(item) = stream.next().await {
        item?;
    }

    let mut pages = pages.lock().unwrap_or_else(PoisonError::into_inner);
    Ok(std::mem::take(&mut *pages))
}
