//! Integration tests for the pagination engine.

use futures::future::{ready, Ready};
use futures::StreamExt;
use sellauth::pagination::{
    fetch_all_pages, fetch_pages, paginate_all, paginate_all_with, PageMeta, PageParams,
    PaginatedResponse, PaginationOptions,
};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_test::assert_ok;

type Page = PaginatedResponse<u32>;
type Fetched = Ready<Result<Page, String>>;

/// Serves `pages[page - 1]` (or an empty page past the end) and counts calls.
fn serve(
    pages: Vec<Vec<u32>>,
    meta: Option<PageMeta>,
) -> (Arc<AtomicU32>, impl FnMut(PageParams) -> Fetched) {
    let calls = Arc::new(AtomicU32::new(0));
    let counter = Arc::clone(&calls);
    let fetch = move |params: PageParams| {
        counter.fetch_add(1, Ordering::SeqCst);
        let data = pages
            .get(params.page as usize - 1)
            .cloned()
            .unwrap_or_default();
        let page = PaginatedResponse {
            data,
            meta: meta.clone(),
        };
        ready(Ok(page))
    };
    (calls, fetch)
}

/// Always returns a full page of `size` items, numbered globally.
fn endless(size: u32, meta: Option<PageMeta>) -> (Arc<AtomicU32>, impl FnMut(PageParams) -> Fetched) {
    let calls = Arc::new(AtomicU32::new(0));
    let counter = Arc::clone(&calls);
    let fetch = move |params: PageParams| {
        counter.fetch_add(1, Ordering::SeqCst);
        assert_eq!(params.per_page, size);
        let start = (params.page - 1) * size;
        ready(Ok(PaginatedResponse {
            data: (start..start + size).collect(),
            meta: meta.clone(),
        }))
    };
    (calls, fetch)
}

async fn collect<S: futures::Stream<Item = Result<u32, String>>>(stream: S) -> Vec<Result<u32, String>> {
    stream.collect().await
}

// ============================================================================
// Termination
// ============================================================================

#[tokio::test]
async fn test_empty_first_page_yields_nothing_after_one_fetch() {
    let (calls, fetch) = serve(vec![vec![]], None);
    let items = collect(paginate_all(fetch, PaginationOptions::new())).await;

    assert!(items.is_empty());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_total_metadata_stops_after_three_pages() {
    let meta = PageMeta {
        total: Some(25),
        ..PageMeta::default()
    };
    let (calls, fetch) = endless(10, Some(meta));
    let items = collect(paginate_all(fetch, PaginationOptions::new().page_size(10))).await;

    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert_eq!(items.len(), 30);
}

#[tokio::test]
async fn test_last_page_metadata_stops_iteration() {
    let meta = PageMeta {
        last_page: Some(2),
        ..PageMeta::default()
    };
    let (calls, fetch) = endless(5, Some(meta));
    let items = collect(paginate_all(fetch, PaginationOptions::new().page_size(5))).await;

    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(items.len(), 10);
}

#[tokio::test]
async fn test_max_pages_bounds_fetches() {
    let (calls, fetch) = endless(3, None);
    let items = collect(paginate_all(
        fetch,
        PaginationOptions::new().page_size(3).max_pages(4),
    ))
    .await;

    assert_eq!(calls.load(Ordering::SeqCst), 4);
    let values: Vec<u32> = items.into_iter().map(Result::unwrap).collect();
    assert_eq!(values, (0..12).collect::<Vec<_>>());
}

#[tokio::test]
async fn test_empty_pages_are_skipped_when_not_stopping() {
    let (calls, fetch) = serve(vec![vec![1], vec![], vec![2]], None);
    let items = collect(paginate_all(
        fetch,
        PaginationOptions::new().stop_on_empty(false).max_pages(3),
    ))
    .await;

    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert_eq!(items, vec![Ok(1), Ok(2)]);
}

#[tokio::test]
async fn test_pages_are_fetched_lazily() {
    let (calls, fetch) = endless(2, None);
    let stream = paginate_all(fetch, PaginationOptions::new().page_size(2));
    let mut stream = std::pin::pin!(stream);

    assert_eq!(stream.next().await, Some(Ok(0)));
    assert_eq!(stream.next().await, Some(Ok(1)));
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    assert_eq!(stream.next().await, Some(Ok(2)));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_fetch_error_is_yielded_once_and_ends_the_stream() {
    let calls = Arc::new(AtomicU32::new(0));
    let counter = Arc::clone(&calls);
    let fetch = move |params: PageParams| {
        counter.fetch_add(1, Ordering::SeqCst);
        ready(if params.page == 1 {
            Ok(PaginatedResponse::new(vec![7, 8]))
        } else {
            Err("page 2 failed".to_string())
        })
    };

    let items = collect(paginate_all(fetch, PaginationOptions::new())).await;

    assert_eq!(items, vec![Ok(7), Ok(8), Err("page 2 failed".to_string())]);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

// ============================================================================
// Transforms and ordering
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_concurrent_transforms_keep_original_order() {
    let (_, fetch) = serve(vec![vec![10, 11, 12, 13, 14, 15]], None);
    let in_flight = Arc::new(AtomicU32::new(0));
    let peak = Arc::new(AtomicU32::new(0));

    let transform = {
        let in_flight = Arc::clone(&in_flight);
        let peak = Arc::clone(&peak);
        move |item: u32, index: usize| {
            let in_flight = Arc::clone(&in_flight);
            let peak = Arc::clone(&peak);
            async move {
                let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                // Later items finish first.
                let delay = 10 * (6 - index as u64);
                tokio::time::sleep(Duration::from_millis(delay)).await;
                in_flight.fetch_sub(1, Ordering::SeqCst);
                Ok::<_, String>((index, item * 2))
            }
        }
    };

    let start = tokio::time::Instant::now();
    let stream = paginate_all_with(fetch, PaginationOptions::new().concurrency(3), transform);
    let items: Vec<(usize, u32)> = stream.map(Result::unwrap).collect().await;
    let elapsed = start.elapsed();

    assert_eq!(
        items,
        vec![(0, 20), (1, 22), (2, 24), (3, 26), (4, 28), (5, 30)]
    );
    assert_eq!(peak.load(Ordering::SeqCst), 3);
    // Two batches: max(60, 50, 40) + max(30, 20, 10).
    assert!(elapsed >= Duration::from_millis(90), "{elapsed:?}");
    assert!(elapsed < Duration::from_millis(150), "{elapsed:?}");
}

#[tokio::test]
async fn test_sequential_transforms_run_one_at_a_time() {
    let (_, fetch) = serve(vec![vec![1, 2, 3]], None);
    let in_flight = Arc::new(AtomicU32::new(0));
    let peak = Arc::new(AtomicU32::new(0));

    let transform = {
        let in_flight = Arc::clone(&in_flight);
        let peak = Arc::clone(&peak);
        move |item: u32, _index: usize| {
            let in_flight = Arc::clone(&in_flight);
            let peak = Arc::clone(&peak);
            async move {
                let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::task::yield_now().await;
                in_flight.fetch_sub(1, Ordering::SeqCst);
                Ok::<_, String>(item)
            }
        }
    };

    let items: Vec<_> = paginate_all_with(fetch, PaginationOptions::new(), transform)
        .collect()
        .await;

    assert_eq!(items, vec![Ok(1), Ok(2), Ok(3)]);
    assert_eq!(peak.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_transform_receives_global_index() {
    let (_, fetch) = serve(vec![vec![1, 2], vec![3, 4], vec![]], None);
    let stream = paginate_all_with(
        fetch,
        PaginationOptions::new().page_size(2),
        |item: u32, index: usize| ready(Ok::<_, String>((index, item))),
    );
    let items: Vec<(usize, u32)> = stream.map(Result::unwrap).collect().await;

    assert_eq!(items, vec![(0, 1), (1, 2), (2, 3), (3, 4)]);
}

#[tokio::test]
async fn test_transform_error_ends_the_stream() {
    let (calls, fetch) = endless(4, None);
    let stream = paginate_all_with(
        fetch,
        PaginationOptions::new().page_size(4),
        |item: u32, _index: usize| {
            ready(if item == 2 {
                Err(format!("bad item {item}"))
            } else {
                Ok(item)
            })
        },
    );
    let items: Vec<_> = stream.collect().await;

    assert_eq!(items, vec![Ok(0), Ok(1), Err("bad item 2".to_string())]);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

// ============================================================================
// Observers and drain helpers
// ============================================================================

#[tokio::test]
async fn test_observer_sees_final_empty_page() {
    let (_, fetch) = serve(vec![vec![1, 2], vec![3]], None);
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);

    let options = PaginationOptions::new().on_page(move |page: u32, items: &[u32]| {
        sink.lock().unwrap().push((page, items.len()));
    });
    let items = collect(paginate_all(fetch, options)).await;

    assert_eq!(items.len(), 3);
    assert_eq!(*seen.lock().unwrap(), vec![(1, 2), (2, 1), (3, 0)]);
}

#[tokio::test]
async fn test_fetch_all_pages_flattens_in_order() {
    let (calls, fetch) = serve(vec![vec![1, 2], vec![3, 4], vec![5]], None);
    let items = assert_ok!(fetch_all_pages(fetch, PaginationOptions::new()).await);

    assert_eq!(items, vec![1, 2, 3, 4, 5]);
    assert_eq!(calls.load(Ordering::SeqCst), 4);
}

#[tokio::test]
async fn test_fetch_pages_keeps_page_boundaries() {
    let (_, fetch) = serve(vec![vec![1, 2], vec![3]], None);
    let observed = Arc::new(AtomicU32::new(0));
    let counter = Arc::clone(&observed);

    let options = PaginationOptions::new().on_page(move |_page: u32, _items: &[u32]| {
        counter.fetch_add(1, Ordering::SeqCst);
    });
    let pages = fetch_pages(fetch, options).await.unwrap();

    assert_eq!(pages, vec![vec![1, 2], vec![3], vec![]]);
    assert_eq!(observed.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_fetch_all_pages_returns_first_error() {
    let fetch = |params: PageParams| {
        ready(if params.page < 3 {
            Ok(PaginatedResponse::new(vec![params.page]))
        } else {
            Err(format!("page {} unavailable", params.page))
        })
    };
    let result = fetch_all_pages(fetch, PaginationOptions::new()).await;
    assert_eq!(result, Err("page 3 unavailable".to_string()));
}
