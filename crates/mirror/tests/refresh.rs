mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{MemoryRepository, PagedSource, memory_store, refresher};
use interface::FetchError;
use mirror::RefreshError;
use mirror::record::OrderRepository;
use mirror::query;
use mirror::refresh::spawn_periodic;

fn three_pages() -> PagedSource {
    PagedSource::new(vec![
        vec![("a", "completed", 100_000_000), ("b", "pending", 7)],
        vec![("c", "completed", 50_000_000), ("d", "expired", 9)],
        vec![("e", "completed", 25_000_000), ("a", "completed", 100_000_000)],
    ])
}

#[tokio::test]
async fn test_refresh_mirrors_completed_orders_in_page_order() {
    let source = Arc::new(three_pages());
    let repo = memory_store().await;
    let refresher = refresher(source.clone(), repo.clone());

    let report = refresher.refresh().await.unwrap();

    assert_eq!(report.fetched, 6);
    assert_eq!(report.mirrored.inserted, 3);
    assert_eq!(report.mirrored.already_present, 1);
    assert_eq!(report.mirrored.skipped, 2);
    // 확인용 1페이지 + 1..=3 페이지
    assert_eq!(source.calls(), 4);

    let stored = repo.find_all(None).await.unwrap();
    let ids: Vec<&str> = stored.iter().map(|o| o.record.external_id.as_str()).collect();
    assert_eq!(ids, vec!["a", "c", "e"]);
    assert_eq!(stored[0].record.amount, 1.0);

    let totals = query::totals(repo.as_ref()).await.unwrap();
    assert_eq!(totals.num_orders, 3);
    assert!((totals.total_funded - 1.75).abs() < 1e-12);
}

#[tokio::test]
async fn test_refresh_twice_leaves_store_unchanged() {
    let repo = memory_store().await;
    let refresher = refresher(Arc::new(three_pages()), repo.clone());

    refresher.refresh().await.unwrap();
    let first = repo.find_all(None).await.unwrap();
    let report = refresher.refresh().await.unwrap();
    let second = repo.find_all(None).await.unwrap();

    assert_eq!(report.mirrored.inserted, 0);
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_malformed_page_mirrors_nothing() {
    let source = PagedSource::new(vec![
        vec![("p1", "completed", 1)],
        vec![("p2", "completed", 1)],
        vec![("p3", "completed", 1)],
        vec![("p4", "completed", 1)],
        vec![("p5", "completed", 1)],
    ])
    .with_malformed(3);
    let repo = memory_store().await;
    let refresher = refresher(Arc::new(source), repo.clone());

    let err = refresher.refresh().await.unwrap_err();

    assert!(
        matches!(err, RefreshError::Fetch(FetchError::Parse { page: 3, .. })),
        "{err:?}"
    );
    assert_eq!(repo.count().await.unwrap(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_timer_survives_failed_refreshes() {
    let source = Arc::new(PagedSource::unreachable());
    let repo = Arc::new(MemoryRepository::default());
    let refresher = Arc::new(refresher(source.clone(), repo));

    let handle = spawn_periodic(refresher, Duration::from_secs(600));

    tokio::time::sleep(Duration::from_secs(599)).await;
    assert_eq!(source.calls(), 0, "first refresh runs one period after start");

    tokio::time::sleep(Duration::from_secs(603)).await;
    assert_eq!(source.calls(), 2);
    assert!(!handle.is_finished());

    handle.abort();
}

#[tokio::test(start_paused = true)]
async fn test_timer_mirrors_new_orders() {
    let source = Arc::new(three_pages());
    let repo = Arc::new(MemoryRepository::default());
    let refresher = Arc::new(refresher(source, repo.clone()));

    let handle = spawn_periodic(refresher, Duration::from_secs(60));
    tokio::time::sleep(Duration::from_secs(61)).await;

    assert_eq!(query::num_orders(repo.as_ref()).await.unwrap(), 3);
    handle.abort();
}
