use std::sync::Arc;

use futures::{stream, StreamExt, TryStreamExt};
use tracing::{debug, info};

use interface::{FetchError, OrdersPage, PageCount, PageSource, RemoteItem};

/// 동시에 진행할 수 있는 페이지 요청 수
pub const DEFAULT_CONCURRENCY: usize = 5;

/// 한 페이지 분량의 주문. 병합 전까지만 존재한다.
#[derive(Debug, Clone)]
pub struct PageBatch {
    pub page: u32,
    pub items: Vec<RemoteItem>,
}

/// 페이지 단위 API를 전부 읽어 페이지 순서대로 합친다.
///
/// 1페이지를 한 번 조회해 `num_pages`를 알아낸 뒤, 1..=num_pages 전체를
/// (1페이지 포함) 최대 `concurrency`개씩 동시에 다시 요청한다.
/// 어느 한 페이지라도 실패하면 나머지 요청을 버리고 즉시 실패한다.
pub struct PaginatedFetcher {
    source: Arc<dyn PageSource>,
    concurrency: usize,
}

impl PaginatedFetcher {
    pub fn new(source: Arc<dyn PageSource>) -> Self {
        Self::with_concurrency(source, DEFAULT_CONCURRENCY)
    }

    pub fn with_concurrency(source: Arc<dyn PageSource>, concurrency: usize) -> Self {
        Self {
            source,
            concurrency: concurrency.max(1),
        }
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// 1페이지를 조회해 전체 페이지 수를 반환 (주문 목록은 버림)
    pub async fn num_pages(&self) -> Result<u32, FetchError> {
        let body = self.source.fetch_page(1).await?;
        let count = parse_page_count(1, &body)?;
        debug!("Coinbase reports {} order pages", count);
        Ok(count)
    }

    pub async fn fetch_page(&self, page: u32) -> Result<PageBatch, FetchError> {
        let body = self.source.fetch_page(page).await?;
        let items = parse_orders(page, &body)?;
        Ok(PageBatch { page, items })
    }

    pub async fn fetch_all(&self) -> Result<Vec<RemoteItem>, FetchError> {
        let num_pages = self.num_pages().await?;
        info!(
            "Fetching {} Coinbase order pages (concurrency {})",
            num_pages, self.concurrency
        );

        // 완료 순서는 보장되지 않으므로 페이지 번호로 다시 정렬
        let mut batches: Vec<PageBatch> = stream::iter(1..=num_pages)
            .map(|page| self.fetch_page(page))
            .buffer_unordered(self.concurrency)
            .try_collect()
            .await?;
        batches.sort_unstable_by_key(|batch| batch.page);

        let items: Vec<RemoteItem> = batches.into_iter().flat_map(|batch| batch.items).collect();
        info!("Fetched {} Coinbase orders", items.len());
        Ok(items)
    }
}

pub fn parse_page_count(page: u32, body: &str) -> Result<u32, FetchError> {
    serde_json::from_str::<PageCount>(body)
        .map(|count| count.num_pages)
        .map_err(|source| FetchError::Parse { page, source })
}

pub fn parse_orders(page: u32, body: &str) -> Result<Vec<RemoteItem>, FetchError> {
    let orders: OrdersPage =
        serde_json::from_str(body).map_err(|source| FetchError::Parse { page, source })?;

    orders.into_items().map_err(|e| FetchError::Parse {
        page,
        source: serde::de::Error::custom(e),
    })
}
