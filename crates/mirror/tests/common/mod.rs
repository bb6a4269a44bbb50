#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use coinbase::PaginatedFetcher;
use interface::{FetchError, PageSource};
use mirror::record::{OrderRecord, OrderRepository, RecordError, SqliteOrderRepository, StoredOrder};
use mirror::{OrderMirror, Refresher};

/// (id, status, satoshi)
pub type Order = (&'static str, &'static str, i64);

/// 고정된 페이지를 돌려주는 주문 소스
pub struct PagedSource {
    pages: Vec<String>,
    unreachable: bool,
    calls: AtomicUsize,
}

impl PagedSource {
    pub fn new(pages: Vec<Vec<Order>>) -> Self {
        let num_pages = pages.len();
        let pages = pages
            .into_iter()
            .map(|orders| {
                let orders: Vec<serde_json::Value> = orders
                    .into_iter()
                    .map(|(id, status, cents)| {
                        serde_json::json!({
                            "order": {
                                "id": id,
                                "status": status,
                                "total_btc": {"cents": cents, "currency_iso": "BTC"},
                                "created_at": "2013-08-13T19:49:18-07:00"
                            }
                        })
                    })
                    .collect();
                serde_json::json!({"num_pages": num_pages, "orders": orders}).to_string()
            })
            .collect();

        Self {
            pages,
            unreachable: false,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn unreachable() -> Self {
        Self {
            pages: Vec::new(),
            unreachable: true,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_malformed(mut self, page: u32) -> Self {
        self.pages[page as usize - 1] = "{\"orders\": [{\"order\":".to_string();
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PageSource for PagedSource {
    async fn fetch_page(&self, page: u32) -> Result<String, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.unreachable {
            return Err(FetchError::Transport {
                page,
                reason: "connection refused".to_string(),
            });
        }

        self.pages
            .get(page as usize - 1)
            .cloned()
            .ok_or_else(|| FetchError::Transport {
                page,
                reason: "no such page".to_string(),
            })
    }
}

/// 실제 I/O 없이 동작하는 저장소 (시간 정지 테스트용)
#[derive(Default)]
pub struct MemoryRepository {
    orders: Mutex<Vec<StoredOrder>>,
}

#[async_trait]
impl OrderRepository for MemoryRepository {
    async fn find_by_external_id(
        &self,
        external_id: &str,
    ) -> Result<Option<StoredOrder>, RecordError> {
        let orders = self.orders.lock().unwrap();
        Ok(orders
            .iter()
            .find(|o| o.record.external_id == external_id)
            .cloned())
    }

    async fn insert(&self, record: &OrderRecord) -> Result<bool, RecordError> {
        let mut orders = self.orders.lock().unwrap();
        if orders.iter().any(|o| o.record.external_id == record.external_id) {
            return Ok(false);
        }
        let now = Utc::now();
        let id = orders.len() as i64 + 1;
        orders.push(StoredOrder {
            id,
            record: record.clone(),
            created_at: now,
            updated_at: now,
        });
        Ok(true)
    }

    async fn count(&self) -> Result<u64, RecordError> {
        Ok(self.orders.lock().unwrap().len() as u64)
    }

    async fn count_and_sum(&self) -> Result<(u64, f64), RecordError> {
        let orders = self.orders.lock().unwrap();
        Ok((orders.len() as u64, orders.iter().map(|o| o.record.amount).sum()))
    }

    async fn find_all(&self, limit: Option<u64>) -> Result<Vec<StoredOrder>, RecordError> {
        let orders = self.orders.lock().unwrap();
        let limit = limit.map(|l| l as usize).unwrap_or(orders.len());
        Ok(orders.iter().take(limit).cloned().collect())
    }
}

pub async fn memory_store() -> Arc<dyn OrderRepository> {
    Arc::new(
        SqliteOrderRepository::connect("sqlite::memory:")
            .await
            .expect("in-memory sqlite"),
    )
}

pub fn refresher(source: Arc<dyn PageSource>, repo: Arc<dyn OrderRepository>) -> Refresher {
    Refresher::new(PaginatedFetcher::new(source), OrderMirror::new(repo))
}
