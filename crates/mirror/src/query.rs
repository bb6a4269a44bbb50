//! 대시보드용 읽기 전용 집계

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::record::{OrderRepository, RecordError};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Totals {
    /// BTC 단위 누적 금액
    pub total_funded: f64,
    pub num_orders: u64,
}

pub async fn num_orders(repo: &dyn OrderRepository) -> Result<u64, RecordError> {
    let count = repo.count().await?;
    info!("There are {} Orders", count);
    Ok(count)
}

pub async fn totals(repo: &dyn OrderRepository) -> Result<Totals, RecordError> {
    let (num_orders, total_funded) = repo.count_and_sum().await?;

    Ok(Totals {
        total_funded,
        num_orders,
    })
}

/// 모든 주문을 평범한 JSON 레코드 목록으로
pub async fn all_to_json(repo: &dyn OrderRepository) -> Result<Vec<serde_json::Value>, RecordError> {
    let orders = repo.find_all(None).await?;

    orders
        .iter()
        .map(|order| serde_json::to_value(order).map_err(RecordError::from))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{OrderRecord, SqliteOrderRepository};

    async fn memory_repo() -> SqliteOrderRepository {
        SqliteOrderRepository::connect("sqlite::memory:").await.unwrap()
    }

    #[tokio::test]
    async fn test_totals_on_empty_store() {
        let repo = memory_repo().await;

        let totals = totals(&repo).await.unwrap();

        assert_eq!(
            totals,
            Totals {
                total_funded: 0.0,
                num_orders: 0
            }
        );
        assert_eq!(num_orders(&repo).await.unwrap(), 0);
        assert!(all_to_json(&repo).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_all_to_json_is_flat() {
        let repo = memory_repo().await;
        repo.insert(&OrderRecord {
            external_id: "A1".to_string(),
            amount: 0.5,
            time: "2013-08-13T19:49:18-07:00".to_string(),
        })
        .await
        .unwrap();

        let records = all_to_json(&repo).await.unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["external_id"], "A1");
        assert_eq!(records[0]["amount"], 0.5);
        assert_eq!(records[0]["id"], 1);
        assert!(records[0].get("created_at").is_some());

        let totals = totals(&repo).await.unwrap();
        assert_eq!(totals.num_orders, 1);
        assert_eq!(totals.total_funded, 0.5);
    }

    /// 읽을 때마다 0.5 BTC 주문이 하나씩 늘어나는 저장소 (동시 미러링 흉내)
    #[derive(Default)]
    struct GrowingRepository {
        orders: std::sync::atomic::AtomicU64,
    }

    impl GrowingRepository {
        fn next(&self) -> u64 {
            self.orders.fetch_add(1, std::sync::atomic::Ordering::SeqCst) + 1
        }
    }

    #[async_trait::async_trait]
    impl OrderRepository for GrowingRepository {
        async fn find_by_external_id(
            &self,
            _: &str,
        ) -> Result<Option<crate::record::StoredOrder>, RecordError> {
            Ok(None)
        }

        async fn insert(&self, _: &OrderRecord) -> Result<bool, RecordError> {
            Ok(true)
        }

        async fn count(&self) -> Result<u64, RecordError> {
            Ok(self.next())
        }

        async fn count_and_sum(&self) -> Result<(u64, f64), RecordError> {
            let n = self.next();
            Ok((n, n as f64 * 0.5))
        }

        async fn find_all(
            &self,
            _: Option<u64>,
        ) -> Result<Vec<crate::record::StoredOrder>, RecordError> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn test_totals_come_from_one_snapshot() {
        let repo = GrowingRepository::default();

        for _ in 0..3 {
            let totals = totals(&repo).await.unwrap();
            assert_eq!(totals.total_funded, totals.num_orders as f64 * 0.5);
        }
    }
}
