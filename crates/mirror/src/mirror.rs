use std::sync::Arc;

use futures::{FutureExt, StreamExt, TryStreamExt, stream};
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, info};

use interface::{RemoteItem, SATOSHIS_PER_BTC};

use crate::record::{OrderRecord, OrderRepository, RecordError};

/// 기본값 1: 조회 후 저장(check-then-act)이 서로 겹치지 않도록 완전 직렬화
pub const DEFAULT_MIRROR_CONCURRENCY: usize = 1;

#[derive(Debug, thiserror::Error)]
#[error("failed to mirror order {external_id}: {source}")]
pub struct MirrorError {
    pub external_id: String,
    #[source]
    pub source: RecordError,
}

/// 한 번의 미러링 결과
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MirrorSummary {
    /// 새로 저장된 주문 수
    pub inserted: usize,
    /// 이미 저장되어 있던 주문 수
    pub already_present: usize,
    /// completed가 아니라 건너뛴 주문 수
    pub skipped: usize,
}

enum Outcome {
    Inserted,
    AlreadyPresent,
    Skipped,
}

/// completed 상태의 원격 주문을 로컬 저장소에 한 번씩만 저장한다.
///
/// 저장소에 대한 모든 쓰기는 이 타입을 거친다. 인스턴스 하나를 공유하면
/// 배치 전체가 내부 뮤텍스로 직렬화되므로 시작 시 갱신, 주기 갱신,
/// 수동 갱신이 동시에 돌아도 서로 끼어들지 않는다.
pub struct OrderMirror {
    repo: Arc<dyn OrderRepository>,
    concurrency: usize,
    write_lock: Mutex<()>,
}

impl OrderMirror {
    pub fn new(repo: Arc<dyn OrderRepository>) -> Self {
        Self::with_concurrency(repo, DEFAULT_MIRROR_CONCURRENCY)
    }

    pub fn with_concurrency(repo: Arc<dyn OrderRepository>, concurrency: usize) -> Self {
        Self {
            repo,
            concurrency: concurrency.max(1),
            write_lock: Mutex::new(()),
        }
    }

    /// 입력 순서대로 처리하며 첫 저장 실패에서 나머지를 중단한다
    pub async fn mirror(&self, items: &[RemoteItem]) -> Result<MirrorSummary, MirrorError> {
        let _guard = self.write_lock.lock().await;

        let outcomes: Vec<Outcome> = stream::iter(items)
            .map(|item| self.upsert(item))
            .buffered(self.concurrency)
            .try_collect::<Vec<Outcome>>()
            .boxed()
            .await?;

        let mut summary = MirrorSummary::default();
        for outcome in outcomes {
            match outcome {
                Outcome::Inserted => summary.inserted += 1,
                Outcome::AlreadyPresent => summary.already_present += 1,
                Outcome::Skipped => summary.skipped += 1,
            }
        }

        info!(
            "Mirrored {} orders: {} new, {} already stored, {} not completed",
            items.len(),
            summary.inserted,
            summary.already_present,
            summary.skipped
        );
        Ok(summary)
    }

    async fn upsert(&self, item: &RemoteItem) -> Result<Outcome, MirrorError> {
        if !item.is_completed() {
            return Ok(Outcome::Skipped);
        }

        let existing = self
            .repo
            .find_by_external_id(&item.external_id)
            .await
            .map_err(|source| MirrorError {
                external_id: item.external_id.clone(),
                source,
            })?;
        if existing.is_some() {
            return Ok(Outcome::AlreadyPresent);
        }

        let inserted = self
            .repo
            .insert(&to_order_record(item))
            .await
            .map_err(|source| MirrorError {
                external_id: item.external_id.clone(),
                source,
            })?;

        if inserted {
            debug!("Stored new order {}", item.external_id);
            Ok(Outcome::Inserted)
        } else {
            Ok(Outcome::AlreadyPresent)
        }
    }
}

/// satoshi 금액을 BTC로 변환해 저장용 레코드를 만든다
pub fn to_order_record(item: &RemoteItem) -> OrderRecord {
    OrderRecord {
        external_id: item.external_id.clone(),
        amount: item.amount_minor as f64 / SATOSHIS_PER_BTC,
        time: item.created_at.clone(),
    }
}
