use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use coinbase::PaginatedFetcher;
use serde::Serialize;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{error, info};

use interface::FetchError;

use crate::mirror::{MirrorError, MirrorSummary, OrderMirror};

/// 주문 갱신 기본 주기 (10분)
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(600);

#[derive(Debug, thiserror::Error)]
pub enum RefreshError {
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("mirror failed: {0}")]
    Mirror(#[from] MirrorError),
}

#[derive(Debug, Clone, Serialize)]
pub struct RefreshReport {
    /// 원격에서 받아온 주문 수
    pub fetched: usize,
    #[serde(flatten)]
    pub mirrored: MirrorSummary,
    pub finished_at: DateTime<Utc>,
}

/// Coinbase 주문 전체를 받아와 로컬 저장소에 미러링
pub struct Refresher {
    fetcher: PaginatedFetcher,
    mirror: OrderMirror,
}

impl Refresher {
    pub fn new(fetcher: PaginatedFetcher, mirror: OrderMirror) -> Self {
        Self { fetcher, mirror }
    }

    /// 전체 조회가 성공한 경우에만 미러링한다
    pub async fn refresh(&self) -> Result<RefreshReport, RefreshError> {
        let items = self.fetcher.fetch_all().await?;
        let mirrored = self.mirror.mirror(&items).await?;

        Ok(RefreshReport {
            fetched: items.len(),
            mirrored,
            finished_at: Utc::now(),
        })
    }
}

/// `period`마다 갱신을 반복하는 백그라운드 태스크.
/// 첫 실행은 한 주기 뒤이며, 실패는 로그만 남기고 계속 돈다.
pub fn spawn_periodic(refresher: Arc<Refresher>, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            info!("Refresh db at {}", Utc::now().to_rfc3339());

            match refresher.refresh().await {
                Ok(report) => info!(
                    "주기 갱신 완료: fetched={}, inserted={}",
                    report.fetched, report.mirrored.inserted
                ),
                Err(e) => error!("주기 갱신 실패 (다음 주기에 재시도): {}", e),
            }
        }
    })
}
