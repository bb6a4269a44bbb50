use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 1 BTC = 100,000,000 satoshi
pub const SATOSHIS_PER_BTC: f64 = 100_000_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    New,
    Pending,
    Completed,
    Canceled,
    Expired,
    Mispaid,
    #[serde(other)]
    Other,
}

/// 첫 페이지 조회 시 전체 페이지 수만 읽어온다 (orders는 버림)
#[derive(Debug, Clone, Deserialize)]
pub struct PageCount {
    pub num_pages: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OrdersPage {
    pub orders: Vec<OrderEnvelope>,
}

impl OrdersPage {
    pub fn into_items(self) -> Result<Vec<RemoteItem>, IncompleteOrder> {
        self.orders
            .into_iter()
            .map(|envelope| RemoteItem::try_from(envelope.order))
            .collect()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct OrderEnvelope {
    pub order: RemoteOrder,
}

/// 금액과 생성 시각은 완료 주문에서만 의미가 있다.
/// 만료/취소 주문은 `total_btc`가 null로 오기도 한다.
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteOrder {
    pub id: String,
    pub status: OrderStatus,
    #[serde(default)]
    pub total_btc: Option<Money>,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Money {
    pub cents: i64, // satoshi 단위
}

/// 원격 API에서 받아온 주문 한 건.
/// completed가 아니면 `amount_minor`, `created_at`은 비어 있을 수 있다 (0, "").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteItem {
    pub external_id: String,
    pub status: OrderStatus,
    pub amount_minor: i64,
    pub created_at: String,
}

impl RemoteItem {
    pub fn is_completed(&self) -> bool {
        self.status == OrderStatus::Completed
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("completed order {id} has no {field}")]
pub struct IncompleteOrder {
    pub id: String,
    pub field: &'static str,
}

impl TryFrom<RemoteOrder> for RemoteItem {
    type Error = IncompleteOrder;

    fn try_from(order: RemoteOrder) -> Result<Self, Self::Error> {
        if order.status != OrderStatus::Completed {
            // 건너뛸 주문이므로 나머지 필드는 보지 않는다
            return Ok(Self {
                external_id: order.id,
                status: order.status,
                amount_minor: order.total_btc.map(|money| money.cents).unwrap_or_default(),
                created_at: order.created_at.unwrap_or_default(),
            });
        }

        let missing = |field| IncompleteOrder {
            id: order.id.clone(),
            field,
        };
        let amount_minor = order.total_btc.ok_or_else(|| missing("total_btc"))?.cents;
        let created_at = order.created_at.clone().ok_or_else(|| missing("created_at"))?;

        Ok(Self {
            external_id: order.id,
            status: order.status,
            amount_minor,
            created_at,
        })
    }
}

/// 페이지 번호로 원본 응답을 돌려주는 주문 소스
#[async_trait]
pub trait PageSource: Send + Sync {
    /// 페이지 번호는 1부터 시작
    async fn fetch_page(&self, page: u32) -> Result<String, FetchError>;
}

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("transport error on page {page}: {reason}")]
    Transport { page: u32, reason: String },
    #[error("parse error on page {page}: {source}")]
    Parse {
        page: u32,
        #[source]
        source: serde_json::Error,
    },
}

impl FetchError {
    pub fn page(&self) -> u32 {
        match self {
            FetchError::Transport { page, .. } | FetchError::Parse { page, .. } => *page,
        }
    }
}
