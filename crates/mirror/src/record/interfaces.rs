use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::convert::TryFrom;
use std::fmt::Display;

/// 저장할 주문 데이터
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRecord {
    /// Coinbase 주문 ID (유일)
    pub external_id: String,
    /// BTC 단위 금액
    pub amount: f64,
    /// Coinbase 주문 생성 시각
    pub time: String,
}

/// 저장소에 저장된 주문 (ID 및 시스템 시각 포함)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredOrder {
    /// 데이터베이스 ID
    pub id: i64,
    /// 주문 데이터
    #[serde(flatten)]
    pub record: OrderRecord,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StoredOrder {
    /// 주어진 BTC/USD 환율로 환산한 금액 (참고용, 정확도 보장 없음)
    pub fn amount_in_usd(&self, btc_to_usd: f64) -> f64 {
        self.record.amount * btc_to_usd
    }
}

impl Display for StoredOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Order <ID: {} External_ID: {} Amount: {} Time: {} Created: {} Updated: {}>",
            self.id,
            self.record.external_id,
            self.record.amount,
            self.record.time,
            self.created_at.to_rfc3339(),
            self.updated_at.to_rfc3339()
        )
    }
}

/// SeaORM order::Model을 StoredOrder로 변환
impl TryFrom<super::entities::order::Model> for StoredOrder {
    type Error = RecordError;

    fn try_from(model: super::entities::order::Model) -> Result<Self, Self::Error> {
        let created_at = parse_timestamp("created_at", &model.created_at)?;
        let updated_at = parse_timestamp("updated_at", &model.updated_at)?;

        Ok(StoredOrder {
            id: model.id,
            record: OrderRecord {
                external_id: model.external_id,
                amount: model.amount,
                time: model.time,
            },
            created_at,
            updated_at,
        })
    }
}

fn parse_timestamp(column: &str, value: &str) -> Result<DateTime<Utc>, RecordError> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| RecordError::Other(format!("Failed to parse {}: {}", column, e)))
}

/// 주문 저장소 인터페이스
/// 모든 쓰기는 OrderMirror 한 곳을 통해서만 들어온다
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// 외부 ID로 주문 조회
    async fn find_by_external_id(
        &self,
        external_id: &str,
    ) -> Result<Option<StoredOrder>, RecordError>;

    /// 주문 저장. 같은 외부 ID가 이미 있으면 아무것도 하지 않고 false
    async fn insert(&self, record: &OrderRecord) -> Result<bool, RecordError>;

    /// 전체 주문 수
    async fn count(&self) -> Result<u64, RecordError>;

    /// 주문 수와 금액 합계를 한 번에 (주문이 없으면 0, 0)
    async fn count_and_sum(&self) -> Result<(u64, f64), RecordError>;

    /// 모든 주문 조회 (ID 순)
    async fn find_all(&self, limit: Option<u64>) -> Result<Vec<StoredOrder>, RecordError>;
}

/// 기록 저장소 에러 타입
#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Other error: {0}")]
    Other(String),
}
