use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::{Index, OnConflict};
use sea_orm::{
    ColumnTrait, ConnectOptions, ConnectionTrait, Database, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Schema, Set,
};
use std::convert::TryInto;
use std::env;
use std::path::PathBuf;
use tracing::info;

use super::entities::order;
use super::{OrderRecord, OrderRepository, RecordError, StoredOrder};

/// SQLite 파일 경로를 SeaORM 접속 문자열로 변환
/// 상대 경로는 현재 디렉토리 기준이며, 상위 디렉토리가 없으면 생성한다
pub fn sqlite_url(db_path: &str) -> Result<String, RecordError> {
    let mut path = PathBuf::from(db_path);
    if !path.is_absolute() {
        if let Ok(current_dir) = env::current_dir() {
            path = current_dir.join(db_path);
        }
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| RecordError::Other(format!("Failed to create DB directory: {}", e)))?;
    }

    Ok(format!("sqlite://{}?mode=rwc", path.to_string_lossy()))
}

/// SQLite 기반 주문 저장소
pub struct SqliteOrderRepository {
    db: DatabaseConnection,
}

impl SqliteOrderRepository {
    /// 저장소에 접속하고 테이블이 없으면 생성
    pub async fn connect(db_url: &str) -> Result<Self, RecordError> {
        info!("Connecting to order database: {}", db_url);

        // SQLite 쓰기는 어차피 직렬화되므로 커넥션 하나로 충분 (sqlite::memory:도 유지됨)
        let mut options = ConnectOptions::new(db_url.to_string());
        options.max_connections(1).sqlx_logging(false);

        let db = Database::connect(options).await?;
        let repo = Self { db };
        repo.init_schema().await?;

        info!("Orders table initialized");
        Ok(repo)
    }

    async fn init_schema(&self) -> Result<(), RecordError> {
        let backend = self.db.get_database_backend();
        let schema = Schema::new(backend);

        // 테이블 생성 (IF NOT EXISTS), external_id에는 UNIQUE 제약
        let mut create_table_stmt = schema.create_table_from_entity(order::Entity);
        create_table_stmt.if_not_exists();
        self.db.execute(backend.build(&create_table_stmt)).await?;

        let mut time_idx = Index::create()
            .name("idx_orders_time")
            .table(order::Entity)
            .col(order::Column::Time)
            .to_owned();
        time_idx.if_not_exists();

        if let Err(e) = self.db.execute(backend.build(&time_idx)).await {
            tracing::debug!("Index idx_orders_time creation skipped: {}", e);
        }

        Ok(())
    }
}

#[async_trait]
impl OrderRepository for SqliteOrderRepository {
    async fn find_by_external_id(
        &self,
        external_id: &str,
    ) -> Result<Option<StoredOrder>, RecordError> {
        let model = order::Entity::find()
            .filter(order::Column::ExternalId.eq(external_id))
            .one(&self.db)
            .await?;

        match model {
            Some(m) => Ok(Some(m.try_into()?)),
            None => Ok(None),
        }
    }

    async fn insert(&self, record: &OrderRecord) -> Result<bool, RecordError> {
        let now = Utc::now().to_rfc3339();
        let model = order::ActiveModel {
            external_id: Set(record.external_id.clone()),
            amount: Set(record.amount),
            time: Set(record.time.clone()),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        };

        let rows = order::Entity::insert(model)
            .on_conflict(
                OnConflict::column(order::Column::ExternalId)
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await?;

        Ok(rows > 0)
    }

    async fn count(&self) -> Result<u64, RecordError> {
        Ok(order::Entity::find().count(&self.db).await?)
    }

    async fn count_and_sum(&self) -> Result<(u64, f64), RecordError> {
        // 같은 스냅샷에서 읽도록 한 쿼리로. 빈 테이블의 SUM은 NULL
        let row: Option<(i64, Option<f64>)> = order::Entity::find()
            .select_only()
            .column_as(order::Column::Id.count(), "num_orders")
            .column_as(order::Column::Amount.sum(), "total")
            .into_tuple()
            .one(&self.db)
            .await?;

        Ok(match row {
            Some((count, total)) => (count.max(0) as u64, total.unwrap_or(0.0)),
            None => (0, 0.0),
        })
    }

    async fn find_all(&self, limit: Option<u64>) -> Result<Vec<StoredOrder>, RecordError> {
        let mut query = order::Entity::find().order_by_asc(order::Column::Id);

        if let Some(limit_val) = limit {
            query = query.limit(limit_val);
        }

        let models = query.all(&self.db).await?;

        models.into_iter().map(|m| m.try_into()).collect()
    }
}
