/// 주문 엔티티 모듈
pub mod order {
    use sea_orm::entity::prelude::*;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
    #[sea_orm(table_name = "orders")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = true)]
        pub id: i64,

        /// Coinbase 주문 ID
        #[sea_orm(column_type = "Text", unique)]
        pub external_id: String,

        /// BTC 단위 금액
        #[sea_orm(column_type = "Double")]
        pub amount: f64,

        /// Coinbase 주문 생성 시각 (원본 문자열 그대로)
        #[sea_orm(column_type = "Text")]
        pub time: String,

        /// 레코드 생성 시각 (RFC 3339)
        #[sea_orm(column_type = "Text")]
        pub created_at: String,

        /// 레코드 갱신 시각 (RFC 3339)
        #[sea_orm(column_type = "Text")]
        pub updated_at: String,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}
