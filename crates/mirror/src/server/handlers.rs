use axum::{Json, extract::State};
use chrono::Utc;
use serde::Serialize;
use serde_json::{Value, json};

use super::{AppState, error::ApiError};
use crate::query;
use crate::refresh::RefreshReport;

/// 대시보드 온도계 데이터
#[derive(Debug, Serialize)]
pub struct DashboardStats {
    pub num_orders: u64,
    pub total_funded: f64,
    pub unit_symbol: String,
    pub target: f64,
    pub days_left: i64,
}

/// GET /api/orders
pub async fn order_stats(State(state): State<AppState>) -> Result<Json<DashboardStats>, ApiError> {
    let totals = query::totals(state.repo.as_ref()).await?;
    let dashboard = &state.dashboard;

    Ok(Json(DashboardStats {
        num_orders: totals.num_orders,
        total_funded: totals.total_funded,
        unit_symbol: dashboard.unit_symbol.clone(),
        target: dashboard.target,
        days_left: dashboard.days_left(Utc::now().date_naive()),
    }))
}

/// GET /api/orders/all
pub async fn all_orders(State(state): State<AppState>) -> Result<Json<Vec<Value>>, ApiError> {
    let orders = query::all_to_json(state.repo.as_ref()).await?;
    Ok(Json(orders))
}

/// GET /refresh_orders - 수동 갱신 (주기 갱신과 같은 경로로 기록)
pub async fn refresh_orders(State(state): State<AppState>) -> Result<Json<RefreshReport>, ApiError> {
    tracing::info!("Manual refresh of Coinbase orders requested");
    let report = state.refresher.refresh().await?;
    Ok(Json(report))
}

/// GET /health
pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
