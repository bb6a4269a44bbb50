pub mod error;
pub mod handlers;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{Router, routing::get};
use chrono::Utc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::DashboardConfig;
use crate::record::OrderRepository;
use crate::refresh::{self, RefreshError, Refresher};

pub use error::ApiError;

/// 핸들러와 주기 갱신 태스크가 공유하는 상태
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<dyn OrderRepository>,
    pub refresher: Arc<Refresher>,
    pub dashboard: Arc<DashboardConfig>,
}

impl AppState {
    pub fn new(
        repo: Arc<dyn OrderRepository>,
        refresher: Arc<Refresher>,
        dashboard: DashboardConfig,
    ) -> Self {
        Self {
            repo,
            refresher,
            dashboard: Arc::new(dashboard),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LaunchError {
    #[error("initial refresh failed: {0}")]
    InitialRefresh(#[from] RefreshError),

    #[error("server error: {0}")]
    Io(#[from] std::io::Error),
}

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/orders", get(handlers::order_stats))
        .route("/api/orders/all", get(handlers::all_orders))
        .route("/refresh_orders", get(handlers::refresh_orders))
        .route("/health", get(handlers::health))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// 첫 갱신을 끝낸 뒤에만 포트를 연다.
/// 첫 갱신이 실패하면 바인딩 없이 에러를 반환한다.
pub async fn launch(
    addr: SocketAddr,
    state: AppState,
    refresh_interval: Duration,
) -> Result<(), LaunchError> {
    info!("Initial mirror of Coinbase orders at {}", Utc::now().to_rfc3339());
    let report = state.refresher.refresh().await?;
    info!(
        "초기 미러링 완료: fetched={}, inserted={}",
        report.fetched, report.mirrored.inserted
    );

    // 바인딩에 실패하면 주기 갱신도 시작하지 않는다
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on {}", listener.local_addr()?);

    let timer = refresh::spawn_periodic(state.refresher.clone(), refresh_interval);
    let result = axum::serve(listener, build_router(state)).await;
    timer.abort();
    result?;

    Ok(())
}
