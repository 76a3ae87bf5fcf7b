//! API 라우트.
//!
//! # 라우트 구조
//!
//! - `/health` - 헬스 체크 (백엔드 가용성, 진행 중 백필)
//! - `/tickers` - 추적 종목 관리
//! - `/search` - 심볼 검색

pub mod health;
pub mod search;
pub mod tickers;

pub use health::{health_router, BackendStatus, BackfillStatus, HealthResponse};
pub use search::{search_router, SearchQuery, SearchResponse};
pub use tickers::{
    tickers_router, AddTickerRequest, AddTickerResponse, BackfillState, StatusResponse,
};

use axum::http::Method;
use axum::Router;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// 전체 API 라우터 생성 (상태 미적용).
pub fn create_api_router() -> Router<Arc<AppState>> {
    Router::new()
        .nest("/health", health_router())
        .nest("/tickers", tickers_router())
        .nest("/search", search_router())
}

/// 미들웨어까지 적용된 최종 라우터.
pub fn create_router(state: Arc<AppState>) -> Router {
    create_api_router()
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer())
}

/// CORS 설정 (모든 origin 허용).
fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([axum::http::header::CONTENT_TYPE, axum::http::header::ACCEPT])
        .max_age(Duration::from_secs(3600))
}
