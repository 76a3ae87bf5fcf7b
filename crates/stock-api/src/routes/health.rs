//! 헬스 체크 endpoint.
//!
//! 저장소 백엔드 가용성과 진행 중인 백필 목록을 보고합니다.

use axum::{extract::State, routing::get, Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::state::AppState;

/// 헬스 체크 응답 구조체.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// 전체 서비스 상태 ("healthy" | "degraded")
    pub status: String,

    /// 버전
    pub version: String,

    /// 서버 업타임(초)
    pub uptime_secs: i64,

    /// 현재 시간 (ISO 8601)
    pub timestamp: String,

    /// 저장소 백엔드 상태 (우선순위 순)
    pub backends: Vec<BackendStatus>,

    /// 진행 중인 백필
    pub backfills_in_progress: Vec<BackfillStatus>,
}

/// 저장소 백엔드 상태.
#[derive(Debug, Serialize, Deserialize)]
pub struct BackendStatus {
    pub name: String,
    pub available: bool,
}

/// 진행 중인 백필.
#[derive(Debug, Serialize, Deserialize)]
pub struct BackfillStatus {
    pub symbol: String,
    pub started_at: DateTime<Utc>,
}

/// GET /health
///
/// 가용 백엔드가 하나도 없으면 "degraded".
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let backends: Vec<BackendStatus> = state
        .backends
        .iter()
        .map(|b| BackendStatus {
            name: b.name().to_string(),
            available: b.is_available(),
        })
        .collect();

    let status = if backends.iter().any(|b| b.available) {
        "healthy"
    } else {
        "degraded"
    };

    let backfills_in_progress = state
        .backfill
        .in_progress()
        .into_iter()
        .map(|(symbol, started_at)| BackfillStatus { symbol, started_at })
        .collect();

    Json(HealthResponse {
        status: status.to_string(),
        version: state.version.clone(),
        uptime_secs: state.uptime_secs(),
        timestamp: Utc::now().to_rfc3339(),
        backends,
        backfills_in_progress,
    })
}

/// 헬스 체크 라우터 생성.
pub fn health_router() -> Router<Arc<AppState>> {
    Router::new().route("/", get(health_check))
}
