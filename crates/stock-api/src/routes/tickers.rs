//! 추적 종목 관리 API.
//!
//! # 엔드포인트
//!
//! - `GET /tickers` - 추적 종목 목록
//! - `POST /tickers` - 종목 추가 + 과거 데이터 백필 시작
//! - `DELETE /tickers/{ticker}` - 종목 삭제

use axum::{
    extract::{Path, State},
    routing::{delete, get},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use stock_data::registry::normalize_symbol;
use stock_data::TickerEntry;
use tracing::{debug, error, info};

use crate::error::{ApiErrorResponse, ApiResult};
use crate::state::AppState;

// ================================================================================================
// Request/Response Types
// ================================================================================================

/// 종목 추가 요청
#[derive(Debug, Deserialize)]
pub struct AddTickerRequest {
    #[serde(default)]
    pub ticker: String,
    /// 표시 이름 (없으면 심볼)
    #[serde(default)]
    pub name: Option<String>,
    /// 백필 기간 (년, 없으면 서버 기본값)
    #[serde(default)]
    pub years: Option<u32>,
}

/// 백필 시작 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackfillState {
    Started,
    AlreadyRunning,
}

/// 종목 추가 응답
#[derive(Debug, Serialize, Deserialize)]
pub struct AddTickerResponse {
    pub status: String,
    pub symbol: String,
    /// 새로 등록되었는지 여부 (이미 있던 종목이면 false)
    pub added: bool,
    pub backfill: BackfillState,
}

/// 단순 성공 응답
#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
}

// ================================================================================================
// Handlers
// ================================================================================================

/// GET /tickers - 추적 종목 목록
async fn list_tickers(State(state): State<Arc<AppState>>) -> Json<Vec<TickerEntry>> {
    let tickers = state.registry.list();
    debug!(count = tickers.len(), "종목 목록 조회");
    Json(tickers)
}

/// POST /tickers - 종목 추가
///
/// 이미 등록된 종목이어도 백필은 다시 요청합니다 (진행 중이면 무시).
async fn add_ticker(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AddTickerRequest>,
) -> ApiResult<Json<AddTickerResponse>> {
    let symbol = normalize_symbol(&req.ticker)
        .ok_or_else(|| ApiErrorResponse::bad_request("ticker is required"))?;

    let added = state
        .registry
        .add(&symbol, req.name.as_deref().unwrap_or_default())
        .map_err(|e| {
            error!(symbol = %symbol, error = %e, "종목 추가 실패");
            ApiErrorResponse::internal(format!("Failed to save ticker: {}", e))
        })?;

    let years = req.years.unwrap_or(state.default_backfill_years);
    let backfill = if state.backfill.spawn(&symbol, years) {
        BackfillState::Started
    } else {
        BackfillState::AlreadyRunning
    };

    info!(symbol = %symbol, added = added, years = years, backfill = ?backfill, "종목 추가");

    Ok(Json(AddTickerResponse {
        status: "success".to_string(),
        symbol,
        added,
        backfill,
    }))
}

/// DELETE /tickers/{ticker} - 종목 삭제
async fn remove_ticker(
    State(state): State<Arc<AppState>>,
    Path(ticker): Path<String>,
) -> ApiResult<Json<StatusResponse>> {
    let removed = state.registry.remove(&ticker).map_err(|e| {
        error!(ticker = %ticker, error = %e, "종목 삭제 실패");
        ApiErrorResponse::internal(format!("Failed to save tickers: {}", e))
    })?;

    if !removed {
        return Err(ApiErrorResponse::not_found(format!("Ticker not found: {}", ticker)));
    }

    info!(ticker = %ticker, "종목 삭제");
    Ok(Json(StatusResponse {
        status: "success".to_string(),
    }))
}

/// 종목 관리 라우터 생성.
pub fn tickers_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_tickers).post(add_ticker))
        .route("/{ticker}", delete(remove_ticker))
}
