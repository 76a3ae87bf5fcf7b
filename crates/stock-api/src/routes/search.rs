//! 심볼 검색 API.
//!
//! `GET /search?q=...` 요청을 Yahoo Finance 검색으로 프록시합니다.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use stock_data::SymbolMatch;
use tracing::{debug, warn};

use crate::error::{ApiErrorResponse, ApiResult};
use crate::state::AppState;

/// 검색 결과 최대 개수.
const SEARCH_LIMIT: usize = 10;

/// 검색 쿼리
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

/// 검색 응답
#[derive(Debug, Serialize, Deserialize)]
pub struct SearchResponse {
    pub status: String,
    pub results: Vec<SymbolMatch>,
}

/// GET /search?q= - 심볼 검색
async fn search_symbols(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SearchQuery>,
) -> ApiResult<Json<SearchResponse>> {
    let q = query.q.trim();
    if q.is_empty() {
        return Err(ApiErrorResponse::bad_request("query parameter 'q' is required"));
    }

    let results = state.search.search(q, SEARCH_LIMIT).await.map_err(|e| {
        warn!(query = q, error = %e, "심볼 검색 실패");
        ApiErrorResponse::with_status(StatusCode::BAD_GATEWAY, e.to_string())
    })?;

    debug!(query = q, count = results.len(), "심볼 검색 완료");
    Ok(Json(SearchResponse {
        status: "success".to_string(),
        results,
    }))
}

/// 검색 라우터 생성.
pub fn search_router() -> Router<Arc<AppState>> {
    Router::new().route("/", get(search_symbols))
}
