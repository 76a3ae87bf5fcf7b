//! API 에러 응답 타입.
//!
//! 모든 엔드포인트가 같은 형식의 에러 본문을 반환합니다.
//!
//! ```json
//! {
//!   "status": "error",
//!   "message": "ticker is required"
//! }
//! ```

use axum::{http::StatusCode, Json};
use serde::{Deserialize, Serialize};

/// API 에러 응답.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    /// 항상 "error"
    pub status: String,
    /// 사람이 읽을 수 있는 에러 메시지
    pub message: String,
}

impl ApiErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            message: message.into(),
        }
    }

    /// 상태 코드와 함께 핸들러 에러로 변환.
    pub fn with_status(
        status: StatusCode,
        message: impl Into<String>,
    ) -> (StatusCode, Json<ApiErrorResponse>) {
        (status, Json(Self::new(message)))
    }

    pub fn bad_request(message: impl Into<String>) -> (StatusCode, Json<ApiErrorResponse>) {
        Self::with_status(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found(message: impl Into<String>) -> (StatusCode, Json<ApiErrorResponse>) {
        Self::with_status(StatusCode::NOT_FOUND, message)
    }

    pub fn internal(message: impl Into<String>) -> (StatusCode, Json<ApiErrorResponse>) {
        Self::with_status(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

/// API 핸들러 Result 타입 별칭.
pub type ApiResult<T> = Result<T, (StatusCode, Json<ApiErrorResponse>)>;
