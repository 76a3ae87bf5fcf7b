//! 에러 타입 정의.

use thiserror::Error;

/// Collector 에러 타입
#[derive(Debug, Error)]
pub enum CollectorError {
    /// 설정 에러
    #[error("Configuration error: {0}")]
    Config(String),

    /// 데이터 계층 에러 (레지스트리, 저장소 등)
    #[error("Data error: {0}")]
    Data(#[from] stock_data::DataError),

    /// I/O 에러
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// 관리 API 서버 에러
    #[error("Server error: {0}")]
    Server(String),
}

/// Result 타입 별칭
pub type Result<T> = std::result::Result<T, CollectorError>;
