//! 주식 시세 수집기.
//!
//! 이 crate는 수집 데몬을 구성하는 요소를 제공합니다:
//! - 환경변수 설정 (`CollectorConfig`)
//! - 저장소 dispatch (첫 번째 성공 백엔드에만 기록)
//! - 주기적 폴링 루프와 사이클 통계

pub mod config;
pub mod error;
pub mod modules;
pub mod stats;

pub use config::CollectorConfig;
pub use error::{CollectorError, Result};
pub use stats::CollectionStats;
