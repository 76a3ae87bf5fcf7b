//! 과거 데이터 백필.
//!
//! - `HistoricalBackfill`: 청크 단위 일봉 + 최근 1분봉 백필 코디네이터
//! - `InFlight`: 심볼별 중복 실행 방지

pub mod historical;
pub mod in_flight;

pub use historical::{plan_chunks, BackfillOutcome, BackfillReport, ChunkWindow, HistoricalBackfill};
pub use in_flight::{InFlight, InFlightGuard};
