//! 데이터 수집 모듈.

pub mod dispatch;
pub mod ohlcv_collect;

pub use dispatch::{dispatch, DispatchOutcome};
pub use ohlcv_collect::{collect_cycle, run_poll_loop, Collector};
