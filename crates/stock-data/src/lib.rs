//! 주식 시세 수집 데이터 계층.
//!
//! 이 crate는 다음을 제공합니다:
//! - OHLCV 도메인 타입 (`Bar`, `Series`, `FetchRequest`)
//! - Yahoo Finance 시세 조회 및 심볼 검색
//! - 저장소 백엔드 (InfluxDB, CSV) 및 백엔드 선택
//! - 추적 종목 레지스트리
//! - 청크 단위 과거 데이터 백필

pub mod backfill;
pub mod domain;
pub mod error;
pub mod provider;
pub mod registry;
pub mod storage;

pub use error::{DataError, Result};

pub use domain::{Bar, FetchRequest, Interval, Series};

// 저장소 재내보내기
pub use storage::{
    assemble_backends, connect_time_series, select_backends, CsvStorage, InfluxConfig,
    InfluxStorage, StorageBackend, StorageConfig, StorageMode, TimeSeriesBackend,
};

// Provider 재내보내기
pub use provider::{QuoteProvider, StockFetcher, SymbolMatch, YahooQuoteProvider, YahooSymbolSearch};

pub use backfill::{BackfillOutcome, BackfillReport, HistoricalBackfill};
pub use registry::{TickerEntry, TickerRegistry};
