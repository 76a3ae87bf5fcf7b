//! 데이터 Provider 모듈.
//!
//! ## 시세 Provider
//! - `QuoteProvider`: 시세 조회 trait (테스트에서 mock 구현 가능)
//! - `YahooQuoteProvider`: Yahoo Finance 차트 API 기반 구현
//! - `StockFetcher`: Provider 래퍼. 오류를 로그로 남기고 `None`으로 변환
//!
//! ## 심볼 검색
//! - `YahooSymbolSearch`: Yahoo Finance 검색 API 프록시

pub mod fetcher;
pub mod search;
pub mod yahoo;

use async_trait::async_trait;

use crate::domain::{FetchRequest, Series};
use crate::error::Result;

pub use fetcher::StockFetcher;
pub use search::{SymbolMatch, YahooSymbolSearch};
pub use yahoo::YahooQuoteProvider;

/// 시세 Provider trait.
#[async_trait]
pub trait QuoteProvider: Send + Sync {
    /// Provider 이름.
    fn name(&self) -> &str;

    /// 종목의 OHLCV 시세 조회.
    ///
    /// 데이터가 없으면 빈 `Series`를 반환할 수 있습니다.
    async fn fetch_quotes(&self, ticker: &str, request: &FetchRequest) -> Result<Series>;
}
