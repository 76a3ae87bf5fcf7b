//! Provider 오류를 경계 밖으로 내보내지 않는 조회 래퍼.

use std::sync::Arc;
use tracing::{info, warn};

use super::QuoteProvider;
use crate::domain::{FetchRequest, Series};

/// 시세 조회기.
///
/// 실패나 빈 응답은 모두 로그를 남기고 `None`으로 돌려줍니다.
/// 호출 측(폴링 루프, 백필)은 `None`을 "이번엔 데이터 없음"으로만 취급합니다.
#[derive(Clone)]
pub struct StockFetcher {
    provider: Arc<dyn QuoteProvider>,
}

impl StockFetcher {
    pub fn new(provider: Arc<dyn QuoteProvider>) -> Self {
        Self { provider }
    }

    pub async fn fetch(&self, ticker: &str, request: &FetchRequest) -> Option<Series> {
        info!(symbol = ticker, request = %request, provider = self.provider.name(), "시세 조회");

        match self.provider.fetch_quotes(ticker, request).await {
            Ok(series) if series.is_empty() => {
                info!(symbol = ticker, request = %request, "데이터 없음");
                None
            }
            Ok(series) => Some(series),
            Err(e) => {
                warn!(symbol = ticker, request = %request, error = %e, "시세 조회 실패");
                None
            }
        }
    }
}
