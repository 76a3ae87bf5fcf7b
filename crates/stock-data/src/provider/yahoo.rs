//! Yahoo Finance 시세 Provider.

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use time::OffsetDateTime;
use tracing::debug;
use yahoo_finance_api::{YResponse, YahooError};

use super::QuoteProvider;
use crate::domain::{Bar, FetchRequest, Series};
use crate::error::{DataError, Result};

/// Yahoo Finance Provider.
pub struct YahooQuoteProvider {
    connector: yahoo_finance_api::YahooConnector,
}

impl YahooQuoteProvider {
    pub fn new() -> Result<Self> {
        let connector = yahoo_finance_api::YahooConnector::new()
            .map_err(|e| DataError::FetchError(format!("Yahoo Finance 연결 실패: {}", e)))?;
        Ok(Self { connector })
    }
}

#[async_trait]
impl QuoteProvider for YahooQuoteProvider {
    fn name(&self) -> &str {
        "yahoo"
    }

    async fn fetch_quotes(&self, ticker: &str, request: &FetchRequest) -> Result<Series> {
        let response = match request {
            FetchRequest::Period { range, interval } => {
                debug!(
                    symbol = ticker,
                    interval = interval.as_str(),
                    range = %range,
                    "Yahoo Finance API 호출"
                );
                self.connector
                    .get_quote_range(ticker, interval.as_str(), range)
                    .await
            }
            FetchRequest::Range {
                start,
                end,
                interval,
            } => {
                debug!(
                    symbol = ticker,
                    interval = interval.as_str(),
                    start = %start,
                    end = %end,
                    "Yahoo Finance API 날짜 범위 호출"
                );
                self.connector
                    .get_quote_history_interval(
                        ticker,
                        to_offset_datetime(*start)?,
                        to_offset_datetime(*end)?,
                        interval.as_str(),
                    )
                    .await
            }
        };

        let response = match response {
            Ok(response) => response,
            Err(e) if is_no_data(&e) => {
                debug!(symbol = ticker, "Yahoo Finance 응답에 데이터 없음");
                return Ok(Series::empty());
            }
            Err(e) => {
                return Err(DataError::FetchError(format!(
                    "Yahoo Finance API 오류 ({}): {}",
                    ticker, e
                )))
            }
        };

        series_from_response(&response)
    }
}

/// 응답을 시리즈로 변환. 빈 데이터셋은 빈 시리즈.
fn series_from_response(response: &YResponse) -> Result<Series> {
    let quotes = match response.quotes() {
        Ok(quotes) => quotes,
        Err(e) if is_no_data(&e) => return Ok(Series::empty()),
        Err(e) => return Err(DataError::ParseError(format!("Quote 파싱 오류: {}", e))),
    };

    let bars = quotes
        .iter()
        .filter_map(|q| {
            let timestamp = Utc.timestamp_opt(q.timestamp as i64, 0).single()?;
            Some(Bar {
                timestamp,
                open: finite(q.open),
                high: finite(q.high),
                low: finite(q.low),
                close: finite(q.close),
                volume: q.volume as u64,
            })
        })
        .collect::<Series>();

    Ok(bars.normalized())
}

/// 상장 이전 구간 등 "데이터 없음" 응답.
fn is_no_data(err: &YahooError) -> bool {
    matches!(err, YahooError::NoResult | YahooError::NoQuotes)
}

/// NaN/Inf는 결측값으로 취급.
fn finite(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}

/// chrono → time 변환 (yahoo_finance_api는 `time` 크레이트를 사용).
fn to_offset_datetime(dt: DateTime<Utc>) -> Result<OffsetDateTime> {
    OffsetDateTime::from_unix_timestamp(dt.timestamp())
        .map_err(|e| DataError::InvalidData(format!("날짜 범위 변환 실패 ({}): {}", dt, e)))
}
