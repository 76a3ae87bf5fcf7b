//! InfluxDB v2 저장소.
//!
//! HTTP API를 직접 사용합니다:
//! - 연결 확인: `GET {url}/ping` (생성 시 한 번만)
//! - 쓰기: `POST {url}/api/v2/write?org=..&bucket=..&precision=ns` (line protocol)
//!
//! 각 Bar는 `stock_price` measurement의 point 하나로 기록되며
//! `ticker` 태그와 open/high/low/close/volume 필드를 가집니다.

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use std::time::Duration;
use tracing::{error, info, instrument, warn};

use super::{StorageBackend, TimeSeriesBackend};
use crate::domain::{Bar, Series};
use crate::error::{DataError, Result};

/// measurement 이름.
pub const MEASUREMENT: &str = "stock_price";

/// 요청 한 번에 보내는 최대 line 수.
const WRITE_BATCH_SIZE: usize = 5_000;

/// InfluxDB 연결 설정.
#[derive(Debug, Clone)]
pub struct InfluxConfig {
    /// 서버 URL (예: http://influxdb:8086)
    pub url: String,
    /// API 토큰
    pub token: String,
    /// 조직
    pub org: String,
    /// 버킷
    pub bucket: String,
    /// 연결/요청 타임아웃
    pub timeout: Duration,
}

impl Default for InfluxConfig {
    fn default() -> Self {
        Self {
            url: "http://influxdb:8086".to_string(),
            token: "your-token-here".to_string(),
            org: "your-org".to_string(),
            bucket: "stock_data".to_string(),
            timeout: Duration::from_millis(5_000),
        }
    }
}

/// InfluxDB 저장소.
pub struct InfluxStorage {
    client: reqwest::Client,
    config: InfluxConfig,
    available: bool,
}

impl InfluxStorage {
    /// 클라이언트를 만들고 ping으로 연결을 한 번 확인합니다.
    ///
    /// 실패해도 에러를 반환하지 않고 `is_available() == false`인 저장소를 돌려줍니다.
    pub async fn connect(config: InfluxConfig) -> Self {
        let client = match reqwest::Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.timeout)
            .build()
        {
            Ok(client) => client,
            Err(e) => {
                warn!(error = %e, "InfluxDB HTTP 클라이언트 생성 실패");
                return Self::disabled(config);
            }
        };

        let available = match ping(&client, &config.url).await {
            Ok(()) => {
                info!(url = %config.url, "InfluxDB 연결 성공");
                true
            }
            Err(e) => {
                warn!(url = %config.url, error = %e, "InfluxDB 연결 실패");
                false
            }
        };

        Self {
            client,
            config,
            available,
        }
    }

    /// 연결하지 않은 사용 불가 저장소 (CSV 전용 모드).
    pub fn disabled(config: InfluxConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
            available: false,
        }
    }

    fn write_url(&self) -> String {
        format!("{}/api/v2/write", self.config.url.trim_end_matches('/'))
    }

    async fn write_lines(&self, body: String) -> Result<()> {
        let response = self
            .client
            .post(self.write_url())
            .query(&[
                ("org", self.config.org.as_str()),
                ("bucket", self.config.bucket.as_str()),
                ("precision", "ns"),
            ])
            .header(AUTHORIZATION, format!("Token {}", self.config.token))
            .header(CONTENT_TYPE, "text/plain; charset=utf-8")
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let message = response.text().await.unwrap_or_default();
        Err(DataError::Http(format!("InfluxDB write 실패 ({}): {}", status, message)))
    }
}

#[async_trait]
impl StorageBackend for InfluxStorage {
    fn name(&self) -> &str {
        "influxdb"
    }

    #[instrument(skip(self, series), fields(count = series.len()))]
    async fn store(&self, ticker: &str, series: &Series) -> bool {
        if !self.available {
            return false;
        }

        let lines: Vec<String> = series
            .iter()
            .filter_map(|bar| encode_point(ticker, bar))
            .collect();
        if lines.is_empty() {
            return true;
        }

        for batch in lines.chunks(WRITE_BATCH_SIZE) {
            if let Err(e) = self.write_lines(batch.join("\n")).await {
                error!(symbol = ticker, error = %e, "InfluxDB 쓰기 실패");
                return false;
            }
        }

        info!(symbol = ticker, stored = lines.len(), "InfluxDB 저장 완료");
        true
    }

    fn is_available(&self) -> bool {
        self.available
    }
}

impl TimeSeriesBackend for InfluxStorage {}

async fn ping(client: &reqwest::Client, url: &str) -> Result<()> {
    let response = client
        .get(format!("{}/ping", url.trim_end_matches('/')))
        .send()
        .await?;

    if response.status().is_success() {
        Ok(())
    } else {
        Err(DataError::Http(format!("ping 응답 오류: {}", response.status())))
    }
}

/// Bar 하나를 line protocol 한 줄로 변환.
///
/// 불완전한 Bar나 ns로 표현할 수 없는 타임스탬프는 `None`.
pub fn encode_point(ticker: &str, bar: &Bar) -> Option<String> {
    if !bar.is_complete() {
        return None;
    }
    let (open, high, low, close) = (bar.open?, bar.high?, bar.low?, bar.close?);
    let nanos = bar.timestamp.timestamp_nanos_opt()?;

    Some(format!(
        "{},ticker={} open={},high={},low={},close={},volume={}i {}",
        MEASUREMENT,
        escape_tag(ticker),
        open,
        high,
        low,
        close,
        bar.volume,
        nanos
    ))
}

/// 태그 값 이스케이프 (쉼표, 등호, 공백).
fn escape_tag(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, ',' | '=' | ' ') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
