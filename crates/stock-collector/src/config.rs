//! 환경변수 기반 설정 모듈.

use crate::{CollectorError, Result};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use stock_data::{FetchRequest, InfluxConfig, Interval, StorageConfig, StorageMode};

/// Collector 전체 설정
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    /// 저장소 설정
    pub storage: StorageConfig,
    /// 기본 추적 종목 (레지스트리 파일이 없을 때 사용)
    pub default_tickers: Vec<String>,
    /// 폴링 설정
    pub poll: PollConfig,
    /// 백필 설정
    pub backfill: BackfillConfig,
    /// 관리 API 서버 설정
    pub server: ServerConfig,
}

/// 폴링 설정
#[derive(Debug, Clone)]
pub struct PollConfig {
    /// 사이클 간 대기 시간 (초)
    pub interval_secs: u64,
    /// 조회 범위 (예: "1d")
    pub period: String,
    /// 봉 간격
    pub bar_interval: Interval,
}

/// 백필 설정
#[derive(Debug, Clone)]
pub struct BackfillConfig {
    /// 기본 백필 기간 (년)
    pub years: u32,
    /// 청크 크기 (년)
    pub chunk_years: u32,
}

/// 관리 API 서버 설정
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl CollectorConfig {
    /// 환경변수에서 설정 로드
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let mode = env_var_string("STORAGE_MODE", "auto")
            .parse::<StorageMode>()
            .map_err(|e| CollectorError::Config(e.to_string()))?;

        let bar_interval = env_var_string("POLL_INTERVAL", "1m")
            .parse::<Interval>()
            .map_err(|e| CollectorError::Config(e.to_string()))?;

        let default_tickers: Vec<String> = env_var_string("STOCK_TICKERS", "005930.KS")
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Ok(Self {
            storage: StorageConfig {
                mode,
                data_dir: PathBuf::from(env_var_string("DATA_DIR", "./data")),
                influx: InfluxConfig {
                    url: env_var_string("INFLUXDB_URL", "http://influxdb:8086"),
                    token: env_var_string("INFLUXDB_TOKEN", "your-token-here"),
                    org: env_var_string("INFLUXDB_ORG", "your-org"),
                    bucket: env_var_string("INFLUXDB_BUCKET", "stock_data"),
                    timeout: Duration::from_millis(env_var_parse("INFLUXDB_TIMEOUT_MS", 5_000)),
                },
            },
            default_tickers,
            poll: PollConfig {
                interval_secs: env_var_parse("FETCH_INTERVAL", 60),
                period: env_var_string("POLL_PERIOD", "1d"),
                bar_interval,
            },
            backfill: BackfillConfig {
                years: env_var_parse("BACKFILL_YEARS", 5),
                chunk_years: env_var_parse("BACKFILL_CHUNK_YEARS", 1),
            },
            server: ServerConfig {
                host: env_var_string("API_HOST", "0.0.0.0"),
                port: env_var_parse("API_PORT", 8000),
            },
        })
    }
}

impl PollConfig {
    /// 사이클 간 대기 시간을 Duration으로 반환
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    /// 폴링 사이클에서 사용할 조회 요청
    pub fn request(&self) -> FetchRequest {
        FetchRequest::period(self.period.clone(), self.bar_interval)
    }
}

impl ServerConfig {
    pub fn addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| CollectorError::Config(format!("잘못된 API 주소 {}:{}: {}", self.host, self.port, e)))
    }
}

/// 환경변수에서 값을 파싱 (실패 시 기본값 사용)
fn env_var_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

/// 환경변수 문자열 (없거나 비어 있으면 기본값)
fn env_var_string(key: &str, default: &str) -> String {
    std::env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}
