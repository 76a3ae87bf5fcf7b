//! 저장소 백엔드.
//!
//! 모든 백엔드는 [`StorageBackend`] 계약을 따릅니다:
//! - `store`: 성공 시 `true`, 실패 시 `false` (오류는 로그로만 남기고 전파하지 않음)
//! - `is_available`: 생성 시점에 한 번 판정한 값을 반환 (쓰기 없음)
//!
//! [`select_backends`]가 설정에 따라 우선순위 순서의 백엔드 목록을 만듭니다.
//! InfluxDB가 항상 CSV보다 앞에 옵니다.
//!
//! 백필은 이 목록을 거치지 않고 [`TimeSeriesBackend`]에만 기록합니다.

pub mod csv;
pub mod influx;

use async_trait::async_trait;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::domain::Series;
use crate::error::DataError;

pub use self::csv::CsvStorage;
pub use self::influx::{InfluxConfig, InfluxStorage};

/// 저장소 백엔드 계약.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// 백엔드 이름 (로그/헬스 체크용).
    fn name(&self) -> &str;

    /// 시리즈 저장. 겹치는 데이터로 반복 호출해도 안전해야 합니다.
    async fn store(&self, ticker: &str, series: &Series) -> bool;

    /// 쓰기 가능 여부 (캐시된 값).
    fn is_available(&self) -> bool;
}

/// 시계열 저장소 (백필 대상).
///
/// CSV 저장소는 구현하지 않으므로 백필 데이터가 CSV로 떨어질 수 없습니다.
pub trait TimeSeriesBackend: StorageBackend {}

/// 저장 모드.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageMode {
    /// InfluxDB 전용 (연결 실패 시 기동 중단)
    Influx,
    /// CSV 전용
    Csv,
    /// InfluxDB 우선, CSV fallback
    Auto,
}

impl StorageMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Influx => "influx",
            Self::Csv => "csv",
            Self::Auto => "auto",
        }
    }

    fn wants_influx(&self) -> bool {
        matches!(self, Self::Influx | Self::Auto)
    }

    fn wants_csv(&self) -> bool {
        matches!(self, Self::Csv | Self::Auto)
    }
}

impl fmt::Display for StorageMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StorageMode {
    type Err = DataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "influx" | "influxdb" => Ok(Self::Influx),
            "csv" => Ok(Self::Csv),
            "auto" => Ok(Self::Auto),
            other => Err(DataError::ConfigError(format!(
                "Invalid storage mode: {} (expected influx, csv or auto)",
                other
            ))),
        }
    }
}

/// 저장소 설정.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// 저장 모드
    pub mode: StorageMode,
    /// CSV 파일 디렉토리
    pub data_dir: PathBuf,
    /// InfluxDB 연결 정보
    pub influx: InfluxConfig,
}

/// 설정에 맞는 백엔드 목록을 우선순위 순서로 생성.
///
/// 빈 목록은 "사용 가능한 백엔드 없음"을 뜻하며 호출 측은 기동을 중단해야 합니다.
pub async fn select_backends(config: &StorageConfig) -> Vec<Arc<dyn StorageBackend>> {
    let influx = connect_time_series(config).await;
    assemble_backends(config, &influx)
}

/// 시계열 저장소 연결.
///
/// CSV 모드에서는 연결을 시도하지 않고 사용 불가 상태의 저장소를 반환합니다.
pub async fn connect_time_series(config: &StorageConfig) -> Arc<InfluxStorage> {
    if config.mode.wants_influx() {
        Arc::new(InfluxStorage::connect(config.influx.clone()).await)
    } else {
        Arc::new(InfluxStorage::disabled(config.influx.clone()))
    }
}

/// 이미 연결한 시계열 저장소로 우선순위 목록 구성.
pub fn assemble_backends(
    config: &StorageConfig,
    influx: &Arc<InfluxStorage>,
) -> Vec<Arc<dyn StorageBackend>> {
    let mut backends: Vec<Arc<dyn StorageBackend>> = Vec::new();

    if config.mode.wants_influx() {
        if influx.is_available() {
            backends.push(influx.clone());
        } else if config.mode == StorageMode::Influx {
            error!(url = %config.influx.url, "InfluxDB 모드가 지정되었지만 연결할 수 없습니다");
            return Vec::new();
        } else {
            warn!(url = %config.influx.url, "InfluxDB 사용 불가, CSV 저장소만 사용");
        }
    }

    if config.mode.wants_csv() {
        backends.push(Arc::new(CsvStorage::new(&config.data_dir)));
    }

    info!(
        mode = %config.mode,
        backends = ?backends.iter().map(|b| b.name().to_string()).collect::<Vec<_>>(),
        "저장소 백엔드 선택 완료"
    );

    backends
}
