//! 종목별 CSV 파일 저장소.
//!
//! 파일 경로: `{data_dir}/{TICKER}_history.csv`
//!
//! 컬럼: `timestamp,open,high,low,close,volume` (timestamp는 RFC 3339)
//!
//! 기존 파일이 있으면 읽어서 새 데이터와 병합한 뒤 통째로 덮어씁니다.
//! 같은 타임스탬프는 새 데이터가 이깁니다.
//! 같은 종목에 대한 쓰기는 종목별 락으로 직렬화됩니다.

use async_trait::async_trait;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{error, info, instrument, warn};

use super::StorageBackend;
use crate::domain::{Bar, Series};
use crate::error::Result;

/// 종목별 쓰기 락 맵.
type WriteLockMap = Arc<RwLock<HashMap<String, Arc<Mutex<()>>>>>;

/// CSV 저장소.
#[derive(Debug, Clone)]
pub struct CsvStorage {
    data_dir: PathBuf,
    write_locks: WriteLockMap,
}

impl CsvStorage {
    /// 저장 디렉토리를 만들고 저장소를 생성합니다.
    ///
    /// 디렉토리 생성에 실패해도 저장소는 반환되며, 이후 `store`가 실패합니다.
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        let data_dir = data_dir.as_ref().to_path_buf();
        if let Err(e) = fs::create_dir_all(&data_dir) {
            warn!(dir = %data_dir.display(), error = %e, "CSV 디렉토리 생성 실패");
        }
        Self {
            data_dir,
            write_locks: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// 종목별 파일 경로.
    pub fn file_path(&self, ticker: &str) -> PathBuf {
        self.data_dir.join(format!("{}_history.csv", ticker))
    }

    /// 저장된 시리즈 읽기 (파일이 없으면 빈 시리즈).
    pub fn load(&self, ticker: &str) -> Result<Series> {
        let path = self.file_path(ticker);
        if !path.exists() {
            return Ok(Series::empty());
        }
        read_series(&path)
    }

    /// 종목별 쓰기 락 (없으면 생성).
    async fn write_lock(&self, ticker: &str) -> Arc<Mutex<()>> {
        let locks = self.write_locks.read().await;
        if let Some(lock) = locks.get(ticker) {
            return lock.clone();
        }
        drop(locks);

        let mut locks = self.write_locks.write().await;
        locks
            .entry(ticker.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

#[async_trait]
impl StorageBackend for CsvStorage {
    fn name(&self) -> &str {
        "csv"
    }

    #[instrument(skip(self, series), fields(count = series.len()))]
    async fn store(&self, ticker: &str, series: &Series) -> bool {
        let cleaned = series.drop_incomplete();
        if cleaned.is_empty() {
            return true;
        }

        let count = cleaned.len();
        let path = self.file_path(ticker);

        let lock = self.write_lock(ticker).await;
        let _guard = lock.lock().await;
        let result = tokio::task::spawn_blocking(move || merge_into_file(&path, cleaned)).await;

        match result {
            Ok(Ok(total)) => {
                info!(symbol = ticker, stored = count, total = total, "CSV 저장 완료");
                true
            }
            Ok(Err(e)) => {
                error!(symbol = ticker, error = %e, "CSV 저장 실패");
                false
            }
            Err(e) => {
                error!(symbol = ticker, error = %e, "CSV 저장 작업 실패");
                false
            }
        }
    }

    fn is_available(&self) -> bool {
        true
    }
}

/// 기존 파일과 병합 후 덮어쓰기. 병합 결과 행 수를 반환.
fn merge_into_file(path: &Path, incoming: Series) -> Result<usize> {
    let combined = if path.exists() {
        let existing = read_series(path)?;
        Series::merge(existing, incoming)
    } else {
        incoming.normalized()
    };

    write_series(path, &combined)?;
    Ok(combined.len())
}

fn read_series(path: &Path) -> Result<Series> {
    let mut reader = ::csv::Reader::from_path(path)?;
    let bars = reader
        .deserialize::<Bar>()
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(Series::new(bars))
}

/// 같은 디렉토리의 임시 파일에 쓴 뒤 교체. 실패하면 임시 파일은 drop 시 삭제됩니다.
fn write_series(path: &Path, series: &Series) -> Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let tmp = tempfile::NamedTempFile::new_in(dir)?;
    {
        let mut writer = ::csv::Writer::from_writer(tmp.as_file());
        for bar in series {
            writer.serialize(bar)?;
        }
        writer.flush()?;
    }
    tmp.persist(path).map_err(io::Error::from)?;
    Ok(())
}
