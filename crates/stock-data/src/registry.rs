//! 추적 종목 목록 (JSON 파일).
//!
//! `{data_dir}/tickers.json`에 `[{"symbol": "...", "name": "..."}]` 형태로 저장합니다.
//! 예전 형식(문자열 배열)도 읽을 수 있습니다.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{error, info};

use crate::error::Result;

/// 추적 종목 한 건.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickerEntry {
    pub symbol: String,
    pub name: String,
}

impl TickerEntry {
    fn from_symbol(symbol: &str) -> Self {
        Self {
            symbol: symbol.to_string(),
            name: symbol.to_string(),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StoredEntry {
    Legacy(String),
    Entry(TickerEntry),
}

impl From<StoredEntry> for TickerEntry {
    fn from(entry: StoredEntry) -> Self {
        match entry {
            StoredEntry::Legacy(symbol) => TickerEntry::from_symbol(&symbol),
            StoredEntry::Entry(entry) => entry,
        }
    }
}

/// 심볼 정규화 (공백 제거 + 대문자). 비어 있으면 `None`.
pub fn normalize_symbol(symbol: &str) -> Option<String> {
    let normalized = symbol.trim().to_uppercase();
    (!normalized.is_empty()).then_some(normalized)
}

/// 추적 종목 레지스트리.
pub struct TickerRegistry {
    path: PathBuf,
    defaults: Vec<String>,
    /// 파일 read-modify-write 직렬화
    lock: Mutex<()>,
}

impl TickerRegistry {
    /// 레지스트리를 열고, 파일이 없으면 기본 종목으로 생성합니다.
    pub fn open(data_dir: impl AsRef<Path>, defaults: Vec<String>) -> Result<Self> {
        let data_dir = data_dir.as_ref();
        fs::create_dir_all(data_dir)?;

        let registry = Self {
            path: data_dir.join("tickers.json"),
            defaults: defaults
                .iter()
                .filter_map(|s| normalize_symbol(s))
                .collect(),
            lock: Mutex::new(()),
        };

        if !registry.path.exists() {
            registry.write(&registry.default_entries())?;
            info!(path = %registry.path.display(), "종목 목록 파일 생성");
        }

        Ok(registry)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 전체 종목 목록. 파일을 읽지 못하면 기본 목록을 반환합니다.
    pub fn list(&self) -> Vec<TickerEntry> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        self.read_or_default()
    }

    /// 심볼만 반환.
    pub fn symbols(&self) -> Vec<String> {
        self.list().into_iter().map(|t| t.symbol).collect()
    }

    /// 종목 추가. 새로 추가되면 `true`, 이미 있거나 심볼이 비어 있으면 `false`.
    pub fn add(&self, symbol: &str, name: &str) -> Result<bool> {
        let Some(symbol) = normalize_symbol(symbol) else {
            return Ok(false);
        };

        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut tickers = self.read_or_default();
        if tickers.iter().any(|t| t.symbol == symbol) {
            return Ok(false);
        }

        let name = match name.trim() {
            "" => symbol.clone(),
            n => n.to_string(),
        };
        tickers.push(TickerEntry { symbol, name });
        self.write(&tickers)?;
        Ok(true)
    }

    /// 종목 삭제. 삭제되면 `true`.
    pub fn remove(&self, symbol: &str) -> Result<bool> {
        let Some(symbol) = normalize_symbol(symbol) else {
            return Ok(false);
        };

        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        let tickers = self.read_or_default();
        let before = tickers.len();
        let filtered: Vec<TickerEntry> =
            tickers.into_iter().filter(|t| t.symbol != symbol).collect();

        if filtered.len() == before {
            return Ok(false);
        }
        self.write(&filtered)?;
        Ok(true)
    }

    fn default_entries(&self) -> Vec<TickerEntry> {
        self.defaults
            .iter()
            .map(|s| TickerEntry::from_symbol(s))
            .collect()
    }

    fn read_or_default(&self) -> Vec<TickerEntry> {
        match self.read() {
            Ok(tickers) => tickers,
            Err(e) => {
                error!(path = %self.path.display(), error = %e, "종목 목록 읽기 실패, 기본 목록 사용");
                self.default_entries()
            }
        }
    }

    fn read(&self) -> Result<Vec<TickerEntry>> {
        let content = fs::read_to_string(&self.path)?;
        let stored: Vec<StoredEntry> = serde_json::from_str(&content)?;
        Ok(stored.into_iter().map(TickerEntry::from).collect())
    }

    fn write(&self, tickers: &[TickerEntry]) -> Result<()> {
        let content = serde_json::to_string_pretty(tickers)?;
        fs::write(&self.path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open(dir: &Path) -> TickerRegistry {
        TickerRegistry::open(dir, vec!["005930.ks".to_string(), "AAPL".to_string()]).unwrap()
    }

    #[test]
    fn test_seeds_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let registry = open(dir.path());

        assert!(registry.path().exists());
        assert_eq!(registry.symbols(), vec!["005930.KS", "AAPL"]);
        assert_eq!(registry.list()[1].name, "AAPL");
    }

    #[test]
    fn test_add_normalizes_and_dedups() {
        let dir = tempfile::tempdir().unwrap();
        let registry = open(dir.path());

        assert!(registry.add("  msft ", "Microsoft").unwrap());
        assert!(!registry.add("MSFT", "Microsoft Corp").unwrap());
        assert!(!registry.add("   ", "blank").unwrap());
        assert!(registry.add("tsla", "").unwrap());

        let list = registry.list();
        assert_eq!(list.len(), 4);
        assert_eq!(
            list[2],
            TickerEntry {
                symbol: "MSFT".to_string(),
                name: "Microsoft".to_string()
            }
        );
        assert_eq!(list[3].name, "TSLA");
    }

    #[test]
    fn test_remove() {
        let dir = tempfile::tempdir().unwrap();
        let registry = open(dir.path());

        assert!(registry.remove("aapl").unwrap());
        assert!(!registry.remove("AAPL").unwrap());
        assert_eq!(registry.symbols(), vec!["005930.KS"]);
    }

    #[test]
    fn test_reads_legacy_string_entries() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("tickers.json"),
            r#"["AAPL", {"symbol": "MSFT", "name": "Microsoft"}]"#,
        )
        .unwrap();
        let registry = open(dir.path());

        assert_eq!(
            registry.list(),
            vec![
                TickerEntry::from_symbol("AAPL"),
                TickerEntry {
                    symbol: "MSFT".to_string(),
                    name: "Microsoft".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_unreadable_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("tickers.json"), "{ not json").unwrap();
        let registry = open(dir.path());

        assert_eq!(registry.symbols(), vec!["005930.KS", "AAPL"]);
    }
}
