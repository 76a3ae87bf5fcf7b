//! OHLCV 폴링 수집 모듈.

use std::sync::Arc;
use std::time::{Duration, Instant};
use stock_data::{FetchRequest, StockFetcher, StorageBackend, TickerRegistry};

use super::dispatch::{dispatch, DispatchOutcome};
use crate::CollectionStats;

/// 한 사이클 수집: 종목별 조회 후 저장소 dispatch.
///
/// 한 종목의 실패가 사이클 전체를 중단시키지 않습니다.
pub async fn collect_cycle(
    fetcher: &StockFetcher,
    symbols: &[String],
    backends: &[Arc<dyn StorageBackend>],
    request: &FetchRequest,
) -> CollectionStats {
    let start = Instant::now();
    let mut stats = CollectionStats::new();

    if symbols.is_empty() {
        tracing::warn!("수집할 심볼이 없습니다");
        return stats;
    }

    for (idx, symbol) in symbols.iter().enumerate() {
        stats.total += 1;

        tracing::debug!(
            symbol = symbol,
            progress = %format!("{}/{}", idx + 1, symbols.len()),
            "수집 시작"
        );

        let Some(series) = fetcher.fetch(symbol, request).await else {
            stats.empty += 1;
            continue;
        };

        match dispatch(symbol, &series, backends).await {
            DispatchOutcome::Stored { backend } => {
                stats.success += 1;
                stats.total_bars += series.len();
                tracing::info!(symbol = symbol, bars = series.len(), backend = %backend, "수집 및 저장 완료");
            }
            DispatchOutcome::Failed => {
                stats.errors += 1;
            }
        }
    }

    stats.elapsed = start.elapsed();
    stats
}

/// 폴링 수집기.
///
/// 매 사이클마다 레지스트리에서 종목 목록을 다시 읽으므로
/// 관리 API로 추가/삭제한 종목이 다음 사이클부터 반영됩니다.
pub struct Collector {
    fetcher: StockFetcher,
    registry: Arc<TickerRegistry>,
    backends: Vec<Arc<dyn StorageBackend>>,
    request: FetchRequest,
}

impl Collector {
    pub fn new(
        fetcher: StockFetcher,
        registry: Arc<TickerRegistry>,
        backends: Vec<Arc<dyn StorageBackend>>,
        request: FetchRequest,
    ) -> Self {
        Self {
            fetcher,
            registry,
            backends,
            request,
        }
    }

    /// 현재 등록된 전체 종목으로 한 사이클 실행.
    pub async fn run_cycle(&self) -> CollectionStats {
        let symbols = self.registry.symbols();
        tracing::info!(symbols = symbols.len(), request = %self.request, "폴링 사이클 시작");
        collect_cycle(&self.fetcher, &symbols, &self.backends, &self.request).await
    }
}

/// 폴링 루프: 사이클 실행 후 고정 간격 대기.
///
/// 사이클은 별도 task로 실행되며, task가 panic해도 로그만 남기고
/// 같은 간격 뒤에 다음 사이클을 시작합니다.
pub async fn run_poll_loop(collector: Arc<Collector>, interval: Duration) {
    tracing::info!(interval_secs = interval.as_secs(), "=== 폴링 루프 시작 ===");

    loop {
        let cycle = Arc::clone(&collector);
        match tokio::spawn(async move { cycle.run_cycle().await }).await {
            Ok(stats) => stats.log_summary("OHLCV 폴링"),
            Err(e) => tracing::error!(error = %e, "폴링 사이클 실패"),
        }

        tracing::debug!(interval_secs = interval.as_secs(), "다음 사이클 대기");
        tokio::time::sleep(interval).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use stock_data::{Bar, DataError, Interval, QuoteProvider, Series};

    /// "EMPTY"는 빈 응답, "DOWN"은 오류, 나머지는 Bar 2개.
    struct ScriptedProvider;

    #[async_trait]
    impl QuoteProvider for ScriptedProvider {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn fetch_quotes(
            &self,
            ticker: &str,
            _request: &FetchRequest,
        ) -> stock_data::Result<Series> {
            match ticker {
                "EMPTY" => Ok(Series::empty()),
                "DOWN" => Err(DataError::FetchError("timeout".to_string())),
                _ => {
                    let now = Utc::now();
                    Ok(Series::new(vec![
                        Bar::new(now - chrono::Duration::minutes(1), 1.0, 2.0, 0.5, 1.5, 10),
                        Bar::new(now, 1.5, 2.5, 1.0, 2.0, 20),
                    ]))
                }
            }
        }
    }

    #[derive(Default)]
    struct RecordingBackend {
        accept: bool,
        stored: Mutex<Vec<String>>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl StorageBackend for RecordingBackend {
        fn name(&self) -> &str {
            "recording"
        }

        async fn store(&self, ticker: &str, _series: &Series) -> bool {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.accept {
                self.stored.lock().unwrap().push(ticker.to_string());
            }
            self.accept
        }

        fn is_available(&self) -> bool {
            true
        }
    }

    fn symbols(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_no_data_skips_store_and_continues() {
        let fetcher = StockFetcher::new(Arc::new(ScriptedProvider));
        let backend = Arc::new(RecordingBackend {
            accept: true,
            ..Default::default()
        });
        let backends: Vec<Arc<dyn StorageBackend>> = vec![backend.clone()];

        let stats = collect_cycle(
            &fetcher,
            &symbols(&["EMPTY", "DOWN", "AAPL"]),
            &backends,
            &FetchRequest::period("1d", Interval::Minute),
        )
        .await;

        assert_eq!(stats.total, 3);
        assert_eq!(stats.empty, 2);
        assert_eq!(stats.success, 1);
        assert_eq!(stats.total_bars, 2);
        assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
        assert_eq!(*backend.stored.lock().unwrap(), vec!["AAPL".to_string()]);
    }

    #[tokio::test]
    async fn test_rejected_store_counts_error() {
        let fetcher = StockFetcher::new(Arc::new(ScriptedProvider));
        let backend = Arc::new(RecordingBackend::default());
        let backends: Vec<Arc<dyn StorageBackend>> = vec![backend.clone()];

        let stats = collect_cycle(
            &fetcher,
            &symbols(&["AAPL", "MSFT"]),
            &backends,
            &FetchRequest::period("1d", Interval::Minute),
        )
        .await;

        assert_eq!(stats.errors, 2);
        assert_eq!(stats.success, 0);
        assert_eq!(backend.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_collector_reads_registry_each_cycle() {
        let dir = tempfile::tempdir().unwrap();
        let registry = Arc::new(TickerRegistry::open(dir.path(), symbols(&["AAPL"])).unwrap());
        let backend = Arc::new(RecordingBackend {
            accept: true,
            ..Default::default()
        });
        let backends: Vec<Arc<dyn StorageBackend>> = vec![backend.clone()];
        let collector = Collector::new(
            StockFetcher::new(Arc::new(ScriptedProvider)),
            registry.clone(),
            backends,
            FetchRequest::period("1d", Interval::Minute),
        );

        assert_eq!(collector.run_cycle().await.success, 1);

        registry.add("MSFT", "Microsoft").unwrap();
        assert_eq!(collector.run_cycle().await.success, 2);
        assert_eq!(backend.stored.lock().unwrap().len(), 3);
    }
}
