//! 과거 데이터 백필 코디네이터.
//!
//! # 동작 흐름
//!
//! ```text
//! run(symbol, years)
//!         │
//!         ▼
//! ┌─────────────────────┐
//! │ 1. 진행 중 점유      │ ← 이미 진행 중이면 Skipped (대기열 없음)
//! └─────────┬───────────┘
//!           │
//! ┌─────────▼───────────┐
//! │ 2. 청크 계획         │ ← now - years*365일 ~ now, chunk_years 단위
//! └─────────┬───────────┘
//!           │
//! ┌─────────▼───────────┐
//! │ 3. 청크별 일봉 조회  │ ← 빈 청크는 건너뜀 (상장 이전 등)
//! │    → 시계열 저장소   │
//! └─────────┬───────────┘
//!           │
//! ┌─────────▼───────────┐
//! │ 4. 최근 7일 1분봉    │ ← 청크 결과와 무관하게 항상 조회
//! └─────────┬───────────┘
//!           │
//!           ▼
//!     점유 해제 (guard drop)
//! ```
//!
//! 백필은 CSV fallback 없이 시계열 저장소에만 기록합니다.
//! 시계열 저장소가 사용 불가면 조회 없이 `Failed`로 끝납니다.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

use super::in_flight::{InFlight, InFlightGuard};
use crate::domain::{FetchRequest, Interval, Series};
use crate::error::{DataError, Result};
use crate::provider::StockFetcher;
use crate::storage::{StorageBackend, TimeSeriesBackend};

/// 1년 = 365일로 계산.
const DAYS_PER_YEAR: i64 = 365;

/// 고해상도 꼬리 구간 (Yahoo 1분봉 조회 한도 내).
const TAIL_RANGE: &str = "7d";

/// 백필 청크 하나의 구간.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChunkWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// 백필 결과 요약.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BackfillReport {
    pub symbol: String,
    /// 계획된 청크 수
    pub chunks_total: usize,
    /// 저장 성공 청크 수
    pub chunks_stored: usize,
    /// 데이터 없는 청크 수
    pub chunks_empty: usize,
    /// 저장 실패 청크 수
    pub chunks_failed: usize,
    /// 일봉 저장 건수
    pub daily_bars: usize,
    /// 1분봉 저장 건수
    pub tail_bars: usize,
}

/// 백필 실행 결과.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackfillOutcome {
    /// 같은 심볼 백필이 이미 진행 중이라 요청을 버림
    Skipped,
    /// 완료 (일부 청크 실패 포함 가능)
    Completed(BackfillReport),
    /// 중간 오류로 나머지 단계 중단
    Failed(String),
}

/// 백필 청크 계획.
///
/// `now - years*365일`부터 `chunk_years*365일` 단위로 나누고
/// 마지막 청크는 정확히 `now`에서 끝납니다. `chunk_years == 0`은 1로 취급합니다.
pub fn plan_chunks(now: DateTime<Utc>, years: u32, chunk_years: u32) -> Result<Vec<ChunkWindow>> {
    let span = years_to_duration(years)?;
    let step = years_to_duration(chunk_years.max(1))?;

    let mut start = now
        .checked_sub_signed(span)
        .ok_or_else(|| DataError::InvalidData(format!("백필 기간이 너무 깁니다: {}년", years)))?;

    let mut chunks = Vec::new();
    while start < now {
        let end = start
            .checked_add_signed(step)
            .map_or(now, |candidate| candidate.min(now));
        chunks.push(ChunkWindow { start, end });
        start = end;
    }

    Ok(chunks)
}

fn years_to_duration(years: u32) -> Result<Duration> {
    Duration::try_days(i64::from(years) * DAYS_PER_YEAR)
        .ok_or_else(|| DataError::InvalidData(format!("기간 범위 초과: {}년", years)))
}

/// 과거 데이터 백필 코디네이터.
pub struct HistoricalBackfill {
    fetcher: StockFetcher,
    target: Arc<dyn TimeSeriesBackend>,
    chunk_years: u32,
    in_flight: Arc<InFlight>,
}

impl HistoricalBackfill {
    pub fn new(
        fetcher: StockFetcher,
        target: Arc<dyn TimeSeriesBackend>,
        chunk_years: u32,
    ) -> Self {
        Self {
            fetcher,
            target,
            chunk_years: chunk_years.max(1),
            in_flight: InFlight::new(),
        }
    }

    pub fn is_in_progress(&self, symbol: &str) -> bool {
        self.in_flight.contains(symbol)
    }

    /// 진행 중인 백필 (심볼, 시작 시각).
    pub fn in_progress(&self) -> Vec<(String, DateTime<Utc>)> {
        self.in_flight.snapshot()
    }

    /// 백그라운드 task로 백필 시작.
    ///
    /// 점유는 task 생성 전에 잡습니다. 이미 진행 중인 심볼이면
    /// 아무것도 하지 않고 `false`를 반환합니다.
    pub fn spawn(self: &Arc<Self>, symbol: &str, years: u32) -> bool {
        let Some(guard) = self.in_flight.try_acquire(symbol) else {
            debug!(symbol = symbol, "백필 진행 중, 요청 무시");
            return false;
        };

        let this = Arc::clone(self);
        tokio::spawn(async move {
            this.run_acquired(guard, years).await;
        });
        true
    }

    /// 백필 실행. 오류는 로그로 남기고 결과로만 반환합니다.
    pub async fn run(&self, symbol: &str, years: u32) -> BackfillOutcome {
        let Some(guard) = self.in_flight.try_acquire(symbol) else {
            debug!(symbol = symbol, "백필 진행 중, 중복 요청 무시");
            return BackfillOutcome::Skipped;
        };
        self.run_acquired(guard, years).await
    }

    #[instrument(skip(self, guard), fields(symbol = guard.symbol()))]
    async fn run_acquired(&self, guard: InFlightGuard, years: u32) -> BackfillOutcome {
        let symbol = guard.symbol();

        info!(
            symbol = symbol,
            years = years,
            chunk_years = self.chunk_years,
            target = self.target.name(),
            "과거 데이터 백필 시작"
        );

        match self.execute(symbol, years, Utc::now()).await {
            Ok(report) => {
                info!(
                    symbol = symbol,
                    chunks = report.chunks_total,
                    stored = report.chunks_stored,
                    empty = report.chunks_empty,
                    failed = report.chunks_failed,
                    daily_bars = report.daily_bars,
                    tail_bars = report.tail_bars,
                    "과거 데이터 백필 완료"
                );
                BackfillOutcome::Completed(report)
            }
            Err(e) => {
                error!(symbol = symbol, error = %e, "과거 데이터 백필 실패");
                BackfillOutcome::Failed(e.to_string())
            }
        }
    }

    async fn execute(&self, symbol: &str, years: u32, now: DateTime<Utc>) -> Result<BackfillReport> {
        if !self.target.is_available() {
            return Err(DataError::StorageUnavailable(format!(
                "시계열 저장소({})에 연결되어 있지 않습니다",
                self.target.name()
            )));
        }

        let chunks = plan_chunks(now, years, self.chunk_years)?;
        let mut report = BackfillReport {
            symbol: symbol.to_string(),
            chunks_total: chunks.len(),
            ..Default::default()
        };

        for (idx, chunk) in chunks.iter().enumerate() {
            debug!(
                symbol = symbol,
                progress = %format!("{}/{}", idx + 1, chunks.len()),
                start = %chunk.start.format("%Y-%m-%d"),
                end = %chunk.end.format("%Y-%m-%d"),
                "청크 조회"
            );

            let request = FetchRequest::range(chunk.start, chunk.end, Interval::Day);
            let Some(series) = self.fetcher.fetch(symbol, &request).await else {
                report.chunks_empty += 1;
                continue;
            };

            if self.write(symbol, &series).await {
                report.chunks_stored += 1;
                report.daily_bars += series.len();
            } else {
                report.chunks_failed += 1;
            }
        }

        let tail_request = FetchRequest::period(TAIL_RANGE, Interval::Minute);
        if let Some(series) = self.fetcher.fetch(symbol, &tail_request).await {
            if self.write(symbol, &series).await {
                report.tail_bars = series.len();
            }
        }

        Ok(report)
    }

    async fn write(&self, symbol: &str, series: &Series) -> bool {
        let stored = self.target.store(symbol, series).await;
        if !stored {
            warn!(
                symbol = symbol,
                target = self.target.name(),
                count = series.len(),
                "백필 데이터 저장 실패"
            );
        }
        stored
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Bar;
    use crate::provider::QuoteProvider;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tokio::sync::Semaphore;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 30, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_plan_five_one_year_chunks() {
        let chunks = plan_chunks(now(), 5, 1).unwrap();

        assert_eq!(chunks.len(), 5);
        assert_eq!(chunks[0].start, now() - Duration::days(5 * 365));
        assert_eq!(chunks.last().unwrap().end, now());
        for pair in chunks.windows(2) {
            assert_eq!(pair[0].end, pair[1].start);
        }
    }

    #[test]
    fn test_plan_last_chunk_is_clamped() {
        let chunks = plan_chunks(now(), 5, 2).unwrap();

        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[2].end - chunks[2].start, Duration::days(365));
        assert_eq!(chunks[2].end, now());
    }

    #[test]
    fn test_plan_edge_cases() {
        assert!(plan_chunks(now(), 0, 1).unwrap().is_empty());
        assert_eq!(plan_chunks(now(), 3, 0).unwrap().len(), 3);
        assert!(plan_chunks(now(), u32::MAX, 1).is_err());
    }

    /// 호출 기록 + 선택적 게이트가 있는 mock provider.
    struct RecordingProvider {
        calls: Mutex<Vec<FetchRequest>>,
        gate: Option<Arc<Semaphore>>,
        empty_daily: bool,
    }

    impl RecordingProvider {
        fn new(gate: Option<Arc<Semaphore>>, empty_daily: bool) -> Arc<Self> {
            Arc::new(Self {
                calls: Mutex::new(Vec::new()),
                gate,
                empty_daily,
            })
        }

        fn calls(&self) -> Vec<FetchRequest> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl QuoteProvider for RecordingProvider {
        fn name(&self) -> &str {
            "recording"
        }

        async fn fetch_quotes(&self, _ticker: &str, request: &FetchRequest) -> Result<Series> {
            self.calls.lock().unwrap().push(request.clone());
            if let Some(gate) = &self.gate {
                let _permit = gate.acquire().await.unwrap();
            }

            let ts = match request {
                FetchRequest::Range { start, .. } => *start,
                FetchRequest::Period { .. } => now(),
            };
            if self.empty_daily && request.interval() == Interval::Day {
                return Ok(Series::empty());
            }
            Ok(Series::new(vec![Bar::new(ts, 1.0, 2.0, 0.5, 1.5, 10)]))
        }
    }

    #[derive(Default)]
    struct CountingBackend {
        stores: AtomicUsize,
    }

    #[async_trait]
    impl StorageBackend for CountingBackend {
        fn name(&self) -> &str {
            "counting"
        }

        async fn store(&self, _ticker: &str, _series: &Series) -> bool {
            self.stores.fetch_add(1, Ordering::SeqCst);
            true
        }

        fn is_available(&self) -> bool {
            true
        }
    }

    impl TimeSeriesBackend for CountingBackend {}

    fn coordinator(
        provider: Arc<RecordingProvider>,
        backend: Arc<CountingBackend>,
    ) -> HistoricalBackfill {
        HistoricalBackfill::new(StockFetcher::new(provider), backend, 1)
    }

    #[tokio::test]
    async fn test_run_fetches_chunks_then_tail() {
        let provider = RecordingProvider::new(None, false);
        let backend = Arc::new(CountingBackend::default());
        let backfill = coordinator(provider.clone(), backend.clone());

        let outcome = backfill.run("AAPL", 3).await;

        let BackfillOutcome::Completed(report) = outcome else {
            panic!("expected completed backfill");
        };
        assert_eq!(report.chunks_total, 3);
        assert_eq!(report.chunks_stored, 3);
        assert_eq!(report.tail_bars, 1);
        assert_eq!(backend.stores.load(Ordering::SeqCst), 4);

        let calls = provider.calls();
        assert_eq!(calls.len(), 4);
        assert!(calls[..3].iter().all(|r| r.interval() == Interval::Day));
        assert_eq!(calls[3], FetchRequest::period("7d", Interval::Minute));
        assert!(!backfill.is_in_progress("AAPL"));
    }

    #[tokio::test]
    async fn test_empty_chunks_skipped_and_tail_still_fetched() {
        let provider = RecordingProvider::new(None, true);
        let backend = Arc::new(CountingBackend::default());
        let backfill = coordinator(provider.clone(), backend.clone());

        let BackfillOutcome::Completed(report) = backfill.run("NEWCO", 2).await else {
            panic!("expected completed backfill");
        };
        assert_eq!(report.chunks_empty, 2);
        assert_eq!(report.chunks_stored, 0);
        assert_eq!(report.tail_bars, 1);
        assert_eq!(backend.stores.load(Ordering::SeqCst), 1);
        assert_eq!(provider.calls().len(), 3);
    }

    #[tokio::test]
    async fn test_concurrent_runs_execute_once() {
        let gate = Arc::new(Semaphore::new(0));
        let provider = RecordingProvider::new(Some(gate.clone()), false);
        let backend = Arc::new(CountingBackend::default());
        let backfill = coordinator(provider.clone(), backend.clone());

        let (first, second) = tokio::join!(backfill.run("AAPL", 2), async {
            let outcome = backfill.run("AAPL", 2).await;
            gate.add_permits(1);
            outcome
        });

        assert!(matches!(first, BackfillOutcome::Completed(_)));
        assert_eq!(second, BackfillOutcome::Skipped);
        assert_eq!(provider.calls().len(), 3);
        assert_eq!(backend.stores.load(Ordering::SeqCst), 3);
        assert!(backfill.in_progress().is_empty());
    }

    #[tokio::test]
    async fn test_runs_again_after_completion() {
        let provider = RecordingProvider::new(None, false);
        let backend = Arc::new(CountingBackend::default());
        let backfill = coordinator(provider.clone(), backend);

        assert!(matches!(backfill.run("AAPL", 1).await, BackfillOutcome::Completed(_)));
        assert!(matches!(backfill.run("AAPL", 1).await, BackfillOutcome::Completed(_)));
        assert_eq!(provider.calls().len(), 4);
    }

    #[tokio::test]
    async fn test_invalid_window_fails_and_releases() {
        let provider = RecordingProvider::new(None, false);
        let backend = Arc::new(CountingBackend::default());
        let backfill = coordinator(provider.clone(), backend);

        assert!(matches!(backfill.run("AAPL", u32::MAX).await, BackfillOutcome::Failed(_)));
        assert!(provider.calls().is_empty());
        assert!(!backfill.is_in_progress("AAPL"));
    }

    #[tokio::test]
    async fn test_spawn_rejects_in_progress_symbol() {
        let gate = Arc::new(Semaphore::new(0));
        let provider = RecordingProvider::new(Some(gate.clone()), false);
        let backend = Arc::new(CountingBackend::default());
        let backfill = Arc::new(coordinator(provider.clone(), backend));

        assert!(backfill.spawn("AAPL", 1));
        assert!(backfill.is_in_progress("AAPL"));
        assert!(!backfill.spawn("AAPL", 1));
        assert!(backfill.spawn("MSFT", 1));
        assert_eq!(backfill.in_progress().len(), 2);
    }
}
