//! 애플리케이션 공유 상태.
//!
//! 모든 핸들러가 `Arc<AppState>`로 공유합니다.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use stock_data::{HistoricalBackfill, StorageBackend, TickerRegistry, YahooSymbolSearch};

/// 관리 API 공유 상태.
pub struct AppState {
    /// 추적 종목 레지스트리
    pub registry: Arc<TickerRegistry>,
    /// 과거 데이터 백필 코디네이터
    pub backfill: Arc<HistoricalBackfill>,
    /// 심볼 검색 클라이언트
    pub search: YahooSymbolSearch,
    /// 선택된 저장소 백엔드 (우선순위 순)
    pub backends: Vec<Arc<dyn StorageBackend>>,
    /// 요청에 기간이 없을 때 사용할 백필 기간 (년)
    pub default_backfill_years: u32,
    /// 버전
    pub version: String,
    /// 시작 시각
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(
        registry: Arc<TickerRegistry>,
        backfill: Arc<HistoricalBackfill>,
        search: YahooSymbolSearch,
        backends: Vec<Arc<dyn StorageBackend>>,
        default_backfill_years: u32,
    ) -> Self {
        Self {
            registry,
            backfill,
            search,
            backends,
            default_backfill_years,
            version: env!("CARGO_PKG_VERSION").to_string(),
            started_at: Utc::now(),
        }
    }

    /// 서버 업타임(초).
    pub fn uptime_secs(&self) -> i64 {
        (Utc::now() - self.started_at).num_seconds()
    }
}

/// 테스트용 AppState 생성 헬퍼.
///
/// 시세 Provider는 응답하지 않으므로 시작된 백필은 테스트가 끝날 때까지 진행 중으로 남습니다.
/// 폴링 저장소는 `data_dir` 아래 CSV, 백필 대상은 아무것도 기록하지 않는 시계열 저장소입니다.
/// 심볼 검색은 `search_url`(mock 서버 등)로 보냅니다.
#[cfg(any(test, feature = "test-utils"))]
pub fn create_test_state(data_dir: &std::path::Path, search_url: &str) -> AppState {
    use async_trait::async_trait;
    use stock_data::{
        CsvStorage, FetchRequest, QuoteProvider, Series, StockFetcher, TimeSeriesBackend,
    };

    struct PendingProvider;

    #[async_trait]
    impl QuoteProvider for PendingProvider {
        fn name(&self) -> &str {
            "pending"
        }

        async fn fetch_quotes(
            &self,
            _ticker: &str,
            _request: &FetchRequest,
        ) -> stock_data::Result<Series> {
            std::future::pending().await
        }
    }

    struct DiscardStore;

    #[async_trait]
    impl StorageBackend for DiscardStore {
        fn name(&self) -> &str {
            "discard"
        }

        async fn store(&self, _ticker: &str, _series: &Series) -> bool {
            true
        }

        fn is_available(&self) -> bool {
            true
        }
    }

    impl TimeSeriesBackend for DiscardStore {}

    let registry = TickerRegistry::open(data_dir, vec!["005930.KS".to_string()])
        .expect("Failed to open test registry");
    let csv: Arc<dyn StorageBackend> = Arc::new(CsvStorage::new(data_dir));
    let backfill = HistoricalBackfill::new(
        StockFetcher::new(Arc::new(PendingProvider)),
        Arc::new(DiscardStore),
        1,
    );

    AppState::new(
        Arc::new(registry),
        Arc::new(backfill),
        YahooSymbolSearch::with_url(search_url),
        vec![csv],
        5,
    )
}
