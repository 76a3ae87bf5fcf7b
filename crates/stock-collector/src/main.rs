//! 주식 시세 수집 데몬 CLI.

use clap::{Parser, Subcommand};
use std::future::IntoFuture;
use std::sync::Arc;
use stock_api::AppState;
use stock_collector::modules::{self, Collector};
use stock_collector::{CollectorConfig, CollectorError};
use stock_data::registry::normalize_symbol;
use stock_data::{
    assemble_backends, connect_time_series, BackfillOutcome, HistoricalBackfill, StockFetcher,
    TickerRegistry, YahooQuoteProvider, YahooSymbolSearch,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "stock-collector")]
#[command(about = "Stock price collector with InfluxDB/CSV storage", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// 로그 레벨 (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", global = true)]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// 데몬 모드: 주기적 폴링 + 관리 API 서버 (기본)
    Run,

    /// 등록된 전체 종목을 한 번만 수집
    CollectOnce,

    /// 특정 종목의 과거 데이터 백필 (포그라운드 실행)
    Backfill {
        /// 종목 심볼 (예: "005930.KS")
        #[arg(long)]
        symbol: String,

        /// 백필 기간 (년, 기본: BACKFILL_YEARS)
        #[arg(long)]
        years: Option<u32>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // 로깅 초기화
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "stock_collector={lvl},stock_data={lvl},stock_api={lvl}",
                    lvl = cli.log_level
                )
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Stock Collector 시작");

    // 설정 로드
    let config = CollectorConfig::from_env()?;
    tracing::debug!(
        storage_mode = %config.storage.mode,
        data_dir = %config.storage.data_dir.display(),
        "설정 로드 완료"
    );

    // 저장소 선택 (하나도 없으면 기동 중단)
    let influx = connect_time_series(&config.storage).await;
    let backends = assemble_backends(&config.storage, &influx);
    if backends.is_empty() {
        tracing::error!(mode = %config.storage.mode, "사용 가능한 저장소 백엔드가 없습니다");
        return Err(CollectorError::Config("no usable storage backend".to_string()).into());
    }

    let fetcher = StockFetcher::new(Arc::new(YahooQuoteProvider::new()?));
    let registry = Arc::new(TickerRegistry::open(
        &config.storage.data_dir,
        config.default_tickers.clone(),
    )?);
    // 백필은 시계열 저장소에만 기록 (CSV fallback 없음)
    let backfill = Arc::new(HistoricalBackfill::new(
        fetcher.clone(),
        influx,
        config.backfill.chunk_years,
    ));

    match cli.command.unwrap_or(Commands::Run) {
        Commands::CollectOnce => {
            let stats = modules::collect_cycle(
                &fetcher,
                &registry.symbols(),
                &backends,
                &config.poll.request(),
            )
            .await;
            stats.log_summary("OHLCV 수집");
        }
        Commands::Backfill { symbol, years } => {
            let symbol = normalize_symbol(&symbol)
                .ok_or_else(|| CollectorError::Config("symbol is required".to_string()))?;
            let years = years.unwrap_or(config.backfill.years);

            match backfill.run(&symbol, years).await {
                BackfillOutcome::Completed(report) => {
                    tracing::info!(
                        symbol = %report.symbol,
                        chunks = report.chunks_total,
                        failed = report.chunks_failed,
                        "백필 완료"
                    );
                }
                BackfillOutcome::Skipped => {
                    tracing::warn!(symbol = %symbol, "백필이 이미 진행 중입니다");
                }
                BackfillOutcome::Failed(message) => {
                    return Err(format!("백필 실패 ({}): {}", symbol, message).into());
                }
            }
        }
        Commands::Run => {
            let collector = Arc::new(Collector::new(
                fetcher,
                Arc::clone(&registry),
                backends.clone(),
                config.poll.request(),
            ));
            let state = Arc::new(AppState::new(
                registry,
                backfill,
                YahooSymbolSearch::new(),
                backends,
                config.backfill.years,
            ));

            run_daemon(&config, collector, state).await?;
        }
    }

    tracing::info!("Stock Collector 종료");

    Ok(())
}

/// 폴링 루프와 관리 API 서버를 함께 실행하고 Ctrl+C를 기다립니다.
async fn run_daemon(
    config: &CollectorConfig,
    collector: Arc<Collector>,
    state: Arc<AppState>,
) -> stock_collector::Result<()> {
    let addr = config.server.addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    let app = stock_api::create_router(state);

    tracing::info!(%addr, "관리 API 서버 시작");
    tracing::info!(
        "=== 데몬 모드 시작 (주기: {}초) ===",
        config.poll.interval_secs
    );

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("종료 신호 수신, 데몬 종료 중...");
        }
        _ = modules::run_poll_loop(collector, config.poll.interval()) => {}
        result = axum::serve(listener, app).into_future() => {
            if let Err(e) = result {
                return Err(CollectorError::Server(e.to_string()));
            }
        }
    }

    Ok(())
}
