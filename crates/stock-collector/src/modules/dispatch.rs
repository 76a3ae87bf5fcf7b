//! 저장소 dispatch.
//!
//! 우선순위 순서로 백엔드를 시도하고, 처음으로 저장에 성공한 백엔드에서 멈춥니다.
//! 한 시리즈는 최대 한 백엔드에만 기록됩니다.

use std::sync::Arc;
use stock_data::{Series, StorageBackend};
use tracing::{debug, warn};

/// dispatch 결과.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// 저장 성공 (기록한 백엔드 이름)
    Stored { backend: String },
    /// 모든 백엔드 실패 (또는 백엔드 없음)
    Failed,
}

/// 시리즈를 첫 번째로 수락하는 백엔드에 저장.
///
/// 쓰기는 순차적으로만 시도합니다.
pub async fn dispatch(
    ticker: &str,
    series: &Series,
    backends: &[Arc<dyn StorageBackend>],
) -> DispatchOutcome {
    for backend in backends {
        if backend.store(ticker, series).await {
            debug!(symbol = ticker, backend = backend.name(), count = series.len(), "저장 완료");
            return DispatchOutcome::Stored {
                backend: backend.name().to_string(),
            };
        }
        debug!(symbol = ticker, backend = backend.name(), "저장 실패, 다음 백엔드 시도");
    }

    warn!(symbol = ticker, backends = backends.len(), "모든 저장소에 저장 실패");
    DispatchOutcome::Failed
}
