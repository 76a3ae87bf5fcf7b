//! 심볼별 진행 중 표시 (single-flight).

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// 진행 중인 심볼 → 시작 시각.
///
/// 하나의 Mutex로 보호되며 `.await` 동안에는 잡지 않습니다.
#[derive(Debug, Default)]
pub struct InFlight {
    inner: Mutex<HashMap<String, DateTime<Utc>>>,
}

impl InFlight {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// 심볼 점유 시도. 이미 진행 중이면 `None`.
    ///
    /// 반환된 guard가 drop될 때 (정상 종료, 오류, panic 모두) 점유가 해제됩니다.
    pub fn try_acquire(self: &Arc<Self>, symbol: &str) -> Option<InFlightGuard> {
        let mut map = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        if map.contains_key(symbol) {
            return None;
        }
        map.insert(symbol.to_string(), Utc::now());

        Some(InFlightGuard {
            owner: Arc::clone(self),
            symbol: symbol.to_string(),
        })
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains_key(symbol)
    }

    /// 진행 중 목록 (시작 시각 순).
    pub fn snapshot(&self) -> Vec<(String, DateTime<Utc>)> {
        let map = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let mut entries: Vec<_> = map.iter().map(|(s, t)| (s.clone(), *t)).collect();
        entries.sort_by_key(|(_, t)| *t);
        entries
    }

    fn release(&self, symbol: &str) {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(symbol);
    }
}

/// 점유 해제 guard.
#[derive(Debug)]
pub struct InFlightGuard {
    owner: Arc<InFlight>,
    symbol: String,
}

impl InFlightGuard {
    pub fn symbol(&self) -> &str {
        &self.symbol
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.owner.release(&self.symbol);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_acquire_rejected_until_release() {
        let in_flight = InFlight::new();

        let guard = in_flight.try_acquire("AAPL").unwrap();
        assert!(in_flight.try_acquire("AAPL").is_none());
        assert!(in_flight.try_acquire("MSFT").is_some());
        assert!(in_flight.contains("AAPL"));

        drop(guard);
        assert!(!in_flight.contains("AAPL"));
        assert!(in_flight.try_acquire("AAPL").is_some());
    }

    #[test]
    fn test_released_on_panic() {
        let in_flight = InFlight::new();
        let cloned = Arc::clone(&in_flight);

        let result = std::panic::catch_unwind(move || {
            let _guard = cloned.try_acquire("PANIC").unwrap();
            panic!("backfill exploded");
        });

        assert!(result.is_err());
        assert!(!in_flight.contains("PANIC"));
    }

    #[test]
    fn test_snapshot() {
        let in_flight = InFlight::new();
        let _a = in_flight.try_acquire("A").unwrap();
        let _b = in_flight.try_acquire("B").unwrap();

        let symbols: Vec<String> = in_flight.snapshot().into_iter().map(|(s, _)| s).collect();
        assert_eq!(symbols.len(), 2);
        assert!(symbols.contains(&"A".to_string()));
    }
}
