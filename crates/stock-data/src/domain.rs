//! 시세 도메인 타입.
//!
//! - [`Bar`]: 단일 OHLCV 관측값
//! - [`Series`]: 한 종목의 시간순 Bar 목록 (병합/정제 지원)
//! - [`Interval`]: 캔들 간격 (Yahoo Finance interval 문자열과 1:1 대응)
//! - [`FetchRequest`]: 상대 기간 또는 명시적 날짜 범위 조회 요청

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::DataError;

/// OHLCV 캔들 하나.
///
/// 데이터 소스가 결측값(null/NaN)을 내려줄 수 있으므로 가격은 `Option`입니다.
/// 하나라도 비어 있는 Bar는 "불완전" 상태이며 저장 전에 제거됩니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    /// 캔들 시작 시간
    pub timestamp: DateTime<Utc>,
    /// 시가
    pub open: Option<f64>,
    /// 고가
    pub high: Option<f64>,
    /// 저가
    pub low: Option<f64>,
    /// 종가
    pub close: Option<f64>,
    /// 거래량
    pub volume: u64,
}

impl Bar {
    /// 모든 가격이 채워진 Bar를 생성합니다.
    pub fn new(
        timestamp: DateTime<Utc>,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: u64,
    ) -> Self {
        Self {
            timestamp,
            open: Some(open),
            high: Some(high),
            low: Some(low),
            close: Some(close),
            volume,
        }
    }

    /// 시가/고가/저가/종가가 모두 유한한 값인지 확인.
    pub fn is_complete(&self) -> bool {
        [self.open, self.high, self.low, self.close]
            .iter()
            .all(|v| matches!(v, Some(x) if x.is_finite()))
    }
}

/// 한 종목의 시간순 Bar 목록.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Series {
    bars: Vec<Bar>,
}

impl Series {
    pub fn new(bars: Vec<Bar>) -> Self {
        Self { bars }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn into_bars(self) -> Vec<Bar> {
        self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Bar> {
        self.bars.iter()
    }

    pub fn first_timestamp(&self) -> Option<DateTime<Utc>> {
        self.bars.first().map(|b| b.timestamp)
    }

    pub fn last_timestamp(&self) -> Option<DateTime<Utc>> {
        self.bars.last().map(|b| b.timestamp)
    }

    /// 불완전한 Bar(가격 결측)를 제거한 사본 반환.
    pub fn drop_incomplete(&self) -> Series {
        Series::new(self.bars.iter().filter(|b| b.is_complete()).cloned().collect())
    }

    /// 기존 데이터와 새 데이터를 병합합니다.
    ///
    /// `existing` 뒤에 `incoming`을 이어붙이고 시간순으로 (안정) 정렬한 뒤,
    /// 같은 타임스탬프가 여러 개면 마지막에 나온 값만 남깁니다.
    /// 따라서 같은 시각에 대해서는 항상 새 데이터가 이깁니다.
    pub fn merge(existing: Series, incoming: Series) -> Series {
        let mut combined = existing.bars;
        combined.extend(incoming.bars);
        Series::new(combined).normalized()
    }

    /// 정렬 + 타임스탬프 중복 제거 (마지막 값 유지).
    pub fn normalized(self) -> Series {
        let mut bars = self.bars;
        bars.sort_by_key(|b| b.timestamp);

        let mut deduped: Vec<Bar> = Vec::with_capacity(bars.len());
        for bar in bars {
            match deduped.last_mut() {
                Some(last) if last.timestamp == bar.timestamp => *last = bar,
                _ => deduped.push(bar),
            }
        }

        Series::new(deduped)
    }
}

impl FromIterator<Bar> for Series {
    fn from_iter<I: IntoIterator<Item = Bar>>(iter: I) -> Self {
        Series::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Series {
    type Item = &'a Bar;
    type IntoIter = std::slice::Iter<'a, Bar>;

    fn into_iter(self) -> Self::IntoIter {
        self.bars.iter()
    }
}

/// 캔들 간격.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Interval {
    /// 1분
    Minute,
    /// 5분
    FiveMinutes,
    /// 15분
    FifteenMinutes,
    /// 30분
    ThirtyMinutes,
    /// 1시간
    Hour,
    /// 1일
    Day,
    /// 1주
    Week,
    /// 1개월
    Month,
}

impl Interval {
    /// Yahoo Finance interval 문자열.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Minute => "1m",
            Self::FiveMinutes => "5m",
            Self::FifteenMinutes => "15m",
            Self::ThirtyMinutes => "30m",
            Self::Hour => "1h",
            Self::Day => "1d",
            Self::Week => "1wk",
            Self::Month => "1mo",
        }
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Interval {
    type Err = DataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "1m" => Ok(Self::Minute),
            "5m" => Ok(Self::FiveMinutes),
            "15m" => Ok(Self::FifteenMinutes),
            "30m" => Ok(Self::ThirtyMinutes),
            "1h" | "60m" => Ok(Self::Hour),
            "1d" => Ok(Self::Day),
            "1wk" | "1w" => Ok(Self::Week),
            "1mo" => Ok(Self::Month),
            other => Err(DataError::ConfigError(format!("Invalid interval: {}", other))),
        }
    }
}

/// 시세 조회 요청.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchRequest {
    /// 상대 기간 조회 (예: range "1d", interval 1m)
    Period { range: String, interval: Interval },
    /// 명시적 날짜 범위 조회
    Range {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        interval: Interval,
    },
}

impl FetchRequest {
    pub fn period(range: impl Into<String>, interval: Interval) -> Self {
        Self::Period {
            range: range.into(),
            interval,
        }
    }

    pub fn range(start: DateTime<Utc>, end: DateTime<Utc>, interval: Interval) -> Self {
        Self::Range {
            start,
            end,
            interval,
        }
    }

    pub fn interval(&self) -> Interval {
        match self {
            Self::Period { interval, .. } | Self::Range { interval, .. } => *interval,
        }
    }
}

impl fmt::Display for FetchRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Period { range, interval } => write!(f, "{}@{}", range, interval),
            Self::Range {
                start,
                end,
                interval,
            } => write!(
                f,
                "{}~{}@{}",
                start.format("%Y-%m-%d"),
                end.format("%Y-%m-%d"),
                interval
            ),
        }
    }
}
