//! Yahoo Finance 심볼 검색.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::error::{DataError, Result};

const DEFAULT_SEARCH_URL: &str = "https://query1.finance.yahoo.com/v1/finance/search";

/// 검색 결과 한 건.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolMatch {
    pub symbol: String,
    pub name: String,
    #[serde(rename = "exchDisp")]
    pub exch_disp: String,
}

/// Yahoo Finance 검색 API 클라이언트.
#[derive(Clone)]
pub struct YahooSymbolSearch {
    client: reqwest::Client,
    search_url: String,
}

impl YahooSymbolSearch {
    pub fn new() -> Self {
        Self::with_url(DEFAULT_SEARCH_URL)
    }

    /// 검색 엔드포인트를 지정하여 생성 (테스트용 mock 서버 등).
    pub fn with_url(search_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_default();
        Self {
            client,
            search_url: search_url.into(),
        }
    }

    /// 티커 또는 회사명으로 검색.
    pub async fn search(&self, query: &str, limit: usize) -> Result<Vec<SymbolMatch>> {
        #[derive(Deserialize)]
        struct SearchResponse {
            quotes: Option<Vec<SearchQuote>>,
        }

        #[derive(Deserialize)]
        struct SearchQuote {
            symbol: String,
            #[serde(default)]
            shortname: Option<String>,
            #[serde(default)]
            longname: Option<String>,
            #[serde(default, rename = "exchDisp")]
            exch_disp: Option<String>,
        }

        debug!(query = query, limit = limit, "Yahoo 심볼 검색");

        let limit_param = limit.to_string();
        let response = self
            .client
            .get(&self.search_url)
            .query(&[
                ("q", query),
                ("quotesCount", limit_param.as_str()),
                ("newsCount", "0"),
            ])
            .header("User-Agent", "Mozilla/5.0")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(DataError::Http(format!("검색 API 응답 오류: {}", status)));
        }

        let data: SearchResponse = response.json().await?;

        Ok(data
            .quotes
            .unwrap_or_default()
            .into_iter()
            .take(limit)
            .map(|q| SymbolMatch {
                name: q
                    .shortname
                    .or(q.longname)
                    .unwrap_or_else(|| q.symbol.clone()),
                symbol: q.symbol,
                exch_disp: q.exch_disp.unwrap_or_default(),
            })
            .collect())
    }
}

impl Default for YahooSymbolSearch {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_search_maps_quotes() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/search")
            .match_query(mockito::Matcher::UrlEncoded("q".into(), "apple".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"quotes":[
                    {"symbol":"AAPL","shortname":"Apple Inc.","exchDisp":"NASDAQ"},
                    {"symbol":"APLE","longname":"Apple Hospitality REIT"}
                ]}"#,
            )
            .create_async()
            .await;

        let search = YahooSymbolSearch::with_url(format!("{}/search", server.url()));
        let results = search.search("apple", 10).await.unwrap();

        mock.assert_async().await;
        assert_eq!(results.len(), 2);
        assert_eq!(
            results[0],
            SymbolMatch {
                symbol: "AAPL".to_string(),
                name: "Apple Inc.".to_string(),
                exch_disp: "NASDAQ".to_string(),
            }
        );
        assert_eq!(results[1].name, "Apple Hospitality REIT");
        assert_eq!(results[1].exch_disp, "");
    }

    #[tokio::test]
    async fn test_search_http_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/search")
            .match_query(mockito::Matcher::Any)
            .with_status(500)
            .create_async()
            .await;

        let search = YahooSymbolSearch::with_url(format!("{}/search", server.url()));
        assert!(search.search("apple", 10).await.is_err());
    }

    #[test]
    fn test_symbol_match_serializes_exch_disp() {
        let m = SymbolMatch {
            symbol: "005930.KS".to_string(),
            name: "Samsung".to_string(),
            exch_disp: "KSE".to_string(),
        };
        let json = serde_json::to_value(&m).unwrap();
        assert_eq!(json["exchDisp"], "KSE");
    }
}
