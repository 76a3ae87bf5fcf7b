//! 저장 모드별 백엔드 선택 통합 테스트.

use std::time::Duration;

use stock_data::{select_backends, InfluxConfig, StorageConfig, StorageMode};

fn config(mode: StorageMode, influx_url: &str, data_dir: &std::path::Path) -> StorageConfig {
    StorageConfig {
        mode,
        data_dir: data_dir.to_path_buf(),
        influx: InfluxConfig {
            url: influx_url.to_string(),
            token: "test-token".to_string(),
            org: "test-org".to_string(),
            bucket: "test-bucket".to_string(),
            timeout: Duration::from_millis(500),
        },
    }
}

/// 연결이 거부되는 주소.
const UNREACHABLE: &str = "http://127.0.0.1:1";

fn names(backends: &[std::sync::Arc<dyn stock_data::StorageBackend>]) -> Vec<String> {
    backends.iter().map(|b| b.name().to_string()).collect()
}

#[tokio::test]
async fn influx_mode_without_server_yields_no_backends() {
    let dir = tempfile::tempdir().unwrap();

    let backends = select_backends(&config(StorageMode::Influx, UNREACHABLE, dir.path())).await;

    assert!(backends.is_empty());
}

#[tokio::test]
async fn auto_mode_without_server_falls_back_to_csv() {
    let dir = tempfile::tempdir().unwrap();

    let backends = select_backends(&config(StorageMode::Auto, UNREACHABLE, dir.path())).await;

    assert_eq!(names(&backends), vec!["csv"]);
    assert!(backends[0].is_available());
}

#[tokio::test]
async fn auto_mode_with_server_orders_influx_first() {
    let mut server = mockito::Server::new_async().await;
    server.mock("GET", "/ping").with_status(204).create_async().await;
    let dir = tempfile::tempdir().unwrap();

    let backends = select_backends(&config(StorageMode::Auto, &server.url(), dir.path())).await;

    assert_eq!(names(&backends), vec!["influxdb", "csv"]);
}

#[tokio::test]
async fn csv_mode_never_contacts_influx() {
    let mut server = mockito::Server::new_async().await;
    let ping = server
        .mock("GET", "/ping")
        .with_status(204)
        .expect(0)
        .create_async()
        .await;
    let dir = tempfile::tempdir().unwrap();

    let backends = select_backends(&config(StorageMode::Csv, &server.url(), dir.path())).await;

    assert_eq!(names(&backends), vec!["csv"]);
    ping.assert_async().await;
}
