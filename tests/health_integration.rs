//! Integration tests for the `/help` probe, health report and manual setup
//! against a mock downloader.

use jd_mobile_core::health::{CONNECTED_MESSAGE, MISSING_KEYWORDS_MESSAGE};
use jd_mobile_core::{
    ConfigManager, ManualSetup, SetupError, health_report, probe_help, run_manual_setup,
};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

mod support;
use support::socket_guard::start_mock_server_or_skip;

async fn mount_help(server: &MockServer, status: u16, body: &str) {
    Mock::given(method("GET"))
        .and(path("/help"))
        .respond_with(ResponseTemplate::new(status).set_body_string(body))
        .mount(server)
        .await;
}

fn manager_in(temp: &TempDir) -> ConfigManager {
    ConfigManager::new(temp.path().join("config").join("config.json"))
}

#[tokio::test]
async fn test_probe_connected_with_keywords() {
    let Some(mock_server) = start_mock_server_or_skip().await else {
        return;
    };
    mount_help(&mock_server, 200, "JDownloader API: /downloadsV2/queryPackages").await;

    let outcome = probe_help(&mock_server.uri(), 800).await;
    assert!(outcome.ok);
    assert_eq!(outcome.message, CONNECTED_MESSAGE);
}

#[tokio::test]
async fn test_probe_without_keywords_is_soft_success() {
    let Some(mock_server) = start_mock_server_or_skip().await else {
        return;
    };
    mount_help(&mock_server, 200, "<html>router login</html>").await;

    let outcome = probe_help(&format!("{}/", mock_server.uri()), 800).await;
    assert!(outcome.ok);
    assert_eq!(outcome.message, MISSING_KEYWORDS_MESSAGE);
}

#[tokio::test]
async fn test_probe_non_200_fails() {
    let Some(mock_server) = start_mock_server_or_skip().await else {
        return;
    };
    mount_help(&mock_server, 404, "").await;

    let outcome = probe_help(&mock_server.uri(), 800).await;
    assert!(!outcome.ok);
    assert_eq!(
        outcome.message,
        format!("HTTP 404 from {}/help", mock_server.uri())
    );
}

#[tokio::test]
async fn test_manual_setup_saves_usable_config() {
    let Some(mock_server) = start_mock_server_or_skip().await else {
        return;
    };
    mount_help(&mock_server, 200, "jdownloader").await;

    let temp = TempDir::new().unwrap();
    let manager = manager_in(&temp);
    assert!(manager.load().needs_setup);

    let setup = ManualSetup::new(&mock_server.uri(), 800, "Home");
    run_manual_setup(&manager, &setup).await.unwrap();

    let load = manager.load();
    assert!(load.ok, "errors: {:?}", load.error_messages());
    assert!(!load.needs_setup);
    assert_eq!(load.config["active_instance_id"], "primary");
    let instance = load.active_instance().unwrap();
    assert_eq!(instance["name"], "Home");
    assert_eq!(
        instance["providers"]["primary"]["base_url"],
        mock_server.uri().as_str()
    );

    let report = health_report(&manager, &load).await;
    assert_eq!(report.status_code(), 200);
    assert_eq!(report.message.as_deref(), Some(CONNECTED_MESSAGE));
    assert!(report.writable);
}

#[tokio::test]
async fn test_manual_setup_probe_failure_saves_nothing() {
    let Some(mock_server) = start_mock_server_or_skip().await else {
        return;
    };
    mount_help(&mock_server, 500, "").await;

    let temp = TempDir::new().unwrap();
    let manager = manager_in(&temp);
    let setup = ManualSetup::new(&mock_server.uri(), 800, "Home");

    let err = run_manual_setup(&manager, &setup).await.unwrap_err();
    assert!(matches!(err, SetupError::ConnectionFailed(_)));
    assert!(err.to_string().starts_with("Connection test failed: HTTP 500"));
    assert!(!manager.path().exists());
}

#[tokio::test]
async fn test_health_report_502_when_backend_down() {
    let Some(mock_server) = start_mock_server_or_skip().await else {
        return;
    };
    mount_help(&mock_server, 200, "jdownloader").await;

    let temp = TempDir::new().unwrap();
    let manager = manager_in(&temp);
    run_manual_setup(&manager, &ManualSetup::new(&mock_server.uri(), 300, ""))
        .await
        .unwrap();

    mock_server.reset().await;
    mount_help(&mock_server, 503, "").await;

    let load = manager.load();
    let report = health_report(&manager, &load).await;
    assert_eq!(report.status_code(), 502);
    assert!(!report.ok);
    assert_eq!(report.base_url.as_deref(), Some(mock_server.uri().as_str()));
}
