//! Integration tests for the relay pipeline.
//!
//! The provider API, the archive host and the webhook are served by one
//! wiremock server; SFTP is replaced by an in-memory session.

use std::io::{Cursor, Write};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use chrono::NaiveDate;
use notfis_relay::{
    run_with_notification, ApiConfig, AppConfig, Credentials, DateRange, NotifierConfig,
    RelayError, RemoteStore, SessionConnector, SftpConfig,
};
use serde_json::{json, Value};
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};
use zip::write::FileOptions;
use zip::ZipWriter;

const BASE_PATH: &str = "/client67224/RODONAVES/NOTFIS";

#[derive(Clone, Default)]
struct RecordingConnector {
    writes: Arc<Mutex<Vec<(String, Vec<u8>)>>>,
    connects: Arc<AtomicUsize>,
    closes: Arc<AtomicUsize>,
    fail_writes: bool,
}

struct RecordingSession {
    writes: Arc<Mutex<Vec<(String, Vec<u8>)>>>,
    closes: Arc<AtomicUsize>,
    fail_writes: bool,
}

impl RemoteStore for RecordingSession {
    fn write_file(&mut self, path: &str, content: &[u8]) -> Result<(), RelayError> {
        if self.fail_writes {
            return Err(RelayError::Transfer {
                context: format!("failed to write remote file {}", path),
                source: std::io::Error::new(std::io::ErrorKind::BrokenPipe, "connection reset"),
            });
        }
        self.writes
            .lock()
            .unwrap()
            .push((path.to_string(), content.to_vec()));
        Ok(())
    }
}

impl Drop for RecordingSession {
    fn drop(&mut self) {
        self.closes.fetch_add(1, Ordering::SeqCst);
    }
}

impl SessionConnector for RecordingConnector {
    type Session = RecordingSession;

    fn connect(&self, _config: &SftpConfig) -> Result<RecordingSession, RelayError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        Ok(RecordingSession {
            writes: Arc::clone(&self.writes),
            closes: Arc::clone(&self.closes),
            fail_writes: self.fail_writes,
        })
    }
}

fn build_zip(members: &[(&str, &str)]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, content) in members {
        writer.start_file(*name, FileOptions::default()).unwrap();
        writer.write_all(content.as_bytes()).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

fn range() -> DateRange {
    DateRange::new(
        NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
        NaiveDate::from_ymd_opt(2024, 5, 2).unwrap(),
    )
    .unwrap()
}

fn config_for(server: &MockServer, webhook: bool) -> AppConfig {
    AppConfig {
        api: ApiConfig {
            graphql_url: format!("{}/graphql", server.uri()),
            ..ApiConfig::default()
        },
        credentials: Credentials::new("ops@example.com", "secret"),
        sftp: SftpConfig {
            username: "relay".to_string(),
            password: "sftp-secret".to_string(),
            ..SftpConfig::default()
        },
        notifier: NotifierConfig::new(webhook.then(|| format!("{}/hook", server.uri()))),
        ..AppConfig::default()
    }
}

async fn mount_provider(server: &MockServer, archive: ResponseTemplate) {
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .and(body_string_contains("login("))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"login": {"authf2": false, "user": {"token": "t", "access_token": "abc123"}}}
        })))
        .expect(1)
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/graphql"))
        .and(body_string_contains("generatePslBatchDownloadUrl"))
        .and(header("authorization", "Bearer abc123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"generatePslBatchDownloadUrl": {"download_url": format!("{}/file.zip", server.uri())}}
        })))
        .expect(1)
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/file.zip"))
        .respond_with(archive)
        .expect(1)
        .mount(server)
        .await;
}

async fn mount_webhook(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/hook"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(server)
        .await;
}

async fn webhook_texts(server: &MockServer) -> Vec<String> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .into_iter()
        .filter(|request| request.url.path() == "/hook")
        .map(|request| {
            let body: Value = serde_json::from_slice(&request.body).unwrap();
            body["text"].as_str().unwrap().to_string()
        })
        .collect()
}

#[tokio::test]
async fn test_end_to_end_relays_dated_file_and_notifies() {
    let server = MockServer::start().await;
    let archive = build_zip(&[("A.txt", "hello")]);
    mount_provider(
        &server,
        ResponseTemplate::new(200).set_body_raw(archive, "application/zip"),
    )
    .await;
    mount_webhook(&server).await;

    let connector = RecordingConnector::default();
    let report = run_with_notification(&config_for(&server, true), &range(), connector.clone())
        .await
        .unwrap();

    let writes = connector.writes.lock().unwrap().clone();
    assert_eq!(
        writes,
        vec![(format!("{}/A-2024-05-02.txt", BASE_PATH), b"hello".to_vec())]
    );
    assert_eq!(report.uploaded.len(), 1);
    assert_eq!(connector.connects.load(Ordering::SeqCst), 1);
    assert_eq!(connector.closes.load(Ordering::SeqCst), 1);

    let texts = webhook_texts(&server).await;
    assert_eq!(texts.len(), 1);
    assert!(texts[0].contains("2024-05-01"));
    assert!(texts[0].contains("2024-05-02"));
}

#[tokio::test]
async fn test_only_text_members_are_uploaded() {
    let server = MockServer::start().await;
    let archive = build_zip(&[("readme.pdf", "%PDF"), ("NOTFIS123.txt", "000NOTFIS")]);
    mount_provider(
        &server,
        ResponseTemplate::new(200).set_body_raw(archive, "application/zip"),
    )
    .await;

    let connector = RecordingConnector::default();
    let report = run_with_notification(&config_for(&server, false), &range(), connector.clone())
        .await
        .unwrap();

    let writes = connector.writes.lock().unwrap().clone();
    assert_eq!(writes.len(), 1);
    assert_eq!(writes[0].0, format!("{}/NOTFIS123-2024-05-02.txt", BASE_PATH));
    assert_eq!(report.skipped, vec!["readme.pdf".to_string()]);
}

#[tokio::test]
async fn test_html_download_fails_before_extraction() {
    let server = MockServer::start().await;
    mount_provider(
        &server,
        ResponseTemplate::new(200).set_body_raw("<html>link expired</html>", "text/html"),
    )
    .await;
    mount_webhook(&server).await;

    let connector = RecordingConnector::default();
    let result = run_with_notification(&config_for(&server, true), &range(), connector.clone()).await;

    assert!(matches!(
        result,
        Err(RelayError::UnexpectedContentType { .. })
    ));
    assert_eq!(connector.connects.load(Ordering::SeqCst), 0);
    assert!(connector.writes.lock().unwrap().is_empty());

    let texts = webhook_texts(&server).await;
    assert_eq!(texts.len(), 1);
    assert!(texts[0].contains("failed"));
}

#[tokio::test]
async fn test_missing_email_issues_no_api_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    mount_webhook(&server).await;

    let config = AppConfig {
        credentials: Credentials::new("", "secret"),
        ..config_for(&server, true)
    };
    let connector = RecordingConnector::default();
    let result = run_with_notification(&config, &range(), connector.clone()).await;

    assert!(matches!(
        result,
        Err(RelayError::MissingConfig { name: "EMAIL" })
    ));
    assert_eq!(connector.connects.load(Ordering::SeqCst), 0);
    assert_eq!(webhook_texts(&server).await.len(), 1);
}

#[tokio::test]
async fn test_unset_webhook_does_not_change_outcome() {
    let server = MockServer::start().await;
    let archive = build_zip(&[("A.txt", "hello")]);
    mount_provider(
        &server,
        ResponseTemplate::new(200).set_body_raw(archive, "application/zip"),
    )
    .await;

    let connector = RecordingConnector::default();
    let result = run_with_notification(&config_for(&server, false), &range(), connector.clone()).await;

    assert!(result.is_ok());
    assert!(webhook_texts(&server).await.is_empty());
}

#[tokio::test]
async fn test_skip_upload_never_connects() {
    let server = MockServer::start().await;
    let archive = build_zip(&[("A.txt", "hello")]);
    mount_provider(
        &server,
        ResponseTemplate::new(200).set_body_raw(archive, "application/zip"),
    )
    .await;

    let config = AppConfig {
        skip_upload: true,
        sftp: SftpConfig::default(),
        ..config_for(&server, false)
    };
    let connector = RecordingConnector::default();
    let report = run_with_notification(&config, &range(), connector.clone())
        .await
        .unwrap();

    assert_eq!(connector.connects.load(Ordering::SeqCst), 0);
    assert_eq!(
        report.uploaded[0].remote_path,
        format!("{}/A-2024-05-02.txt", BASE_PATH)
    );
}

#[tokio::test]
async fn test_failed_write_still_releases_session() {
    let server = MockServer::start().await;
    let archive = build_zip(&[("A.txt", "hello"), ("B.txt", "world")]);
    mount_provider(
        &server,
        ResponseTemplate::new(200).set_body_raw(archive, "application/zip"),
    )
    .await;
    mount_webhook(&server).await;

    let connector = RecordingConnector {
        fail_writes: true,
        ..RecordingConnector::default()
    };
    let result = run_with_notification(&config_for(&server, true), &range(), connector.clone()).await;

    assert!(matches!(result, Err(RelayError::Transfer { .. })));
    assert_eq!(connector.connects.load(Ordering::SeqCst), 1);
    assert_eq!(connector.closes.load(Ordering::SeqCst), 1);
    assert!(connector.writes.lock().unwrap().is_empty());

    let texts = webhook_texts(&server).await;
    assert_eq!(texts.len(), 1);
    assert!(texts[0].contains("failed"));
    assert!(texts[0].contains("A-2024-05-02.txt"));
}
