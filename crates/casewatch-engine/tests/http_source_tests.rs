//! HttpSource against a mock server: retry, backoff, headers, extraction.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use casewatch_core::errors::ExErrorKind;
use casewatch_core::{FieldName, RecordId};
use casewatch_engine::source::{HttpSource, SnapshotSource};
use casewatch_engine::HttpSettings;
use std::path::PathBuf;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fixture(name: &str) -> String {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name);
    std::fs::read_to_string(path).unwrap()
}

fn fast_settings(max_retries: u32) -> HttpSettings {
    HttpSettings {
        timeout_secs: 5,
        max_retries,
        backoff_ms: 1,
        ..HttpSettings::default()
    }
}

fn case_id(server: &MockServer) -> RecordId {
    RecordId::new(format!(
        "{}/modules.php?name=sud_delo&name_op=case&case_id=1",
        server.uri()
    ))
    .unwrap()
}

#[tokio::test]
async fn test_fetch_extracts_page_with_browser_headers() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/modules.php"))
        .and(header("accept-language", "ru-RU,ru;q=0.9,en;q=0.8"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/html; charset=utf-8")
                .set_body_string(fixture("case_page.html")),
        )
        .expect(1)
        .mount(&server)
        .await;

    let source = HttpSource::new(&fast_settings(0)).unwrap();
    let snapshot = source.fetch(&case_id(&server)).await.unwrap();

    assert_eq!(
        snapshot.core_fields.get(FieldName::Judge),
        Some("Иванова Анна Сергеевна")
    );
    let uid_link = snapshot.core_fields.get(FieldName::UidLink).unwrap();
    assert!(uid_link.starts_with(&server.uri()));
    assert_eq!(snapshot.sections.len(), 3);
}

#[tokio::test]
async fn test_server_errors_are_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<div id=\"content\"></div>"))
        .expect(1)
        .mount(&server)
        .await;

    let source = HttpSource::new(&fast_settings(3)).unwrap();
    let body = source
        .fetch_page(case_id(&server).as_str())
        .await
        .unwrap();
    assert!(body.contains("content"));
}

#[tokio::test]
async fn test_retries_exhausted_is_fetch_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(429))
        .expect(3)
        .mount(&server)
        .await;

    let source = HttpSource::new(&fast_settings(2)).unwrap();
    let err = source
        .fetch_page(case_id(&server).as_str())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ExErrorKind::Fetch);
    assert!(err.message().contains("after 3 attempts"));
}

#[tokio::test]
async fn test_not_found_fails_without_retry() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let source = HttpSource::new(&fast_settings(3)).unwrap();
    let err = source.fetch(&case_id(&server)).await.unwrap_err();
    assert_eq!(err.kind(), ExErrorKind::Fetch);
}

#[tokio::test]
async fn test_page_without_content_is_extraction_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<p>технические работы</p>"))
        .mount(&server)
        .await;

    let source = HttpSource::new(&fast_settings(0)).unwrap();
    let err = source.fetch(&case_id(&server)).await.unwrap_err();
    assert_eq!(err.kind(), ExErrorKind::Extraction);
}
