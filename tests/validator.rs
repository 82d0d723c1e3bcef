use std::time::Duration;

use httpmock::prelude::*;

use folio::application::validation::ExistenceValidator;
use folio::domain::types::ResourceKind;
use folio::infra::validator::HttpExistenceValidator;

fn validator(server: &MockServer, timeout: Duration) -> HttpExistenceValidator {
    HttpExistenceValidator::new(timeout)
        .and_then(|validator| validator.with_endpoint(ResourceKind::Article, &server.url("/articles")))
        .expect("validator")
}

#[tokio::test]
async fn existing_article_is_confirmed() {
    let server = MockServer::start_async().await;
    let found = server
        .mock_async(|when, then| {
            when.method(GET).path("/articles/1");
            then.status(200)
                .header("content-type", "application/json")
                .body(r#"{"id":1,"title":"A"}"#);
        })
        .await;

    let validator = validator(&server, Duration::from_secs(2));
    assert!(validator.exists(ResourceKind::Article, 1).await);
    found.assert_async().await;
}

#[tokio::test]
async fn missing_article_is_rejected() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/articles/999");
            then.status(404).body(r#"{"code":"NOT_FOUND"}"#);
        })
        .await;

    let validator = validator(&server, Duration::from_secs(2));
    assert!(!validator.exists(ResourceKind::Article, 999).await);
}

#[tokio::test]
async fn upstream_failure_is_rejected() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/articles/1");
            then.status(503);
        })
        .await;

    let validator = validator(&server, Duration::from_secs(2));
    assert!(!validator.exists(ResourceKind::Article, 1).await);
}

#[tokio::test]
async fn slow_answer_is_rejected() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/articles/1");
            then.status(200).delay(Duration::from_millis(500));
        })
        .await;

    let validator = validator(&server, Duration::from_millis(50));
    assert!(!validator.exists(ResourceKind::Article, 1).await);
}

#[tokio::test]
async fn unreachable_service_is_rejected() {
    let validator = HttpExistenceValidator::new(Duration::from_millis(200))
        .and_then(|validator| {
            validator.with_endpoint(ResourceKind::Article, "http://127.0.0.1:9/articles")
        })
        .expect("validator");

    assert!(!validator.exists(ResourceKind::Article, 1).await);
}
