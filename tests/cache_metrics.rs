mod support;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use metrics_util::debugging::{DebugValue, DebuggingRecorder};
use serial_test::serial;
use tokio::net::TcpListener;
use tower::ServiceExt;
use url::Url;

use folio::application::validation::ExistenceValidator;
use folio::domain::entities::{ArticleRecord, ReviewRecord};
use folio::infra::http::gateway::Route;
use folio::infra::http::{GatewayState, RouteTable, build_gateway_router};
use folio::infra::validator::HttpExistenceValidator;

use support::{
    BrokenBackend, MemoryRepo, article_draft, article_service, memory_backend, review_draft,
    review_service,
};

#[tokio::test]
#[serial]
async fn consistency_paths_emit_expected_metrics() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();
    recorder
        .install()
        .expect("debug metrics recorder should install in this test process");

    // Hit, miss and invalidation through the memory backend.
    let repo = Arc::new(MemoryRepo::<ArticleRecord>::default());
    let service = article_service(repo, memory_backend());
    let created = service
        .create(article_draft("A", "Au", 1))
        .await
        .expect("create");
    service.read(created.id).await.expect("miss");
    service.read(created.id).await.expect("hit");
    service
        .update(created.id, article_draft("B", "Au", 1).into())
        .await
        .expect("update");

    // Backend failures are counted and absorbed.
    let degraded = article_service(Arc::new(MemoryRepo::default()), Arc::new(BrokenBackend));
    let _ = degraded.read(1).await;

    // A validator without endpoints rejects every reference.
    let unconfigured: Arc<dyn ExistenceValidator> =
        Arc::new(HttpExistenceValidator::new(Duration::from_millis(100)).expect("validator"));
    let reviews = review_service(
        Arc::new(MemoryRepo::<ReviewRecord>::default()),
        memory_backend(),
        Some(unconfigured),
    );
    let _ = reviews.create(review_draft(1, "R")).await;

    // Unreachable upstream behind the gateway.
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let dead = listener.local_addr().expect("addr");
    drop(listener);
    let gateway = build_gateway_router(
        GatewayState::new(
            RouteTable::new([Route::new(
                "/articles",
                Url::parse(&format!("http://{dead}")).expect("url"),
            )]),
            Duration::from_millis(500),
            1024,
        )
        .expect("gateway"),
    );
    let response = gateway
        .oneshot(
            Request::builder()
                .uri("/articles/1")
                .body(Body::empty())
                .expect("request should build"),
        )
        .await
        .expect("router should respond");
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

    let mut counters: HashMap<String, u64> = HashMap::new();
    for (composite_key, _, _, value) in snapshotter.snapshot().into_vec() {
        if let DebugValue::Counter(count) = value {
            *counters
                .entry(composite_key.key().name().to_string())
                .or_default() += count;
        }
    }

    let expected = [
        "folio_cache_hit_total",
        "folio_cache_miss_total",
        "folio_cache_error_total",
        "folio_cache_invalidation_total",
        "folio_validator_rejection_total",
        "folio_gateway_upstream_error_total",
    ];
    for metric in expected {
        assert!(counters.contains_key(metric), "missing metric: {metric}");
    }

    assert_eq!(counters["folio_cache_hit_total"], 1);
    assert_eq!(counters["folio_validator_rejection_total"], 1);
}
