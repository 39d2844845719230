//! Health Check API Tests

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::Value;
use tower::ServiceExt;

use blarg::infrastructure::cache::create_redis_pool;
use blarg::presentation::http::routes::create_router;
use blarg::startup::Server;

use crate::common::{dead_address, settings_for, FakeRedis};

async fn get(router: Router, uri: &str, forwarded_proto: Option<&str>) -> (StatusCode, Value) {
    let mut request = Request::builder()
        .method("GET")
        .uri(uri)
        .header(header::HOST, "blarg.test");
    if let Some(proto) = forwarded_proto {
        request = request.header("x-forwarded-proto", proto);
    }

    let response = router
        .oneshot(request.body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&body).unwrap_or(Value::Null);

    (status, json)
}

#[tokio::test]
async fn test_health_check_returns_ok() {
    let redis = FakeRedis::start().await;
    let server = Server::build(&settings_for(&redis, &[])).await.unwrap();

    let (status, json) = get(create_router(server), "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "healthy");
}

#[tokio::test]
async fn test_liveness_probe() {
    let redis = FakeRedis::start().await;
    let server = Server::build(&settings_for(&redis, &[])).await.unwrap();

    let (status, json) = get(create_router(server), "/health/live", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "alive");
}

#[tokio::test]
async fn test_readiness_probe_reports_redis_and_pool() {
    let redis = FakeRedis::start().await;
    let server = Server::build(&settings_for(&redis, &[])).await.unwrap();

    let (status, json) = get(create_router(server), "/health/ready", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_ne!(json["redis"]["status"], "unhealthy");
    assert_eq!(json["environment"], "development");
    assert_eq!(json["pool"]["max_active"], 100);
    assert_eq!(json["pool"]["in_use"], 0);
}

#[tokio::test]
async fn test_readiness_probe_unavailable_without_redis() {
    let redis = FakeRedis::start().await;
    let server = Server::build(&settings_for(&redis, &[])).await.unwrap();
    let server = Server {
        redis_pool: create_redis_pool(&dead_address(), None).unwrap(),
        ..server
    };

    let (status, json) = get(create_router(server), "/health/ready", None).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json["redis"]["status"], "unhealthy");
}

#[tokio::test]
async fn test_production_redirects_plain_http() {
    let redis = FakeRedis::start().await;
    let settings = settings_for(
        &redis,
        &[("BLARG_ENV", "production"), ("SESSION_SECRET", "prod-key")],
    );
    let server = Server::build(&settings).await.unwrap();
    let router = create_router(server);

    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/health")
                .header(header::HOST, "blarg-im.herokuapp.com")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::MOVED_PERMANENTLY);
    assert_eq!(
        response.headers().get(header::LOCATION).unwrap(),
        "https://blarg-im.herokuapp.com/health"
    );

    let (status, _) = get(router, "/health", Some("https")).await;
    assert_eq!(status, StatusCode::OK);
}
