//! Redis session store against a live (fake) server.

use std::collections::HashMap;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    routing::get,
    Router,
};
use pretty_assertions::assert_eq;
use tower::ServiceExt;
use tower_sessions::cookie::time::{Duration, OffsetDateTime};
use tower_sessions::session::{Id, Record};
use tower_sessions::session_store::SessionStore;
use tower_sessions::Session;

use blarg::infrastructure::cache::{
    create_redis_pool, RedisSessionStore, SessionOptions, TypedSession,
};
use blarg::infrastructure::external::{register_credentials_type, Credentials};
use blarg::presentation::http::routes::with_sessions;
use blarg::shared::error::AppError;
use blarg::startup::Server;

use crate::common::{dead_address, settings_for, FakeRedis};

async fn store(redis: &FakeRedis) -> RedisSessionStore {
    let pool = create_redis_pool(&redis.address(), None).unwrap();
    RedisSessionStore::connect(pool, b"test signing key", SessionOptions::default())
        .await
        .unwrap()
}

fn record(days: i64) -> Record {
    Record {
        id: Id::default(),
        data: HashMap::from([("user".to_string(), serde_json::json!("ada"))]),
        expiry_date: OffsetDateTime::now_utc() + Duration::days(days),
    }
}

#[tokio::test]
async fn test_connect_pings_redis() {
    let redis = FakeRedis::start().await;
    store(&redis).await;

    assert_eq!(redis.command_names(0).last().map(String::as_str), Some("PING"));
}

#[tokio::test]
async fn test_connect_fails_without_redis() {
    let pool = create_redis_pool(&dead_address(), None).unwrap();
    let result =
        RedisSessionStore::connect(pool, b"test signing key", SessionOptions::default()).await;

    assert!(matches!(result, Err(AppError::SessionStore(_))));
}

#[tokio::test]
async fn test_connect_fails_with_wrong_password() {
    let redis = FakeRedis::start_with_password(Some("s3cret")).await;
    let pool = create_redis_pool(&redis.address(), Some("nope")).unwrap();
    let result =
        RedisSessionStore::connect(pool, b"test signing key", SessionOptions::default()).await;

    assert!(matches!(result, Err(AppError::SessionStore(_))));
}

#[tokio::test]
async fn test_connect_rejects_empty_signing_key() {
    let redis = FakeRedis::start().await;
    let pool = create_redis_pool(&redis.address(), None).unwrap();
    let result = RedisSessionStore::connect(pool, b"", SessionOptions::default()).await;

    assert!(matches!(result, Err(AppError::SessionStore(_))));
}

#[tokio::test]
async fn test_create_save_load_delete() {
    let redis = FakeRedis::start().await;
    let store = store(&redis).await;

    let mut record = record(30);
    store.create(&mut record).await.unwrap();

    let key = format!("session_{}", record.id);
    assert!(redis.get(&key).is_some());
    let ttl = redis.ttl(&key).unwrap();
    assert!((2_591_990..=2_592_000).contains(&ttl));

    record
        .data
        .insert("room".to_string(), serde_json::json!("lobby"));
    store.save(&record).await.unwrap();

    let loaded = store.load(&record.id).await.unwrap().unwrap();
    assert_eq!(loaded.data, record.data);

    store.delete(&record.id).await.unwrap();
    assert!(redis.get(&key).is_none());
    assert!(store.load(&record.id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_unknown_session_id_loads_nothing() {
    let redis = FakeRedis::start().await;
    let store = store(&redis).await;

    assert!(store.load(&Id::default()).await.unwrap().is_none());
}

#[tokio::test]
async fn test_expired_record_is_deleted_on_save() {
    let redis = FakeRedis::start().await;
    let store = store(&redis).await;

    let mut record = record(30);
    store.create(&mut record).await.unwrap();

    record.expiry_date = OffsetDateTime::now_utc() - Duration::seconds(1);
    store.save(&record).await.unwrap();

    assert!(redis.get(&format!("session_{}", record.id)).is_none());
}

#[tokio::test]
async fn test_oversized_record_is_rejected() {
    let redis = FakeRedis::start().await;
    let store = store(&redis).await;

    let mut record = record(30);
    record
        .data
        .insert("big".to_string(), serde_json::json!("x".repeat(5000)));

    let err = store.save(&record).await.unwrap_err();
    assert!(matches!(err, tower_sessions::session_store::Error::Encode(_)));
    assert!(redis.keys("session_").is_empty());
}

async fn count_visit(session: Session) -> String {
    let visits = session.get::<u32>("visits").await.unwrap().unwrap_or(0) + 1;
    session.insert("visits", visits).await.unwrap();
    visits.to_string()
}

async fn remember_request_token(session: Session) -> String {
    session
        .insert_typed("request_token", &Credentials::new("token", "secret"))
        .await
        .unwrap();
    "stored".to_string()
}

async fn read_request_token(session: Session) -> String {
    match session.get_typed::<Credentials>("request_token").await.unwrap() {
        Some(credentials) => credentials.token,
        None => "missing".to_string(),
    }
}

async fn send(
    router: &Router,
    uri: &str,
    cookie: Option<&str>,
) -> (StatusCode, Option<String>, String) {
    let mut request = Request::builder().uri(uri);
    if let Some(cookie) = cookie {
        request = request.header(header::COOKIE, cookie);
    }

    let response = router
        .clone()
        .oneshot(request.body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .map(|v| v.to_str().unwrap().to_string());
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();

    (status, set_cookie, String::from_utf8(body.to_vec()).unwrap())
}

/// `name=value` part of a `Set-Cookie` header.
fn cookie_pair(set_cookie: &str) -> &str {
    set_cookie.split(';').next().unwrap()
}

#[tokio::test]
async fn test_session_layer_persists_across_requests() {
    let redis = FakeRedis::start().await;
    let server = Server::build(&settings_for(&redis, &[])).await.unwrap();
    let router = with_sessions(Router::new().route("/visit", get(count_visit)), &server);

    let (status, set_cookie, body) = send(&router, "/visit", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "1");

    let set_cookie = set_cookie.unwrap();
    assert!(set_cookie.starts_with("session="));
    assert!(set_cookie.contains("HttpOnly"));
    assert!(!set_cookie.contains("Secure"));

    let keys = redis.keys("session_");
    assert_eq!(keys.len(), 1);
    let ttl = redis.ttl(&keys[0]).unwrap();
    assert!((2_591_990..=2_592_000).contains(&ttl));

    let (_, _, body) = send(&router, "/visit", Some(cookie_pair(&set_cookie))).await;
    assert_eq!(body, "2");
}

#[tokio::test]
async fn test_session_layer_rejects_forged_cookie() {
    let redis = FakeRedis::start().await;
    let server = Server::build(&settings_for(&redis, &[])).await.unwrap();
    let router = with_sessions(Router::new().route("/visit", get(count_visit)), &server);

    let (_, set_cookie, _) = send(&router, "/visit", None).await;
    let forged = format!("{}x", cookie_pair(&set_cookie.unwrap()));

    let (_, _, body) = send(&router, "/visit", Some(&forged)).await;
    assert_eq!(body, "1");
}

#[tokio::test]
async fn test_production_session_cookie_is_secure() {
    let redis = FakeRedis::start().await;
    let settings = settings_for(
        &redis,
        &[("BLARG_ENV", "production"), ("SESSION_SECRET", "prod-key")],
    );
    let server = Server::build(&settings).await.unwrap();
    let router = with_sessions(Router::new().route("/visit", get(count_visit)), &server);

    let (_, set_cookie, _) = send(&router, "/visit", None).await;

    assert!(set_cookie.unwrap().contains("Secure"));
}

#[tokio::test]
async fn test_typed_credentials_survive_round_trip() {
    register_credentials_type().unwrap();
    let redis = FakeRedis::start().await;
    let server = Server::build(&settings_for(&redis, &[])).await.unwrap();
    let router = with_sessions(
        Router::new()
            .route("/remember", get(remember_request_token))
            .route("/read", get(read_request_token)),
        &server,
    );

    let (_, set_cookie, body) = send(&router, "/remember", None).await;
    assert_eq!(body, "stored");

    let (_, _, body) = send(&router, "/read", Some(cookie_pair(&set_cookie.unwrap()))).await;
    assert_eq!(body, "token");
}
