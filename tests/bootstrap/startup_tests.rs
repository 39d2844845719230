//! Server assembly tests.

use pretty_assertions::assert_eq;
use serde_json::json;

use blarg::config::Environment;
use blarg::infrastructure::external::Credentials;
use blarg::shared::error::AppError;
use blarg::startup::Server;

use crate::common::{dead_address, settings, settings_for, FakeRedis};

#[tokio::test]
async fn test_development_bundle() {
    let redis = FakeRedis::start().await;
    let settings = settings_for(
        &redis,
        &[
            ("TOKBOX_KEY", "45000000"),
            ("TOKBOX_SECRET_KEY", "tokbox-secret"),
            ("TWITTER_KEY", "consumer"),
            ("TWITTER_SECRET_KEY", "consumer-secret"),
        ],
    );

    let server = Server::build(&settings).await.unwrap();

    assert_eq!(server.environment, Environment::Development);
    assert_eq!(server.client_base_url, "http://localhost:8000");
    assert!(!server.force_https);
    assert!(!server.session_store.options().secure);
    assert_eq!(server.tokbox_key, "45000000");
    assert_eq!(server.tokbox.api_key(), "45000000");
    assert_eq!(server.tokbox.api_secret(), "tokbox-secret");
    assert_eq!(
        server.oauth_client.credentials(),
        &Credentials::new("consumer", "consumer-secret")
    );
    assert_eq!(
        server.oauth_client.endpoints().token_request_uri,
        "https://api.twitter.com/oauth/access_token"
    );
}

#[tokio::test]
async fn test_production_bundle() {
    let redis = FakeRedis::start().await;
    let settings = settings_for(
        &redis,
        &[("BLARG_ENV", "production"), ("SESSION_SECRET", "prod-key")],
    );

    let server = Server::build(&settings).await.unwrap();

    assert_eq!(server.environment, Environment::Production);
    assert_eq!(server.client_base_url, "https://blarg-im.herokuapp.com");
    assert!(server.force_https);
    assert!(server.session_store.options().secure);
}

#[tokio::test]
async fn test_mixed_case_environment_is_development() {
    let redis = FakeRedis::start().await;
    let settings = settings_for(&redis, &[("BLARG_ENV", "Production")]);

    let server = Server::build(&settings).await.unwrap();

    assert_eq!(server.client_base_url, "http://localhost:8000");
    assert!(!server.force_https);
}

#[tokio::test]
async fn test_production_without_session_secret_fails() {
    let redis = FakeRedis::start().await;
    let settings = settings_for(&redis, &[("BLARG_ENV", "production")]);

    let result = Server::build(&settings).await;

    assert!(matches!(result, Err(AppError::SessionStore(_))));
}

#[tokio::test]
async fn test_unreachable_redis_is_fatal() {
    let address = dead_address();
    let (host, port) = address.rsplit_once(':').unwrap();
    let settings = settings(&[
        ("REDIS_PORT_6379_TCP_ADDR", host),
        ("REDIS_PORT_6379_TCP_PORT", port),
    ]);

    let result = Server::build(&settings).await;

    assert!(matches!(result, Err(AppError::SessionStore(_))));
}

#[tokio::test]
async fn test_missing_redis_settings_are_fatal_at_session_store() {
    let result = Server::build(&settings(&[])).await;

    assert!(matches!(result, Err(AppError::SessionStore(_))));
}

#[tokio::test]
async fn test_password_is_used_for_session_store() {
    let redis = FakeRedis::start_with_password(Some("s3cret")).await;
    let settings = settings_for(&redis, &[("REDIS_PASSWORD", "s3cret")]);

    let server = Server::build(&settings).await.unwrap();

    assert!(redis.command_names(0).contains(&"AUTH".to_string()));
    assert_eq!(server.redis_pool.status().idle, 1);
}

#[tokio::test]
async fn test_assembly_can_run_twice() {
    let redis = FakeRedis::start().await;
    let settings = settings_for(&redis, &[]);

    let first = Server::build(&settings).await;
    let second = Server::build(&settings).await;

    assert!(first.is_ok());
    assert!(second.is_ok());
}

#[tokio::test]
async fn test_state_is_owned_by_bundle() {
    let redis = FakeRedis::start().await;
    let server = Server::build(&settings_for(&redis, &[])).await.unwrap();

    server.state.set("session-1", "room", json!("lobby")).await.unwrap();

    let clone = server.clone();
    assert_eq!(
        clone.state.get("session-1", "room").await.unwrap(),
        Some(json!("lobby"))
    );
}
