//! Application Startup
//!
//! The composition root: builds every long-lived dependency from the
//! settings, in order, and hands the result to the HTTP layer.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::Router;
use tokio::net::TcpListener;
use tracing::{error, info, instrument, warn};

use crate::config::{Environment, Settings};
use crate::domain::State;
use crate::infrastructure::cache::{self, RedisPool, RedisSessionStore, SessionOptions};
use crate::infrastructure::external::{register_credentials_type, OAuthClient, TokBox};
use crate::infrastructure::state::LocalState;
use crate::presentation::http::{handlers, routes};
use crate::presentation::middleware::logging;
use crate::shared::error::AppError;

/// Signing key used in development when `SESSION_SECRET` is not set.
pub const DEVELOPMENT_SESSION_KEY: &[u8] = b"blarg-development-session-key";

/// Everything request handlers need, built once per process.
///
/// Fields are handles to shared subsystems; cloning the bundle clones the
/// handles, never the subsystems.
#[derive(Clone)]
pub struct Server {
    pub session_store: RedisSessionStore,
    pub redis_pool: RedisPool,
    pub oauth_client: OAuthClient,
    pub state: Arc<dyn State>,
    pub client_base_url: String,
    pub force_https: bool,
    pub tokbox: TokBox,
    pub tokbox_key: String,
    pub environment: Environment,
}

impl Server {
    /// Build the server bundle.
    ///
    /// Only the session store can fail at runtime. The Redis pool does not
    /// dial until first use, and missing credentials are carried as empty
    /// strings.
    ///
    /// # Errors
    ///
    /// `AppError::SessionStore` if the session store cannot reach Redis or
    /// has no signing key. No bundle is produced and startup must stop.
    #[instrument(skip(settings), fields(environment = tracing::field::Empty))]
    pub async fn build(settings: &Settings) -> Result<Self, AppError> {
        let environment = settings.environment();
        tracing::Span::current().record("environment", environment.as_str());

        // Redis
        let redis_address = settings.redis.address();
        let redis_pool = cache::create_redis_pool(&redis_address, settings.redis.password())?;

        // Session store
        let signing_key = session_signing_key(environment, &settings.session.secret);
        let options = SessionOptions {
            secure: environment.force_https(),
            ..SessionOptions::default()
        };
        let session_store = RedisSessionStore::connect(redis_pool.clone(), signing_key, options)
            .await
            .inspect_err(|e| error!(error = %e, address = %redis_address, "Session store unavailable"))?;

        // TokBox
        let tokbox_key = settings.tokbox.key.clone();
        let tokbox = TokBox::new(tokbox_key.clone(), settings.tokbox.secret_key.clone());

        // OAuth
        register_credentials_type()?;
        let oauth_client = OAuthClient::twitter(&settings.twitter.key, &settings.twitter.secret_key);

        // State
        let state: Arc<dyn State> = Arc::new(LocalState::new());

        info!(
            client_base_url = environment.client_base_url(),
            force_https = environment.force_https(),
            "Server assembled"
        );

        Ok(Self {
            session_store,
            redis_pool,
            oauth_client,
            state,
            client_base_url: environment.client_base_url().to_string(),
            force_https: environment.force_https(),
            tokbox,
            tokbox_key,
            environment,
        })
    }
}

impl std::fmt::Debug for Server {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Server")
            .field("environment", &self.environment)
            .field("client_base_url", &self.client_base_url)
            .field("force_https", &self.force_https)
            .field("redis_pool", &self.redis_pool)
            .field("tokbox", &self.tokbox)
            .finish_non_exhaustive()
    }
}

/// Pick the session signing key.
///
/// An empty `SESSION_SECRET` falls back to a fixed key in development only;
/// in production it stays empty, which the session store refuses.
fn session_signing_key(environment: Environment, secret: &str) -> &[u8] {
    if !secret.is_empty() {
        return secret.as_bytes();
    }
    match environment {
        Environment::Development => {
            warn!("SESSION_SECRET is not set, using the development session key");
            DEVELOPMENT_SESSION_KEY
        }
        Environment::Production => &[],
    }
}

/// Application instance
pub struct Application {
    listener: TcpListener,
    router: Router,
    server: Server,
}

impl Application {
    /// Build the application from settings
    pub async fn build(settings: Settings) -> Result<Self> {
        handlers::health::init_server_start();

        let server = Server::build(&settings).await?;

        let router = routes::create_router(server.clone()).layer(logging::create_trace_layer());

        let listener =
            TcpListener::bind((settings.server.host.as_str(), settings.server.port)).await?;
        info!("Listening on {}", listener.local_addr()?);

        Ok(Self {
            listener,
            router,
            server,
        })
    }

    /// Run the server until stopped
    pub async fn run_until_stopped(self) -> Result<()> {
        axum::serve(self.listener, self.router).await?;
        Ok(())
    }

    /// Get the bound address
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn server(&self) -> &Server {
        &self.server
    }
}
