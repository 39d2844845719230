//! Connection Pool
//!
//! A bounded pool of Redis connections shared by all request handlers,
//! built on `deadpool`.
//!
//! Connections are dialed lazily. At most `max_active` connections exist at
//! once; once that bound is reached `get` fails immediately with
//! [`PoolError::Exhausted`] instead of waiting. Idle connections are handed
//! out newest first, and every checkout validates the connection with the
//! manager's recycle step, so a connection the server has hung up on is
//! replaced by a fresh dial instead of being handed out again.
//!
//! ```text
//!   get() ──> close idle older than idle_timeout
//!         ──> newest idle ──> recycle (PING) ──ok──> hand out
//!                                 |
//!                               error ──> drop, try next idle or dial
//! ```

use std::fmt;
use std::time::Duration;

use deadpool::managed::{self, Metrics, Object, QueueMode, RecycleError, RecycleResult};
use deadpool::Runtime;
use redis::aio::MultiplexedConnection;
use redis::RedisError;
use tracing::{debug, instrument, warn};

/// Maximum number of connections open at the same time.
pub const DEFAULT_MAX_ACTIVE: usize = 100;

/// Idle connections unused for this long are closed.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(240);

/// Errors returned when checking a connection out of the pool.
#[derive(Debug, thiserror::Error)]
pub enum PoolError {
    #[error("connection pool exhausted")]
    Exhausted,

    #[error("failed to connect: {0}")]
    Connect(#[source] RedisError),

    #[error("authentication rejected: {0}")]
    Auth(#[source] RedisError),

    #[error("connection pool unavailable: {0}")]
    Unavailable(String),

    #[error("failed to build connection pool: {0}")]
    Build(#[from] managed::BuildError),
}

impl From<managed::PoolError<PoolError>> for PoolError {
    fn from(err: managed::PoolError<PoolError>) -> Self {
        match err {
            managed::PoolError::Backend(e) => e,
            managed::PoolError::Timeout(_) => PoolError::Exhausted,
            other => PoolError::Unavailable(other.to_string()),
        }
    }
}

/// Pool sizing and expiry policy.
///
/// Idle connections live in the same slots as checked-out ones, so the idle
/// list can never hold more than `max_active` connections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolConfig {
    pub max_active: usize,
    /// Zero disables idle expiry.
    pub idle_timeout: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_active: DEFAULT_MAX_ACTIVE,
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
        }
    }
}

/// Point-in-time pool occupancy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct PoolStatus {
    pub max_active: usize,
    /// Connections currently open, idle or checked out
    pub open: usize,
    pub idle: usize,
    pub in_use: usize,
}

/// Dials Redis over TCP and authenticates when a password is configured.
#[derive(Clone)]
pub struct RedisManager {
    address: String,
    password: Option<String>,
}

impl RedisManager {
    /// `address` is `host:port`. An empty password disables `AUTH`.
    pub fn new(address: impl Into<String>, password: Option<&str>) -> Self {
        Self {
            address: address.into(),
            password: password.filter(|p| !p.is_empty()).map(str::to_owned),
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }
}

impl fmt::Debug for RedisManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisManager")
            .field("address", &self.address)
            .field("password", &self.password.as_ref().map(|_| "[redacted]"))
            .finish()
    }
}

impl managed::Manager for RedisManager {
    type Type = MultiplexedConnection;
    type Error = PoolError;

    #[instrument(skip(self), fields(address = %self.address), level = "debug")]
    async fn create(&self) -> Result<MultiplexedConnection, PoolError> {
        let client = redis::Client::open(format!("redis://{}/", self.address))
            .map_err(PoolError::Connect)?;
        let mut conn = client
            .get_multiplexed_async_connection()
            .await
            .map_err(PoolError::Connect)?;

        if let Some(password) = &self.password {
            let auth: redis::RedisResult<()> =
                redis::cmd("AUTH").arg(password).query_async(&mut conn).await;
            if let Err(e) = auth {
                warn!(address = %self.address, "Redis rejected AUTH, closing connection");
                drop(conn);
                return Err(PoolError::Auth(e));
            }
        }

        debug!("Redis connection opened");
        Ok(conn)
    }

    async fn recycle(
        &self,
        conn: &mut MultiplexedConnection,
        _: &Metrics,
    ) -> RecycleResult<PoolError> {
        let pong: redis::RedisResult<String> = redis::cmd("PING").query_async(conn).await;
        pong.map(|_| ()).map_err(|e| {
            debug!(address = %self.address, error = %e, "Dropping broken Redis connection");
            RecycleError::Backend(PoolError::Connect(e))
        })
    }
}

/// Bounded connection pool with idle expiry.
pub struct Pool<M: managed::Manager> {
    inner: managed::Pool<M>,
    config: PoolConfig,
}

impl<M: managed::Manager> Clone for Pool<M> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            config: self.config,
        }
    }
}

impl<M> Pool<M>
where
    M: managed::Manager<Error = PoolError>,
{
    /// Create a pool. No connection is opened until the first [`Pool::get`].
    ///
    /// # Errors
    ///
    /// `PoolError::Build` if the underlying pool rejects its configuration.
    pub fn new(manager: M, config: PoolConfig) -> Result<Self, PoolError> {
        let inner = managed::Pool::builder(manager)
            .max_size(config.max_active)
            .queue_mode(QueueMode::Lifo)
            .wait_timeout(Some(Duration::ZERO))
            .runtime(Runtime::Tokio1)
            .build()?;

        Ok(Self { inner, config })
    }

    pub fn config(&self) -> PoolConfig {
        self.config
    }

    pub fn manager(&self) -> &M {
        self.inner.manager()
    }

    /// Check a connection out, dialing a new one if no idle connection
    /// passes validation.
    ///
    /// # Errors
    ///
    /// `PoolError::Exhausted` when `max_active` connections are checked out,
    /// otherwise the dial or `AUTH` error of the new connection.
    pub async fn get(&self) -> Result<Object<M>, PoolError> {
        self.close_stale();

        self.inner.get().await.map_err(|e| {
            let err = PoolError::from(e);
            if matches!(err, PoolError::Exhausted) {
                warn!(max_active = self.config.max_active, "Connection pool exhausted");
            }
            err
        })
    }

    /// Point-in-time occupancy.
    pub fn status(&self) -> PoolStatus {
        let status = self.inner.status();
        PoolStatus {
            max_active: status.max_size,
            open: status.size,
            idle: status.available,
            in_use: status.size.saturating_sub(status.available),
        }
    }

    /// Close idle connections that have not been used for `idle_timeout`.
    fn close_stale(&self) {
        let timeout = self.config.idle_timeout;
        if timeout.is_zero() {
            return;
        }

        let closed = self.inner.retain(|_, metrics| metrics.last_used() < timeout);
        if !closed.removed.is_empty() {
            debug!(closed = closed.removed.len(), "Closed idle connections");
        }
    }
}

impl<M> fmt::Debug for Pool<M>
where
    M: managed::Manager<Error = PoolError> + fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pool")
            .field("manager", self.manager())
            .field("config", &self.config)
            .field("status", &self.status())
            .finish()
    }
}
