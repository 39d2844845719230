//! Cache Module
//!
//! Redis connection pooling and the Redis-backed session store.
//!
//! # Architecture
//!
//! ```text
//! +-----------------------+
//! |  SessionManagerLayer  |  <-- tower_sessions: signed cookie, expiry
//! +-----------------------+
//!           |
//!           v
//! +-----------------------+
//! |   RedisSessionStore   |  <-- records under session_<id>, SETEX
//! +-----------------------+
//!           |
//!           v
//! +-----------------------+
//! |  Pool<RedisManager>   |  <-- deadpool: 100 max, no waiting, idle expiry
//! +-----------------------+
//!           |
//!           v
//! +-----------------------+
//! |     RedisManager      |  <-- TCP dial + AUTH, PING on checkout
//! +-----------------------+
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use blarg::infrastructure::cache::{create_redis_pool, RedisSessionStore, SessionOptions};
//!
//! let pool = create_redis_pool("127.0.0.1:6379", None)?;
//! let store = RedisSessionStore::connect(pool, b"signing key", SessionOptions::default()).await?;
//! ```

mod pool;
mod session_store;

pub use pool::{
    Pool, PoolConfig, PoolError, PoolStatus, RedisManager, DEFAULT_IDLE_TIMEOUT,
    DEFAULT_MAX_ACTIVE,
};
pub use session_store::{signing_key, RedisSessionStore, SessionOptions, TypedSession};

use tracing::{info, instrument};

/// Connection pool used for every Redis access in the application.
pub type RedisPool = Pool<RedisManager>;

/// A connection checked out of [`RedisPool`]; returned to the pool on drop.
pub type RedisConnection = deadpool::managed::Object<RedisManager>;

/// Creates the Redis connection pool.
///
/// The pool allows 100 open connections and closes connections idle for
/// 240 seconds. Nothing is dialed here; unreachable addresses and rejected
/// passwords surface from the first [`Pool::get`].
///
/// # Arguments
/// * `address` - Redis address as `host:port`
/// * `password` - Sent with `AUTH` on every new connection when non-empty
#[instrument(skip(password))]
pub fn create_redis_pool(address: &str, password: Option<&str>) -> Result<RedisPool, PoolError> {
    let pool = Pool::new(RedisManager::new(address, password), PoolConfig::default())?;
    info!(
        authenticated = password.is_some_and(|p| !p.is_empty()),
        "Redis connection pool created"
    );
    Ok(pool)
}
