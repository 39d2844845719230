//! Session Store
//!
//! Server-side HTTP sessions persisted in Redis through the connection pool.
//! `tower_sessions` owns the cookie (signed with the server's key) and the
//! session lifecycle; this store only moves records in and out of Redis,
//! under `<key_prefix><id>` with the time left until expiry as TTL.

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use sha2::{Digest, Sha512};
use tower_sessions::cookie::time::OffsetDateTime;
use tower_sessions::cookie::Key;
use tower_sessions::session::{Id, Record};
use tower_sessions::session_store::{self, SessionStore};
use tower_sessions::Session;
use tracing::{debug, info, instrument};

use super::{RedisConnection, RedisPool};
use crate::shared::error::AppError;
use crate::shared::registry;

/// Session store tuning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOptions {
    /// Prefix for Redis keys (e.g., "session_<id>")
    pub key_prefix: String,
    pub cookie_name: String,
    /// Session lifetime in seconds since last use
    pub max_age: u64,
    /// Maximum serialized size in bytes. Zero disables the check.
    pub max_length: usize,
    pub secure: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            key_prefix: "session_".to_string(),
            cookie_name: "session".to_string(),
            max_age: 30 * 24 * 60 * 60, // 30 days
            max_length: 4096,
            secure: false,
        }
    }
}

/// Derive the cookie signing key from a configured secret.
///
/// # Errors
///
/// Returns `AppError::SessionStore` if the secret is empty.
pub fn signing_key(secret: &[u8]) -> Result<Key, AppError> {
    if secret.is_empty() {
        return Err(AppError::SessionStore("session signing key is empty".into()));
    }
    Ok(Key::from(Sha512::digest(secret).as_slice()))
}

/// Redis-backed session store.
#[derive(Clone)]
pub struct RedisSessionStore {
    pool: RedisPool,
    options: SessionOptions,
    key: Key,
}

impl RedisSessionStore {
    /// Create the store and check that Redis answers through the pool.
    ///
    /// # Errors
    ///
    /// Returns `AppError::SessionStore` if the signing key is empty, a
    /// connection cannot be checked out, or Redis does not answer `PING`.
    #[instrument(skip(pool, secret, options))]
    pub async fn connect(
        pool: RedisPool,
        secret: &[u8],
        options: SessionOptions,
    ) -> Result<Self, AppError> {
        let key = signing_key(secret)?;

        let mut conn = pool
            .get()
            .await
            .map_err(|e| AppError::SessionStore(e.to_string()))?;
        let _: String = redis::cmd("PING")
            .query_async(&mut *conn)
            .await
            .map_err(|e| AppError::SessionStore(e.to_string()))?;
        drop(conn);

        info!(key_prefix = %options.key_prefix, "Session store ready");
        Ok(Self { pool, options, key })
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    /// Key the session cookie is signed with.
    pub fn signing_key(&self) -> &Key {
        &self.key
    }

    fn redis_key(&self, id: &Id) -> String {
        format!("{}{}", self.options.key_prefix, id)
    }

    fn encode(&self, record: &Record) -> session_store::Result<String> {
        let data = serde_json::to_string(record)
            .map_err(|e| session_store::Error::Encode(e.to_string()))?;

        let limit = self.options.max_length;
        if limit != 0 && data.len() > limit {
            return Err(session_store::Error::Encode(format!(
                "session data is {} bytes, limit is {}",
                data.len(),
                limit
            )));
        }
        Ok(data)
    }

    async fn connection(&self) -> session_store::Result<RedisConnection> {
        self.pool.get().await.map_err(backend)
    }
}

impl std::fmt::Debug for RedisSessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisSessionStore")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    #[instrument(skip(self, record), level = "debug")]
    async fn create(&self, record: &mut Record) -> session_store::Result<()> {
        let Some(ttl) = ttl_seconds(record.expiry_date) else {
            return Ok(());
        };

        let mut conn = self.connection().await?;
        loop {
            let data = self.encode(record)?;
            let created: Option<String> = redis::cmd("SET")
                .arg(self.redis_key(&record.id))
                .arg(data)
                .arg("EX")
                .arg(ttl)
                .arg("NX")
                .query_async(&mut *conn)
                .await
                .map_err(backend)?;

            if created.is_some() {
                debug!(ttl, "Session created");
                return Ok(());
            }
            record.id = Id::default();
        }
    }

    #[instrument(skip(self, record), level = "debug")]
    async fn save(&self, record: &Record) -> session_store::Result<()> {
        let Some(ttl) = ttl_seconds(record.expiry_date) else {
            return self.delete(&record.id).await;
        };

        let data = self.encode(record)?;
        let mut conn = self.connection().await?;
        let _: () = redis::cmd("SETEX")
            .arg(self.redis_key(&record.id))
            .arg(ttl)
            .arg(data)
            .query_async(&mut *conn)
            .await
            .map_err(backend)?;

        debug!(ttl, "Session saved");
        Ok(())
    }

    #[instrument(skip(self, id), level = "debug")]
    async fn load(&self, id: &Id) -> session_store::Result<Option<Record>> {
        let mut conn = self.connection().await?;
        let data: Option<String> = redis::cmd("GET")
            .arg(self.redis_key(id))
            .query_async(&mut *conn)
            .await
            .map_err(backend)?;

        debug!(hit = data.is_some(), "Session lookup");
        data.map(|json| {
            serde_json::from_str(&json).map_err(|e| session_store::Error::Decode(e.to_string()))
        })
        .transpose()
    }

    async fn delete(&self, id: &Id) -> session_store::Result<()> {
        let mut conn = self.connection().await?;
        let _: i64 = redis::cmd("DEL")
            .arg(self.redis_key(id))
            .query_async(&mut *conn)
            .await
            .map_err(backend)?;
        Ok(())
    }
}

fn backend(err: impl std::fmt::Display) -> session_store::Error {
    session_store::Error::Backend(err.to_string())
}

/// Whole seconds until `expiry_date`, or `None` once it has passed.
fn ttl_seconds(expiry_date: OffsetDateTime) -> Option<u64> {
    let remaining = (expiry_date - OffsetDateTime::now_utc()).whole_seconds();
    u64::try_from(remaining).ok().filter(|seconds| *seconds > 0)
}

/// A value stored in a session, tagged with its registered type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct TypedValue {
    #[serde(rename = "type")]
    tag: String,
    value: serde_json::Value,
}

/// Session values restricted to types in the session type registry.
///
/// Each value is stored together with its registered tag, so reading it
/// back as a different type is an error instead of a silent reinterpretation.
#[async_trait]
pub trait TypedSession {
    /// Store `value` under `key`.
    ///
    /// # Errors
    ///
    /// `AppError::UnregisteredType` unless `T` was registered with
    /// [`registry::register`].
    async fn insert_typed<T>(&self, key: &str, value: &T) -> Result<(), AppError>
    where
        T: Serialize + Send + Sync + 'static;

    /// Read the value under `key` as `T`; `Ok(None)` if the key is absent.
    ///
    /// # Errors
    ///
    /// `AppError::UnregisteredType` if `T` is not registered, and
    /// `AppError::Internal` if the stored value was written as another type.
    async fn get_typed<T>(&self, key: &str) -> Result<Option<T>, AppError>
    where
        T: DeserializeOwned + Send + 'static;
}

fn tag_for<T: 'static>() -> Result<&'static str, AppError> {
    registry::tag_of::<T>().ok_or(AppError::UnregisteredType {
        type_name: std::any::type_name::<T>(),
    })
}

#[async_trait]
impl TypedSession for Session {
    async fn insert_typed<T>(&self, key: &str, value: &T) -> Result<(), AppError>
    where
        T: Serialize + Send + Sync + 'static,
    {
        let tagged = TypedValue {
            tag: tag_for::<T>()?.to_string(),
            value: serde_json::to_value(value)?,
        };
        self.insert(key, tagged).await?;
        Ok(())
    }

    async fn get_typed<T>(&self, key: &str) -> Result<Option<T>, AppError>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let tag = tag_for::<T>()?;
        let Some(stored) = self.get::<TypedValue>(key).await? else {
            return Ok(None);
        };
        if stored.tag != tag {
            return Err(AppError::Internal(format!(
                "session value {:?} holds {}, not {}",
                key, stored.tag, tag
            )));
        }
        Ok(Some(serde_json::from_value(stored.value)?))
    }
}
