//! Application state contract.

use async_trait::async_trait;
use serde_json::Value;

use crate::shared::error::AppError;

/// Runtime data scoped to a session (or any other caller-chosen scope).
///
/// The server owns exactly one implementation for its whole lifetime;
/// handlers only see this trait.
#[async_trait]
pub trait State: Send + Sync {
    /// Read a value.
    async fn get(&self, scope: &str, key: &str) -> Result<Option<Value>, AppError>;

    /// Write a value, returning the one it replaced.
    async fn set(&self, scope: &str, key: &str, value: Value) -> Result<Option<Value>, AppError>;

    /// Remove a value, returning it if present.
    async fn remove(&self, scope: &str, key: &str) -> Result<Option<Value>, AppError>;

    /// Drop every value in a scope. Returns how many were removed.
    async fn clear(&self, scope: &str) -> Result<usize, AppError>;

    /// Number of scopes currently holding data.
    async fn scope_count(&self) -> Result<usize, AppError>;
}
