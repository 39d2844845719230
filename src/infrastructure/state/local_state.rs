//! In-process application state.

use std::collections::HashMap;

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;

use crate::domain::State;
use crate::shared::error::AppError;

/// [`State`] kept in memory, sharded by scope.
///
/// Data does not survive a restart and is not shared between processes.
#[derive(Debug, Default)]
pub struct LocalState {
    scopes: DashMap<String, HashMap<String, Value>>,
}

impl LocalState {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl State for LocalState {
    async fn get(&self, scope: &str, key: &str) -> Result<Option<Value>, AppError> {
        Ok(self
            .scopes
            .get(scope)
            .and_then(|values| values.get(key).cloned()))
    }

    async fn set(&self, scope: &str, key: &str, value: Value) -> Result<Option<Value>, AppError> {
        Ok(self
            .scopes
            .entry(scope.to_string())
            .or_default()
            .insert(key.to_string(), value))
    }

    async fn remove(&self, scope: &str, key: &str) -> Result<Option<Value>, AppError> {
        let removed = match self.scopes.get_mut(scope) {
            Some(mut values) => values.remove(key),
            None => return Ok(None),
        };
        // Empty scopes are dropped so scope_count stays meaningful.
        self.scopes.remove_if(scope, |_, values| values.is_empty());
        Ok(removed)
    }

    async fn clear(&self, scope: &str) -> Result<usize, AppError> {
        Ok(self
            .scopes
            .remove(scope)
            .map(|(_, values)| values.len())
            .unwrap_or(0))
    }

    async fn scope_count(&self) -> Result<usize, AppError> {
        Ok(self.scopes.len())
    }
}
