//! Infrastructure Layer
//!
//! Contains implementations for external services including:
//! - Redis connection pool and session store
//! - In-memory application state
//! - Third-party API clients (Twitter OAuth, TokBox)

pub mod cache;
pub mod external;
pub mod state;
