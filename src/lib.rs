//! # Blarg Server Library
//!
//! Bootstrap layer of the blarg.im chat application:
//! - Environment-driven configuration (development / production)
//! - Bounded Redis connection pool
//! - Redis-backed HTTP session store with signed cookies
//! - Twitter OAuth and TokBox video client configuration
//! - Swappable in-process application state
//!
//! ## Module Structure
//!
//! ```text
//! blarg/
//! +-- config/         Settings and environment selection
//! +-- domain/         State contract
//! +-- infrastructure/ Redis pool, session store, state, external clients
//! +-- presentation/   Health routes and HTTPS middleware
//! +-- shared/         Errors and the session type registry
//! ```

// Configuration module
pub mod config;

// Domain layer - contracts
pub mod domain;

// Infrastructure layer - External implementations
pub mod infrastructure;

// Presentation layer - HTTP handlers
pub mod presentation;

// Shared utilities
pub mod shared;

// Server assembly
pub mod startup;

// Telemetry and observability
pub mod telemetry;
