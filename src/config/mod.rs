//! # Configuration Module
//!
//! This module handles application configuration loading and management.
//! Configuration is read once at startup from:
//! - Environment variables (`BLARG_ENV`, `REDIS_PORT_6379_TCP_ADDR`, ...)
//! - Optional configuration files (config/default.toml, config/{environment}.toml)
//! - .env files (via dotenvy)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use blarg::config::Settings;
//!
//! let settings = Settings::load()?;
//! println!("Redis at {}", settings.redis.address());
//! ```

mod settings;

pub use settings::*;
