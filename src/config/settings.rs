//! Application settings and configuration structures.

use std::fmt;

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, File};
use serde::Deserialize;

/// Base URL served to clients in development.
pub const DEVELOPMENT_BASE_URL: &str = "http://localhost:8000";

/// Base URL served to clients in production.
pub const PRODUCTION_BASE_URL: &str = "https://blarg-im.herokuapp.com";

/// Deployment environment, resolved once from `BLARG_ENV`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl Environment {
    /// Resolve the environment from the raw `BLARG_ENV` value.
    ///
    /// Only the exact, case-sensitive literal `production` selects
    /// [`Environment::Production`]; every other value, including the empty
    /// string, selects [`Environment::Development`].
    pub fn from_env_value(value: &str) -> Self {
        if value == "production" {
            Self::Production
        } else {
            Self::Development
        }
    }

    /// Base URL handed to clients for this environment.
    pub fn client_base_url(self) -> &'static str {
        match self {
            Self::Development => DEVELOPMENT_BASE_URL,
            Self::Production => PRODUCTION_BASE_URL,
        }
    }

    /// Whether plain HTTP requests must be redirected to HTTPS.
    pub fn force_https(self) -> bool {
        matches!(self, Self::Production)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Root configuration structure containing all application settings.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Resolved from `BLARG_ENV` only; config files cannot set it
    #[serde(skip)]
    pub environment: Environment,

    /// HTTP listener configuration
    pub server: ServerSettings,

    /// Redis connection configuration
    pub redis: RedisSettings,

    /// Session signing configuration
    pub session: SessionSettings,

    /// Twitter OAuth consumer credentials
    pub twitter: TwitterSettings,

    /// TokBox API credentials
    pub tokbox: TokBoxSettings,
}

/// Server binding configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    /// Host address to bind to (e.g., "0.0.0.0")
    pub host: String,

    /// Port number to listen on
    pub port: u16,
}

/// Redis configuration.
///
/// Host and port are kept as the raw strings found in the environment;
/// malformed values only show up when the pool first dials.
#[derive(Debug, Clone, Deserialize)]
pub struct RedisSettings {
    pub host: String,
    pub port: String,
    pub password: String,
}

/// Session signing configuration.
#[derive(Clone, Deserialize)]
pub struct SessionSettings {
    pub secret: String,
}

/// Twitter OAuth consumer configuration.
#[derive(Clone, Deserialize)]
pub struct TwitterSettings {
    pub key: String,
    pub secret_key: String,
}

/// TokBox configuration.
#[derive(Clone, Deserialize)]
pub struct TokBoxSettings {
    pub key: String,
    pub secret_key: String,
}

impl fmt::Debug for SessionSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionSettings")
            .field("secret", &redact(&self.secret))
            .finish()
    }
}

impl fmt::Debug for TwitterSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TwitterSettings")
            .field("key", &self.key)
            .field("secret_key", &redact(&self.secret_key))
            .finish()
    }
}

impl fmt::Debug for TokBoxSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokBoxSettings")
            .field("key", &self.key)
            .field("secret_key", &redact(&self.secret_key))
            .finish()
    }
}

fn redact(value: &str) -> &'static str {
    if value.is_empty() {
        ""
    } else {
        "[redacted]"
    }
}

/// Environment variables read at startup, mapped to their settings key.
const ENV_OVERRIDES: &[(&str, &str)] = &[
    ("server.host", "SERVER_HOST"),
    ("server.port", "PORT"),
    ("redis.host", "REDIS_PORT_6379_TCP_ADDR"),
    ("redis.port", "REDIS_PORT_6379_TCP_PORT"),
    ("redis.password", "REDIS_PASSWORD"),
    ("session.secret", "SESSION_SECRET"),
    ("twitter.key", "TWITTER_KEY"),
    ("twitter.secret_key", "TWITTER_SECRET_KEY"),
    ("tokbox.key", "TOKBOX_KEY"),
    ("tokbox.secret_key", "TOKBOX_SECRET_KEY"),
];

impl Settings {
    /// Load settings from the process environment.
    ///
    /// The loading order is:
    /// 1. Built-in defaults (empty strings, port 8000)
    /// 2. config/default.toml and config/{environment}.toml, if present
    /// 3. Environment variables (highest priority)
    ///
    /// Values are not validated; a missing variable stays an empty string.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a config file is malformed or `PORT` is not a
    /// valid port number.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build settings from an arbitrary variable lookup.
    ///
    /// Empty variables are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = Environment::from_env_value(&lookup("BLARG_ENV").unwrap_or_default());

        let mut builder = defaults()?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", environment)).required(false));

        for (key, variable) in ENV_OVERRIDES {
            let value = lookup(*variable).filter(|v| !v.is_empty());
            builder = builder.set_override_option(*key, value)?;
        }

        let mut settings: Settings = builder.build()?.try_deserialize()?;
        settings.environment = environment;
        Ok(settings)
    }

    /// Deployment environment selected by `BLARG_ENV`.
    pub fn environment(&self) -> Environment {
        self.environment
    }
}

/// Built-in defaults: empty strings everywhere except the listener.
fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Config::builder()
        .set_default("server.host", "0.0.0.0")?
        .set_default("server.port", 8000)?
        .set_default("redis.host", "")?
        .set_default("redis.port", "")?
        .set_default("redis.password", "")?
        .set_default("session.secret", "")?
        .set_default("twitter.key", "")?
        .set_default("twitter.secret_key", "")?
        .set_default("tokbox.key", "")?
        .set_default("tokbox.secret_key", "")
}

impl RedisSettings {
    /// Cache address as `host:port`, concatenated without validation.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Password to authenticate new connections with, if one is configured.
    pub fn password(&self) -> Option<&str> {
        if self.password.is_empty() {
            None
        } else {
            Some(&self.password)
        }
    }
}
