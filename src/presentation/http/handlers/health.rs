//! Health Check Handlers
//!
//! Provides health check endpoints for liveness and readiness probes.
//!
//! # Endpoints
//! - `GET /health` - Basic health check
//! - `GET /health/live` - Liveness probe (is the server running?)
//! - `GET /health/ready` - Readiness probe (can Redis be reached?)

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use serde::Serialize;
use std::time::Instant;

use crate::infrastructure::cache::{PoolStatus, RedisConnection};
use crate::startup::Server;

/// Server start time for uptime calculation
static SERVER_START: Lazy<Instant> = Lazy::new(Instant::now);
static SERVER_START_TIME: Lazy<DateTime<Utc>> = Lazy::new(Utc::now);

/// Initialize the server start time (call during startup)
pub fn init_server_start() {
    Lazy::force(&SERVER_START);
    Lazy::force(&SERVER_START_TIME);
}

/// Basic health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// Simple liveness response
#[derive(Debug, Serialize)]
pub struct LivenessResponse {
    pub status: &'static str,
}

/// Detailed readiness response
#[derive(Debug, Serialize)]
pub struct ReadinessResponse {
    pub status: HealthStatus,
    pub version: &'static str,
    pub environment: &'static str,
    pub uptime_seconds: u64,
    pub started_at: String,
    pub redis: ServiceHealth,
    pub pool: PoolStatus,
}

/// Health status for individual services
#[derive(Debug, Serialize)]
pub struct ServiceHealth {
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Overall health status
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

/// Latency above which Redis is reported as degraded
const REDIS_DEGRADED_MS: u64 = 50;

/// Basic health check endpoint
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Liveness probe - checks if the server is running
pub async fn liveness() -> Json<LivenessResponse> {
    Json(LivenessResponse { status: "alive" })
}

/// Readiness probe - returns 503 while Redis cannot be reached
pub async fn readiness(State(server): State<Server>) -> impl IntoResponse {
    let redis = check_redis(&server).await;
    let status = redis.status;

    let response = ReadinessResponse {
        status,
        version: env!("CARGO_PKG_VERSION"),
        environment: server.environment.as_str(),
        uptime_seconds: SERVER_START.elapsed().as_secs(),
        started_at: SERVER_START_TIME.to_rfc3339(),
        redis,
        pool: server.redis_pool.status(),
    };

    let status_code = match status {
        HealthStatus::Healthy | HealthStatus::Degraded => StatusCode::OK,
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status_code, Json(response))
}

/// Check Redis connectivity and latency through the pool
async fn check_redis(server: &Server) -> ServiceHealth {
    let start = Instant::now();

    let mut conn = match server.redis_pool.get().await {
        Ok(conn) => conn,
        Err(e) => return unhealthy(format!("Redis connection failed: {}", e)),
    };

    let ping: redis::RedisResult<String> = redis::cmd("PING").query_async(&mut *conn).await;
    match ping {
        Ok(_) => {
            let latency = start.elapsed().as_millis() as u64;
            ServiceHealth {
                status: classify_latency(latency),
                latency_ms: Some(latency),
                message: None,
            }
        }
        Err(e) => {
            // Keep the broken connection out of the idle list
            drop(RedisConnection::take(conn));
            unhealthy(format!("Redis PING failed: {}", e))
        }
    }
}

fn unhealthy(message: String) -> ServiceHealth {
    ServiceHealth {
        status: HealthStatus::Unhealthy,
        latency_ms: None,
        message: Some(message),
    }
}

fn classify_latency(latency_ms: u64) -> HealthStatus {
    if latency_ms < REDIS_DEGRADED_MS {
        HealthStatus::Healthy
    } else {
        HealthStatus::Degraded
    }
}
