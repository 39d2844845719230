//! Middleware
//!
//! Tower middleware for request processing.

pub mod https;
pub mod logging;

pub use https::enforce_https;
