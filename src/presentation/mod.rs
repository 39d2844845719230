//! Presentation Layer
//!
//! HTTP routes and middleware.

pub mod http;
pub mod middleware;
