//! # Domain Layer
//!
//! Contracts the rest of the application is written against, independent of
//! any particular backing store.
//!
//! ## Design Principles
//!
//! - No dependencies on infrastructure or presentation layers
//! - Traits define data access contracts
//! - Implementations live in the infrastructure layer

pub mod state;

pub use state::State;
