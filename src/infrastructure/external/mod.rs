//! External Service Clients
//!
//! Credential-holding clients for the third-party providers.

pub mod oauth;
pub mod tokbox;

pub use oauth::{register_credentials_type, Credentials, OAuthClient, OAuthEndpoints};
pub use tokbox::TokBox;
