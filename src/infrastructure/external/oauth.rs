//! Twitter OAuth 1.0a client configuration.
//!
//! Holds the provider endpoints and the application's consumer credentials.
//! The signed request exchange itself belongs to the request handlers.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::shared::error::AppError;
use crate::shared::registry;

pub const TEMPORARY_CREDENTIAL_REQUEST_URI: &str = "https://api.twitter.com/oauth/request_token";
pub const RESOURCE_OWNER_AUTHORIZATION_URI: &str = "https://api.twitter.com/oauth/authenticate";
pub const TOKEN_REQUEST_URI: &str = "https://api.twitter.com/oauth/access_token";

/// Session registry tag for [`Credentials`].
pub const CREDENTIALS_TAG: &str = "oauth.Credentials";

/// An OAuth token/secret pair: consumer, temporary or token credentials.
#[derive(Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Credentials {
    pub token: String,
    pub secret: String,
}

impl Credentials {
    pub fn new(token: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            secret: secret.into(),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("token", &self.token)
            .finish_non_exhaustive()
    }
}

/// Allow [`Credentials`] to be stored in sessions.
///
/// Safe to call on every startup; repeated calls are no-ops.
pub fn register_credentials_type() -> Result<(), AppError> {
    registry::register::<Credentials>(CREDENTIALS_TAG)
}

/// OAuth endpoint set for one identity provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuthEndpoints {
    pub temporary_credential_request_uri: String,
    pub resource_owner_authorization_uri: String,
    pub token_request_uri: String,
}

impl OAuthEndpoints {
    pub fn twitter() -> Self {
        Self {
            temporary_credential_request_uri: TEMPORARY_CREDENTIAL_REQUEST_URI.to_string(),
            resource_owner_authorization_uri: RESOURCE_OWNER_AUTHORIZATION_URI.to_string(),
            token_request_uri: TOKEN_REQUEST_URI.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct OAuthClient {
    endpoints: OAuthEndpoints,
    credentials: Credentials,
}

impl OAuthClient {
    pub fn new(endpoints: OAuthEndpoints, credentials: Credentials) -> Self {
        Self {
            endpoints,
            credentials,
        }
    }

    /// Client for Twitter with the given consumer key and secret.
    pub fn twitter(consumer_key: &str, consumer_secret: &str) -> Self {
        Self::new(
            OAuthEndpoints::twitter(),
            Credentials::new(consumer_key, consumer_secret),
        )
    }

    pub fn endpoints(&self) -> &OAuthEndpoints {
        &self.endpoints
    }

    /// Consumer credentials of this application.
    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// URL the resource owner is sent to in order to approve
    /// `temporary_credentials`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Internal` if the configured authorization URI is
    /// not a valid URL.
    pub fn authorization_url(
        &self,
        temporary_credentials: &Credentials,
        extra_params: &[(&str, &str)],
    ) -> Result<String, AppError> {
        let mut url = Url::parse(&self.endpoints.resource_owner_authorization_uri)
            .map_err(|e| AppError::Internal(format!("invalid authorization URI: {}", e)))?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("oauth_token", &temporary_credentials.token);
            for (name, value) in extra_params {
                query.append_pair(name, value);
            }
        }
        Ok(url.into())
    }
}
