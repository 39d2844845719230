//! TokBox (OpenTok) video API credentials.

/// Video-calling client configured with the project's API key and secret.
#[derive(Clone)]
pub struct TokBox {
    api_key: String,
    api_secret: String,
}

impl TokBox {
    pub fn new(api_key: impl Into<String>, api_secret: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_secret: api_secret.into(),
        }
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn api_secret(&self) -> &str {
        &self.api_secret
    }
}

impl std::fmt::Debug for TokBox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokBox")
            .field("api_key", &self.api_key)
            .finish_non_exhaustive()
    }
}
