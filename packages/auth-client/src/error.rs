use std::sync::Arc;
use thiserror::Error;

/// Errors surfaced by the authentication/session layer.
///
/// Auth failures are resolved as low as possible (inside the request
/// gateway and refresh coordinator); only [`AuthError::TokenInvalid`]
/// is meant to reach the page-guard layer. Unauthenticated access and
/// permission denials are redirects produced by the guards, never error
/// values.
///
/// The enum is `Clone` so a single refresh failure can be delivered to
/// every caller queued behind the in-flight refresh.
#[derive(Error, Debug, Clone)]
pub enum AuthError {
    /// The refresh protocol failed or the token was rejected for a
    /// non-expiry reason in a non-interactive context. The guard layer
    /// responds by clearing stored tokens and redirecting to sign-in.
    #[error("Error with authentication token")]
    TokenInvalid,

    /// The stored access token could not be decoded into claims.
    #[error("Malformed access token: {0}")]
    MalformedToken(String),

    /// Non-auth HTTP error passed through unmodified to the caller.
    #[error("API request failed with status {status}")]
    Api { status: u16, code: Option<String> },

    /// A successful response body did not match the expected shape.
    #[error("Failed to decode API response: {0}")]
    Decode(String),

    /// Network or protocol failure below the auth layer. Not retried here.
    #[error("Transport failure: {0}")]
    Transport(#[source] Arc<reqwest::Error>),
}

impl From<reqwest::Error> for AuthError {
    fn from(err: reqwest::Error) -> Self {
        AuthError::Transport(Arc::new(err))
    }
}

impl AuthError {
    /// True for the distinguished error that guard layers must handle
    /// by clearing the session.
    pub fn is_token_invalid(&self) -> bool {
        matches!(self, AuthError::TokenInvalid)
    }
}
