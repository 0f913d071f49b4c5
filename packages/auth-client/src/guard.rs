use crate::claims::decode_claims;
use crate::client::ApiClient;
use crate::error::AuthError;
use crate::permissions::AccessRequirement;
use std::future::Future;
use tracing::{debug, warn};

/// Where unauthenticated visitors are sent
pub const SIGN_IN_PATH: &str = "/";
/// Landing page every authenticated account may access
pub const DEFAULT_AUTHENTICATED_PATH: &str = "/dashboard";

/// Outcome of a guarded page load
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageResult<T> {
    Props(T),
    Redirect { destination: String, permanent: bool },
    NotFound,
}

impl<T> PageResult<T> {
    pub fn redirect(destination: impl Into<String>) -> Self {
        PageResult::Redirect {
            destination: destination.into(),
            permanent: false,
        }
    }
}

/// Guard a page that requires an authenticated session.
///
/// - No stored token: redirect to sign-in, the fetcher never runs.
/// - With a requirement: claims are decoded locally from the stored
///   token (no network call) and evaluated; a denied account is sent to
///   the landing page, since it is authenticated but under-privileged.
///   A malformed token clears the session and redirects to sign-in.
/// - A fetcher failing with [`AuthError::TokenInvalid`] clears the
///   session and redirects to sign-in; any other fetcher error is
///   logged and converted to [`PageResult::NotFound`].
pub async fn with_authentication<T, F, Fut>(
    client: &ApiClient,
    requirement: Option<&AccessRequirement>,
    fetcher: F,
) -> PageResult<T>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<PageResult<T>, AuthError>>,
{
    let Some(token) = client.stored_access_token().await else {
        return PageResult::redirect(SIGN_IN_PATH);
    };

    if let Some(requirement) = requirement {
        let claims = match decode_claims(&token) {
            Ok(claims) => claims,
            Err(error) => {
                warn!(%error, "Stored access token is malformed");
                client.clear_session().await;
                return PageResult::redirect(SIGN_IN_PATH);
            }
        };

        if !requirement.satisfied_by(&claims.permissions, &claims.roles) {
            debug!(sub = %claims.sub, "Access requirement not satisfied");
            return PageResult::redirect(DEFAULT_AUTHENTICATED_PATH);
        }
    }

    // Make sure the fetcher's own API calls carry the stored token
    client.hydrate().await;

    match fetcher().await {
        Ok(result) => result,
        Err(error) if error.is_token_invalid() => {
            client.clear_session().await;
            PageResult::redirect(SIGN_IN_PATH)
        }
        Err(error) => {
            warn!(%error, "Page data fetch failed");
            PageResult::NotFound
        }
    }
}

/// Guard a page reserved for signed-out visitors. A context that is
/// already authenticated is sent to the landing page without running
/// the fetcher; otherwise the fetcher's result is returned unchanged.
pub async fn with_guest<T, F, Fut>(client: &ApiClient, fetcher: F) -> PageResult<T>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<PageResult<T>, AuthError>>,
{
    if client.stored_access_token().await.is_some() {
        return PageResult::redirect(DEFAULT_AUTHENTICATED_PATH);
    }

    match fetcher().await {
        Ok(result) => result,
        Err(error) => {
            warn!(%error, "Page data fetch failed");
            PageResult::NotFound
        }
    }
}
