use crate::broadcast::{AuthChannel, AuthSubscription};
use crate::config::Config;
use crate::error::AuthError;
use crate::permissions::AccessRequirement;
use crate::refresh::RefreshCoordinator;
use crate::store::{TokenStore, ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY};
use crate::transport::{ApiRequest, ApiResponse, HttpTransport, Transport};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// Application error code the session API sends with an expired token
pub const TOKEN_EXPIRED_CODE: &str = "token.expired";

/// Sign-in credentials
#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// The signed-in account and its grants
///
/// Created on sign-in or on rehydration from the store; permissions and
/// roles stay fixed until a full re-authentication.
#[derive(Debug, Clone, Deserialize)]
pub struct Session {
    pub email: String,
    pub permissions: Vec<String>,
    pub roles: Vec<String>,
}

impl Session {
    /// In-memory access check, used for conditional rendering
    pub fn can_access(&self, requirement: &AccessRequirement) -> bool {
        requirement.satisfied_by(&self.permissions, &self.roles)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignInResponse {
    token: String,
    refresh_token: String,
    permissions: Vec<String>,
    roles: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RefreshResponse {
    token: String,
    refresh_token: String,
}

/// Where the client is running
///
/// Interactive contexts respond to irrecoverable auth failures with a
/// global sign-out (clear storage, notify other contexts); server-side
/// contexts surface [`AuthError::TokenInvalid`] to the guard layer
/// instead, since there is no user session to tear down locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeContext {
    Interactive,
    ServerSide,
}

/// Construction options for [`ApiClient`]
pub struct ApiClientOptions {
    pub config: Config,
    pub store: Arc<dyn TokenStore>,
    pub channel: AuthChannel,
    pub context: RuntimeContext,
}

/// Request gateway and session operations
///
/// Every outbound API call goes through [`ApiClient::request`], which
/// injects the current bearer token, classifies auth failures and drives
/// the refresh protocol. The bearer slot is shared so calls issued after
/// a refresh pick up the rotated token automatically.
pub struct ApiClient {
    transport: Arc<dyn Transport>,
    store: Arc<dyn TokenStore>,
    channel: AuthChannel,
    coordinator: RefreshCoordinator,
    bearer: RwLock<Option<String>>,
    session_ttl: chrono::Duration,
    context: RuntimeContext,
}

impl ApiClient {
    pub fn new(options: ApiClientOptions) -> Self {
        let transport = Arc::new(HttpTransport::new(options.config.api_base_url.clone()));
        Self::with_transport(options, transport)
    }

    /// Build a client over a custom transport (tests, non-HTTP backends)
    pub fn with_transport(options: ApiClientOptions, transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            store: options.store,
            channel: options.channel,
            coordinator: RefreshCoordinator::new(),
            bearer: RwLock::new(None),
            session_ttl: options.config.session_ttl,
            context: options.context,
        }
    }

    /// Load the persisted access token into the bearer slot, if present.
    /// Called once per context at startup, before any API call.
    pub async fn hydrate(&self) {
        let token = self.store.read(ACCESS_TOKEN_KEY).await;
        *self.bearer.write().await = token;
    }

    /// Create a session with the API and persist its tokens
    pub async fn sign_in(&self, credentials: &Credentials) -> Result<Session, AuthError> {
        let request = ApiRequest::post(
            "sessions",
            json!({
                "email": credentials.email,
                "password": credentials.password,
            }),
        );

        let response = self.transport.execute(&request).await?;
        if !response.is_success() {
            return Err(AuthError::Api {
                status: response.status,
                code: response.error_code().map(str::to_string),
            });
        }

        let parsed: SignInResponse = response.json()?;
        self.persist_tokens(&parsed.token, &parsed.refresh_token)
            .await;
        debug!(email = %credentials.email, "Signed in");

        Ok(Session {
            email: credentials.email.clone(),
            permissions: parsed.permissions,
            roles: parsed.roles,
        })
    }

    /// Fetch the signed-in account's profile (session rehydration)
    pub async fn fetch_profile(&self) -> Result<Session, AuthError> {
        let response = self.request(ApiRequest::get("me")).await?;
        response.json()
    }

    /// Execute an API call through the gateway.
    ///
    /// A 401 carrying the expired-token code triggers the refresh
    /// protocol and a transparent retry with the rotated token. Any
    /// other 401 is irrecoverable: interactively it signs the user out,
    /// server-side it surfaces [`AuthError::TokenInvalid`]. Non-401
    /// failures pass through unmodified.
    pub async fn request(&self, request: ApiRequest) -> Result<ApiResponse, AuthError> {
        let bearer = self.bearer.read().await.clone();
        let response = self
            .transport
            .execute(&request.clone().with_bearer(bearer))
            .await?;

        if response.status != 401 {
            return Self::pass_through(response);
        }

        if response.error_code() == Some(TOKEN_EXPIRED_CODE) {
            let token = self.refresh_access_token().await?;
            let retried = self
                .transport
                .execute(&request.with_bearer(Some(token)))
                .await?;
            if retried.status == 401 {
                // Fresh token still rejected
                return self.irrecoverable().await;
            }
            return Self::pass_through(retried);
        }

        // Access denied for a non-expiry reason
        self.irrecoverable().await
    }

    fn pass_through(response: ApiResponse) -> Result<ApiResponse, AuthError> {
        if response.is_success() {
            Ok(response)
        } else {
            Err(AuthError::Api {
                status: response.status,
                code: response.error_code().map(str::to_string),
            })
        }
    }

    /// Funnel through the coordinator: at most one refresh call runs,
    /// and every caller queued behind it shares the outcome.
    async fn refresh_access_token(&self) -> Result<String, AuthError> {
        self.coordinator
            .refresh_access_token(|| self.perform_refresh())
            .await
            // Guards only ever see the distinguished error
            .map_err(|_| AuthError::TokenInvalid)
    }

    /// The single refresh call. Runs only for the single-flight leader;
    /// on failure the leader also executes the sign-out policy, so the
    /// session is torn down exactly once no matter how many callers
    /// were queued.
    async fn perform_refresh(&self) -> Result<String, AuthError> {
        match self.try_refresh().await {
            Ok(token) => Ok(token),
            Err(error) => {
                if self.context == RuntimeContext::Interactive {
                    self.sign_out().await;
                }
                Err(error)
            }
        }
    }

    async fn try_refresh(&self) -> Result<String, AuthError> {
        let refresh_token = self
            .store
            .read(REFRESH_TOKEN_KEY)
            .await
            .ok_or(AuthError::TokenInvalid)?;

        let request = ApiRequest::post("refresh", json!({ "refreshToken": refresh_token }));
        let response = self.transport.execute(&request).await?;
        if !response.is_success() {
            return Err(AuthError::Api {
                status: response.status,
                code: response.error_code().map(str::to_string),
            });
        }

        let parsed: RefreshResponse = response.json()?;
        self.persist_tokens(&parsed.token, &parsed.refresh_token)
            .await;
        debug!("Access token rotated");
        Ok(parsed.token)
    }

    async fn persist_tokens(&self, token: &str, refresh_token: &str) {
        self.store
            .write(ACCESS_TOKEN_KEY, token, self.session_ttl)
            .await;
        self.store
            .write(REFRESH_TOKEN_KEY, refresh_token, self.session_ttl)
            .await;
        *self.bearer.write().await = Some(token.to_string());
    }

    async fn irrecoverable(&self) -> Result<ApiResponse, AuthError> {
        warn!("Access denied for a non-expiry reason");
        if self.context == RuntimeContext::Interactive {
            self.sign_out().await;
        }
        Err(AuthError::TokenInvalid)
    }

    /// Clear local session state: stored tokens and the bearer slot.
    /// The pure half of sign-out; safe to call when already signed out.
    pub async fn clear_session(&self) {
        self.store.delete(ACCESS_TOKEN_KEY).await;
        self.store.delete(REFRESH_TOKEN_KEY).await;
        *self.bearer.write().await = None;
        debug!("Session cleared");
    }

    /// Sign out this context and notify every other open context
    pub async fn sign_out(&self) {
        self.clear_session().await;
        self.channel.publish_sign_out();
    }

    /// Subscribe to sign-out notifications from other contexts
    pub fn subscribe(&self) -> AuthSubscription {
        self.channel.subscribe()
    }

    /// Run local cleanup whenever another context signs out. Receivers
    /// never re-publish, so the notification propagates exactly once.
    pub fn listen_for_sign_out(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        let client = Arc::clone(self);
        let mut subscription = client.subscribe();
        tokio::spawn(async move {
            while subscription.recv_sign_out().await {
                debug!("Received sign-out from another context");
                client.clear_session().await;
            }
        })
    }

    /// The persisted access token for the current context, if any
    pub async fn stored_access_token(&self) -> Option<String> {
        self.store.read(ACCESS_TOKEN_KEY).await
    }
}
