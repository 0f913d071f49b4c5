// Client-side authentication/session layer
//
// Issues and refreshes bearer tokens against the session API, propagates
// sign-out across open contexts, and gates page loads by permission/role.
// The core is the token-refresh protocol in refresh.rs: a single-flight
// refresh call that queues every request failing with an expired token
// and replays them once the rotated token is available.

pub mod broadcast;
pub mod claims;
pub mod client;
pub mod config;
pub mod error;
pub mod guard;
pub mod permissions;
pub mod refresh;
pub mod store;
pub mod transport;

pub use broadcast::{AuthChannel, AuthSubscription};
pub use claims::{decode_claims, Claims};
pub use client::{ApiClient, ApiClientOptions, Credentials, RuntimeContext, Session};
pub use config::Config;
pub use error::AuthError;
pub use guard::{with_authentication, with_guest, PageResult};
pub use permissions::AccessRequirement;
pub use refresh::RefreshCoordinator;
pub use store::{MemoryTokenStore, TokenStore};
pub use transport::{ApiRequest, ApiResponse, HttpTransport, Transport};
