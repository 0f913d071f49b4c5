//! End-to-end session scenarios: sign-in, guarded page loads, and
//! cross-context sign-out propagation.

use auth_client::store::{ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY};
use auth_client::{
    with_authentication, with_guest, AccessRequirement, ApiClient, ApiClientOptions, AuthChannel,
    Claims, Config, Credentials, MemoryTokenStore, PageResult, RuntimeContext, TokenStore,
};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

fn make_client(
    base_url: &str,
    store: Arc<MemoryTokenStore>,
    channel: AuthChannel,
    context: RuntimeContext,
) -> Arc<ApiClient> {
    Arc::new(ApiClient::new(ApiClientOptions {
        config: Config {
            api_base_url: base_url.to_string(),
            ..Config::default()
        },
        store,
        channel,
        context,
    }))
}

fn token_with(permissions: &[&str], roles: &[&str]) -> String {
    let claims = Claims {
        sub: "a@b.com".to_string(),
        permissions: permissions.iter().map(|s| s.to_string()).collect(),
        roles: roles.iter().map(|s| s.to_string()).collect(),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(b"server_secret"),
    )
    .unwrap()
}

#[tokio::test]
async fn sign_in_yields_a_session_with_the_granted_permissions() {
    let mut server = mockito::Server::new_async().await;

    let sessions_mock = server
        .mock("POST", "/sessions")
        .match_body(mockito::Matcher::Json(
            json!({"email": "a@b.com", "password": "x"}),
        ))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{
                "token": "T1",
                "refreshToken": "R1",
                "permissions": ["metrics.list"],
                "roles": []
            }"#,
        )
        .expect(1)
        .create_async()
        .await;

    let store = Arc::new(MemoryTokenStore::new());
    let client = make_client(
        &server.url(),
        store.clone(),
        AuthChannel::new(),
        RuntimeContext::Interactive,
    );

    let session = client
        .sign_in(&Credentials {
            email: "a@b.com".to_string(),
            password: "x".to_string(),
        })
        .await
        .unwrap();

    sessions_mock.assert_async().await;

    assert!(session.can_access(&AccessRequirement::new(
        ["metrics.list"],
        Vec::<&str>::new()
    )));
    assert!(!session.can_access(&AccessRequirement::new(
        Vec::<&str>::new(),
        ["administrator"]
    )));

    assert_eq!(store.read(ACCESS_TOKEN_KEY).await.as_deref(), Some("T1"));
    assert_eq!(store.read(REFRESH_TOKEN_KEY).await.as_deref(), Some("R1"));
}

#[tokio::test]
async fn guarded_page_load_fetches_profile_through_the_gateway() {
    let mut server = mockito::Server::new_async().await;
    let token = token_with(&["metrics.list"], &["administrator"]);

    let me_mock = server
        .mock("GET", "/me")
        .match_header("authorization", format!("Bearer {token}").as_str())
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{
                "email": "a@b.com",
                "permissions": ["metrics.list"],
                "roles": ["administrator"]
            }"#,
        )
        .expect(1)
        .create_async()
        .await;

    let store = Arc::new(MemoryTokenStore::new());
    store
        .write(ACCESS_TOKEN_KEY, &token, chrono::Duration::days(30))
        .await;
    let client = make_client(
        &server.url(),
        store,
        AuthChannel::new(),
        RuntimeContext::ServerSide,
    );

    let requirement = AccessRequirement::new(["metrics.list"], ["administrator"]);
    let result = with_authentication(&client, Some(&requirement), || async {
        let session = client.fetch_profile().await?;
        Ok(PageResult::Props(session.email))
    })
    .await;

    me_mock.assert_async().await;
    assert_eq!(result, PageResult::Props("a@b.com".to_string()));
}

#[tokio::test]
async fn guest_page_redirects_an_authenticated_visitor() {
    let store = Arc::new(MemoryTokenStore::new());
    store
        .write(ACCESS_TOKEN_KEY, "T1", chrono::Duration::days(30))
        .await;
    let client = make_client(
        "http://localhost:3333",
        store,
        AuthChannel::new(),
        RuntimeContext::ServerSide,
    );

    let result: PageResult<()> =
        with_guest(&client, || async { Ok(PageResult::Props(())) }).await;

    assert_eq!(
        result,
        PageResult::Redirect {
            destination: "/dashboard".to_string(),
            permanent: false,
        }
    );
}

#[tokio::test]
async fn sign_out_propagates_to_other_contexts() {
    // Two contexts ("tabs") sharing one channel but holding their own stores
    let channel = AuthChannel::new();

    let first_store = Arc::new(MemoryTokenStore::new());
    first_store
        .write(ACCESS_TOKEN_KEY, "T1", chrono::Duration::days(30))
        .await;
    let first = make_client(
        "http://localhost:3333",
        first_store.clone(),
        channel.clone(),
        RuntimeContext::Interactive,
    );

    let second_store = Arc::new(MemoryTokenStore::new());
    second_store
        .write(ACCESS_TOKEN_KEY, "T1", chrono::Duration::days(30))
        .await;
    let second = make_client(
        "http://localhost:3333",
        second_store.clone(),
        channel.clone(),
        RuntimeContext::Interactive,
    );
    let listener = second.listen_for_sign_out();

    first.sign_out().await;
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert!(first_store.read(ACCESS_TOKEN_KEY).await.is_none());
    assert!(
        second_store.read(ACCESS_TOKEN_KEY).await.is_none(),
        "The second context should clear its session on the broadcast"
    );

    // A repeated notification on an already signed-out context is a no-op
    first.sign_out().await;
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(second_store.read(ACCESS_TOKEN_KEY).await.is_none());

    listener.abort();
}
