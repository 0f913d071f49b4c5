// Walk through the full session lifecycle against a running session API:
// sign in, load a guarded page, expire-and-refresh transparently, sign out.
use auth_client::{
    with_authentication, AccessRequirement, ApiClient, ApiClientOptions, AuthChannel, Config,
    Credentials, MemoryTokenStore, PageResult, RuntimeContext,
};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "auth_client=debug".into()),
        )
        .init();

    let client = Arc::new(ApiClient::new(ApiClientOptions {
        config: Config::from_env()?,
        store: Arc::new(MemoryTokenStore::new()),
        channel: AuthChannel::new(),
        context: RuntimeContext::Interactive,
    }));
    let listener = client.listen_for_sign_out();

    let session = client
        .sign_in(&Credentials {
            email: std::env::var("DEMO_EMAIL")?,
            password: std::env::var("DEMO_PASSWORD")?,
        })
        .await?;
    println!("Signed in as {}", session.email);

    let requirement = AccessRequirement::new(["metrics.list"], ["administrator"]);
    let page = with_authentication(&client, Some(&requirement), || async {
        let profile = client.fetch_profile().await?;
        Ok(PageResult::Props(profile))
    })
    .await;

    match page {
        PageResult::Props(profile) => println!("Metrics page loaded for {}", profile.email),
        PageResult::Redirect { destination, .. } => println!("Redirected to {destination}"),
        PageResult::NotFound => println!("Page data unavailable"),
    }

    client.sign_out().await;
    listener.abort();

    Ok(())
}
