use tokio::sync::broadcast;
use tracing::debug;

/// Name of the shared auth channel
pub const CHANNEL_NAME: &str = "auth";
/// Payload published when a context signs out
pub const SIGN_OUT_MESSAGE: &str = "signOut";

/// Cross-context sign-out notification channel
///
/// Every open context ("tab") sharing the channel subscribes; the context
/// performing an explicit sign-out publishes, and every other context runs
/// its local cleanup. Receivers never re-publish, so a sign-out propagates
/// exactly once.
#[derive(Clone)]
pub struct AuthChannel {
    sender: broadcast::Sender<String>,
}

impl AuthChannel {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(16);
        Self { sender }
    }

    /// Notify every subscribed context that the session ended
    pub fn publish_sign_out(&self) {
        debug!(channel = CHANNEL_NAME, "Publishing sign-out notification");
        // A send error only means no other context is listening
        let _ = self.sender.send(SIGN_OUT_MESSAGE.to_string());
    }

    pub fn subscribe(&self) -> AuthSubscription {
        AuthSubscription {
            receiver: self.sender.subscribe(),
        }
    }
}

impl Default for AuthChannel {
    fn default() -> Self {
        Self::new()
    }
}

/// One context's subscription to the auth channel
pub struct AuthSubscription {
    receiver: broadcast::Receiver<String>,
}

impl AuthSubscription {
    /// Wait for the next sign-out notification.
    ///
    /// Returns `false` when the channel is closed (every publisher dropped).
    /// Unknown payloads and lag are skipped.
    pub async fn recv_sign_out(&mut self) -> bool {
        loop {
            match self.receiver.recv().await {
                Ok(message) if message == SIGN_OUT_MESSAGE => return true,
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => return false,
            }
        }
    }
}
