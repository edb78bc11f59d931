use crate::models::{DeliveryOutcome, PublishError, PublishRequest, TargetId};
use async_trait::async_trait;

/// Turns a generic publish request into one platform call.
#[async_trait]
pub trait TargetAdapter: Send + Sync {
    fn target(&self) -> &TargetId;
    fn label(&self) -> String;

    /// Performs the platform call; the success value is a human-readable confirmation.
    async fn send(&self, request: &PublishRequest) -> Result<String, PublishError>;

    /// Checks that the stored connection works without publishing anything.
    async fn verify(&self) -> Result<String, PublishError>;

    /// Adapter boundary: every failure becomes a failed outcome.
    async fn deliver(&self, request: &PublishRequest) -> DeliveryOutcome {
        match self.send(request).await {
            Ok(message) => DeliveryOutcome::success(self.target(), self.label(), message),
            Err(e) => DeliveryOutcome::failure(self.target(), self.label(), e.to_string()),
        }
    }
}

pub mod discord;
pub mod dispatcher;
pub mod reddit;
pub mod webhook;

pub use discord::DiscordAdapter;
pub use dispatcher::Dispatcher;
pub use reddit::{RedditAdapter, RedditEndpoints};
pub use webhook::WebhookAdapter;
