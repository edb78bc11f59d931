use crate::models::{
    ConnectionsConfig, DiscordWebhook, PublishError, RedditConnection, TargetId,
    WebhookConnection,
};

/// Stored connection needed to authenticate against one target.
#[derive(Debug, Clone)]
pub enum Credential {
    Reddit(RedditConnection),
    Discord(DiscordWebhook),
    Webhook(WebhookConnection),
}

/// Keyed lookup from a target to its stored credential.
///
/// Implementations fail with [`PublishError::MissingCredential`] when the
/// platform has not been configured or the record is disconnected.
pub trait CredentialResolver: Send + Sync {
    fn resolve(&self, target: &TargetId) -> Result<Credential, PublishError>;
}

impl CredentialResolver for ConnectionsConfig {
    fn resolve(&self, target: &TargetId) -> Result<Credential, PublishError> {
        let found = match target {
            TargetId::Reddit { .. } => self
                .reddit
                .as_ref()
                .filter(|c| c.connected)
                .cloned()
                .map(Credential::Reddit),
            TargetId::Discord { webhook_id } => self
                .discord_webhooks
                .iter()
                .find(|w| &w.id == webhook_id && w.connected)
                .cloned()
                .map(Credential::Discord),
            TargetId::Webhook { webhook_id } => self
                .webhooks
                .iter()
                .find(|w| &w.id == webhook_id && w.connected)
                .cloned()
                .map(Credential::Webhook),
        };

        found.ok_or_else(|| PublishError::MissingCredential {
            target: target.to_string(),
        })
    }
}
