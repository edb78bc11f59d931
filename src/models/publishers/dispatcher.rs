use super::{DiscordAdapter, RedditAdapter, RedditEndpoints, TargetAdapter, WebhookAdapter};
use crate::models::{
    Credential, CredentialResolver, DeliveryOutcome, DispatchResult, PublishError,
    PublishRequest, TargetId,
};
use reqwest::Client;
use std::sync::Arc;
use tokio::task::JoinHandle;

pub fn create_adapter(
    target: &TargetId,
    credential: Credential,
    client: &Client,
    reddit_endpoints: &RedditEndpoints,
) -> Result<Arc<dyn TargetAdapter>, PublishError> {
    match (target, credential) {
        (TargetId::Reddit { .. }, Credential::Reddit(connection)) => {
            Ok(Arc::new(RedditAdapter::new(
                target.clone(),
                connection,
                reddit_endpoints.clone(),
                client.clone(),
            )))
        }
        (TargetId::Discord { .. }, Credential::Discord(webhook)) => Ok(Arc::new(
            DiscordAdapter::new(target.clone(), webhook, client.clone()),
        )),
        (TargetId::Webhook { .. }, Credential::Webhook(webhook)) => Ok(Arc::new(
            WebhookAdapter::new(target.clone(), webhook, client.clone()),
        )),
        _ => Err(PublishError::MissingCredential {
            target: target.to_string(),
        }),
    }
}

enum Pending {
    Settled(DeliveryOutcome),
    Running {
        target: TargetId,
        label: String,
        handle: JoinHandle<DeliveryOutcome>,
    },
}

/// Awaits every delivery in submission order. A task that panicked or was
/// cancelled becomes a failed outcome for its own target.
async fn settle(pending: Vec<Pending>) -> Vec<DeliveryOutcome> {
    let mut outcomes = Vec::with_capacity(pending.len());
    for entry in pending {
        let outcome = match entry {
            Pending::Settled(outcome) => outcome,
            Pending::Running {
                target,
                label,
                handle,
            } => match handle.await {
                Ok(outcome) => outcome,
                Err(e) => {
                    DeliveryOutcome::failure(&target, label, format!("delivery task failed: {}", e))
                }
            },
        };

        if outcome.succeeded {
            log::info!("✓ Published to {}: {}", outcome.label, outcome.message);
        } else {
            log::error!("✗ Failed to publish to {}: {}", outcome.label, outcome.message);
        }
        outcomes.push(outcome);
    }
    outcomes
}

/// Fans one request out to every selected target and waits for all of them.
pub struct Dispatcher {
    resolver: Arc<dyn CredentialResolver>,
    client: Client,
    reddit_endpoints: RedditEndpoints,
}

impl Dispatcher {
    pub fn new(resolver: Arc<dyn CredentialResolver>, client: Client) -> Self {
        Self {
            resolver,
            client,
            reddit_endpoints: RedditEndpoints::default(),
        }
    }

    pub fn with_reddit_endpoints(mut self, endpoints: RedditEndpoints) -> Self {
        self.reddit_endpoints = endpoints;
        self
    }

    pub fn adapter_for(&self, target: &TargetId) -> Result<Arc<dyn TargetAdapter>, PublishError> {
        let credential = self.resolver.resolve(target)?;
        create_adapter(target, credential, &self.client, &self.reddit_endpoints)
    }

    /// Delivers `request` to all of its targets concurrently.
    ///
    /// Fails only when the request does not validate; in that case no
    /// network call is made. Otherwise the result holds exactly one outcome
    /// per target, in submission order.
    pub async fn dispatch(&self, request: &PublishRequest) -> Result<DispatchResult, PublishError> {
        request.validate()?;

        let shared = Arc::new(request.clone());
        let mut pending = Vec::with_capacity(request.targets.len());

        for target in &request.targets {
            match self.adapter_for(target) {
                Ok(adapter) => {
                    log::debug!("Dispatching to {}", target);
                    let label = adapter.label();
                    let request = Arc::clone(&shared);
                    let handle = tokio::spawn(async move { adapter.deliver(&request).await });
                    pending.push(Pending::Running {
                        target: target.clone(),
                        label,
                        handle,
                    });
                }
                Err(e) => {
                    log::warn!("Skipping {}: {}", target, e);
                    pending.push(Pending::Settled(DeliveryOutcome::failure(
                        target,
                        target.default_label(),
                        e.to_string(),
                    )));
                }
            }
        }

        let outcomes = settle(pending).await;

        let result = DispatchResult::new(outcomes);
        log::info!(
            "Published to {}/{} targets",
            result.succeeded_count(),
            result.len()
        );

        Ok(result)
    }

    /// Checks the stored connection for one target.
    pub async fn verify(&self, target: &TargetId) -> Result<String, PublishError> {
        self.adapter_for(target)?.verify().await
    }
}
