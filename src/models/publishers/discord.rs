use super::TargetAdapter;
use crate::models::{DiscordWebhook, PublishError, PublishRequest, TargetId};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

/// Accent colour shown on the left edge of every embed.
pub const DISCORD_EMBED_COLOR: u32 = 5814783;

pub struct DiscordAdapter {
    target: TargetId,
    webhook: DiscordWebhook,
    client: Client,
}

impl DiscordAdapter {
    pub fn new(target: TargetId, webhook: DiscordWebhook, client: Client) -> Self {
        Self {
            target,
            webhook,
            client,
        }
    }

    async fn post(&self, payload: &Value) -> Result<(), PublishError> {
        let response = self
            .client
            .post(&self.webhook.webhook_url)
            .json(payload)
            .send()
            .await?;

        let status = response.status();
        log::debug!("Discord webhook {} response status: {}", self.webhook.id, status);

        if status.is_success() {
            Ok(())
        } else {
            let error_text = response.text().await.unwrap_or_default();
            Err(PublishError::Webhook {
                status: status.as_u16(),
                detail: error_text,
            })
        }
    }
}

pub fn embed_payload(request: &PublishRequest) -> Value {
    let mut embed = json!({
        "description": request.content,
        "color": DISCORD_EMBED_COLOR,
        "timestamp": chrono::Utc::now().to_rfc3339()
    });

    if let Some(title) = request.title() {
        embed["title"] = json!(title);
    }

    if let Some(image_url) = request.image_url() {
        embed["image"] = json!({ "url": image_url });
    }

    json!({ "embeds": [embed] })
}

#[async_trait]
impl TargetAdapter for DiscordAdapter {
    fn target(&self) -> &TargetId {
        &self.target
    }

    fn label(&self) -> String {
        format!("Discord ({})", self.webhook.name)
    }

    async fn send(&self, request: &PublishRequest) -> Result<String, PublishError> {
        self.post(&embed_payload(request)).await?;
        Ok(format!("Posted embed to {}", self.webhook.name))
    }

    async fn verify(&self) -> Result<String, PublishError> {
        let payload = json!({
            "content": "✅ Test message from publishrs - your Discord webhook is working correctly!"
        });
        self.post(&payload).await?;
        Ok(format!("Test message sent to {}", self.webhook.name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{StubRoute, StubServer};

    fn adapter(url: String) -> DiscordAdapter {
        DiscordAdapter::new(
            "discord:news".parse().unwrap(),
            DiscordWebhook {
                id: "news".to_string(),
                name: "News".to_string(),
                webhook_url: url,
                connected: true,
            },
            Client::new(),
        )
    }

    #[test]
    fn embed_has_title_and_image_when_present() {
        let request = PublishRequest::new("Body")
            .with_title("Launch")
            .with_image_url("https://img.example.com/a.png");
        let payload = embed_payload(&request);
        let embed = &payload["embeds"][0];

        assert_eq!(embed["title"], "Launch");
        assert_eq!(embed["description"], "Body");
        assert_eq!(embed["color"], 5814783);
        assert_eq!(embed["image"]["url"], "https://img.example.com/a.png");
        assert!(embed["timestamp"].as_str().is_some());
    }

    #[test]
    fn embed_omits_empty_title_and_image() {
        let request = PublishRequest::new("Body").with_title("").with_image_url(" ");
        let payload = embed_payload(&request);
        let embed = payload["embeds"][0].as_object().unwrap();

        assert!(!embed.contains_key("title"));
        assert!(!embed.contains_key("image"));
    }

    #[tokio::test]
    async fn posts_embed_to_webhook() {
        let server =
            StubServer::start(vec![StubRoute::post("/api/webhooks/1/abc", 204, "")]).await;

        let message = adapter(server.url("/api/webhooks/1/abc"))
            .send(&PublishRequest::new("Hello").with_title("Hi"))
            .await
            .unwrap();
        assert_eq!(message, "Posted embed to News");

        let requests = server.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].json()["embeds"][0]["description"], "Hello");
        assert_eq!(requests[0].header("content-type"), Some("application/json"));
    }

    #[tokio::test]
    async fn non_success_is_webhook_error() {
        let server = StubServer::start(vec![]).await;

        let err = adapter(server.url("/api/webhooks/1/missing"))
            .send(&PublishRequest::new("Hello"))
            .await
            .unwrap_err();
        assert!(matches!(err, PublishError::Webhook { status: 404, .. }));
    }

    #[tokio::test]
    async fn verify_sends_plain_content() {
        let server =
            StubServer::start(vec![StubRoute::post("/api/webhooks/1/abc", 204, "")]).await;

        adapter(server.url("/api/webhooks/1/abc"))
            .verify()
            .await
            .unwrap();
        let body = server.requests()[0].json();
        assert!(body["content"].as_str().unwrap().contains("Test message"));
        assert!(body.get("embeds").is_none());
    }
}
