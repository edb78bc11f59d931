use super::TargetAdapter;
use crate::models::{PublishError, PublishRequest, TargetId, WebhookConnection};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

/// Posts the raw payload as JSON to any endpoint that accepts it.
pub struct WebhookAdapter {
    target: TargetId,
    webhook: WebhookConnection,
    client: Client,
}

impl WebhookAdapter {
    pub fn new(target: TargetId, webhook: WebhookConnection, client: Client) -> Self {
        Self {
            target,
            webhook,
            client,
        }
    }

    async fn post(&self, payload: &Value) -> Result<(), PublishError> {
        let mut builder = self.client.post(&self.webhook.url).json(payload);
        for (name, value) in &self.webhook.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = builder.send().await?;
        let status = response.status();

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

#[async_trait]
impl TargetAdapter for WebhookAdapter {
    fn target(&self) -> &TargetId {
        &self.target
    }

    fn label(&self) -> String {
        format!("Webhook ({})", self.webhook.name)
    }

    async fn send(&self, request: &PublishRequest) -> Result<String, PublishError> {
        let payload = json!({
            "title": request.title(),
            "content": request.content,
            "image_url": request.image_url(),
            "timestamp": chrono::Utc::now().to_rfc3339()
        });

        self.post(&payload).await?;
        Ok(format!("Delivered to {}", self.webhook.name))
    }

    async fn verify(&self) -> Result<String, PublishError> {
        self.post(&json!({ "test": true })).await?;
        Ok(format!("{} accepted a test payload", self.webhook.name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{closed_url, StubRoute, StubServer};
    use std::collections::HashMap;

    fn adapter(url: String) -> WebhookAdapter {
        WebhookAdapter::new(
            "webhook:zap".parse().unwrap(),
            WebhookConnection {
                id: "zap".to_string(),
                name: "Zapier".to_string(),
                url,
                headers: HashMap::from([("X-Api-Key".to_string(), "k1".to_string())]),
                connected: true,
            },
            Client::new(),
        )
    }

    #[tokio::test]
    async fn sends_payload_with_custom_headers() {
        let server = StubServer::start(vec![StubRoute::post("/hooks/in", 202, "{}")]).await;

        let message = adapter(server.url("/hooks/in"))
            .send(&PublishRequest::new("Body").with_title("Title"))
            .await
            .unwrap();
        assert_eq!(message, "Delivered to Zapier");

        let request = &server.requests()[0];
        assert_eq!(request.header("x-api-key"), Some("k1"));
        let body = request.json();
        assert_eq!(body["title"], "Title");
        assert_eq!(body["content"], "Body");
        assert!(body["image_url"].is_null());
    }

    #[tokio::test]
    async fn non_success_carries_status_and_body() {
        let server =
            StubServer::start(vec![StubRoute::post("/hooks/in", 500, "upstream exploded")]).await;

        let err = adapter(server.url("/hooks/in"))
            .send(&PublishRequest::new("Body"))
            .await
            .unwrap_err();

        assert!(matches!(err, PublishError::Webhook { status: 500, .. }));
        assert_eq!(err.to_string(), "webhook returned 500: upstream exploded");
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_transport_error_without_url() {
        let url = closed_url("/hooks/catch/12345/s3cr3t").await;

        let err = adapter(url)
            .send(&PublishRequest::new("Body"))
            .await
            .unwrap_err();

        assert!(matches!(err, PublishError::Transport(_)));
        assert!(!err.to_string().contains("s3cr3t"));
        assert!(!err.to_string().contains("127.0.0.1"));
    }
}
