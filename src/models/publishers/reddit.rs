use super::TargetAdapter;
use crate::models::{EndpointsConfig, PublishError, PublishRequest, RedditConnection, TargetId};
use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use reqwest::header::{AUTHORIZATION, USER_AGENT};
use reqwest::Client;
use serde_json::Value;

const MAX_FALLBACK_TITLE_CHARS: usize = 100;

#[derive(Debug, Clone)]
pub struct RedditEndpoints {
    pub auth_url: String,
    pub api_url: String,
}

impl Default for RedditEndpoints {
    fn default() -> Self {
        Self::from(&EndpointsConfig::default())
    }
}

impl From<&EndpointsConfig> for RedditEndpoints {
    fn from(config: &EndpointsConfig) -> Self {
        Self {
            auth_url: config.reddit_auth_url.clone(),
            api_url: config.reddit_api_url.trim_end_matches('/').to_string(),
        }
    }
}

pub struct RedditAdapter {
    target: TargetId,
    subreddit: String,
    connection: RedditConnection,
    endpoints: RedditEndpoints,
    client: Client,
}

impl RedditAdapter {
    pub fn new(
        target: TargetId,
        connection: RedditConnection,
        endpoints: RedditEndpoints,
        client: Client,
    ) -> Self {
        let subreddit = match &target {
            TargetId::Reddit { subreddit } => subreddit.clone(),
            other => other.to_string(),
        };

        Self {
            target,
            subreddit,
            connection,
            endpoints,
            client,
        }
    }

    /// Password-grant token exchange for a "script" type Reddit app.
    async fn access_token(&self) -> Result<String, PublishError> {
        let auth_header = format!(
            "Basic {}",
            general_purpose::STANDARD.encode(format!(
                "{}:{}",
                self.connection.client_id, self.connection.client_secret
            ))
        );

        let params = [
            ("grant_type", "password"),
            ("username", self.connection.username.as_str()),
            ("password", self.connection.password.as_str()),
        ];

        let response = self
            .client
            .post(&self.endpoints.auth_url)
            .header(AUTHORIZATION, auth_header)
            .header(USER_AGENT, self.connection.user_agent.as_str())
            .form(&params)
            .send()
            .await?;

        let status = response.status();
        log::debug!("Reddit token exchange response status: {}", status);

        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(PublishError::Auth {
                platform: "Reddit",
                detail: format!("{} {}", status, error_body).trim().to_string(),
            });
        }

        let token_data: Value = response.json().await?;

        // Bad user credentials come back as 200 with an `error` field.
        match token_data["access_token"].as_str() {
            Some(token) => Ok(token.to_string()),
            None => Err(PublishError::Auth {
                platform: "Reddit",
                detail: token_data["error"]
                    .as_str()
                    .unwrap_or("no access_token in response")
                    .to_string(),
            }),
        }
    }

    fn submit_form(&self, request: &PublishRequest) -> Vec<(&'static str, String)> {
        let title = match request.title() {
            Some(title) => title.to_string(),
            None => request
                .content
                .chars()
                .take(MAX_FALLBACK_TITLE_CHARS)
                .collect(),
        };

        let link = request
            .image_url()
            .filter(|u| u.starts_with("http://") || u.starts_with("https://"));

        let mut form = vec![
            ("api_type", "json".to_string()),
            ("sr", self.subreddit.clone()),
            ("title", title),
        ];

        match link {
            Some(url) => {
                form.push(("kind", "link".to_string()));
                form.push(("url", url.to_string()));
            }
            None => {
                form.push(("kind", "self".to_string()));
                form.push(("text", request.content.clone()));
            }
        }

        form
    }
}

#[async_trait]
impl TargetAdapter for RedditAdapter {
    fn target(&self) -> &TargetId {
        &self.target
    }

    fn label(&self) -> String {
        format!("Reddit (r/{})", self.subreddit)
    }

    async fn send(&self, request: &PublishRequest) -> Result<String, PublishError> {
        let access_token = self.access_token().await?;
        let form = self.submit_form(request);

        let response = self
            .client
            .post(format!("{}/api/submit", self.endpoints.api_url))
            .bearer_auth(&access_token)
            .header(USER_AGENT, self.connection.user_agent.as_str())
            .form(&form)
            .send()
            .await?;

        let status = response.status();
        log::debug!("Reddit submit response status: {}", status);

        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<Value>(&error_body)
                .ok()
                .and_then(|v| v["message"].as_str().map(str::to_string))
                .or_else(|| Some(error_body.trim().to_string()).filter(|b| !b.is_empty()))
                .unwrap_or_else(|| "Failed to post to Reddit".to_string());
            return Err(PublishError::Submit(message));
        }

        let result: Value = response.json().await?;

        // With api_type=json, rejected submissions still answer 200.
        if let Some(errors) = result["json"]["errors"].as_array() {
            if !errors.is_empty() {
                let message = errors
                    .iter()
                    .map(|e| match e.as_array() {
                        Some(parts) => parts
                            .iter()
                            .filter_map(Value::as_str)
                            .collect::<Vec<_>>()
                            .join(": "),
                        None => e.to_string(),
                    })
                    .collect::<Vec<_>>()
                    .join("; ");
                return Err(PublishError::Submit(message));
            }
        }

        Ok(result["json"]["data"]["url"]
            .as_str()
            .unwrap_or("Posted to Reddit")
            .to_string())
    }

    async fn verify(&self) -> Result<String, PublishError> {
        let access_token = self.access_token().await?;

        let response = self
            .client
            .get(format!("{}/api/v1/me", self.endpoints.api_url))
            .bearer_auth(&access_token)
            .header(USER_AGENT, self.connection.user_agent.as_str())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(PublishError::Auth {
                platform: "Reddit",
                detail: format!("{} {}", status, error_body).trim().to_string(),
            });
        }

        let me: Value = response.json().await?;
        Ok(format!(
            "Authenticated as: u/{}",
            me["name"].as_str().unwrap_or("unknown")
        ))
    }
}
