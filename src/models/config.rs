use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

const DISCORD_WEBHOOK_PREFIXES: [&str; 2] = [
    "https://discord.com/api/webhooks/",
    "https://discordapp.com/api/webhooks/",
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub connections: ConnectionsConfig,
    #[serde(default)]
    pub templates: HashMap<String, ContentTemplate>,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub endpoints: EndpointsConfig,
    pub storage: StorageConfig,
}

/// Stored platform connections, keyed by platform and then by record id.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConnectionsConfig {
    pub reddit: Option<RedditConnection>,
    #[serde(default)]
    pub discord_webhooks: Vec<DiscordWebhook>,
    #[serde(default)]
    pub webhooks: Vec<WebhookConnection>,
    /// Content source, not a publish target.
    #[serde(default)]
    pub wordpress: Option<WordPressConnection>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditConnection {
    pub client_id: String,
    pub client_secret: String,
    pub username: String,
    pub password: String,
    pub user_agent: String,
    #[serde(default = "default_connected")]
    pub connected: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscordWebhook {
    pub id: String,
    pub name: String,
    pub webhook_url: String,
    #[serde(default = "default_connected")]
    pub connected: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookConnection {
    pub id: String,
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub headers: HashMap<String, String>,
    #[serde(default = "default_connected")]
    pub connected: bool,
}

/// WordPress site read through its REST API with an application password.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WordPressConnection {
    pub domain: String,
    pub username: String,
    pub application_password: String,
    #[serde(default)]
    pub site_name: Option<String>,
    #[serde(default = "default_connected")]
    pub connected: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentTemplate {
    pub platform: String,
    pub body: String,
    #[serde(default)]
    pub hashtags: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointsConfig {
    pub reddit_auth_url: String,
    pub reddit_api_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub data_dir: String,
    pub posts_file: String,
}

fn default_connected() -> bool {
    true
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 30,
        }
    }
}

impl Default for EndpointsConfig {
    fn default() -> Self {
        Self {
            reddit_auth_url: "https://www.reddit.com/api/v1/access_token".to_string(),
            reddit_api_url: "https://oauth.reddit.com".to_string(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            connections: ConnectionsConfig::default(),
            templates: HashMap::new(),
            http: HttpConfig::default(),
            endpoints: EndpointsConfig::default(),
            storage: StorageConfig {
                data_dir: "./data".to_string(),
                posts_file: "posts.json".to_string(),
            },
        }
    }
}

impl AppConfig {
    pub fn validate(&self) -> Result<()> {
        if self.http.timeout_seconds == 0 {
            return Err(anyhow::anyhow!("http.timeout_seconds must be greater than 0"));
        }

        for webhook in &self.connections.discord_webhooks {
            if !DISCORD_WEBHOOK_PREFIXES
                .iter()
                .any(|prefix| webhook.webhook_url.starts_with(prefix))
            {
                return Err(anyhow::anyhow!(
                    "Discord webhook '{}' has an invalid URL; expected one starting with {}",
                    webhook.id,
                    DISCORD_WEBHOOK_PREFIXES[0]
                ));
            }
        }

        for webhook in &self.connections.webhooks {
            url::Url::parse(&webhook.url).map_err(|e| {
                anyhow::anyhow!("Webhook '{}' has an invalid URL: {}", webhook.id, e)
            })?;
        }

        if let Some(wordpress) = &self.connections.wordpress {
            url::Url::parse(&crate::models::normalize_domain(&wordpress.domain)).map_err(|e| {
                anyhow::anyhow!("WordPress domain '{}' is invalid: {}", wordpress.domain, e)
            })?;
        }

        let mut seen = std::collections::HashSet::new();
        for id in self
            .connections
            .discord_webhooks
            .iter()
            .map(|w| format!("discord:{}", w.id))
            .chain(
                self.connections
                    .webhooks
                    .iter()
                    .map(|w| format!("webhook:{}", w.id)),
            )
        {
            if !seen.insert(id.clone()) {
                return Err(anyhow::anyhow!("Duplicate connection id '{}'", id));
            }
        }

        log::info!("Configuration validation passed");
        Ok(())
    }
}
