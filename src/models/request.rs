use crate::models::PublishError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifies one publish destination, written as `platform:name`
/// (`reddit:rust`, `discord:announcements`, `webhook:zapier`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TargetId {
    Reddit { subreddit: String },
    Discord { webhook_id: String },
    Webhook { webhook_id: String },
}

impl TargetId {
    pub fn platform(&self) -> &'static str {
        match self {
            TargetId::Reddit { .. } => "reddit",
            TargetId::Discord { .. } => "discord",
            TargetId::Webhook { .. } => "webhook",
        }
    }

    /// Label used when no credential is available to provide a nicer name.
    pub fn default_label(&self) -> String {
        match self {
            TargetId::Reddit { subreddit } => format!("Reddit (r/{})", subreddit),
            TargetId::Discord { webhook_id } => format!("Discord ({})", webhook_id),
            TargetId::Webhook { webhook_id } => format!("Webhook ({})", webhook_id),
        }
    }
}

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetId::Reddit { subreddit } => write!(f, "reddit:{}", subreddit),
            TargetId::Discord { webhook_id } => write!(f, "discord:{}", webhook_id),
            TargetId::Webhook { webhook_id } => write!(f, "webhook:{}", webhook_id),
        }
    }
}

impl FromStr for TargetId {
    type Err = PublishError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (platform, name) = s
            .split_once(':')
            .ok_or_else(|| PublishError::validation(format!("Invalid target '{}'", s)))?;
        let name = name.trim();

        if name.is_empty() {
            return Err(PublishError::validation(format!(
                "Target '{}' is missing a name",
                s
            )));
        }

        match platform.trim().to_ascii_lowercase().as_str() {
            "reddit" => Ok(TargetId::Reddit {
                subreddit: name.trim_start_matches("r/").to_string(),
            }),
            "discord" => Ok(TargetId::Discord {
                webhook_id: name.to_string(),
            }),
            "webhook" => Ok(TargetId::Webhook {
                webhook_id: name.to_string(),
            }),
            other => Err(PublishError::validation(format!(
                "Unknown platform '{}' in target '{}'",
                other, s
            ))),
        }
    }
}

impl TryFrom<String> for TargetId {
    type Error = PublishError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TargetId> for String {
    fn from(value: TargetId) -> Self {
        value.to_string()
    }
}

/// One authored payload plus the ordered set of targets it should reach.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PublishRequest {
    pub content: String,
    pub title: Option<String>,
    pub image_url: Option<String>,
    pub targets: Vec<TargetId>,
}

impl PublishRequest {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Self::default()
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_image_url(mut self, image_url: impl Into<String>) -> Self {
        self.image_url = Some(image_url.into());
        self
    }

    /// Adds a target, ignoring duplicates so the selection stays a set.
    pub fn with_target(mut self, target: TargetId) -> Self {
        if !self.targets.contains(&target) {
            self.targets.push(target);
        }
        self
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref().map(str::trim).filter(|t| !t.is_empty())
    }

    pub fn image_url(&self) -> Option<&str> {
        self.image_url
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
    }

    pub fn validate(&self) -> Result<(), PublishError> {
        if self.content.trim().is_empty() && self.title().is_none() {
            return Err(PublishError::validation("Please enter content or title"));
        }

        if self.targets.is_empty() {
            return Err(PublishError::validation(
                "Please select at least one platform to publish to",
            ));
        }

        Ok(())
    }
}
