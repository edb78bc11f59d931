use crate::models::{DispatchResult, PublishRequest};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    Draft,
    Scheduled,
    Published,
    Partial,
    Failed,
}

impl fmt::Display for PostStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PostStatus::Draft => "draft",
            PostStatus::Scheduled => "scheduled",
            PostStatus::Published => "published",
            PostStatus::Partial => "partial",
            PostStatus::Failed => "failed",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Post {
    pub id: Uuid,
    pub content: String,
    pub platform: String,
    pub status: PostStatus,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub template: Option<String>,
    #[serde(default)]
    pub delivery_log: Vec<String>,
}

impl Post {
    pub fn draft(content: String, platform: String, template: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            content,
            platform,
            status: PostStatus::Draft,
            published_at: None,
            created_at: Utc::now(),
            template,
            delivery_log: Vec::new(),
        }
    }

    /// Builds the record for a finished dispatch. `published_at` is only
    /// stamped when at least one target accepted the post.
    pub fn from_dispatch(request: &PublishRequest, result: &DispatchResult) -> Self {
        let now = Utc::now();
        let status = result.status();
        let platform = request
            .targets
            .first()
            .map(|t| t.platform().to_string())
            .unwrap_or_default();

        Self {
            id: Uuid::new_v4(),
            content: compose_content(request.title(), &request.content),
            platform,
            status,
            published_at: (status != PostStatus::Failed).then_some(now),
            created_at: now,
            template: None,
            delivery_log: result.message_log(),
        }
    }
}

pub fn compose_content(title: Option<&str>, content: &str) -> String {
    match title {
        Some(title) => format!("{}\n\n{}", title, content),
        None => content.to_string(),
    }
}

/// Every post recorded so far, oldest first.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PostHistory {
    pub posts: Vec<Post>,
}

impl PostHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, post: Post) {
        self.posts.push(post);
    }

    /// Newest posts first, at most `limit` of them.
    pub fn recent(&self, limit: usize) -> Vec<&Post> {
        let mut posts: Vec<&Post> = self.posts.iter().collect();
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        posts.truncate(limit);
        posts
    }

    pub fn count_by_status(&self, status: PostStatus) -> usize {
        self.posts.iter().filter(|p| p.status == status).count()
    }
}
