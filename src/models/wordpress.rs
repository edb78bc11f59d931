use crate::models::{compose_content, strip_html, PublishError, PublishRequest, WordPressConnection};
use base64::{engine::general_purpose, Engine as _};
use reqwest::header::AUTHORIZATION;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;

const POSTS_PER_PAGE: u32 = 20;

/// Adds `https://` when no scheme is given and drops trailing slashes.
pub fn normalize_domain(input: &str) -> String {
    let trimmed = input.trim();
    let with_scheme = if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    };
    with_scheme.trim_end_matches('/').to_string()
}

#[derive(Debug, Default, Deserialize)]
struct Rendered {
    #[serde(default)]
    rendered: String,
}

#[derive(Debug, Deserialize)]
struct FeaturedMedia {
    source_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct Embedded {
    #[serde(default, rename = "wp:featuredmedia")]
    featured_media: Vec<FeaturedMedia>,
}

#[derive(Debug, Deserialize)]
struct RawPost {
    id: u64,
    #[serde(default)]
    title: Rendered,
    #[serde(default)]
    excerpt: Rendered,
    link: String,
    #[serde(default)]
    date: String,
    #[serde(default, rename = "_embedded")]
    embedded: Embedded,
}

/// A published WordPress post with its markup already stripped.
#[derive(Debug, Clone, PartialEq)]
pub struct WordPressPost {
    pub id: u64,
    pub title: String,
    pub excerpt: String,
    pub link: String,
    pub date: String,
    pub featured_image_url: Option<String>,
}

impl From<RawPost> for WordPressPost {
    fn from(raw: RawPost) -> Self {
        Self {
            id: raw.id,
            title: strip_html(&raw.title.rendered),
            excerpt: strip_html(&raw.excerpt.rendered),
            link: raw.link,
            date: raw.date,
            featured_image_url: raw
                .embedded
                .featured_media
                .into_iter()
                .next()
                .and_then(|m| m.source_url)
                .filter(|u| !u.is_empty()),
        }
    }
}

impl WordPressPost {
    /// Title as the request title, excerpt and permalink as the body, and
    /// the featured image when the post has one.
    pub fn to_request(&self) -> PublishRequest {
        let body = [self.excerpt.as_str(), self.link.as_str()]
            .iter()
            .filter(|part| !part.is_empty())
            .copied()
            .collect::<Vec<_>>()
            .join("\n\n");

        let mut request = PublishRequest::new(body).with_title(self.title.clone());
        if let Some(image) = &self.featured_image_url {
            request = request.with_image_url(image.clone());
        }
        request
    }

    pub fn caption(&self) -> String {
        let request = self.to_request();
        compose_content(request.title(), &request.content)
    }
}

/// Reads posts from a WordPress site to use as publish payloads.
pub struct WordPressSource {
    connection: WordPressConnection,
    base_url: String,
    client: Client,
}

impl WordPressSource {
    pub fn new(connection: WordPressConnection, client: Client) -> Self {
        let base_url = normalize_domain(&connection.domain);
        Self {
            connection,
            base_url,
            client,
        }
    }

    pub fn site_label(&self) -> &str {
        self.connection
            .site_name
            .as_deref()
            .filter(|name| !name.is_empty())
            .unwrap_or(self.base_url.as_str())
    }

    fn auth_header(&self) -> String {
        format!(
            "Basic {}",
            general_purpose::STANDARD.encode(format!(
                "{}:{}",
                self.connection.username, self.connection.application_password
            ))
        )
    }

    async fn get(&self, path: &str) -> Result<reqwest::Response, PublishError> {
        let response = self
            .client
            .get(format!("{}{}", self.base_url, path))
            .header(AUTHORIZATION, self.auth_header())
            .send()
            .await?;
        log::debug!("WordPress {} response status: {}", path, response.status());
        Ok(response)
    }

    /// Latest posts, newest first, with featured images embedded.
    pub async fn fetch_posts(&self) -> Result<Vec<WordPressPost>, PublishError> {
        let response = self
            .get(&format!(
                "/wp-json/wp/v2/posts?per_page={}&_embed=1",
                POSTS_PER_PAGE
            ))
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(PublishError::Source(format!(
                "Failed to fetch WordPress posts: {}",
                status
            )));
        }

        let raw: Vec<RawPost> = response.json().await?;
        let posts: Vec<WordPressPost> = raw.into_iter().map(WordPressPost::from).collect();
        log::info!("Fetched {} posts from {}", posts.len(), self.site_label());
        Ok(posts)
    }

    pub async fn fetch_post(&self, id: u64) -> Result<WordPressPost, PublishError> {
        let response = self
            .get(&format!("/wp-json/wp/v2/posts/{}?_embed=1", id))
            .await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(PublishError::Source(format!("WordPress post {} not found", id)));
        }
        if !status.is_success() {
            return Err(PublishError::Source(format!(
                "Failed to fetch WordPress post {}: {}",
                id, status
            )));
        }

        let raw: RawPost = response.json().await?;
        Ok(raw.into())
    }

    /// Checks the application password against `/users/me`.
    pub async fn verify(&self) -> Result<String, PublishError> {
        let response = self.get("/wp-json/wp/v2/users/me").await?;

        let status = response.status();
        if !status.is_success() {
            return Err(PublishError::Auth {
                platform: "WordPress",
                detail: format!(
                    "{} (invalid credentials or REST API not available)",
                    status
                ),
            });
        }

        let me: Value = response.json().await?;
        Ok(format!(
            "Authenticated as: {}",
            me["name"].as_str().unwrap_or("unknown")
        ))
    }
}
