use thiserror::Error;

/// Failures raised while preparing or delivering a publish request.
///
/// Only [`PublishError::Validation`] aborts a whole dispatch. Every other
/// variant is caught at the adapter boundary and reported as a failed
/// delivery outcome for the target that produced it.
#[derive(Debug, Error)]
pub enum PublishError {
    /// The request itself is unusable (empty payload, no targets, bad target id).
    #[error("{0}")]
    Validation(String),

    /// The target was selected but no connected credential is stored for it.
    #[error("not connected")]
    MissingCredential { target: String },

    /// The platform rejected the credential exchange.
    #[error("Failed to authenticate with {platform}: {detail}")]
    Auth {
        platform: &'static str,
        detail: String,
    },

    /// The platform refused the submission; carries the upstream message verbatim.
    #[error("{0}")]
    Submit(String),

    /// A webhook endpoint answered with a non-success status.
    #[error("webhook returned {status}: {detail}")]
    Webhook { status: u16, detail: String },

    /// The request never got a usable HTTP response.
    #[error("request failed: {0}")]
    Transport(#[source] reqwest::Error),

    /// A content source could not be read.
    #[error("{0}")]
    Source(String),
}

// Webhook URLs embed their secret token, so the URL never reaches a message.
impl From<reqwest::Error> for PublishError {
    fn from(e: reqwest::Error) -> Self {
        Self::Transport(e.without_url())
    }
}

impl PublishError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}
