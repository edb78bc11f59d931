use crate::models::{PostStatus, TargetId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Result of one delivery attempt against one target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryOutcome {
    pub target: String,
    pub label: String,
    pub succeeded: bool,
    pub message: String,
}

impl DeliveryOutcome {
    pub fn success(target: &TargetId, label: String, message: impl Into<String>) -> Self {
        Self {
            target: target.to_string(),
            label,
            succeeded: true,
            message: message.into(),
        }
    }

    pub fn failure(target: &TargetId, label: String, message: impl Into<String>) -> Self {
        Self {
            target: target.to_string(),
            label,
            succeeded: false,
            message: message.into(),
        }
    }
}

/// Outcomes of one dispatch, in the order the targets were submitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchResult {
    outcomes: Vec<DeliveryOutcome>,
}

impl DispatchResult {
    pub fn new(outcomes: Vec<DeliveryOutcome>) -> Self {
        Self { outcomes }
    }

    pub fn outcomes(&self) -> &[DeliveryOutcome] {
        &self.outcomes
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn succeeded_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.succeeded).count()
    }

    pub fn status(&self) -> PostStatus {
        let succeeded = self.succeeded_count();
        if succeeded == 0 {
            PostStatus::Failed
        } else if succeeded == self.outcomes.len() {
            PostStatus::Published
        } else {
            PostStatus::Partial
        }
    }

    pub fn summary(&self) -> Summary {
        let mut summary = Summary::default();
        for outcome in &self.outcomes {
            if outcome.succeeded {
                summary.succeeded.push(outcome.label.clone());
            } else {
                summary
                    .failed
                    .push(format!("{}: {}", outcome.label, outcome.message));
            }
        }
        summary
    }

    /// One line per outcome, suitable for storing alongside the post.
    pub fn message_log(&self) -> Vec<String> {
        self.outcomes
            .iter()
            .map(|o| {
                let mark = if o.succeeded { "✓" } else { "✗" };
                format!("{} {}: {}", mark, o.label, o.message)
            })
            .collect()
    }
}

/// User-facing split of succeeded targets and failed targets with reasons.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Summary {
    pub succeeded: Vec<String>,
    pub failed: Vec<String>,
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut lines = Vec::new();
        if !self.succeeded.is_empty() {
            lines.push(format!(
                "Successfully published to: {}",
                self.succeeded.join(", ")
            ));
        }
        if !self.failed.is_empty() {
            lines.push(format!("Errors: {}", self.failed.join("; ")));
        }
        write!(f, "{}", lines.join("\n"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Aggregate {
    pub status: PostStatus,
    pub summary: Summary,
}

pub fn aggregate(result: &DispatchResult) -> Aggregate {
    Aggregate {
        status: result.status(),
        summary: result.summary(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn discord(id: &str) -> TargetId {
        TargetId::Discord {
            webhook_id: id.to_string(),
        }
    }

    fn ok(id: &str) -> DeliveryOutcome {
        DeliveryOutcome::success(&discord(id), format!("Discord ({})", id), "delivered")
    }

    fn failed(id: &str, why: &str) -> DeliveryOutcome {
        DeliveryOutcome::failure(&discord(id), format!("Discord ({})", id), why)
    }

    #[test]
    fn all_success_is_published() {
        let result = DispatchResult::new(vec![ok("a"), ok("b")]);
        let aggregate = aggregate(&result);
        assert_eq!(aggregate.status, PostStatus::Published);
        assert_eq!(
            aggregate.summary.to_string(),
            "Successfully published to: Discord (a), Discord (b)"
        );
    }

    #[test]
    fn mixed_is_partial() {
        let result = DispatchResult::new(vec![failed("a", "not connected"), ok("b")]);
        let aggregate = aggregate(&result);
        assert_eq!(aggregate.status, PostStatus::Partial);
        assert_eq!(
            aggregate.summary.to_string(),
            "Successfully published to: Discord (b)\nErrors: Discord (a): not connected"
        );
    }

    #[test]
    fn all_failed_is_failed() {
        let result = DispatchResult::new(vec![
            failed("a", "webhook returned 404: "),
            failed("b", "not connected"),
        ]);
        let aggregate = aggregate(&result);
        assert_eq!(aggregate.status, PostStatus::Failed);
        assert!(aggregate.summary.succeeded.is_empty());
        assert_eq!(aggregate.summary.failed.len(), 2);
    }

    #[test]
    fn aggregation_is_repeatable() {
        let result = DispatchResult::new(vec![ok("a"), failed("b", "boom")]);
        assert_eq!(aggregate(&result), aggregate(&result));
        assert_eq!(
            aggregate(&result).summary.to_string(),
            aggregate(&result).summary.to_string()
        );
    }

    #[test]
    fn message_log_keeps_submission_order() {
        let result = DispatchResult::new(vec![failed("z", "boom"), ok("a")]);
        assert_eq!(
            result.message_log(),
            vec![
                "✗ Discord (z): boom".to_string(),
                "✓ Discord (a): delivered".to_string()
            ]
        );
    }
}
