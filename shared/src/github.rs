use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Node ID assigned by GitHub. Opaque and stable.
pub type NodeId = String;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    pub id: NodeId,
    pub name: String,
}

impl Label {
    pub fn new(id: impl Into<NodeId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }

    pub fn is(&self, label: &StaleLabel) -> bool {
        self.id == label.id || self.name == label.name
    }
}

/// The label that marks a pull request as stale. Resolved once per run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaleLabel {
    pub id: NodeId,
    pub name: String,
}

impl From<Label> for StaleLabel {
    fn from(label: Label) -> Self {
        Self {
            id: label.id,
            name: label.name,
        }
    }
}

/// What to create when the stale label doesn't exist yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelSpec {
    pub name: String,
    /// 6 character hex code, without the leading `#`.
    pub color: String,
    pub description: String,
}

/// A label applied to a pull request at a given instant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelEvent {
    pub label: Label,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct PullRequestCandidate {
    pub id: NodeId,
    pub number: u64,
    pub updated_at: DateTime<Utc>,
    pub labels: Vec<Label>,
    /// Chronological, bounded to the most recent events.
    /// `None` when the history wasn't requested or returned.
    pub label_events: Option<Vec<LabelEvent>>,
}

impl PullRequestCandidate {
    pub fn has_label(&self, label: &StaleLabel) -> bool {
        self.labels.iter().any(|l| l.is(label))
    }

    /// Most recent application of `label`.
    /// The outer `None` means there is no history to look at.
    pub fn last_labeled(&self, label: &StaleLabel) -> Option<Option<&LabelEvent>> {
        self.label_events
            .as_ref()
            .map(|events| events.iter().rev().find(|event| event.label.is(label)))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoInfo {
    pub owner: String,
    pub repo: String,
    pub full_id: String,
}

impl RepoInfo {
    pub fn new(owner: impl Into<String>, repo: impl Into<String>) -> Self {
        let owner = owner.into();
        let repo = repo.into();
        let full_id = format!("{}/{}", owner, repo);
        Self {
            owner,
            repo,
            full_id,
        }
    }

    /// Parses `owner/repo`, the format of `GITHUB_REPOSITORY`.
    pub fn parse(full_id: &str) -> Option<Self> {
        let (owner, repo) = full_id.trim().split_once('/')?;
        if owner.is_empty() || repo.is_empty() || repo.contains('/') {
            return None;
        }
        Some(Self::new(owner, repo))
    }
}
