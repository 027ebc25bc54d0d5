use serde::{de::Error as _, Deserialize, Deserializer};

use shared::github::{Label, LabelEvent, NodeId, PullRequestCandidate};

/// Labels and label events requested per pull request.
pub const LABELS_PER_PULL_REQUEST: u32 = 100;
pub const LABEL_EVENTS_PER_PULL_REQUEST: u32 = 100;

pub const REPOSITORY_QUERY: &str = r#"
query getRepositoryAndLabelWithin($repo: String!, $owner: String!, $labelName: String!) {
  repository(name: $repo, owner: $owner) {
    id
    label(name: $labelName) {
      id
      name
    }
  }
}
"#;

pub const CREATE_LABEL_MUTATION: &str = r#"
mutation createLabel($input: CreateLabelInput!) {
  createLabel(input: $input) {
    label {
      id
      name
    }
  }
}
"#;

pub const SEARCH_QUERY: &str = r#"
query PullRequestsQuery($search: String!, $cursor: String, $first: Int!, $labels: Int!, $events: Int!) {
  search(after: $cursor, first: $first, type: ISSUE, query: $search) {
    issueCount
    nodes {
      ... on PullRequest {
        id
        number
        updatedAt
        labels(first: $labels) {
          nodes {
            id
            name
          }
        }
        timelineItems(last: $events, itemTypes: [LABELED_EVENT]) {
          nodes {
            ... on LabeledEvent {
              createdAt
              label {
                id
                name
              }
            }
          }
        }
      }
    }
    pageInfo {
      endCursor
      hasNextPage
    }
  }
}
"#;

pub const ADD_LABELS_MUTATION: &str = r#"
mutation addLabels($input: AddLabelsToLabelableInput!) {
  addLabelsToLabelable(input: $input) {
    labelable {
      ... on PullRequest {
        id
      }
    }
  }
}
"#;

pub const REMOVE_LABELS_MUTATION: &str = r#"
mutation removeLabels($input: RemoveLabelsFromLabelableInput!) {
  removeLabelsFromLabelable(input: $input) {
    labelable {
      ... on PullRequest {
        id
      }
    }
  }
}
"#;

pub const ADD_COMMENT_MUTATION: &str = r#"
mutation addComment($input: AddCommentInput!) {
  addComment(input: $input) {
    commentEdge {
      node {
        id
      }
    }
  }
}
"#;

pub const CLOSE_PULL_REQUEST_MUTATION: &str = r#"
mutation closePullRequest($input: ClosePullRequestInput!) {
  closePullRequest(input: $input) {
    pullRequest {
      id
    }
  }
}
"#;

#[derive(Debug, Deserialize)]
pub struct GraphqlResponse<T> {
    pub data: Option<T>,
    #[serde(default)]
    pub errors: Vec<GraphqlError>,
}

#[derive(Debug, Deserialize)]
pub struct GraphqlError {
    pub message: String,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

impl std::fmt::Display for GraphqlError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.kind {
            Some(kind) => write!(f, "{} ({})", self.message, kind),
            None => write!(f, "{}", self.message),
        }
    }
}

/// Inline fragments (`... on PullRequest`) come back as empty objects
/// for nodes of other types. Anything else must decode as `T`.
#[derive(Debug)]
pub enum Fragment<T> {
    Matched(T),
    Other,
}

impl<'de, T> Deserialize<'de> for Fragment<T>
where
    T: serde::de::DeserializeOwned,
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        if value.as_object().is_some_and(|object| object.is_empty()) {
            return Ok(Fragment::Other);
        }
        T::deserialize(value).map(Fragment::Matched).map_err(D::Error::custom)
    }
}

impl<T> Fragment<T> {
    pub fn matched(self) -> Option<T> {
        match self {
            Fragment::Matched(value) => Some(value),
            Fragment::Other => None,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Connection<T> {
    pub nodes: Option<Vec<Option<T>>>,
}

impl<T> Connection<T> {
    pub fn into_nodes(self) -> impl Iterator<Item = T> {
        self.nodes.into_iter().flatten().flatten()
    }
}

#[derive(Debug, Deserialize)]
pub struct LabelNode {
    pub id: NodeId,
    pub name: String,
}

impl From<LabelNode> for Label {
    fn from(label: LabelNode) -> Self {
        Label::new(label.id, label.name)
    }
}

#[derive(Debug, Deserialize)]
pub struct RepositoryQuery {
    pub repository: Option<RepositoryNode>,
}

#[derive(Debug, Deserialize)]
pub struct RepositoryNode {
    pub id: NodeId,
    pub label: Option<LabelNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateLabelMutation {
    pub create_label: Option<CreatedLabel>,
}

#[derive(Debug, Deserialize)]
pub struct CreatedLabel {
    pub label: Option<LabelNode>,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub search: Option<SearchPayload>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchPayload {
    pub issue_count: u64,
    pub nodes: Option<Vec<Option<Fragment<PullRequestNode>>>>,
    pub page_info: PageInfo,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub end_cursor: Option<String>,
    pub has_next_page: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PullRequestNode {
    pub id: NodeId,
    pub number: u64,
    pub updated_at: chrono::DateTime<chrono::Utc>,
    pub labels: Option<Connection<LabelNode>>,
    pub timeline_items: Option<Connection<Fragment<LabeledEventNode>>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabeledEventNode {
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub label: LabelNode,
}

impl From<PullRequestNode> for PullRequestCandidate {
    fn from(pr: PullRequestNode) -> Self {
        let labels = pr
            .labels
            .map(|labels| labels.into_nodes().map(Label::from).collect())
            .unwrap_or_default();
        let label_events = pr.timeline_items.map(|items| {
            items
                .into_nodes()
                .filter_map(Fragment::matched)
                .map(|event| LabelEvent {
                    label: event.label.into(),
                    created_at: event.created_at,
                })
                .collect()
        });

        Self {
            id: pr.id,
            number: pr.number,
            updated_at: pr.updated_at,
            labels,
            label_events,
        }
    }
}

/// Mutations answer with the mutated object, or `null` if nothing happened.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelableMutation {
    #[serde(alias = "addLabelsToLabelable", alias = "removeLabelsFromLabelable")]
    pub payload: Option<LabelablePayload>,
}

#[derive(Debug, Deserialize)]
pub struct LabelablePayload {
    pub labelable: Option<serde_json::Value>,
}

impl LabelableMutation {
    pub fn succeeded(&self) -> bool {
        self.payload
            .as_ref()
            .and_then(|payload| payload.labelable.as_ref())
            .is_some_and(|labelable| !labelable.is_null())
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddCommentMutation {
    pub add_comment: Option<AddCommentPayload>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddCommentPayload {
    pub comment_edge: Option<serde_json::Value>,
}

impl AddCommentMutation {
    pub fn succeeded(&self) -> bool {
        self.add_comment
            .as_ref()
            .and_then(|payload| payload.comment_edge.as_ref())
            .is_some_and(|edge| !edge.is_null())
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClosePullRequestMutation {
    pub close_pull_request: Option<ClosePullRequestPayload>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClosePullRequestPayload {
    pub pull_request: Option<serde_json::Value>,
}

impl ClosePullRequestMutation {
    pub fn succeeded(&self) -> bool {
        self.close_pull_request
            .as_ref()
            .and_then(|payload| payload.pull_request.as_ref())
            .is_some_and(|pr| !pr.is_null())
    }
}
