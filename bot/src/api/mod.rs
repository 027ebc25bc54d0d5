use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{instrument, warn};

pub use shared::github::*;

pub mod prometheus;
pub mod types;

use self::types::*;

pub const DEFAULT_API_URL: &str = "https://api.github.com";

#[derive(Debug, Clone)]
pub struct Repository {
    pub id: NodeId,
    pub label: Option<Label>,
}

/// One page of search results.
#[derive(Debug, Clone, Default)]
pub struct SearchPage {
    pub total_count: u64,
    pub items: Vec<PullRequestCandidate>,
    pub end_cursor: Option<String>,
    pub has_next_page: bool,
}

impl From<SearchPayload> for SearchPage {
    fn from(search: SearchPayload) -> Self {
        Self {
            total_count: search.issue_count,
            items: search
                .nodes
                .into_iter()
                .flatten()
                .flatten()
                .filter_map(Fragment::matched)
                .map(Into::into)
                .collect(),
            end_cursor: search.page_info.end_cursor,
            has_next_page: search.page_info.has_next_page,
        }
    }
}

/// The queries and mutations the run needs from GitHub.
///
/// Mutations report `false` when GitHub answered without the mutated object.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait GithubApi: Send + Sync {
    async fn repository_with_label(
        &self,
        owner: &str,
        repo: &str,
        label_name: &str,
    ) -> anyhow::Result<Option<Repository>>;

    async fn create_label(
        &self,
        repository_id: &str,
        label: &LabelSpec,
    ) -> anyhow::Result<Option<Label>>;

    /// `None` if the response has no search payload.
    async fn search_pull_requests(
        &self,
        query: &str,
        cursor: Option<String>,
        page_size: u32,
    ) -> anyhow::Result<Option<SearchPage>>;

    async fn add_label(&self, labelable_id: &str, label_id: &str) -> anyhow::Result<bool>;

    async fn remove_label(&self, labelable_id: &str, label_id: &str) -> anyhow::Result<bool>;

    async fn add_comment(&self, subject_id: &str, body: &str) -> anyhow::Result<bool>;

    async fn close_pull_request(&self, id: &str) -> anyhow::Result<bool>;
}

#[derive(Clone)]
pub struct GithubClient {
    octocrab: octocrab::Octocrab,
    prometheus: Arc<prometheus::PrometheusClient>,
}

impl GithubClient {
    pub fn new(
        github_token: String,
        api_url: &str,
        prometheus: Arc<prometheus::PrometheusClient>,
    ) -> anyhow::Result<Self> {
        let octocrab = octocrab::Octocrab::builder()
            .base_uri(api_url)?
            .personal_token(github_token)
            .build()?;

        Ok(Self {
            octocrab,
            prometheus,
        })
    }

    async fn graphql<T: DeserializeOwned>(
        &self,
        query: &str,
        variables: serde_json::Value,
    ) -> anyhow::Result<T> {
        let response: GraphqlResponse<T> = self
            .octocrab
            .post(
                "/graphql",
                Some(&json!({
                    "query": query,
                    "variables": variables,
                })),
            )
            .await?;

        let errors = response
            .errors
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ");

        match response.data {
            Some(data) => {
                if !errors.is_empty() {
                    warn!("GraphQL returned partial data: {errors}");
                }
                Ok(data)
            }
            None if errors.is_empty() => Err(anyhow::anyhow!("GraphQL response has no data")),
            None => Err(anyhow::anyhow!("GraphQL error: {errors}")),
        }
    }

    async fn query<T: DeserializeOwned>(
        &self,
        query: &str,
        variables: serde_json::Value,
    ) -> anyhow::Result<T> {
        self.prometheus.add_read_request();
        self.graphql(query, variables).await
    }

    async fn mutation<T: DeserializeOwned>(
        &self,
        mutation: &str,
        input: serde_json::Value,
    ) -> anyhow::Result<T> {
        self.prometheus.add_write_request();
        self.graphql(mutation, json!({ "input": input })).await
    }
}

#[async_trait::async_trait]
impl GithubApi for GithubClient {
    #[instrument(skip(self))]
    async fn repository_with_label(
        &self,
        owner: &str,
        repo: &str,
        label_name: &str,
    ) -> anyhow::Result<Option<Repository>> {
        let response: RepositoryQuery = self
            .query(
                REPOSITORY_QUERY,
                json!({
                    "owner": owner,
                    "repo": repo,
                    "labelName": label_name,
                }),
            )
            .await?;

        Ok(response.repository.map(|repository| Repository {
            id: repository.id,
            label: repository.label.map(Into::into),
        }))
    }

    #[instrument(skip(self))]
    async fn create_label(
        &self,
        repository_id: &str,
        label: &LabelSpec,
    ) -> anyhow::Result<Option<Label>> {
        let response: CreateLabelMutation = self
            .mutation(
                CREATE_LABEL_MUTATION,
                json!({
                    "repositoryId": repository_id,
                    "name": label.name,
                    "color": label.color,
                    "description": label.description,
                }),
            )
            .await?;

        Ok(response
            .create_label
            .and_then(|created| created.label)
            .map(Into::into))
    }

    #[instrument(skip(self))]
    async fn search_pull_requests(
        &self,
        query: &str,
        cursor: Option<String>,
        page_size: u32,
    ) -> anyhow::Result<Option<SearchPage>> {
        let response: SearchQuery = self
            .query(
                SEARCH_QUERY,
                json!({
                    "search": query,
                    "cursor": cursor,
                    "first": page_size,
                    "labels": LABELS_PER_PULL_REQUEST,
                    "events": LABEL_EVENTS_PER_PULL_REQUEST,
                }),
            )
            .await?;

        Ok(response.search.map(Into::into))
    }

    #[instrument(skip(self))]
    async fn add_label(&self, labelable_id: &str, label_id: &str) -> anyhow::Result<bool> {
        let response: LabelableMutation = self
            .mutation(
                ADD_LABELS_MUTATION,
                json!({
                    "labelableId": labelable_id,
                    "labelIds": [label_id],
                }),
            )
            .await?;
        Ok(response.succeeded())
    }

    #[instrument(skip(self))]
    async fn remove_label(&self, labelable_id: &str, label_id: &str) -> anyhow::Result<bool> {
        let response: LabelableMutation = self
            .mutation(
                REMOVE_LABELS_MUTATION,
                json!({
                    "labelableId": labelable_id,
                    "labelIds": [label_id],
                }),
            )
            .await?;
        Ok(response.succeeded())
    }

    #[instrument(skip(self, body))]
    async fn add_comment(&self, subject_id: &str, body: &str) -> anyhow::Result<bool> {
        let response: AddCommentMutation = self
            .mutation(
                ADD_COMMENT_MUTATION,
                json!({
                    "subjectId": subject_id,
                    "body": body,
                }),
            )
            .await?;
        Ok(response.succeeded())
    }

    #[instrument(skip(self))]
    async fn close_pull_request(&self, id: &str) -> anyhow::Result<bool> {
        let response: ClosePullRequestMutation = self
            .mutation(
                CLOSE_PULL_REQUEST_MUTATION,
                json!({
                    "pullRequestId": id,
                }),
            )
            .await?;
        Ok(response.succeeded())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    async fn client(server: &MockServer) -> (GithubClient, Arc<prometheus::PrometheusClient>) {
        let prometheus: Arc<prometheus::PrometheusClient> = Default::default();
        let client =
            GithubClient::new("token".to_string(), &server.uri(), prometheus.clone()).unwrap();
        (client, prometheus)
    }

    #[tokio::test]
    async fn repository_with_existing_label() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/graphql"))
            .and(body_partial_json(json!({
                "variables": { "owner": "octo", "repo": "repo", "labelName": "stale" }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {
                    "repository": {
                        "id": "R_1",
                        "label": { "id": "LA_1", "name": "stale" }
                    }
                }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let (client, prometheus) = client(&server).await;
        let repository = client
            .repository_with_label("octo", "repo", "stale")
            .await
            .unwrap()
            .unwrap();

        assert_eq!(repository.id, "R_1");
        assert_eq!(repository.label, Some(Label::new("LA_1", "stale")));
        assert!(prometheus
            .encode()
            .unwrap()
            .contains("github_api_read_requests_total 1"));
    }

    #[tokio::test]
    async fn missing_repository_with_graphql_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/graphql"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": { "repository": null },
                "errors": [{
                    "type": "NOT_FOUND",
                    "message": "Could not resolve to a Repository with the name 'octo/missing'."
                }]
            })))
            .mount(&server)
            .await;

        let (client, _) = client(&server).await;
        let repository = client
            .repository_with_label("octo", "missing", "stale")
            .await
            .unwrap();

        assert!(repository.is_none());
    }

    #[tokio::test]
    async fn errors_without_data_fail() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/graphql"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "errors": [{ "message": "Bad credentials" }]
            })))
            .mount(&server)
            .await;

        let (client, _) = client(&server).await;
        let error = client
            .search_pull_requests("repo:octo/repo is:pr", None, 1)
            .await
            .unwrap_err();

        assert!(error.to_string().contains("Bad credentials"));
    }

    #[tokio::test]
    async fn search_sends_cursor_and_page_size() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/graphql"))
            .and(body_partial_json(json!({
                "variables": {
                    "search": "repo:octo/repo is:pr is:open is:draft",
                    "cursor": "abc",
                    "first": 1
                }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {
                    "search": {
                        "issueCount": 4,
                        "nodes": [{
                            "id": "PR_9",
                            "number": 9,
                            "updatedAt": "2024-01-01T00:00:00Z",
                            "labels": { "nodes": [] },
                            "timelineItems": { "nodes": [] }
                        }],
                        "pageInfo": { "endCursor": "def", "hasNextPage": true }
                    }
                }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let (client, _) = client(&server).await;
        let page = client
            .search_pull_requests(
                "repo:octo/repo is:pr is:open is:draft",
                Some("abc".to_string()),
                1,
            )
            .await
            .unwrap()
            .unwrap();

        assert_eq!(page.total_count, 4);
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].number, 9);
        assert_eq!(page.end_cursor.as_deref(), Some("def"));
        assert!(page.has_next_page);
    }

    #[tokio::test]
    async fn mutations_report_success_and_count_writes() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/graphql"))
            .and(body_partial_json(json!({
                "variables": { "input": { "labelableId": "PR_1", "labelIds": ["LA_1"] } }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": { "addLabelsToLabelable": { "labelable": { "id": "PR_1" } } }
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/graphql"))
            .and(body_partial_json(json!({
                "variables": { "input": { "pullRequestId": "PR_1" } }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": { "closePullRequest": null }
            })))
            .mount(&server)
            .await;

        let (client, prometheus) = client(&server).await;
        assert!(client.add_label("PR_1", "LA_1").await.unwrap());
        assert!(!client.close_pull_request("PR_1").await.unwrap());
        assert!(prometheus
            .encode()
            .unwrap()
            .contains("github_api_write_requests_total 2"));
    }

    #[tokio::test]
    async fn http_errors_propagate() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/graphql"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&server)
            .await;

        let (client, _) = client(&server).await;
        assert!(client.add_comment("PR_1", "hello").await.is_err());
    }
}
