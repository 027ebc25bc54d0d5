use tracing::{debug, instrument};

use shared::github::{PullRequestCandidate, RepoInfo};

use crate::{api::GithubApi, error::StaleError};

/// Keeps each response small, at the cost of one request per pull request.
pub const SEARCH_PAGE_SIZE: u32 = 1;

#[derive(Debug, Clone, Default)]
pub struct SearchResults {
    pub total_count: u64,
    pub items: Vec<PullRequestCandidate>,
}

pub fn search_query(repo: &RepoInfo, ignored_label: Option<&str>) -> String {
    let mut query = format!("repo:{} is:pr is:open is:draft", repo.full_id);
    if let Some(label) = ignored_label.filter(|label| !label.is_empty()) {
        if label.contains(char::is_whitespace) {
            query.push_str(&format!(" -label:\"{}\"", label));
        } else {
            query.push_str(&format!(" -label:{}", label));
        }
    }
    query
}

/// Walks every page of the search. Any page without a search payload, or
/// announcing a next page without a cursor, fails the whole fetch; partial
/// results are dropped.
#[instrument(skip(github), fields(repo = %repo.full_id))]
pub async fn fetch_all_open_draft_pull_requests(
    github: &dyn GithubApi,
    repo: &RepoInfo,
    ignored_label: Option<&str>,
) -> Result<SearchResults, StaleError> {
    let query = search_query(repo, ignored_label);
    let mut results = SearchResults::default();
    let mut cursor: Option<String> = None;

    loop {
        let page = github
            .search_pull_requests(&query, cursor.take(), SEARCH_PAGE_SIZE)
            .await?
            .ok_or(StaleError::SearchFailure)?;

        debug!(
            "Received {} pull requests, {} in total",
            page.items.len(),
            page.total_count
        );

        results.total_count = page.total_count;
        results.items.extend(page.items);

        if !page.has_next_page {
            break;
        }
        cursor = Some(page.end_cursor.ok_or(StaleError::SearchFailure)?);
    }

    Ok(results)
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use mockall::Sequence;

    use crate::api::{MockGithubApi, SearchPage};

    use super::*;

    fn repo() -> RepoInfo {
        RepoInfo::new("octo", "repo")
    }

    fn pr(number: u64) -> PullRequestCandidate {
        PullRequestCandidate {
            id: format!("PR_{number}"),
            number,
            updated_at: Utc::now(),
            labels: vec![],
            label_events: Some(vec![]),
        }
    }

    fn page(number: u64, end_cursor: &str, has_next_page: bool) -> SearchPage {
        SearchPage {
            total_count: 3,
            items: vec![pr(number)],
            end_cursor: Some(end_cursor.to_string()),
            has_next_page,
        }
    }

    #[test]
    fn query_string() {
        assert_eq!(
            search_query(&repo(), None),
            "repo:octo/repo is:pr is:open is:draft"
        );
        assert_eq!(
            search_query(&repo(), Some("")),
            "repo:octo/repo is:pr is:open is:draft"
        );
        assert_eq!(
            search_query(&repo(), Some("keep")),
            "repo:octo/repo is:pr is:open is:draft -label:keep"
        );
        assert_eq!(
            search_query(&repo(), Some("do not stale")),
            "repo:octo/repo is:pr is:open is:draft -label:\"do not stale\""
        );
    }

    #[tokio::test]
    async fn follows_cursors_until_last_page() {
        let mut github = MockGithubApi::new();
        let mut seq = Sequence::new();
        github
            .expect_search_pull_requests()
            .withf(|query, cursor, page_size| {
                query == "repo:octo/repo is:pr is:open is:draft -label:keep"
                    && cursor.is_none()
                    && *page_size == SEARCH_PAGE_SIZE
            })
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _, _| Ok(Some(page(30, "c1", true))));
        github
            .expect_search_pull_requests()
            .withf(|_, cursor, _| cursor.as_deref() == Some("c1"))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _, _| Ok(Some(page(10, "c2", true))));
        github
            .expect_search_pull_requests()
            .withf(|_, cursor, _| cursor.as_deref() == Some("c2"))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _, _| Ok(Some(page(20, "c3", false))));

        let results = fetch_all_open_draft_pull_requests(&github, &repo(), Some("keep"))
            .await
            .unwrap();

        assert_eq!(results.total_count, 3);
        let mut numbers = results.items.iter().map(|pr| pr.number).collect::<Vec<_>>();
        numbers.sort();
        assert_eq!(numbers, vec![10, 20, 30]);
    }

    #[tokio::test]
    async fn no_results() {
        let mut github = MockGithubApi::new();
        github
            .expect_search_pull_requests()
            .times(1)
            .returning(|_, _, _| {
                Ok(Some(SearchPage {
                    total_count: 0,
                    items: vec![],
                    end_cursor: None,
                    has_next_page: false,
                }))
            });

        let results = fetch_all_open_draft_pull_requests(&github, &repo(), None)
            .await
            .unwrap();
        assert_eq!(results.total_count, 0);
        assert!(results.items.is_empty());
    }

    #[tokio::test]
    async fn missing_payload_discards_partial_results() {
        let mut github = MockGithubApi::new();
        let mut seq = Sequence::new();
        github
            .expect_search_pull_requests()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _, _| Ok(Some(page(1, "c1", true))));
        github
            .expect_search_pull_requests()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _, _| Ok(None));

        let error = fetch_all_open_draft_pull_requests(&github, &repo(), None)
            .await
            .unwrap_err();
        assert!(matches!(error, StaleError::SearchFailure));
    }

    #[tokio::test]
    async fn missing_end_cursor_with_next_page_fails() {
        let mut github = MockGithubApi::new();
        github
            .expect_search_pull_requests()
            .withf(|_, cursor, _| cursor.is_none())
            .times(1)
            .returning(|_, _, _| {
                Ok(Some(SearchPage {
                    total_count: 2,
                    items: vec![pr(1)],
                    end_cursor: None,
                    has_next_page: true,
                }))
            });

        let error = fetch_all_open_draft_pull_requests(&github, &repo(), None)
            .await
            .unwrap_err();
        assert!(matches!(error, StaleError::SearchFailure));
    }

    #[tokio::test]
    async fn page_errors_are_not_retried() {
        let mut github = MockGithubApi::new();
        github
            .expect_search_pull_requests()
            .times(1)
            .returning(|_, _, _| Err(anyhow::anyhow!("rate limited")));

        let error = fetch_all_open_draft_pull_requests(&github, &repo(), None)
            .await
            .unwrap_err();
        assert!(matches!(error, StaleError::Api(_)));
    }
}
