use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use tracing::{info, instrument};

use shared::{github::RepoInfo, workflow};

use crate::{
    api::{prometheus::PrometheusClient, GithubApi},
    config::Settings,
    error::StaleError,
    messages::MessageLoader,
};

use self::result::RunResult;

pub mod actions;
pub mod classify;
pub(crate) mod common;
pub mod label;
pub mod result;
pub mod search;

#[derive(Clone)]
pub struct Context {
    pub github: Arc<dyn GithubApi>,
    pub messages: Arc<MessageLoader>,
    pub prometheus: Arc<PrometheusClient>,
    pub settings: Arc<Settings>,
}

pub async fn run(context: &Context, repo: &RepoInfo) -> Result<Option<RunResult>, StaleError> {
    run_at(context, repo, Utc::now()).await
}

/// One full pass over the repository's open drafts, with `now` fixed for
/// every comparison. `None` means there was nothing to check.
#[instrument(skip(context), fields(repo = %repo.full_id))]
pub async fn run_at(
    context: &Context,
    repo: &RepoInfo,
    now: DateTime<Utc>,
) -> Result<Option<RunResult>, StaleError> {
    let stale_label = label::ensure_label(
        context.github.as_ref(),
        repo,
        &context.settings.stale_label,
    )
    .await?;

    let candidates = search::fetch_all_open_draft_pull_requests(
        context.github.as_ref(),
        repo,
        context.settings.ignored_label.as_deref(),
    )
    .await?;

    if candidates.total_count == 0 {
        info!("No pull requests found. Stopping.");
        return Ok(None);
    }

    info!(
        "Found {} matching pull requests to check.",
        candidates.total_count
    );
    context.prometheus.set_candidates(candidates.total_count);

    workflow::group("Labeling process");
    let dispatched = join_all(
        candidates
            .items
            .iter()
            .map(|pr| actions::dispatch(context, pr, &stale_label, now)),
    )
    .await;
    workflow::end_group();

    Ok(Some(dispatched.into_iter().collect()))
}
