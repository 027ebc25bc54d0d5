use tracing::{info, instrument};

use shared::github::{PullRequestCandidate, StaleLabel};

use crate::events::Context;

/// Activity resumed after the pull request was labeled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PullRequestUnstale {}

impl PullRequestUnstale {
    #[instrument(skip(self, pr, context, stale_label), fields(pr = pr.number))]
    pub async fn apply(
        &self,
        pr: &PullRequestCandidate,
        context: &Context,
        stale_label: &StaleLabel,
    ) -> anyhow::Result<bool> {
        info!("Removing stale label from #{}...", pr.number);

        context.github.remove_label(&pr.id, &stale_label.id).await
    }
}
