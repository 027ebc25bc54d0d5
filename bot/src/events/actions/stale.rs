use tracing::{info, instrument};

use shared::github::{PullRequestCandidate, StaleLabel};

use crate::{events::Context, messages::MsgCategory};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PullRequestStale {}

impl PullRequestStale {
    #[instrument(skip(self, pr, context, stale_label), fields(pr = pr.number))]
    pub async fn apply(
        &self,
        pr: &PullRequestCandidate,
        context: &Context,
        stale_label: &StaleLabel,
    ) -> anyhow::Result<bool> {
        info!("Labeling #{} as stale...", pr.number);

        context.github.add_label(&pr.id, &stale_label.id).await
    }

    pub async fn notify(&self, pr: &PullRequestCandidate, context: &Context) -> anyhow::Result<()> {
        context.reply(pr, MsgCategory::StaleMessage).await
    }
}
