use tracing::{info, instrument};

use shared::github::PullRequestCandidate;

use crate::{events::Context, messages::MsgCategory};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PullRequestClose {}

impl PullRequestClose {
    #[instrument(skip(self, pr, context), fields(pr = pr.number))]
    pub async fn apply(&self, pr: &PullRequestCandidate, context: &Context) -> anyhow::Result<bool> {
        info!("Closing #{} as stale...", pr.number);

        context.github.close_pull_request(&pr.id).await
    }

    pub async fn notify(&self, pr: &PullRequestCandidate, context: &Context) -> anyhow::Result<()> {
        context.reply(pr, MsgCategory::CloseMessage).await
    }
}
