use std::collections::HashMap;

use tracing::{info, trace, warn};

use shared::github::PullRequestCandidate;

use crate::messages::MsgCategory;

use super::*;

impl Context {
    /// Comments on the pull request with a message of the given category.
    /// Does nothing when no message is configured.
    pub async fn reply(&self, pr: &PullRequestCandidate, msg: MsgCategory) -> anyhow::Result<()> {
        let messages = self.messages.get_message(msg);
        if messages.is_empty() {
            trace!("No {msg} configured, skipping comment on #{}", pr.number);
            return Ok(());
        }

        info!("Posting comment on #{} about it...", pr.number);

        let staleness = &self.settings.staleness;
        let values = HashMap::from([
            ("pr_number", pr.number.to_string()),
            ("stale_label", self.settings.stale_label.name.clone()),
            ("days_before_stale", staleness.days_before_stale.to_string()),
            ("days_before_close", staleness.days_before_close.to_string()),
        ]);
        let text = messages.format(&values)?;

        if !self.github.add_comment(&pr.id, &text).await? {
            warn!("Comment on #{} was not created", pr.number);
        }
        Ok(())
    }
}
