mod close;
mod stale;
mod unstale;

use chrono::{DateTime, Utc};
use tracing::{error, instrument, trace};

use shared::github::{PullRequestCandidate, StaleLabel};

use crate::error::StaleError;

use super::{
    classify::{classify, State},
    Context,
};

pub use close::*;
pub use stale::*;
pub use unstale::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Stale(PullRequestStale),
    Close(PullRequestClose),
    Unstale(PullRequestUnstale),
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Action::Stale(_) => write!(f, "Stale"),
            Action::Close(_) => write!(f, "Close"),
            Action::Unstale(_) => write!(f, "Unstale"),
        }
    }
}

impl Action {
    pub fn stale() -> Self {
        Self::Stale(PullRequestStale {})
    }

    pub fn close() -> Self {
        Self::Close(PullRequestClose {})
    }

    pub fn unstale() -> Self {
        Self::Unstale(PullRequestUnstale {})
    }

    /// Runs the mutation. `Ok(false)` means GitHub didn't apply it.
    pub async fn apply(
        &self,
        pr: &PullRequestCandidate,
        context: &Context,
        stale_label: &StaleLabel,
    ) -> anyhow::Result<bool> {
        match self {
            Action::Stale(action) => action.apply(pr, context, stale_label).await,
            Action::Close(action) => action.apply(pr, context).await,
            Action::Unstale(action) => action.apply(pr, context, stale_label).await,
        }
    }

    /// Posts the follow-up comment, if the action has one configured.
    pub async fn notify(&self, pr: &PullRequestCandidate, context: &Context) -> anyhow::Result<()> {
        match self {
            Action::Stale(action) => action.notify(pr, context).await,
            Action::Close(action) => action.notify(pr, context).await,
            Action::Unstale(_) => Ok(()),
        }
    }
}

/// Outcome of one candidate's pipeline.
#[derive(Debug)]
pub struct Dispatch {
    pub number: u64,
    /// `None` when the candidate needed nothing.
    pub action: Option<Action>,
    /// The mutation went through.
    pub affected: bool,
    pub failure: Option<StaleError>,
}

impl Dispatch {
    fn untouched(number: u64) -> Self {
        Self {
            number,
            action: None,
            affected: false,
            failure: None,
        }
    }

    fn fail(&mut self, source: anyhow::Error) {
        let failure = StaleError::candidate(self.number, source);
        error!("{failure}");
        self.failure = Some(failure);
    }
}

/// Classifies a candidate and applies whatever its state calls for.
/// Never fails: errors are logged and kept in the returned [`Dispatch`].
#[instrument(skip(context, pr, stale_label), fields(pr = pr.number))]
pub async fn dispatch(
    context: &Context,
    pr: &PullRequestCandidate,
    stale_label: &StaleLabel,
    now: DateTime<Utc>,
) -> Dispatch {
    let state = classify(pr, stale_label, now, &context.settings.staleness);
    let action = match state {
        State::Fresh | State::RemainsStale => {
            trace!("#{} is {:?}. Nothing to do", pr.number, state);
            return Dispatch::untouched(pr.number);
        }
        State::BecomeStale => Action::stale(),
        State::BecomeClosed => Action::close(),
        State::BecomeFresh => Action::unstale(),
    };

    let mut result = Dispatch {
        number: pr.number,
        action: Some(action),
        affected: false,
        failure: None,
    };

    match action.apply(pr, context, stale_label).await {
        Ok(affected) => {
            result.affected = affected;
            context.prometheus.record(&action, affected);
        }
        Err(e) => {
            context.prometheus.record(&action, false);
            result.fail(e);
            return result;
        }
    }

    if !result.affected {
        trace!("{action} on #{} didn't go through. Skipping comment", pr.number);
        return result;
    }

    if let Err(e) = action.notify(pr, context).await {
        result.fail(e);
    }

    result
}
