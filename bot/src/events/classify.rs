use chrono::{DateTime, TimeDelta, Utc};

use shared::{
    github::{PullRequestCandidate, StaleLabel},
    Threshold,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// Not labeled and recently active.
    Fresh,
    BecomeStale,
    /// Labeled, not old enough to close, and untouched since labeling.
    RemainsStale,
    BecomeClosed,
    /// Labeled, but updated after the label was applied.
    BecomeFresh,
}

#[derive(Debug, Clone, Copy)]
pub struct Staleness {
    pub days_before_stale: Threshold,
    pub days_before_close: Threshold,
    /// Skew allowed between applying the label and the `updated_at` it causes.
    pub unstale_tolerance: TimeDelta,
}

pub fn classify(
    candidate: &PullRequestCandidate,
    stale_label: &StaleLabel,
    now: DateTime<Utc>,
    staleness: &Staleness,
) -> State {
    if !candidate.has_label(stale_label) {
        return if staleness
            .days_before_stale
            .reached(candidate.updated_at, now)
        {
            State::BecomeStale
        } else {
            State::Fresh
        };
    }

    if staleness
        .days_before_close
        .reached(candidate.updated_at, now)
    {
        return State::BecomeClosed;
    }

    match candidate.last_labeled(stale_label) {
        None => State::RemainsStale,
        Some(Some(event))
            if candidate.updated_at - event.created_at <= staleness.unstale_tolerance =>
        {
            State::RemainsStale
        }
        Some(_) => State::BecomeFresh,
    }
}
