use chrono::{DateTime, TimeDelta, Utc};

pub const DAY_IN_MILLISECONDS: i64 = 24 * 60 * 60 * 1000;

/// Number of days of inactivity before a transition happens.
/// Any negative value disables the transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Threshold(i64);

impl Threshold {
    pub const fn days(days: i64) -> Self {
        Self(days)
    }

    pub const fn is_enabled(&self) -> bool {
        self.0 >= 0
    }

    /// Latest `updated_at` that still counts as inactive for long enough.
    /// `None` if disabled or if the cutoff falls outside the representable range.
    pub fn cutoff(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        if !self.is_enabled() {
            return None;
        }

        let millis = self.0.checked_mul(DAY_IN_MILLISECONDS)?;
        now.checked_sub_signed(TimeDelta::try_milliseconds(millis)?)
    }

    pub fn reached(&self, updated_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        self.cutoff(now)
            .is_some_and(|cutoff| updated_at <= cutoff)
    }
}

impl std::fmt::Display for Threshold {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
