use serde_json::json;

use super::actions::{Action, Dispatch};

/// Pull requests examined for one transition, and those it went through for.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Category {
    pub examined: usize,
    pub affected: Vec<u64>,
}

impl Category {
    fn record(&mut self, number: u64, affected: bool) {
        self.examined += 1;
        if affected {
            self.affected.push(number);
        }
    }

    fn sort(&mut self) {
        self.affected.sort_unstable();
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunResult {
    pub staled: Category,
    pub closed: Category,
    pub unstaled: Category,
    /// Pull requests whose pipeline hit an error.
    pub failed: Vec<u64>,
}

impl RunResult {
    pub fn record(&mut self, dispatch: Dispatch) {
        if let Some(action) = dispatch.action {
            let category = match action {
                Action::Stale(_) => &mut self.staled,
                Action::Close(_) => &mut self.closed,
                Action::Unstale(_) => &mut self.unstaled,
            };
            category.record(dispatch.number, dispatch.affected);
        }
        if dispatch.failure.is_some() {
            self.failed.push(dispatch.number);
        }
    }

    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }

    pub fn notices(&self) -> [String; 3] {
        [
            format!(
                "Staled {} out of {} found new draft pull requests.",
                self.staled.affected.len(),
                self.staled.examined
            ),
            format!(
                "Closed {} out of {} found old draft pull requests.",
                self.closed.affected.len(),
                self.closed.examined
            ),
            format!(
                "Unstaled {} out of {} found updated draft pull requests.",
                self.unstaled.affected.len(),
                self.unstaled.examined
            ),
        ]
    }

    /// Step outputs as `(name, JSON array)` pairs.
    pub fn outputs(&self) -> [(&'static str, String); 3] {
        [
            ("staled-prs", json!(self.staled.affected).to_string()),
            ("closed-prs", json!(self.closed.affected).to_string()),
            ("unstaled-prs", json!(self.unstaled.affected).to_string()),
        ]
    }
}

impl FromIterator<Dispatch> for RunResult {
    fn from_iter<I: IntoIterator<Item = Dispatch>>(iter: I) -> Self {
        let mut result = Self::default();
        for dispatch in iter {
            result.record(dispatch);
        }
        result.staled.sort();
        result.closed.sort();
        result.unstaled.sort();
        result.failed.sort_unstable();
        result
    }
}
