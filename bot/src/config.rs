use std::path::PathBuf;

use anyhow::Context as _;
use serde::Deserialize;

use shared::{github::LabelSpec, Threshold};

use crate::events::classify::Staleness;

pub const DEFAULT_UNSTALE_TOLERANCE_SECONDS: i64 = 10;

/// Runner environment.
#[derive(Debug, Deserialize)]
pub struct Env {
    pub github_repository: String,
    #[serde(default = "default_api_url")]
    pub github_api_url: String,
    pub github_output: Option<PathBuf>,
    pub github_token: Option<String>,
    pub metrics_file: Option<PathBuf>,
}

fn default_api_url() -> String {
    crate::api::DEFAULT_API_URL.to_string()
}

/// Action inputs, exported by the runner as `INPUT_<NAME>`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Inputs {
    pub repo_token: Option<String>,
    pub stale_pr_label: Option<String>,
    pub stale_pr_label_color: Option<String>,
    pub stale_pr_label_description: Option<String>,
    pub ignored_label: Option<String>,
    pub stale_pr_message: Option<String>,
    pub close_pr_message: Option<String>,
    pub days_before_pr_stale: Option<String>,
    pub days_before_pr_close: Option<String>,
    pub unstale_tolerance_seconds: Option<String>,
    pub messages_file: Option<PathBuf>,
}

impl Inputs {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(envy::prefixed("INPUT_").from_env::<Self>()?)
    }
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub stale_label: LabelSpec,
    pub ignored_label: Option<String>,
    pub stale_pr_message: Option<String>,
    pub close_pr_message: Option<String>,
    pub messages_file: Option<PathBuf>,
    pub staleness: Staleness,
}

impl TryFrom<Inputs> for Settings {
    type Error = anyhow::Error;

    fn try_from(inputs: Inputs) -> anyhow::Result<Self> {
        let days_before_stale = parse_number(inputs.days_before_pr_stale, 60)
            .context("Invalid days-before-pr-stale")?;
        let days_before_close = parse_number(inputs.days_before_pr_close, 7)
            .context("Invalid days-before-pr-close")?;
        let tolerance = parse_number(
            inputs.unstale_tolerance_seconds,
            DEFAULT_UNSTALE_TOLERANCE_SECONDS,
        )
        .context("Invalid unstale-tolerance-seconds")?;
        let unstale_tolerance = chrono::TimeDelta::try_seconds(tolerance.max(0))
            .ok_or_else(|| anyhow::anyhow!("unstale-tolerance-seconds is out of range"))?;

        Ok(Self {
            stale_label: LabelSpec {
                name: non_empty(inputs.stale_pr_label).unwrap_or_else(|| "stale".to_string()),
                color: non_empty(inputs.stale_pr_label_color)
                    .map(|color| color.trim_start_matches('#').to_string())
                    .unwrap_or_else(|| "ffffff".to_string()),
                description: inputs.stale_pr_label_description.unwrap_or_default(),
            },
            ignored_label: non_empty(inputs.ignored_label),
            stale_pr_message: non_empty(inputs.stale_pr_message),
            close_pr_message: non_empty(inputs.close_pr_message),
            messages_file: inputs.messages_file.filter(|path| !path.as_os_str().is_empty()),
            staleness: Staleness {
                days_before_stale: Threshold::days(days_before_stale),
                days_before_close: Threshold::days(days_before_close),
                unstale_tolerance,
            },
        })
    }
}

/// Token from the `repo-token` input, falling back to `GITHUB_TOKEN`.
pub fn github_token(inputs: &Inputs, env: &Env) -> anyhow::Result<String> {
    non_empty(inputs.repo_token.clone())
        .or_else(|| non_empty(env.github_token.clone()))
        .ok_or_else(|| anyhow::anyhow!("Neither repo-token nor GITHUB_TOKEN is set"))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parse_number(value: Option<String>, default: i64) -> anyhow::Result<i64> {
    match non_empty(value) {
        Some(value) => Ok(value.parse()?),
        None => Ok(default),
    }
}
