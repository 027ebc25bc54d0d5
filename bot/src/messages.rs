use rand::seq::SliceRandom;
use rand::thread_rng;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;
use tracing::error;

use crate::config::Settings;

/// Placeholders that messages may use, written as `{name}`.
pub const VARIABLES: [&str; 4] = [
    "pr_number",
    "stale_label",
    "days_before_stale",
    "days_before_close",
];

#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub enum MsgCategory {
    StaleMessage,
    CloseMessage,
}

impl std::fmt::Display for MsgCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct Messages {
    #[serde(default)]
    message: Vec<String>,
    #[serde(default)]
    variables: HashSet<String>,
}

impl Messages {
    pub fn new(message: Vec<String>, variables: HashSet<String>) -> Self {
        Self { message, variables }
    }

    /// A single variant, using whichever known placeholders it mentions.
    pub fn single(message: String) -> Self {
        let variables = VARIABLES
            .iter()
            .filter(|key| message.contains(&format!("{{{key}}}")))
            .map(|key| key.to_string())
            .collect();
        Self::new(vec![message], variables)
    }

    pub fn is_empty(&self) -> bool {
        self.message.iter().all(|message| message.trim().is_empty())
    }

    pub fn format(&self, values: &HashMap<&'static str, String>) -> anyhow::Result<String> {
        let candidates = self
            .message
            .iter()
            .filter(|message| !message.trim().is_empty())
            .collect::<Vec<_>>();
        let mut formatted_message = candidates
            .choose(&mut thread_rng())
            .ok_or_else(|| anyhow::anyhow!("Failed to choose randomly a message"))?
            .to_string();
        for key in self.variables.iter() {
            if let Some(value) = values.get(key.as_str()) {
                formatted_message = formatted_message.replace(&format!("{{{}}}", key), value);
            } else {
                error!(
                    "The message expects a variable: {}, but it wasn't provided",
                    key
                );
            }
        }
        Ok(formatted_message)
    }
}

#[derive(Serialize, Deserialize, Debug, Default)]
pub struct MessageLoader {
    #[serde(default)]
    pub stale_pr_messages: Messages,
    #[serde(default)]
    pub close_pr_messages: Messages,
}

impl MessageLoader {
    pub fn load_from_file(file_path: &Path) -> anyhow::Result<Self> {
        let file_content = fs::read_to_string(file_path)?;
        let result: Self = toml::from_str(&file_content)?;
        tracing::trace!("Loaded messages: {:#?}", result);
        Ok(result)
    }

    /// Inline messages win over the file, so a workflow can override a shared file.
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let mut result = match &settings.messages_file {
            Some(path) => Self::load_from_file(path)?,
            None => Self::default(),
        };

        if let Some(message) = &settings.stale_pr_message {
            result.stale_pr_messages = Messages::single(message.clone());
        }
        if let Some(message) = &settings.close_pr_message {
            result.close_pr_messages = Messages::single(message.clone());
        }
        Ok(result)
    }

    pub fn get_message(&self, category: MsgCategory) -> &Messages {
        match category {
            MsgCategory::StaleMessage => &self.stale_pr_messages,
            MsgCategory::CloseMessage => &self.close_pr_messages,
        }
    }
}
