#[derive(Debug, thiserror::Error)]
pub enum StaleError {
    #[error("Repository {owner}/{repo} not found.")]
    RepositoryNotFound { owner: String, repo: String },

    #[error("Could not create label {name}.")]
    LabelCreationFailure { name: String },

    #[error("An error occurred when querying for pull requests.")]
    SearchFailure,

    /// Local to one pull request. Never aborts the run.
    #[error("Failed to process #{number}: {source:#}")]
    CandidateActionFailure {
        number: u64,
        #[source]
        source: anyhow::Error,
    },

    #[error(transparent)]
    Api(#[from] anyhow::Error),
}

impl StaleError {
    pub fn candidate(number: u64, source: anyhow::Error) -> Self {
        Self::CandidateActionFailure { number, source }
    }

    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::CandidateActionFailure { .. })
    }
}
