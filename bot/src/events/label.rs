use tracing::{debug, info, instrument};

use shared::github::{LabelSpec, RepoInfo, StaleLabel};

use crate::{api::GithubApi, error::StaleError};

/// Finds the stale label in the repository, creating it when missing.
/// An existing label is used as-is, whatever its color and description.
#[instrument(skip(github, label), fields(repo = %repo.full_id, label = %label.name))]
pub async fn ensure_label(
    github: &dyn GithubApi,
    repo: &RepoInfo,
    label: &LabelSpec,
) -> Result<StaleLabel, StaleError> {
    let repository = github
        .repository_with_label(&repo.owner, &repo.repo, &label.name)
        .await?
        .ok_or_else(|| StaleError::RepositoryNotFound {
            owner: repo.owner.clone(),
            repo: repo.repo.clone(),
        })?;

    if let Some(existing) = repository.label {
        debug!("Found stale label {} ({})", existing.name, existing.id);
        return Ok(existing.into());
    }

    info!(
        "Could not find stale label named \"{}\", so creating a new one...",
        label.name
    );

    let created = github
        .create_label(&repository.id, label)
        .await?
        .ok_or_else(|| StaleError::LabelCreationFailure {
            name: label.name.clone(),
        })?;

    info!("Created a new stale label named \"{}\".", created.name);

    Ok(created.into())
}

#[cfg(test)]
mod tests {
    use shared::github::Label;

    use crate::api::{MockGithubApi, Repository};

    use super::*;

    fn label_spec() -> LabelSpec {
        LabelSpec {
            name: "stale".to_string(),
            color: "ffffff".to_string(),
            description: "Inactive draft".to_string(),
        }
    }

    fn repo() -> RepoInfo {
        RepoInfo::new("octo", "repo")
    }

    #[tokio::test]
    async fn existing_label_is_reused() {
        let mut github = MockGithubApi::new();
        github
            .expect_repository_with_label()
            .withf(|owner, repo, label| owner == "octo" && repo == "repo" && label == "stale")
            .times(1)
            .returning(|_, _, _| {
                Ok(Some(Repository {
                    id: "R_1".to_string(),
                    label: Some(Label::new("LA_1", "stale")),
                }))
            });
        github.expect_create_label().never();

        let label = ensure_label(&github, &repo(), &label_spec()).await.unwrap();
        assert_eq!(
            label,
            StaleLabel {
                id: "LA_1".to_string(),
                name: "stale".to_string()
            }
        );
    }

    #[tokio::test]
    async fn missing_label_is_created() {
        let mut github = MockGithubApi::new();
        github.expect_repository_with_label().returning(|_, _, _| {
            Ok(Some(Repository {
                id: "R_1".to_string(),
                label: None,
            }))
        });
        github
            .expect_create_label()
            .withf(|repository_id, label| repository_id == "R_1" && *label == label_spec())
            .times(1)
            .returning(|_, _| Ok(Some(Label::new("LA_2", "stale"))));

        let label = ensure_label(&github, &repo(), &label_spec()).await.unwrap();
        assert_eq!(label.id, "LA_2");
    }

    #[tokio::test]
    async fn missing_repository_is_fatal() {
        let mut github = MockGithubApi::new();
        github
            .expect_repository_with_label()
            .returning(|_, _, _| Ok(None));

        let error = ensure_label(&github, &repo(), &label_spec()).await.unwrap_err();
        assert!(matches!(error, StaleError::RepositoryNotFound { .. }));
        assert!(error.is_fatal());
        assert_eq!(error.to_string(), "Repository octo/repo not found.");
    }

    #[tokio::test]
    async fn empty_creation_response_is_fatal() {
        let mut github = MockGithubApi::new();
        github.expect_repository_with_label().returning(|_, _, _| {
            Ok(Some(Repository {
                id: "R_1".to_string(),
                label: None,
            }))
        });
        github.expect_create_label().returning(|_, _| Ok(None));

        let error = ensure_label(&github, &repo(), &label_spec()).await.unwrap_err();
        assert!(matches!(error, StaleError::LabelCreationFailure { ref name } if name == "stale"));
    }

    #[tokio::test]
    async fn transport_errors_propagate() {
        let mut github = MockGithubApi::new();
        github
            .expect_repository_with_label()
            .returning(|_, _, _| Err(anyhow::anyhow!("connection reset")));

        let error = ensure_label(&github, &repo(), &label_spec()).await.unwrap_err();
        assert!(matches!(error, StaleError::Api(_)));
    }
}
