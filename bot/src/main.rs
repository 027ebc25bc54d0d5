use std::{process::ExitCode, sync::Arc};

use shared::{github::RepoInfo, workflow};
use stale_drafts_bot::{
    api::{prometheus::PrometheusClient, GithubClient},
    config::{self, Env, Inputs, Settings},
    events::{self, result::RunResult, Context},
    messages::MessageLoader,
};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    dotenv::dotenv().ok();

    let subscriber = tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().without_time())
        .with(workflow::WorkflowCommands::stdout());
    tracing::subscriber::set_global_default(subscriber)?;

    let env = envy::from_env::<Env>()?;
    let inputs = Inputs::from_env()?;
    let token = config::github_token(&inputs, &env)?;
    let settings = Settings::try_from(inputs)?;
    let repo = RepoInfo::parse(&env.github_repository).ok_or_else(|| {
        anyhow::anyhow!("GITHUB_REPOSITORY is not owner/repo: {}", env.github_repository)
    })?;

    let prometheus: Arc<PrometheusClient> = Default::default();
    let github_api = GithubClient::new(token, &env.github_api_url, prometheus.clone())?;
    let messages = MessageLoader::from_settings(&settings)?;
    let context = Context {
        github: Arc::new(github_api),
        messages: messages.into(),
        prometheus: prometheus.clone(),
        settings: settings.into(),
    };

    let result = events::run(&context, &repo).await;
    write_metrics(&prometheus, &env);

    let result = match result {
        Ok(Some(result)) => result,
        Ok(None) => return Ok(ExitCode::SUCCESS),
        Err(e) => {
            error!("{e}");
            return Ok(ExitCode::FAILURE);
        }
    };

    report(&result, &env)?;

    if result.has_failures() {
        error!(
            "Failed to process {} pull request(s): {:?}",
            result.failed.len(),
            result.failed
        );
        return Ok(ExitCode::FAILURE);
    }

    Ok(ExitCode::SUCCESS)
}

fn report(result: &RunResult, env: &Env) -> anyhow::Result<()> {
    for notice in result.notices() {
        workflow::notice(&notice);
    }

    for (name, value) in result.outputs() {
        match &env.github_output {
            Some(path) => workflow::set_output(path, name, &value)?,
            None => info!("{name}={value}"),
        }
    }
    Ok(())
}

fn write_metrics(prometheus: &PrometheusClient, env: &Env) {
    let Some(path) = &env.metrics_file else {
        return;
    };
    if let Err(e) = prometheus
        .encode()
        .and_then(|metrics| Ok(std::fs::write(path, metrics)?))
    {
        warn!("Failed to write metrics to {}: {e}", path.display());
    }
}
