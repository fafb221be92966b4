use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use slidesmith_agent::{LlmError, OpenAiClient, Orchestrator, PromptBuilder};
use slidesmith_core::config::{AppConfig, ConfigError, LoadOptions};

pub struct Application {
    pub config: AppConfig,
    pub orchestrator: Option<Arc<Orchestrator>>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("language model client could not be constructed: {0}")]
    LlmClient(#[source] LlmError),
}

pub fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config)
}

pub fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        model = config.llm.model.as_deref().unwrap_or("unbound"),
        guidelines_dir = %config.guidelines.dir.display(),
        "starting application bootstrap"
    );

    // An unbound model is not a boot failure: the server still serves health
    // checks, and chat turns fail with a configuration error per request.
    let orchestrator = OpenAiClient::from_config(&config.llm)
        .map_err(BootstrapError::LlmClient)?
        .map(|client| {
            Arc::new(Orchestrator::new(
                Arc::new(client),
                PromptBuilder::new(config.guidelines.dir.clone()),
            ))
        });

    info!(
        event_name = "system.bootstrap.ready",
        model_bound = orchestrator.is_some(),
        "application bootstrap complete"
    );
    Ok(Application { config, orchestrator })
}

#[cfg(test)]
mod tests {
    use slidesmith_core::config::{ConfigOverrides, LoadOptions};

    use super::bootstrap;

    #[test]
    fn bootstrap_without_model_leaves_chat_unbound() {
        let app = bootstrap(LoadOptions {
            config_path: Some("/nonexistent/slidesmith.toml".into()),
            ..LoadOptions::default()
        })
        .expect("bootstrap succeeds without a model");
        assert!(app.orchestrator.is_none());
    }

    #[test]
    fn bootstrap_with_model_binds_an_orchestrator() {
        let app = bootstrap(LoadOptions {
            config_path: Some("/nonexistent/slidesmith.toml".into()),
            overrides: ConfigOverrides {
                llm_model: Some("gpt-4o".to_string()),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        })
        .expect("bootstrap succeeds with a model");
        assert!(app.orchestrator.is_some());
    }
}
