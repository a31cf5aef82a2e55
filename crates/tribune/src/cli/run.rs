//! Load everything the workflow needs and dispatch the requested action.

use super::{Action, Cli};
use tracing::{info, instrument};
use tribune_discord::{DiscordClient, Endpoint};
use tribune_error::{TribuneResult, WorkflowError, WorkflowErrorKind};
use tribune_workflow::{
    ApplicationResult, Orchestrator, ResultTemplates, StateStore, WorkflowConfig,
};

/// Run one workflow action end to end.
#[instrument(skip(cli), fields(action = ?cli.action, config = %cli.config.display()))]
pub async fn run_action(cli: &Cli) -> TribuneResult<()> {
    let mut config = WorkflowConfig::load(&cli.config)?;
    if let Some(results) = &cli.results {
        config = config.with_results_path(results);
    }

    let templates = ResultTemplates::load(config.results_path())?;
    let store = StateStore::new(config.state_path());
    let endpoint = Endpoint::with_base(config.api_base(), *config.api_version());
    let client = DiscordClient::with_endpoint(config.operator_token(), endpoint)?;
    info!("Loaded configuration");

    let mut orchestrator = Orchestrator::initialize(client, config, templates, store).await?;

    match cli.action {
        Action::Start => orchestrator.start(cli.force).await?,
        Action::End => {
            let path = orchestrator.end(required_result(cli)?).await?;
            info!(metadata = %path.display(), "Application ended");
        }
        Action::ResultOnly => orchestrator.send_result(required_result(cli)?).await?,
    }

    Ok(())
}

fn required_result(cli: &Cli) -> Result<&ApplicationResult, WorkflowError> {
    cli.result.as_ref().ok_or_else(|| {
        WorkflowError::new(WorkflowErrorKind::InvalidResultToken(
            "<missing --result>".to_string(),
        ))
    })
}
