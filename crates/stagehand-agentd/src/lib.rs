//! Process wiring for the stagehand runner agent.
//!
//! [`run`] turns a validated [`Config`] into the concrete collaborators
//! (HTTP client, poller, optional status server) and hands them to the
//! [`LifecycleCoordinator`].

mod cli;
pub use cli::Args;

use std::sync::Arc;

use stagehand_api::StatusApi;
use stagehand_core::{
    ConnectionGate, CoreError, History, LifecycleCoordinator, StatusServer, WorkPoller,
};
use stagehand_model::{Config, Filter};
use stagehand_remote::{HttpClient, RemotePoller, StageRunner};
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Run the agent until `parent` is cancelled, single-shot mode finishes, or a task fails.
pub async fn run(
    parent: CancellationToken,
    config: Config,
    runner: Arc<dyn StageRunner>,
) -> Result<(), CoreError> {
    let mode = config.runner.mode();
    info!(
        endpoint = %config.client.address,
        name = %config.runner.name,
        capacity = config.runner.capacity,
        mode = mode.as_str(),
        "starting the runner"
    );

    let client = Arc::new(
        HttpClient::new(&config.client).map_err(|e| CoreError::Remote(e.to_string()))?,
    );
    let history = History::new();

    let poller = RemotePoller::new(client.clone(), runner, Filter::from_config(&config))
        .with_limits(config.limit.clone())
        .with_history(history.clone());

    let status: Option<Arc<dyn StatusServer>> = match config.server.addr {
        Some(addr) => {
            let api = StatusApi::new(addr, history, config.dashboard.clone())
                .map_err(|e| CoreError::Serve(e.to_string()))?;
            Some(Arc::new(api) as Arc<dyn StatusServer>)
        }
        None => None,
    };

    let gate = ConnectionGate::new(client, config.runner.name.clone());
    let worker = WorkPoller::new(Arc::new(poller), mode);

    LifecycleCoordinator::new(gate, worker)
        .with_status_server(status)
        .run(&parent)
        .await
        .into_result()
}
