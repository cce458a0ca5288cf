use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use stagehand_agentd::{Args, run};
use stagehand_exec::ShellRunner;
use stagehand_observe::LoggerConfig;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = args.into_config();
    config.validate().context("invalid configuration")?;

    stagehand_observe::init(&LoggerConfig::from(&config.diagnostics))?;

    let parent = CancellationToken::new();
    let signal = parent.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupt received, stopping");
            signal.cancel();
        }
    });

    let runner = Arc::new(
        ShellRunner::from_config(&config.runner, &config.secret).context("execution engine")?,
    );
    if let Err(e) = run(parent, config, runner).await {
        error!(error = %e, "runner stopped with an error");
        return Err(e.into());
    }
    Ok(())
}
