//! Run one create/delete group saga across the nodes listed in a JSON file.
//!
//! ```text
//! group-saga create_group group_1 nodes.json
//! ```
//!
//! Exit codes: 0 done, 2 rolled back, 1 error (including bad input).

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use group_saga::{load_nodes, GroupSaga, SagaConfig, SagaState};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "group-saga", about = "Create or delete a group on every node, rolling back on partial failure")]
struct Cli {
    /// Action to apply: create_group or delete_group
    action: String,

    /// Group name
    group: String,

    /// JSON file holding an array of node addresses
    nodes: PathBuf,

    /// Calls per node operation before giving up
    #[arg(long, env = "GROUP_SAGA_MAX_ATTEMPTS")]
    max_attempts: Option<u32>,

    /// Delay before the first retry, in milliseconds
    #[arg(long, env = "GROUP_SAGA_RETRY_DELAY_MS")]
    retry_delay_ms: Option<u64>,

    /// Per-request timeout in seconds, 0 disables it
    #[arg(long, env = "GROUP_SAGA_REQUEST_TIMEOUT_SECS")]
    timeout_secs: Option<u64>,
}

impl Cli {
    fn config(&self) -> SagaConfig {
        let mut config = SagaConfig::from_env();
        if let Some(max_attempts) = self.max_attempts {
            config.retry.max_attempts = max_attempts;
        }
        if let Some(delay) = self.retry_delay_ms {
            config.retry.initial_delay_millis = delay;
        }
        if let Some(secs) = self.timeout_secs {
            config = config.with_request_timeout((secs > 0).then(|| Duration::from_secs(secs)));
        }
        config
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    let nodes = load_nodes(&cli.nodes)
        .with_context(|| format!("loading nodes from {}", cli.nodes.display()))?;
    let mut saga = GroupSaga::new(&cli.action, nodes, cli.group.as_str(), &cli.config())?;

    let state = saga.run().await;
    let report = saga.report();
    for (node, node_state) in &report.nodes {
        tracing::info!(node = %node, state = %node_state, "Final node state");
    }

    Ok(match state {
        SagaState::Done => ExitCode::SUCCESS,
        SagaState::RolledBack => ExitCode::from(2),
        SagaState::Error | SagaState::Pending => {
            if report.requires_manual_intervention() {
                tracing::error!(saga_id = %report.saga_id, "Manual check needed before retrying this saga");
            }
            ExitCode::FAILURE
        }
    })
}
