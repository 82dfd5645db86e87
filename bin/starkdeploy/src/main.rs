//! starkdeploy deploys the Starknet core contract and its proxy, in that order.

mod cli;

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use comfy_table::{Table, presets::UTF8_FULL};
use tracing_subscriber::fmt::writer::MakeWriterExt;

use cli::Cli;
use starkdeploy_core::{
    AccountSigner, DeployConfig, DeployContext, DeployedContract, DeploymentSequencer,
    DeploymentStatus, HardhatArtifacts, JsonRpcClient, PrivateKeyAccount,
};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize the logger: warnings and errors on stderr, the rest on stdout.
    tracing_subscriber::fmt()
        .with_max_level(cli.verbosity)
        .with_writer(
            std::io::stderr
                .with_max_level(tracing::Level::WARN)
                .or_else(std::io::stdout),
        )
        .init();

    exit_code(run(&cli).await)
}

/// Map the outcome of a run to the process exit status.
fn exit_code(result: Result<()>) -> ExitCode {
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("Deployment failed: {err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: &Cli) -> Result<()> {
    let config = DeployConfig::load(cli.config.as_deref(), cli.overrides())?;
    tracing::debug!(config = ?config, "Configuration loaded");

    let signer: PrivateKeyAccount = config
        .private_key()?
        .parse()
        .context("Failed to load deployer account")?;
    let rpc_url = config.resolved_rpc_url()?;
    let client = JsonRpcClient::connect(
        rpc_url.clone(),
        config.expected_chain_id(),
        config.poll_interval(),
    )
    .await
    .with_context(|| {
        format!(
            "Failed to connect to RPC endpoint at {}",
            rpc_url.host_str().unwrap_or("<unknown host>")
        )
    })?;
    let artifacts = HardhatArtifacts::new(&config.artifacts_dir);

    tracing::info!(
        deployer = %signer.address(),
        chain_id = client.chain_id(),
        artifacts = %artifacts.root().display(),
        "Starting deployment..."
    );

    let ctx = DeployContext {
        client: &client,
        signer: &signer,
        artifacts: &artifacts,
    };
    let mut sequencer = DeploymentSequencer::new(ctx, config.confirmation_timeout());

    match sequencer.run().await {
        Ok(deployed) => {
            tracing::info!("✓ Deployment complete!");
            println!("{}", summary_table(&deployed));
            Ok(())
        }
        Err(err) => {
            report_partial_deployment(sequencer.deployments());
            Err(err.into())
        }
    }
}

fn summary_table(deployments: &[DeployedContract]) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Contract", "Address", "Transaction", "Status"]);

    for deployment in deployments {
        table.add_row(vec![
            deployment.contract.clone(),
            deployment
                .address
                .map(|a| a.to_string())
                .unwrap_or_else(|| "-".to_string()),
            deployment.transaction_hash.to_string(),
            deployment.status.to_string(),
        ]);
    }

    table
}

/// Contracts confirmed before a failure stay on chain; surface them so the operator can
/// decide whether to redeploy.
fn report_partial_deployment(deployments: &[DeployedContract]) {
    if deployments.is_empty() {
        return;
    }

    for deployment in deployments {
        match deployment.status {
            DeploymentStatus::Confirmed => tracing::warn!(
                address = ?deployment.address,
                tx_hash = %deployment.transaction_hash,
                "{} was deployed before the failure and has not been rolled back",
                deployment.contract
            ),
            DeploymentStatus::Pending | DeploymentStatus::Failed => tracing::warn!(
                tx_hash = %deployment.transaction_hash,
                "{} deployment did not complete",
                deployment.contract
            ),
        }
    }

    println!("{}", summary_table(deployments));
}
