use std::fs::File;
use std::io::{self, BufReader};
use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use futures::future::join_all;

use tower_order::api::{CatalogClient, TaskClient, TowerConnector, map_job_status};
use tower_order::cli::{Cli, Command};
use tower_order::config::OperationsConfig;
use tower_order::logging::init_logging;
use tower_order::metrics::install_exporter;
use tower_order::{OperationStatus, OrderRequest, OrderWorkflow};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(err) = cli.validate() {
        err.exit();
    }
    init_logging(cli.verbose, cli.json_logs);

    match run(cli).await {
        Ok(code) => code,
        Err(err) => {
            tracing::error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    match cli.command {
        Command::MapStatus { status } => {
            println!("{}", map_job_status(&status));
            Ok(ExitCode::SUCCESS)
        }
        Command::Order {
            requests,
            no_metrics,
        } => {
            let config = OperationsConfig::load(&cli.config)?;
            let requests = requests
                .iter()
                .map(|path| read_request(path))
                .collect::<Result<Vec<_>>>()?;

            let metrics = if no_metrics {
                None
            } else {
                Some(install_exporter(config.metrics_port)?)
            };

            let timeouts = config.timeouts();
            let workflow = OrderWorkflow::new(
                TaskClient::new(config.task_url.as_str(), timeouts)?,
                CatalogClient::new(config.catalog_url.as_str(), timeouts)?,
                TowerConnector::new(config.source_endpoints(), timeouts),
                metrics,
            )
            .with_retry(config.retry);

            let summaries =
                join_all(requests.into_iter().map(|req| workflow.run_with_summary(req))).await;

            let mut failed = false;
            for summary in &summaries {
                println!("{}", serde_json::to_string(summary)?);
                failed |= summary.status == OperationStatus::Error;
            }

            Ok(if failed {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            })
        }
    }
}

fn read_request(path: &Path) -> Result<OrderRequest> {
    if path == Path::new("-") {
        return OrderRequest::from_reader(io::stdin().lock())
            .context("failed to parse order request from stdin");
    }

    let file =
        File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    OrderRequest::from_reader(BufReader::new(file))
        .with_context(|| format!("failed to parse order request {}", path.display()))
}
