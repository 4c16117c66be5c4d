//! Interface de linha de comando do tower-order baseada em clap.
//!
//! Define a struct [`Cli`] com subcomandos [`Command`] (order, map-status)
//! e flags globais (--config, --verbose, --json-logs).

use std::path::{Path, PathBuf};

use clap::error::ErrorKind;
use clap::{CommandFactory, Parser, Subcommand};

use crate::config::DEFAULT_CONFIG_PATH;

/// tower-order — encomenda ofertas de serviço no Ansible Tower.
#[derive(Debug, Parser)]
#[command(name = "tower-order", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Caminho do arquivo de configuração.
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// Habilita saída detalhada (verbose).
    #[arg(long, short, global = true, default_value_t = false)]
    pub verbose: bool,

    /// Emite logs em JSON.
    #[arg(long, global = true, default_value_t = false)]
    pub json_logs: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Executa um pedido por arquivo JSON (`-` lê da entrada padrão).
    Order {
        /// Arquivos com o pedido (task_id, service_offering_id, ...).
        #[arg(required = true)]
        requests: Vec<PathBuf>,

        /// Não expõe o endpoint de métricas Prometheus.
        #[arg(long, default_value_t = false)]
        no_metrics: bool,
    },

    /// Mostra o status de tarefa correspondente a um status de job do Tower.
    MapStatus {
        /// Status nativo do Tower (ex.: "successful", "failed").
        status: String,
    },
}

impl Cli {
    /// Checagens que o clap não expressa: a entrada padrão só pode ser lida
    /// uma vez, então `-` aparece no máximo uma vez em `order`.
    pub fn validate(&self) -> Result<(), clap::Error> {
        if let Command::Order { requests, .. } = &self.command {
            let stdin_count = requests.iter().filter(|p| *p == Path::new("-")).count();
            if stdin_count > 1 {
                return Err(Cli::command().error(
                    ErrorKind::ArgumentConflict,
                    "`-` (stdin) can be given only once",
                ));
            }
        }
        Ok(())
    }
}
