//! Configuração do tower-order carregada a partir de `tower-order.toml`.
//!
//! A struct [`OperationsConfig`] contém todos os parâmetros configuráveis.
//! Valores não presentes no arquivo usam defaults sensíveis.
//! As variáveis de ambiente `TOWER_ORDER_CATALOG_URL` e
//! `TOWER_ORDER_TASK_URL` têm precedência sobre o arquivo.

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::api::HttpTimeouts;

/// Caminho padrão do arquivo de configuração.
pub const DEFAULT_CONFIG_PATH: &str = "tower-order.toml";

/// Configuração de nível superior carregada de `tower-order.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct OperationsConfig {
    /// URL base dos endpoints de catálogo (planos e ofertas).
    #[serde(default = "default_api_url")]
    pub catalog_url: String,

    /// URL base do endpoint de tarefas.
    #[serde(default = "default_api_url")]
    pub task_url: String,

    /// Timeout total de cada requisição HTTP, em segundos.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Timeout de conexão, em segundos.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Porta do endpoint de métricas Prometheus.
    #[serde(default = "default_metrics_port")]
    pub metrics_port: u16,

    /// Retentativas da atualização de tarefa no caminho de erro.
    #[serde(default)]
    pub retry: RetryConfig,

    /// Endpoints do Tower por id de fonte.
    #[serde(default)]
    pub sources: HashMap<String, SourceConfig>,
}

/// Endpoint de uma fonte (instância do Tower).
#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    pub url: String,
}

/// Política de retentativa para a última atualização da tarefa.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct RetryConfig {
    /// Retentativas após a primeira tentativa.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Atraso base em milissegundos para backoff exponencial.
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            base_delay_ms: default_base_delay_ms(),
        }
    }
}

impl RetryConfig {
    /// Atraso da retentativa `attempt`: base_delay_ms * 2^(attempt - 1).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        Duration::from_millis(
            self.base_delay_ms
                .saturating_mul(2u64.saturating_pow(attempt.saturating_sub(1))),
        )
    }
}

fn default_api_url() -> String {
    "http://localhost:3000/api/topological-inventory/v3.0".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_metrics_port() -> u16 {
    9394
}

fn default_max_retries() -> u32 {
    2
}

fn default_base_delay_ms() -> u64 {
    500
}

impl Default for OperationsConfig {
    fn default() -> Self {
        Self {
            catalog_url: default_api_url(),
            task_url: default_api_url(),
            request_timeout_secs: default_request_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            metrics_port: default_metrics_port(),
            retry: RetryConfig::default(),
            sources: HashMap::new(),
        }
    }
}

impl OperationsConfig {
    /// Carrega a configuração do caminho informado.
    /// Usa valores padrão se o arquivo não existir.
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            toml::from_str::<OperationsConfig>(&contents)
                .with_context(|| format!("failed to parse {}", path.display()))?
        } else {
            Self::default()
        };

        config.apply_overrides(|name| std::env::var(name).ok());
        Ok(config)
    }

    // Variáveis de ambiente têm precedência sobre o arquivo.
    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(url) = var("TOWER_ORDER_CATALOG_URL")
            && !url.is_empty()
        {
            self.catalog_url = url;
        }
        if let Some(url) = var("TOWER_ORDER_TASK_URL")
            && !url.is_empty()
        {
            self.task_url = url;
        }
    }

    pub fn timeouts(&self) -> HttpTimeouts {
        HttpTimeouts {
            connect: Duration::from_secs(self.connect_timeout_secs),
            request: Duration::from_secs(self.request_timeout_secs),
        }
    }

    /// Mapa id da fonte → URL do Tower.
    pub fn source_endpoints(&self) -> HashMap<String, String> {
        self.sources
            .iter()
            .map(|(id, source)| (id.clone(), source.url.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_config_values() {
        let config = OperationsConfig::default();
        assert_eq!(config.metrics_port, 9394);
        assert_eq!(config.request_timeout_secs, 30);
        assert_eq!(config.retry.max_retries, 2);
        assert_eq!(config.retry.base_delay_ms, 500);
        assert!(config.sources.is_empty());
    }

    #[test]
    fn deserialize_partial_toml() {
        let toml_str = r#"
            catalog_url = "http://inventory:8080/api/v3.0"
            metrics_port = 9000

            [retry]
            max_retries = 4

            [sources.1]
            url = "https://tower.example.com"
        "#;
        let config: OperationsConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.catalog_url, "http://inventory:8080/api/v3.0");
        assert_eq!(config.task_url, default_api_url());
        assert_eq!(config.metrics_port, 9000);
        assert_eq!(config.retry.max_retries, 4);
        assert_eq!(config.retry.base_delay_ms, 500);
        assert_eq!(
            config.source_endpoints().get("1").map(String::as_str),
            Some("https://tower.example.com")
        );
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "task_url = \"http://tasks:3000\"\nrequest_timeout_secs = 5").unwrap();

        let config = OperationsConfig::load(file.path()).unwrap();
        assert_eq!(config.request_timeout_secs, 5);
        assert_eq!(config.timeouts().request, Duration::from_secs(5));
    }

    #[test]
    fn load_rejects_malformed_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "metrics_port = \"not a number\"").unwrap();
        assert!(OperationsConfig::load(file.path()).is_err());
    }

    #[test]
    fn load_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = OperationsConfig::load(&dir.path().join("missing.toml")).unwrap();
        assert_eq!(config.metrics_port, 9394);
    }

    #[test]
    fn env_overrides_urls() {
        let mut config = OperationsConfig::default();
        config.apply_overrides(|name| match name {
            "TOWER_ORDER_CATALOG_URL" => Some("http://catalog".into()),
            "TOWER_ORDER_TASK_URL" => Some(String::new()),
            _ => None,
        });
        assert_eq!(config.catalog_url, "http://catalog");
        assert_eq!(config.task_url, default_api_url());
    }

    #[test]
    fn retry_exponential_backoff() {
        let retry = RetryConfig {
            max_retries: 3,
            base_delay_ms: 100,
        };
        assert_eq!(retry.delay_for_attempt(1), Duration::from_millis(100));
        assert_eq!(retry.delay_for_attempt(2), Duration::from_millis(200));
        assert_eq!(retry.delay_for_attempt(3), Duration::from_millis(400));
    }
}
