use std::collections::BTreeMap;

use clap::{Args, Parser, Subcommand};
use serde::Deserialize;

use crate::error::ServerError;

#[derive(Parser)]
#[command(name = "ingest-server", about = "JSON lines to Kafka ingestion gateway")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP gateway
    Serve(ServeArgs),
}

#[derive(Args, Clone, Debug)]
pub struct ServeArgs {
    /// Kafka bootstrap servers.
    #[arg(long, env = "KAFKA_BROKERS")]
    pub brokers: Option<String>,

    /// Topic for file uploads.
    #[arg(long, env = "KAFKA_TOPIC")]
    pub topic: Option<String>,

    /// HTTP listen address.
    #[arg(long, default_value = "0.0.0.0:8080", env = "LISTEN_ADDR")]
    pub listen: String,

    /// Optional TOML file with limits and extra producer properties.
    #[arg(long, env = "INGEST_CONFIG")]
    pub config: Option<String>,

    /// Keep records in memory instead of sending them to Kafka.
    #[arg(long)]
    pub dry_run: bool,
}

/// Broker address and default topic, both mandatory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokerSettings {
    pub brokers: String,
    pub topic: String,
}

impl ServeArgs {
    /// Missing and empty values are treated the same.
    pub fn broker_settings(&self) -> Result<BrokerSettings, ServerError> {
        let non_empty = |v: &Option<String>| v.as_deref().map(str::trim).filter(|s| !s.is_empty()).map(String::from);
        match (non_empty(&self.brokers), non_empty(&self.topic)) {
            (Some(brokers), Some(topic)) => Ok(BrokerSettings { brokers, topic }),
            _ => Err(ServerError::Config {
                context: "env",
                detail: "KAFKA_BROKERS and KAFKA_TOPIC must be set".into(),
            }),
        }
    }
}

// ---- TOML Config ----

#[derive(Debug, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    /// Longest accepted upload line in bytes (0 = unlimited).
    #[serde(default)]
    pub max_line_length: usize,
    /// `/rest` body cap in bytes (0 = unlimited). Uploads are streamed and uncapped.
    #[serde(default = "default_body_limit")]
    pub body_limit: usize,
    /// How long shutdown waits for the producer queue to drain.
    #[serde(default = "default_flush_timeout_ms")]
    pub flush_timeout_ms: u64,
    /// Ring size of the `--dry-run` publisher.
    #[serde(default = "default_dry_run_max_records")]
    pub dry_run_max_records: usize,
    /// Extra librdkafka properties, e.g. `"linger.ms" = "5"`.
    #[serde(default)]
    pub kafka: BTreeMap<String, String>,
}

fn default_body_limit() -> usize {
    10 << 20
}
fn default_flush_timeout_ms() -> u64 {
    5000
}
fn default_dry_run_max_records() -> usize {
    100_000
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            max_line_length: 0,
            body_limit: default_body_limit(),
            flush_timeout_ms: default_flush_timeout_ms(),
            dry_run_max_records: default_dry_run_max_records(),
            kafka: BTreeMap::new(),
        }
    }
}

impl GatewayConfig {
    pub fn load(path: &str) -> Result<Self, ServerError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ServerError::Config { context: "read", detail: format!("'{path}': {e}") })?;
        Self::parse(&content)
            .map_err(|e| ServerError::Config { context: "parse", detail: format!("'{path}': {e}") })
    }

    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}
