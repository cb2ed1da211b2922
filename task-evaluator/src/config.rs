use anyhow::Result;
use config::{builder::DefaultState, Config as ConfigLoader, ConfigBuilder, Environment, File};
use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use task_evaluator_api::{
    observability::LogSettings,
    settings::{AuthSettings, ModelSettings, PaymentSettings, QueueSettings},
    Integration,
};
use task_evaluator_storage::postgres::PostgresConfig;

pub const ENV_PREFIX: &str = "TASK_EVALUATOR";

/// Layered configuration: `config/default`, then `config/local`, then
/// `TASK_EVALUATOR__SECTION__KEY` environment variables.
#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: PostgresConfig,
    pub auth: AuthSettings,
    #[serde(default)]
    pub model: Integration<ModelSettings>,
    #[serde(default)]
    pub payments: PaymentSettings,
    #[serde(default)]
    pub queue: QueueSettings,
    #[serde(default)]
    pub logging: LogSettings,
    /// Include backend error detail in 5xx responses. Keep off in production.
    #[serde(default)]
    pub expose_error_details: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: IpAddr,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 3000,
        }
    }
}

impl ServerConfig {
    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::from_builder(
            ConfigLoader::builder()
                .add_source(File::with_name("config/default").required(false))
                .add_source(File::with_name("config/local").required(false)),
        )
    }

    fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self> {
        let config = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Ok(config.try_deserialize()?)
    }
}
