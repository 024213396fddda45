use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// HTTP listener and process settings.
///
/// Every field is optional in the file and in `TRIAGE_SERVER__*`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub port: u16,
    /// Whole-request deadline; model calls can take seconds.
    pub timeout_secs: u64,
    pub max_body_size_mb: usize,
    pub enable_cors: bool,
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    pub log_level: String,
    pub metrics_enabled: bool,
    /// Triage YAML. When unset, defaults plus `TRIAGE_*` overrides.
    pub pipeline_config: Option<PathBuf>,
    /// Run every model once before `/ready` turns green.
    pub warm_up: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0".into(),
            port: 8000,
            timeout_secs: 60,
            max_body_size_mb: 2,
            enable_cors: true,
            log_level: "info".into(),
            metrics_enabled: true,
            pipeline_config: None,
            warm_up: true,
        }
    }
}

impl ServerConfig {
    /// Optional `server.{toml,yaml,json}` in the working directory, then
    /// `TRIAGE_SERVER__PORT`-style environment variables.
    pub fn load() -> anyhow::Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name("server").required(false))
            .add_source(config::Environment::with_prefix("TRIAGE_SERVER").separator("__"))
            .build()?;
        Ok(settings.try_deserialize()?)
    }

    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        Ok(format!("{}:{}", self.bind_addr, self.port).parse()?)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn max_body_size(&self) -> usize {
        self.max_body_size_mb * 1024 * 1024
    }
}
