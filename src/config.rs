use std::collections::HashMap;
use std::time::Duration;

use serde::Deserialize;

use crate::infrastructure::provisioning::PollPolicy;

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AppEnv {
    Development,
    #[default]
    Production,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Dynamodb,
    Memory,
}

/// Server settings, read from the process environment (and `.env`, if present).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub app_env: AppEnv,
    pub store_backend: StoreBackend,
    pub table_name: String,
    pub aws_region: String,
    pub dynamodb_endpoint: Option<String>,
    /// Comma separated list of exact origins.
    pub cors_allowed_origins: String,
    /// Comma separated host patterns such as `*.elb.amazonaws.com`.
    pub cors_origin_patterns: String,
    pub body_limit_bytes: usize,
    pub provision_poll_interval_ms: u64,
    pub provision_max_attempts: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 3001,
            app_env: AppEnv::default(),
            store_backend: StoreBackend::default(),
            table_name: "Todos".into(),
            aws_region: "us-west-2".into(),
            dynamodb_endpoint: None,
            cors_allowed_origins: "http://localhost:3000,http://127.0.0.1:3000".into(),
            cors_origin_patterns: "*.elb.amazonaws.com".into(),
            body_limit_bytes: 100 * 1024,
            provision_poll_interval_ms: 2000,
            provision_max_attempts: 60,
        }
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::load(config::Environment::default().try_parsing(true))
    }

    /// Same as [`Config::from_env`] but reading from an explicit variable map.
    pub fn from_vars(vars: HashMap<String, String>) -> anyhow::Result<Self> {
        Self::load(config::Environment::default().try_parsing(true).source(Some(vars)))
    }

    fn load(env: config::Environment) -> anyhow::Result<Self> {
        let settings = config::Config::builder().add_source(env).build()?;
        Ok(settings.try_deserialize()?)
    }

    pub fn is_development(&self) -> bool { self.app_env == AppEnv::Development }

    pub fn bind_address(&self) -> String { format!("{}:{}", self.host, self.port) }

    pub fn allowed_origins(&self) -> Vec<String> { split_list(&self.cors_allowed_origins) }

    pub fn origin_patterns(&self) -> Vec<String> { split_list(&self.cors_origin_patterns) }

    pub fn poll_policy(&self) -> PollPolicy {
        PollPolicy {
            interval: Duration::from_millis(self.provision_poll_interval_ms),
            max_attempts: self.provision_max_attempts,
        }
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',').map(str::trim).filter(|s| !s.is_empty()).map(str::to_string).collect()
}
