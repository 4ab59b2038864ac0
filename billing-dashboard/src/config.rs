use billing_client::api::Credentials;
use serde::Deserialize;
use std::{fs, io};

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            username: None,
            password: None,
        }
    }
}

fn default_base_url() -> String {
    "http://127.0.0.1:5000".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct BillingConfig {
    #[serde(default = "default_currency_label")]
    pub currency_label: String,
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self {
            currency_label: default_currency_label(),
        }
    }
}

fn default_currency_label() -> String {
    "RM".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    pub bind_addr: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub billing: BillingConfig,
    pub metrics: Option<MetricsConfig>,
}

impl AppConfig {
    /// Reads `DASHBOARD_CONFIG` (default `dashboard-config.toml`). A missing
    /// file yields the defaults.
    pub fn load() -> anyhow::Result<Self> {
        use std::env;

        let path = env::var("DASHBOARD_CONFIG").unwrap_or_else(|_| "dashboard-config.toml".to_string());
        match fs::read_to_string(&path) {
            Ok(contents) => Self::from_toml(&contents),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::info!(%path, "no config file found, using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(anyhow::anyhow!("failed to read {path}: {e}")),
        }
    }

    pub fn from_toml(contents: &str) -> anyhow::Result<Self> {
        let cfg: AppConfig = toml::from_str(contents)?;
        Ok(cfg)
    }

    /// Login credentials, when both user name and password are configured.
    pub fn credentials(&self) -> Option<Credentials> {
        match (&self.api.username, &self.api.password) {
            (Some(username), Some(password)) => Some(Credentials {
                username: username.clone(),
                password: password.clone(),
            }),
            _ => None,
        }
    }
}
