use crate::domain::chart::ChartRange;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct ClientConfig {
    #[serde(default)]
    pub backend: BackendSettings,
    #[serde(default)]
    pub sync: SyncSettings,
    #[serde(default)]
    pub storage: StorageSettings,
    #[serde(default = "default_charts")]
    pub charts: Vec<ChartConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BackendSettings {
    /// Prefix prepended to every `/api/...` path
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SyncSettings {
    #[serde(default = "default_dashboard_interval_secs")]
    pub dashboard_interval_secs: u64,
    #[serde(default = "default_chart_interval_secs")]
    pub chart_interval_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageSettings {
    #[serde(default = "default_credential_file")]
    pub credential_file: PathBuf,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ChartConfig {
    pub metric: String,
    pub title: String,
    pub default_range: Option<String>,
    #[serde(default)]
    pub stepped: bool,
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            dashboard_interval_secs: default_dashboard_interval_secs(),
            chart_interval_secs: default_chart_interval_secs(),
        }
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            credential_file: default_credential_file(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_dashboard_interval_secs() -> u64 {
    10
}

fn default_chart_interval_secs() -> u64 {
    5 * 60
}

fn default_credential_file() -> PathBuf {
    PathBuf::from("data/credentials.json")
}

fn default_charts() -> Vec<ChartConfig> {
    vec![
        ChartConfig {
            metric: "scale_beers_left".to_string(),
            title: "Beers left".to_string(),
            default_range: Some("now".to_string()),
            stepped: false,
        },
        ChartConfig {
            metric: "scale_active_keg".to_string(),
            title: "Active keg".to_string(),
            default_range: Some("2w".to_string()),
            stepped: true,
        },
    ]
}

impl BackendSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl SyncSettings {
    pub fn dashboard_interval(&self) -> Duration {
        Duration::from_secs(self.dashboard_interval_secs)
    }

    pub fn chart_interval(&self) -> Duration {
        Duration::from_secs(self.chart_interval_secs)
    }
}

impl ChartConfig {
    pub fn default_range(&self) -> anyhow::Result<Option<ChartRange>> {
        self.default_range
            .as_deref()
            .map(str::parse::<ChartRange>)
            .transpose()
            .map_err(|e| anyhow::anyhow!("chart {}: {}", self.metric, e))
    }
}

fn builder() -> config::ConfigBuilder<config::builder::DefaultState> {
    config::Config::builder()
        .add_source(config::File::with_name("config/client").required(false))
        .add_source(
            config::Environment::with_prefix("KEG_SCALE")
                .separator("__")
                .try_parsing(true),
        )
}

pub fn load_client_config() -> anyhow::Result<ClientConfig> {
    let settings = builder().build()?;
    let config: ClientConfig = settings.try_deserialize()?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &ClientConfig) -> anyhow::Result<()> {
    if config.sync.dashboard_interval_secs == 0 || config.sync.chart_interval_secs == 0 {
        anyhow::bail!("refresh intervals must be at least one second");
    }
    for chart in &config.charts {
        chart.default_range()?;
    }
    Ok(())
}
