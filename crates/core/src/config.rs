use serde::Deserialize;

/// Root application configuration. Loaded from environment variables with
/// the prefix `SUBPULSE__` and an optional `subpulse.toml` file.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Rolling-window length used when no interval is given explicitly.
    #[serde(default = "default_interval_days")]
    pub interval_days: i64,
    /// Shorter lookahead used for per-customer revenue breakdowns.
    #[serde(default = "default_customer_interval_days")]
    pub customer_interval_days: i64,
    #[serde(default)]
    pub snapshots: SnapshotConfig,
}

/// Where snapshot files are read from when paths are given relative.
#[derive(Debug, Clone, Deserialize)]
pub struct SnapshotConfig {
    #[serde(default = "default_snapshot_dir")]
    pub dir: String,
}

fn default_interval_days() -> i64 {
    30
}

fn default_customer_interval_days() -> i64 {
    14
}

fn default_snapshot_dir() -> String {
    ".".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            interval_days: default_interval_days(),
            customer_interval_days: default_customer_interval_days(),
            snapshots: SnapshotConfig::default(),
        }
    }
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            dir: default_snapshot_dir(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables and optional config file.
    pub fn load() -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder()
            .add_source(config::File::with_name("subpulse").required(false))
            .add_source(
                config::Environment::with_prefix("SUBPULSE")
                    .separator("__")
                    .try_parsing(true),
            );

        let config = builder.build()?;
        config.try_deserialize()
    }
}
