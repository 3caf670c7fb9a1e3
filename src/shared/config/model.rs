use serde::Deserialize;
use std::env;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub build: BuildConfig,
    pub planner: PlannerConfig,
    pub scan: ScanConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Worker threads used to derive cuboids of one generation
    pub concurrency: usize,
    /// Capacity (in batches) of the feeder queue
    pub queue_capacity: usize,
    /// Hard cap on the estimated base table size before the input is split.
    /// When unset the cap is derived from available system memory.
    pub max_base_table_bytes: Option<u64>,
    /// Share of available memory the base table may use when no cap is set
    pub memory_fraction: f64,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            concurrency: 4,
            queue_capacity: 1000,
            max_base_table_bytes: None,
            memory_fraction: 0.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    pub region_cut_mb: f64,
    pub min_regions: usize,
    pub max_regions: usize,
    pub sharding_enabled: bool,
    pub max_shard_count: usize,
    /// Multiplier applied to a cuboid's size before dividing by the per-region size
    pub shard_magic: f64,
    /// Fraction a region may exceed its target before a cut is forced (split layout only)
    pub split_overshoot: f64,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            region_cut_mb: 5.0 * 1024.0,
            min_regions: 1,
            max_regions: 500,
            sharding_enabled: true,
            max_shard_count: i16::MAX as usize,
            shard_magic: 10.0,
            split_overshoot: 0.2,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Upper bound for the whole fan-in of one scan
    pub visit_timeout_secs: u64,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            visit_timeout_secs: 60 * 60,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub log_dir: String,
    pub stdout_level: String,
    pub file_level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_dir: "logs".to_string(),
            stdout_level: "info".to_string(),
            file_level: "debug".to_string(),
        }
    }
}

pub fn load_settings(config_path: &str) -> Result<Settings, config::ConfigError> {
    let settings: Settings = config::Config::builder()
        .add_source(config::File::with_name(config_path))
        .build()?
        .try_deserialize()?;

    Ok(settings)
}

pub fn load_settings_from_env() -> Result<Settings, config::ConfigError> {
    let config_path = env::var("SNEL_CUBE_CONFIG").unwrap_or_else(|_| "config".to_string());
    load_settings(&config_path)
}
