use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

use crate::core::persist::ReportLocation;
use crate::core::transfer_engine::TransferEngineType;

/// Config file picked up from the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "pfmig.toml";
pub const ENV_PREFIX: &str = "PFMIG_";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// JSON inventory export from the source system.
    pub source_export: Option<PathBuf>,
    /// Use simulated source and destination instead of real services.
    pub simulation: bool,
    pub transfer_engine: TransferEngineType,
    pub destination_url: Option<String>,
    pub api_token: Option<String>,
    pub request_timeout_secs: u64,
    pub batch_prefix: String,
    /// Number of folders shown in the "largest folders" summary.
    pub top_n: usize,
    /// Write the report here without asking.
    pub report_path: Option<PathBuf>,
    /// Directory suggested when asking where to save the report.
    pub report_dir: Option<PathBuf>,
    pub skip_report: bool,
    pub fallback_report_dir: PathBuf,
    pub offer_open_report: bool,
    pub verbose: bool,
    pub json_logs: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            source_export: None,
            simulation: false,
            transfer_engine: TransferEngineType::Http,
            destination_url: None,
            api_token: None,
            request_timeout_secs: 60,
            batch_prefix: "PFMigration".to_string(),
            top_n: 10,
            report_path: None,
            report_dir: None,
            skip_report: false,
            fallback_report_dir: std::env::temp_dir(),
            offer_open_report: true,
            verbose: false,
            json_logs: false,
        }
    }
}

impl AppConfig {
    /// Layer defaults, the config file, `PFMIG_*` environment variables and CLI overrides.
    pub fn new<T: Serialize>(config_file: Option<&Path>, overrides: Option<&T>) -> Result<Self> {
        let file = match config_file {
            Some(path) if !path.exists() => {
                bail!("Config file {} does not exist", path.display())
            }
            Some(path) => path.to_path_buf(),
            None => PathBuf::from(DEFAULT_CONFIG_FILE),
        };

        let mut figment = Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Toml::file(&file))
            .merge(Env::prefixed(ENV_PREFIX));

        if let Some(overrides) = overrides {
            figment = figment.merge(Serialized::defaults(overrides));
        }

        let config: AppConfig = figment
            .extract()
            .with_context(|| format!("Failed to load configuration ({})", file.display()))?;

        // In simulation mode transfers always use the simulated engine.
        if config.simulation {
            return Ok(AppConfig {
                transfer_engine: TransferEngineType::Simulated,
                ..config
            });
        }
        Ok(config)
    }

    pub fn report_location(&self) -> ReportLocation {
        if self.skip_report {
            return ReportLocation::Skip;
        }
        match &self.report_path {
            Some(path) => ReportLocation::Fixed(path.clone()),
            None => ReportLocation::Ask {
                suggested_dir: self.report_dir.clone().unwrap_or_else(|| PathBuf::from(".")),
            },
        }
    }

    /// Write the default configuration as TOML.
    pub fn write_default(path: &Path) -> Result<()> {
        let content =
            toml::to_string_pretty(&AppConfig::default()).context("Failed to serialize config")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file {}", path.display()))?;
        Ok(())
    }
}
