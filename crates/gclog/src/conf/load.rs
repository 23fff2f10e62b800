//! Load — config loading from file and environment variables.

use std::fs;
use std::path::Path;

use super::model::GcLogConfig;
use crate::pipeline::Mode;

impl GcLogConfig {
    /// Load configuration from file or environment variables
    /// Priority: Environment Variables > Config File > Defaults
    pub fn load() -> Result<Self, Box<dyn std::error::Error>> {
        let config_path = std::env::var("GCLOG_CONFIG_FILE")
            .unwrap_or_else(|_| "/etc/gclog/gclog.toml".to_string());

        let mut config = if Path::new(&config_path).exists() {
            tracing::info!("Loading configuration from: {}", config_path);
            Self::from_file(&config_path)?
        } else {
            tracing::info!("Config file not found at {}, using environment variables", config_path);
            Self::from_env()
        };

        if let Some(mode) = mode_from_env()? {
            config.mode = mode;
        }
        if let Ok(date) = std::env::var("GCLOG_JVM_START_DATE") {
            config.jvm_start_date = Some(date);
        }
        if let Some(workers) = workers_from_env() {
            config.workers = workers;
        }

        Ok(config)
    }

    /// Load configuration from TOML file
    pub fn from_file(path: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = fs::read_to_string(path)?;
        let config: GcLogConfig = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from environment variables with defaults
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            mode: mode_from_env().ok().flatten().unwrap_or(defaults.mode),
            jvm_start_date: std::env::var("GCLOG_JVM_START_DATE").ok(),
            workers: workers_from_env().unwrap_or(defaults.workers),
            datestamp_origin_first_line: std::env::var("GCLOG_DATESTAMP_ORIGIN_FIRST_LINE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.datestamp_origin_first_line),
        }
    }
}

fn mode_from_env() -> Result<Option<Mode>, String> {
    match std::env::var("GCLOG_MODE") {
        Ok(value) => parse_mode(&value).map(Some),
        Err(_) => Ok(None),
    }
}

fn parse_mode(value: &str) -> Result<Mode, String> {
    match value.trim().to_ascii_lowercase().as_str() {
        "preprocess" => Ok(Mode::Preprocess),
        "classify" => Ok(Mode::Classify),
        other => Err(format!("GCLOG_MODE must be preprocess or classify, got: {}", other)),
    }
}

fn workers_from_env() -> Option<usize> {
    std::env::var("GCLOG_WORKERS").ok().and_then(|s| s.parse().ok())
}
