use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Error, Result};

pub const DEFAULT_REPORT_SIZE: usize = 1000;
pub const DEFAULT_THRESHOLD_ERROR_PARS_PERCENT: u8 = 60;

/// Run configuration. Built once in `main` and passed by reference to every stage.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Maximum number of URLs in the report table
    pub report_size: usize,
    pub report_dir: PathBuf,
    pub log_dir: PathBuf,
    /// Warn when more than this percentage of lines fail to parse
    pub threshold_error_pars_percent: u8,
    pub report_template: PathBuf,
    pub log_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            report_size: DEFAULT_REPORT_SIZE,
            report_dir: PathBuf::from("./reports"),
            log_dir: PathBuf::from("./log"),
            threshold_error_pars_percent: DEFAULT_THRESHOLD_ERROR_PARS_PERCENT,
            report_template: PathBuf::from("./report.html"),
            log_file: None,
        }
    }
}

// Keys as they appear in the config file. Anything left out keeps its default.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
struct FileConfig {
    report_size: Option<usize>,
    report_dir: Option<PathBuf>,
    log_dir: Option<PathBuf>,
    threshold_error_pars_percent: Option<u8>,
    report_template: Option<PathBuf>,
    log_file: Option<PathBuf>,
}

impl Config {
    /// Load a TOML config file and merge it over the defaults
    pub fn load(path: &Path) -> Result<Config> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("cannot read {}: {}", path.display(), e)))?;
        Config::from_toml(&content).map_err(|e| match e {
            Error::Config(msg) => Error::Config(format!("{}: {}", path.display(), msg)),
            other => other,
        })
    }

    fn from_toml(content: &str) -> Result<Config> {
        let file: FileConfig =
            toml::from_str(content).map_err(|e| Error::Config(e.message().to_string()))?;
        let config = Config::default().merge(file);
        config.validate()?;
        Ok(config)
    }

    fn merge(self, file: FileConfig) -> Config {
        Config {
            report_size: file.report_size.unwrap_or(self.report_size),
            report_dir: file.report_dir.unwrap_or(self.report_dir),
            log_dir: file.log_dir.unwrap_or(self.log_dir),
            threshold_error_pars_percent: file
                .threshold_error_pars_percent
                .unwrap_or(self.threshold_error_pars_percent),
            report_template: file.report_template.unwrap_or(self.report_template),
            log_file: file.log_file.or(self.log_file),
        }
    }

    fn validate(&self) -> Result<()> {
        if self.threshold_error_pars_percent > 100 {
            return Err(Error::Config(format!(
                "THRESHOLD_ERROR_PARS_PERCENT must be within 0..=100, got {}",
                self.threshold_error_pars_percent
            )));
        }
        Ok(())
    }
}
