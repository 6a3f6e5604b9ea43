//! `load_config` module: loads the optional YAML configuration file and layers
//! command-line overrides on top of it.
//!
//! # Responsibilities
//! - Parse the user-supplied YAML file into [`CliConfig`]
//! - Fill every missing section or key from defaults (`index.html`, `error.html`,
//!   default AWS provider chain)
//! - Apply `--profile` / `--region` / `--endpoint-url` on top of the file values
//!
//! # Errors
//! All errors in this module use `anyhow::Error` and are surfaced at the CLI boundary.

use anyhow::Result;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::{error, info};
use webotron_core::config::{ClientConfig, WebsiteConfig};

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CliConfig {
    #[serde(default)]
    pub aws: ClientConfig,
    #[serde(default)]
    pub website: WebsiteConfig,
}

impl CliConfig {
    /// Values given on the command line (or through their env vars) win over the file.
    pub fn with_overrides(
        mut self,
        profile: Option<String>,
        region: Option<String>,
        endpoint_url: Option<String>,
    ) -> Self {
        if profile.is_some() {
            self.aws.profile = profile;
        }
        if region.is_some() {
            self.aws.region = region;
        }
        if endpoint_url.is_some() {
            self.aws.endpoint_url = endpoint_url;
        }
        self
    }
}

/// Loads a YAML config file. An empty file yields the defaults.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<CliConfig> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading configuration from file");

    let config_content = match fs::read_to_string(path_ref) {
        Ok(content) => {
            info!(config_path = ?path_ref, "Config file read successfully");
            content
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
            return Err(anyhow::anyhow!(
                "Failed to read config file {:?}: {}",
                path_ref,
                e
            ));
        }
    };

    if config_content.trim().is_empty() {
        info!(config_path = ?path_ref, "Config file is empty, using defaults");
        return Ok(CliConfig::default());
    }

    let config: CliConfig = match serde_yaml::from_str(&config_content) {
        Ok(conf) => {
            info!(config_path = ?path_ref, "Parsed config YAML successfully");
            conf
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
            return Err(anyhow::anyhow!("Failed to parse config YAML: {e}"));
        }
    };

    config.website.trace_loaded();
    Ok(config)
}
