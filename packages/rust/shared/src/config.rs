//! Application configuration for edgepick.
//!
//! User config lives at `~/.edgepick/edgepick.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{EdgepickError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "edgepick.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".edgepick";

// ---------------------------------------------------------------------------
// Config structs (matching edgepick.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Snapshot output settings.
    #[serde(default)]
    pub output: OutputConfig,

    /// Data sources, queried concurrently and independently.
    #[serde(default = "default_sources")]
    pub sources: Vec<SourceConfig>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            output: OutputConfig::default(),
            sources: default_sources(),
        }
    }
}

/// `[output]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Target snapshot file path.
    #[serde(default = "default_output_path")]
    pub path: String,

    /// Keep at most N endpoints per carrier (0 = unlimited).
    #[serde(default)]
    pub top_n_per_carrier: usize,

    /// Minimum merged total required before the snapshot is written.
    /// Guards against overwriting a good snapshot after a degraded run.
    #[serde(default = "default_min_total_ips")]
    pub min_total_ips: usize,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: default_output_path(),
            top_n_per_carrier: 0,
            min_total_ips: default_min_total_ips(),
        }
    }
}

fn default_output_path() -> String {
    "cf-preferred-ips.txt".into()
}
fn default_min_total_ips() -> usize {
    10
}

/// `[[sources]]` entry — one external data provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Short name used in logs and error messages.
    pub name: String,

    /// Page locator for the carrier/IP table.
    pub url: String,

    /// Wall-clock budget for the page to produce table rows.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Total attempts before the source is declared failed.
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,

    /// Fixed delay between attempts.
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

fn default_timeout_secs() -> u64 {
    60
}
fn default_retry_attempts() -> u32 {
    2
}
fn default_retry_delay_ms() -> u64 {
    2000
}

/// The two built-in sources. HostMonit is slow and flaky under CI, so it
/// gets a shorter budget and is skipped quickly when it misbehaves.
fn default_sources() -> Vec<SourceConfig> {
    vec![
        SourceConfig {
            name: "wetest".into(),
            url: "https://www.wetest.vip/page/cloudflare/address_v4.html".into(),
            timeout_secs: 90,
            retry_attempts: 2,
            retry_delay_ms: 1500,
        },
        SourceConfig {
            name: "hostmonit".into(),
            url: "https://stock.hostmonit.com/CloudFlareYes".into(),
            timeout_secs: 35,
            retry_attempts: 2,
            retry_delay_ms: 2000,
        },
    ]
}

// ---------------------------------------------------------------------------
// Run config (runtime, merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// Runtime pipeline configuration — merged from config file + CLI flags and
/// passed explicitly into the orchestrator.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Sources to query, in snapshot arrival order.
    pub sources: Vec<SourceConfig>,
    /// Target snapshot file path.
    pub output_path: PathBuf,
    /// Keep at most N endpoints per carrier (0 = unlimited).
    pub top_n_per_carrier: usize,
    /// Minimum merged total required to commit.
    pub min_total_ips: usize,
}

impl From<&AppConfig> for RunConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            sources: config.sources.clone(),
            output_path: PathBuf::from(&config.output.path),
            top_n_per_carrier: config.output.top_n_per_carrier,
            min_total_ips: config.output.min_total_ips,
        }
    }
}

impl RunConfig {
    /// Check the config is runnable: exactly two sources (the pipeline runs
    /// them as one concurrent pair), each with a parseable locator.
    pub fn validate(&self) -> Result<()> {
        if self.sources.len() != 2 {
            return Err(EdgepickError::config(format!(
                "expected exactly 2 sources, found {}",
                self.sources.len()
            )));
        }
        for source in &self.sources {
            Url::parse(&source.url).map_err(|e| {
                EdgepickError::validation(format!(
                    "source '{}' has invalid url '{}': {e}",
                    source.name, source.url
                ))
            })?;
            if source.retry_attempts == 0 {
                return Err(EdgepickError::config(format!(
                    "source '{}' must allow at least one attempt",
                    source.name
                )));
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.edgepick/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| EdgepickError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.edgepick/edgepick.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| EdgepickError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        EdgepickError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| EdgepickError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| EdgepickError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| EdgepickError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}
