//! Startup configuration.
//!
//! Settings are resolved in three layers, later layers winning:
//! built-in defaults, an optional YAML file, then CLI flags / env vars.
//!
//! ```yaml
//! api_base_url: https://hacker-news.firebaseio.com/v0
//! batch_size: 30
//! refresh_interval_secs: 20
//! item_timeout_secs: 10
//! port: 8000
//! json_output_dir: ./json
//! json_archive_keep: 500
//! markdown_output_dir: ./markdown
//! ```

use crate::api::{DEFAULT_API_BASE_URL, Endpoints};
use crate::batch::BatchConfig;
use crate::cli::Cli;
use crate::error::ConfigError;
use crate::outputs::OutputDirs;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, instrument};
use url::Url;

/// Slack the HTTP client gets on top of the per-item timeout, so the
/// worker's own deadline is the one that fires.
const HTTP_TIMEOUT_MARGIN: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub api_base_url: String,
    pub batch_size: usize,
    pub refresh_interval_secs: u64,
    pub item_timeout_secs: u64,
    /// Port of the HTTP server; `0` disables serving.
    pub port: u16,
    pub json_output_dir: Option<PathBuf>,
    /// Dated archive copies to keep next to `top_stories.json`; `0` disables archiving.
    pub json_archive_keep: usize,
    pub markdown_output_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            batch_size: 30,
            refresh_interval_secs: 20,
            item_timeout_secs: 10,
            port: 8000,
            json_output_dir: None,
            json_archive_keep: 0,
            markdown_output_dir: None,
        }
    }
}

/// Parse a YAML config document. An empty document yields the defaults.
pub fn parse_config(yaml: &str, origin: &str) -> Result<Config, ConfigError> {
    if yaml.trim().is_empty() {
        return Ok(Config::default());
    }
    serde_yaml::from_str(yaml).map_err(|source| ConfigError::Parse {
        path: origin.to_string(),
        source,
    })
}

/// Read and parse the YAML config file at `path`.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let origin = path.display().to_string();
    let yaml = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: origin.clone(),
        source,
    })?;
    parse_config(&yaml, &origin)
}

impl Config {
    /// Build the effective configuration for `cli` and validate it.
    pub fn resolve(cli: &Cli) -> Result<Self, ConfigError> {
        let mut config = match &cli.config {
            Some(path) => load_config(path)?,
            None => Config::default(),
        };
        config.apply_overrides(cli);
        config.validate()?;
        debug!(?config, "Resolved configuration");
        Ok(config)
    }

    pub fn apply_overrides(&mut self, cli: &Cli) {
        if let Some(url) = &cli.api_url {
            self.api_base_url = url.clone();
        }
        if let Some(n) = cli.batch_size {
            self.batch_size = n;
        }
        if let Some(secs) = cli.interval_secs {
            self.refresh_interval_secs = secs;
        }
        if let Some(secs) = cli.item_timeout_secs {
            self.item_timeout_secs = secs;
        }
        if let Some(port) = cli.port {
            self.port = port;
        }
        if let Some(dir) = &cli.json_output_dir {
            self.json_output_dir = Some(dir.clone());
        }
        if let Some(keep) = cli.json_archive_keep {
            self.json_archive_keep = keep;
        }
        if let Some(dir) = &cli.markdown_output_dir {
            self.markdown_output_dir = Some(dir.clone());
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.batch_size == 0 {
            return Err(ConfigError::Invalid("batch_size must be at least 1".into()));
        }
        if self.refresh_interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "refresh_interval_secs must be at least 1".into(),
            ));
        }
        if self.item_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "item_timeout_secs must be at least 1".into(),
            ));
        }
        match Url::parse(&self.api_base_url) {
            Ok(url) if matches!(url.scheme(), "http" | "https") && url.has_host() => Ok(()),
            Ok(_) => Err(ConfigError::Invalid(format!(
                "api_base_url {:?} must be an http(s) URL with a host",
                self.api_base_url
            ))),
            Err(e) => Err(ConfigError::Invalid(format!(
                "api_base_url {:?} is not a valid URL: {e}",
                self.api_base_url
            ))),
        }
    }

    pub fn batch(&self) -> BatchConfig {
        BatchConfig {
            batch_size: self.batch_size,
            item_timeout: Duration::from_secs(self.item_timeout_secs),
        }
    }

    /// Overall timeout for one HTTP request. Always longer than the per-item
    /// timeout.
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.item_timeout_secs) + HTTP_TIMEOUT_MARGIN
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }

    pub fn endpoints(&self) -> Endpoints {
        Endpoints::new(&self.api_base_url)
    }

    pub fn outputs(&self) -> OutputDirs {
        OutputDirs {
            json: self.json_output_dir.clone(),
            json_archive_keep: self.json_archive_keep,
            markdown: self.markdown_output_dir.clone(),
        }
    }
}
