use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::types::now_unix_secs;

pub const API_KEY_ENV: &str = "HIBP_API_KEY";

#[derive(Debug, Clone, Default)]
pub struct Config {
  pub default_region: Option<String>,
  pub logging: LoggingConfig,
  pub breach: BreachConfig,
  pub search: SearchConfig,
  pub links: LinksConfig,
  pub report: ReportConfig,
}

impl Config {
  /// Flag first, then the environment, then the config file. Blank keys are skipped.
  pub fn resolve_api_key(&self, explicit: Option<&str>) -> Option<String> {
    let from_env = std::env::var(API_KEY_ENV).ok();
    [explicit.map(str::to_string), from_env, self.breach.api_key.clone()]
      .into_iter()
      .flatten()
      .map(|k| k.trim().to_string())
      .find(|k| !k.is_empty())
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
  #[serde(default = "default_log_level")]
  pub level: String,

  #[serde(default = "default_retention_days")]
  pub retention_days: u64,
}

fn default_log_level() -> String {
  "info".to_string()
}

fn default_retention_days() -> u64 {
  14
}

impl Default for LoggingConfig {
  fn default() -> Self {
    Self {
      level: default_log_level(),
      retention_days: default_retention_days(),
    }
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BreachConfig {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub api_key: Option<String>,

  #[serde(default = "default_breach_endpoint")]
  pub endpoint: String,

  #[serde(default = "default_breach_timeout_seconds")]
  pub timeout_seconds: u64,
}

impl Default for BreachConfig {
  fn default() -> Self {
    Self {
      api_key: None,
      endpoint: default_breach_endpoint(),
      timeout_seconds: default_breach_timeout_seconds(),
    }
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
  #[serde(default = "default_true")]
  pub enabled: bool,

  #[serde(default = "default_search_endpoint")]
  pub endpoint: String,

  #[serde(default = "default_num_results")]
  pub num_results: usize,

  #[serde(default = "default_pause_seconds")]
  pub pause_seconds: u64,

  #[serde(default = "default_search_timeout_seconds")]
  pub timeout_seconds: u64,

  #[serde(default = "default_language")]
  pub language: String,

  #[serde(default = "default_search_user_agent")]
  pub user_agent: String,
}

impl Default for SearchConfig {
  fn default() -> Self {
    Self {
      enabled: true,
      endpoint: default_search_endpoint(),
      num_results: default_num_results(),
      pause_seconds: default_pause_seconds(),
      timeout_seconds: default_search_timeout_seconds(),
      language: default_language(),
      user_agent: default_search_user_agent(),
    }
  }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LinksConfig {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub catalog_path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
  #[serde(default = "default_report_filename")]
  pub default_filename: String,
}

impl Default for ReportConfig {
  fn default() -> Self {
    Self {
      default_filename: default_report_filename(),
    }
  }
}

fn default_true() -> bool {
  true
}

fn default_breach_endpoint() -> String {
  "https://haveibeenpwned.com/api/v3/breachedaccount/".to_string()
}

fn default_breach_timeout_seconds() -> u64 {
  15
}

fn default_search_endpoint() -> String {
  "https://www.google.com/search".to_string()
}

fn default_num_results() -> usize {
  5
}

fn default_pause_seconds() -> u64 {
  2
}

fn default_search_timeout_seconds() -> u64 {
  10
}

fn default_language() -> String {
  "en".to_string()
}

fn default_search_user_agent() -> String {
  "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36".to_string()
}

fn default_report_filename() -> String {
  "results.json".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ConfigFile {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub default_region: Option<String>,

  #[serde(default)]
  pub logging: Option<LoggingConfig>,

  #[serde(default)]
  pub breach: Option<BreachConfig>,

  #[serde(default)]
  pub search: Option<SearchConfig>,

  #[serde(default)]
  pub links: Option<LinksConfig>,

  #[serde(default)]
  pub report: Option<ReportConfig>,
}

impl ConfigFile {
  fn normalize(self) -> Config {
    let mut cfg = Config::default();
    cfg.default_region = self
      .default_region
      .map(|r| r.trim().to_ascii_uppercase())
      .filter(|r| !r.is_empty());

    if let Some(l) = self.logging {
      cfg.logging = l;
    }
    if let Some(b) = self.breach {
      cfg.breach = b;
    }
    if let Some(s) = self.search {
      cfg.search = s;
    }
    if let Some(l) = self.links {
      cfg.links = l;
    }
    if let Some(r) = self.report {
      cfg.report = r;
    }

    if let Some(reason) = validate_breach_config(&cfg.breach) {
      tracing::warn!(reason = %reason, "breach config invalid; using defaults");
      let api_key = cfg.breach.api_key.take();
      cfg.breach = BreachConfig {
        api_key,
        ..BreachConfig::default()
      };
    }

    if let Some(reason) = validate_search_config(&cfg.search) {
      tracing::warn!(reason = %reason, "search config invalid; using defaults");
      cfg.search = SearchConfig::default();
    }

    cfg
  }

  fn needs_upgrade(&self) -> bool {
    self.logging.is_none()
      || self.breach.is_none()
      || self.search.is_none()
      || self.links.is_none()
      || self.report.is_none()
  }
}

/// Loads the config, writing defaults or an upgraded file when needed.
pub fn load_or_create_default(path: &Path) -> anyhow::Result<Config> {
  let parent = path
    .parent()
    .ok_or_else(|| anyhow::anyhow!("config path has no parent: {}", path.display()))?;
  fs::create_dir_all(parent)?;

  if !path.exists() {
    let cfg = Config::default();
    write_atomic(path, &toml::to_string_pretty(&to_config_file(&cfg))?)?;
    return Ok(cfg);
  }

  let raw = fs::read_to_string(path)?;
  match toml::from_str::<ConfigFile>(&raw) {
    Ok(file) => {
      let needs_upgrade = file.needs_upgrade();
      let cfg = file.normalize();
      if needs_upgrade {
        let backup = parent.join(format!("config.toml.bak-{}", now_unix_secs()));
        let _ = fs::copy(path, &backup);
        let _ = write_atomic(path, &toml::to_string_pretty(&to_config_file(&cfg))?);
        tracing::info!(
          config = %path.display(),
          backup = %backup.display(),
          "upgraded config defaults written"
        );
      }
      Ok(cfg)
    }
    Err(e) => {
      let cfg = Config::default();
      let backup = parent.join(format!("config.toml.bad-{}", now_unix_secs()));
      let _ = fs::rename(path, &backup);
      write_atomic(path, &toml::to_string_pretty(&to_config_file(&cfg))?)?;
      eprintln!(
        "CentTR: invalid config at {} (backed up to {}): {e}",
        path.display(),
        backup.display()
      );
      Ok(cfg)
    }
  }
}

fn to_config_file(cfg: &Config) -> ConfigFile {
  ConfigFile {
    default_region: cfg.default_region.clone(),
    logging: Some(cfg.logging.clone()),
    breach: Some(cfg.breach.clone()),
    search: Some(cfg.search.clone()),
    links: Some(cfg.links.clone()),
    report: Some(cfg.report.clone()),
  }
}

pub(crate) fn write_atomic(path: &Path, contents: &str) -> anyhow::Result<()> {
  let parent = path
    .parent()
    .ok_or_else(|| anyhow::anyhow!("file path has no parent: {}", path.display()))?;
  let parent = if parent.as_os_str().is_empty() {
    Path::new(".")
  } else {
    parent
  };
  fs::create_dir_all(parent)?;

  let tmp = parent.join(format!(
    ".{}.tmp",
    path.file_name().unwrap_or_default().to_string_lossy()
  ));
  fs::write(&tmp, contents)?;
  fs::rename(&tmp, path)?;
  Ok(())
}

fn validate_breach_config(cfg: &BreachConfig) -> Option<String> {
  if cfg.timeout_seconds == 0 {
    return Some("timeout_seconds must be > 0".to_string());
  }
  let Ok(url) = reqwest::Url::parse(&cfg.endpoint) else {
    return Some(format!("invalid endpoint URL: {}", cfg.endpoint));
  };
  if url.scheme() != "https" {
    return Some(format!("endpoint must use HTTPS: {}", cfg.endpoint));
  }
  if url.host_str().is_none() {
    return Some(format!("endpoint has no host: {}", cfg.endpoint));
  }
  if url.query().is_some() {
    return Some(format!("endpoint must not carry a query: {}", cfg.endpoint));
  }
  None
}

fn validate_search_config(cfg: &SearchConfig) -> Option<String> {
  if cfg.num_results == 0 {
    return Some("num_results must be > 0".to_string());
  }
  if cfg.timeout_seconds == 0 {
    return Some("timeout_seconds must be > 0".to_string());
  }
  let Ok(url) = reqwest::Url::parse(&cfg.endpoint) else {
    return Some(format!("invalid endpoint URL: {}", cfg.endpoint));
  };
  if !matches!(url.scheme(), "https" | "http") || url.host_str().is_none() {
    return Some(format!("endpoint must be an http(s) URL: {}", cfg.endpoint));
  }
  None
}
