use std::path::{Path, PathBuf};

pub const HOME_ENV: &str = "CENTTR_HOME";

pub fn base_dir() -> anyhow::Result<PathBuf> {
  if let Some(home) = non_empty_env(HOME_ENV) {
    return Ok(PathBuf::from(home));
  }

  if cfg!(windows) {
    if let Some(app_data) = non_empty_env("APPDATA") {
      return Ok(PathBuf::from(app_data).join("CentTR"));
    }
  }

  if let Some(xdg) = non_empty_env("XDG_CONFIG_HOME") {
    return Ok(PathBuf::from(xdg).join("centtr"));
  }

  let home = non_empty_env("HOME")
    .or_else(|| non_empty_env("USERPROFILE"))
    .ok_or_else(|| anyhow::anyhow!("cannot locate a home directory; set {HOME_ENV}"))?;
  Ok(PathBuf::from(home).join(".config").join("centtr"))
}

fn non_empty_env(name: &str) -> Option<String> {
  std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

pub fn config_path(base: &Path) -> PathBuf {
  base.join("config.toml")
}

pub fn logs_dir(base: &Path) -> PathBuf {
  base.join("logs")
}
