use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use chrono::{Days, NaiveDate};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;

/// Daily rotation appends `.YYYY-MM-DD` to this name.
const LOG_FILE_NAME: &str = "centtr.log";

static FILE_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Output {
  /// Interactive runs: the console belongs to the report panels.
  File,
  FileAndStderr,
}

pub fn init(log_dir: &Path, cfg: &LoggingConfig, output: Output) -> anyhow::Result<()> {
  fs::create_dir_all(log_dir)?;
  let removed = remove_expired(log_dir, chrono::Local::now().date_naive(), cfg.retention_days);

  let file_appender = tracing_appender::rolling::daily(log_dir, LOG_FILE_NAME);
  let (file_writer, guard) = tracing_appender::non_blocking(file_appender);
  let _ = FILE_GUARD.set(guard);

  let (filter, rejected) = match EnvFilter::try_new(&cfg.level) {
    Ok(f) => (f, false),
    Err(_) => (EnvFilter::new("info"), true),
  };

  let file_layer = tracing_subscriber::fmt::layer()
    .with_ansi(false)
    .with_writer(file_writer)
    .with_target(true);

  let stderr_layer = (output == Output::FileAndStderr).then(|| {
    tracing_subscriber::fmt::layer()
      .with_ansi(false)
      .with_writer(std::io::stderr)
      .with_target(false)
  });

  tracing_subscriber::registry()
    .with(filter)
    .with(file_layer)
    .with(stderr_layer)
    .try_init()
    .map_err(|e| anyhow::anyhow!("logging already initialised: {e}"))?;

  if rejected {
    tracing::warn!(level = %cfg.level, "unrecognised log level, using info");
  }
  for path in &removed {
    tracing::debug!(path = %path.display(), "expired log removed");
  }
  Ok(())
}

/// Date a rotated CentTR log was opened, from its file name.
fn rotated_on(path: &Path) -> Option<NaiveDate> {
  let name = path.file_name()?.to_str()?;
  let suffix = name.strip_prefix(LOG_FILE_NAME)?.strip_prefix('.')?;
  NaiveDate::parse_from_str(suffix, "%Y-%m-%d").ok()
}

/// Rotated logs older than `retention_days` before `today`. Zero keeps all.
fn expired_logs(log_dir: &Path, today: NaiveDate, retention_days: u64) -> Vec<PathBuf> {
  if retention_days == 0 {
    return Vec::new();
  }
  let Some(cutoff) = today.checked_sub_days(Days::new(retention_days)) else {
    return Vec::new();
  };
  let Ok(entries) = fs::read_dir(log_dir) else {
    return Vec::new();
  };

  let mut expired: Vec<PathBuf> = entries
    .flatten()
    .map(|e| e.path())
    .filter(|p| rotated_on(p).is_some_and(|d| d < cutoff))
    .collect();
  expired.sort();
  expired
}

fn remove_expired(log_dir: &Path, today: NaiveDate, retention_days: u64) -> Vec<PathBuf> {
  expired_logs(log_dir, today, retention_days)
    .into_iter()
    .filter(|p| fs::remove_file(p).is_ok())
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
  }

  fn touch(dir: &Path, name: &str) {
    fs::write(dir.join(name), "x").unwrap();
  }

  #[test]
  fn rotation_date_comes_from_suffix() {
    assert_eq!(rotated_on(Path::new("/x/centtr.log.2024-06-01")), Some(date("2024-06-01")));
    assert_eq!(rotated_on(Path::new("/x/centtr.log")), None);
    assert_eq!(rotated_on(Path::new("/x/centtr.login")), None);
    assert_eq!(rotated_on(Path::new("/x/centtr.log.old")), None);
    assert_eq!(rotated_on(Path::new("/x/results.json")), None);
  }

  #[test]
  fn only_logs_past_retention_expire() {
    let dir = tempfile::tempdir().unwrap();
    touch(dir.path(), "centtr.log.2024-05-01");
    touch(dir.path(), "centtr.log.2024-05-17");
    touch(dir.path(), "centtr.log.2024-05-18");
    touch(dir.path(), "centtr.log.2024-06-01");
    touch(dir.path(), "results_6281234567890_20240501_120000.json");

    let expired = expired_logs(dir.path(), date("2024-06-01"), 14);
    assert_eq!(
      expired,
      vec![
        dir.path().join("centtr.log.2024-05-01"),
        dir.path().join("centtr.log.2024-05-17"),
      ]
    );
  }

  #[test]
  fn zero_retention_keeps_everything() {
    let dir = tempfile::tempdir().unwrap();
    touch(dir.path(), "centtr.log.2000-01-01");
    assert!(remove_expired(dir.path(), date("2024-06-01"), 0).is_empty());
    assert!(dir.path().join("centtr.log.2000-01-01").exists());
  }

  #[test]
  fn removal_reports_deleted_paths() {
    let dir = tempfile::tempdir().unwrap();
    touch(dir.path(), "centtr.log.2000-01-01");
    touch(dir.path(), "notes.txt");

    let removed = remove_expired(dir.path(), date("2024-06-01"), 14);
    assert_eq!(removed, vec![dir.path().join("centtr.log.2000-01-01")]);
    assert!(!dir.path().join("centtr.log.2000-01-01").exists());
    assert!(dir.path().join("notes.txt").exists());
  }
}
