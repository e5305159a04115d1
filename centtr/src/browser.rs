use anyhow::Context;
use std::process::{Command, Stdio};

/// Hands a URL or file path to the desktop's default handler.
pub fn open(target: &str) -> anyhow::Result<()> {
  let status = opener(target)
    .stdin(Stdio::null())
    .stdout(Stdio::null())
    .stderr(Stdio::null())
    .status()
    .with_context(|| format!("launch opener for {target}"))?;

  if !status.success() {
    anyhow::bail!("opener exited with {status}");
  }
  Ok(())
}

#[cfg(windows)]
fn opener(target: &str) -> Command {
  let mut cmd = Command::new("cmd");
  // `start` treats the first quoted arg as a window title.
  cmd.args(["/C", "start", ""]).arg(target.replace('&', "^&"));
  cmd
}

#[cfg(target_os = "macos")]
fn opener(target: &str) -> Command {
  let mut cmd = Command::new("open");
  cmd.arg(target);
  cmd
}

#[cfg(not(any(windows, target_os = "macos")))]
fn opener(target: &str) -> Command {
  let mut cmd = Command::new("xdg-open");
  cmd.arg(target);
  cmd
}
