use crate::config::write_atomic;
use crate::report::ReportEnvelope;
use anyhow::Context;
use std::path::Path;

/// Writes the report as pretty-printed JSON, replacing any existing file.
pub fn save(report: &ReportEnvelope, path: &Path) -> anyhow::Result<()> {
  let raw = report.to_json_pretty()?;
  write_atomic(path, &raw).with_context(|| format!("write report {}", path.display()))?;
  tracing::info!(
    path = %path.display(),
    report_id = %report.metadata.report_id,
    bytes = raw.len(),
    "report saved"
  );
  Ok(())
}
