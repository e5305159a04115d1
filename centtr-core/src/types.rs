use serde::{Serialize, Serializer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Severity {
  Low,
  Medium,
  High,
  Critical,
}

impl Severity {
  pub fn as_str(&self) -> &'static str {
    match self {
      Severity::Low => "Low",
      Severity::Medium => "Medium",
      Severity::High => "High",
      Severity::Critical => "Critical",
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LineType {
  Mobile,
  #[serde(rename = "Fixed line")]
  FixedLine,
}

impl LineType {
  pub fn as_str(&self) -> &'static str {
    match self {
      LineType::Mobile => "Mobile",
      LineType::FixedLine => "Fixed line",
    }
  }
}

/// Why a report section holds no data. Rendered as plain text inside the
/// section rather than propagated.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SectionError {
  #[error("Invalid phone number")]
  InvalidInput,

  #[error("HTTP {status}")]
  HttpStatus { status: u16, details: String },

  #[error("Request failed: {0}")]
  Request(String),

  #[error("Invalid JSON response")]
  InvalidJson,

  #[error("Google search failed - {0}")]
  Search(String),

  #[error("Google search disabled")]
  Disabled,
}

impl SectionError {
  pub fn details(&self) -> Option<&str> {
    match self {
      SectionError::HttpStatus { details, .. } => Some(details),
      _ => None,
    }
  }
}

pub type SectionResult<T> = Result<T, SectionError>;

pub(crate) fn yes_no<S: Serializer>(value: &bool, serializer: S) -> Result<S::Ok, S::Error> {
  serializer.serialize_str(yes_no_label(*value))
}

pub fn yes_no_label(value: bool) -> &'static str {
  if value {
    "✅ Yes"
  } else {
    "❌ No"
  }
}

pub fn now_local_timestamp() -> String {
  chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

pub fn today_local() -> String {
  chrono::Local::now().format("%Y-%m-%d").to_string()
}

pub fn now_unix_secs() -> u64 {
  use std::time::{SystemTime, UNIX_EPOCH};
  SystemTime::now()
    .duration_since(UNIX_EPOCH)
    .unwrap_or_default()
    .as_secs()
}
