use crate::config::BreachConfig;
use crate::http::{HttpGet, HttpRequest, HttpResponse};
use crate::types::{SectionError, Severity};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const API_KEY_HEADER: &str = "hibp-api-key";
pub const MAX_DETAILS_CHARS: usize = 200;

const PASSWORD_DATA_CLASS: &str = "Password";

/// One breach as returned by the service, plus the derived severity. Fields
/// the tool does not interpret are kept verbatim in `extra`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BreachRecord {
  #[serde(default)]
  pub name: String,

  #[serde(default)]
  pub breach_date: String,

  #[serde(default)]
  pub data_classes: Vec<String>,

  #[serde(default)]
  pub is_verified: bool,

  #[serde(default)]
  pub is_sensitive: bool,

  #[serde(default)]
  pub is_fabricated: bool,

  #[serde(default)]
  pub is_retired: bool,

  #[serde(flatten)]
  pub extra: serde_json::Map<String, serde_json::Value>,

  #[serde(skip_deserializing, skip_serializing_if = "Option::is_none")]
  pub severity: Option<Severity>,
}

impl BreachRecord {
  pub fn has_password(&self) -> bool {
    self.data_classes.iter().any(|c| c == PASSWORD_DATA_CLASS)
  }

  fn annotate(mut self) -> Self {
    self.extra.remove("Severity");
    self.severity = Some(classify(&self));
    self
  }
}

struct SeverityRule {
  applies: fn(&BreachRecord) -> bool,
  severity: Severity,
}

fn is_verified(r: &BreachRecord) -> bool {
  r.is_verified
}

fn exposes_password(r: &BreachRecord) -> bool {
  r.has_password()
}

fn is_sensitive(r: &BreachRecord) -> bool {
  r.is_sensitive
}

fn is_fabricated(r: &BreachRecord) -> bool {
  r.is_fabricated
}

fn is_retired(r: &BreachRecord) -> bool {
  r.is_retired
}

// Evaluated in order; the last rule that applies decides. A retired breach is
// Low even when it is also verified or sensitive.
const SEVERITY_RULES: &[SeverityRule] = &[
  SeverityRule {
    applies: is_verified,
    severity: Severity::High,
  },
  SeverityRule {
    applies: exposes_password,
    severity: Severity::Critical,
  },
  SeverityRule {
    applies: is_sensitive,
    severity: Severity::Critical,
  },
  SeverityRule {
    applies: is_fabricated,
    severity: Severity::Low,
  },
  SeverityRule {
    applies: is_retired,
    severity: Severity::Low,
  },
];

pub fn classify(record: &BreachRecord) -> Severity {
  SEVERITY_RULES
    .iter()
    .filter(|rule| (rule.applies)(record))
    .fold(Severity::Medium, |_, rule| rule.severity)
}

#[derive(Debug, Clone)]
pub enum BreachOutcome {
  Breaches(Vec<BreachRecord>),
  Skipped,
  NotFound,
  Failed(SectionError),
}

impl BreachOutcome {
  pub fn status_message(&self) -> Option<&'static str> {
    match self {
      BreachOutcome::Skipped => Some("Skipped - No HIBP API key provided"),
      BreachOutcome::NotFound => Some("✅ Phone number not found in any breaches"),
      _ => None,
    }
  }
}

pub struct BreachChecker<'a> {
  http: &'a dyn HttpGet,
  cfg: &'a BreachConfig,
  user_agent: String,
}

impl<'a> BreachChecker<'a> {
  pub fn new(http: &'a dyn HttpGet, cfg: &'a BreachConfig) -> Self {
    Self {
      http,
      cfg,
      user_agent: format!("CentTR/{} (phone OSINT)", env!("CARGO_PKG_VERSION")),
    }
  }

  /// Without a key no request is made.
  pub fn check(&self, digits: &str, api_key: Option<&str>) -> BreachOutcome {
    let Some(key) = api_key.map(str::trim).filter(|k| !k.is_empty()) else {
      tracing::info!("breach check skipped: no API key");
      return BreachOutcome::Skipped;
    };

    let url = match self.account_url(digits) {
      Ok(u) => u,
      Err(e) => return BreachOutcome::Failed(SectionError::Request(format!("{e:#}"))),
    };

    let headers = [(API_KEY_HEADER, key)];
    let req = HttpRequest {
      url: &url,
      user_agent: &self.user_agent,
      headers: &headers,
      timeout: Duration::from_secs(self.cfg.timeout_seconds),
    };

    match self.http.get(&req) {
      Ok(resp) => {
        let outcome = interpret_response(resp);
        match &outcome {
          BreachOutcome::Breaches(list) => {
            tracing::info!(breaches = list.len(), "breach check completed")
          }
          BreachOutcome::Failed(e) => tracing::warn!(error = %e, "breach check failed"),
          _ => tracing::info!("breach check completed: not found"),
        }
        outcome
      }
      Err(e) => {
        tracing::warn!(error = ?e, "breach request failed");
        BreachOutcome::Failed(SectionError::Request(format!("{e:#}")))
      }
    }
  }

  fn account_url(&self, digits: &str) -> anyhow::Result<Url> {
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
      anyhow::bail!("account identifier must be digits only");
    }
    let mut endpoint = self.cfg.endpoint.clone();
    if !endpoint.ends_with('/') {
      endpoint.push('/');
    }
    let mut url = Url::parse(&endpoint)?.join(digits)?;
    url.set_query(Some("truncateResponse=false"));
    Ok(url)
  }
}

pub fn interpret_response(resp: HttpResponse) -> BreachOutcome {
  match resp.status {
    200 => match serde_json::from_str::<Vec<BreachRecord>>(&resp.body) {
      Ok(records) => {
        BreachOutcome::Breaches(records.into_iter().map(BreachRecord::annotate).collect())
      }
      Err(_) => BreachOutcome::Failed(SectionError::InvalidJson),
    },
    404 => BreachOutcome::NotFound,
    status => BreachOutcome::Failed(SectionError::HttpStatus {
      status,
      details: excerpt(&resp.body, MAX_DETAILS_CHARS),
    }),
  }
}

fn excerpt(body: &str, max_chars: usize) -> String {
  if body.chars().count() > max_chars {
    let head: String = body.chars().take(max_chars).collect();
    format!("{head}...")
  } else {
    body.to_string()
  }
}
