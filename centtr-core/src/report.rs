use crate::breach::{BreachChecker, BreachOutcome};
use crate::links::{LinkCatalog, SocialLinks};
use crate::metadata::{BasicInfo, MetadataResolver};
use crate::number::ParsedNumber;
use crate::reverse_lookup;
use crate::search::WebSearchCollector;
use crate::types::{now_local_timestamp, SectionError, SectionResult};
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};
use std::net::{IpAddr, ToSocketAddrs};

pub const TOOL_VERSION: &str = env!("CARGO_PKG_VERSION");

pub const SECTION_KEYS: [&str; 6] = [
  "Basic Info",
  "Social Media",
  "Breach Check",
  "Google Results",
  "Reverse Lookup",
  "Metadata",
];

#[derive(Debug, Clone)]
pub struct ReportEnvelope {
  pub basic_info: SectionResult<BasicInfo>,
  pub social_media: SectionResult<SocialLinks>,
  pub breach_check: BreachOutcome,
  pub google_results: SectionResult<Vec<String>>,
  pub reverse_lookup: SectionResult<Vec<String>>,
  pub metadata: ReportMetadata,
}

impl ReportEnvelope {
  pub fn google_entries(&self) -> Vec<String> {
    list_entries(&self.google_results)
  }

  pub fn reverse_lookup_entries(&self) -> Vec<String> {
    list_entries(&self.reverse_lookup)
  }

  pub fn to_json_pretty(&self) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(self)?)
  }
}

/// List sections render failures in-band as a single `Error: ...` entry.
pub fn list_entries(section: &SectionResult<Vec<String>>) -> Vec<String> {
  match section {
    Ok(items) => items.clone(),
    Err(e) => vec![format!("Error: {e}")],
  }
}

impl Serialize for ReportEnvelope {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(SECTION_KEYS.len()))?;
    map.serialize_entry(SECTION_KEYS[0], &ObjectSection(&self.basic_info))?;
    map.serialize_entry(SECTION_KEYS[1], &ObjectSection(&self.social_media))?;
    map.serialize_entry(SECTION_KEYS[2], &BreachSection(&self.breach_check))?;
    map.serialize_entry(SECTION_KEYS[3], &self.google_entries())?;
    map.serialize_entry(SECTION_KEYS[4], &self.reverse_lookup_entries())?;
    map.serialize_entry(SECTION_KEYS[5], &self.metadata)?;
    map.end()
  }
}

struct ObjectSection<'a, T>(&'a SectionResult<T>);

impl<T: Serialize> Serialize for ObjectSection<'_, T> {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    match self.0 {
      Ok(v) => v.serialize(serializer),
      Err(e) => ErrorObject(e).serialize(serializer),
    }
  }
}

struct ErrorObject<'a>(&'a SectionError);

impl Serialize for ErrorObject<'_> {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    let details = self.0.details();
    let mut map = serializer.serialize_map(Some(if details.is_some() { 2 } else { 1 }))?;
    map.serialize_entry("Error", &self.0.to_string())?;
    if let Some(d) = details {
      map.serialize_entry("Details", d)?;
    }
    map.end()
  }
}

struct BreachSection<'a>(&'a BreachOutcome);

impl Serialize for BreachSection<'_> {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    match self.0 {
      BreachOutcome::Breaches(list) => {
        let mut seq = serializer.serialize_seq(Some(list.len()))?;
        for record in list {
          seq.serialize_element(record)?;
        }
        seq.end()
      }
      BreachOutcome::Failed(e) => ErrorObject(e).serialize(serializer),
      sentinel => {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry("Status", sentinel.status_message().unwrap_or_default())?;
        map.end()
      }
    }
  }
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportMetadata {
  #[serde(rename = "Search Date")]
  pub search_date: String,

  #[serde(rename = "Phone Number")]
  pub phone_number: String,

  #[serde(rename = "Tool Version")]
  pub tool_version: String,

  #[serde(rename = "Execution Time")]
  pub execution_time: String,

  #[serde(rename = "Report ID")]
  pub report_id: String,

  #[serde(rename = "Network")]
  pub network: NetworkInfo,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetworkInfo {
  Available { host: String, ip_address: String },
  Unavailable,
}

impl Serialize for NetworkInfo {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    match self {
      NetworkInfo::Available { host, ip_address } => {
        let mut map = serializer.serialize_map(Some(3))?;
        map.serialize_entry("Host", host)?;
        map.serialize_entry("IP Address", ip_address)?;
        map.serialize_entry("Location", "Unknown (would require GeoIP in production)")?;
        map.end()
      }
      NetworkInfo::Unavailable => {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry("Network Info", "Unavailable")?;
        map.end()
      }
    }
  }
}

/// Local hostname and the first address it resolves to, IPv4 preferred.
pub fn network_identity() -> NetworkInfo {
  let Ok(host) = hostname::get() else {
    return NetworkInfo::Unavailable;
  };
  let host = host.to_string_lossy().into_owned();
  let Ok(addrs) = (host.as_str(), 0u16).to_socket_addrs() else {
    return NetworkInfo::Unavailable;
  };

  let ips: Vec<IpAddr> = addrs.map(|a| a.ip()).collect();
  match ips.iter().find(|ip| ip.is_ipv4()).or_else(|| ips.first()) {
    Some(ip) => NetworkInfo::Available {
      ip_address: ip.to_string(),
      host,
    },
    None => NetworkInfo::Unavailable,
  }
}

#[derive(Debug, Clone, Copy)]
pub struct ReportRequest<'a> {
  pub raw_number: &'a str,
  pub api_key: Option<&'a str>,
  pub num_results: usize,
}

pub struct Aggregator<'a> {
  resolver: &'a MetadataResolver,
  catalog: &'a LinkCatalog,
  breach: BreachChecker<'a>,
  search: Option<WebSearchCollector<'a>>,
  region_hint: Option<&'a str>,
  network: fn() -> NetworkInfo,
}

impl<'a> Aggregator<'a> {
  /// `search = None` means web search is disabled in config.
  pub fn new(
    resolver: &'a MetadataResolver,
    catalog: &'a LinkCatalog,
    breach: BreachChecker<'a>,
    search: Option<WebSearchCollector<'a>>,
  ) -> Self {
    Self {
      resolver,
      catalog,
      breach,
      search,
      region_hint: None,
      network: network_identity,
    }
  }

  pub fn with_region_hint(mut self, region: Option<&'a str>) -> Self {
    self.region_hint = region;
    self
  }

  pub fn with_network_source(mut self, source: fn() -> NetworkInfo) -> Self {
    self.network = source;
    self
  }

  /// Runs every section in order. A failing section records its error and
  /// the run continues.
  pub fn run(&self, req: &ReportRequest<'_>) -> ReportEnvelope {
    let report_id = uuid::Uuid::new_v4().to_string();
    let span = tracing::info_span!("report", report_id = %report_id);
    let _entered = span.enter();

    let search_date = now_local_timestamp();
    let parsed = ParsedNumber::parse(req.raw_number, self.region_hint);
    let valid = match &parsed {
      Ok(n) if n.is_valid() => Some(n),
      Ok(_) => {
        tracing::warn!("number failed numbering-plan validation; lookups skipped");
        None
      }
      Err(e) => {
        tracing::warn!(error = %e, "number could not be parsed");
        None
      }
    };

    let basic_info = match &parsed {
      Ok(n) => Ok(self.resolver.basic_info(n)),
      Err(_) => Err(SectionError::InvalidInput),
    };
    tracing::info!(section = "basic_info", ok = basic_info.is_ok(), "section complete");

    let social_media = match &parsed {
      Ok(n) => Ok(self.catalog.build(&n.e164(), &n.digits())),
      Err(_) => Err(SectionError::InvalidInput),
    };
    tracing::info!(section = "social_media", ok = social_media.is_ok(), "section complete");

    let breach_check = match valid {
      Some(n) => self.breach.check(&n.digits(), req.api_key),
      None => BreachOutcome::Failed(SectionError::InvalidInput),
    };
    tracing::info!(section = "breach_check", "section complete");

    let google_results = match (valid, &self.search) {
      (None, _) => Err(SectionError::InvalidInput),
      (Some(_), None) => Err(SectionError::Disabled),
      (Some(n), Some(collector)) => collector.search(n, req.num_results),
    };
    tracing::info!(section = "google_results", ok = google_results.is_ok(), "section complete");

    let reverse_lookup = match valid {
      Some(n) => Ok(reverse_lookup::placeholder_entries(
        &n.national(),
        &n.national_significant(),
      )),
      None => Err(SectionError::InvalidInput),
    };
    tracing::info!(section = "reverse_lookup", ok = reverse_lookup.is_ok(), "section complete");

    let metadata = ReportMetadata {
      search_date,
      phone_number: req.raw_number.to_string(),
      tool_version: TOOL_VERSION.to_string(),
      execution_time: now_local_timestamp(),
      report_id,
      network: (self.network)(),
    };

    ReportEnvelope {
      basic_info,
      social_media,
      breach_check,
      google_results,
      reverse_lookup,
      metadata,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::BreachConfig;
  use crate::http::{HttpGet, HttpRequest, HttpResponse};
  use crate::search::SearchProvider;
  use std::cell::Cell;
  use std::time::Duration;

  struct DownHttp {
    calls: Cell<usize>,
  }

  impl HttpGet for DownHttp {
    fn get(&self, _req: &HttpRequest<'_>) -> anyhow::Result<HttpResponse> {
      self.calls.set(self.calls.get() + 1);
      anyhow::bail!("network unreachable")
    }
  }

  struct DownSearch;

  impl SearchProvider for DownSearch {
    fn fetch_page(&self, _q: &str, _offset: usize, _per_page: usize) -> anyhow::Result<Vec<String>> {
      anyhow::bail!("network unreachable")
    }
  }

  struct CannedSearch;

  impl SearchProvider for CannedSearch {
    fn fetch_page(&self, _q: &str, offset: usize, _per_page: usize) -> anyhow::Result<Vec<String>> {
      Ok((0..3).map(|i| format!("https://r.example/{}", offset + i)).collect())
    }
  }

  fn offline() -> NetworkInfo {
    NetworkInfo::Unavailable
  }

  struct Fixture {
    resolver: MetadataResolver,
    catalog: LinkCatalog,
    breach_cfg: BreachConfig,
    http: DownHttp,
  }

  impl Fixture {
    fn new() -> Self {
      Self {
        resolver: MetadataResolver::bundled().unwrap(),
        catalog: LinkCatalog::bundled().unwrap(),
        breach_cfg: BreachConfig::default(),
        http: DownHttp { calls: Cell::new(0) },
      }
    }

    fn aggregator<'a>(&'a self, search: &'a dyn SearchProvider) -> Aggregator<'a> {
      Aggregator::new(
        &self.resolver,
        &self.catalog,
        BreachChecker::new(&self.http, &self.breach_cfg),
        Some(WebSearchCollector::new(search, Duration::ZERO)),
      )
      .with_network_source(offline)
    }
  }

  fn request(raw: &str) -> ReportRequest<'_> {
    ReportRequest {
      raw_number: raw,
      api_key: Some("key"),
      num_results: 5,
    }
  }

  fn section_keys(v: &serde_json::Value) -> Vec<String> {
    v.as_object().unwrap().keys().cloned().collect()
  }

  #[test]
  fn all_sections_present_when_every_call_fails() {
    let fx = Fixture::new();
    let report = fx.aggregator(&DownSearch).run(&request("+6281234567890"));
    let v = serde_json::to_value(&report).unwrap();

    let mut keys = section_keys(&v);
    keys.sort();
    let mut expected: Vec<String> = SECTION_KEYS.iter().map(|s| s.to_string()).collect();
    expected.sort();
    assert_eq!(keys, expected);

    assert_eq!(fx.http.calls.get(), 1);
    assert!(v["Breach Check"]["Error"].as_str().unwrap().starts_with("Request failed"));
    let google = v["Google Results"].as_array().unwrap();
    assert_eq!(google.len(), 1);
    assert!(google[0].as_str().unwrap().starts_with("Error: Google search failed"));
    assert_eq!(v["Reverse Lookup"].as_array().unwrap().len(), 3);
    assert_eq!(v["Social Media"].as_object().unwrap().len(), 11);
    assert_eq!(v["Metadata"]["Network"]["Network Info"], "Unavailable");
  }

  #[test]
  fn unparseable_input_short_circuits_everything() {
    let fx = Fixture::new();
    let report = fx.aggregator(&CannedSearch).run(&request("hello"));
    assert_eq!(fx.http.calls.get(), 0);

    let v = serde_json::to_value(&report).unwrap();
    assert_eq!(section_keys(&v).len(), 6);
    assert_eq!(v["Basic Info"]["Error"], "Invalid phone number");
    assert_eq!(v["Social Media"]["Error"], "Invalid phone number");
    assert_eq!(v["Breach Check"]["Error"], "Invalid phone number");
    assert_eq!(v["Google Results"][0], "Error: Invalid phone number");
    assert_eq!(v["Reverse Lookup"][0], "Error: Invalid phone number");
    assert_eq!(v["Metadata"]["Phone Number"], "hello");
  }

  #[test]
  fn invalid_number_reports_validity_and_skips_lookups() {
    let fx = Fixture::new();
    let report = fx.aggregator(&CannedSearch).run(&request("+6212"));
    assert_eq!(fx.http.calls.get(), 0);
    assert!(report.basic_info.is_ok());

    let v = serde_json::to_value(&report).unwrap();
    assert_eq!(v["Basic Info"]["Valid Number"], "❌ No");
    assert_eq!(v["Basic Info"]["Possible Number"], "❌ No");
    assert_eq!(v["Basic Info"]["Location"], "Unknown");
    assert_eq!(v["Breach Check"]["Error"], "Invalid phone number");
    assert_eq!(v["Google Results"][0], "Error: Invalid phone number");
    assert_eq!(v["Reverse Lookup"][0], "Error: Invalid phone number");
  }

  #[test]
  fn valid_number_fills_every_section() {
    let fx = Fixture::new();
    let report = fx.aggregator(&CannedSearch).run(&ReportRequest {
      raw_number: "+6281234567890",
      api_key: None,
      num_results: 5,
    });
    assert_eq!(fx.http.calls.get(), 0);

    let v = serde_json::to_value(&report).unwrap();
    assert_eq!(v["Basic Info"]["Carrier"], "Telkomsel");
    assert_eq!(v["Breach Check"]["Status"], "Skipped - No HIBP API key provided");
    assert_eq!(v["Google Results"].as_array().unwrap().len(), 5);
    assert!(v["Reverse Lookup"][2].as_str().unwrap().ends_with("7890@example.com"));
    assert_eq!(v["Metadata"]["Tool Version"], TOOL_VERSION);
    assert!(!v["Metadata"]["Report ID"].as_str().unwrap().is_empty());
  }

  #[test]
  fn extension_is_left_out_of_profile_handle() {
    let fx = Fixture::new();
    let report = fx.aggregator(&CannedSearch).run(&request("+14155552671 ext. 123"));
    let v = serde_json::to_value(&report).unwrap();
    assert_eq!(v["Basic Info"]["Extension"], "123");
    assert_eq!(v["Reverse Lookup"][2], "Linked profile: user2671@example.com");
  }

  #[test]
  fn disabled_search_is_reported_in_band() {
    let fx = Fixture::new();
    let agg = Aggregator::new(
      &fx.resolver,
      &fx.catalog,
      BreachChecker::new(&fx.http, &fx.breach_cfg),
      None,
    )
    .with_network_source(offline);
    let report = agg.run(&request("+6281234567890"));
    assert_eq!(report.google_entries(), vec!["Error: Google search disabled".to_string()]);
  }

  #[test]
  fn http_error_section_carries_details() {
    let e = SectionError::HttpStatus {
      status: 503,
      details: "busy".to_string(),
    };
    let v = serde_json::to_value(ErrorObject(&e)).unwrap();
    assert_eq!(v["Error"], "HTTP 503");
    assert_eq!(v["Details"], "busy");
  }

  #[test]
  fn section_keys_serialize_in_report_order() {
    let fx = Fixture::new();
    let report = fx.aggregator(&CannedSearch).run(&request("+6281234567890"));
    let raw = report.to_json_pretty().unwrap();
    let positions: Vec<usize> = SECTION_KEYS
      .iter()
      .map(|k| raw.find(&format!("\"{k}\"")).unwrap())
      .collect();
    assert!(positions.windows(2).all(|w| w[0] < w[1]));
  }
}
