use crate::number::ParsedNumber;
use crate::types::{yes_no, LineType};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

const BUNDLED_NUMBERING: &str = include_str!("../data/numbering.toml");
const BUNDLED_CARRIERS: &str = include_str!("../data/carriers.txt");
const BUNDLED_GEOCODING: &str = include_str!("../data/geocoding.txt");

pub const UNKNOWN: &str = "Unknown";

#[derive(Debug, Clone, Deserialize)]
pub struct NumberingData {
  pub version: String,

  #[serde(default)]
  pub regions: BTreeMap<String, RegionEntry>,

  /// Area-level time zones, overriding the region-wide list.
  #[serde(default)]
  pub zones: Vec<ZoneEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegionEntry {
  pub name: String,

  #[serde(default)]
  pub time_zones: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ZoneEntry {
  pub time_zones: Vec<String>,
  pub prefixes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumberMetadata {
  pub carrier: String,
  pub location: String,
  pub time_zones: String,
  pub line_type: LineType,
}

/// Values keyed by E.164 digit prefix (country code included), looked up by
/// longest match.
#[derive(Debug, Clone)]
pub struct PrefixTable<V> {
  entries: HashMap<String, V>,
  longest: usize,
}

impl<V> Default for PrefixTable<V> {
  fn default() -> Self {
    Self {
      entries: HashMap::new(),
      longest: 0,
    }
  }
}

impl<V> PrefixTable<V> {
  pub fn insert(&mut self, prefix: &str, value: V) -> anyhow::Result<()> {
    if prefix.is_empty() || !prefix.bytes().all(|b| b.is_ascii_digit()) {
      anyhow::bail!("prefix must be digits only: `{prefix}`");
    }
    self.longest = self.longest.max(prefix.len());
    self.entries.insert(prefix.to_string(), value);
    Ok(())
  }

  pub fn lookup(&self, digits: &str) -> Option<&V> {
    let max = self.longest.min(digits.len());
    (1..=max).rev().find_map(|len| self.entries.get(digits.get(..len)?))
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }
}

impl PrefixTable<String> {
  /// `prefix|value` lines; blank lines and `#` comments are skipped.
  pub fn parse(raw: &str) -> anyhow::Result<Self> {
    let mut table = Self::default();
    for (i, line) in raw.lines().enumerate() {
      let line = line.trim();
      if line.is_empty() || line.starts_with('#') {
        continue;
      }
      let (prefix, value) = line
        .split_once('|')
        .ok_or_else(|| anyhow::anyhow!("line {}: expected `prefix|value`", i + 1))?;
      let value = value.trim();
      if value.is_empty() {
        continue;
      }
      table
        .insert(prefix.trim(), value.to_string())
        .with_context(|| format!("line {}", i + 1))?;
    }
    Ok(table)
  }
}

#[derive(Debug, Clone, Serialize)]
pub struct RegionDetails {
  #[serde(rename = "Region")]
  pub region: String,

  #[serde(rename = "Estimated Coordinates")]
  pub estimated_coordinates: String,

  #[serde(rename = "Area Code Info")]
  pub area_code_info: String,
}

impl RegionDetails {
  fn for_location(location: &str) -> Self {
    Self {
      region: location.to_string(),
      estimated_coordinates: "Not available".to_string(),
      area_code_info: "Not available".to_string(),
    }
  }
}

#[derive(Debug, Clone, Serialize)]
pub struct BasicInfo {
  #[serde(rename = "International Format")]
  pub international: String,

  #[serde(rename = "National Format")]
  pub national: String,

  #[serde(rename = "E164 Format")]
  pub e164: String,

  #[serde(rename = "Carrier")]
  pub carrier: String,

  #[serde(rename = "Location")]
  pub location: String,

  #[serde(rename = "Time Zone")]
  pub time_zones: String,

  #[serde(rename = "Number Type")]
  pub line_type: LineType,

  #[serde(rename = "Valid Number", serialize_with = "yes_no")]
  pub valid: bool,

  #[serde(rename = "Possible Number", serialize_with = "yes_no")]
  pub possible: bool,

  #[serde(rename = "Country Code")]
  pub country_code: u16,

  #[serde(rename = "National Number")]
  pub national_number: u64,

  #[serde(rename = "Extension")]
  pub extension: String,

  #[serde(rename = "Region Details", skip_serializing_if = "Option::is_none")]
  pub region_details: Option<RegionDetails>,
}

#[derive(Debug, Clone)]
pub struct MetadataResolver {
  version: String,
  regions: BTreeMap<String, RegionEntry>,
  zones: PrefixTable<Vec<String>>,
  carriers: PrefixTable<String>,
  areas: PrefixTable<String>,
}

impl MetadataResolver {
  pub fn bundled() -> anyhow::Result<Self> {
    Self::from_parts(BUNDLED_NUMBERING, BUNDLED_CARRIERS, BUNDLED_GEOCODING)
      .context("parse bundled numbering data")
  }

  pub fn from_parts(numbering: &str, carriers: &str, geocoding: &str) -> anyhow::Result<Self> {
    let data: NumberingData = toml::from_str(numbering).context("numbering table")?;

    let mut zones = PrefixTable::default();
    for z in data.zones {
      if z.time_zones.is_empty() {
        anyhow::bail!("zone entry without time zones");
      }
      for p in &z.prefixes {
        zones.insert(p, z.time_zones.clone()).context("zone table")?;
      }
    }

    Ok(Self {
      version: data.version,
      regions: data.regions,
      zones,
      carriers: PrefixTable::parse(carriers).context("carrier table")?,
      areas: PrefixTable::parse(geocoding).context("geocoding table")?,
    })
  }

  pub fn dataset_version(&self) -> &str {
    &self.version
  }

  pub fn region_name(&self, id: &str) -> Option<&str> {
    self.regions.get(id).map(|r| r.name.as_str())
  }

  /// Numbers failing validation resolve to `Unknown` for every field except
  /// the line type.
  pub fn resolve(&self, number: &ParsedNumber) -> NumberMetadata {
    let line_type = number.line_type();
    if !number.is_valid() {
      return NumberMetadata {
        carrier: UNKNOWN.to_string(),
        location: UNKNOWN.to_string(),
        time_zones: UNKNOWN.to_string(),
        line_type,
      };
    }

    let digits = number.digits();
    let region = number.region().and_then(|id| self.regions.get(id));

    let location = self
      .areas
      .lookup(&digits)
      .cloned()
      .or_else(|| region.map(|r| r.name.clone()))
      .unwrap_or_else(|| UNKNOWN.to_string());

    let time_zones = match self.zones.lookup(&digits).or(region.map(|r| &r.time_zones)) {
      Some(zs) if !zs.is_empty() => zs.join(", "),
      _ => UNKNOWN.to_string(),
    };

    let carrier = if number.is_mobile_capable() {
      self.carriers.lookup(&digits).cloned()
    } else {
      None
    };

    NumberMetadata {
      carrier: carrier.unwrap_or_else(|| UNKNOWN.to_string()),
      location,
      time_zones,
      line_type,
    }
  }

  pub fn basic_info(&self, number: &ParsedNumber) -> BasicInfo {
    let meta = self.resolve(number);
    let region_details = if meta.location != UNKNOWN {
      Some(RegionDetails::for_location(&meta.location))
    } else {
      None
    };

    BasicInfo {
      international: number.international(),
      national: number.national(),
      e164: number.e164(),
      carrier: meta.carrier,
      location: meta.location,
      time_zones: meta.time_zones,
      line_type: meta.line_type,
      valid: number.is_valid(),
      possible: number.is_possible(),
      country_code: number.country_code(),
      national_number: number.national_number(),
      extension: number.extension().unwrap_or("None").to_string(),
      region_details,
    }
  }
}
