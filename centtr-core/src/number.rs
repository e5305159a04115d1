use phonenumber::metadata::DATABASE;
use phonenumber::{Mode, PhoneNumber, Type};

use crate::types::LineType;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
  #[error("phone number is empty")]
  Empty,

  #[error("{0}")]
  Unparseable(String),
}

#[derive(Debug, Clone)]
pub struct ParsedNumber {
  inner: PhoneNumber,
  country_code: u16,
  national_number: u64,
  extension: Option<String>,
  region: Option<String>,
  valid: bool,
  possible: bool,
  kind: Type,
}

impl PartialEq for ParsedNumber {
  fn eq(&self, other: &Self) -> bool {
    self.country_code == other.country_code
      && self.national_number == other.national_number
      && self.extension == other.extension
  }
}

/// Every national significant number length any region under the calling
/// code accepts, across all number types.
fn possible_lengths(country_code: u16) -> Vec<usize> {
  let mut lengths: Vec<usize> = DATABASE
    .by_code(&country_code)
    .unwrap_or_default()
    .into_iter()
    .flat_map(|m| {
      let d = m.descriptors();
      std::iter::once(Some(d.general()))
        .chain([
          d.fixed_line(),
          d.mobile(),
          d.toll_free(),
          d.premium_rate(),
          d.shared_cost(),
          d.personal_number(),
          d.voip(),
          d.pager(),
          d.uan(),
          d.voicemail(),
        ])
        .flatten()
        .flat_map(|desc| desc.possible_length().iter().map(|&l| l as usize))
        .collect::<Vec<_>>()
    })
    .collect();
  lengths.sort_unstable();
  lengths.dedup();
  lengths
}

impl ParsedNumber {
  pub fn parse(raw: &str, region_hint: Option<&str>) -> Result<Self, ParseError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
      return Err(ParseError::Empty);
    }

    let hint = region_hint
      .and_then(|r| r.trim().to_ascii_uppercase().parse::<phonenumber::country::Id>().ok());
    let inner =
      phonenumber::parse(hint, trimmed).map_err(|e| ParseError::Unparseable(e.to_string()))?;

    let valid = phonenumber::is_valid(&inner);
    let region = inner.country().id().map(|id| format!("{id:?}"));
    let nsn_len = inner.national().value().to_string().len() + inner.national().zeros() as usize;
    let possible = valid || possible_lengths(inner.country().code()).contains(&nsn_len);
    let kind = inner.number_type(&DATABASE);

    Ok(Self {
      country_code: inner.country().code(),
      national_number: inner.national().value(),
      extension: inner.extension().map(|ext| ext.to_string()),
      region,
      valid,
      possible,
      kind,
      inner,
    })
  }

  pub fn country_code(&self) -> u16 {
    self.country_code
  }

  pub fn national_number(&self) -> u64 {
    self.national_number
  }

  pub fn extension(&self) -> Option<&str> {
    self.extension.as_deref()
  }

  /// ISO 3166 region code resolved from the numbering plan, if any.
  pub fn region(&self) -> Option<&str> {
    self.region.as_deref()
  }

  pub fn is_valid(&self) -> bool {
    self.valid
  }

  pub fn is_possible(&self) -> bool {
    self.possible
  }

  pub fn line_type(&self) -> LineType {
    match self.kind {
      Type::Mobile => LineType::Mobile,
      _ => LineType::FixedLine,
    }
  }

  /// Carrier data only applies to numbers that may be mobile.
  pub fn is_mobile_capable(&self) -> bool {
    matches!(self.kind, Type::Mobile | Type::FixedLineOrMobile | Type::Pager)
  }

  pub fn e164(&self) -> String {
    self.inner.format().mode(Mode::E164).to_string()
  }

  pub fn international(&self) -> String {
    self.inner.format().mode(Mode::International).to_string()
  }

  pub fn national(&self) -> String {
    self.inner.format().mode(Mode::National).to_string()
  }

  pub fn digits(&self) -> String {
    self.e164().chars().filter(|c| c.is_ascii_digit()).collect()
  }

  pub fn national_significant(&self) -> String {
    self.national_number.to_string()
  }
}
