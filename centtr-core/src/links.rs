use anyhow::Context;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

const BUNDLED_CATALOG: &str = include_str!("../data/platforms.toml");

const E164_PLACEHOLDER: &str = "{e164}";
const DIGITS_PLACEHOLDER: &str = "{digits}";

#[derive(Debug, Clone, Deserialize)]
pub struct PlatformTemplate {
  pub name: String,

  #[serde(default)]
  pub icon: String,

  pub template: String,
}

#[derive(Debug, Clone, Deserialize)]
struct CatalogFile {
  #[serde(default)]
  platform: Vec<PlatformTemplate>,
}

#[derive(Debug, Clone)]
pub struct LinkCatalog {
  platforms: Vec<PlatformTemplate>,
}

impl LinkCatalog {
  pub fn bundled() -> anyhow::Result<Self> {
    Self::from_toml_str(BUNDLED_CATALOG).context("parse bundled platform catalog")
  }

  pub fn load(path: &Path) -> anyhow::Result<Self> {
    let raw = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    Self::from_toml_str(&raw).with_context(|| format!("parse {}", path.display()))
  }

  pub fn from_toml_str(raw: &str) -> anyhow::Result<Self> {
    let file: CatalogFile = toml::from_str(raw)?;
    validate_catalog(&file.platform)?;
    Ok(Self {
      platforms: file.platform,
    })
  }

  pub fn len(&self) -> usize {
    self.platforms.len()
  }

  pub fn is_empty(&self) -> bool {
    self.platforms.is_empty()
  }

  pub fn platforms(&self) -> &[PlatformTemplate] {
    &self.platforms
  }

  /// Fills every template with the number. URLs are built, never fetched.
  pub fn build(&self, e164: &str, digits: &str) -> SocialLinks {
    let encoded = urlencoding::encode(e164);
    let links = self
      .platforms
      .iter()
      .map(|p| SocialLink {
        name: p.name.clone(),
        icon: p.icon.clone(),
        url: p
          .template
          .replace(E164_PLACEHOLDER, &encoded)
          .replace(DIGITS_PLACEHOLDER, digits),
      })
      .collect();
    SocialLinks { links }
  }
}

fn validate_catalog(platforms: &[PlatformTemplate]) -> anyhow::Result<()> {
  if platforms.is_empty() {
    anyhow::bail!("platform catalog must not be empty");
  }

  let mut seen = HashSet::new();
  for p in platforms {
    let name = p.name.trim();
    if name.is_empty() {
      anyhow::bail!("platform name must not be empty");
    }
    if !seen.insert(name.to_ascii_lowercase()) {
      anyhow::bail!("duplicate platform name: {name}");
    }
    if !p.template.contains(E164_PLACEHOLDER) && !p.template.contains(DIGITS_PLACEHOLDER) {
      anyhow::bail!("template for {name} has no number placeholder");
    }
  }

  Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SocialLink {
  pub name: String,
  pub icon: String,
  pub url: String,
}

impl SocialLink {
  pub fn label(&self) -> String {
    if self.icon.is_empty() {
      self.name.clone()
    } else {
      format!("{} {}", self.icon, self.name)
    }
  }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SocialLinks {
  links: Vec<SocialLink>,
}

impl SocialLinks {
  pub fn iter(&self) -> impl Iterator<Item = &SocialLink> {
    self.links.iter()
  }

  pub fn len(&self) -> usize {
    self.links.len()
  }

  pub fn is_empty(&self) -> bool {
    self.links.is_empty()
  }

  pub fn get(&self, name: &str) -> Option<&str> {
    self
      .links
      .iter()
      .find(|l| l.name == name)
      .map(|l| l.url.as_str())
  }
}

impl Serialize for SocialLinks {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(self.links.len()))?;
    for link in &self.links {
      map.serialize_entry(&link.name, &link.url)?;
    }
    map.end()
  }
}
