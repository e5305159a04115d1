use crate::config::SearchConfig;
use crate::http::{safe_url_label, HttpGet, HttpRequest};
use crate::number::ParsedNumber;
use crate::types::{SectionError, SectionResult};
use anyhow::Context;
use reqwest::Url;
use scraper::{Html, Selector};
use std::collections::HashSet;
use std::time::Duration;

const RESULTS_PER_PAGE: usize = 10;
const MAX_PAGES: usize = 10;

pub fn build_query(number: &ParsedNumber) -> String {
  format!(
    "intext:\"{}\" OR intext:\"{}\"",
    number.national(),
    number.international()
  )
}

pub trait SearchProvider {
  /// One page of result URLs in provider order, starting at `offset`.
  fn fetch_page(&self, query: &str, offset: usize, per_page: usize) -> anyhow::Result<Vec<String>>;
}

pub struct WebSearchCollector<'a> {
  provider: &'a dyn SearchProvider,
  pause: Duration,
}

impl<'a> WebSearchCollector<'a> {
  pub fn new(provider: &'a dyn SearchProvider, pause: Duration) -> Self {
    Self { provider, pause }
  }

  pub fn search(&self, number: &ParsedNumber, limit: usize) -> SectionResult<Vec<String>> {
    let query = build_query(number);
    self.collect(&query, limit).map_err(|e| {
      tracing::warn!(error = ?e, "web search failed");
      SectionError::Search(format!("{e:#}"))
    })
  }

  /// Up to `limit` distinct URLs. Sleeps between provider calls, never before
  /// the first one.
  pub fn collect(&self, query: &str, limit: usize) -> anyhow::Result<Vec<String>> {
    let mut out = Vec::new();
    let mut seen = HashSet::new();
    let per_page = limit.clamp(1, RESULTS_PER_PAGE);

    for page in 0..MAX_PAGES {
      if out.len() >= limit {
        break;
      }
      if page > 0 && !self.pause.is_zero() {
        std::thread::sleep(self.pause);
      }

      let offset = page * per_page;
      let urls = self
        .provider
        .fetch_page(query, offset, per_page)
        .with_context(|| format!("fetch results page {}", page + 1))?;

      let before = out.len();
      for url in urls {
        if out.len() >= limit {
          break;
        }
        if seen.insert(url.clone()) {
          out.push(url);
        }
      }

      tracing::debug!(page = page + 1, collected = out.len(), "search page processed");
      if out.len() == before {
        break;
      }
    }

    Ok(out)
  }
}

pub struct GoogleSearch<'a> {
  http: &'a dyn HttpGet,
  cfg: &'a SearchConfig,
}

impl<'a> GoogleSearch<'a> {
  pub fn new(http: &'a dyn HttpGet, cfg: &'a SearchConfig) -> Self {
    Self { http, cfg }
  }

  fn page_url(&self, query: &str, offset: usize, per_page: usize) -> anyhow::Result<Url> {
    let mut url = Url::parse(&self.cfg.endpoint)
      .with_context(|| format!("invalid search endpoint {}", self.cfg.endpoint))?;
    url
      .query_pairs_mut()
      .append_pair("q", query)
      .append_pair("hl", &self.cfg.language)
      .append_pair("num", &per_page.to_string())
      .append_pair("start", &offset.to_string())
      .append_pair("safe", "off");
    Ok(url)
  }
}

impl SearchProvider for GoogleSearch<'_> {
  fn fetch_page(&self, query: &str, offset: usize, per_page: usize) -> anyhow::Result<Vec<String>> {
    let url = self.page_url(query, offset, per_page)?;
    let req = HttpRequest {
      url: &url,
      user_agent: &self.cfg.user_agent,
      headers: &[],
      timeout: Duration::from_secs(self.cfg.timeout_seconds),
    };

    let resp = self.http.get(&req)?;
    if resp.status != 200 {
      anyhow::bail!(
        "unexpected HTTP status {} for {}",
        resp.status,
        safe_url_label(&url)
      );
    }

    extract_result_links(&resp.body, &url)
  }
}

/// Result links from a results page, unwrapping `/url?q=` redirects and
/// dropping the engine's own links.
pub fn extract_result_links(html: &str, page_url: &Url) -> anyhow::Result<Vec<String>> {
  let doc = Html::parse_document(html);
  let scoped = selector("#search a[href]")?;
  let any = selector("a[href]")?;

  let mut anchors: Vec<_> = doc.select(&scoped).collect();
  if anchors.is_empty() {
    anchors = doc.select(&any).collect();
  }

  let mut out = Vec::new();
  let mut seen = HashSet::new();
  for a in anchors {
    let Some(href) = a.value().attr("href") else {
      continue;
    };
    let Some(link) = filter_result(href, page_url) else {
      continue;
    };
    if seen.insert(link.clone()) {
      out.push(link);
    }
  }

  Ok(out)
}

fn selector(css: &str) -> anyhow::Result<Selector> {
  Selector::parse(css).map_err(|e| anyhow::anyhow!("invalid selector {css}: {e:?}"))
}

fn filter_result(href: &str, page_url: &Url) -> Option<String> {
  let resolved = page_url.join(href).ok()?;

  let target = if resolved.path() == "/url" && is_engine_host(resolved.host_str()) {
    let raw = resolved
      .query_pairs()
      .find(|(k, _)| k == "q" || k == "url")
      .map(|(_, v)| v.into_owned())?;
    Url::parse(&raw).ok()?
  } else {
    resolved
  };

  if !matches!(target.scheme(), "http" | "https") {
    return None;
  }
  if is_engine_host(target.host_str()) {
    return None;
  }
  Some(target.to_string())
}

fn is_engine_host(host: Option<&str>) -> bool {
  host.is_some_and(|h| h.split('.').any(|label| label == "google"))
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::http::HttpResponse;
  use std::cell::{Cell, RefCell};
  use std::time::Instant;

  struct PagedProvider {
    pages: Vec<Vec<String>>,
    calls: Cell<usize>,
  }

  impl PagedProvider {
    fn new(pages: &[&[&str]]) -> Self {
      Self {
        pages: pages
          .iter()
          .map(|p| p.iter().map(|s| s.to_string()).collect())
          .collect(),
        calls: Cell::new(0),
      }
    }
  }

  impl SearchProvider for PagedProvider {
    fn fetch_page(&self, _query: &str, _offset: usize, _per_page: usize) -> anyhow::Result<Vec<String>> {
      let i = self.calls.get();
      self.calls.set(i + 1);
      Ok(self.pages.get(i).cloned().unwrap_or_default())
    }
  }

  struct FailingProvider;

  impl SearchProvider for FailingProvider {
    fn fetch_page(&self, _query: &str, _offset: usize, _per_page: usize) -> anyhow::Result<Vec<String>> {
      anyhow::bail!("unexpected HTTP status 429 for www.google.com/search")
    }
  }

  struct FakeHttp {
    body: String,
    status: u16,
    last_url: RefCell<Option<Url>>,
  }

  impl HttpGet for FakeHttp {
    fn get(&self, req: &HttpRequest<'_>) -> anyhow::Result<HttpResponse> {
      *self.last_url.borrow_mut() = Some(req.url.clone());
      Ok(HttpResponse {
        status: self.status,
        body: self.body.clone(),
      })
    }
  }

  fn number() -> ParsedNumber {
    ParsedNumber::parse("+6281234567890", None).unwrap()
  }

  #[test]
  fn query_quotes_both_formats() {
    let n = number();
    let q = build_query(&n);
    assert_eq!(
      q,
      format!("intext:\"{}\" OR intext:\"{}\"", n.national(), n.international())
    );
  }

  #[test]
  fn never_returns_more_than_limit() {
    let provider = PagedProvider::new(&[
      &["https://a.example/1", "https://a.example/2", "https://a.example/3"],
      &["https://a.example/4", "https://a.example/5", "https://a.example/6"],
    ]);
    let collector = WebSearchCollector::new(&provider, Duration::ZERO);
    let urls = collector.search(&number(), 5).unwrap();
    assert_eq!(urls.len(), 5);
    assert_eq!(urls[0], "https://a.example/1");
    assert_eq!(urls[4], "https://a.example/5");
    assert_eq!(provider.calls.get(), 2);
  }

  #[test]
  fn stops_when_a_page_adds_nothing() {
    let provider = PagedProvider::new(&[&["https://a.example/1"], &["https://a.example/1"]]);
    let collector = WebSearchCollector::new(&provider, Duration::ZERO);
    let urls = collector.collect("q", 5).unwrap();
    assert_eq!(urls, vec!["https://a.example/1".to_string()]);
    assert_eq!(provider.calls.get(), 2);
  }

  #[test]
  fn zero_limit_makes_no_calls() {
    let provider = PagedProvider::new(&[&["https://a.example/1"]]);
    let collector = WebSearchCollector::new(&provider, Duration::ZERO);
    assert!(collector.collect("q", 0).unwrap().is_empty());
    assert_eq!(provider.calls.get(), 0);
  }

  #[test]
  fn pauses_between_pages_only() {
    let pause = Duration::from_millis(50);
    let provider = PagedProvider::new(&[&["https://a.example/1"], &["https://a.example/2"]]);
    let collector = WebSearchCollector::new(&provider, pause);

    let started = Instant::now();
    let urls = collector.collect("q", 2).unwrap();
    let elapsed = started.elapsed();

    assert_eq!(urls.len(), 2);
    assert_eq!(provider.calls.get(), 2);
    assert!(elapsed >= pause, "{elapsed:?}");
    assert!(elapsed < pause * 2, "{elapsed:?}");
  }

  #[test]
  fn provider_failure_becomes_section_error() {
    let collector = WebSearchCollector::new(&FailingProvider, Duration::ZERO);
    let err = collector.search(&number(), 5).unwrap_err();
    assert!(matches!(err, SectionError::Search(_)));
    assert!(err.to_string().starts_with("Google search failed - "));
    assert!(err.to_string().contains("429"));
  }

  #[test]
  fn extracts_and_unwraps_links() {
    let html = r#"
      <html><body>
        <div id="gbar"><a href="https://accounts.google.com/login">Sign in</a></div>
        <div id="search">
          <a href="/url?q=https://directory.example/6281234567890&amp;sa=U">Directory</a>
          <a href="https://forum.example/thread/9">Forum</a>
          <a href="/search?q=next&amp;start=10">Next</a>
          <a href="https://maps.google.com/place">Maps</a>
          <a href="https://forum.example/thread/9">Forum again</a>
          <a href="mailto:someone@example.com">Mail</a>
        </div>
      </body></html>
    "#;
    let page = Url::parse("https://www.google.com/search?q=x").unwrap();
    let links = extract_result_links(html, &page).unwrap();
    assert_eq!(
      links,
      vec![
        "https://directory.example/6281234567890".to_string(),
        "https://forum.example/thread/9".to_string(),
      ]
    );
  }

  #[test]
  fn falls_back_to_all_anchors_without_search_block() {
    let html = r#"<a href="https://only.example/">Only</a>"#;
    let page = Url::parse("https://www.google.com/search").unwrap();
    assert_eq!(
      extract_result_links(html, &page).unwrap(),
      vec!["https://only.example/".to_string()]
    );
  }

  #[test]
  fn google_provider_builds_paged_request() {
    let http = FakeHttp {
      body: r#"<div id="search"><a href="https://r.example/">R</a></div>"#.to_string(),
      status: 200,
      last_url: RefCell::new(None),
    };
    let cfg = SearchConfig::default();
    let provider = GoogleSearch::new(&http, &cfg);

    let links = provider.fetch_page("intext:\"x\"", 10, 5).unwrap();
    assert_eq!(links, vec!["https://r.example/".to_string()]);

    let url = http.last_url.borrow().clone().unwrap();
    let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
    assert!(pairs.contains(&("q".to_string(), "intext:\"x\"".to_string())));
    assert!(pairs.contains(&("start".to_string(), "10".to_string())));
    assert!(pairs.contains(&("num".to_string(), "5".to_string())));
  }

  #[test]
  fn google_provider_rejects_non_200() {
    let http = FakeHttp {
      body: "captcha".to_string(),
      status: 429,
      last_url: RefCell::new(None),
    };
    let cfg = SearchConfig::default();
    let err = GoogleSearch::new(&http, &cfg)
      .fetch_page("q", 0, 5)
      .unwrap_err();
    assert!(err.to_string().contains("429"));
  }
}
