use anyhow::Context;
use reqwest::blocking::{Client, Response};
use reqwest::header::USER_AGENT;
use reqwest::Url;
use std::io::Read;
use std::time::Duration;

pub const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
  pub status: u16,
  pub body: String,
}

#[derive(Debug, Clone)]
pub struct HttpRequest<'a> {
  pub url: &'a Url,
  pub user_agent: &'a str,
  pub headers: &'a [(&'a str, &'a str)],
  pub timeout: Duration,
}

/// Single blocking GET. Any `Err` is a transport failure; HTTP error statuses
/// come back as a normal response.
pub trait HttpGet {
  fn get(&self, req: &HttpRequest<'_>) -> anyhow::Result<HttpResponse>;
}

pub struct BlockingHttp {
  client: Client,
}

impl BlockingHttp {
  pub fn new() -> anyhow::Result<Self> {
    let client = Client::builder().build().context("build HTTP client")?;
    Ok(Self { client })
  }
}

impl HttpGet for BlockingHttp {
  fn get(&self, req: &HttpRequest<'_>) -> anyhow::Result<HttpResponse> {
    let mut builder = self
      .client
      .get(req.url.clone())
      .timeout(req.timeout)
      .header(USER_AGENT, req.user_agent);
    for (name, value) in req.headers {
      builder = builder.header(*name, *value);
    }

    let response = builder
      .send()
      .with_context(|| format!("GET {}", safe_url_label(req.url)))?;
    let status = response.status().as_u16();
    let body = read_response_with_limit(response, MAX_BODY_BYTES)?;

    Ok(HttpResponse {
      status,
      body: String::from_utf8_lossy(&body).into_owned(),
    })
  }
}

fn read_response_with_limit(response: Response, max_bytes: usize) -> anyhow::Result<Vec<u8>> {
  let mut out = Vec::new();
  let mut limited = response.take((max_bytes.saturating_add(1)) as u64);
  limited
    .read_to_end(&mut out)
    .context("read response body")?;

  if out.len() > max_bytes {
    anyhow::bail!("response exceeds max size {} bytes", max_bytes);
  }

  Ok(out)
}

/// Host and path only. Query strings may carry the number being searched.
pub fn safe_url_label(url: &Url) -> String {
  let host = url.host_str().unwrap_or("<no-host>");
  let mut path = url.path().to_string();
  if path.is_empty() {
    path = "/".to_string();
  }
  format!("{host}{path}")
}
