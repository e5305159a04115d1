use crate::browser;
use crate::cli::Options;
use crate::render;
use anyhow::Context;
use centtr_core::config::Config;
use centtr_core::number::ParsedNumber;
use centtr_core::report::{Aggregator, ReportEnvelope, ReportRequest, TOOL_VERSION};
use centtr_core::report_store;
use centtr_core::types::today_local;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::time::Duration;

const NUMBER_PROMPT: &str = " ( +6281234567890 ): ";

pub struct Session<'a> {
  pub cfg: &'a Config,
  pub opts: &'a Options,
  pub aggregator: &'a Aggregator<'a>,
}

impl Session<'_> {
  pub fn run_interactive(&self) -> anyhow::Result<()> {
    println!("{}", render::banner(TOOL_VERSION, &today_local()));

    let number = match &self.opts.number {
      Some(n) => n.trim().to_string(),
      None => prompt(NUMBER_PROMPT)?,
    };
    self.warn_about_input(&number);

    let api_key = match self.cfg.resolve_api_key(self.opts.api_key.as_deref()) {
      Some(k) => Some(k),
      None => {
        let k = prompt("\nEnter Have I Been Pwned API key (leave empty to skip): ")?;
        (!k.is_empty()).then_some(k)
      }
    };

    println!("Gathering intelligence...");
    let report = self.run_report(&number, api_key.as_deref());
    println!("\n✓ OSINT Results");
    print!("{}", render::report(&report));

    self.offer_links(&report)?;

    match &self.opts.save {
      Some(path) => {
        save_and_report(&report, path.clone());
      }
      None => self.offer_save(&report)?,
    }
    Ok(())
  }

  /// Single pass with no prompts. Problems with the number are still
  /// reported in-band by the report sections.
  pub fn run_batch(&self) -> anyhow::Result<()> {
    let number = self
      .opts
      .number
      .as_deref()
      .map(str::trim)
      .context("--batch requires --number")?;
    self.warn_about_input(number);

    let api_key = self.cfg.resolve_api_key(self.opts.api_key.as_deref());
    let report = self.run_report(number, api_key.as_deref());
    print!("{}", render::report(&report));

    if let Some(path) = &self.opts.save {
      report_store::save(&report, path)?;
      println!("Results saved to {}", path.display());
    }
    Ok(())
  }

  fn run_report(&self, number: &str, api_key: Option<&str>) -> ReportEnvelope {
    let num_results = self.opts.results.unwrap_or(self.cfg.search.num_results);
    self.aggregator.run(&ReportRequest {
      raw_number: number,
      api_key,
      num_results,
    })
  }

  fn warn_about_input(&self, number: &str) {
    if !number.starts_with('+') {
      println!("Warning: Phone number should start with '+' for international format");
    }
    if let Err(e) = ParsedNumber::parse(number, self.cfg.default_region.as_deref()) {
      println!("Error parsing phone number: {e}");
    }
  }

  fn offer_links(&self, report: &ReportEnvelope) -> anyhow::Result<()> {
    let Ok(links) = &report.social_media else {
      return Ok(());
    };
    if links.is_empty() {
      return Ok(());
    }

    println!("\nWould you like to open any links in your browser?");
    for (i, link) in links.iter().enumerate() {
      println!("{}. {} - {}", i + 1, link.name, link.url);
    }
    println!("A. Open all links");
    println!("N. None (continue)");

    let choice = prompt("\n CentTR > ")?;
    let all: Vec<_> = links.iter().collect();
    match parse_link_selection(&choice, all.len()) {
      LinkSelection::Skip => {}
      LinkSelection::All => {
        println!("Opening all links...");
        for link in &all {
          if let Err(e) = browser::open(&link.url) {
            tracing::warn!(platform = %link.name, error = ?e, "failed to open link");
            println!("Failed to open {}", link.name);
          }
        }
        println!("All links opened in your default browser");
      }
      LinkSelection::Indices(picked) => {
        for (n, i) in picked.iter().enumerate() {
          let link = all[*i];
          if n > 0 {
            std::thread::sleep(Duration::from_secs(1));
          }
          match browser::open(&link.url) {
            Ok(()) => println!("Opened {}", link.name),
            Err(e) => {
              tracing::warn!(platform = %link.name, error = ?e, "failed to open link");
              println!("Failed to open {}", link.name);
            }
          }
        }
      }
    }
    Ok(())
  }

  fn offer_save(&self, report: &ReportEnvelope) -> anyhow::Result<()> {
    let answer = prompt("\nSave results to file? (y/n): ")?;
    if !answer.eq_ignore_ascii_case("y") {
      return Ok(());
    }

    let default_name = &self.cfg.report.default_filename;
    let filename = prompt(&format!("Enter filename ( {default_name}): "))?;
    let path = PathBuf::from(if filename.is_empty() {
      default_name.as_str()
    } else {
      filename.as_str()
    });

    if save_and_report(report, path.clone()) {
      let open = prompt("Would you like to open the file now? (y/n): ")?;
      if open.eq_ignore_ascii_case("y") {
        if let Err(e) = browser::open(&path.to_string_lossy()) {
          println!("Failed to open {}: {e:#}", path.display());
        }
      }
    }
    Ok(())
  }
}

/// Returns whether the file was written.
fn save_and_report(report: &ReportEnvelope, path: PathBuf) -> bool {
  match report_store::save(report, &path) {
    Ok(()) => {
      println!("Results saved to {}", path.display());
      true
    }
    Err(e) => {
      tracing::warn!(path = %path.display(), error = ?e, "report save failed");
      println!("Failed to save file: {e:#}");
      false
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkSelection {
  All,
  Skip,
  /// Zero-based positions, in the order given, without repeats.
  Indices(Vec<usize>),
}

/// `A` opens everything, `N` nothing; otherwise every run of digits is a
/// 1-based choice and out-of-range numbers are ignored.
pub fn parse_link_selection(input: &str, count: usize) -> LinkSelection {
  let choice = input.trim();
  if choice.eq_ignore_ascii_case("a") {
    return LinkSelection::All;
  }
  if choice.eq_ignore_ascii_case("n") {
    return LinkSelection::Skip;
  }

  let mut picked = Vec::new();
  for run in choice.split(|c: char| !c.is_ascii_digit()) {
    let Ok(n) = run.parse::<usize>() else {
      continue;
    };
    if (1..=count).contains(&n) && !picked.contains(&(n - 1)) {
      picked.push(n - 1);
    }
  }

  if picked.is_empty() {
    LinkSelection::Skip
  } else {
    LinkSelection::Indices(picked)
  }
}

fn prompt(label: &str) -> anyhow::Result<String> {
  print!("{label}");
  io::stdout().flush().context("flush stdout")?;
  read_trimmed_line(&mut io::stdin().lock())
}

fn read_trimmed_line(input: &mut dyn BufRead) -> anyhow::Result<String> {
  let mut line = String::new();
  let n = input.read_line(&mut line).context("read from stdin")?;
  if n == 0 {
    anyhow::bail!("input closed");
  }
  Ok(line.trim().to_string())
}
