use centtr_core::breach::BreachOutcome;
use centtr_core::metadata::BasicInfo;
use centtr_core::report::{NetworkInfo, ReportEnvelope, ReportMetadata};
use centtr_core::reverse_lookup::PLACEHOLDER_NOTICE;
use centtr_core::types::{yes_no_label, SectionError};
use std::fmt::Write as _;
use unicode_width::UnicodeWidthStr;

const BANNER: &str = r"
   ______           __  __________
  / ____/__  ____  / /_/_  __/ __ \
 / /   / _ \/ __ \/ __// / / /_/ /
/ /___/  __/ / / / /_ / / / _, _/
\____/\___/_/ /_/\__//_/ /_/ |_|
";

pub fn banner(version: &str, date: &str) -> String {
  let mut out = String::from(BANNER);
  out.push('\n');
  out.push_str(&panel(
    "",
    &[
      format!("simple phone numbers osint v{version}"),
      format!("./Freedom Security • {date}"),
    ],
  ));
  out
}

pub fn report(r: &ReportEnvelope) -> String {
  [
    basic_info(&r.basic_info),
    social_media(r),
    breach_check(&r.breach_check),
    numbered("🔍 Google Search Results", &r.google_entries()),
    reverse_lookup(r),
    metadata(&r.metadata),
  ]
  .join("\n")
}

fn basic_info(section: &Result<BasicInfo, SectionError>) -> String {
  let title = "📱 Basic Information";
  let info = match section {
    Ok(info) => info,
    Err(e) => return error_panel(title, e),
  };

  let mut rows = vec![
    row("International Format", &info.international),
    row("National Format", &info.national),
    row("E164 Format", &info.e164),
    row("Carrier", &info.carrier),
    row("Location", &info.location),
    row("Time Zone", &info.time_zones),
    row("Number Type", info.line_type.as_str()),
    row("Valid Number", yes_no_label(info.valid)),
    row("Possible Number", yes_no_label(info.possible)),
    row("Country Code", &info.country_code.to_string()),
    row("National Number", &info.national_number.to_string()),
    row("Extension", &info.extension),
  ];
  if let Some(d) = &info.region_details {
    rows.push(row("Region Details.Region", &d.region));
    rows.push(row("Region Details.Estimated Coordinates", &d.estimated_coordinates));
    rows.push(row("Region Details.Area Code Info", &d.area_code_info));
  }

  table(title, Some(&["Field", "Value"]), &rows)
}

fn social_media(r: &ReportEnvelope) -> String {
  let title = "📱 Social Media Links";
  match &r.social_media {
    Ok(links) => {
      let rows: Vec<Vec<String>> = links
        .iter()
        .map(|l| vec![l.label(), l.url.clone()])
        .collect();
      table(title, Some(&["Platform", "URL"]), &rows)
    }
    Err(e) => error_panel(title, e),
  }
}

fn breach_check(outcome: &BreachOutcome) -> String {
  match outcome {
    BreachOutcome::Breaches(list) => {
      let rows: Vec<Vec<String>> = list
        .iter()
        .map(|b| {
          vec![
            b.name.clone(),
            b.breach_date.clone(),
            b.severity.map(|s| s.as_str()).unwrap_or("Unknown").to_string(),
            b.data_classes.join(", "),
          ]
        })
        .collect();
      table(
        "🔓 Data Breaches Found",
        Some(&["Breach Name", "Date", "Severity", "Data Classes"]),
        &rows,
      )
    }
    BreachOutcome::Failed(e) => error_panel("🔒 Data Breach Check", e),
    sentinel => panel(
      "🔒 Data Breach Check",
      &[sentinel.status_message().unwrap_or_default().to_string()],
    ),
  }
}

fn reverse_lookup(r: &ReportEnvelope) -> String {
  let mut lines = r.reverse_lookup_entries();
  if r.reverse_lookup.is_ok() {
    lines.push(format!("({PLACEHOLDER_NOTICE})"));
  }
  panel("🔎 Reverse Lookup Results", &lines)
}

fn metadata(m: &ReportMetadata) -> String {
  let mut rows = vec![
    row("Search Date", &m.search_date),
    row("Phone Number", &m.phone_number),
    row("Tool Version", &m.tool_version),
    row("Execution Time", &m.execution_time),
    row("Report ID", &m.report_id),
  ];
  match &m.network {
    NetworkInfo::Available { host, ip_address } => {
      rows.push(row("Network.Host", host));
      rows.push(row("Network.IP Address", ip_address));
      rows.push(row(
        "Network.Location",
        "Unknown (would require GeoIP in production)",
      ));
    }
    NetworkInfo::Unavailable => rows.push(row("Network.Network Info", "Unavailable")),
  }
  table("📊 Metadata", None, &rows)
}

fn numbered(title: &str, entries: &[String]) -> String {
  let rows: Vec<Vec<String>> = entries
    .iter()
    .enumerate()
    .map(|(i, e)| vec![(i + 1).to_string(), e.clone()])
    .collect();
  table(title, Some(&["No.", "URL"]), &rows)
}

fn error_panel(title: &str, e: &SectionError) -> String {
  let mut lines = vec![format!("Error: {e}")];
  if let Some(d) = e.details() {
    lines.push(format!("Details: {d}"));
  }
  panel(title, &lines)
}

fn row(field: &str, value: &str) -> Vec<String> {
  vec![field.to_string(), value.to_string()]
}

/// Terminal columns; emoji and East Asian wide glyphs take two.
fn width(s: &str) -> usize {
  UnicodeWidthStr::width(s)
}

fn pad(s: &str, w: usize) -> String {
  format!("{s}{}", " ".repeat(w.saturating_sub(width(s))))
}

fn panel(title: &str, lines: &[String]) -> String {
  let inner = lines
    .iter()
    .map(|l| width(l))
    .chain(std::iter::once(width(title)))
    .max()
    .unwrap_or(0);

  let mut out = String::new();
  let _ = writeln!(out, "+{}+", "-".repeat(inner + 2));
  if !title.is_empty() {
    let _ = writeln!(out, "| {} |", pad(title, inner));
    let _ = writeln!(out, "+{}+", "-".repeat(inner + 2));
  }
  for l in lines {
    let _ = writeln!(out, "| {} |", pad(l, inner));
  }
  let _ = writeln!(out, "+{}+", "-".repeat(inner + 2));
  out
}

fn table(title: &str, headers: Option<&[&str]>, rows: &[Vec<String>]) -> String {
  let cols = headers
    .map(|h| h.len())
    .or_else(|| rows.first().map(|r| r.len()))
    .unwrap_or(0);

  let mut widths = vec![0usize; cols];
  if let Some(h) = headers {
    for (i, cell) in h.iter().enumerate() {
      widths[i] = widths[i].max(width(cell));
    }
  }
  for r in rows {
    for (i, cell) in r.iter().enumerate().take(cols) {
      widths[i] = widths[i].max(width(cell));
    }
  }

  let sep = format!(
    "+{}+",
    widths
      .iter()
      .map(|w| "-".repeat(w + 2))
      .collect::<Vec<_>>()
      .join("+")
  );
  let line = |cells: &[String]| -> String {
    let padded: Vec<String> = widths
      .iter()
      .enumerate()
      .map(|(i, w)| pad(cells.get(i).map(String::as_str).unwrap_or(""), *w))
      .collect();
    format!("| {} |", padded.join(" | "))
  };

  let mut out = String::new();
  let _ = writeln!(out, "{title}");
  let _ = writeln!(out, "{sep}");
  if let Some(h) = headers {
    let owned: Vec<String> = h.iter().map(|s| s.to_string()).collect();
    let _ = writeln!(out, "{}", line(&owned));
    let _ = writeln!(out, "{sep}");
  }
  if rows.is_empty() {
    let _ = writeln!(out, "{}", line(&["(none)".to_string()]));
  }
  for r in rows {
    let _ = writeln!(out, "{}", line(r));
  }
  let _ = writeln!(out, "{sep}");
  out
}
