use std::path::PathBuf;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Options {
  pub number: Option<String>,
  pub api_key: Option<String>,
  pub results: Option<usize>,
  pub save: Option<PathBuf>,
  pub batch: bool,
  pub verbose: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
  Version,
  Help,
  Run(Options),
}

/// `args` excludes the program name.
pub fn parse_args(args: &[String]) -> anyhow::Result<Command> {
  let mut opts = Options::default();
  let mut iter = args.iter();

  while let Some(arg) = iter.next() {
    match arg.as_str() {
      "--version" | "-V" => return Ok(Command::Version),
      "--help" | "-h" => return Ok(Command::Help),
      "--batch" => opts.batch = true,
      "--verbose" | "-v" => opts.verbose = true,
      "--number" | "-n" => opts.number = Some(value_for(arg, iter.next())?.to_string()),
      "--api-key" => opts.api_key = Some(value_for(arg, iter.next())?.to_string()),
      "--save" => opts.save = Some(PathBuf::from(value_for(arg, iter.next())?)),
      "--results" => {
        let raw = value_for(arg, iter.next())?;
        let n: usize = raw
          .parse()
          .map_err(|_| anyhow::anyhow!("--results expects a number, got `{raw}`"))?;
        opts.results = Some(n);
      }
      other => anyhow::bail!("unknown argument `{other}`"),
    }
  }

  if opts.batch && opts.number.is_none() {
    anyhow::bail!("--batch requires --number");
  }

  Ok(Command::Run(opts))
}

fn value_for<'a>(flag: &str, next: Option<&'a String>) -> anyhow::Result<&'a str> {
  match next {
    Some(v) if !v.starts_with("--") => Ok(v.as_str()),
    _ => anyhow::bail!("{flag} expects a value"),
  }
}

pub fn print_help() {
  println!("CentTR {}", env!("CARGO_PKG_VERSION"));
  println!("Simple phone number OSINT: formats, carrier, links, breaches, web mentions.");
  println!();
  println!("Usage:");
  println!("  centtr [options]");
  println!();
  println!("Options:");
  println!("  --number, -n <number>   Number to investigate (prompted when omitted)");
  println!("  --api-key <key>         Have I Been Pwned API key (else HIBP_API_KEY, config, prompt)");
  println!("  --results <n>           Web search results to collect (default from config)");
  println!("  --save <path>           Write the JSON report to <path> without asking");
  println!("  --batch                 No prompts; requires --number");
  println!("  --verbose, -v           Mirror log output to stderr");
  println!("  --version, -V           Print the version");
  println!("  --help, -h              Show this help");
}

#[cfg(test)]
mod tests {
  use super::*;

  fn args(raw: &[&str]) -> Vec<String> {
    raw.iter().map(|s| s.to_string()).collect()
  }

  #[test]
  fn no_args_runs_interactive() {
    assert_eq!(parse_args(&[]).unwrap(), Command::Run(Options::default()));
  }

  #[test]
  fn parses_all_value_flags() {
    let cmd = parse_args(&args(&[
      "--number",
      "+6281234567890",
      "--api-key",
      "k",
      "--results",
      "3",
      "--save",
      "out.json",
      "--batch",
      "--verbose",
    ]))
    .unwrap();
    let Command::Run(o) = cmd else {
      panic!("expected run");
    };
    assert_eq!(o.number.as_deref(), Some("+6281234567890"));
    assert_eq!(o.api_key.as_deref(), Some("k"));
    assert_eq!(o.results, Some(3));
    assert_eq!(o.save, Some(PathBuf::from("out.json")));
    assert!(o.batch && o.verbose);
  }

  #[test]
  fn version_and_help_short_circuit() {
    assert_eq!(parse_args(&args(&["--verbose", "--version"])).unwrap(), Command::Version);
    assert_eq!(parse_args(&args(&["-h", "--bogus"])).unwrap(), Command::Help);
  }

  #[test]
  fn rejects_bad_input() {
    assert!(parse_args(&args(&["--results", "many"])).is_err());
    assert!(parse_args(&args(&["--number"])).is_err());
    assert!(parse_args(&args(&["--number", "--batch"])).is_err());
    assert!(parse_args(&args(&["--frobnicate"])).is_err());
  }

  #[test]
  fn batch_needs_a_number() {
    let err = parse_args(&args(&["--batch"])).unwrap_err();
    assert!(err.to_string().contains("--number"));
  }
}
