mod browser;
mod cli;
mod console;
mod render;

use anyhow::Context;
use centtr_core::breach::BreachChecker;
use centtr_core::http::BlockingHttp;
use centtr_core::links::LinkCatalog;
use centtr_core::metadata::MetadataResolver;
use centtr_core::report::Aggregator;
use centtr_core::search::{GoogleSearch, WebSearchCollector};
use centtr_core::{config, logging, paths};
use std::path::Path;
use std::process::ExitCode;
use std::time::Duration;

fn main() -> ExitCode {
  let args: Vec<String> = std::env::args().skip(1).collect();

  let opts = match cli::parse_args(&args) {
    Ok(cli::Command::Version) => {
      println!("{}", env!("CARGO_PKG_VERSION"));
      return ExitCode::SUCCESS;
    }
    Ok(cli::Command::Help) => {
      cli::print_help();
      return ExitCode::SUCCESS;
    }
    Ok(cli::Command::Run(opts)) => opts,
    Err(e) => {
      eprintln!("CentTR: {e:#}");
      eprintln!("Run `centtr --help` for usage.");
      return ExitCode::from(2);
    }
  };

  if let Err(e) = ctrlc::set_handler(|| {
    println!("\nOperation cancelled by user");
    std::process::exit(130);
  }) {
    eprintln!("CentTR: cannot install Ctrl+C handler: {e}");
  }

  let result = run(&opts);
  if let Err(e) = &result {
    tracing::error!(error = ?e, "run failed");
    println!("An error occurred: {e:#}");
  }
  if !opts.batch {
    println!("\nThank you for using CentTR Tool!");
  }

  match result {
    Ok(()) => ExitCode::SUCCESS,
    Err(_) => ExitCode::FAILURE,
  }
}

fn run(opts: &cli::Options) -> anyhow::Result<()> {
  let base = paths::base_dir()?;
  let cfg = config::load_or_create_default(&paths::config_path(&base)).context("load config")?;

  let logs = paths::logs_dir(&base);
  let output = if opts.verbose {
    logging::Output::FileAndStderr
  } else {
    logging::Output::File
  };
  logging::init(&logs, &cfg.logging, output)?;
  tracing::info!(
    version = env!("CARGO_PKG_VERSION"),
    batch = opts.batch,
    base = %base.display(),
    "CentTR starting"
  );

  let resolver = MetadataResolver::bundled().context("load numbering dataset")?;
  tracing::debug!(dataset = resolver.dataset_version(), "numbering dataset loaded");

  let catalog = match cfg.links.catalog_path.as_deref() {
    Some(p) => LinkCatalog::load(Path::new(p))?,
    None => LinkCatalog::bundled().context("load platform catalog")?,
  };

  let http = BlockingHttp::new()?;
  let google = GoogleSearch::new(&http, &cfg.search);
  let search = cfg
    .search
    .enabled
    .then(|| WebSearchCollector::new(&google, Duration::from_secs(cfg.search.pause_seconds)));

  let aggregator = Aggregator::new(
    &resolver,
    &catalog,
    BreachChecker::new(&http, &cfg.breach),
    search,
  )
  .with_region_hint(cfg.default_region.as_deref());

  let session = console::Session {
    cfg: &cfg,
    opts,
    aggregator: &aggregator,
  };
  if opts.batch {
    session.run_batch()
  } else {
    session.run_interactive()
  }
}
