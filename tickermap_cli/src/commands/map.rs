//! The `map` subcommand: run the matcher over a ticker list.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Args;
use tickermap_lib::finnhub_api::Client;
use tickermap_lib::ticker_source::from_finnhub;
use tickermap_lib::{
    load_catalog, load_tickers, reconcile, AuditLog, Db, MappingStore, Matcher, MatcherConfig,
    MemoryStore, ReviewPrompt, SkipAll, TickerRecord,
};

use crate::output::{print_json, print_summary_table, OutputFormat};
use crate::prompt::TerminalPrompt;

const LAST_RUN_KEY: &str = "last_run";

#[derive(Args)]
pub struct MapArgs {
    /// SQLite database holding the mappings
    #[arg(long)]
    pub db: PathBuf,

    /// Company catalog (CSV with id,name[,slug] or JSON)
    #[arg(long)]
    pub catalog: PathBuf,

    /// JSON field holding the company name in a keyed catalog object
    #[arg(long, default_value = "name")]
    pub name_field: String,

    /// Read tickers from a JSON or CSV file instead of Finnhub
    #[arg(long, conflicts_with = "exchange")]
    pub tickers_file: Option<PathBuf>,

    /// Finnhub exchange code to fetch symbols for
    #[arg(long, default_value = "US")]
    pub exchange: String,

    /// Finnhub API key (defaults to FINNHUB_API_KEY)
    #[arg(long)]
    pub api_key: Option<String>,

    /// Matcher config (TOML)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Audit log; appended to across runs
    #[arg(long, default_value = "match_log.csv")]
    pub audit_log: PathBuf,

    /// Re-evaluate tickers that already have a mapping (existing entries are kept)
    #[arg(long)]
    pub no_resume: bool,

    /// Delete all stored mappings before matching
    #[arg(long, conflicts_with = "dry_run")]
    pub fresh: bool,

    /// Match against a copy of the stored mappings; nothing is written to the database
    #[arg(long)]
    pub dry_run: bool,

    /// Skip everything that needs review instead of prompting
    #[arg(long)]
    pub non_interactive: bool,

    /// Stop after this many tickers
    #[arg(long)]
    pub limit: Option<usize>,
}

pub async fn run(args: &MapArgs, format: &OutputFormat) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => MatcherConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => MatcherConfig::load_default()?,
    };
    if args.no_resume {
        config.resume = false;
    }

    let catalog = load_catalog(&args.catalog, &args.name_field)
        .with_context(|| format!("loading catalog {}", args.catalog.display()))?;
    eprintln!("Loaded {} catalog entries", catalog.len());
    let matcher = Matcher::new(config, catalog)?;

    let mut tickers = fetch_tickers(args).await?;
    if let Some(limit) = args.limit {
        tickers.truncate(limit);
    }
    if tickers.is_empty() {
        bail!("No tickers to match");
    }
    eprintln!("Matching {} tickers", tickers.len());

    let mut db = Db::open(&args.db)?;
    db.init()?;
    if let Some(last_run) = db.get_meta(LAST_RUN_KEY)? {
        eprintln!("Previous run finished at {}", last_run);
    }
    if args.fresh {
        let cleared = db.clear_mappings()?;
        eprintln!("Cleared {} existing mappings", cleared);
    }

    let mut audit = AuditLog::open_append(&args.audit_log)
        .with_context(|| format!("opening audit log {}", args.audit_log.display()))?;

    let stdin = std::io::stdin();
    let mut prompt: Box<dyn ReviewPrompt> = if args.non_interactive {
        Box::new(SkipAll)
    } else {
        Box::new(TerminalPrompt::new(stdin.lock(), std::io::stderr()))
    };

    let summary = if args.dry_run {
        let mut snapshot = MemoryStore::from_entries(db.all()?);
        let summary = reconcile::run(&matcher, &tickers, &mut snapshot, prompt.as_mut(), &mut audit)?;
        eprintln!(
            "Dry run: {} mappings would be stored ({} now)",
            snapshot.len(),
            db.count_mappings()?
        );
        summary
    } else {
        let summary = reconcile::run(&matcher, &tickers, &mut db, prompt.as_mut(), &mut audit)?;
        db.set_meta(LAST_RUN_KEY, &chrono::Utc::now().to_rfc3339())?;
        eprintln!("{} mappings stored in {}", db.count_mappings()?, args.db.display());
        summary
    };

    if summary.interrupted {
        eprintln!("Interrupted by user; progress has been saved.");
    }
    match format {
        OutputFormat::Table => print_summary_table(&summary),
        OutputFormat::Json => print_json(&summary),
    }
    Ok(())
}

async fn fetch_tickers(args: &MapArgs) -> Result<Vec<TickerRecord>> {
    if let Some(path) = &args.tickers_file {
        let tickers = load_tickers(path)
            .with_context(|| format!("loading tickers {}", path.display()))?;
        return Ok(tickers);
    }

    let api_key = super::finnhub_api_key(args.api_key.as_deref())?;
    let client = Client::new(api_key)?;
    eprintln!("Fetching {} symbols from Finnhub...", args.exchange);
    let symbols = client.get_symbols(&args.exchange).await?;
    Ok(from_finnhub(symbols))
}
