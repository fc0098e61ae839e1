//! The `mappings` subcommand: list stored mappings.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use tickermap_lib::{Db, MappingStore, MatchType};

use crate::output::{print_mappings_json, print_mappings_table, OutputFormat};

#[derive(Args)]
pub struct MappingsArgs {
    /// SQLite database holding the mappings
    #[arg(long)]
    pub db: PathBuf,

    /// Only show tickers mapped to this company ID
    #[arg(long)]
    pub company_id: Option<String>,

    /// Only show this match type (exact, fuzzy, manual, imported)
    #[arg(long)]
    pub match_type: Option<String>,
}

pub fn run(args: &MappingsArgs, format: &OutputFormat) -> Result<()> {
    let db = Db::open(&args.db)?;
    db.init()?;

    let match_type: Option<MatchType> = args
        .match_type
        .as_deref()
        .map(|m| m.to_lowercase().parse())
        .transpose()?;

    let entries: Vec<_> = db
        .all()?
        .into_iter()
        .filter(|e| args.company_id.as_deref().map_or(true, |id| e.company_id == id))
        .filter(|e| match_type.map_or(true, |m| e.match_type == m))
        .collect();

    if entries.is_empty() {
        eprintln!("No mappings found. Run 'tickermap map --db {}' first.", args.db.display());
        return Ok(());
    }

    match format {
        OutputFormat::Table => print_mappings_table(&entries),
        OutputFormat::Json => print_mappings_json(&entries),
    }
    eprintln!("{} mappings", entries.len());
    Ok(())
}
