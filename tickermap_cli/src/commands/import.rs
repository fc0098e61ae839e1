//! The `import` subcommand: load a flat JSON mapping file into the database.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use tickermap_lib::{mapping_file, Db};

#[derive(Args)]
pub struct ImportArgs {
    /// SQLite database holding the mappings
    #[arg(long)]
    pub db: PathBuf,

    /// JSON file shaped like `{ "TICKER": "company_id" }`
    #[arg(long, short = 'i')]
    pub input: PathBuf,
}

pub fn run(args: &ImportArgs) -> Result<()> {
    let entries = mapping_file::load_json(&args.input)?;
    if entries.is_empty() {
        eprintln!("No mappings found in {}", args.input.display());
        return Ok(());
    }

    let mut db = Db::open(&args.db)?;
    db.init()?;
    let inserted = db.import_mappings(&entries)?;
    eprintln!(
        "Imported {} mappings ({} tickers already mapped, left unchanged)",
        inserted,
        entries.len() - inserted
    );
    Ok(())
}
