//! The `validate` subcommand: compare mappings against a master list.

use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Args;
use tickermap_lib::{mapping_file, Db, MappingStore, MasterList};

use crate::output::{print_json, print_report_table, OutputFormat};

#[derive(Args)]
pub struct ValidateArgs {
    /// Master list CSV (ticker, expected_company_id)
    #[arg(long)]
    pub master: PathBuf,

    /// Validate the mappings stored in this database
    #[arg(long, required_unless_present = "mappings", conflicts_with = "mappings")]
    pub db: Option<PathBuf>,

    /// Validate a flat JSON mapping file instead
    #[arg(long)]
    pub mappings: Option<PathBuf>,
}

pub fn run(args: &ValidateArgs, format: &OutputFormat) -> Result<()> {
    let master = MasterList::from_file(&args.master)?;

    let entries = match (&args.db, &args.mappings) {
        (Some(path), _) => {
            let db = Db::open(path)?;
            db.init()?;
            db.all()?
        }
        (None, Some(path)) => mapping_file::load_json(path)?,
        (None, None) => bail!("Either --db or --mappings is required"),
    };

    let report = master.evaluate_entries(&entries);
    match format {
        OutputFormat::Table => print_report_table(&report),
        OutputFormat::Json => print_json(&report),
    }

    if !report.passed() {
        bail!("{} mappings disagree with the master list", report.wrong.len());
    }
    Ok(())
}
