//! The `export` subcommand: write stored mappings to a file or stdout.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, ValueEnum};
use tickermap_lib::{mapping_file, Db, MappingStore};

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum ExportFormat {
    /// Flat `{ "TICKER": "company_id" }` object
    Json,
    /// One row per mapping with match type, score and timestamp
    Csv,
}

#[derive(Args)]
pub struct ExportArgs {
    /// SQLite database holding the mappings
    #[arg(long)]
    pub db: PathBuf,

    /// File format
    #[arg(long, value_enum, default_value = "json")]
    pub format: ExportFormat,

    /// Output path (stdout if omitted)
    #[arg(long, short = 'o')]
    pub out: Option<PathBuf>,
}

pub fn run(args: &ExportArgs) -> Result<()> {
    let db = Db::open(&args.db)?;
    db.init()?;
    let entries = db.all()?;

    let mut writer: Box<dyn Write> = match &args.out {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(io::stdout().lock()),
    };
    match args.format {
        ExportFormat::Json => {
            mapping_file::write_json(&entries, &mut writer)?;
            writeln!(writer)?;
        }
        ExportFormat::Csv => mapping_file::write_csv(&entries, &mut writer)?,
    }
    writer.flush()?;

    if let Some(path) = &args.out {
        eprintln!("Exported {} mappings to {}", entries.len(), path.display());
    }
    Ok(())
}
