//! The `profile` subcommand: Finnhub company profile lookup.

use anyhow::{bail, Result};
use clap::Args;
use tickermap_lib::finnhub_api::{Client, ProfileLookup};

use crate::output::{print_json, print_profile_table, OutputFormat};

#[derive(Args)]
pub struct ProfileArgs {
    /// Ticker symbol
    #[arg(long, conflicts_with_all = ["isin", "cusip"])]
    pub symbol: Option<String>,

    /// ISIN
    #[arg(long, conflicts_with = "cusip")]
    pub isin: Option<String>,

    /// CUSIP
    #[arg(long)]
    pub cusip: Option<String>,

    /// Finnhub API key (defaults to FINNHUB_API_KEY)
    #[arg(long)]
    pub api_key: Option<String>,
}

fn lookup(args: &ProfileArgs) -> Result<ProfileLookup> {
    Ok(match (&args.symbol, &args.isin, &args.cusip) {
        (Some(s), _, _) => ProfileLookup::Symbol(s.trim().to_uppercase()),
        (_, Some(i), _) => ProfileLookup::Isin(i.trim().to_string()),
        (_, _, Some(c)) => ProfileLookup::Cusip(c.trim().to_string()),
        _ => bail!("One of --symbol, --isin or --cusip is required"),
    })
}

pub async fn run(args: &ProfileArgs, format: &OutputFormat) -> Result<()> {
    let lookup = lookup(args)?;
    let client = Client::new(super::finnhub_api_key(args.api_key.as_deref())?)?;
    let profile = client.get_profile(&lookup).await?;

    if profile.is_empty() {
        bail!("No profile found for {:?}", lookup);
    }
    match format {
        OutputFormat::Table => print_profile_table(&profile),
        OutputFormat::Json => print_json(&profile),
    }
    Ok(())
}
