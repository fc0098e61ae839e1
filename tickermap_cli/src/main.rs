mod commands;
mod output;
mod prompt;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::output::OutputFormat;

#[derive(Parser)]
#[command(name = "tickermap")]
#[command(about = "Map exchange ticker symbols to internal company IDs")]
struct Cli {
    /// Output format: table or json
    #[arg(long, default_value = "table", global = true)]
    output: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Match tickers against the company catalog
    Map(Box<commands::map::MapArgs>),
    /// List stored mappings
    Mappings(commands::mappings::MappingsArgs),
    /// Export stored mappings to JSON or CSV
    Export(commands::export::ExportArgs),
    /// Import a flat JSON mapping file from a previous run
    Import(commands::import::ImportArgs),
    /// Check mappings against a master list
    Validate(commands::validate::ValidateArgs),
    /// Look up a company profile on Finnhub
    Profile(commands::profile::ProfileArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("tickermap=info".parse()?)
                .add_directive("tickermap_lib=info".parse()?),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let format = match cli.output.as_str() {
        "json" => OutputFormat::Json,
        _ => OutputFormat::Table,
    };

    match &cli.command {
        Commands::Map(args) => commands::map::run(args.as_ref(), &format).await?,
        Commands::Mappings(args) => commands::mappings::run(args, &format)?,
        Commands::Export(args) => commands::export::run(args)?,
        Commands::Import(args) => commands::import::run(args)?,
        Commands::Validate(args) => commands::validate::run(args, &format)?,
        Commands::Profile(args) => commands::profile::run(args, &format).await?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_map_args() {
        let cli = Cli::try_parse_from([
            "tickermap",
            "--output",
            "json",
            "map",
            "--db",
            "mappings.db",
            "--catalog",
            "companies.csv",
            "--tickers-file",
            "symbols.json",
            "--dry-run",
            "--non-interactive",
        ])
        .unwrap();
        assert_eq!(cli.output, "json");
        match cli.command {
            Commands::Map(args) => {
                assert!(args.dry_run && args.non_interactive);
                assert!(!args.no_resume);
                assert_eq!(args.exchange, "US");
                assert_eq!(args.audit_log.to_str(), Some("match_log.csv"));
            }
            _ => panic!("expected map"),
        }
    }

    #[test]
    fn test_fresh_conflicts_with_dry_run() {
        let result = Cli::try_parse_from([
            "tickermap", "map", "--db", "m.db", "--catalog", "c.csv", "--fresh", "--dry-run",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_requires_a_mapping_source() {
        assert!(Cli::try_parse_from(["tickermap", "validate", "--master", "m.csv"]).is_err());
        assert!(Cli::try_parse_from([
            "tickermap", "validate", "--master", "m.csv", "--mappings", "map.json"
        ])
        .is_ok());
    }
}
