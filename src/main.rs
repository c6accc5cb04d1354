use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::{Local, NaiveDate};
use clap::{ArgGroup, Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod config;
mod dates;
mod db;
mod error;
mod models;
mod recency;
mod report;
mod source;
mod workbook;

use config::AnalyzerConfig;

#[derive(Parser)]
#[command(name = "site-visit-recency")]
#[command(about = "Flags monitoring sites that are overdue for a visit", long_about = None)]
struct Cli {
    /// Log pipeline progress to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze visit recency and write the report workbook
    #[command(group(
        ArgGroup::new("source")
            .args(["csv", "database"])
            .required(true)
            .multiple(false)
    ))]
    Analyze {
        /// CSV file with Site and Date columns
        #[arg(long)]
        csv: Option<PathBuf>,
        /// Read visits from the Postgres instance at DATABASE_URL
        #[arg(long)]
        database: bool,
        /// JSON file with a "target_sites" list
        #[arg(long, conflicts_with = "site")]
        sites: Option<PathBuf>,
        /// Target site code; repeat to build the list on the command line
        #[arg(long)]
        site: Vec<String>,
        /// Reference date (YYYY-MM-DD); defaults to today
        #[arg(long)]
        as_of: Option<NaiveDate>,
        #[arg(long, default_value = "Most_Recent_Site_Visits.xlsx")]
        out: PathBuf,
        /// Also write the statuses and summary as JSON
        #[arg(long)]
        json: Option<PathBuf>,
    },
    /// Print the configured target sites
    Sites {
        #[arg(long)]
        sites: Option<PathBuf>,
    },
    /// Create or upgrade the database schema
    InitDb,
    /// Import visits from a CSV file into Postgres
    Import {
        #[arg(long)]
        csv: PathBuf,
    },
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "info" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn load_config(sites_file: Option<&Path>, sites: &[String]) -> anyhow::Result<AnalyzerConfig> {
    let config = match sites_file {
        Some(path) => AnalyzerConfig::from_json_file(path)?,
        None if !sites.is_empty() => AnalyzerConfig::with_sites(sites)?,
        None => AnalyzerConfig::default(),
    };
    Ok(config)
}

async fn connect_from_env() -> anyhow::Result<sqlx::PgPool> {
    let database_url =
        std::env::var("DATABASE_URL").context("DATABASE_URL must be set to a Postgres instance")?;
    let pool = db::connect(&database_url)
        .await
        .context("failed to connect to Postgres")?;
    Ok(pool)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Analyze {
            csv,
            database,
            sites,
            site,
            as_of,
            out,
            json,
        } => {
            let config = load_config(sites.as_deref(), &site)?;
            let records = match csv {
                Some(path) => source::read_csv_path(&path)?,
                None if database => {
                    let pool = connect_from_env().await?;
                    db::fetch_visits(&pool).await?
                }
                None => anyhow::bail!("either --csv or --database is required"),
            };

            let today = as_of.unwrap_or_else(|| Local::now().date_naive());
            let analysis = recency::analyze(&records, &config, today)?;

            workbook::write(&analysis, &out)
                .with_context(|| format!("failed to write {}", out.display()))?;
            if let Some(json_path) = json {
                let body = serde_json::to_string_pretty(&analysis)?;
                std::fs::write(&json_path, body)
                    .with_context(|| format!("failed to write {}", json_path.display()))?;
            }

            print!("{}", report::console_summary(&analysis));
            println!();
            println!("Analysis complete! Results saved to: {}", out.display());
            println!("{}", "=".repeat(60));
        }
        Commands::Sites { sites } => {
            let config = load_config(sites.as_deref(), &[])?;
            for site in config.target_sites() {
                println!("{site}");
            }
        }
        Commands::InitDb => {
            let pool = connect_from_env().await?;
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Import { csv } => {
            let pool = connect_from_env().await?;
            let inserted = db::import_csv(&pool, &csv).await?;
            println!("Inserted {inserted} visits from {}.", csv.display());
        }
    }

    Ok(())
}
