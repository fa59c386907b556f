use anyhow::{bail, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod config;
mod error;
mod mock;
mod models;
mod portal;
mod report;
mod session;
mod tariff;
mod token;
mod usage;

use config::Config;
use mock::MockPortal;
use models::DateRange;
use portal::firstenergy::FirstEnergyPortal;
use portal::UsagePortal;
use report::Report;
use token::TokenStore;

#[derive(Parser)]
#[command(name = "energy-bill")]
#[command(about = "Estimate an electricity bill from 1st Energy usage data")]
struct Cli {
    /// Config file to use instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch usage day by day and print a bill estimate
    Report {
        /// First day of the range (YYYY-MM-DD)
        #[arg(long, default_value = "2023-01-01")]
        start: NaiveDate,
        /// Last day of the range, inclusive (YYYY-MM-DD)
        #[arg(long, default_value = "2023-10-13")]
        end: NaiveDate,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
        /// Use synthetic data instead of the portal
        #[arg(long)]
        mock: bool,
    },
    /// Exchange stored credentials for a fresh token
    Login,
    /// Print the effective configuration
    Config,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    match cli.command {
        Commands::Report {
            start,
            end,
            json,
            mock,
        } => {
            if start > end {
                bail!("Start date {} is after end date {}", start, end);
            }
            let range = DateRange::new(start, end);
            let rates = config.tariff;

            let (portal, token): (Box<dyn UsagePortal>, String) = if mock {
                let portal = MockPortal::new(rates.flat_rate_until);
                let token = portal.validate_user(&serde_json::Value::Null).await?;
                (Box::new(portal), token)
            } else {
                let portal = FirstEnergyPortal::new(&config.portal);
                let store = TokenStore::from_config(&config.files);
                let token = session::authenticate(&portal, &store).await?;
                (Box::new(portal), token)
            };

            let fetched =
                session::fetch_usage(portal.as_ref(), &token, range, rates.flat_rate_until).await?;
            let report = Report::new(&fetched.calculate(&rates));

            if json {
                println!("{}", report.render_json()?);
            } else {
                print!("{}", report.render_text());
            }
        }
        Commands::Login => {
            let portal = FirstEnergyPortal::new(&config.portal);
            let store = TokenStore::from_config(&config.files);
            session::login(&portal, &store).await?;
            println!("Token stored in {}", config.files.token_path().display());
        }
        Commands::Config => {
            print!("{}", config.to_toml()?);
        }
    }

    Ok(())
}
