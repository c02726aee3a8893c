mod batch;
mod codes;
mod countries;
mod output;
mod product;
mod retry;
mod scrape;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "avsc")]
#[command(about = "Scrape product and country data from the Avantor storefront")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Scrape a single product by catalog code
    Product {
        /// Catalog code to search for (e.g., 76181-190)
        code: String,
        #[command(flatten)]
        locale: LocaleArgs,
    },
    /// Harvest every country and its storefront URL from the country popup
    Countries {
        /// Also write the flat `{region, country, url}` list
        #[arg(long)]
        flat: bool,
    },
    /// Scrape every product code listed in a file
    Batch {
        /// CSV or plain list of product codes
        #[arg(long)]
        codes: PathBuf,
        #[command(flatten)]
        locale: LocaleArgs,
    },
}

/// How the storefront country is chosen before searching.
#[derive(Debug, Clone, Default, Args)]
pub(crate) struct LocaleArgs {
    /// Country to pick from the popup (defaults to USA)
    #[arg(long, conflicts_with = "first_country")]
    pub(crate) country: Option<String>,
    /// Pick whichever country the popup lists first
    #[arg(long)]
    pub(crate) first_country: bool,
    /// Go straight to the `--country` URL recorded in a harvested countries file
    #[arg(long, requires = "country", conflicts_with = "first_country")]
    pub(crate) countries_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let config = avsc_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    tracing::debug!(env = %config.env, base_url = %config.base_url, "configuration loaded");

    match cli.command {
        Commands::Product { code, locale } => product::run_product(&config, &code, &locale).await,
        Commands::Countries { flat } => countries::run_countries(&config, flat).await,
        Commands::Batch { codes, locale } => batch::run_batch(&config, &codes, &locale).await,
    }
}
