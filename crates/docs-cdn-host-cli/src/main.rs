//! docs-cdn-host command-line entry point.
//!
//! Races CDN mirrors of Swagger UI and ReDoc, downloads the assets for
//! offline serving and maintains the cache file that applications read at
//! startup.

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::panic))]

mod commands;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use docs_cdn_host::RaceConfig;
use docs_cdn_host::config::{
    DEFAULT_PRODUCT_NAME, DEFAULT_SWAGGER_UI_FULL_VERSION, DEFAULT_SWAGGER_UI_VERSION,
};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Parser)]
#[command(
    name = "docs-cdn-host",
    about = "Find where Swagger UI and ReDoc assets load fastest",
    version
)]
struct Cli {
    #[command(flatten)]
    race: RaceArgs,

    #[command(subcommand)]
    command: Commands,
}

/// Options shared by every subcommand
#[derive(Debug, Clone, Args)]
struct RaceArgs {
    /// Name of the cache subdirectory
    #[arg(
        long,
        global = true,
        env = "DOCS_CDN_HOST_PRODUCT_NAME",
        default_value = DEFAULT_PRODUCT_NAME
    )]
    product_name: String,

    /// Explicit cache file instead of the platform cache directory
    #[arg(long, global = true, env = "DOCS_CDN_HOST_CACHE_FILE")]
    cache_file: Option<PathBuf>,

    /// Swagger UI major version for npm-style mirrors
    #[arg(
        long,
        global = true,
        env = "DOCS_CDN_HOST_SWAGGER_UI_VERSION",
        default_value = DEFAULT_SWAGGER_UI_VERSION
    )]
    swagger_ui_version: String,

    /// Full Swagger UI version for numbered-path mirrors
    #[arg(
        long,
        global = true,
        env = "DOCS_CDN_HOST_SWAGGER_UI_FULL_VERSION",
        default_value = DEFAULT_SWAGGER_UI_FULL_VERSION
    )]
    swagger_ui_full_version: String,

    /// Deadline of the race in milliseconds
    #[arg(long, global = true, env = "DOCS_CDN_HOST_TIMEOUT_MS", default_value_t = 5000)]
    timeout_ms: u64,
}

impl RaceArgs {
    fn config(&self) -> RaceConfig {
        let defaults = RaceConfig::default();
        let mut config = RaceConfig::new()
            .with_product_name(&self.product_name)
            .with_swagger_ui_versions(&self.swagger_ui_version, &self.swagger_ui_full_version)
            .with_fastest_timing(
                defaults.fastest_interval,
                Duration::from_millis(self.timeout_ms),
            );
        if let Some(path) = &self.cache_file {
            config = config.with_cache_file(path);
        }
        config
    }
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Race CDN mirrors and print the asset URLs of the fastest
    Race {
        /// URL of any Swagger UI asset on a mirror to race instead of the built-in CDNs
        urls: Vec<String>,

        /// Race the built-in CDNs after the given mirrors
        #[arg(long)]
        extend: bool,

        /// ReDoc directory on the given mirrors, the official bundle when absent
        #[arg(long)]
        redoc: Option<String>,

        /// Write the winner to the cache file
        #[arg(long)]
        save: bool,
    },

    /// Download Swagger UI and ReDoc into a static directory
    Download {
        /// Target directory
        #[arg(long, default_value = "static")]
        dir: PathBuf,

        /// URL of any Swagger UI asset on a mirror to download from
        #[arg(long = "from")]
        urls: Vec<String>,

        /// ReDoc directory on the given mirrors, the official bundle when absent
        #[arg(long)]
        redoc: Option<String>,
    },

    /// Inspect or delete the cache file
    #[command(subcommand)]
    Cache(CacheCommands),
}

#[derive(Debug, Clone, Copy, Subcommand)]
enum CacheCommands {
    /// Print the cache location and the cached URLs
    Show,
    /// Delete the cache file
    Clear,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = cli.race.config();
    config.validate()?;

    match cli.command {
        Commands::Race {
            urls,
            extend,
            redoc,
            save,
        } => {
            let catalog = commands::catalog(&urls, redoc.as_deref(), extend)?;
            commands::race::handle(&catalog, &config, save).await
        }
        Commands::Download { dir, urls, redoc } => {
            let catalog = commands::catalog(&urls, redoc.as_deref(), true)?;
            commands::download::handle(&dir, &catalog, &config).await
        }
        Commands::Cache(cmd) => commands::cache::handle(cmd, &config),
    }
}
