//! Site Analytics CLI
//!
//! Command-line driver for the site analytics library:
//! - Run a query for a site
//! - List configured sites
//! - Print a default config file

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use site_analytics::query::Dialect;
use site_analytics::sites::ConfigCredentialResolver;
use site_analytics::{generate_default_config, AnalyticsService, Config, QueryRequestDto};
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "site-analytics")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Query web analytics for the sites you manage")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (default: search the standard locations)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a query for a site
    Query {
        /// Site id as configured under [sites]
        #[arg(short, long)]
        site: String,
        /// JSON request body file, or - for stdin
        #[arg(short, long, default_value = "-")]
        request: String,
        /// Override the configured dialect
        #[arg(short, long)]
        dialect: Option<String>,
        /// Drop fields the dialect cannot express instead of failing
        #[arg(long)]
        lenient: bool,
        /// Pretty-print the JSON result
        #[arg(long)]
        pretty: bool,
    },

    /// List configured sites
    Sites,

    /// Print or write a default config file
    Config {
        /// Write to this path instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load_with_env(path)?,
        None => Config::load_default(),
    };

    init_logging(&config.logging.level, &config.logging.format);

    match cli.command {
        Commands::Query {
            site,
            request,
            dialect,
            lenient,
            pretty,
        } => {
            if let Some(name) = dialect {
                match Dialect::parse(&name) {
                    Some(d) => config.provider.dialect = d,
                    None => bail!("Unknown dialect: {}", name),
                }
            }
            if lenient {
                config.provider.strict = false;
            }

            let dto = read_request(&request)?;
            let service = AnalyticsService::from_config(&config)?;

            tracing::info!(site = %site, dialect = %config.provider.dialect, "Running query");
            let result = service.query_dto(&site, dto).await?;

            let json = if pretty {
                serde_json::to_string_pretty(&result)?
            } else {
                serde_json::to_string(&result)?
            };
            println!("{}", json);
        }

        Commands::Sites => {
            let resolver = ConfigCredentialResolver::new(config.sites.clone());
            let ids: Vec<&str> = resolver.site_ids().collect();
            if ids.is_empty() {
                println!("No sites configured");
            }
            for id in ids {
                let site = &config.sites[id];
                let source = match (&site.key_file, &site.key_env) {
                    (Some(path), _) => format!("file {}", path.display()),
                    (None, Some(var)) => format!("env ${}", var),
                    (None, None) => "no key".to_string(),
                };
                println!("{:<20} {:<30} {}", id, site.application_name, source);
            }
        }

        Commands::Config { output } => {
            let content = generate_default_config();
            match output {
                Some(path) => write_config(&path, &content)?,
                None => print!("{}", content),
            }
        }
    }

    Ok(())
}

fn init_logging(level: &str, format: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("site_analytics={}", level).into());

    // Logs go to stderr so query output stays clean on stdout
    let registry = tracing_subscriber::registry().with(filter);
    if format.eq_ignore_ascii_case("json") {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn read_request(source: &str) -> anyhow::Result<QueryRequestDto> {
    let body = if source == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read request from stdin")?;
        buf
    } else {
        std::fs::read_to_string(source)
            .with_context(|| format!("Failed to read request file {}", source))?
    };

    serde_json::from_str(&body).context("Request body is not a valid query")
}

fn write_config(path: &Path, content: &str) -> anyhow::Result<()> {
    if path.exists() {
        bail!("Refusing to overwrite {}", path.display());
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    std::fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))?;
    eprintln!("Wrote default config to {}", path.display());
    Ok(())
}
