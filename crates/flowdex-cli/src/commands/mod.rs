use clap::{Parser, Subcommand};
use std::path::PathBuf;

use flowdex_config::ConfigLoader;

mod catalog;
mod serve;

/// 📚 Flowdex: browse, search and download exported workflow catalogs
#[derive(Parser)]
#[command(name = "flowdex", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to flowdex.toml config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log level override (e.g. debug, info, warn, error)
    #[arg(short, long, global = true)]
    log_level: Option<String>,

    /// Enable verbose output (debug logging)
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Suppress all log output (errors only)
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API server
    Serve {
        /// Listen address, overrides `server.listen`
        #[arg(long)]
        listen: Option<String>,
        /// Scan every catalog before accepting requests
        #[arg(long)]
        warm: bool,
    },
    /// Scan catalogs and report items, categories and skipped files
    Scan {
        /// Only scan this catalog
        catalog: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List workflows in a catalog
    List {
        /// Catalog name (e.g. coze, dify)
        catalog: String,
        /// Case-insensitive text filter over name, description and tags
        #[arg(short = 's', long)]
        query: Option<String>,
        /// Exact category filter
        #[arg(long)]
        category: Option<String>,
        /// Page number, starting at 1
        #[arg(long, default_value = "1")]
        page: String,
        /// Items per page (1-100)
        #[arg(long, default_value = "20")]
        per_page: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show current configuration
    Config {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

impl Cli {
    pub async fn run(self) -> flowdex_core::Result<()> {
        // Load config first so we can use it for log format
        let config_loader = ConfigLoader::load(self.config.as_deref())?;
        let config = config_loader.get();

        // Resolve log level: --verbose > --quiet > --log-level > config
        let log_level = if self.verbose {
            "debug"
        } else if self.quiet {
            "error"
        } else {
            self.log_level.as_deref().unwrap_or(&config.logging.level)
        };

        if config.logging.format == "json" {
            tracing_subscriber::fmt()
                .with_env_filter(
                    tracing_subscriber::EnvFilter::try_from_default_env()
                        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
                )
                .json()
                .with_target(true)
                .init();
        } else {
            tracing_subscriber::fmt()
                .with_env_filter(
                    tracing_subscriber::EnvFilter::try_from_default_env()
                        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
                )
                .with_target(false)
                .init();
        }

        tracing::debug!(path = %config_loader.path().display(), "configuration loaded");

        match self.command {
            Commands::Serve { listen, warm } => serve::cmd_serve(config, listen, warm).await,
            Commands::Scan { catalog, json } => catalog::cmd_scan(&config, catalog.as_deref(), json),
            Commands::List {
                catalog,
                query,
                category,
                page,
                per_page,
                json,
            } => {
                let params = flowdex_catalog::ListParams {
                    q: query,
                    category,
                    page: Some(page),
                    per_page: Some(per_page),
                };
                catalog::cmd_list(&config, &catalog, &params, json)
            }
            Commands::Config { json } => Self::cmd_config(config, json),
        }
    }

    fn cmd_config(config: flowdex_config::FlowdexConfig, json: bool) -> flowdex_core::Result<()> {
        if json {
            println!("{}", serde_json::to_string_pretty(&config)?);
        } else {
            println!(
                "{}",
                toml::to_string_pretty(&config)
                    .map_err(|e| flowdex_core::FlowdexError::Config(e.to_string()))?
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_list_with_filters() {
        let cli = Cli::try_parse_from([
            "flowdex", "list", "coze", "-s", "search", "--category", "工具", "--per-page", "5",
        ])
        .unwrap();
        match cli.command {
            Commands::List {
                catalog,
                query,
                category,
                page,
                per_page,
                json,
            } => {
                assert_eq!(catalog, "coze");
                assert_eq!(query.as_deref(), Some("search"));
                assert_eq!(category.as_deref(), Some("工具"));
                assert_eq!(page, "1");
                assert_eq!(per_page, "5");
                assert!(!json);
            }
            _ => panic!("expected list"),
        }
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["flowdex", "scan", "dify", "--json", "--verbose"]).unwrap();
        assert!(cli.verbose);
        assert!(matches!(
            cli.command,
            Commands::Scan { catalog: Some(ref c), json: true } if c == "dify"
        ));
    }

    #[test]
    fn verbose_conflicts_with_quiet() {
        assert!(Cli::try_parse_from(["flowdex", "-v", "-q", "config"]).is_err());
    }

    #[test]
    fn serve_defaults() {
        let cli = Cli::try_parse_from(["flowdex", "--config", "/tmp/f.toml", "serve"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/f.toml")));
        assert!(matches!(cli.command, Commands::Serve { listen: None, warm: false }));
    }
}
