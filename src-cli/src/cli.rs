//! Command-line surface of the `miner` binary.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "miner")]
#[command(about = "Scrape real-estate listings into a local store and query them")]
#[command(version)]
pub struct Cli {
    /// Configuration file (defaults to the platform config directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Scrape a page range from a marketplace source
    Scrape {
        /// Registered source name (see `miner sources`)
        source: String,

        /// Listing kind, e.g. venda or aluguel
        #[arg(long)]
        kind: String,

        /// Region code, e.g. sp
        #[arg(long)]
        region: String,

        #[arg(long, default_value_t = 1)]
        start_page: u32,

        #[arg(long, default_value_t = 3)]
        max_pages: u32,

        /// Override the configured worker pool size
        #[arg(long)]
        workers: Option<usize>,

        /// Run in the foreground and print the finished job
        #[arg(long)]
        wait: bool,
    },

    /// Show a scrape job
    Job { id: String },

    /// Show the most recent scrape jobs
    Jobs {
        #[arg(long, default_value_t = 20)]
        limit: u32,
    },

    /// List stored listings
    List {
        #[arg(long, default_value_t = 0)]
        offset: u32,

        #[arg(long, default_value_t = 50)]
        limit: u32,
    },

    /// Show one stored listing
    Get { id: i64 },

    /// Overwrite a stored listing with a JSON record read from a file
    Update { id: i64, file: PathBuf },

    /// Number of stored listings
    Count,

    /// Exact-match search over stored listings
    Search {
        #[arg(long)]
        city: Option<String>,

        #[arg(long)]
        neighborhood: Option<String>,

        #[arg(long)]
        min_price: Option<f64>,

        #[arg(long)]
        max_price: Option<f64>,
    },

    /// Delete one stored listing
    Delete { id: i64 },

    /// Delete every stored listing
    Purge {
        /// Required; purging cannot be undone
        #[arg(long)]
        yes: bool,
    },

    /// Export listings as a JSON array, fuzzy-filtered by field
    Export {
        #[arg(long)]
        city: Option<String>,

        #[arg(long)]
        neighborhood: Option<String>,

        #[arg(long)]
        kind: Option<String>,
    },

    /// List registered marketplace sources
    Sources,
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
    fn test_parse_scrape() {
        let cli = Cli::parse_from([
            "miner", "scrape", "olx", "--kind", "venda", "--region", "sp", "--max-pages", "5",
            "--wait",
        ]);

        match cli.command {
            Command::Scrape {
                source,
                kind,
                region,
                start_page,
                max_pages,
                workers,
                wait,
            } => {
                assert_eq!(source, "olx");
                assert_eq!(kind, "venda");
                assert_eq!(region, "sp");
                assert_eq!(start_page, 1);
                assert_eq!(max_pages, 5);
                assert_eq!(workers, None);
                assert!(wait);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_update() {
        let cli = Cli::parse_from(["miner", "update", "7", "listing.json"]);
        match cli.command {
            Command::Update { id, file } => {
                assert_eq!(id, 7);
                assert_eq!(file, PathBuf::from("listing.json"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_global_config_flag() {
        let cli = Cli::parse_from(["miner", "count", "--config", "/tmp/miner.toml"]);
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/miner.toml")));
        assert!(matches!(cli.command, Command::Count));
    }

    #[test]
    fn test_parse_export_filters() {
        let cli = Cli::parse_from(["miner", "export", "--city", "sao paulo"]);
        match cli.command {
            Command::Export {
                city,
                neighborhood,
                kind,
            } => {
                assert_eq!(city.as_deref(), Some("sao paulo"));
                assert!(neighborhood.is_none());
                assert!(kind.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
