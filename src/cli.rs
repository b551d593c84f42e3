//! Command-line interface definitions for Top Stories.
//!
//! This module defines the CLI arguments and options using the `clap` crate.
//! Every option that also exists in the YAML config file overrides it; the
//! most common ones can be given through environment variables as well.

use clap::Parser;
use std::path::PathBuf;

/// Command-line arguments for the Top Stories service.
///
/// # Examples
///
/// ```sh
/// # Refresh every 20 seconds, writing JSON and Markdown, serving on :8000
/// top_stories -j ./json -m ./markdown
///
/// # Serve on port 3000 and keep the last 100 JSON archive copies
/// top_stories -p 3000 -j ./json --json-archive-keep 100
///
/// # One refresh of the top 10 stories, then exit
/// top_stories -n 10 --once -m ./markdown
///
/// # Settings from a file, interval overridden
/// top_stories -c ./top_stories.yaml -i 60
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Optional path to a YAML config file
    #[arg(short, long, env = "TOP_STORIES_CONFIG")]
    pub config: Option<PathBuf>,

    /// Base URL of the stories API
    #[arg(long, env = "TOP_STORIES_API_URL")]
    pub api_url: Option<String>,

    /// Number of top stories to fetch per refresh
    #[arg(short = 'n', long, env = "TOP_STORIES_BATCH_SIZE")]
    pub batch_size: Option<usize>,

    /// Seconds between refresh cycles
    #[arg(short, long, env = "TOP_STORIES_INTERVAL_SECS")]
    pub interval_secs: Option<u64>,

    /// Seconds a single item fetch may take before it is dropped
    #[arg(long)]
    pub item_timeout_secs: Option<u64>,

    /// Port to serve the current snapshot on (0 disables the server)
    #[arg(short, long, env = "TOP_STORIES_PORT")]
    pub port: Option<u16>,

    /// Output directory for the JSON snapshot
    #[arg(short, long)]
    pub json_output_dir: Option<PathBuf>,

    /// Number of dated JSON archive copies to keep (0 disables archiving)
    #[arg(long)]
    pub json_archive_keep: Option<usize>,

    /// Output directory for the Markdown page
    #[arg(short, long)]
    pub markdown_output_dir: Option<PathBuf>,

    /// Run a single refresh cycle and exit
    #[arg(long)]
    pub once: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["top_stories"]);
        assert!(cli.config.is_none());
        assert!(cli.batch_size.is_none());
        assert!(cli.port.is_none());
        assert!(cli.json_archive_keep.is_none());
        assert!(!cli.once);
    }

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::parse_from([
            "top_stories",
            "--json-output-dir",
            "./json",
            "--markdown-output-dir",
            "./markdown",
            "--batch-size",
            "10",
            "--interval-secs",
            "60",
            "--item-timeout-secs",
            "3",
            "--api-url",
            "http://localhost:9000/v0",
            "--once",
        ]);

        assert_eq!(cli.json_output_dir, Some(PathBuf::from("./json")));
        assert_eq!(cli.markdown_output_dir, Some(PathBuf::from("./markdown")));
        assert_eq!(cli.batch_size, Some(10));
        assert_eq!(cli.interval_secs, Some(60));
        assert_eq!(cli.item_timeout_secs, Some(3));
        assert_eq!(cli.api_url.as_deref(), Some("http://localhost:9000/v0"));
        assert!(cli.once);
    }

    #[test]
    fn test_cli_short_flags() {
        let cli = Cli::parse_from([
            "top_stories",
            "-j",
            "/tmp/json",
            "-m",
            "/tmp/markdown",
            "-n",
            "5",
            "-i",
            "15",
            "-c",
            "/etc/top_stories.yaml",
            "-p",
            "3000",
        ]);

        assert_eq!(cli.json_output_dir, Some(PathBuf::from("/tmp/json")));
        assert_eq!(cli.markdown_output_dir, Some(PathBuf::from("/tmp/markdown")));
        assert_eq!(cli.batch_size, Some(5));
        assert_eq!(cli.interval_secs, Some(15));
        assert_eq!(cli.config, Some(PathBuf::from("/etc/top_stories.yaml")));
        assert_eq!(cli.port, Some(3000));
    }

    #[test]
    fn test_cli_rejects_out_of_range_port() {
        assert!(Cli::try_parse_from(["top_stories", "-p", "70000"]).is_err());
    }

    #[test]
    fn test_cli_rejects_non_numeric_batch_size() {
        assert!(Cli::try_parse_from(["top_stories", "-n", "lots"]).is_err());
    }
}
