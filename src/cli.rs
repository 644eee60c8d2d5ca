//! Command-line interface definitions.
//!
//! Every option can also come from an environment variable.

use crate::utils::parse_date;
use chrono::NaiveDate;
use clap::Parser;
use std::path::PathBuf;

/// Command-line arguments for a digest run.
///
/// # Examples
///
/// ```sh
/// # Today's page, outputs under the current directory
/// current_affairs_digest
///
/// # A past day, HTML only, with a manifest
/// current_affairs_digest --date 07-03-2025 --no-pdf -j ./json
///
/// # An explicit page and a custom site profile
/// current_affairs_digest --url https://example.com/daily/07-03-2025 --profile site.yaml
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Directory that receives `Output Images`, `Output Html` and `Output Pdf`
    #[arg(short, long, env = "DIGEST_OUTPUT_ROOT", default_value = ".")]
    pub output_root: PathBuf,

    /// Fetch this page instead of the one derived from the date
    #[arg(short, long, env = "DIGEST_URL")]
    pub url: Option<String>,

    /// Day to fetch, as DD-MM-YYYY (defaults to today)
    #[arg(short, long, env = "DIGEST_DATE", value_parser = parse_date)]
    pub date: Option<NaiveDate>,

    /// Optional path to a site profile YAML file
    #[arg(short, long, env = "DIGEST_PROFILE")]
    pub profile: Option<PathBuf>,

    /// Stylesheet copied next to the HTML (built-in one when omitted)
    #[arg(short, long, env = "DIGEST_STYLESHEET")]
    pub stylesheet: Option<PathBuf>,

    /// Path or name of the wkhtmltopdf binary
    #[arg(long, env = "WKHTMLTOPDF", default_value = "wkhtmltopdf")]
    pub wkhtmltopdf: PathBuf,

    /// Skip PDF rendering
    #[arg(long)]
    pub no_pdf: bool,

    /// Output directory for the JSON manifest (no manifest when omitted)
    #[arg(short, long, env = "DIGEST_JSON_OUTPUT_DIR")]
    pub json_output_dir: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["current_affairs_digest"]);

        assert_eq!(cli.output_root, PathBuf::from("."));
        assert_eq!(cli.wkhtmltopdf, PathBuf::from("wkhtmltopdf"));
        assert!(!cli.no_pdf);
        assert!(cli.date.is_none());
        assert!(cli.json_output_dir.is_none());
    }

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::parse_from([
            "current_affairs_digest",
            "--output-root",
            "/srv/digest",
            "--date",
            "07-03-2025",
            "--profile",
            "site.yaml",
            "--no-pdf",
            "--json-output-dir",
            "./json",
        ]);

        assert_eq!(cli.output_root, PathBuf::from("/srv/digest"));
        assert_eq!(cli.date, NaiveDate::from_ymd_opt(2025, 3, 7));
        assert_eq!(cli.profile, Some(PathBuf::from("site.yaml")));
        assert!(cli.no_pdf);
        assert_eq!(cli.json_output_dir, Some(PathBuf::from("./json")));
    }

    #[test]
    fn test_cli_short_flags() {
        let cli = Cli::parse_from([
            "current_affairs_digest",
            "-o",
            "/tmp/out",
            "-u",
            "https://example.com/daily/07-03-2025",
            "-j",
            "/tmp/json",
        ]);

        assert_eq!(cli.output_root, PathBuf::from("/tmp/out"));
        assert_eq!(cli.url.as_deref(), Some("https://example.com/daily/07-03-2025"));
        assert_eq!(cli.json_output_dir, Some(PathBuf::from("/tmp/json")));
    }

    #[test]
    fn test_cli_rejects_bad_date() {
        let result = Cli::try_parse_from(["current_affairs_digest", "--date", "2025-03-07"]);
        assert!(result.is_err());
    }
}
