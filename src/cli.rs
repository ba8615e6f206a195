//! CLI argument definitions using clap derive macros.

use std::fmt;
use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use s3_ssec_get::config::MAX_CHUNK_SIZE;
use s3_ssec_get::store::S3Options;
use s3_ssec_get::{
    DEFAULT_CHUNK_SIZE, DEFAULT_CONCURRENCY, FailurePolicy, ListingMode, RunConfig,
};

/// Recursively download SSE-C encrypted objects from an S3 bucket prefix.
///
/// Every object under PREFIX is fetched with the given customer-provided
/// key and written below OUTPUT_DIR at its key path minus the prefix.
#[derive(Parser)]
#[command(name = "s3-ssec-get")]
#[command(author, version, about)]
pub struct Args {
    /// Bucket to download from
    pub bucket: String,

    /// Key prefix to mirror (pass "" for the whole bucket)
    pub prefix: String,

    /// Base64-encoded SSE-C key (256-bit)
    pub sse_key: String,

    /// Directory receiving the mirrored key hierarchy
    pub output_dir: PathBuf,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,

    /// AWS region (defaults to environment/profile, then eu-central-1)
    #[arg(long)]
    pub region: Option<String>,

    /// Named profile from the AWS shared config files
    #[arg(long)]
    pub profile: Option<String>,

    /// Custom endpoint for S3-compatible services
    #[arg(long)]
    pub endpoint_url: Option<String>,

    /// Use path-style addressing (endpoint/bucket/key)
    #[arg(long)]
    pub path_style: bool,

    /// Maximum concurrent transfers (1-64)
    #[arg(short = 'c', long, default_value_t = DEFAULT_CONCURRENCY as u8, value_parser = clap::value_parser!(u8).range(1..=64))]
    pub concurrency: u8,

    /// What to do after a transfer fails
    #[arg(long, value_enum, default_value_t = OnError::FailFast)]
    pub on_error: OnError,

    /// Read buffer size in bytes for each object body
    #[arg(long, default_value_t = DEFAULT_CHUNK_SIZE as u64, value_parser = clap::value_parser!(u64).range(1..=MAX_CHUNK_SIZE as u64))]
    pub chunk_size: u64,

    /// Only fetch the first listing page (at most 1000 keys)
    #[arg(long)]
    pub first_page_only: bool,

    /// List objects and print their destinations without downloading
    #[arg(long)]
    pub dry_run: bool,

    /// Print the run report as JSON on stdout
    #[arg(long)]
    pub json: bool,
}

// Hand-written so the key never reaches debug logs.
impl fmt::Debug for Args {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Args")
            .field("bucket", &self.bucket)
            .field("prefix", &self.prefix)
            .field("sse_key", &"<redacted>")
            .field("output_dir", &self.output_dir)
            .field("verbose", &self.verbose)
            .field("quiet", &self.quiet)
            .field("region", &self.region)
            .field("profile", &self.profile)
            .field("endpoint_url", &self.endpoint_url)
            .field("path_style", &self.path_style)
            .field("concurrency", &self.concurrency)
            .field("on_error", &self.on_error)
            .field("chunk_size", &self.chunk_size)
            .field("first_page_only", &self.first_page_only)
            .field("dry_run", &self.dry_run)
            .field("json", &self.json)
            .finish()
    }
}

/// Failure handling choices exposed on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OnError {
    /// Stop at the first failed object
    FailFast,
    /// Attempt every object and report failures at the end
    Continue,
}

impl From<OnError> for FailurePolicy {
    fn from(on_error: OnError) -> Self {
        match on_error {
            OnError::FailFast => FailurePolicy::FailFast,
            OnError::Continue => FailurePolicy::Continue,
        }
    }
}

impl Args {
    /// Returns the default log level for the verbosity flags.
    ///
    /// `RUST_LOG` still takes priority when set.
    pub fn default_log_level(&self) -> &'static str {
        if self.quiet {
            "error"
        } else {
            match self.verbose {
                0 => "info",
                1 => "debug",
                _ => "trace",
            }
        }
    }

    /// Converts parsed arguments into a run configuration.
    pub fn into_config(self) -> RunConfig {
        let listing_mode = if self.first_page_only {
            ListingMode::FirstPage
        } else {
            ListingMode::AllPages
        };

        RunConfig {
            s3: S3Options {
                region: self.region,
                profile: self.profile,
                endpoint_url: self.endpoint_url,
                force_path_style: self.path_style,
            },
            concurrency: usize::from(self.concurrency),
            failure_policy: self.on_error.into(),
            chunk_size: usize::try_from(self.chunk_size).unwrap_or(DEFAULT_CHUNK_SIZE),
            listing_mode,
            dry_run: self.dry_run,
            json_summary: self.json,
            ..RunConfig::new(self.bucket, self.prefix, self.sse_key, self.output_dir)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const POSITIONAL: [&str; 5] = ["s3-ssec-get", "data", "reports/", "dGVzdGtleQ==", "/tmp/out"];

    fn parse(extra: &[&str]) -> Result<Args, clap::Error> {
        Args::try_parse_from(POSITIONAL.iter().chain(extra.iter()))
    }

    #[test]
    fn test_cli_positional_args_parse() {
        let args = parse(&[]).unwrap();
        assert_eq!(args.bucket, "data");
        assert_eq!(args.prefix, "reports/");
        assert_eq!(args.sse_key, "dGVzdGtleQ==");
        assert_eq!(args.output_dir, PathBuf::from("/tmp/out"));
    }

    #[test]
    fn test_cli_defaults() {
        let args = parse(&[]).unwrap();
        assert_eq!(args.verbose, 0);
        assert!(!args.quiet);
        assert_eq!(args.concurrency, 1);
        assert_eq!(args.on_error, OnError::FailFast);
        assert_eq!(args.chunk_size, DEFAULT_CHUNK_SIZE as u64);
        assert!(!args.first_page_only);
        assert!(!args.dry_run);
        assert!(!args.json);
    }

    #[test]
    fn test_cli_missing_positional_is_error() {
        let result = Args::try_parse_from(["s3-ssec-get", "data", "reports/", "dGVzdGtleQ=="]);
        let err = result.unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn test_cli_no_args_is_error() {
        let err = Args::try_parse_from(["s3-ssec-get"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn test_cli_empty_prefix_accepted() {
        let args =
            Args::try_parse_from(["s3-ssec-get", "data", "", "dGVzdGtleQ==", "/tmp/out"]).unwrap();
        assert_eq!(args.prefix, "");
    }

    #[test]
    fn test_cli_help_flag_shows_usage() {
        let err = Args::try_parse_from(["s3-ssec-get", "--help"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
    }

    #[test]
    fn test_cli_verbose_flag_increments_count() {
        assert_eq!(parse(&["-v"]).unwrap().verbose, 1);
        assert_eq!(parse(&["-vv"]).unwrap().verbose, 2);
    }

    #[test]
    fn test_cli_log_level_mapping() {
        assert_eq!(parse(&[]).unwrap().default_log_level(), "info");
        assert_eq!(parse(&["-v"]).unwrap().default_log_level(), "debug");
        assert_eq!(parse(&["-vvv"]).unwrap().default_log_level(), "trace");
        assert_eq!(parse(&["-q", "-v"]).unwrap().default_log_level(), "error");
    }

    #[test]
    fn test_cli_concurrency_range() {
        assert_eq!(parse(&["-c", "8"]).unwrap().concurrency, 8);
        assert_eq!(parse(&["--concurrency", "64"]).unwrap().concurrency, 64);

        let err = parse(&["-c", "0"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
        let err = parse(&["-c", "65"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn test_cli_on_error_values() {
        assert_eq!(
            parse(&["--on-error", "continue"]).unwrap().on_error,
            OnError::Continue
        );
        assert_eq!(
            parse(&["--on-error", "fail-fast"]).unwrap().on_error,
            OnError::FailFast
        );
        let err = parse(&["--on-error", "retry"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::InvalidValue);
    }

    #[test]
    fn test_cli_chunk_size_zero_rejected() {
        let err = parse(&["--chunk-size", "0"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn test_cli_into_config_maps_all_flags() {
        let config = parse(&[
            "--region",
            "us-east-1",
            "--profile",
            "backup",
            "--endpoint-url",
            "http://localhost:9000",
            "--path-style",
            "-c",
            "4",
            "--on-error",
            "continue",
            "--chunk-size",
            "1024",
            "--first-page-only",
            "--dry-run",
            "--json",
        ])
        .unwrap()
        .into_config();

        assert_eq!(config.bucket, "data");
        assert_eq!(config.prefix, "reports/");
        assert_eq!(config.s3.region.as_deref(), Some("us-east-1"));
        assert_eq!(config.s3.profile.as_deref(), Some("backup"));
        assert_eq!(config.s3.endpoint_url.as_deref(), Some("http://localhost:9000"));
        assert!(config.s3.force_path_style);
        assert_eq!(config.concurrency, 4);
        assert_eq!(config.failure_policy, FailurePolicy::Continue);
        assert_eq!(config.chunk_size, 1024);
        assert_eq!(config.listing_mode, ListingMode::FirstPage);
        assert!(config.dry_run);
        assert!(config.json_summary);
    }

    #[test]
    fn test_cli_debug_redacts_key() {
        let args = parse(&[]).unwrap();
        let debug = format!("{args:?}");
        assert!(!debug.contains("dGVzdGtleQ=="), "key leaked: {debug}");
    }
}
