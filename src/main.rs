//! CLI entry point for s3-ssec-get.

use std::process::ExitCode;

use clap::Parser;
use clap::error::ErrorKind;
use s3_ssec_get::ProcessExit;
use tracing::{debug, info};

mod app;
mod cli;

use cli::Args;

#[tokio::main]
async fn main() -> ExitCode {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            let _ = err.print();
            return ExitCode::SUCCESS;
        }
        Err(err) => {
            // Usage errors go to stdout with exit code 1.
            println!("{}", err.render());
            return ProcessExit::Usage.into();
        }
    };

    app::init_tracing(args.default_log_level());

    debug!(?args, "CLI arguments parsed");
    info!(bucket = %args.bucket, prefix = %args.prefix, "s3-ssec-get starting");

    app::run(args.into_config()).await.into()
}
