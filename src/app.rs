//! Run orchestration: the single place where errors become exit codes.

use std::sync::Arc;

use s3_ssec_get::exit::determine_exit_outcome;
use s3_ssec_get::store::{S3Store, load_sdk_config};
use s3_ssec_get::transfer::path::is_directory_marker;
use s3_ssec_get::{
    Lister, ObjectStore, ProcessExit, RunConfig, RunReport, SseCustomerKey, TransferEngine,
    TransferPlan,
};
use tracing::{debug, error, info, warn};

/// Initializes tracing on stderr.
///
/// Priority: `RUST_LOG` env var > CLI verbosity flags.
pub(crate) fn init_tracing(default_level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .try_init();
}

/// Runs one invocation and returns its exit outcome.
pub(crate) async fn run(config: RunConfig) -> ProcessExit {
    if let Err(e) = config.validate() {
        error!("{e:#}");
        return ProcessExit::Usage;
    }

    // Decoded before any network call; a bad key never reaches S3.
    let sse = match SseCustomerKey::from_base64(&config.sse_key) {
        Ok(key) => Arc::new(key),
        Err(e) => {
            error!(error = %e, "decoding SSE-C key");
            return ProcessExit::KeyMaterial;
        }
    };
    debug!(fingerprint = %sse.fingerprint(), "SSE-C key fingerprint computed");

    let sdk_config = match load_sdk_config(&config.s3).await {
        Ok(sdk_config) => sdk_config,
        Err(e) => {
            error!(error = %e, "unable to load SDK config");
            return ProcessExit::Config;
        }
    };
    let store: Arc<dyn ObjectStore> =
        Arc::new(S3Store::new(&sdk_config, config.s3.force_path_style));

    let keys = match Lister::new(store.as_ref(), config.listing_mode)
        .list(&config.bucket, &config.prefix)
        .await
    {
        Ok(keys) => keys,
        Err(e) => {
            error!(error = %e, "listing objects failed");
            return ProcessExit::Listing;
        }
    };

    let plan = TransferPlan::new(
        config.bucket.as_str(),
        config.prefix.as_str(),
        config.output_dir.as_path(),
        sse,
    );

    if config.dry_run {
        print_dry_run(&plan, &keys);
        return ProcessExit::Success;
    }

    let engine = match TransferEngine::new(
        config.concurrency,
        config.failure_policy,
        config.chunk_size,
    ) {
        Ok(engine) => engine,
        Err(e) => {
            error!(error = %e, "invalid engine settings");
            return ProcessExit::Usage;
        }
    };

    debug!(
        concurrency = engine.concurrency(),
        policy = ?engine.policy(),
        "transfer engine ready"
    );

    let report = match engine.run(store, &plan, keys).await {
        Ok(report) => report,
        Err(e) => {
            error!(error = %e, "transfer engine failed");
            return ProcessExit::TransferFailure;
        }
    };

    report_summary(&report, config.json_summary);
    determine_exit_outcome(&report)
}

fn print_dry_run(plan: &TransferPlan, keys: &[String]) {
    for key in keys {
        if is_directory_marker(key) {
            debug!(key = %key, "skipping directory marker");
            continue;
        }
        match plan.destination(key) {
            Ok(path) => println!("{key} -> {}", path.display()),
            Err(e) => warn!(key = %key, error = %e, "no local path for key"),
        }
    }
    info!(
        keys = keys.len(),
        output_dir = %plan.output_root().display(),
        "dry run complete, nothing downloaded"
    );
}

fn report_summary(report: &RunReport, json: bool) {
    if json {
        match serde_json::to_string_pretty(report) {
            Ok(rendered) => println!("{rendered}"),
            Err(e) => warn!(error = %e, "failed to render JSON report"),
        }
    }

    if report.aborted {
        warn!(
            not_attempted = report.not_attempted,
            "run aborted after a failed transfer; remaining objects were not attempted"
        );
    }
    for failure in &report.failed {
        warn!(key = %failure.key, error = %failure.error, "failed");
    }

    info!(
        completed = report.completed.len(),
        failed = report.failed.len(),
        skipped = report.skipped.len(),
        bytes = report.total_bytes(),
        total = report.listed,
        "Download complete"
    );
}
