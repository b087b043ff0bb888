//! Shared populate driver used by every backend command.

use crate::args::CommonPopulateArgs;
use ledger_core::{BucketSizes, DatagenConfig, DatagenError, EntityKind, Store};
use ledger_generator::{check_cells_per_call, DatagenRunner, RunPlan, RunReport};
use ledger_metrics::Metrics;
use std::io::Write;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Resolve the config and pin the seed so the plan and the run agree on it.
fn seeded_config(
    args: &CommonPopulateArgs,
    backend_buckets: BucketSizes,
) -> Result<DatagenConfig, DatagenError> {
    let mut config = args.resolve_config(backend_buckets)?;
    let seed = *config.seed.get_or_insert_with(rand::random);
    info!("Using seed {}", seed);
    Ok(config)
}

/// Validate the configuration and lay out the buckets without touching a store.
///
/// `max_cells_per_call` is the backend's per-call payload limit, checked the
/// same way a real run checks it.
pub fn dry_run(
    args: &CommonPopulateArgs,
    backend_buckets: BucketSizes,
    max_cells_per_call: Option<usize>,
    backend: &str,
) -> Result<RunPlan, DatagenError> {
    let config = seeded_config(args, backend_buckets)?;
    let seed = config.seed.unwrap_or_default();
    let buckets = config.bucket_sizes(backend_buckets);
    let plan = RunPlan::new(&config, seed, buckets, args.run_options())?;
    if !args.schema_only {
        check_cells_per_call(EntityKind::User, buckets.user, max_cells_per_call, backend)?;
        check_cells_per_call(
            EntityKind::Transaction,
            buckets.transaction,
            max_cells_per_call,
            backend,
        )?;
    }
    Ok(plan)
}

/// Fill `store` with generated data and write progress and the latency summary to `out`.
///
/// The summary is written whether or not the run succeeded.
pub async fn populate<W: Write + Send>(
    store: Arc<dyn Store>,
    args: &CommonPopulateArgs,
    backend_buckets: BucketSizes,
    cancel: CancellationToken,
    out: &mut W,
) -> Result<RunReport, DatagenError> {
    let config = seeded_config(args, backend_buckets)?;
    let metrics = Arc::new(Metrics::new());

    let runner = DatagenRunner::new(store, metrics.clone(), config, backend_buckets)
        .with_options(args.run_options())
        .with_cancellation(cancel);
    let result = runner.run(out).await;

    let summary = metrics.summarize(&args.summary_options());
    if !summary.is_empty() {
        if let Err(e) = writeln!(out, "{summary}") {
            if result.is_err() {
                warn!("Failed to write metrics summary: {}", e);
            } else {
                return Err(e.into());
            }
        }
    }
    result
}
