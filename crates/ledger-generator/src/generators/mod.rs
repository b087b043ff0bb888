//! Entity generators.
//!
//! Each generator builds one bucket of records at a time in memory, hands it
//! to the [`BulkApplier`], and waits for the call to return before building
//! the next bucket. The first failing bucket aborts the generator; buckets
//! applied before it stay committed.

pub mod company;
pub mod transaction;
pub mod user;

pub use company::CompanyGenerator;
pub use transaction::TransactionGenerator;
pub use user::UserGenerator;

use crate::apply::BulkApplier;
use ledger_core::{DatagenError, EntityKind, Store};
use ledger_metrics::MetricsSink;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Collaborators shared by every generator of a run.
#[derive(Clone)]
pub struct GeneratorContext {
    pub store: Arc<dyn Store>,
    pub metrics: Arc<dyn MetricsSink>,
    pub cancel: CancellationToken,
}

impl GeneratorContext {
    pub fn new(store: Arc<dyn Store>, metrics: Arc<dyn MetricsSink>) -> Self {
        Self {
            store,
            metrics,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn applier(&self) -> BulkApplier {
        BulkApplier::new(self.store.clone(), self.metrics.clone())
    }

    /// Fail with `Cancelled` if the run has been cancelled.
    pub fn ensure_not_cancelled(&self, kind: EntityKind) -> Result<(), DatagenError> {
        if self.cancel.is_cancelled() {
            Err(DatagenError::Cancelled {
                stage: format!("{kind} generation"),
            })
        } else {
            Ok(())
        }
    }
}

/// What a generator wrote.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GenerateStats {
    /// Rows submitted in successful bulk applies.
    pub rows: u64,
    /// Successful bulk apply calls.
    pub buckets: u64,
}
