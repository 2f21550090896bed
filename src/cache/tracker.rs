//! Call Tracker Module
//!
//! Call counting and input/output history for cache operations, applied by
//! explicit composition around an operation's own writes.

use tracing::{debug, warn};

use crate::cache::codec::as_counter;
use crate::error::Result;
use crate::store::{BatchOp, SharedStore};

/// Key of the list holding the rendered inputs of `operation`.
pub fn inputs_key(operation: &str) -> String {
    format!("{}:inputs", operation)
}

/// Key of the list holding the rendered outputs of `operation`.
pub fn outputs_key(operation: &str) -> String {
    format!("{}:outputs", operation)
}

// == Call Tracker ==
/// Records calls of named operations into the backing store.
///
/// Counters live under the bare operation name, history under
/// `{operation}:inputs` and `{operation}:outputs`.
#[derive(Clone)]
pub struct CallTracker {
    store: SharedStore,
}

impl CallTracker {
    /// Creates a tracker writing to `store`.
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    /// Surrounds `writes` with the history entries of one call.
    ///
    /// The input append comes first and the output append last, so the two
    /// logs grow together.
    pub fn history_batch(
        operation: &str,
        input: String,
        writes: Vec<BatchOp>,
        output: String,
    ) -> Vec<BatchOp> {
        let mut batch = Vec::with_capacity(writes.len() + 2);
        batch.push(BatchOp::Append {
            key: inputs_key(operation),
            value: input.into_bytes(),
        });
        batch.extend(writes);
        batch.push(BatchOp::Append {
            key: outputs_key(operation),
            value: output.into_bytes(),
        });
        batch
    }

    /// Applies an operation's writes together with its history entries.
    pub async fn record(
        &self,
        operation: &str,
        input: String,
        writes: Vec<BatchOp>,
        output: String,
    ) -> Result<()> {
        let batch = Self::history_batch(operation, input, writes, output);
        self.store.apply_batch(batch).await?;

        if !self.store.supports_atomic_batch() {
            debug!(
                operation,
                store = self.store.name(),
                "history recorded without atomic batch"
            );
        }
        Ok(())
    }

    /// Bumps the call counter of `operation`.
    ///
    /// Failures are logged and swallowed: the counter is telemetry.
    pub async fn count(&self, operation: &str) -> Option<i64> {
        match self.store.increment(operation).await {
            Ok(count) => Some(count),
            Err(e) => {
                warn!(operation, error = %e, "failed to increment call counter");
                None
            }
        }
    }

    /// Reads the call counter of `operation`, 0 if never called.
    pub async fn call_count(&self, operation: &str) -> Result<u64> {
        match self.store.get(operation).await? {
            None => Ok(0),
            Some(bytes) => Ok(as_counter(Some(bytes.as_slice()))?),
        }
    }
}
