//! Call History Module
//!
//! Reads the recorded inputs/outputs of an operation back as an ordered trace.

use std::fmt;

use tracing::{info, warn};

use crate::cache::tracker::{inputs_key, outputs_key};
use crate::error::Result;
use crate::store::SharedStore;

/// Rendered in place of an output the log does not (yet) hold.
pub const MISSING_OUTPUT: &str = "<missing>";

// == Call Record ==
/// One recorded call: rendered arguments and rendered result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallRecord {
    pub operation: String,
    pub input: String,
    pub output: String,
}

impl fmt::Display for CallRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({}) -> {}", self.operation, self.input, self.output)
    }
}

// == Call History ==
/// Snapshot of both history logs of one operation.
#[derive(Debug, Clone)]
pub struct CallHistory {
    operation: String,
    inputs: Vec<Vec<u8>>,
    outputs: Vec<Vec<u8>>,
}

impl CallHistory {
    /// Builds a history from raw log contents.
    pub fn new(operation: impl Into<String>, inputs: Vec<Vec<u8>>, outputs: Vec<Vec<u8>>) -> Self {
        Self {
            operation: operation.into(),
            inputs,
            outputs,
        }
    }

    pub fn operation(&self) -> &str {
        &self.operation
    }

    /// Number of recorded calls, taken from the inputs log.
    pub fn len(&self) -> usize {
        self.inputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty()
    }

    /// True when both logs hold the same number of entries.
    pub fn is_consistent(&self) -> bool {
        self.inputs.len() == self.outputs.len()
    }

    /// Iterates the calls in order, pairing the logs by position.
    ///
    /// Can be called any number of times; each call starts from the first record.
    pub fn records(&self) -> impl Iterator<Item = CallRecord> + '_ {
        self.inputs.iter().enumerate().map(move |(i, input)| CallRecord {
            operation: self.operation.clone(),
            input: String::from_utf8_lossy(input).into_owned(),
            output: self
                .outputs
                .get(i)
                .map(|output| String::from_utf8_lossy(output).into_owned())
                .unwrap_or_else(|| MISSING_OUTPUT.to_string()),
        })
    }

    /// First line of a rendered trace.
    pub fn header(&self) -> String {
        let plural = if self.len() == 1 { "" } else { "s" };
        format!("{} was called {} time{}:", self.operation, self.len(), plural)
    }

    /// Header followed by one line per call.
    pub fn render(&self) -> Vec<String> {
        std::iter::once(self.header())
            .chain(self.records().map(|record| record.to_string()))
            .collect()
    }
}

// == Call History Replayer ==
/// Reads call history of any operation straight from the store.
#[derive(Clone)]
pub struct CallHistoryReplayer {
    store: SharedStore,
}

impl CallHistoryReplayer {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    /// Reads the full inputs and outputs logs of `operation`.
    pub async fn history(&self, operation: &str) -> Result<CallHistory> {
        let inputs = self.store.range_read(&inputs_key(operation), 0, -1).await?;
        let outputs = self.store.range_read(&outputs_key(operation), 0, -1).await?;

        let history = CallHistory::new(operation, inputs, outputs);
        if !history.is_consistent() {
            warn!(
                operation,
                inputs = history.inputs.len(),
                outputs = history.outputs.len(),
                "call history logs differ in length"
            );
        }
        Ok(history)
    }

    /// Renders the history of `operation`, logging each line.
    pub async fn replay(&self, operation: &str) -> Result<Vec<String>> {
        let lines = self.history(operation).await?.render();
        for line in &lines {
            info!("{}", line);
        }
        Ok(lines)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{KeyValueStore, MemoryStore};
    use std::sync::Arc;

    fn history(inputs: &[&str], outputs: &[&str]) -> CallHistory {
        CallHistory::new(
            "store",
            inputs.iter().map(|s| s.as_bytes().to_vec()).collect(),
            outputs.iter().map(|s| s.as_bytes().to_vec()).collect(),
        )
    }

    #[test]
    fn test_render_pairs_positionally() {
        let history = history(&["\"a\"", "\"b\""], &["k1", "k2"]);

        assert_eq!(
            history.render(),
            vec![
                "store was called 2 times:".to_string(),
                "store(\"a\") -> k1".to_string(),
                "store(\"b\") -> k2".to_string(),
            ]
        );
    }

    #[test]
    fn test_records_restartable() {
        let history = history(&["1", "2", "3"], &["a", "b", "c"]);

        let first: Vec<_> = history.records().collect();
        let second: Vec<_> = history.records().collect();
        assert_eq!(first, second);
        assert_eq!(first.len(), 3);
    }

    #[test]
    fn test_missing_outputs_rendered() {
        let history = history(&["1", "2"], &["a"]);

        assert!(!history.is_consistent());
        let records: Vec<_> = history.records().collect();
        assert_eq!(records[1].output, MISSING_OUTPUT);
    }

    #[test]
    fn test_empty_history() {
        let history = history(&[], &[]);
        assert!(history.is_empty());
        assert_eq!(history.render(), vec!["store was called 0 times:".to_string()]);
    }

    #[test]
    fn test_single_call_header() {
        assert_eq!(history(&["1"], &["a"]).header(), "store was called 1 time:");
    }

    #[tokio::test]
    async fn test_replay_from_store() {
        let store = Arc::new(MemoryStore::new());
        store.append("op:inputs", b"1".to_vec()).await.unwrap();
        store.append("op:outputs", b"one".to_vec()).await.unwrap();

        let replayer = CallHistoryReplayer::new(store);
        let lines = replayer.replay("op").await.unwrap();

        assert_eq!(lines, vec!["op was called 1 time:", "op(1) -> one"]);
    }

    #[tokio::test]
    async fn test_replay_unknown_operation() {
        let replayer = CallHistoryReplayer::new(Arc::new(MemoryStore::new()));
        let history = replayer.history("nothing").await.unwrap();
        assert!(history.is_empty());
    }
}
