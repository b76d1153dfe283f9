//! Result demultiplexing
//!
//! Routes each entry of a dispatch outcome to the handler registered for
//! its operation id. Fan-out is best effort: entries without a handler and
//! handlers without an entry are recorded in the report, never raised.

use std::collections::{HashMap, HashSet};
use std::fmt;

use serde_json::Value;

use crate::dispatch::{DispatchOutcome, EntryFailure};

/// Per-operation result handler; fires at most once
pub type Handler<'a> = Box<dyn FnOnce(&Value) + Send + 'a>;

/// Handlers keyed by operation id
#[derive(Default)]
pub struct Handlers<'a> {
    map: HashMap<String, Handler<'a>>,
}

impl<'a> Handlers<'a> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `operation_id`, replacing any earlier one
    #[must_use]
    pub fn on<F>(mut self, operation_id: impl Into<String>, handler: F) -> Self
    where
        F: FnOnce(&Value) + Send + 'a,
    {
        self.insert(operation_id, handler);
        self
    }

    /// Register `handler` for `operation_id` in place
    pub fn insert<F>(&mut self, operation_id: impl Into<String>, handler: F)
    where
        F: FnOnce(&Value) + Send + 'a,
    {
        self.map.insert(operation_id.into(), Box::new(handler));
    }

    #[must_use]
    pub fn contains(&self, operation_id: &str) -> bool {
        self.map.contains_key(operation_id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

impl fmt::Debug for Handlers<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut ids: Vec<&String> = self.map.keys().collect();
        ids.sort();
        f.debug_struct("Handlers").field("operation_ids", &ids).finish()
    }
}

/// What happened during one demux pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DemuxReport {
    /// Operation ids whose handler fired, in invocation order
    pub delivered: Vec<String>,
    /// Successful entry ids with no (remaining) handler
    pub unmatched: Vec<String>,
    /// Handler ids that received nothing, sorted
    pub unanswered: Vec<String>,
    /// Entries the backend marked failed, with or without a handler
    pub failed: Vec<(String, EntryFailure)>,
}

/// Invoke handlers for each entry of `outcome`, in result order
///
/// A handler is consumed by the first entry carrying its id, delivered or
/// failed, so a duplicated echo of the same operation id never fires it
/// twice. Failed entries are reported whether or not a handler was waiting.
#[must_use]
pub fn demux(outcome: DispatchOutcome, mut handlers: Handlers<'_>) -> DemuxReport {
    let mut report = DemuxReport::default();

    for entry in outcome.results {
        let handler = handlers.map.remove(&entry.operation_id);

        match (entry.result, handler) {
            (Err(failure), _) => {
                tracing::debug!(
                    operation_id = %entry.operation_id,
                    code = failure.code,
                    "result entry failed"
                );
                report.failed.push((entry.operation_id, failure));
            }
            (Ok(value), Some(handler)) => {
                handler(&value);
                report.delivered.push(entry.operation_id);
            }
            (Ok(_), None) => {
                tracing::debug!(operation_id = %entry.operation_id, "no handler for result entry");
                report.unmatched.push(entry.operation_id);
            }
        }
    }

    let mut unanswered: Vec<String> = handlers.map.into_keys().collect();
    unanswered.sort();
    report.unanswered = unanswered;

    report
}

impl DemuxReport {
    /// Ids of failed entries, without their details
    #[must_use]
    pub fn failed_ids(&self) -> HashSet<&str> {
        self.failed.iter().map(|(id, _)| id.as_str()).collect()
    }
}
