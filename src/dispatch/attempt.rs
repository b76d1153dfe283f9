//! Dispatch attempts: dispatch, demux and degraded fallback in one unit

use std::collections::HashSet;
use std::fmt;

use serde_json::Value;

use super::DispatchOutcome;
use crate::demux::{DemuxReport, Handlers, demux};
use crate::query::QueryDescriptor;
use crate::{Error, Result};

type DegradedFn<'a> = Box<dyn FnMut(&str) + Send + 'a>;

/// One dispatch attempt and everything that depends on it
///
/// The label is only used for diagnostics. The degraded callback receives
/// each affected operation id once when the attempt fails, or when one of
/// its operations comes back failed or not at all; it must put that id's
/// targets into the degraded state.
pub struct Attempt<'a> {
    label: String,
    descriptors: Vec<QueryDescriptor>,
    handlers: Handlers<'a>,
    on_degraded: DegradedFn<'a>,
}

impl<'a> Attempt<'a> {
    /// Create an attempt with no handlers and a no-op degraded callback
    #[must_use]
    pub fn new(label: impl Into<String>, descriptors: Vec<QueryDescriptor>) -> Self {
        Self {
            label: label.into(),
            descriptors,
            handlers: Handlers::new(),
            on_degraded: Box::new(|_| {}),
        }
    }

    /// Register the success handler for `operation_id`
    #[must_use]
    pub fn on<F>(mut self, operation_id: impl Into<String>, handler: F) -> Self
    where
        F: FnOnce(&Value) + Send + 'a,
    {
        self.handlers.insert(operation_id, handler);
        self
    }

    /// Replace all success handlers
    #[must_use]
    pub fn with_handlers(mut self, handlers: Handlers<'a>) -> Self {
        self.handlers = handlers;
        self
    }

    /// Set the degraded-display callback
    #[must_use]
    pub fn on_degraded<F>(mut self, callback: F) -> Self
    where
        F: FnMut(&str) + Send + 'a,
    {
        self.on_degraded = Box::new(callback);
        self
    }

    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    #[must_use]
    pub fn descriptors(&self) -> &[QueryDescriptor] {
        &self.descriptors
    }

    /// Operation ids of this attempt, in descriptor order, without repeats
    #[must_use]
    pub fn operation_ids(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.descriptors
            .iter()
            .map(QueryDescriptor::operation_id)
            .filter(|id| seen.insert(id.clone()))
            .collect()
    }

    /// Settle the attempt with the result of its dispatch
    pub(crate) fn settle(self, result: Result<DispatchOutcome>) -> Settlement {
        let operation_ids = self.operation_ids();
        let Self {
            label,
            handlers,
            mut on_degraded,
            ..
        } = self;

        match result {
            Ok(outcome) => {
                let answered: HashSet<String> = outcome
                    .results
                    .iter()
                    .filter(|entry| entry.result.is_ok())
                    .map(|entry| entry.operation_id.clone())
                    .collect();
                let report = demux(outcome, handlers);

                for (operation_id, failure) in &report.failed {
                    tracing::warn!(
                        %label,
                        %operation_id,
                        code = failure.code,
                        reason = failure.reason.as_deref().unwrap_or(""),
                        "batch entry failed"
                    );
                }

                // failed and silently omitted operations alike
                let failed = report.failed_ids();
                for operation_id in operation_ids.iter().filter(|id| !answered.contains(*id)) {
                    if !failed.contains(operation_id.as_str()) {
                        tracing::warn!(%label, %operation_id, "no result for operation");
                    }
                    on_degraded(operation_id.as_str());
                }

                Settlement::Completed(report)
            }
            Err(error) => {
                tracing::warn!(%label, error = %error, "dispatch failed");

                for operation_id in &operation_ids {
                    on_degraded(operation_id.as_str());
                }

                Settlement::Failed { label, error }
            }
        }
    }
}

impl fmt::Debug for Attempt<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Attempt")
            .field("label", &self.label)
            .field("descriptors", &self.descriptors)
            .field("handlers", &self.handlers)
            .finish_non_exhaustive()
    }
}

/// How a dispatch attempt ended
#[derive(Debug)]
pub enum Settlement {
    /// The dispatch succeeded and its results were demultiplexed
    Completed(DemuxReport),
    /// The dispatch failed and every operation was degraded
    Failed {
        label: String,
        error: Error,
    },
}

impl Settlement {
    #[must_use]
    pub const fn is_completed(&self) -> bool {
        matches!(self, Self::Completed(_))
    }

    #[must_use]
    pub const fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }

    /// The demux report, if the attempt completed
    #[must_use]
    pub const fn report(&self) -> Option<&DemuxReport> {
        match self {
            Self::Completed(report) => Some(report),
            Self::Failed { .. } => None,
        }
    }
}
