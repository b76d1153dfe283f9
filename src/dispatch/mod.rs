//! Batch query dispatcher
//!
//! Given one or many [`QueryDescriptor`]s, the dispatcher picks the
//! transport strategy:
//!
//! - one descriptor: a direct request to `collection[/resource]`
//! - two or more: one POST of `{ "batch": [...] }` to the batch endpoint
//!
//! Either way the caller gets the same ordered per-operation results. Each
//! call goes to the network; nothing is cached, deduplicated or retried.

pub mod attempt;
pub mod outcome;
pub mod transport;

#[cfg(test)]
pub(crate) mod mock;

use std::collections::HashSet;

use crate::config::{BackendConfig, DEFAULT_BATCH_PATH};
use crate::query::{BatchRequest, Method, QueryDescriptor};
use crate::{Error, Result};

pub use attempt::{Attempt, Settlement};
pub use outcome::{DispatchMode, DispatchOutcome, EntryFailure, OperationResult};
pub use transport::{HttpTransport, Transport};

/// Issues query descriptors against the backend
#[derive(Debug)]
pub struct Dispatcher<T = HttpTransport> {
    transport: T,
    batch_path: String,
}

impl Dispatcher<HttpTransport> {
    /// Create a dispatcher over HTTP from backend settings
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client can't be built
    pub fn from_config(config: &BackendConfig) -> Result<Self> {
        Ok(Self::new(HttpTransport::new(config)?).with_batch_path(&config.batch_path))
    }
}

impl<T: Transport> Dispatcher<T> {
    /// Create a dispatcher using the default batch endpoint path
    #[must_use]
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            batch_path: DEFAULT_BATCH_PATH.to_string(),
        }
    }

    /// Override the batch endpoint path
    #[must_use]
    pub fn with_batch_path(mut self, path: &str) -> Self {
        self.batch_path = path.to_string();
        self
    }

    #[must_use]
    pub const fn transport(&self) -> &T {
        &self.transport
    }

    #[must_use]
    pub fn batch_path(&self) -> &str {
        &self.batch_path
    }

    /// Dispatch `descriptors` and return their ordered results
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyDispatch`] or [`Error::DuplicateOperation`] for
    /// invalid input without touching the network, and a transport error if
    /// the request fails, returns a non-2xx status or a malformed payload.
    pub async fn dispatch(&self, descriptors: &[QueryDescriptor]) -> Result<DispatchOutcome> {
        validate(descriptors)?;

        if let [descriptor] = descriptors {
            return self.dispatch_single(descriptor).await;
        }

        let body = serde_json::to_value(BatchRequest::from_descriptors(descriptors))?;
        tracing::debug!(
            queries = descriptors.len(),
            path = %self.batch_path,
            "dispatching batch query"
        );

        let response = self.transport.post_json(&self.batch_path, &body).await?;
        outcome::decode_batch(response)
    }

    async fn dispatch_single(&self, descriptor: &QueryDescriptor) -> Result<DispatchOutcome> {
        let path = descriptor.path();
        let operation_id = descriptor.operation_id();
        tracing::debug!(%operation_id, %path, method = %descriptor.method(), "dispatching single query");

        let response = match descriptor.method() {
            Method::Get => self.transport.get(&path, &descriptor.query_pairs()).await?,
            Method::Post => {
                let body = serde_json::to_value(descriptor.params())?;
                self.transport.post_json(&path, &body).await?
            }
        };

        outcome::decode_single(response, operation_id)
    }

    /// Run one dispatch attempt to settlement
    ///
    /// On success the outcome is demultiplexed to the attempt's handlers and
    /// entries the backend marked failed are degraded individually. On any
    /// dispatch failure every operation of the attempt is degraded exactly
    /// once and no handler fires. Never returns an error.
    pub async fn run(&self, attempt: Attempt<'_>) -> Settlement {
        let result = self.dispatch(attempt.descriptors()).await;
        attempt.settle(result)
    }
}

/// Reject empty dispatches and repeated operation ids
fn validate(descriptors: &[QueryDescriptor]) -> Result<()> {
    if descriptors.is_empty() {
        return Err(Error::EmptyDispatch);
    }

    let mut seen = HashSet::with_capacity(descriptors.len());
    for descriptor in descriptors {
        let id = descriptor.operation_id();
        if !seen.insert(id.clone()) {
            return Err(Error::DuplicateOperation(id));
        }
    }

    Ok(())
}
