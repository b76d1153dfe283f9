//! Join-all over independent dispatch attempts
//!
//! Sibling attempts run concurrently on the current task. The join
//! completes only after every attempt has settled, successful or degraded;
//! it never short-circuits on the first failure.

use std::future::Future;

use futures::future::join_all;

use crate::dispatch::Settlement;

/// Wait for every attempt to settle, returning settlements in input order
pub async fn settle_all<I, F>(attempts: I) -> Vec<Settlement>
where
    I: IntoIterator<Item = F>,
    F: Future<Output = Settlement>,
{
    let settlements = join_all(attempts).await;

    let failed = settlements.iter().filter(|s| s.is_failed()).count();
    tracing::debug!(total = settlements.len(), failed, "joined attempts settled");

    settlements
}

/// Wait for every attempt to settle, then run `on_complete` once with all
/// settlements
pub async fn when_all<I, F, C, R>(attempts: I, on_complete: C) -> R
where
    I: IntoIterator<Item = F>,
    F: Future<Output = Settlement>,
    C: FnOnce(&[Settlement]) -> R,
{
    let settlements = settle_all(attempts).await;
    on_complete(&settlements)
}
