//! Job summary: build and defconfig totals plus the job's build list
//!
//! The two totals are independent single queries joined with
//! [`settle_all`]; the build list runs alongside them.

use serde::Deserialize;
use serde_json::Value;

use super::{BackendDate, extract_count};
use crate::board::{Board, Degraded};
use crate::config::PageContext;
use crate::dispatch::{Attempt, Dispatcher, Settlement, Transport};
use crate::join::settle_all;
use crate::query::QueryDescriptor;
use crate::{Error, Result};

/// Target for the number of builds
pub const BUILDS_COUNT: &str = "#builds-count";

/// Target for the number of defconfigs
pub const DEFCONFS_COUNT: &str = "#defconfs-count";

/// Target listing the builds
pub const BUILDS_TABLE: &str = "#jobstable";

/// Days covered when the page context names no range
pub const DEFAULT_DATE_RANGE: u32 = 15;

/// Git details attached to a build
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct BuildMetadata {
    #[serde(default)]
    pub git_branch: Option<String>,
    #[serde(default)]
    pub git_commit: Option<String>,
}

/// One row of the build list
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct JobBuild {
    pub kernel: String,
    #[serde(default)]
    pub job: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub created_on: Option<BackendDate>,
    #[serde(default)]
    pub metadata: BuildMetadata,
}

/// What the page loaded
#[derive(Debug)]
pub struct JobPage {
    /// Builds, newest first
    pub builds: Vec<JobBuild>,
    /// Settlements of the build and defconfig count attempts, in that order
    pub counts: Vec<Settlement>,
}

const fn date_range(ctx: &PageContext) -> u32 {
    match ctx.date_range {
        Some(days) => days,
        None => DEFAULT_DATE_RANGE,
    }
}

/// Single count query for `collection`, shown in `target`
#[must_use]
pub fn count_attempt(
    ctx: &PageContext,
    collection: &str,
    target: &'static str,
    board: &Board,
) -> Attempt<'static> {
    let query = QueryDescriptor::get("count")
        .resource(collection)
        .operation(target)
        .param("job", &ctx.job)
        .param("date_range", date_range(ctx));

    let shown = board.clone();
    Attempt::new(format!("job {collection} count"), vec![query])
        .on(target, move |result| match extract_count(result) {
            Some(count) => shown.show(target, count.to_string()),
            None => shown.degrade(target, Degraded::Unavailable),
        })
        .on_degraded(board.degrader(Degraded::Unavailable))
}

/// Build list query, newest first
#[must_use]
pub fn builds_query(ctx: &PageContext) -> QueryDescriptor {
    QueryDescriptor::get("job")
        .operation(BUILDS_TABLE)
        .param("job", &ctx.job)
        .param("sort", "created_on")
        .param("sort_order", -1_i64)
        .param("date_range", date_range(ctx))
        .param("field", ["job", "kernel", "created_on", "status", "metadata"])
}

/// Decode the build list; the job endpoint may send it as a JSON string
///
/// # Errors
///
/// Returns error if the payload is not a list of builds
pub fn decode_builds(result: &Value) -> Result<Vec<JobBuild>> {
    let decoded = match result {
        Value::String(raw) => serde_json::from_str(raw),
        other => Vec::<JobBuild>::deserialize(other),
    };
    decoded.map_err(|e| Error::MalformedResponse(format!("job builds: {e}")))
}

/// Load the job summary page into `board`
///
/// # Errors
///
/// Returns error if the build list query fails; the counts never fail the
/// page, they degrade their targets instead.
pub async fn load<T: Transport>(
    dispatcher: &Dispatcher<T>,
    ctx: &PageContext,
    board: &Board,
) -> Result<JobPage> {
    board.loading(BUILDS_COUNT);
    board.loading(DEFCONFS_COUNT);
    board.loading(BUILDS_TABLE);

    let table = [builds_query(ctx)];
    let (counts, listed) = futures::join!(
        settle_all([
            dispatcher.run(count_attempt(ctx, "job", BUILDS_COUNT, board)),
            dispatcher.run(count_attempt(ctx, "defconfig", DEFCONFS_COUNT, board)),
        ]),
        dispatcher.dispatch(&table),
    );

    let builds = match listed.and_then(|outcome| {
        let entry = outcome
            .get(BUILDS_TABLE)
            .ok_or_else(|| Error::MalformedResponse("job builds missing".to_string()))?;
        match &entry.result {
            Ok(value) => decode_builds(value),
            Err(_) => entry.decode::<Vec<JobBuild>>(),
        }
    }) {
        Ok(builds) => builds,
        Err(e) => {
            tracing::warn!(job = %ctx.job, error = %e, "job build query failed");
            board.degrade(BUILDS_TABLE, Degraded::Unavailable);
            return Err(e);
        }
    };

    if builds.is_empty() {
        board.show(BUILDS_TABLE, "No jobs to display.");
    } else {
        board.show(BUILDS_TABLE, format!("{} builds", builds.len()));
    }

    tracing::info!(
        job = %ctx.job,
        builds = builds.len(),
        failed_attempts = counts.iter().filter(|s| s.is_failed()).count(),
        "job page loaded"
    );

    Ok(JobPage { builds, counts })
}
