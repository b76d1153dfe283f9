//! Boot reports for one job
//!
//! Three groups of queries feed the page:
//!
//! 1. a two-query batch for the report and board totals
//! 2. the boot reports aggregated by kernel
//! 3. PASS and FAIL counts for every kernel, as two joined attempts
//!
//! Totals and the main query run concurrently; the counts need the kernel
//! list and start once it arrives.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

use super::{BackendDate, extract_count};
use crate::board::{Board, Degraded, Tone};
use crate::config::PageContext;
use crate::dispatch::{Attempt, Dispatcher, Settlement, Transport};
use crate::join::settle_all;
use crate::query::QueryDescriptor;
use crate::{Error, Result};

/// Target listing the kernels
pub const REPORTS_BODY: &str = "#boot-reports-body";

/// Target for the total number of boot reports
pub const REPORTS_COUNT: &str = "#boot-reports-count";

/// Target for the number of distinct boards
pub const BOARDS_COUNT: &str = "#boot-boards-count";

/// Target for the PASS count of the kernel at `index`
#[must_use]
pub fn success_target(index: usize) -> String {
    format!("#success-count{index}")
}

/// Target for the FAIL count of the kernel at `index`
#[must_use]
pub fn fail_target(index: usize) -> String {
    format!("#fail-count{index}")
}

/// Boot outcome being counted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootStatus {
    Pass,
    Fail,
}

impl BootStatus {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Pass => "PASS",
            Self::Fail => "FAIL",
        }
    }

    fn target(self, index: usize) -> String {
        match self {
            Self::Pass => success_target(index),
            Self::Fail => fail_target(index),
        }
    }

    const fn tone(self) -> Tone {
        match self {
            Self::Pass => Tone::Success,
            Self::Fail => Tone::Danger,
        }
    }
}

/// One kernel row of the boot report list
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct KernelReport {
    pub kernel: String,
    #[serde(default)]
    pub job: Option<String>,
    #[serde(default)]
    pub created_on: Option<BackendDate>,
}

impl KernelReport {
    /// Creation time, when the backend sent a valid one
    #[must_use]
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_on.and_then(BackendDate::to_utc)
    }
}

/// What the page loaded
#[derive(Debug)]
pub struct BootJobPage {
    /// Kernels, newest first
    pub kernels: Vec<KernelReport>,
    /// Settlement of the totals batch
    pub summary: Settlement,
    /// Settlements of the PASS and FAIL count attempts; empty when there
    /// are no kernels
    pub counts: Vec<Settlement>,
}

/// Totals batch: report count and distinct boards
#[must_use]
pub fn summary_attempt(ctx: &PageContext, board: &Board) -> Attempt<'static> {
    let reports = QueryDescriptor::get("count")
        .resource("boot")
        .operation(REPORTS_COUNT)
        .param("job", &ctx.job)
        .param_opt("date_range", ctx.date_range);

    let boards = QueryDescriptor::get("boot")
        .operation(BOARDS_COUNT)
        .param("job", &ctx.job)
        .param_opt("date_range", ctx.date_range)
        .param("aggregate", "board")
        .param("field", "board");

    let count_board = board.clone();
    let boards_board = board.clone();

    Attempt::new("boot totals", vec![reports, boards])
        .on(REPORTS_COUNT, move |result| match extract_count(result) {
            Some(count) => count_board.show(REPORTS_COUNT, count.to_string()),
            None => count_board.degrade(REPORTS_COUNT, Degraded::Unavailable),
        })
        .on(BOARDS_COUNT, move |result| match result.as_array() {
            Some(boards) => boards_board.show(BOARDS_COUNT, boards.len().to_string()),
            None => boards_board.degrade(BOARDS_COUNT, Degraded::Unavailable),
        })
        .on_degraded(board.degrader(Degraded::Unavailable))
}

/// Main query: boot reports aggregated by kernel, newest first
#[must_use]
pub fn reports_query(ctx: &PageContext) -> QueryDescriptor {
    QueryDescriptor::get("boot")
        .operation(REPORTS_BODY)
        .param("aggregate", "kernel")
        .param("job", &ctx.job)
        .param("sort", "created_on")
        .param("sort_order", -1_i64)
        .param_opt("date_range", ctx.date_range)
        .param("field", ["job", "kernel", "created_on"])
}

/// Per-kernel count attempt for one boot status
#[must_use]
pub fn count_attempt(
    ctx: &PageContext,
    kernels: &[KernelReport],
    status: BootStatus,
    board: &Board,
) -> Attempt<'static> {
    let descriptors = kernels
        .iter()
        .enumerate()
        .map(|(i, k)| {
            QueryDescriptor::get("count")
                .resource("boot")
                .operation(status.target(i))
                .param("status", status.as_str())
                .param("job", &ctx.job)
                .param("kernel", &k.kernel)
        })
        .collect();

    let label = format!("boot {} counts", status.as_str().to_lowercase());
    let mut attempt = Attempt::new(label, descriptors);

    for i in 0..kernels.len() {
        let target = status.target(i);
        let board = board.clone();
        attempt = attempt.on(target.clone(), move |result: &Value| {
            match extract_count(result) {
                Some(count) => board.show_toned(&target, count.to_string(), status.tone()),
                None => board.degrade(&target, Degraded::Unknown),
            }
        });
    }

    attempt.on_degraded(board.degrader(Degraded::Unknown))
}

/// Load the boot-job page into `board`
///
/// # Errors
///
/// Returns error if the main boot report query fails; totals and counts
/// never fail the page, they degrade their targets instead.
pub async fn load<T: Transport>(
    dispatcher: &Dispatcher<T>,
    ctx: &PageContext,
    board: &Board,
) -> Result<BootJobPage> {
    board.loading(REPORTS_COUNT);
    board.loading(BOARDS_COUNT);
    board.loading(REPORTS_BODY);

    let main_query = [reports_query(ctx)];
    let (summary, main) = futures::join!(
        dispatcher.run(summary_attempt(ctx, board)),
        dispatcher.dispatch(&main_query),
    );

    let kernels = match main.and_then(|outcome| {
        outcome
            .get(REPORTS_BODY)
            .ok_or_else(|| Error::MalformedResponse("boot report result missing".to_string()))?
            .decode::<Vec<KernelReport>>()
    }) {
        Ok(kernels) => kernels,
        Err(e) => {
            tracing::warn!(job = %ctx.job, error = %e, "boot report query failed");
            board.degrade(REPORTS_BODY, Degraded::Unavailable);
            return Err(e);
        }
    };

    if kernels.is_empty() {
        board.show(REPORTS_BODY, "No boot reports available.");
        return Ok(BootJobPage {
            kernels,
            summary,
            counts: Vec::new(),
        });
    }

    board.show(REPORTS_BODY, format!("{} kernels", kernels.len()));
    for i in 0..kernels.len() {
        board.loading(&success_target(i));
        board.loading(&fail_target(i));
    }

    let counts = settle_all([
        dispatcher.run(count_attempt(ctx, &kernels, BootStatus::Pass, board)),
        dispatcher.run(count_attempt(ctx, &kernels, BootStatus::Fail, board)),
    ])
    .await;

    tracing::info!(
        job = %ctx.job,
        kernels = kernels.len(),
        failed_attempts = counts.iter().filter(|s| s.is_failed()).count(),
        "boot job page loaded"
    );

    Ok(BootJobPage {
        kernels,
        summary,
        counts,
    })
}
