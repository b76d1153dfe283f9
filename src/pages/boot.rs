//! Detail of one boot report
//!
//! The report is addressed by its document id, which becomes the resource
//! segment of a single GET on the boot collection. Any failure replaces the
//! whole page content with the unavailable placeholder.

use std::fmt;

use serde::Deserialize;
use serde_json::{Map, Value};

use super::BackendDate;
use crate::board::{Board, Degraded, Tone};
use crate::dispatch::{Dispatcher, Transport};
use crate::query::QueryDescriptor;
use crate::{Error, Result};

/// Target holding the whole page content
pub const CONTENT: &str = "#container-content";

pub const BOARD: &str = "#dd-board-board";
pub const DEFCONFIG: &str = "#dd-board-defconfig";
pub const KERNEL: &str = "#dd-board-kernel";
pub const TREE: &str = "#dd-board-tree";
pub const ENDIANNESS: &str = "#dd-board-endianness";
pub const BOOT_LOG: &str = "#dd-board-boot-log";
pub const STATUS: &str = "#dd-board-status";
pub const BOOT_TIME: &str = "#dd-board-boot-time";
pub const WARNINGS: &str = "#dd-board-warnings";
pub const DTB: &str = "#dd-board-dtb";
pub const DTB_ADDRESS: &str = "#dd-board-dtb-address";
pub const INITRD_ADDRESS: &str = "#dd-board-initrd-address";
pub const LOAD_ADDRESS: &str = "#dd-board-load-address";
pub const KERNEL_IMAGE: &str = "#dd-board-kernel-image";

/// Shown for fields the report does not carry
pub const NOT_AVAILABLE: &str = "n/a";

/// Identity of a boot report: `{board}-{job}-{kernel}-{defconfig}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootId {
    pub board: String,
    pub job: String,
    pub kernel: String,
    pub defconfig: String,
}

impl BootId {
    #[must_use]
    pub fn new(
        board: impl Into<String>,
        job: impl Into<String>,
        kernel: impl Into<String>,
        defconfig: impl Into<String>,
    ) -> Self {
        Self {
            board: board.into(),
            job: job.into(),
            kernel: kernel.into(),
            defconfig: defconfig.into(),
        }
    }
}

impl fmt::Display for BootId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-{}-{}", self.board, self.job, self.kernel, self.defconfig)
    }
}

/// A boot report document
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct BootReport {
    pub board: String,
    pub job: String,
    pub kernel: String,
    pub defconfig: String,
    pub status: Option<String>,
    pub time: Option<BackendDate>,
    pub endian: Option<String>,
    pub boot_log: Option<String>,
    pub boot_log_html: Option<String>,
    pub warnings: Option<u64>,
    pub dtb: Option<String>,
    pub dtb_addr: Option<String>,
    pub initrd_addr: Option<String>,
    pub load_addr: Option<String>,
    pub kernel_image: Option<String>,
    pub boot_result_description: Option<String>,
    pub metadata: Map<String, Value>,
}

impl BootReport {
    /// Result description, top-level first, then from the metadata
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.boot_result_description
            .as_deref()
            .or_else(|| self.metadata.get("boot_result_description").and_then(Value::as_str))
    }

    /// Boot time as `HH:MM:SS.mmm`
    #[must_use]
    pub fn boot_time(&self) -> Option<String> {
        self.time
            .and_then(BackendDate::to_utc)
            .map(|t| t.format("%H:%M:%S%.3f").to_string())
    }

    /// Available log formats, e.g. `txt html`
    #[must_use]
    pub fn boot_logs(&self) -> Option<String> {
        let logs: Vec<&str> = [("txt", &self.boot_log), ("html", &self.boot_log_html)]
            .into_iter()
            .filter_map(|(kind, log)| log.as_ref().map(|_| kind))
            .collect();
        (!logs.is_empty()).then(|| logs.join(" "))
    }
}

/// Query for the boot report `id`
#[must_use]
pub fn report_query(id: &BootId) -> QueryDescriptor {
    QueryDescriptor::get("boot")
        .resource(id.to_string())
        .operation(CONTENT)
}

fn status_cell(report: &BootReport) -> (String, Tone) {
    let (label, tone) = match report.status.as_deref() {
        Some("PASS") => ("PASS", Tone::Success),
        Some("FAIL") => ("FAIL", Tone::Danger),
        Some("OFFLINE") => ("OFFLINE", Tone::Info),
        _ => ("UNKNOWN", Tone::Warning),
    };

    match report.description() {
        Some(description) => (format!("{label} ({description})"), tone),
        None => (label.to_string(), tone),
    }
}

/// Empty strings count as missing
fn or_not_available(value: Option<&str>) -> &str {
    value.filter(|v| !v.is_empty()).unwrap_or(NOT_AVAILABLE)
}

/// Write every field of `report` to its target
pub fn show_report(board: &Board, report: &BootReport) {
    board.show(BOARD, report.board.as_str());
    board.show(DEFCONFIG, report.defconfig.as_str());
    board.show(KERNEL, report.kernel.as_str());
    board.show(TREE, report.job.as_str());

    let (status, tone) = status_cell(report);
    board.show_toned(STATUS, status, tone);

    board.show(ENDIANNESS, or_not_available(report.endian.as_deref()));
    board.show(BOOT_LOG, report.boot_logs().unwrap_or_else(|| NOT_AVAILABLE.to_string()));
    board.show(BOOT_TIME, report.boot_time().unwrap_or_else(|| NOT_AVAILABLE.to_string()));
    board.show(WARNINGS, report.warnings.unwrap_or(0).to_string());
    board.show(DTB, or_not_available(report.dtb.as_deref()));
    board.show(DTB_ADDRESS, or_not_available(report.dtb_addr.as_deref()));
    board.show(INITRD_ADDRESS, or_not_available(report.initrd_addr.as_deref()));
    board.show(LOAD_ADDRESS, or_not_available(report.load_addr.as_deref()));
    board.show(KERNEL_IMAGE, or_not_available(report.kernel_image.as_deref()));
}

/// Load the boot report `id` into `board`
///
/// # Errors
///
/// Returns error if the report can't be fetched (including 404) or the
/// backend returns no report for `id`.
pub async fn load<T: Transport>(
    dispatcher: &Dispatcher<T>,
    id: &BootId,
    board: &Board,
) -> Result<BootReport> {
    board.loading(CONTENT);

    let query = [report_query(id)];
    let fetched = dispatcher.dispatch(&query).await.and_then(|outcome| {
        outcome
            .get(CONTENT)
            .ok_or_else(|| Error::MalformedResponse("boot report missing".to_string()))?
            .decode::<Vec<BootReport>>()?
            .into_iter()
            .next()
            .ok_or_else(|| Error::MalformedResponse(format!("no boot report {id}")))
    });

    match fetched {
        Ok(report) => {
            board.show(CONTENT, format!("boot report {id}"));
            show_report(board, &report);
            Ok(report)
        }
        Err(e) => {
            tracing::warn!(%id, error = %e, "boot report query failed");
            board.degrade(CONTENT, Degraded::Unavailable);
            Err(e)
        }
    }
}
