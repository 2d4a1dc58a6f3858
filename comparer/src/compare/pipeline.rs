//! High-level comparison API: normalize both snapshots and reconcile them.
//!
//! The heavy work is deferred: the caller's task yields once so queued
//! status updates get a chance to run, then normalization and
//! reconciliation execute on a blocking worker. Once started, the job runs
//! to completion or fails; there is no cancellation.
//!
//! # Example
//!
//! ```rust,ignore
//! use inventory_comparer::{compare_snapshots, parse_file_auto, CompareOptions};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let old = parse_file_auto("march.csv").await?;
//!     let new = parse_file_auto("april.csv").await?;
//!     let result = compare_snapshots(old.rows.into(), new.rows.into(), &CompareOptions::default()).await?;
//!     println!("{} new, {} discontinued", result.added.len(), result.discontinued.len());
//!     Ok(())
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::any::Any;
use std::path::Path;
use std::sync::Arc;

use super::normalize::{normalize_dataset, ColumnMapping};
use super::reconcile::{reconcile, Reconciliation};
use crate::error::{ConfigError, ConfigResult, ProcessingError, ProcessingResult};
use crate::export::ExportOptions;
use crate::logs::{log_info, log_info_indent, log_success, log_warning};
use crate::parser::RawRow;
use crate::view::PAGE_SIZE;

/// Options for a comparison session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompareOptions {
    /// Source column for each record field
    pub columns: ColumnMapping,

    /// Rows per results page
    pub page_size: usize,

    /// Section export settings
    pub export: ExportOptions,
}

impl Default for CompareOptions {
    fn default() -> Self {
        Self {
            columns: ColumnMapping::default(),
            page_size: PAGE_SIZE,
            export: ExportOptions::default(),
        }
    }
}

impl CompareOptions {
    /// Load options from a JSON file. Missing keys keep their defaults.
    pub fn from_json_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> ConfigResult<Self> {
        let options: CompareOptions = serde_json::from_str(content)?;
        options.validate()?;
        Ok(options)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.page_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "pageSize".to_string(),
                message: "must be at least 1".to_string(),
            });
        }

        let columns = &self.columns;
        for (field, value) in [
            ("columns.partNumber", &columns.part_number),
            ("columns.secondaryNumber", &columns.secondary_number),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: field.to_string(),
                    message: "column name cannot be empty".to_string(),
                });
            }
        }

        Ok(())
    }
}

/// Run `job` after yielding to the scheduler once.
///
/// The job runs on tokio's blocking pool. A panic inside it comes back as
/// [`ProcessingError::Worker`] carrying the panic message.
pub async fn run_deferred<F, T>(job: F) -> ProcessingResult<T>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::yield_now().await;

    tokio::task::spawn_blocking(job).await.map_err(|e| {
        if e.is_panic() {
            ProcessingError::Worker(panic_message(e.into_panic()))
        } else {
            ProcessingError::Worker(e.to_string())
        }
    })
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "comparison worker panicked".to_string()
    }
}

/// Compare two decoded snapshots.
///
/// Steps:
/// 1. Yield so pending status updates can run
/// 2. Normalize both sides (incomplete rows dropped)
/// 3. Reconcile
pub async fn compare_snapshots(
    old_rows: Arc<[RawRow]>,
    new_rows: Arc<[RawRow]>,
    options: &CompareOptions,
) -> ProcessingResult<Reconciliation> {
    log_info(format!(
        "Processing {} old rows and {} new rows",
        old_rows.len(),
        new_rows.len()
    ));

    let mapping = options.columns.clone();
    let result = run_deferred(move || {
        let old = normalize_dataset(&old_rows, &mapping);
        let new = normalize_dataset(&new_rows, &mapping);

        let mut result = reconcile(&old.records, &new.records);
        result.summary.old_rejected = old.rejected;
        result.summary.new_rejected = new.rejected;
        result
    })
    .await?;

    let summary = &result.summary;
    if summary.old_rejected + summary.new_rejected > 0 {
        log_warning(format!(
            "Skipped {} old and {} new rows without a part number or {}",
            summary.old_rejected, summary.new_rejected, options.columns.secondary_number
        ));
    }
    if summary.old_duplicates > 0 {
        log_warning(format!(
            "{} duplicate part numbers in old file, last occurrence kept",
            summary.old_duplicates
        ));
    }
    log_info_indent(format!("{} parts in both files", summary.retained), 1);
    log_success(format!(
        "Found {} new items, {} discontinued items, and {} price changes",
        summary.added, summary.discontinued, summary.changed
    ));

    Ok(result)
}
