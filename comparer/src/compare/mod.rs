//! Snapshot comparison.
//!
//! - Normalize: raw rows to product records
//! - Reconcile: new / discontinued / price-changed classification
//! - Pipeline: deferred end-to-end comparison with logging

pub mod normalize;
pub mod pipeline;
pub mod reconcile;

pub use normalize::{clean_text, normalize, normalize_dataset, parse_amount, ColumnMapping, Dataset};
pub use pipeline::{compare_snapshots, run_deferred, CompareOptions};
pub use reconcile::{reconcile, ComparisonSummary, PartIndex, Reconciliation};
